//! Error types for the rotating-proxy-pool crate.

use thiserror::Error;

/// Errors produced while loading or allocating from a proxy pool.
#[derive(Debug, Error)]
pub enum ProxyPoolError {
    /// A file source could not be opened or read.
    #[error("failed to read proxy list {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// A remote source could not be fetched.
    #[error("failed to fetch proxy list: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The pool holds no records, so nothing can be allocated.
    #[error("No proxy available in pool")]
    EmptyPool,
}

impl ProxyPoolError {
    /// True when the error came from reading a source rather than allocation.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Fetch(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProxyPoolError>;
