//! # rotating-proxy-pool
//!
//! A fair rotating proxy pool with a middleware for reqwest.
//!
//! The pool hands out proxy endpoints to many concurrent callers, rotating
//! through a shuffled list so every proxy gets used, never giving a caller
//! back the proxy it just released, and falling back to a random pick when
//! every proxy is already checked out.

pub mod config;
pub mod error;
pub mod middleware;
pub mod pool;
pub mod proxy;
pub mod source;

pub use config::{ProxyPoolConfig, ProxyPoolConfigBuilder};
pub use error::{ProxyPoolError, Result};
pub use middleware::ProxyPoolMiddleware;
pub use pool::ProxyPool;
pub use proxy::{format_record, Proxy, ProxyStatus};
