//! Configuration for the proxy pool.

use std::time::Duration;

/// Scheme used when a record carries embedded credentials.
pub const DEFAULT_SCHEME: &str = "http";

/// Configuration for the proxy pool.
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// File paths or URLs to load proxy records from.
    pub sources: Vec<String>,
    /// Scheme prepended to credential-bearing records.
    pub scheme: String,
    /// Fixed seed for the pool's random generator. `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Number of times the middleware retries a request on a different proxy.
    pub retry_count: usize,
    /// Timeout applied to each proxied request.
    pub request_timeout: Duration,
}

impl ProxyPoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProxyPoolConfigBuilder {
        ProxyPoolConfigBuilder::new()
    }
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        ProxyPoolConfigBuilder::new().build()
    }
}

/// Builder for `ProxyPoolConfig`.
pub struct ProxyPoolConfigBuilder {
    sources: Vec<String>,
    scheme: Option<String>,
    seed: Option<u64>,
    retry_count: Option<usize>,
    request_timeout: Option<Duration>,
}

impl ProxyPoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            scheme: None,
            seed: None,
            retry_count: None,
            request_timeout: None,
        }
    }

    /// Set the file paths or URLs to load proxy records from.
    pub fn sources(mut self, sources: Vec<impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Set the scheme used for credential-bearing records.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Seed the pool's random generator, making shuffles and fallbacks reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the number of times to retry a request with different proxies.
    pub fn retry_count(mut self, count: usize) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Set the timeout for each proxied request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ProxyPoolConfig {
        ProxyPoolConfig {
            sources: self.sources,
            scheme: self.scheme.unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
            seed: self.seed,
            retry_count: self.retry_count.unwrap_or(3),
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(10)),
        }
    }
}

impl Default for ProxyPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
