//! Middleware implementation for reqwest.

use crate::config::ProxyPoolConfig;
use crate::pool::ProxyPool;
use crate::proxy;

use anyhow::anyhow;
use async_trait::async_trait;
use log::{info, warn};
use reqwest_middleware::{Error, Middleware, Next, Result};
use std::sync::Arc;

/// Middleware that sends each request through a proxy checked out from the pool.
///
/// A failed attempt rotates to a different proxy with `next_proxy`; the proxy
/// in use is released once the request finishes either way.
#[derive(Clone)]
pub struct ProxyPoolMiddleware {
    /// The proxy pool.
    pool: Arc<ProxyPool>,
}

impl ProxyPoolMiddleware {
    /// Create a new proxy pool middleware, loading the pool from the configured sources.
    pub async fn new(config: ProxyPoolConfig) -> Result<Self> {
        let pool = ProxyPool::new(config)
            .await
            .map_err(|e| Error::Middleware(anyhow!(e)))?;

        let (total, _) = pool.get_stats();
        info!("Proxy pool middleware initialized with {} proxies", total);
        if total == 0 {
            warn!("Proxy pool is empty, every request will fail");
        }

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Arc<ProxyPool>) -> Self {
        Self { pool }
    }

    /// The pool backing this middleware.
    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    async fn send_through(
        &self,
        proxy_url: &str,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let config = &self.pool.config;
        let client = reqwest::Client::builder()
            .proxy(proxy::to_reqwest_proxy(proxy_url, &config.scheme)?)
            .timeout(config.request_timeout)
            .build()?;
        client.execute(request).await
    }
}

#[async_trait]
impl Middleware for ProxyPoolMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        _extensions: &mut http::Extensions,
        _next: Next<'_>,
    ) -> Result<reqwest::Response> {
        let max_retries = self.pool.config.retry_count;
        let mut retry_count = 0;

        let mut proxy_url = self
            .pool
            .assign_proxy()
            .map_err(|e| Error::Middleware(anyhow!(e)))?;

        loop {
            let proxied_request = match req.try_clone() {
                Some(request) => request,
                None => {
                    self.pool.release(&proxy_url);
                    return Err(Error::Middleware(anyhow!(
                        "Request object is not cloneable. Are you passing a streaming body?"
                    )));
                }
            };

            info!("Using proxy: {} (attempt {})", proxy_url, retry_count + 1);

            match self.send_through(&proxy_url, proxied_request).await {
                Ok(response) => {
                    self.pool.release(&proxy_url);
                    return Ok(response);
                }
                Err(err) => {
                    warn!(
                        "Request failed with proxy {} (attempt {}): {}",
                        proxy_url,
                        retry_count + 1,
                        err
                    );

                    retry_count += 1;
                    if retry_count > max_retries {
                        self.pool.release(&proxy_url);
                        return Err(Error::Reqwest(err));
                    }

                    proxy_url = self
                        .pool
                        .next_proxy(&proxy_url)
                        .map_err(|e| Error::Middleware(anyhow!(e)))?;
                }
            }
        }
    }
}
