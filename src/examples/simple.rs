//! Simple example of using rotating-proxy-pool.
//!
//! Usage: `cargo run --example simple -- proxies.txt`

use reqwest_middleware::ClientBuilder;
use rotating_proxy_pool::{ProxyPool, ProxyPoolConfig, ProxyPoolMiddleware};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "proxies.txt".to_string());

    println!("Loading proxy pool from {}...", path);

    let config = ProxyPoolConfig::builder()
        // one `host:port` or `host:port:user:pass` record per line
        .sources(vec![path])
        .retry_count(2)
        .request_timeout(Duration::from_secs(5))
        .build();

    let pool = ProxyPool::new(config).await?;
    println!("Loaded {} proxies", pool.len());

    let first = pool.assign_proxy()?;
    let second = pool.next_proxy(&first)?;
    println!("Assigned {}, rotated to {}", first, second);
    pool.release(&second);

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::from_pool(Arc::clone(&pool)))
        .build();

    println!("Sending request...");
    let response = client.get("https://httpbin.org/ip").send().await?;

    println!("Status: {}", response.status());
    println!("Response: {}", response.text().await?);

    let (total, checked_out) = pool.get_stats();
    println!("Pool: {} proxies, {} checked out", total, checked_out);

    Ok(())
}
