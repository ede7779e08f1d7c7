//! Loading raw proxy records from files and URLs.

use crate::error::{ProxyPoolError, Result};

use futures::future;
use log::{info, warn};
use reqwest::Client;
use std::path::Path;

/// Split line-oriented content into records, trimming whitespace and skipping blank lines.
pub fn parse_records(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read records from a file on disk.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ProxyPoolError::Io {
        source_name: path.display().to_string(),
        source,
    })?;
    Ok(parse_records(&content))
}

/// Fetch records from a URL or file path.
pub async fn fetch_records(source: &str) -> Result<Vec<String>> {
    if source.starts_with("http") {
        let client = Client::new();
        let response = client.get(source).send().await?.error_for_status()?;
        let content = response.text().await?;
        Ok(parse_records(&content))
    } else {
        let path = source.to_string();
        tokio::task::spawn_blocking(move || read_records(path))
            .await
            .map_err(|e| ProxyPoolError::Io {
                source_name: source.to_string(),
                source: std::io::Error::other(e),
            })?
    }
}

/// Load every source concurrently. Any failing source fails the whole load.
pub async fn load_sources(sources: &[String]) -> Result<Vec<String>> {
    info!("Loading proxy records from {} sources", sources.len());

    let loads = sources.iter().map(|source| async move {
        match fetch_records(source).await {
            Ok(records) => {
                info!("Loaded {} records from {}", records.len(), source);
                Ok(records)
            }
            Err(e) => {
                warn!("Failed to load proxy records from {}: {}", source, e);
                Err(e)
            }
        }
    });

    let records = future::try_join_all(loads).await?;
    Ok(records.into_iter().flatten().collect())
}
