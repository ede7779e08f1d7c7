//! Core proxy pool implementation.
//!
//! The pool keeps its records in a shuffled order together with a cursor and
//! one checked-out flag per record. Allocation scans forward from the cursor
//! for a free record and falls back to a uniform random pick once every
//! record is checked out, so allocation never blocks and only fails on an
//! empty pool. All rotation state lives behind a single mutex.

use crate::config::ProxyPoolConfig;
use crate::error::{ProxyPoolError, Result};
use crate::proxy::{Proxy, ProxyStatus};
use crate::source;

use log::{debug, info};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rotation state guarded by the pool's lock.
struct Rotation {
    proxies: Vec<Proxy>,
    /// Parallel to `proxies`.
    used: Vec<bool>,
    cursor: usize,
    rng: StdRng,
}

impl Rotation {
    fn replace(&mut self, proxies: Vec<Proxy>) {
        self.used = vec![false; proxies.len()];
        self.proxies = proxies;
        self.cursor = 0;
    }

    /// Circular scan from the cursor for the first free record, skipping `skip`.
    /// Marks the record checked out and moves the cursor past it.
    fn scan(&mut self, skip: Option<&str>) -> Option<usize> {
        let len = self.proxies.len();
        for offset in 0..len {
            let i = (self.cursor + offset) % len;
            if self.used[i] || skip.is_some_and(|url| self.proxies[i].url == url) {
                continue;
            }
            self.used[i] = true;
            self.cursor = (i + 1) % len;
            return Some(i);
        }
        None
    }

    /// Caller must ensure the pool is non-empty.
    fn random_index(&mut self) -> usize {
        self.rng.random_range(0..self.proxies.len())
    }

    /// Random pick among records other than `current`; only returns `current`
    /// when nothing else is in the pool.
    fn random_index_excluding(&mut self, current: &str) -> usize {
        let candidates: Vec<usize> = self
            .proxies
            .iter()
            .enumerate()
            .filter(|(_, proxy)| proxy.url != current)
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return self.random_index();
        }
        candidates[self.rng.random_range(0..candidates.len())]
    }

    /// Clear the flag of a checked-out record matching `url`.
    fn release(&mut self, url: &str) -> bool {
        let found = self
            .proxies
            .iter()
            .zip(&self.used)
            .position(|(proxy, used)| *used && proxy.url == url);
        match found {
            Some(i) => {
                self.used[i] = false;
                true
            }
            None => false,
        }
    }

    fn url(&self, index: usize) -> String {
        self.proxies[index].url.clone()
    }
}

/// A pool of proxies handed out in fair rotation.
pub struct ProxyPool {
    state: Mutex<Rotation>,
    /// Configuration for the pool.
    pub config: ProxyPoolConfig,
}

impl ProxyPool {
    /// Create a proxy pool by loading every configured source.
    ///
    /// Any source that cannot be read aborts construction.
    pub async fn new(config: ProxyPoolConfig) -> Result<Arc<Self>> {
        let records = source::load_sources(&config.sources).await?;
        Ok(Arc::new(Self::from_records(records, &config)))
    }

    /// Create a proxy pool from a single proxy list file.
    pub fn from_file(path: impl AsRef<Path>, config: &ProxyPoolConfig) -> Result<Self> {
        let records = source::read_records(path)?;
        Ok(Self::from_records(records, config))
    }

    /// Create a proxy pool from raw records.
    ///
    /// Records are trimmed, blank ones dropped, and the rest shuffled once.
    /// An empty pool is accepted; allocation on it returns `EmptyPool`.
    pub fn from_records<I, S>(records: I, config: &ProxyPoolConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(clock_seed()),
        };
        let mut proxies = build_proxies(records, &config.scheme);
        proxies.shuffle(&mut rng);

        info!("Proxy pool initialized with {} proxies", proxies.len());

        let mut rotation = Rotation {
            proxies: Vec::new(),
            used: Vec::new(),
            cursor: 0,
            rng,
        };
        rotation.replace(proxies);

        Self {
            state: Mutex::new(rotation),
            config: config.clone(),
        }
    }

    /// Replace every record and reset all rotation state.
    ///
    /// Callers racing with a reload see either the old or the new pool, never a mix.
    pub fn reload<I, S>(&self, records: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = build_proxies(records, &self.config.scheme);
        let count = proxies.len();
        self.state.lock().replace(proxies);
        info!("Proxy pool reloaded with {} proxies", count);
    }

    /// Reload from a proxy list file. On error the current pool is left untouched.
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let records = source::read_records(path)?;
        self.reload(records);
        Ok(())
    }

    /// Reload from the configured sources. On error the current pool is left untouched.
    pub async fn reload_from_sources(&self) -> Result<()> {
        let records = source::load_sources(&self.config.sources).await?;
        self.reload(records);
        Ok(())
    }

    /// Check out a proxy, preferring ones that are not already checked out.
    ///
    /// When every proxy is checked out a random one is returned anyway, so the
    /// same proxy may be held by several callers under saturation.
    pub fn assign_proxy(&self) -> Result<String> {
        let mut state = self.state.lock();
        if state.proxies.is_empty() {
            return Err(ProxyPoolError::EmptyPool);
        }

        if let Some(i) = state.scan(None) {
            return Ok(state.url(i));
        }

        debug!(
            "All {} proxies checked out, falling back to random selection",
            state.proxies.len()
        );
        let i = state.random_index();
        Ok(state.url(i))
    }

    /// Release `current` and check out a different proxy in one step.
    ///
    /// The result differs from `current` whenever the pool holds another
    /// proxy. A `current` unknown to the pool (for example one handed out
    /// before a reload) is ignored and a fresh proxy is allocated.
    pub fn next_proxy(&self, current: &str) -> Result<String> {
        let mut state = self.state.lock();
        if state.proxies.is_empty() {
            return Err(ProxyPoolError::EmptyPool);
        }

        if !state.release(current) {
            debug!("Proxy {} was not checked out from this pool", current);
        }

        if let Some(i) = state.scan(Some(current)) {
            return Ok(state.url(i));
        }

        debug!(
            "No free proxy besides {}, falling back to random selection",
            current
        );
        let i = state.random_index_excluding(current);
        Ok(state.url(i))
    }

    /// Pick a proxy uniformly at random, ignoring checkout state.
    pub fn random_proxy(&self) -> Result<String> {
        let mut state = self.state.lock();
        if state.proxies.is_empty() {
            return Err(ProxyPoolError::EmptyPool);
        }
        let i = state.random_index();
        Ok(state.url(i))
    }

    /// Return a proxy to the pool. Returns `false` if it was not checked out.
    pub fn release(&self, proxy: &str) -> bool {
        self.state.lock().release(proxy)
    }

    /// All formatted proxies in rotation order.
    pub fn get_proxies(&self) -> Vec<String> {
        let state = self.state.lock();
        state.proxies.iter().map(|p| p.url.clone()).collect()
    }

    /// Checkout status of a proxy, or `None` if the pool does not contain it.
    pub fn status_of(&self, proxy: &str) -> Option<ProxyStatus> {
        let state = self.state.lock();
        let mut found = false;
        for (p, used) in state.proxies.iter().zip(&state.used) {
            if p.url == proxy {
                if *used {
                    return Some(ProxyStatus::CheckedOut);
                }
                found = true;
            }
        }
        found.then_some(ProxyStatus::Available)
    }

    /// Get statistics about the proxy pool as `(total, checked_out)`.
    pub fn get_stats(&self) -> (usize, usize) {
        let state = self.state.lock();
        let checked_out = state.used.iter().filter(|used| **used).count();
        (state.proxies.len(), checked_out)
    }

    /// Number of proxies in the pool.
    pub fn len(&self) -> usize {
        self.state.lock().proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn build_proxies<I, S>(records: I, scheme: &str) -> Vec<Proxy>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    records
        .into_iter()
        .filter_map(|record| {
            let record = record.as_ref().trim();
            (!record.is_empty()).then(|| Proxy::new(record, scheme))
        })
        .collect()
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
