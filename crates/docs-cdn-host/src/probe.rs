//! Concurrent reachability probes and the fastest-CDN race
//!
//! All probes of one call run as tasks of a single [`JoinSet`] sharing one
//! pooled [`reqwest::Client`]. Network failures of individual probes never
//! fail the call; the URL simply has no result. In probe mode the set is
//! polled on a fixed interval and the remaining tasks are aborted once enough
//! probes have succeeded.

use crate::Result;
use crate::config::RaceConfig;
use bytes::Bytes;
use dashmap::DashMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, trace};

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Default polling interval of bulk probes
const DEFAULT_WAIT_INTERVAL_MS: u64 = 800;

/// Default deadline of bulk probes
const DEFAULT_TOTAL_SECS: u64 = 3;

/// Bodies a [`ResponseCache`] keeps by default
pub const DEFAULT_MEMO_CAPACITY: usize = 64;

/// When a probe call stops waiting for outstanding probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyStop {
    /// Stop after the first success
    First,
    /// Stop once all probes but one have succeeded
    AllButOne,
    /// Wait out the whole deadline
    #[default]
    None,
}

impl EarlyStop {
    /// Number of successes that ends the race for `count` probes
    fn threshold(self, count: usize) -> usize {
        match self {
            Self::First => 1,
            Self::AllButOne => count.saturating_sub(1).max(1),
            Self::None => usize::MAX,
        }
    }
}

/// Timing and stop policy of one probe call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Interval between checks of finished probes
    pub wait_interval: Duration,
    /// Deadline of the call, also the per-request timeout
    pub total: Duration,
    /// Stop policy, ignored when bodies are fetched
    pub early_stop: EarlyStop,
    /// Whether memoized bodies may answer a probe. `None` trusts the memo
    /// when fetching bodies and ignores it when probing.
    pub trust_cache: Option<bool>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            wait_interval: Duration::from_millis(DEFAULT_WAIT_INTERVAL_MS),
            total: Duration::from_secs(DEFAULT_TOTAL_SECS),
            early_stop: EarlyStop::None,
            trust_cache: None,
        }
    }
}

impl ProbeOptions {
    /// Bulk-probe options from a race configuration
    pub fn from_config(config: &RaceConfig) -> Self {
        Self::default().with_timing(config.probe_interval, config.probe_timeout)
    }

    /// Fastest-host options from a race configuration
    pub fn fastest(config: &RaceConfig) -> Self {
        Self::default()
            .with_timing(config.fastest_interval, config.fastest_timeout)
            .with_early_stop(EarlyStop::First)
    }

    /// Set polling interval and deadline
    #[must_use]
    pub fn with_timing(mut self, wait_interval: Duration, total: Duration) -> Self {
        self.wait_interval = wait_interval;
        self.total = total;
        self
    }

    /// Set the stop policy
    #[must_use]
    pub fn with_early_stop(mut self, early_stop: EarlyStop) -> Self {
        self.early_stop = early_stop;
        self
    }

    /// Allow or forbid answering from memoized bodies
    #[must_use]
    pub fn with_trust_cache(mut self, trust: bool) -> Self {
        self.trust_cache = Some(trust);
        self
    }

    /// Number of polling ticks before the deadline
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn iterations(&self) -> usize {
        if self.wait_interval.is_zero() {
            return 1;
        }
        let ticks = self.total.as_secs_f64() / self.wait_interval.as_secs_f64();
        (ticks.ceil() as usize).max(1)
    }
}

/// Bodies of successful responses, keyed by URL
///
/// Holds at most `capacity` bodies; inserting a new URL into a full cache
/// evicts an arbitrary entry. Clones share the same map.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    bodies: Arc<DashMap<String, Bytes>>,
    capacity: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMO_CAPACITY)
    }
}

impl ResponseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding at most `capacity` bodies
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bodies: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of memoized bodies
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Memoized body of `url`
    pub fn get(&self, url: &str) -> Option<Bytes> {
        self.bodies.get(url).map(|entry| entry.value().clone())
    }

    /// Memoize the body of `url`
    pub fn insert(&self, url: impl Into<String>, body: Bytes) {
        let url = url.into();
        if self.bodies.len() >= self.capacity && !self.bodies.contains_key(&url) {
            let victim = self.bodies.iter().next().map(|entry| entry.key().clone());
            if let Some(victim) = victim {
                trace!("Memo full, evicting {victim}");
                self.bodies.remove(&victim);
            }
        }
        self.bodies.insert(url, body);
    }

    /// Whether `url` has a memoized body
    pub fn contains(&self, url: &str) -> bool {
        self.bodies.contains_key(url)
    }

    /// Number of memoized bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether nothing is memoized
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Forget every body
    pub fn clear(&self) {
        self.bodies.clear();
    }
}

/// Concurrent prober for candidate asset URLs
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    cache: ResponseCache,
    fastest: ProbeOptions,
}

impl Prober {
    /// Create a prober with default timing
    pub fn new() -> Result<Self> {
        Self::from_config(&RaceConfig::default())
    }

    /// Create a prober whose fastest-host race follows `config`
    pub fn from_config(config: &RaceConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(10))
            .pool_max_idle_per_host(4)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self::with_client(client).with_fastest(ProbeOptions::fastest(config)))
    }

    /// Create a prober around an existing HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            cache: ResponseCache::new(),
            fastest: ProbeOptions::fastest(&RaceConfig::default()),
        }
    }

    /// Share a response cache with other probers
    #[must_use]
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    /// Set the options of [`Self::find_fastest`]
    #[must_use]
    pub fn with_fastest(mut self, options: ProbeOptions) -> Self {
        self.fastest = options.with_early_stop(EarlyStop::First);
        self
    }

    /// The memo of successful response bodies
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Probe every URL and return the reachable ones in input order
    pub async fn probe_all(&self, urls: &[String], options: &ProbeOptions) -> Vec<String> {
        let results = self.run(urls, options, false).await;
        urls.iter()
            .zip(results)
            .filter_map(|(url, body)| body.map(|_| url.clone()))
            .collect()
    }

    /// Fetch every URL and return the bodies in input order
    ///
    /// Failed URLs yield an empty body. Never stops early.
    pub async fn fetch_all(&self, urls: &[String], options: &ProbeOptions) -> Vec<Bytes> {
        self.run(urls, options, true)
            .await
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect()
    }

    /// URL of the first candidate to answer successfully
    ///
    /// Falls back to the first URL when none answers before the deadline.
    /// Among candidates answering within the same polling tick the earliest
    /// declared wins.
    pub async fn find_fastest(&self, urls: &[String]) -> String {
        let Some(first) = urls.first() else {
            return String::new();
        };
        let reachable = self.probe_all(urls, &self.fastest).await;
        match reachable.into_iter().next() {
            Some(url) => {
                info!("Fastest CDN: {url}");
                url
            }
            None => {
                debug!("No candidate answered in time, falling back to {first}");
                first.clone()
            }
        }
    }

    async fn run(
        &self,
        urls: &[String],
        options: &ProbeOptions,
        fetch_body: bool,
    ) -> Vec<Option<Bytes>> {
        let mut results: Vec<Option<Bytes>> = vec![None; urls.len()];
        if urls.is_empty() {
            return results;
        }
        let trust_cache = options.trust_cache.unwrap_or(fetch_body);

        let mut tasks = JoinSet::new();
        for (index, url) in urls.iter().enumerate() {
            let client = self.client.clone();
            let cache = self.cache.clone();
            let url = url.clone();
            let timeout = options.total;
            tasks.spawn(async move {
                let body = probe_one(&client, &cache, &url, timeout, trust_cache).await;
                (index, body)
            });
        }

        if fetch_body {
            while let Some(joined) = tasks.join_next().await {
                if let Ok((index, body)) = joined {
                    results[index] = body;
                }
            }
            return results;
        }

        let threshold = options.early_stop.threshold(urls.len());
        let mut successes = 0;
        for tick in 0..options.iterations() {
            sleep(options.wait_interval).await;
            while let Some(joined) = tasks.try_join_next() {
                if let Ok((index, Some(body))) = joined {
                    results[index] = Some(body);
                    successes += 1;
                }
            }
            trace!(tick, successes, pending = tasks.len(), "probe poll");
            if successes >= threshold || tasks.is_empty() {
                break;
            }
        }
        if !tasks.is_empty() {
            debug!("Aborting {} pending probes", tasks.len());
            tasks.abort_all();
        }
        results
    }
}

async fn probe_one(
    client: &Client,
    cache: &ResponseCache,
    url: &str,
    timeout: Duration,
    trust_cache: bool,
) -> Option<Bytes> {
    if trust_cache && let Some(body) = cache.get(url) {
        trace!("Memoized body for {url}");
        return Some(body);
    }
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("Probe of {url} failed: {e}");
            return None;
        }
    };
    let status = response.status();
    if status.as_u16() >= 300 {
        debug!("Probe of {url} returned {status}");
        return None;
    }
    match response.bytes().await {
        Ok(body) => {
            cache.insert(url, body.clone());
            Some(body)
        }
        Err(e) => {
            debug!("Reading body of {url} failed: {e}");
            None
        }
    }
}
