use super::normalize::normalize_bytes;
use super::{IndexSnapshot, MarketIndex, Range};
use crate::cache::IndexCache;
use crate::config::ClientConfig;
use crate::error::{MarketError, Result, UpstreamFailure};
use crate::storage::{DirSessionStore, SessionStore, StorageAdapter};
use crate::upstream::{HttpTransport, Transport};
use futures::stream::{self, StreamExt};
use reqwest::{StatusCode, Url};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_TRENDING_BASE: &str = "https://dvh-frontend-newwebsite.vercel.app/api";
pub const DEFAULT_PRICE_BASE: &str = "https://website-backend-alpha.vercel.app/api/price";
pub const DEFAULT_CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance";

/// Base URLs of the three upstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub trending: Url,
    pub price: Url,
    pub chart: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            trending: Url::parse(DEFAULT_TRENDING_BASE).expect("valid url"),
            price: Url::parse(DEFAULT_PRICE_BASE).expect("valid url"),
            chart: Url::parse(DEFAULT_CHART_BASE).expect("valid url"),
        }
    }
}

/// Unjittered exponential backoff: no wait before attempt 1, then
/// `base`, `2 * base`, `4 * base`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        Some(self.base_delay.checked_mul(factor).unwrap_or(Duration::MAX))
    }
}

/// Client for the dashboard's upstream data, with caching and retry.
pub struct MarketClient<T = HttpTransport> {
    transport: T,
    cache: IndexCache,
    endpoints: Endpoints,
    retry: RetryPolicy,
    max_concurrency: usize,
}

impl MarketClient<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout)?;

        let store: Option<Box<dyn SessionStore>> = match &config.session_dir {
            Some(dir) => match DirSessionStore::open(dir) {
                Ok(store) => Some(Box::new(store)),
                Err(e) => {
                    warn!("session directory unusable, using in-memory cache: {e:#}");
                    None
                }
            },
            None => None,
        };
        let cache = IndexCache::new(StorageAdapter::new(store), config.cache_ttl);

        Ok(MarketClient::new(transport, cache, config.endpoints.clone())
            .with_retry(RetryPolicy {
                max_attempts: config.max_attempts,
                base_delay: config.backoff_base,
            })
            .with_max_concurrency(config.max_concurrency))
    }
}

impl<T: Transport> MarketClient<T> {
    pub fn new(transport: T, cache: IndexCache, endpoints: Endpoints) -> Self {
        Self {
            transport,
            cache,
            endpoints,
            retry: RetryPolicy::default(),
            max_concurrency: 8,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetches an index by display name (`"S&P 500"`, ...).
    pub async fn fetch_market_index(&self, index_name: &str, range: Range) -> Result<IndexSnapshot> {
        let index = MarketIndex::from_name(index_name)?;
        self.fetch_index(index, range).await
    }

    /// Cache first, then the chart endpoint with retry.
    ///
    /// A 429 returns stale cached data straight away when there is any.
    /// Other failures are retried; once attempts run out, stale data is
    /// preferred over an error.
    pub async fn fetch_index(&self, index: MarketIndex, range: Range) -> Result<IndexSnapshot> {
        let name = index.name();
        let cache_key = format!("{name}-{}", range.code());
        let cached = self.cache.read(&cache_key);

        debug!(index = name, %range, cache_exists = cached.is_some(), "fetch_market_index");
        if let Some(hit) = &cached {
            if hit.is_fresh(self.cache.ttl()) {
                debug!(index = name, %range, age_ms = hit.age_millis, "returning cached data");
                return Ok(hit.data.clone());
            }
        }
        debug!(index = name, %range, "cache miss or expired, fetching from upstream");

        let url = self.chart_url(index, range);
        let max_attempts = self.retry.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if let Some(wait) = self.retry.delay_before(attempt) {
                info!(
                    index = name,
                    attempt,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    "retrying after backoff"
                );
                tokio::time::sleep(wait).await;
            }

            let resp = match self.transport.get(&url).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(index = name, attempt, max_attempts, "attempt failed: {e:#}");
                    last_error = Some(MarketError::upstream(
                        name,
                        UpstreamFailure::Transport(format!("{e:#}")),
                    ));
                    continue;
                }
            };

            if resp.status == StatusCode::TOO_MANY_REQUESTS {
                warn!(index = name, attempt, max_attempts, status = 429, "rate limited");
                if let Some(stale) = &cached {
                    info!(index = name, age_ms = stale.age_millis, "using stale cache due to rate limit");
                    return Ok(stale.data.clone());
                }
                last_error = Some(MarketError::upstream(name, UpstreamFailure::RateLimited));
                continue;
            }

            if !resp.status.is_success() {
                let status = resp.status.as_u16();
                warn!(index = name, attempt, max_attempts, status, "attempt failed");
                last_error = Some(MarketError::upstream(name, UpstreamFailure::Status(status)));
                continue;
            }

            match normalize_bytes(&resp.body, name) {
                Ok(snapshot) => {
                    info!(
                        index = name,
                        %range,
                        attempt,
                        points = snapshot.chart_data.len(),
                        "fetched index"
                    );
                    self.cache.write(&cache_key, snapshot.clone());
                    return Ok(snapshot);
                }
                Err(e) => {
                    warn!(index = name, attempt, max_attempts, "attempt failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        if let Some(stale) = cached {
            warn!(index = name, age_ms = stale.age_millis, "all retries failed, using stale cache");
            return Ok(stale.data);
        }

        let err = last_error.unwrap_or_else(|| {
            MarketError::upstream(name, UpstreamFailure::Transport("no attempts made".into()))
        });
        error!(index = name, %range, "all retries failed: {err}");
        Err(err)
    }

    /// One GET that must come back 2xx; no retry.
    pub(crate) async fn get_ok(&self, url: &Url, what: &str) -> Result<Vec<u8>> {
        let resp = self.transport.get(url).await.map_err(|e| {
            MarketError::upstream(what, UpstreamFailure::Transport(format!("{e:#}")))
        })?;

        if resp.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketError::upstream(what, UpstreamFailure::RateLimited));
        }
        if !resp.status.is_success() {
            return Err(MarketError::upstream(
                what,
                UpstreamFailure::Status(resp.status.as_u16()),
            ));
        }
        Ok(resp.body)
    }

    /// Runs `f` over `items` with at most `max_concurrency` in flight,
    /// yielding outputs in input order.
    pub(crate) async fn fan_out<I, F, Fut>(&self, items: I, f: F) -> Vec<Fut::Output>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future,
    {
        stream::iter(items)
            .map(f)
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    fn chart_url(&self, index: MarketIndex, range: Range) -> Url {
        let mut url = endpoint_url(&self.endpoints.chart, &["chart", index.ticker()]);
        url.query_pairs_mut()
            .append_pair("interval", "1d")
            .append_pair("range", range.code());
        url
    }
}

/// Appends percent-encoded path segments to `base`.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut path = base.path().trim_end_matches('/').to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&encode_segment(segment));
    }
    let mut url = base.clone();
    url.set_path(&path);
    url
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
