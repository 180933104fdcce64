use crate::args::GlobalArgs;
use crate::cache::DEFAULT_CACHE_TTL;
use crate::config::load_base_url::load_base_url;
use crate::market::Endpoints;
use anyhow::{Context, Result};
use derive_builder::Builder;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

mod load_base_url;

pub use load_base_url::validate_base_url;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything a [`MarketClient`](crate::market::MarketClient) needs.
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ClientConfig {
    /// Base URLs of the trending, price and chart services
    #[builder(default)]
    pub(crate) endpoints: Endpoints,
    /// Age at which a cached index snapshot goes stale
    #[builder(default = "DEFAULT_CACHE_TTL")]
    pub(crate) cache_ttl: Duration,
    /// Chart request attempts, including the first
    #[builder(default = "3")]
    pub(crate) max_attempts: u32,
    /// Wait before the second attempt; doubles for each one after
    #[builder(default = "Duration::from_secs(1)")]
    pub(crate) backoff_base: Duration,
    /// Upper bound on concurrent upstream requests in a fan-out
    #[builder(default = "8")]
    pub(crate) max_concurrency: usize,
    /// Per-request HTTP timeout
    #[builder(default = "Duration::from_secs(10)")]
    pub(crate) timeout: Duration,
    #[builder(setter(into), default = "DEFAULT_USER_AGENT.to_string()")]
    pub(crate) user_agent: String,
    /// Directory backing the session store; in-memory cache only when unset
    #[builder(setter(into, strip_option), default)]
    pub(crate) session_dir: Option<PathBuf>,
}

impl ClientConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be at least 1".into());
        }
        if self.max_concurrency == Some(0) {
            return Err("max_concurrency must be at least 1".into());
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err("timeout must be non-zero".into());
        }
        Ok(())
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn session_dir(&self) -> Option<&PathBuf> {
        self.session_dir.as_ref()
    }

    pub(crate) fn setup(args: &GlobalArgs) -> Result<ClientConfig> {
        let endpoints = Endpoints {
            trending: load_base_url("trending", &args.trending_url)?,
            price: load_base_url("price", &args.price_url)?,
            chart: load_base_url("chart", &args.chart_url)?,
        };

        let mut builder = Self::builder();
        builder
            .endpoints(endpoints)
            .cache_ttl(Duration::from_millis(args.cache_ttl_ms))
            .max_attempts(args.max_attempts)
            .backoff_base(Duration::from_millis(args.backoff_ms))
            .max_concurrency(args.max_concurrency)
            .timeout(Duration::from_secs(args.timeout_secs));
        if let Some(dir) = &args.session_dir {
            builder.session_dir(dir.clone());
        }
        if let Some(user_agent) = &args.user_agent {
            builder.user_agent(user_agent.clone());
        }

        let config = builder.build().context("Invalid client configuration")?;

        debug!(
            trending = %config.endpoints.trending,
            price = %config.endpoints.price,
            chart = %config.endpoints.chart,
            cache_ttl_ms = config.cache_ttl.as_millis() as u64,
            max_attempts = config.max_attempts,
            max_concurrency = config.max_concurrency,
            session_dir = ?config.session_dir,
            "client config"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Cli;
    use clap::Parser;

    #[test]
    fn builder_defaults() {
        let config = ClientConfig::builder().build().unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.endpoints, Endpoints::default());
        assert!(config.session_dir().is_none());
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn builder_rejects_zero_limits() {
        let err = ClientConfig::builder().max_attempts(0u32).build().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));

        let err = ClientConfig::builder().max_concurrency(0usize).build().unwrap_err();
        assert!(err.to_string().contains("max_concurrency"));

        assert!(ClientConfig::builder().timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn setup_from_flags() {
        let cli = Cli::try_parse_from([
            "market-pulse",
            "--chart-url",
            "http://127.0.0.1:4010",
            "--cache-ttl-ms",
            "5000",
            "--max-concurrency",
            "2",
            "--session-dir",
            "/tmp/market-pulse",
            "indices",
        ])
        .unwrap();

        let config = ClientConfig::setup(&cli.global).unwrap();
        assert_eq!(config.endpoints.chart.as_str(), "http://127.0.0.1:4010/");
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.session_dir(), Some(&PathBuf::from("/tmp/market-pulse")));
    }

    #[test]
    fn setup_rejects_invalid_endpoint() {
        let cli = Cli::try_parse_from(["market-pulse", "--price-url", "localhost:4010", "trending"])
            .unwrap();
        let err = ClientConfig::setup(&cli.global).unwrap_err();
        assert!(format!("{err:#}").contains("price base URL"));
    }

    #[test]
    fn setup_rejects_zero_attempts() {
        let cli = Cli::try_parse_from(["market-pulse", "--max-attempts", "0", "indices"]).unwrap();
        assert!(ClientConfig::setup(&cli.global).is_err());
    }
}
