//! Server configuration.

use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_PORT: &str = "4010";

/// Server configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rate_limit_every: Option<usize>,
    pub latency: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `MOCK_UPSTREAM_PORT`: Port to bind to (default: 4010)
    /// - `MOCK_RATE_LIMIT_EVERY`: Answer every Nth chart request with 429 (0 or unset: never)
    /// - `MOCK_LATENCY_MS`: Delay added to every chart request
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = env::var("MOCK_UPSTREAM_PORT").unwrap_or_else(|_| DEFAULT_PORT.into());
        let bind_addr: SocketAddr = format!("0.0.0.0:{}", port.trim())
            .parse()
            .with_context(|| format!("MOCK_UPSTREAM_PORT is not a valid port: {port}"))?;

        let rate_limit_every = parse_rate_limit(env::var("MOCK_RATE_LIMIT_EVERY").ok().as_deref())?;
        let latency = match env::var("MOCK_LATENCY_MS") {
            Ok(ms) => Duration::from_millis(
                ms.trim()
                    .parse()
                    .with_context(|| format!("MOCK_LATENCY_MS must be a number: {ms}"))?,
            ),
            Err(_) => Duration::ZERO,
        };

        Ok(Self {
            bind_addr,
            rate_limit_every,
            latency,
        })
    }
}

fn parse_rate_limit(raw: Option<&str>) -> anyhow::Result<Option<usize>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let every: usize = raw
        .parse()
        .with_context(|| format!("MOCK_RATE_LIMIT_EVERY must be a number: {raw}"))?;
    Ok((every > 0).then_some(every))
}
