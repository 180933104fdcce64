use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_DIRECTIVES: &str = "warn,market_pulse=info";

/// Two layers: `target: "plain"` events print bare to the terminal (the
/// rendered views), everything else goes to stderr through the `RUST_LOG`
/// filter.
pub fn init_logging() -> Result<()> {
    let plain_fmt = tracing_subscriber::fmt::format()
        .without_time()
        .with_level(false)
        .with_target(false)
        .compact();
    let plain_layer = tracing_subscriber::fmt::layer()
        .event_format(plain_fmt)
        .with_filter(Targets::new().with_target("plain", LevelFilter::TRACE));

    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref())?;

    let rich_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(plain_layer)
        .with(rich_layer)
        .try_init()
        .context("Failed to install the global log subscriber")
}

/// A typo in `RUST_LOG` is reported instead of silently logging at the default.
fn log_filter(directives: Option<&str>) -> Result<EnvFilter> {
    match directives.map(str::trim) {
        Some(d) if !d.is_empty() => {
            EnvFilter::try_new(d).with_context(|| format!("Invalid RUST_LOG directives {d:?}"))
        }
        _ => Ok(EnvFilter::new(DEFAULT_DIRECTIVES)),
    }
}
