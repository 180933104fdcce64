use crate::market::{
    MarketIndex, Range, DEFAULT_CHART_BASE, DEFAULT_PRICE_BASE, DEFAULT_TRENDING_BASE,
    DEFAULT_TRENDING_LIMIT,
};
use clap::ValueHint;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_RANGE: &str = "1mo"; // parsed by parser
pub const DEFAULT_INDEX: &str = "S&P 500"; // parsed by parser

pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REFRESH_SECS: u64 = 60;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Show one market index with its chart for a time range
    Index(IndexArgs),

    /// Show every market index side by side
    Indices(RangeArgs),

    /// Show trending stocks with their prices
    Trending(TrendingArgs),

    /// Hot stocks plus one index card, optionally refreshed on an interval
    Dashboard(DashboardArgs),

    /// Print what the session cache holds, as JSON
    Cache,
}

#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Directory used as the session cache store. Without it the cache lives in memory only.
    #[arg(
        long,
        env = "MARKET_PULSE_SESSION_DIR",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub(crate) session_dir: Option<PathBuf>,

    /// Base URL of the trending-stocks service
    #[arg(
        long,
        env = "TRENDING_API_URL",
        value_hint = ValueHint::Url,
        default_value = DEFAULT_TRENDING_BASE,
        global = true
    )]
    pub(crate) trending_url: String,

    /// Base URL of the per-symbol price service
    #[arg(
        long,
        env = "PRICE_API_URL",
        value_hint = ValueHint::Url,
        default_value = DEFAULT_PRICE_BASE,
        global = true
    )]
    pub(crate) price_url: String,

    /// Base URL of the chart service
    #[arg(
        long,
        env = "CHART_API_URL",
        value_hint = ValueHint::Url,
        default_value = DEFAULT_CHART_BASE,
        global = true
    )]
    pub(crate) chart_url: String,

    /// Milliseconds a cached index stays fresh
    #[arg(
        long,
        env = "CACHE_TTL_MS",
        default_value_t = DEFAULT_CACHE_TTL_MS,
        global = true
    )]
    pub(crate) cache_ttl_ms: u64,

    /// Chart request attempts before falling back to stale data
    #[arg(
        long,
        env = "MAX_ATTEMPTS",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        global = true
    )]
    pub(crate) max_attempts: u32,

    /// Backoff before the second attempt, in milliseconds (doubles after)
    #[arg(
        long,
        env = "BACKOFF_BASE_MS",
        default_value_t = DEFAULT_BACKOFF_MS,
        global = true
    )]
    pub(crate) backoff_ms: u64,

    /// Maximum upstream requests in flight during a fan-out
    #[arg(
        long,
        env = "MAX_CONCURRENCY",
        default_value_t = DEFAULT_MAX_CONCURRENCY,
        global = true
    )]
    pub(crate) max_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        global = true
    )]
    pub(crate) timeout_secs: u64,

    /// User-Agent sent upstream (defaults to a desktop browser string)
    #[arg(long, env = "MARKET_PULSE_USER_AGENT", global = true)]
    pub(crate) user_agent: Option<String>,
}

#[derive(Args)]
pub(crate) struct RangeArgs {
    /// Time range (1d | 1mo | 3mo | 1y | 5y | max).
    #[arg(
        long,
        short,
        env = "MARKET_RANGE",
        value_parser = parse_range,
        default_value = DEFAULT_RANGE
    )]
    pub(crate) range: Range,
}

#[derive(Args)]
pub(crate) struct IndexArgs {
    /// Index name (S&P 500 | Nasdaq 100 | Dow Jones | US Dollar)
    #[arg(value_parser = parse_index, default_value = DEFAULT_INDEX)]
    pub(crate) name: MarketIndex,

    #[command(flatten)]
    pub(crate) range: RangeArgs,
}

#[derive(Args)]
pub(crate) struct TrendingArgs {
    /// Number of trending stocks to price
    #[arg(long, short, default_value_t = DEFAULT_TRENDING_LIMIT)]
    pub(crate) limit: usize,
}

#[derive(Args)]
pub(crate) struct DashboardArgs {
    /// Index shown on the card
    #[arg(long, value_parser = parse_index, default_value = DEFAULT_INDEX)]
    pub(crate) index: MarketIndex,

    #[command(flatten)]
    pub(crate) range: RangeArgs,

    /// Number of hot stocks
    #[arg(long, short, default_value_t = DEFAULT_TRENDING_LIMIT)]
    pub(crate) limit: usize,

    /// Keep refreshing until interrupted
    #[arg(long, short)]
    pub(crate) watch: bool,

    /// Seconds between refreshes in watch mode
    #[arg(long, default_value_t = DEFAULT_REFRESH_SECS, requires = "watch")]
    pub(crate) interval_secs: u64,

    /// Print the cache report after each refresh
    #[arg(long)]
    pub(crate) cache_report: bool,
}

fn parse_range(s: &str) -> Result<Range, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        // aliases for the range codes
        "today" | "day" => Ok(Range::OneDay),
        "month" => Ok(Range::OneMonth),
        "year" => Ok(Range::OneYear),
        "all" => Ok(Range::Max),
        other => other.parse().map_err(|_| {
            format!(
                "invalid range '{}'; expected one of: 1d, 1mo, 3mo, 1y, 5y, max (aliases: today, month, year, all)",
                s
            )
        }),
    }
}

fn parse_index(s: &str) -> Result<MarketIndex, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        // tab badges and common tickers
        "500" | "spx" | "sp500" | "s&p" => Ok(MarketIndex::Sp500),
        "100" | "ndx" | "nasdaq" => Ok(MarketIndex::Nasdaq100),
        "dji" | "dow" => Ok(MarketIndex::DowJones),
        "dxy" | "usd" => Ok(MarketIndex::UsDollar),
        _ => MarketIndex::from_name(s).map_err(|_| {
            format!(
                "unknown index '{}'; expected one of: S&P 500, Nasdaq 100, Dow Jones, US Dollar",
                s
            )
        }),
    }
}
