mod app;
mod args;
mod cache;
mod config;
mod error;
mod market;
mod storage;
pub mod ui;
pub mod upstream;
pub mod utils;

pub use app::Application;
pub use cache::{CacheEntry, CacheKeyReport, CacheReport, Cached, IndexCache, CACHE_KEY_PREFIX, DEFAULT_CACHE_TTL};
pub use config::{validate_base_url, ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use error::{MarketError, Result, UpstreamFailure};
pub use market::{
    normalize, normalize_bytes, ChartPoint, Endpoints, IndexBoard, IndexSnapshot, MarketClient,
    MarketIndex, Range, RetryPolicy, StockSummary, DEFAULT_TRENDING_LIMIT,
};
pub use storage::{probe, DirSessionStore, SessionStore, StorageAdapter};
pub use upstream::schema::{ChartEnvelope, PriceQuote, TrendingList, TrendingStock};
pub use upstream::{HttpTransport, Transport, UpstreamResponse};
