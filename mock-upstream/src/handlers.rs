//! HTTP request handlers.

use crate::fixtures::{self, ChartReply};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Application state shared across handlers.
#[derive(Clone, Default)]
pub struct AppState {
    /// Chart requests seen so far, 429s included
    pub chart_requests: Arc<AtomicUsize>,
    pub rate_limit_every: Option<usize>,
    pub latency: Duration,
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub interval: Option<String>,
    pub range: Option<String>,
}

/// GET /api/trending - The trending list.
pub async fn trending() -> Json<Value> {
    Json(fixtures::trending())
}

/// GET /api/price/{symbol} - One quote.
pub async fn price(Path(symbol): Path<String>) -> (StatusCode, Json<Value>) {
    match fixtures::price(&symbol) {
        Some(quote) => (StatusCode::OK, Json(quote)),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No price data for {symbol}") })),
        ),
    }
}

/// GET /v8/finance/chart/{ticker}?interval=1d&range=1mo - Yahoo-shaped chart.
pub async fn chart(
    Path(ticker): Path<String>,
    Query(query): Query<ChartQuery>,
) -> (StatusCode, Json<Value>) {
    let range = query.range.as_deref().unwrap_or("1mo");
    debug!(%ticker, range, interval = ?query.interval, "chart request");

    match fixtures::chart(&ticker, range) {
        ChartReply::Ok(body) => (StatusCode::OK, Json(body)),
        ChartReply::UnknownTicker(body) => (StatusCode::NOT_FOUND, Json(body)),
        ChartReply::BadRange(body) => (StatusCode::UNPROCESSABLE_ENTITY, Json(body)),
    }
}
