//! Fault injection for the chart route.

use crate::handlers::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::atomic::Ordering;
use tracing::info;

/// Counts chart requests and answers every `rate_limit_every`-th one with
/// 429, the way Yahoo does under load. Adds the configured latency to the
/// rest.
pub async fn inject_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let seen = state.chart_requests.fetch_add(1, Ordering::SeqCst) + 1;

    if state.rate_limit_every.is_some_and(|every| seen % every == 0) {
        info!(request = seen, path = %req.uri().path(), "injecting 429");
        return (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    }

    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }
    next.run(req).await
}
