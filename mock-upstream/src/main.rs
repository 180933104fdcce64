mod config;
mod fixtures;
mod handlers;
mod middleware;

use crate::config::Config;
use crate::handlers::AppState;
use anyhow::Context;
use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Paths mirror the real services, so base URLs are
/// `http://host:port/api`, `http://host:port/api/price` and
/// `http://host:port/v8/finance`.
fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    let chart = Router::new()
        .route("/v8/finance/chart/{ticker}", get(handlers::chart))
        .route_layer(from_fn_with_state(state, middleware::inject_rate_limit));

    Router::new()
        .route("/api/trending", get(handlers::trending))
        .route("/api/price/{symbol}", get(handlers::price))
        .merge(chart)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug ./mock-upstream
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    fmt().with_env_filter(env_filter).with_target(false).init();

    let config = Config::from_env()?;
    let state = AppState {
        rate_limit_every: config.rate_limit_every,
        latency: config.latency,
        ..AppState::default()
    };

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        rate_limit_every = ?config.rate_limit_every,
        latency_ms = config.latency.as_millis() as u64,
        "Listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router(state)).await?;

    Ok(())
}
