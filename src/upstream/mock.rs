//! Scripted in-process transport for tests.

use super::{Transport, UpstreamResponse};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16, String),
    Fail(&'static str),
}

impl Reply {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Reply::Status(200, body.into())
    }

    pub(crate) fn status(code: u16) -> Self {
        Reply::Status(code, String::new())
    }
}

struct Route {
    fragment: String,
    replies: VecDeque<Reply>,
}

/// Matches request paths by substring; each route replays its replies in
/// order and keeps repeating the last one.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Url>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, fragment: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.routes.lock().unwrap().push(Route {
            fragment: fragment.to_string(),
            replies: replies.into_iter().collect(),
        });
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_to(&self, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str().contains(fragment))
            .count()
    }

    pub(crate) fn urls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &Url) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes
            .iter_mut()
            .find(|r| url.as_str().contains(&r.fragment))
        else {
            return Reply::status(404);
        };
        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap()
        } else {
            route.replies.front().cloned().unwrap_or(Reply::status(404))
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse> {
        self.calls.lock().unwrap().push(url.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_reply(url) {
            Reply::Status(code, body) => Ok(UpstreamResponse::new(
                StatusCode::from_u16(code).unwrap(),
                body,
            )),
            Reply::Fail(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}

/// A Yahoo-shaped chart payload.
pub(crate) fn chart_body(symbol: &str, price: f64, timestamps: &[i64], closes: &[Option<f64>]) -> String {
    json!({
        "chart": {
            "result": [{
                "meta": { "symbol": symbol, "currency": "USD", "regularMarketPrice": price },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    })
    .to_string()
}

pub(crate) fn price_body(symbol: &str, price: f64) -> String {
    json!({ "price": price, "change": 1.0, "changePercent": 0.5, "symbol": symbol }).to_string()
}
