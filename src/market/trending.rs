use super::client::{endpoint_url, MarketClient};
use super::StockSummary;
use crate::error::{MarketError, Result};
use crate::upstream::schema::{PriceQuote, TrendingList};
use crate::upstream::Transport;
use tracing::{debug, error, info};

/// Number of hot stocks the dashboard shows.
pub const DEFAULT_TRENDING_LIMIT: usize = 6;

impl<T: Transport> MarketClient<T> {
    pub async fn fetch_trending_stocks(&self) -> Result<TrendingList> {
        let url = endpoint_url(&self.endpoints().trending, &["trending"]);
        let body = self.get_ok(&url, "trending stocks").await.inspect_err(|e| {
            error!("Error fetching trending stocks: {e}");
        })?;

        serde_json::from_slice(&body).map_err(|e| MarketError::malformed("trending stocks", e))
    }

    pub async fn fetch_stock_price(&self, symbol: &str) -> Result<PriceQuote> {
        let url = endpoint_url(&self.endpoints().price, &[symbol]);
        let what = format!("price for {symbol}");
        let body = self.get_ok(&url, &what).await?;

        serde_json::from_slice(&body).map_err(|e| MarketError::malformed(what, e))
    }

    /// The first `limit` trending stocks, priced in parallel.
    ///
    /// A failed price lookup leaves that entry's price fields `None`; only a
    /// failed trending list fails the call.
    pub async fn fetch_trending_with_prices(&self, limit: usize) -> Result<Vec<StockSummary>> {
        let list = self.fetch_trending_stocks().await?;
        let stocks = list.stocks.into_iter().take(limit);

        let summaries = self
            .fan_out(stocks, |stock| async move {
                match self.fetch_stock_price(&stock.symbol).await {
                    Ok(quote) => StockSummary::priced(stock, quote),
                    Err(e) => {
                        debug!("Error fetching price for {}: {e}", stock.symbol);
                        StockSummary::unpriced(stock)
                    }
                }
            })
            .await;

        let priced = summaries.iter().filter(|s| s.price.is_some()).count();
        info!(stocks = summaries.len(), priced, "fetched trending stocks");
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{IndexCache, DEFAULT_CACHE_TTL};
    use crate::error::UpstreamFailure;
    use crate::market::Endpoints;
    use crate::storage::StorageAdapter;
    use crate::upstream::mock::{price_body, MockTransport, Reply};
    use serde_json::json;
    use std::time::Duration;

    const SYMBOLS: [&str; 8] = ["NVDA", "SOFI", "TSLA", "AAPL", "MSFT", "AMZN", "META", "GOOGL"];

    fn trending_body() -> String {
        let stocks: Vec<_> = SYMBOLS
            .iter()
            .map(|s| json!({ "symbol": s, "name": format!("{s} Inc."), "icon": format!("{s}.png"), "exchange": "NASDAQ" }))
            .collect();
        json!({ "stocks": stocks, "cached": true, "lastUpdated": "2024-02-01T12:00:00Z" }).to_string()
    }

    fn priced_transport() -> MockTransport {
        let mut t = MockTransport::new().route("/trending", [Reply::ok(trending_body())]);
        for (i, s) in SYMBOLS.iter().enumerate() {
            t = t.route(&format!("/price/{s}"), [Reply::ok(price_body(s, 100.0 + i as f64))]);
        }
        t
    }

    fn client(transport: MockTransport) -> MarketClient<MockTransport> {
        MarketClient::new(
            transport,
            IndexCache::new(StorageAdapter::in_memory(), DEFAULT_CACHE_TTL),
            Endpoints::default(),
        )
    }

    #[tokio::test]
    async fn trending_list_parses() {
        let c = client(priced_transport());
        let list = c.fetch_trending_stocks().await.unwrap();
        assert_eq!(list.stocks.len(), SYMBOLS.len());
        assert_eq!(list.cached, Some(true));
        assert!(c.transport().urls()[0]
            .as_str()
            .ends_with("vercel.app/api/trending"));
    }

    #[tokio::test]
    async fn batch_of_six_with_one_failure_keeps_all_entries() {
        // TSLA (#3) is routed first so its failure shadows the generic price route.
        let mut transport = MockTransport::new()
            .route("/price/TSLA", [Reply::Fail("connection refused")])
            .route("/trending", [Reply::ok(trending_body())]);
        for s in SYMBOLS {
            transport = transport.route(&format!("/price/{s}"), [Reply::ok(price_body(s, 50.0))]);
        }
        let c = client(transport);

        let stocks = c.fetch_trending_with_prices(DEFAULT_TRENDING_LIMIT).await.unwrap();

        assert_eq!(stocks.len(), 6);
        let symbols: Vec<_> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, &SYMBOLS[..6]);

        assert_eq!(stocks[2].symbol, "TSLA");
        assert_eq!(stocks[2].price, None);
        assert_eq!(stocks[2].change, None);
        assert_eq!(stocks[2].change_percent, None);
        assert_eq!(stocks[2].icon.as_deref(), Some("TSLA.png"));
        for (i, s) in stocks.iter().enumerate().filter(|(i, _)| *i != 2) {
            assert_eq!(s.price, Some(50.0), "entry {i} should be priced");
            assert_eq!(s.exchange.as_deref(), Some("NASDAQ"));
        }
        // 1 trending call + 6 price calls, the other 2 symbols are never priced.
        assert_eq!(c.transport().calls(), 7);
        assert_eq!(c.transport().calls_to("/trending"), 1);
        assert_eq!(c.transport().calls_to("/price/"), 6);
        assert_eq!(c.transport().calls_to("/price/META"), 0);
    }

    #[tokio::test]
    async fn non_success_price_degrades_to_unpriced() {
        let transport = MockTransport::new()
            .route("/price/NVDA", [Reply::status(500)])
            .route("/price/SOFI", [Reply::ok("{\"price\":\"oops\"}")]);
        let c = client(transport.route("/trending", [Reply::ok(trending_body())]));

        let stocks = c.fetch_trending_with_prices(2).await.unwrap();
        assert!(stocks.iter().all(|s| s.price.is_none()));
    }

    #[tokio::test]
    async fn failed_trending_list_fails_the_batch() {
        let c = client(MockTransport::new().route("/trending", [Reply::status(503)]));
        let err = c.fetch_trending_with_prices(6).await.unwrap_err();
        assert!(matches!(
            err,
            MarketError::Upstream { last_error: UpstreamFailure::Status(503), .. }
        ));
    }

    #[tokio::test]
    async fn malformed_trending_list() {
        let c = client(MockTransport::new().route("/trending", [Reply::ok("{\"items\":[]}")]));
        let err = c.fetch_trending_stocks().await.unwrap_err();
        assert!(matches!(err, MarketError::MalformedUpstreamData { .. }));
    }

    #[tokio::test]
    async fn price_rate_limit_is_reported_as_such() {
        let c = client(MockTransport::new().route("/price/NVDA", [Reply::status(429)]));
        let err = c.fetch_stock_price("NVDA").await.unwrap_err();
        assert!(matches!(
            err,
            MarketError::Upstream { last_error: UpstreamFailure::RateLimited, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn price_fan_out_respects_concurrency_gate() {
        let c = client(priced_transport().with_latency(Duration::from_millis(50)))
            .with_max_concurrency(2);

        let stocks = c.fetch_trending_with_prices(8).await.unwrap();

        assert_eq!(stocks.len(), 8);
        assert!(stocks.iter().all(|s| s.price.is_some()));
        assert_eq!(c.transport().peak_in_flight(), 2);
        assert_eq!(stocks[7].price, Some(107.0));
    }
}
