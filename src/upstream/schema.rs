//! Wire contracts for the three upstream endpoints.
//!
//! Fields the payload is not guaranteed to carry are `Option`, so a shape
//! mismatch is reported by the normalizer with a precise reason instead of
//! a generic deserialization failure.

use crate::utils::serialization::de_opt_f64;
use serde::{Deserialize, Serialize};

// ---------- chart (Yahoo-compatible) ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: Option<ChartMeta>,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    #[serde(default)]
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    /// Gaps in the series arrive as `null`.
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

// ---------- trending ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingList {
    pub stocks: Vec<TrendingStock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingStock {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

// ---------- price ----------

/// Numbers are sometimes sent as strings; accept either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub change: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_error_payload_parses() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let env: ChartEnvelope = serde_json::from_str(body).unwrap();
        assert!(env.chart.result.is_none());
        assert_eq!(env.chart.error.unwrap().code.as_deref(), Some("Not Found"));
    }

    #[test]
    fn chart_closes_keep_nulls() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"^DJI","currency":"USD","regularMarketPrice":39000.5},
            "timestamp":[1,2,3],"indicators":{"quote":[{"close":[1.0,null,3.0]}]}}]}}"#;
        let env: ChartEnvelope = serde_json::from_str(body).unwrap();
        let result = &env.chart.result.unwrap()[0];
        assert_eq!(
            result.indicators.as_ref().unwrap().quote[0].close,
            vec![Some(1.0), None, Some(3.0)]
        );
        assert_eq!(
            result.meta.as_ref().unwrap().regular_market_price,
            Some(39000.5)
        );
    }

    #[test]
    fn trending_tolerates_missing_optionals() {
        let body = r#"{"stocks":[{"symbol":"NVDA","name":"NVIDIA Corp"}],"lastUpdated":"2024-02-01T00:00:00Z"}"#;
        let list: TrendingList = serde_json::from_str(body).unwrap();
        assert_eq!(list.stocks[0].symbol, "NVDA");
        assert!(list.stocks[0].icon.is_none());
        assert!(list.cached.is_none());
        assert_eq!(list.last_updated.as_deref(), Some("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn price_accepts_numeric_strings() {
        let body = r#"{"price":"721.33","change":4.5,"changePercent":"0.63","symbol":"NVDA"}"#;
        let quote: PriceQuote = serde_json::from_str(body).unwrap();
        assert_eq!(quote.price, Some(721.33));
        assert_eq!(quote.change, Some(4.5));
        assert_eq!(quote.change_percent, Some(0.63));
    }

    #[test]
    fn price_rejects_non_numeric_price() {
        let body = r#"{"price":"n/a","symbol":"NVDA"}"#;
        assert!(serde_json::from_str::<PriceQuote>(body).is_err());
    }
}
