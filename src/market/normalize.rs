use super::{ChartPoint, IndexSnapshot};
use crate::error::{MarketError, Result};
use crate::upstream::schema::ChartEnvelope;
use chrono::{DateTime, Utc};

/// Parses a raw chart response body and normalizes it.
pub fn normalize_bytes(body: &[u8], index_name: &str) -> Result<IndexSnapshot> {
    let payload: ChartEnvelope =
        serde_json::from_slice(body).map_err(|e| MarketError::malformed(index_name, e))?;
    normalize(&payload, index_name)
}

/// Flattens the first chart result into a chart-ready series.
///
/// Closes are paired with timestamps by position; null closes (and closes
/// missing past the end of the array) are dropped. Change figures are taken
/// against the first retained point:
///
/// - empty series: `change = 0`, `change_percent = 0`
/// - first value `0`: `change = price`, `change_percent = 0`
pub fn normalize(payload: &ChartEnvelope, index_name: &str) -> Result<IndexSnapshot> {
    let malformed = |reason: &str| MarketError::malformed(index_name, reason);

    let result = match payload.chart.result.as_deref() {
        Some([first, ..]) => first,
        _ => {
            let upstream = payload
                .chart
                .error
                .as_ref()
                .and_then(|e| e.description.clone().or_else(|| e.code.clone()));
            return Err(match upstream {
                Some(desc) => malformed(&format!("no chart result ({desc})")),
                None => malformed("no chart result"),
            });
        }
    };

    let meta = result.meta.as_ref().ok_or_else(|| malformed("missing meta"))?;
    let price = meta
        .regular_market_price
        .ok_or_else(|| malformed("missing meta.regularMarketPrice"))?;
    let timestamps = result
        .timestamp
        .as_ref()
        .ok_or_else(|| malformed("missing timestamp"))?;
    let closes = &result
        .indicators
        .as_ref()
        .and_then(|ind| ind.quote.first())
        .ok_or_else(|| malformed("missing indicators.quote"))?
        .close;

    let mut chart_data = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(value) = closes.get(i).copied().flatten() else {
            continue;
        };
        let date = DateTime::<Utc>::from_timestamp(ts, 0)
            .ok_or_else(|| malformed(&format!("timestamp out of range: {ts}")))?
            .format("%b %-d")
            .to_string();
        chart_data.push(ChartPoint {
            date,
            value,
            timestamp: ts,
        });
    }
    chart_data.sort_by_key(|p| p.timestamp);

    let (change, change_percent) = match chart_data.first() {
        None => (0.0, 0.0),
        Some(first) => {
            let change = price - first.value;
            let pct = if first.value == 0.0 {
                0.0
            } else {
                change / first.value * 100.0
            };
            (change, pct)
        }
    };

    Ok(IndexSnapshot {
        name: index_name.to_string(),
        symbol: meta.symbol.clone(),
        price,
        currency: meta.currency.clone(),
        change,
        change_percent,
        chart_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::mock::chart_body;

    // 2024-01-02 .. 2024-01-05, 00:00 UTC
    const DAYS: [i64; 4] = [1704153600, 1704240000, 1704326400, 1704412800];

    fn run(body: &str) -> Result<IndexSnapshot> {
        normalize_bytes(body.as_bytes(), "S&P 500")
    }

    #[test]
    fn drops_nulls_and_formats_dates() {
        let body = chart_body(
            "^GSPC",
            4800.0,
            &DAYS,
            &[Some(4700.0), None, Some(4750.0), Some(4790.0)],
        );
        let snap = run(&body).unwrap();

        assert_eq!(snap.name, "S&P 500");
        assert_eq!(snap.symbol, "^GSPC");
        assert_eq!(snap.currency.as_deref(), Some("USD"));
        assert_eq!(snap.chart_data.len(), 3);
        assert_eq!(snap.chart_data[0].date, "Jan 2");
        assert_eq!(snap.chart_data[1].date, "Jan 4");
        assert!(snap.chart_data.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn change_is_against_first_retained_point() {
        let body = chart_body("^GSPC", 110.0, &DAYS, &[None, Some(100.0), Some(105.0), None]);
        let snap = run(&body).unwrap();

        assert!((snap.change - 10.0).abs() < 1e-9);
        assert!((snap.change_percent - 10.0).abs() < 1e-9);
        assert_eq!(snap.change, snap.price - snap.chart_data[0].value);
    }

    #[test]
    fn out_of_order_timestamps_are_sorted() {
        let body = chart_body(
            "^DJI",
            3.0,
            &[DAYS[2], DAYS[0], DAYS[1]],
            &[Some(3.0), Some(1.0), Some(2.0)],
        );
        let snap = run(&body).unwrap();
        let values: Vec<_> = snap.chart_data.iter().map(|p| p.value).collect();
        assert_eq!(values, [1.0, 2.0, 3.0]);
        assert!((snap.change - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_series_has_zero_change() {
        let body = chart_body("^NDX", 17000.0, &DAYS, &[None, None, None, None]);
        let snap = run(&body).unwrap();
        assert!(snap.chart_data.is_empty());
        assert_eq!(snap.change, 0.0);
        assert_eq!(snap.change_percent, 0.0);
    }

    #[test]
    fn zero_first_value_has_zero_percent() {
        let body = chart_body("^NDX", 5.0, &DAYS[..2], &[Some(0.0), Some(5.0)]);
        let snap = run(&body).unwrap();
        assert_eq!(snap.change, 5.0);
        assert_eq!(snap.change_percent, 0.0);
        assert!(snap.change_percent.is_finite());
    }

    #[test]
    fn shorter_close_array_counts_as_gaps() {
        let body = chart_body("^GSPC", 2.0, &DAYS, &[Some(1.0), Some(2.0)]);
        assert_eq!(run(&body).unwrap().chart_data.len(), 2);
    }

    #[test]
    fn structural_gaps_are_malformed() {
        let cases = [
            r#"{"chart":{"result":[],"error":null}}"#,
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
            r#"{"chart":{"result":[{"meta":{"symbol":"^GSPC","regularMarketPrice":1.0},"indicators":{"quote":[{"close":[]}]}}]}}"#,
            r#"{"chart":{"result":[{"meta":{"symbol":"^GSPC","regularMarketPrice":1.0},"timestamp":[],"indicators":{"quote":[]}}]}}"#,
            r#"{"chart":{"result":[{"timestamp":[],"indicators":{"quote":[{"close":[]}]}}]}}"#,
            r#"{"chart":{"result":[{"meta":{"symbol":"^GSPC"},"timestamp":[],"indicators":{"quote":[{"close":[]}]}}]}}"#,
            r#"{"unexpected":true}"#,
            "<html>rate limited</html>",
        ];
        for body in cases {
            assert!(
                matches!(run(body), Err(MarketError::MalformedUpstreamData { .. })),
                "expected malformed for {body}"
            );
        }
    }

    #[test]
    fn index_without_market_price_is_rejected() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"^GSPC","currency":"USD"},"timestamp":[1704067200],"indicators":{"quote":[{"close":[4700.0]}]}}]}}"#;
        let err = run(body).unwrap_err();
        assert!(matches!(err, MarketError::MalformedUpstreamData { .. }));
        assert!(err.to_string().contains("regularMarketPrice"), "{err}");
    }

    #[test]
    fn upstream_error_description_is_kept() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let err = run(body).unwrap_err();
        assert!(err.to_string().contains("No data found"));
    }
}
