//! Deterministic payloads shaped like the real upstream services.

use serde_json::{json, Value};

/// 2024-06-28 20:00 UTC, the close of the last generated session.
const LAST_CLOSE: i64 = 1_719_604_800;
const DAY: i64 = 86_400;

struct Listing {
    symbol: &'static str,
    name: &'static str,
    exchange: &'static str,
    price: f64,
    change_percent: f64,
}

const fn listing(
    symbol: &'static str,
    name: &'static str,
    exchange: &'static str,
    price: f64,
    change_percent: f64,
) -> Listing {
    Listing {
        symbol,
        name,
        exchange,
        price,
        change_percent,
    }
}

const LISTINGS: [Listing; 8] = [
    listing("NVDA", "NVIDIA Corporation", "NASDAQ", 123.54, 1.87),
    listing("SOFI", "SoFi Technologies, Inc.", "NASDAQ", 6.61, -0.75),
    listing("TSLA", "Tesla, Inc.", "NASDAQ", 197.88, -1.76),
    listing("AAPL", "Apple Inc.", "NASDAQ", 210.62, -1.63),
    listing("PLTR", "Palantir Technologies Inc.", "NYSE", 25.33, 1.44),
    listing("AMD", "Advanced Micro Devices, Inc.", "NASDAQ", 162.21, 0.58),
    listing("F", "Ford Motor Company", "NYSE", 12.54, 0.0),
    listing("INTC", "Intel Corporation", "NASDAQ", 30.97, 0.42),
];

pub fn trending() -> Value {
    let stocks: Vec<Value> = LISTINGS
        .iter()
        .map(|l| {
            json!({
                "symbol": l.symbol,
                "name": l.name,
                "icon": format!("/icons/{}.png", l.symbol.to_ascii_lowercase()),
                "exchange": l.exchange,
            })
        })
        .collect();
    json!({ "stocks": stocks, "cached": true, "lastUpdated": "2024-06-28T20:00:00Z" })
}

/// Quote for a trending symbol. `changePercent` goes out as a string, the
/// way the price backend sometimes sends it.
pub fn price(symbol: &str) -> Option<Value> {
    let listing = LISTINGS.iter().find(|l| l.symbol.eq_ignore_ascii_case(symbol))?;
    let change = round2(listing.price * listing.change_percent / (100.0 + listing.change_percent));
    Some(json!({
        "symbol": listing.symbol,
        "price": listing.price,
        "change": change,
        "changePercent": format!("{:.2}", listing.change_percent),
    }))
}

fn base_price(ticker: &str) -> Option<f64> {
    match ticker {
        "^GSPC" => Some(5460.48),
        "^NDX" => Some(19682.87),
        "^DJI" => Some(39118.86),
        "DX-Y.NYB" => Some(105.87),
        _ => None,
    }
}

/// Daily sessions generated for a range code.
pub fn sessions(range: &str) -> Option<usize> {
    match range {
        "1d" => Some(1),
        "1mo" => Some(21),
        "3mo" => Some(63),
        "1y" => Some(252),
        "5y" => Some(1258),
        "max" => Some(2500),
        _ => None,
    }
}

/// Every 11th session (offset 5) has a null close, as Yahoo sends for
/// half days and gaps. The last session always has a value.
pub fn is_gap(i: usize, n: usize) -> bool {
    i % 11 == 5 && i + 1 != n
}

pub enum ChartReply {
    Ok(Value),
    UnknownTicker(Value),
    BadRange(Value),
}

pub fn chart(ticker: &str, range: &str) -> ChartReply {
    let Some(base) = base_price(ticker) else {
        return ChartReply::UnknownTicker(chart_error(
            "Not Found",
            "No data found, symbol may be delisted",
        ));
    };
    let Some(n) = sessions(range) else {
        return ChartReply::BadRange(chart_error(
            "Unprocessable Entity",
            &format!("Invalid input - range: {range}"),
        ));
    };

    let timestamps: Vec<i64> = (0..n).map(|i| LAST_CLOSE - (n - 1 - i) as i64 * DAY).collect();
    let closes: Vec<Option<f64>> = (0..n)
        .map(|i| (!is_gap(i, n)).then(|| close_at(base, i, n)))
        .collect();
    let price = close_at(base, n - 1, n);

    ChartReply::Ok(json!({
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": ticker,
                    "regularMarketPrice": price,
                    "range": range,
                    "dataGranularity": "1d",
                },
                "timestamp": timestamps,
                "indicators": { "quote": [{ "close": closes }] }
            }],
            "error": null
        }
    }))
}

/// A gentle wave drifting up to `base` at the last session.
fn close_at(base: f64, i: usize, n: usize) -> f64 {
    let back = (n - 1 - i) as f64;
    round2(base * (1.0 - 0.0004 * back + 0.015 * (back / 6.0).sin()))
}

fn chart_error(code: &str, description: &str) -> Value {
    json!({ "chart": { "result": null, "error": { "code": code, "description": description } } })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
