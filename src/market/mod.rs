//! Market indices, time ranges and the snapshots handed to the views.

mod aggregate;
mod client;
mod normalize;
mod trending;

pub use aggregate::IndexBoard;
pub use client::{
    Endpoints, MarketClient, RetryPolicy, DEFAULT_CHART_BASE, DEFAULT_PRICE_BASE,
    DEFAULT_TRENDING_BASE,
};
pub use normalize::{normalize, normalize_bytes};
pub use trending::DEFAULT_TRENDING_LIMIT;

use crate::error::MarketError;
use crate::upstream::schema::{PriceQuote, TrendingStock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketIndex {
    Sp500,
    Nasdaq100,
    DowJones,
    UsDollar,
}

impl MarketIndex {
    /// Display order on the dashboard.
    pub const ALL: [MarketIndex; 4] = [
        MarketIndex::Sp500,
        MarketIndex::Nasdaq100,
        MarketIndex::DowJones,
        MarketIndex::UsDollar,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "S&P 500",
            MarketIndex::Nasdaq100 => "Nasdaq 100",
            MarketIndex::DowJones => "Dow Jones",
            MarketIndex::UsDollar => "US Dollar",
        }
    }

    /// Upstream chart ticker.
    pub fn ticker(&self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "^GSPC",
            MarketIndex::Nasdaq100 => "^NDX",
            MarketIndex::DowJones => "^DJI",
            MarketIndex::UsDollar => "DX-Y.NYB",
        }
    }

    /// Short tab label.
    pub fn badge(&self) -> &'static str {
        match self {
            MarketIndex::Sp500 => "500",
            MarketIndex::Nasdaq100 => "100",
            MarketIndex::DowJones => "DJI",
            MarketIndex::UsDollar => "DXY",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Result<Self, MarketError> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|idx| idx.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MarketError::UnknownIndex(name.to_string()))
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MarketIndex {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Chart time range, sent upstream as `range=<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Range {
    OneDay,
    #[default]
    OneMonth,
    ThreeMonths,
    OneYear,
    FiveYears,
    Max,
}

impl Range {
    pub const ALL: [Range; 6] = [
        Range::OneDay,
        Range::OneMonth,
        Range::ThreeMonths,
        Range::OneYear,
        Range::FiveYears,
        Range::Max,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Range::OneDay => "1d",
            Range::OneMonth => "1mo",
            Range::ThreeMonths => "3mo",
            Range::OneYear => "1y",
            Range::FiveYears => "5y",
            Range::Max => "max",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Range::OneDay => "Today",
            Range::OneMonth => "Past month",
            Range::ThreeMonths => "Past 3 months",
            Range::OneYear => "Past year",
            Range::FiveYears => "Past 5 years",
            Range::Max => "All time",
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Range {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| MarketError::UnknownRange(s.to_string()))
    }
}

/// One retained point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Short display date, e.g. `Jan 5`.
    pub date: String,
    pub value: f64,
    /// Epoch seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub currency: Option<String>,
    pub change: f64,
    pub change_percent: f64,
    pub chart_data: Vec<ChartPoint>,
}

/// A trending stock with its price, or with null price fields when the
/// price lookup failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub icon: Option<String>,
    pub exchange: Option<String>,
}

impl StockSummary {
    pub(crate) fn priced(stock: TrendingStock, quote: PriceQuote) -> Self {
        Self {
            symbol: stock.symbol,
            name: stock.name,
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            icon: stock.icon,
            exchange: stock.exchange,
        }
    }

    pub(crate) fn unpriced(stock: TrendingStock) -> Self {
        Self {
            symbol: stock.symbol,
            name: stock.name,
            price: None,
            change: None,
            change_percent: None,
            icon: stock.icon,
            exchange: stock.exchange,
        }
    }
}
