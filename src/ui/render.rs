//! Text views of the dashboard: index card, index board, hot stocks table.

use crate::market::{ChartPoint, IndexSnapshot, MarketIndex, Range, StockSummary};
use dialoguer::console::style;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const CARD_SPARK_WIDTH: usize = 48;
const BOARD_SPARK_WIDTH: usize = 20;

pub const INDEX_UNAVAILABLE: &str = "Index data unavailable";
pub const TRENDING_UNAVAILABLE: &str = "Failed to load trending stocks";

/// Index price with thousands separators and one decimal; `--` when the
/// price is missing or zero.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p != 0.0 && p.is_finite() => group_thousands(p, 1),
        _ => "--".to_string(),
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

fn signed(value: f64, decimals: usize) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{value:.decimals$}")
}

/// `▲ +12.3 +0.26% Past month`, green when non-negative.
pub fn index_change_line(snapshot: &IndexSnapshot, range: Range) -> String {
    let arrow = if snapshot.change >= 0.0 { '▲' } else { '▼' };
    let figures = format!(
        "{arrow} {} {}%",
        signed(snapshot.change, 1),
        signed(snapshot.change_percent, 2)
    );
    let figures = if snapshot.change >= 0.0 {
        style(figures).green()
    } else {
        style(figures).red()
    };
    format!("{figures} {}", style(range.label()).dim())
}

/// Block sparkline of the series, resampled to at most `width` columns.
pub fn sparkline(points: &[ChartPoint], width: usize) -> String {
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let step = points.len().div_ceil(width);
    let values: Vec<f64> = points.chunks(step).map(|c| c[c.len() - 1].value).collect();

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = max - min;

    values
        .iter()
        .map(|&v| {
            if span <= f64::EPSILON {
                return SPARK_LEVELS[SPARK_LEVELS.len() / 2];
            }
            let level = ((v - min) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// The single-index card: badge, price, change and chart.
pub fn index_card(index: MarketIndex, snapshot: Option<&IndexSnapshot>, range: Range) -> String {
    let header = format!(
        "{} {}",
        style(format!("[{}]", index.badge())).cyan().bold(),
        style(format!("{} Index", index.name())).bold()
    );

    let Some(snap) = snapshot else {
        return format!("{header}\n{}", style(INDEX_UNAVAILABLE).red());
    };

    let mut lines = vec![
        header,
        format!(
            "{} {}",
            style(format_price(Some(snap.price))).bold(),
            snap.currency.as_deref().unwrap_or("USD")
        ),
        index_change_line(snap, range),
    ];

    if let (Some(first), Some(last)) = (snap.chart_data.first(), snap.chart_data.last()) {
        lines.push(sparkline(&snap.chart_data, CARD_SPARK_WIDTH));
        let span = format!("{} → {} · {} points", first.date, last.date, snap.chart_data.len());
        lines.push(style(span).dim().to_string());
    }

    lines.join("\n")
}

/// One row per index in display order.
pub fn index_board(board: &[(MarketIndex, Option<IndexSnapshot>)], range: Range) -> String {
    let mut lines = vec![format!(
        "{} {}",
        style("Market Indices").bold(),
        style(format!("· {}", range.label())).dim()
    )];

    for (index, snapshot) in board {
        let row = match snapshot {
            Some(snap) => {
                let change = format!(
                    "{:>9} {:>8}",
                    signed(snap.change, 1),
                    format!("{}%", signed(snap.change_percent, 2))
                );
                let change = if snap.change >= 0.0 {
                    style(change).green()
                } else {
                    style(change).red()
                };
                format!(
                    "{:>4}  {:<11} {:>11}  {}  {}",
                    index.badge(),
                    index.name(),
                    format_price(Some(snap.price)),
                    change,
                    sparkline(&snap.chart_data, BOARD_SPARK_WIDTH)
                )
            }
            None => format!(
                "{:>4}  {:<11} {:>11}  {}",
                index.badge(),
                index.name(),
                "--",
                style(INDEX_UNAVAILABLE).red()
            ),
        };
        lines.push(row);
    }

    lines.join("\n")
}

/// Box-drawn table of trending stocks. Unpriced entries show `--`.
pub fn hot_stocks(stocks: &[StockSummary]) -> String {
    let mut lines = Vec::new();
    lines.push(format!("┌{}┐", "─".repeat(63)));
    lines.push("│                        TRENDING STOCKS                        │".to_string());
    lines.push("├────────┬──────────────────────┬────────────┬──────────────────┤".to_string());
    lines.push("│ Symbol │ Name                 │      Price │           Change │".to_string());
    lines.push("├────────┼──────────────────────┼────────────┼──────────────────┤".to_string());

    for stock in stocks {
        let price = match stock.price {
            Some(p) => format!("${p:.2}"),
            None => "--".to_string(),
        };
        let change = match (stock.change, stock.change_percent) {
            (Some(c), Some(pct)) => {
                let text = format!("{:>16}", format!("{}({}%)", signed(c, 2), signed(pct, 2)));
                if c >= 0.0 {
                    style(text).green().to_string()
                } else {
                    style(text).red().to_string()
                }
            }
            _ => format!("{:>16}", ""),
        };
        lines.push(format!(
            "│ {:<6} │ {:<20} │ {:>10} │ {} │",
            truncate(&stock.symbol, 6),
            truncate(&stock.name, 20),
            price,
            change
        ));
    }

    if stocks.is_empty() {
        lines.push("│ (none)                                                        │".to_string());
    }
    lines.push("└────────┴──────────────────────┴────────────┴──────────────────┘".to_string());

    lines.join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}
