use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the fund's own performance series.
pub const PORTFOLIO_KEY: &str = "^LZ";

/// Benchmark used as the market reference for beta.
pub const MARKET_KEY: &str = "^GSPC";

/// Every benchmark the performance-family charts know about, in legend order.
pub const BENCHMARK_KEYS: [&str; 6] = ["^GSPC", "^IXIC", "^DJI", "^SSEC", "^HSI", "^N225"];

/// Benchmarks quoted on Asian exchanges. Their trading days are shifted
/// against the US calendar, so date lookups search nearby days.
pub const ASIAN_MARKET_KEYS: [&str; 3] = ["^SSEC", "^HSI", "^N225"];

/// A single chart data point.
///
/// `synthetic` points are injected for line continuity at filter
/// boundaries and never come from source data. A `carry_forward` point is a
/// synthetic point whose value repeats the last real value before the
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,

    #[serde(default, rename = "carryForward", skip_serializing_if = "std::ops::Not::not")]
    pub carry_forward: bool,
}

impl TimeSeriesPoint {
    /// A real data point.
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            synthetic: false,
            carry_forward: false,
        }
    }

    /// A point injected for visual continuity.
    pub fn synthetic(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            synthetic: true,
            carry_forward: false,
        }
    }

    /// A synthetic point repeating the last known real value.
    pub fn carry_forward(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            synthetic: true,
            carry_forward: true,
        }
    }

    /// Epoch milliseconds at local midnight of `date`.
    #[must_use]
    pub fn time(&self) -> i64 {
        date_to_millis(self.date)
    }
}

/// Chronological series keyed by ticker / benchmark symbol.
pub type SeriesMap = BTreeMap<String, Vec<TimeSeriesPoint>>;

/// Milliseconds in one calendar day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Epoch milliseconds at midnight of `date`. Chart times are day-granular.
#[must_use]
pub fn date_to_millis(date: NaiveDate) -> i64 {
    // `NaiveDate::default()` is 1970-01-01.
    date.signed_duration_since(NaiveDate::default())
        .num_milliseconds()
}

/// Calendar date containing the epoch-millisecond instant `ms`.
#[must_use]
pub fn millis_to_date(ms: i64) -> NaiveDate {
    let days = ms.div_euclid(DAY_MS);
    NaiveDate::default()
        .checked_add_signed(chrono::Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Normalize a raw series key, mapping known aliases.
#[must_use]
pub fn normalize_series_key(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "^SSE" => "^SSEC".to_string(),
        other => other.to_string(),
    }
}

/// Whether `key` is one of the known benchmarks (not the portfolio).
#[must_use]
pub fn is_benchmark_key(key: &str) -> bool {
    BENCHMARK_KEYS.contains(&key)
}

/// Whether `key` trades on an Asian exchange.
#[must_use]
pub fn is_asian_market(key: &str) -> bool {
    ASIAN_MARKET_KEYS.contains(&key)
}

/// Keys in chart order: portfolio first, then alphabetical.
#[must_use]
pub fn ordered_keys(series: &SeriesMap) -> Vec<String> {
    let mut keys: Vec<String> = series.keys().cloned().collect();
    keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
        (PORTFOLIO_KEY, PORTFOLIO_KEY) => std::cmp::Ordering::Equal,
        (PORTFOLIO_KEY, _) => std::cmp::Ordering::Less,
        (_, PORTFOLIO_KEY) => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    });
    keys
}
