use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Raw snapshot files ──────────────────────────────────────────────

/// Per-date allocation weights (`composition.json`, `sectors.json`,
/// `geography.json`). Every per-ticker array is aligned by index with `dates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionSnapshot {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,

    /// Ticker → weight in percentage points. Older files call this `series`.
    #[serde(default, alias = "series")]
    pub composition: BTreeMap<String, Vec<Option<f64>>>,

    /// Portfolio value per date, used by the absolute views.
    #[serde(default)]
    pub total_values: Vec<Option<f64>>,
}

impl CompositionSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.composition.is_empty()
    }

    /// Weight of `ticker` at index `idx`, if present and finite.
    #[must_use]
    pub fn weight_at(&self, ticker: &str, idx: usize) -> Option<f64> {
        self.composition
            .get(ticker)?
            .get(idx)
            .copied()
            .flatten()
            .filter(|w| w.is_finite())
    }
}

/// Weighted P/E history (`pe_ratio.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeSnapshot {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub portfolio_pe: Vec<Option<f64>>,
    #[serde(default)]
    pub ticker_pe: BTreeMap<String, Vec<Option<f64>>>,
    #[serde(default)]
    pub ticker_weights: BTreeMap<String, Vec<Option<f64>>>,
}

/// One row of `yield_data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub forward_yield: Option<f64>,
    #[serde(default)]
    pub ttm_income: Option<f64>,
}

/// Daily FX table (`fx_daily_rates.json`): currency → date → rate against `base`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxRates {
    #[serde(default = "default_base_currency")]
    pub base: String,
    #[serde(default)]
    pub rates: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

impl FxRates {
    /// Whether `code` has at least one usable rate (the base always does).
    #[must_use]
    pub fn supports(&self, code: &str) -> bool {
        code.eq_ignore_ascii_case(&self.base)
            || self
                .rates
                .get(&code.to_ascii_uppercase())
                .is_some_and(|by_date| by_date.values().any(|r| usable_rate(*r)))
    }

    /// Rate of `code` against the base on `date`. Falls back to the closest
    /// earlier date, then to the earliest later one.
    #[must_use]
    pub fn rate_near(&self, code: &str, date: NaiveDate) -> Option<f64> {
        if code.eq_ignore_ascii_case(&self.base) {
            return Some(1.0);
        }
        let by_date = self.rates.get(&code.to_ascii_uppercase())?;
        by_date
            .range(..=date)
            .rev()
            .map(|(_, r)| *r)
            .find(|r| usable_rate(*r))
            .or_else(|| by_date.range(date..).map(|(_, r)| *r).find(|r| usable_rate(*r)))
    }

    /// `amount` in `from` expressed in `to` on `date`.
    #[must_use]
    pub fn convert(&self, amount: f64, from: &str, to: &str, date: NaiveDate) -> Option<f64> {
        if from.eq_ignore_ascii_case(to) {
            return Some(amount);
        }
        let from_rate = self.rate_near(from, date)?;
        let to_rate = self.rate_near(to, date)?;
        Some(amount * to_rate / from_rate)
    }
}

fn usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// One row of `split_history.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    pub symbol: String,
    pub split_date: NaiveDate,
    /// As written in the file, e.g. `4:1`.
    pub split_ratio: String,
    /// New shares per old share.
    pub split_multiplier: f64,
}

/// Row of `contribution_series.json`: running contributed amount per trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionEntry {
    pub trade_date: NaiveDate,
    pub amount: f64,
    #[serde(default = "default_order_type")]
    pub order_type: String,
    #[serde(default)]
    pub net_amount: f64,
    /// Zero-value start point injected before the first trade.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

fn default_order_type() -> String {
    "padding".to_string()
}

// ── Derived series ──────────────────────────────────────────────────

/// Concentration of holdings on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationPoint {
    pub date: NaiveDate,
    /// Herfindahl-Hirschman Index over normalized positive weights (0..=1).
    pub hhi: f64,
    /// `1 / hhi`: number of equally weighted holdings with the same HHI.
    pub effective_holdings: f64,
}

/// Portfolio P/E on one date with its per-ticker breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PePoint {
    pub date: NaiveDate,
    pub pe: f64,
    /// Only tickers with a known P/E on this date.
    pub ticker_pes: BTreeMap<String, f64>,
    /// Only tickers with a known weight on this date.
    pub ticker_weights: BTreeMap<String, f64>,
}

/// One yield chart sample. Missing fields stay missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPoint {
    pub date: NaiveDate,
    pub forward_yield: Option<f64>,
    pub ttm_income: Option<f64>,
}

/// Yield data inside the active range.
#[derive(Debug, Clone, PartialEq)]
pub enum YieldSnapshot {
    NoDataInRange,
    Series {
        points: Vec<YieldPoint>,
        latest_forward_yield: Option<f64>,
        latest_ttm_income: Option<f64>,
    },
}

impl std::fmt::Display for YieldSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YieldSnapshot::NoDataInRange => write!(f, "No yield data in range."),
            YieldSnapshot::Series {
                latest_forward_yield,
                latest_ttm_income,
                ..
            } => {
                let fy = latest_forward_yield
                    .map(|v| format!("{v:.2}%"))
                    .unwrap_or_else(|| "N/A".to_string());
                let ttm = latest_ttm_income
                    .map(|v| format!("${v:.2}"))
                    .unwrap_or_else(|| "N/A".to_string());
                write!(f, "Yield: {fy} | TTM Income: {ttm}")
            }
        }
    }
}

/// Percent drawdown sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    /// Percent below the high-water mark (≤ 0).
    pub value: f64,
    pub raw_value: f64,
    pub peak: f64,
}

/// Start/end comparison of a series over the active range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub start_date: NaiveDate,
    pub start_value: f64,
    pub end_date: NaiveDate,
    pub end_value: f64,
    pub net_change: f64,
}
