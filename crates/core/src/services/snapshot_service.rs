use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::range::ChartDateRange;
use crate::models::series::{SeriesMap, TimeSeriesPoint};
use crate::models::snapshot::{
    CompositionSnapshot, ConcentrationPoint, ContributionEntry, FxRates, PePoint, PeSnapshot,
    YieldEntry, YieldPoint, YieldSnapshot,
};

/// Series key of the forward-yield line on the yield chart.
pub const FORWARD_YIELD_KEY: &str = "forwardYield";
/// Series key of the trailing income line on the yield chart.
pub const TTM_INCOME_KEY: &str = "ttmIncome";
/// Series key of the portfolio P/E line.
pub const PE_KEY: &str = "pe";
/// Series key of the HHI line.
pub const HHI_KEY: &str = "hhi";
/// Series keys of the contribution chart.
pub const CONTRIBUTION_KEY: &str = "contribution";
pub const BALANCE_KEY: &str = "balance";

/// Weight share of one holding in the latest composition snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingWeight {
    pub ticker: String,
    /// Share of the positive total, in percent.
    pub weight: f64,
}

/// Concentration figures for the latest composition snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationSummary {
    pub date: NaiveDate,
    pub hhi: f64,
    pub effective_holdings: f64,
    /// Heaviest first.
    pub holdings: Vec<HoldingWeight>,
}

impl ConcentrationSummary {
    /// Combined weight of the `n` heaviest holdings, in percent.
    #[must_use]
    pub fn top_weight(&self, n: usize) -> f64 {
        self.holdings.iter().take(n).map(|h| h.weight).sum()
    }
}

/// Builds chart series from the allocation, valuation, yield and FX
/// snapshot files.
pub struct SnapshotService;

impl SnapshotService {
    pub fn new() -> Self {
        Self
    }

    // ── Concentration ───────────────────────────────────────────────

    /// HHI over normalized positive weights for every date in `range`.
    /// Dates without a positive weight produce no point.
    #[must_use]
    pub fn concentration_series(
        &self,
        snapshot: &CompositionSnapshot,
        range: ChartDateRange,
    ) -> Vec<ConcentrationPoint> {
        snapshot
            .dates
            .iter()
            .enumerate()
            .filter(|(_, date)| range.contains(**date))
            .filter_map(|(idx, date)| {
                let weights = positive_weights(snapshot, idx);
                let hhi = hhi(weights.iter().map(|(_, w)| *w))?;
                Some(ConcentrationPoint {
                    date: *date,
                    hhi,
                    effective_holdings: 1.0 / hhi,
                })
            })
            .collect()
    }

    /// Concentration of the most recent date that carries any weight.
    #[must_use]
    pub fn latest_concentration(&self, snapshot: &CompositionSnapshot) -> Option<ConcentrationSummary> {
        snapshot.dates.iter().enumerate().rev().find_map(|(idx, date)| {
            let weights = positive_weights(snapshot, idx);
            let hhi = hhi(weights.iter().map(|(_, w)| *w))?;
            let total: f64 = weights.iter().map(|(_, w)| w).sum();
            let mut holdings: Vec<HoldingWeight> = weights
                .into_iter()
                .map(|(ticker, w)| HoldingWeight {
                    ticker,
                    weight: w / total * 100.0,
                })
                .collect();
            holdings.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.ticker.cmp(&b.ticker)));
            Some(ConcentrationSummary {
                date: *date,
                hhi,
                effective_holdings: 1.0 / hhi,
                holdings,
            })
        })
    }

    // ── P/E ─────────────────────────────────────────────────────────

    /// Zip the parallel P/E arrays. Dates without a finite portfolio P/E are
    /// skipped; missing per-ticker values are omitted, never zeroed.
    #[must_use]
    pub fn pe_series(&self, snapshot: &PeSnapshot, range: ChartDateRange) -> Vec<PePoint> {
        snapshot
            .dates
            .iter()
            .enumerate()
            .filter(|(_, date)| range.contains(**date))
            .filter_map(|(idx, date)| {
                let pe = snapshot
                    .portfolio_pe
                    .get(idx)
                    .copied()
                    .flatten()
                    .filter(|v| v.is_finite())?;
                Some(PePoint {
                    date: *date,
                    pe,
                    ticker_pes: column_at(&snapshot.ticker_pe, idx),
                    ticker_weights: column_at(&snapshot.ticker_weights, idx),
                })
            })
            .collect()
    }

    // ── Yield ───────────────────────────────────────────────────────

    #[must_use]
    pub fn yield_snapshot(&self, entries: &[YieldEntry], range: ChartDateRange) -> YieldSnapshot {
        let mut points: Vec<YieldPoint> = entries
            .iter()
            .filter(|e| range.contains(e.date))
            .map(|e| YieldPoint {
                date: e.date,
                forward_yield: e.forward_yield.filter(|v| v.is_finite()),
                ttm_income: e.ttm_income.filter(|v| v.is_finite()),
            })
            .collect();
        if points.is_empty() {
            return YieldSnapshot::NoDataInRange;
        }
        points.sort_by_key(|p| p.date);
        let latest_forward_yield = points.iter().rev().find_map(|p| p.forward_yield);
        let latest_ttm_income = points.iter().rev().find_map(|p| p.ttm_income);
        YieldSnapshot::Series {
            points,
            latest_forward_yield,
            latest_ttm_income,
        }
    }

    /// Yield snapshot as chart lines keyed `forwardYield` / `ttmIncome`.
    #[must_use]
    pub fn yield_series(&self, snapshot: &YieldSnapshot) -> SeriesMap {
        let mut out = SeriesMap::new();
        if let YieldSnapshot::Series { points, .. } = snapshot {
            let forward: Vec<TimeSeriesPoint> = points
                .iter()
                .filter_map(|p| p.forward_yield.map(|v| TimeSeriesPoint::new(p.date, v)))
                .collect();
            let income: Vec<TimeSeriesPoint> = points
                .iter()
                .filter_map(|p| p.ttm_income.map(|v| TimeSeriesPoint::new(p.date, v)))
                .collect();
            if !forward.is_empty() {
                out.insert(FORWARD_YIELD_KEY.to_string(), forward);
            }
            if !income.is_empty() {
                out.insert(TTM_INCOME_KEY.to_string(), income);
            }
        }
        out
    }

    // ── Allocation ──────────────────────────────────────────────────

    /// Per-ticker weight lines for `range`. With `absolute`, weights are
    /// scaled by the portfolio total on each date. A non-empty `tickers`
    /// list restricts the output to those tickers.
    #[must_use]
    pub fn composition_series(
        &self,
        snapshot: &CompositionSnapshot,
        range: ChartDateRange,
        tickers: &[String],
        absolute: bool,
    ) -> SeriesMap {
        let mut out = SeriesMap::new();
        for ticker in snapshot.composition.keys() {
            if !tickers.is_empty() && !tickers.iter().any(|t| t.eq_ignore_ascii_case(ticker)) {
                continue;
            }
            let points: Vec<TimeSeriesPoint> = snapshot
                .dates
                .iter()
                .enumerate()
                .filter(|(_, date)| range.contains(**date))
                .filter_map(|(idx, date)| {
                    let weight = snapshot.weight_at(ticker, idx)?;
                    let value = if absolute {
                        let total = snapshot
                            .total_values
                            .get(idx)
                            .copied()
                            .flatten()
                            .filter(|v| v.is_finite())
                            .unwrap_or(0.0);
                        total * weight / 100.0
                    } else {
                        weight
                    };
                    Some(TimeSeriesPoint::new(*date, value))
                })
                .collect();
            if !points.is_empty() {
                out.insert(ticker.clone(), points);
            }
        }
        out
    }

    // ── FX ──────────────────────────────────────────────────────────

    /// Units of `currency` per one unit of `base` on `date`.
    #[must_use]
    pub fn cross_rate(&self, fx: &FxRates, base: &str, currency: &str, date: NaiveDate) -> Option<f64> {
        let per_reference = |code: &str| -> Option<f64> {
            if code.eq_ignore_ascii_case(&fx.base) {
                return Some(1.0);
            }
            fx.rates.get(code)?.get(&date).copied().filter(|r| r.is_finite() && *r > 0.0)
        };
        Some(per_reference(currency)? / per_reference(base)?)
    }

    /// Percent change of each currency against `base` since the first date
    /// in `range`.
    #[must_use]
    pub fn fx_series(&self, fx: &FxRates, base: &str, range: ChartDateRange) -> SeriesMap {
        let base = base.to_ascii_uppercase();
        let mut currencies: Vec<&str> = fx.rates.keys().map(String::as_str).collect();
        if !base.eq_ignore_ascii_case(&fx.base) {
            currencies.push(fx.base.as_str());
        }

        let mut out = SeriesMap::new();
        for currency in currencies {
            if currency.eq_ignore_ascii_case(&base) {
                continue;
            }
            let dates = fx
                .rates
                .get(currency)
                .or_else(|| fx.rates.get(&base))
                .map(|by_date| by_date.keys().copied().collect::<Vec<_>>())
                .unwrap_or_default();
            let raw: Vec<(NaiveDate, f64)> = dates
                .into_iter()
                .filter(|date| range.contains(*date))
                .filter_map(|date| self.cross_rate(fx, &base, currency, date).map(|r| (date, r)))
                .collect();
            let Some((_, first)) = raw.first() else {
                continue;
            };
            let safe_base = if *first != 0.0 { *first } else { 1.0 };
            let points = raw
                .iter()
                .map(|(date, rate)| TimeSeriesPoint::new(*date, (rate - safe_base) / safe_base * 100.0))
                .collect();
            out.insert(currency.to_string(), points);
        }
        out
    }

    // ── Contribution ────────────────────────────────────────────────

    /// Running contribution amounts as a chart line.
    #[must_use]
    pub fn contribution_series(&self, entries: &[ContributionEntry]) -> Vec<TimeSeriesPoint> {
        let mut points: Vec<TimeSeriesPoint> = entries
            .iter()
            .filter(|e| e.amount.is_finite())
            .map(|e| {
                if e.synthetic {
                    TimeSeriesPoint::synthetic(e.trade_date, e.amount)
                } else {
                    TimeSeriesPoint::new(e.trade_date, e.amount)
                }
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points
    }
}

impl Default for SnapshotService {
    fn default() -> Self {
        Self::new()
    }
}

/// Positive finite weights at `idx`, by ticker.
fn positive_weights(snapshot: &CompositionSnapshot, idx: usize) -> Vec<(String, f64)> {
    snapshot
        .composition
        .keys()
        .filter_map(|ticker| {
            snapshot
                .weight_at(ticker, idx)
                .filter(|w| *w > 0.0)
                .map(|w| (ticker.clone(), w))
        })
        .collect()
}

/// `Σ (wᵢ / Σw)²`, or `None` when nothing is positive.
fn hhi(weights: impl Iterator<Item = f64> + Clone) -> Option<f64> {
    let total: f64 = weights.clone().sum();
    if total <= 0.0 {
        return None;
    }
    Some(weights.map(|w| (w / total).powi(2)).sum())
}

fn column_at(table: &BTreeMap<String, Vec<Option<f64>>>, idx: usize) -> BTreeMap<String, f64> {
    table
        .iter()
        .filter_map(|(ticker, values)| {
            values
                .get(idx)
                .copied()
                .flatten()
                .filter(|v| v.is_finite())
                .map(|v| (ticker.clone(), v))
        })
        .collect()
}
