use std::collections::HashMap;

use chrono::{Months, NaiveDate};
use tracing::debug;

use crate::models::range::ChartDateRange;
use crate::models::series::{SeriesMap, TimeSeriesPoint, MARKET_KEY};
use crate::models::snapshot::{DrawdownPoint, SeriesSummary};

/// Trading days per year, used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Share of return pairs in a beta window that must be valid.
const MIN_VALID_PAIR_RATIO: f64 = 0.8;

/// Market returns required before any beta series is built.
const MIN_MARKET_RETURNS: usize = 20;

/// Benchmark variance below this yields a beta of 0.
const VARIANCE_EPSILON: f64 = 1e-12;

/// Derives return-based series from the cumulative performance data:
/// rolling beta, rolling volatility, rolling 1-year returns and drawdowns.
///
/// Every builder is total: malformed or short input yields an empty result.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    // ── Returns ─────────────────────────────────────────────────────

    /// Simple daily returns `v[i]/v[i-1] - 1`, dated at `i`.
    /// Steps from a zero or non-finite value are skipped.
    #[must_use]
    pub fn daily_returns(&self, points: &[TimeSeriesPoint]) -> Vec<(NaiveDate, f64)> {
        points
            .windows(2)
            .filter_map(|pair| simple_return(pair[0].value, pair[1].value).map(|r| (pair[1].date, r)))
            .collect()
    }

    // ── Beta ────────────────────────────────────────────────────────

    /// Rolling beta of `asset` against `market` over `window` daily returns.
    ///
    /// Both series are first intersected on shared dates. A value is emitted
    /// at every aligned point once `window` returns precede it.
    #[must_use]
    pub fn rolling_beta(
        &self,
        asset: &[TimeSeriesPoint],
        market: &[TimeSeriesPoint],
        window: usize,
    ) -> Vec<TimeSeriesPoint> {
        if window < 2 {
            return Vec::new();
        }
        let market_by_date: HashMap<NaiveDate, f64> =
            market.iter().map(|p| (p.date, p.value)).collect();
        let mut aligned: Vec<(NaiveDate, f64, f64)> = asset
            .iter()
            .filter_map(|p| market_by_date.get(&p.date).map(|m| (p.date, p.value, *m)))
            .collect();
        aligned.sort_by_key(|(date, _, _)| *date);
        aligned.dedup_by_key(|(date, _, _)| *date);

        if aligned.len() <= window {
            return Vec::new();
        }

        // returns[r] is the step from aligned[r] to aligned[r + 1].
        let returns: Vec<(Option<f64>, Option<f64>)> = aligned
            .windows(2)
            .map(|pair| {
                (
                    simple_return(pair[0].1, pair[1].1),
                    simple_return(pair[0].2, pair[1].2),
                )
            })
            .collect();

        let min_pairs = ((window as f64) * MIN_VALID_PAIR_RATIO).ceil().max(2.0) as usize;
        let mut out = Vec::new();
        for end in (window - 1)..returns.len() {
            let pairs: Vec<(f64, f64)> = returns[end + 1 - window..=end]
                .iter()
                .filter_map(|(a, m)| Some(((*a)?, (*m)?)))
                .collect();
            if pairs.len() < min_pairs {
                continue;
            }
            let beta = beta_of(&pairs);
            out.push(TimeSeriesPoint::new(aligned[end + 1].0, beta));
        }
        out
    }

    /// Beta of every performance key against the market key.
    ///
    /// The market key itself is exactly 1.0 wherever its window is full.
    /// Nothing is built when the market has fewer than 20 returns.
    #[must_use]
    pub fn build_beta_series(&self, performance: &SeriesMap, window: usize) -> SeriesMap {
        let Some(market) = performance.get(MARKET_KEY) else {
            return SeriesMap::new();
        };
        let market_returns = self.daily_returns(market).len();
        if market_returns < MIN_MARKET_RETURNS {
            debug!(market_returns, "not enough market returns for beta");
            return SeriesMap::new();
        }

        let mut out = SeriesMap::new();
        for (key, points) in performance {
            let series = if key == MARKET_KEY {
                self.rolling_beta(market, market, window)
                    .into_iter()
                    .map(|p| TimeSeriesPoint::new(p.date, 1.0))
                    .collect()
            } else {
                self.rolling_beta(points, market, window)
            };
            if !series.is_empty() {
                out.insert(key.clone(), series);
            }
        }
        out
    }

    // ── Rolling windows ─────────────────────────────────────────────

    /// Annualized rolling volatility in percent: sample standard deviation
    /// of `window` daily returns times `sqrt(252)`.
    #[must_use]
    pub fn rolling_volatility(&self, points: &[TimeSeriesPoint], window: usize) -> Vec<TimeSeriesPoint> {
        if window < 2 {
            return Vec::new();
        }
        let returns = self.daily_returns(points);
        returns
            .windows(window)
            .map(|slice| {
                let n = slice.len() as f64;
                let mean = slice.iter().map(|(_, r)| r).sum::<f64>() / n;
                let variance = slice.iter().map(|(_, r)| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
                let annualized = variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
                TimeSeriesPoint::new(slice[slice.len() - 1].0, annualized)
            })
            .collect()
    }

    /// Trailing 1-year return in percent at every point that has a sample
    /// at least twelve months earlier.
    #[must_use]
    pub fn rolling_returns(&self, points: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
        let mut out = Vec::new();
        for (i, current) in points.iter().enumerate() {
            let Some(year_ago) = current.date.checked_sub_months(Months::new(12)) else {
                continue;
            };
            let start = points[..i].iter().rev().find(|p| p.date <= year_ago);
            if let Some(start) = start {
                if start.value != 0.0 && start.value.is_finite() && current.value.is_finite() {
                    let value = (current.value / start.value - 1.0) * 100.0;
                    out.push(TimeSeriesPoint::new(current.date, value));
                }
            }
        }
        out
    }

    // ── Drawdown ────────────────────────────────────────────────────

    /// Highest finite value dated strictly before `before`, or `-∞`.
    #[must_use]
    pub fn historical_peak(&self, points: &[TimeSeriesPoint], before: NaiveDate) -> f64 {
        points
            .iter()
            .filter(|p| p.date < before && p.value.is_finite())
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Absolute drawdown: `value - running peak`, seeded with
    /// `historical_peak`. Always ≤ 0.
    #[must_use]
    pub fn drawdown_absolute(&self, points: &[TimeSeriesPoint], historical_peak: f64) -> Vec<TimeSeriesPoint> {
        let mut sorted: Vec<&TimeSeriesPoint> = points.iter().filter(|p| p.value.is_finite()).collect();
        sorted.sort_by_key(|p| p.date);

        let mut peak = historical_peak;
        sorted
            .into_iter()
            .map(|p| {
                peak = peak.max(p.value);
                TimeSeriesPoint::new(p.date, p.value - peak)
            })
            .collect()
    }

    /// Percent drawdown from the high-water mark.
    #[must_use]
    pub fn drawdown_percent(&self, points: &[TimeSeriesPoint]) -> Vec<DrawdownPoint> {
        let mut sorted: Vec<&TimeSeriesPoint> = points.iter().filter(|p| p.value.is_finite()).collect();
        sorted.sort_by_key(|p| p.date);

        let mut hwm = f64::NEG_INFINITY;
        sorted
            .into_iter()
            .map(|p| {
                hwm = hwm.max(p.value);
                let safe_peak = if hwm > 0.0 { hwm } else { 1.0 };
                DrawdownPoint {
                    date: p.date,
                    value: (p.value - hwm) / safe_peak * 100.0,
                    raw_value: p.value,
                    peak: hwm,
                }
            })
            .collect()
    }

    // ── Summary ─────────────────────────────────────────────────────

    /// Start/end values of a series over `range`.
    ///
    /// The start is the last point on or before `range.from` (else the first
    /// point after it); the end is the last point on or before `range.to`
    /// (else the first after it). `None` when the series does not reach the
    /// range.
    #[must_use]
    pub fn summarize_series(&self, points: &[TimeSeriesPoint], range: ChartDateRange) -> Option<SeriesSummary> {
        let mut sorted: Vec<&TimeSeriesPoint> = points.iter().filter(|p| p.value.is_finite()).collect();
        sorted.sort_by_key(|p| p.date);
        let first = *sorted.first()?;
        let last = *sorted.last()?;

        if range.to.is_some_and(|to| to < first.date) {
            return None;
        }
        let from = range.from.unwrap_or(first.date);
        let to = range.to.unwrap_or(last.date);

        let pick = |anchor: NaiveDate| {
            sorted
                .iter()
                .rev()
                .find(|p| p.date <= anchor)
                .or_else(|| sorted.iter().find(|p| p.date >= anchor))
                .copied()
        };
        let start = pick(from)?;
        let end = pick(to)?;
        if end.date < start.date {
            return None;
        }
        Some(SeriesSummary {
            start_date: start.date,
            start_value: start.value,
            end_date: end.date,
            end_value: end.value,
            net_change: end.value - start.value,
        })
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

fn simple_return(prev: f64, next: f64) -> Option<f64> {
    if prev == 0.0 || !prev.is_finite() || !next.is_finite() {
        return None;
    }
    Some(next / prev - 1.0)
}

/// `Cov(a, m) / Var(m)` over paired returns.
fn beta_of(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_m = pairs.iter().map(|(_, m)| m).sum::<f64>() / n;
    let (cov, var) = pairs.iter().fold((0.0, 0.0), |(cov, var), (a, m)| {
        let dm = m - mean_m;
        (cov + (a - mean_a) * dm, var + dm * dm)
    });
    if var / (n - 1.0) < VARIANCE_EPSILON {
        return 0.0;
    }
    cov / var
}
