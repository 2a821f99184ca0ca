use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::chart::{ChartKind, ChartLayout, LayoutSeries, TimeInterpolator, YearTick};
use crate::models::range::ChartDateRange;
use crate::models::series::{
    date_to_millis, is_benchmark_key, millis_to_date, ordered_keys, SeriesMap, TimeSeriesPoint,
    BENCHMARK_KEYS, DAY_MS, PORTFOLIO_KEY,
};
use crate::models::settings::DashboardConfig;
use crate::models::snapshot::{CompositionSnapshot, ContributionEntry};
use crate::models::state::TransactionState;
use crate::models::transaction::{OrderType, Transaction};
use crate::services::analytics_service::AnalyticsService;
use crate::services::currency_service::{CurrencyConverter, SOURCE_CURRENCY};
use crate::services::snapshot_service::{
    SnapshotService, BALANCE_KEY, CONTRIBUTION_KEY, HHI_KEY, PE_KEY,
};

/// Two points closer than this are treated as the same instant.
pub const DUPLICATE_POINT_TOLERANCE_MS: i64 = 1000;

/// Quarter ticks this far outside the data span are still drawn.
const QUARTER_TICK_SLACK_MS: i64 = 30 * DAY_MS;

/// Spans up to this many calendar months use quarterly ticks.
const SINGLE_YEAR_MAX_MONTHS: i32 = 15;

const DESIRED_VALUE_TICKS: usize = 6;
const MIN_VALUE_TICKS: usize = 5;
const MAX_TICK_RETRIES: usize = 6;
const MIN_PERCENT_TICK_SPACING: f64 = 1e-2;
/// Upper bound on ticks from one run, whatever the spacing.
const MAX_TICK_COUNT: usize = 1000;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Percent-axis tick placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentTickInfo {
    pub ticks: Vec<f64>,
    pub spacing: f64,
    pub start: f64,
    pub end: f64,
}

/// Turns view state plus loaded data into the series each chart draws,
/// and lays them out for rendering.
///
/// Series are filtered to the active date range and patched at the left
/// edge so lines start at the range boundary instead of floating inside it.
/// Money series are drawn in the display currency picked by
/// [`CurrencyConverter::for_state`].
pub struct ChartService {
    analytics: AnalyticsService,
    snapshots: SnapshotService,
    beta_window: usize,
    volatility_window: usize,
    /// Last day a filtered contribution line is padded to.
    today: NaiveDate,
}

impl ChartService {
    pub fn new() -> Self {
        Self::with_config(&DashboardConfig::default())
    }

    pub fn with_config(config: &DashboardConfig) -> Self {
        Self {
            analytics: AnalyticsService::new(),
            snapshots: SnapshotService::new(),
            beta_window: config.beta_window,
            volatility_window: config.volatility_window,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Pin "today" for contribution padding.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    #[must_use]
    pub fn snapshots(&self) -> &SnapshotService {
        &self.snapshots
    }

    // ── Range helpers ───────────────────────────────────────────────

    /// Points inside `range`, bounds inclusive.
    #[must_use]
    pub fn filter_to_range(points: &[TimeSeriesPoint], range: ChartDateRange) -> Vec<TimeSeriesPoint> {
        points.iter().filter(|p| range.contains(p.date)).cloned().collect()
    }

    /// Points whose time lies inside `[min_time, max_time]`.
    #[must_use]
    pub fn constrain_to_range(
        points: &[TimeSeriesPoint],
        min_time: Option<i64>,
        max_time: Option<i64>,
    ) -> Vec<TimeSeriesPoint> {
        points
            .iter()
            .filter(|p| {
                let t = p.time();
                min_time.map_or(true, |min| t >= min) && max_time.map_or(true, |max| t <= max)
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn create_time_interpolator(points: &[TimeSeriesPoint]) -> Option<TimeInterpolator> {
        TimeInterpolator::new(points)
    }

    // ── Left-edge continuity ────────────────────────────────────────

    /// Restore the synthetic point that precedes the first visible point in
    /// the full series.
    ///
    /// A synthetic point before `filter_from` is clamped onto `filter_from`
    /// unless a point already sits there. One inside the window is kept
    /// when its value is zero.
    #[must_use]
    pub fn inject_synthetic_start_point(
        filtered: Vec<TimeSeriesPoint>,
        full: &[TimeSeriesPoint],
        filter_from: Option<NaiveDate>,
    ) -> Vec<TimeSeriesPoint> {
        let Some(first) = filtered.first() else {
            return filtered;
        };
        let first_time = first.time();
        let idx = match full.iter().position(|p| p.time() == first_time) {
            Some(idx) if idx > 0 => idx,
            _ => return filtered,
        };
        let previous = &full[idx - 1];
        if !previous.synthetic {
            return filtered;
        }

        if let Some(from) = filter_from.filter(|from| previous.date < *from) {
            if (first_time - date_to_millis(from)).abs() < DUPLICATE_POINT_TOLERANCE_MS {
                return filtered;
            }
            let mut clamped = previous.clone();
            clamped.date = from;
            clamped.synthetic = true;
            return prepend(clamped, filtered);
        }

        if !previous.value.is_finite() || previous.value.abs() > 1e-6 || previous.time() == first_time {
            return filtered;
        }
        prepend(TimeSeriesPoint::synthetic(previous.date, previous.value), filtered)
    }

    /// Hold the last real value before `filter_from` flat up to the first
    /// visible point.
    #[must_use]
    pub fn inject_carry_forward_start_point(
        filtered: Vec<TimeSeriesPoint>,
        full: &[TimeSeriesPoint],
        filter_from: Option<NaiveDate>,
    ) -> Vec<TimeSeriesPoint> {
        let Some(from) = filter_from else {
            return filtered;
        };
        let from_time = date_to_millis(from);
        if filtered
            .first()
            .is_some_and(|p| (p.time() - from_time).abs() < DUPLICATE_POINT_TOLERANCE_MS)
        {
            return filtered;
        }
        let prior = full
            .iter()
            .filter(|p| !p.synthetic && p.date < from && p.value.is_finite())
            .max_by_key(|p| p.date);
        match prior {
            Some(prior) => prepend(TimeSeriesPoint::carry_forward(from, prior.value), filtered),
            None => filtered,
        }
    }

    /// Find the key of `map` to read a benchmark quote for `date`.
    ///
    /// Asian exchanges close before the US session opens, so their quote for
    /// a US date is searched on the preceding days first.
    #[must_use]
    pub fn resolve_benchmark_date_key<V>(
        map: &BTreeMap<String, V>,
        date: NaiveDate,
        is_asian: bool,
    ) -> Option<String> {
        let offsets: &[i64] = if is_asian { &[-1, -2, -3, -4, 0, 1] } else { &[0] };
        offsets.iter().find_map(|offset| {
            let key = (date + Duration::days(*offset)).format("%Y-%m-%d").to_string();
            map.contains_key(&key).then_some(key)
        })
    }

    // ── Axis ticks ──────────────────────────────────────────────────

    /// X-axis ticks for `[min_time, max_time]` (epoch ms).
    ///
    /// Spans within one year or up to 15 months get quarterly ticks with the
    /// year shown once; longer spans get a tick per January. Labels never
    /// repeat and ticks closer than `max(1d, min(10d, span/15))` collapse,
    /// year boundaries winning.
    #[must_use]
    pub fn generate_year_based_ticks(min_time: i64, max_time: i64) -> Vec<YearTick> {
        let start = millis_to_date(min_time);
        let end = millis_to_date(max_time);
        let span_months = (end.year() - start.year()) * 12 + (end.month0() as i32 - start.month0() as i32) + 1;
        let single_year = start.year() == end.year() || span_months <= SINGLE_YEAR_MAX_MONTHS;

        let mut ticks = Vec::new();
        if single_year {
            let year = primary_year(start, end);
            let quarters = [(1, year.to_string(), true), (4, "Apr".into(), false), (7, "Jul".into(), false), (10, "Oct".into(), false)];
            for (month, label, is_year_start) in quarters {
                let Some(time) = month_start_millis(year, month) else {
                    continue;
                };
                if time >= min_time - QUARTER_TICK_SLACK_MS && time <= max_time + QUARTER_TICK_SLACK_MS {
                    ticks.push(YearTick { time, label, is_year_start });
                }
            }
            if start.year() != end.year() && year == start.year() {
                if let Some(time) = month_start_millis(end.year(), 1) {
                    if time >= min_time && time <= max_time {
                        ticks.push(YearTick {
                            time,
                            label: end.year().to_string(),
                            is_year_start: true,
                        });
                    }
                }
            }
        } else {
            for year in start.year()..=end.year() {
                if let Some(time) = month_start_millis(year, 1) {
                    if time >= min_time && time <= max_time {
                        ticks.push(YearTick {
                            time,
                            label: year.to_string(),
                            is_year_start: true,
                        });
                    }
                }
            }
        }

        // End tick.
        let end_is_jan = end.month() == 1;
        let has_year_tick = ticks
            .iter()
            .any(|t| t.is_year_start && millis_to_date(t.time).year() == end.year());
        let end_label = match (end_is_jan, has_year_tick) {
            (true, true) => "Jan".to_string(),
            (true, false) => end.year().to_string(),
            (false, _) => month_abbr(end).to_string(),
        };
        ticks.push(YearTick {
            time: max_time,
            label: end_label,
            is_year_start: end_is_jan && !has_year_tick,
        });

        // Start tick.
        let start_is_jan = start.month() == 1;
        let (start_label, start_is_year) = if single_year {
            let display_year = if start.year() == end.year() || start.month0() < 6 {
                start.year()
            } else {
                end.year()
            };
            (display_year.to_string(), true)
        } else if start_is_jan {
            (start.year().to_string(), true)
        } else {
            (month_abbr(start).to_string(), false)
        };
        if !ticks.iter().any(|t| t.time == min_time) {
            ticks.push(YearTick {
                time: min_time,
                label: start_label,
                is_year_start: start_is_year,
            });
        }

        ticks.sort_by_key(|t| t.time);
        dedupe_ticks(ticks, max_time - min_time)
    }

    /// Y-axis tick values. Percent axes use [`Self::compute_percent_tick_info`].
    #[must_use]
    pub fn generate_value_ticks(y_min: f64, y_max: f64, percent: bool) -> Vec<f64> {
        if percent {
            let info = Self::compute_percent_tick_info(y_min, y_max);
            let margin = info.spacing * 0.25;
            return info
                .ticks
                .into_iter()
                .filter(|t| *t >= y_min - margin && *t <= y_max + margin)
                .collect();
        }

        let (mut y_min, mut y_max) = (y_min, y_max);
        let mut range = y_max - y_min;
        if !range.is_finite() || range <= 1e-9 {
            let base = if y_min.abs() < 1e-9 { 100.0 } else { y_min.abs() };
            let margin = base * 0.05;
            let margin = if margin < 1e-9 { 1.0 } else { margin };
            y_min -= margin;
            y_max += margin;
            range = y_max - y_min;
        }

        let mut spacing = initial_spacing(range);
        if spacing == 0.0 || !spacing.is_finite() {
            spacing = 10f64.powf(range.abs().log10().floor());
        }
        spacing = spacing.max(1e-6);

        let mut result = Vec::new();
        for retry in 0..MAX_TICK_RETRIES {
            if spacing <= 1e-9 {
                break;
            }
            let floor = (y_min / spacing).floor() * spacing;
            let nice_min = if y_min >= 0.0 { floor.max(0.0) } else { floor };
            let nice_max = (y_max / spacing).ceil() * spacing;
            let view: Vec<f64> = tick_run(nice_min, nice_max, spacing)
                .into_iter()
                .filter(|t| *t >= y_min - spacing * 0.25 && *t <= y_max + spacing * 0.25)
                .collect();
            if view.len() >= MIN_VALUE_TICKS || retry == MAX_TICK_RETRIES - 1 {
                result = view;
                break;
            }
            spacing /= 2.0;
        }
        result
    }

    /// Tick placement for percent axes; spacing never drops below 0.01.
    #[must_use]
    pub fn compute_percent_tick_info(y_min: f64, y_max: f64) -> PercentTickInfo {
        let safe_min = if y_min.is_finite() { y_min } else { 0.0 };
        let safe_max = if y_max.is_finite() { y_max } else { safe_min };
        let min_value = safe_min.min(safe_max);
        let mut max_value = safe_min.max(safe_max);
        if max_value - min_value < 1e-6 {
            max_value = min_value + 1.0;
        }
        let range = max_value - min_value;

        let mut spacing = initial_spacing(range);
        if spacing == 0.0 || !spacing.is_finite() {
            spacing = range / (DESIRED_VALUE_TICKS - 1) as f64;
        }
        spacing = spacing.max(MIN_PERCENT_TICK_SPACING);

        let mut info = PercentTickInfo {
            ticks: Vec::new(),
            spacing,
            start: 0.0,
            end: 0.0,
        };
        for retry in 0..MAX_TICK_RETRIES {
            let start = (min_value / spacing).floor() * spacing;
            let end = (max_value / spacing).ceil() * spacing;
            let ticks = tick_run(start, end, spacing);
            let in_view = ticks
                .iter()
                .filter(|t| **t >= min_value - spacing * 0.25 && **t <= max_value + spacing * 0.25)
                .count();
            info = PercentTickInfo { ticks, spacing, start, end };
            if in_view >= MIN_VALUE_TICKS || retry == MAX_TICK_RETRIES - 1 {
                break;
            }
            let halved = spacing / 2.0;
            if halved < MIN_PERCENT_TICK_SPACING {
                break;
            }
            spacing = halved;
        }
        info
    }

    // ── Chart series ────────────────────────────────────────────────

    /// Series drawn by `kind` under the current state: visible keys only,
    /// filtered to the active range, left edge patched.
    #[must_use]
    pub fn series_for(&self, state: &TransactionState, kind: ChartKind) -> SeriesMap {
        let range = state.chart_date_range;
        let data = &state.data;
        let series = match kind {
            ChartKind::Contribution => self.contribution_chart(state),
            ChartKind::DrawdownAbs => {
                let mut out = SeriesMap::new();
                let balance = balance_for(state, &CurrencyConverter::for_state(state));
                if !balance.is_empty() {
                    let peak = range
                        .from
                        .map_or(f64::NEG_INFINITY, |from| self.analytics.historical_peak(&balance, from));
                    let visible = Self::filter_to_range(&balance, range);
                    out.insert(BALANCE_KEY.to_string(), self.analytics.drawdown_absolute(&visible, peak));
                }
                out
            }
            ChartKind::Performance => self.per_performance_key(state, |points| {
                let filtered = Self::filter_to_range(points, range);
                rebase_to_percent(&filtered)
            }),
            ChartKind::Drawdown => self.per_performance_key(state, |points| {
                let drawdown: Vec<TimeSeriesPoint> = self
                    .analytics
                    .drawdown_percent(points)
                    .into_iter()
                    .map(|p| TimeSeriesPoint::new(p.date, p.value))
                    .collect();
                Self::filter_to_range(&drawdown, range)
            }),
            ChartKind::Rolling => self.per_performance_key(state, |points| {
                Self::filter_to_range(&self.analytics.rolling_returns(points), range)
            }),
            ChartKind::Volatility => self.per_performance_key(state, |points| {
                Self::filter_to_range(&self.analytics.rolling_volatility(points, self.volatility_window), range)
            }),
            ChartKind::Beta => self.beta_chart(state),
            ChartKind::Composition | ChartKind::CompositionAbs => {
                self.allocation_chart(state, kind, data.composition.as_ref(), &state.composition_tickers)
            }
            ChartKind::Sectors | ChartKind::SectorsAbs => {
                self.allocation_chart(state, kind, data.sectors.as_ref(), &[])
            }
            ChartKind::Geography | ChartKind::GeographyAbs => {
                self.allocation_chart(state, kind, data.geography.as_ref(), &[])
            }
            ChartKind::Fx => data
                .fx
                .as_ref()
                .map(|fx| self.snapshots.fx_series(fx, &state.selected_currency, range))
                .unwrap_or_default(),
            ChartKind::Concentration => {
                let points: Vec<TimeSeriesPoint> = data
                    .composition
                    .as_ref()
                    .map(|snap| {
                        self.snapshots
                            .concentration_series(snap, range)
                            .into_iter()
                            .map(|p| TimeSeriesPoint::new(p.date, p.hhi))
                            .collect()
                    })
                    .unwrap_or_default();
                single_series(HHI_KEY, points)
            }
            ChartKind::Pe => {
                let points: Vec<TimeSeriesPoint> = data
                    .pe
                    .as_ref()
                    .map(|snap| {
                        self.snapshots
                            .pe_series(snap, range)
                            .into_iter()
                            .map(|p| TimeSeriesPoint::new(p.date, p.pe))
                            .collect()
                    })
                    .unwrap_or_default();
                single_series(PE_KEY, points)
            }
            ChartKind::Yield => {
                let snapshot = self.snapshots.yield_snapshot(&data.yields, range);
                self.snapshots.yield_series(&snapshot)
            }
        };

        let visible: SeriesMap = series
            .into_iter()
            .filter(|(key, points)| !points.is_empty() && is_visible(state, kind, key))
            .collect();
        debug!(chart = %kind, series = visible.len(), "built chart series");
        visible
    }

    /// Layout of `series`: time span, padded value bounds and one
    /// interpolator per series. `None` when nothing is drawable.
    #[must_use]
    pub fn build_layout(&self, kind: ChartKind, series: &SeriesMap) -> Option<ChartLayout> {
        let mut layout_series = Vec::new();
        for key in ordered_keys(series) {
            let points = series.get(&key).cloned().unwrap_or_default();
            if let Some(interpolator) = TimeInterpolator::new(&points) {
                layout_series.push(LayoutSeries {
                    key,
                    points,
                    interpolator,
                });
            }
        }
        let min_time = layout_series.iter().map(|s| s.interpolator.first_time()).min()?;
        let max_time = layout_series.iter().map(|s| s.interpolator.last_time()).max()?;

        let values = layout_series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.value))
            .filter(|v| v.is_finite());
        let (data_min, data_max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let ticks = Self::generate_value_ticks(data_min, data_max, kind.is_percent_axis());
        let min_value = ticks.first().copied().map_or(data_min, |t| t.min(data_min));
        let max_value = ticks.last().copied().map_or(data_max, |t| t.max(data_max));

        Some(ChartLayout {
            kind,
            min_time,
            max_time,
            min_value,
            max_value,
            series: layout_series,
        })
    }

    /// Layout of the active chart, rebuilt from scratch.
    #[must_use]
    pub fn active_layout(&self, state: &TransactionState) -> Option<ChartLayout> {
        let kind = state.active_chart?;
        let series = self.series_for(state, kind);
        self.build_layout(kind, &series)
    }

    // ── Contribution ────────────────────────────────────────────────

    /// Running net contribution built from individual trades, one entry per
    /// trade date. Gaps are padded with the day before the next trade; the
    /// tail is padded to `pad_to`; a zero start point precedes the first trade.
    #[must_use]
    pub fn contribution_from_transactions(
        &self,
        transactions: &[Transaction],
        pad_to: NaiveDate,
    ) -> Vec<ContributionEntry> {
        let mut daily: BTreeMap<NaiveDate, (f64, Vec<OrderType>)> = BTreeMap::new();
        for tx in transactions {
            let entry = daily.entry(tx.trade_date).or_insert((0.0, Vec::new()));
            entry.0 += tx.net_amount;
            if !entry.1.contains(&tx.order_type) {
                entry.1.push(tx.order_type);
            }
        }

        let mut out: Vec<ContributionEntry> = Vec::new();
        let mut cumulative = 0.0;
        let mut previous: Option<NaiveDate> = None;
        for (date, (net, types)) in daily {
            if let (Some(prev), Some(day_before)) = (previous, date.pred_opt()) {
                if day_before > prev {
                    out.push(padding_entry(day_before, cumulative));
                }
            }
            cumulative += net;
            let order_type = match types.as_slice() {
                [single] => single.to_string().to_lowercase(),
                _ => "mixed".to_string(),
            };
            out.push(ContributionEntry {
                trade_date: date,
                amount: cumulative,
                order_type,
                net_amount: net,
                synthetic: false,
            });
            previous = Some(date);
        }

        if let Some(last) = out.last() {
            if pad_to > last.trade_date {
                let amount = last.amount;
                out.push(padding_entry(pad_to, amount));
            }
        }
        if let Some(first) = out.first() {
            if first.amount.abs() > 1e-6 {
                if let Some(day_before) = first.trade_date.pred_opt() {
                    let mut start = padding_entry(day_before, 0.0);
                    start.synthetic = true;
                    out.insert(0, start);
                }
            }
        }
        out
    }

    /// Contribution (and, unfiltered, balance) in the display currency.
    /// A series published in that currency is used as is; otherwise the USD
    /// one is converted at each entry's date.
    fn contribution_chart(&self, state: &TransactionState) -> SeriesMap {
        let range = state.chart_date_range;
        let money = CurrencyConverter::for_state(state);
        let mut out = SeriesMap::new();

        let entries = if state.has_active_filter() {
            let usd = self.contribution_from_transactions(&state.filtered_transactions, self.today);
            money.convert_contribution(&usd)
        } else if let Some(native) = state.data.contribution.get(money.currency()) {
            native.clone()
        } else {
            let usd = state.data.contribution.get(SOURCE_CURRENCY).cloned().unwrap_or_default();
            money.convert_contribution(&usd)
        };
        let contribution = self.snapshots.contribution_series(&entries);
        let visible = Self::filter_to_range(&contribution, range);
        out.insert(
            CONTRIBUTION_KEY.to_string(),
            Self::inject_synthetic_start_point(visible, &contribution, range.from),
        );

        // Balance needs market prices, so it is only shown unfiltered.
        if !state.has_active_filter() {
            let balance = balance_for(state, &money);
            let visible = Self::filter_to_range(&balance, range);
            out.insert(
                BALANCE_KEY.to_string(),
                Self::inject_carry_forward_start_point(visible, &balance, range.from),
            );
        }
        out
    }

    /// Weights per ticker; absolute views carry the portfolio value in the
    /// display currency.
    fn allocation_chart(
        &self,
        state: &TransactionState,
        kind: ChartKind,
        snapshot: Option<&CompositionSnapshot>,
        tickers: &[String],
    ) -> SeriesMap {
        let Some(snapshot) = snapshot else {
            return SeriesMap::new();
        };
        let series = self
            .snapshots
            .composition_series(snapshot, state.chart_date_range, tickers, kind.is_absolute());
        if !kind.is_absolute() {
            return series;
        }
        let money = CurrencyConverter::for_state(state);
        series
            .into_iter()
            .map(|(key, points)| (key, money.convert_points(&points)))
            .collect()
    }

    // ── Performance family ──────────────────────────────────────────

    fn per_performance_key<F>(&self, state: &TransactionState, build: F) -> SeriesMap
    where
        F: Fn(&[TimeSeriesPoint]) -> Vec<TimeSeriesPoint>,
    {
        state
            .data
            .performance
            .iter()
            .filter(|(key, _)| state.is_series_visible(key))
            .map(|(key, points)| (key.clone(), build(points)))
            .collect()
    }

    /// Portfolio beta plus the first visible benchmark.
    fn beta_chart(&self, state: &TransactionState) -> SeriesMap {
        let range = state.chart_date_range;
        let betas = self.analytics.build_beta_series(&state.data.performance, self.beta_window);
        let benchmark = BENCHMARK_KEYS
            .iter()
            .find(|key| betas.contains_key(**key) && state.is_series_visible(key));
        betas
            .into_iter()
            .filter(|(key, _)| key == PORTFOLIO_KEY || Some(&key.as_str()) == benchmark)
            .map(|(key, points)| (key, Self::filter_to_range(&points, range)))
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn prepend(point: TimeSeriesPoint, mut rest: Vec<TimeSeriesPoint>) -> Vec<TimeSeriesPoint> {
    rest.insert(0, point);
    rest
}

fn padding_entry(date: NaiveDate, amount: f64) -> ContributionEntry {
    ContributionEntry {
        trade_date: date,
        amount,
        order_type: "padding".to_string(),
        net_amount: 0.0,
        synthetic: false,
    }
}

fn single_series(key: &str, points: Vec<TimeSeriesPoint>) -> SeriesMap {
    let mut out = SeriesMap::new();
    out.insert(key.to_string(), points);
    out
}

/// Balance in the display currency: published in it, else converted from USD.
fn balance_for(state: &TransactionState, money: &CurrencyConverter<'_>) -> Vec<TimeSeriesPoint> {
    let balance = &state.data.balance;
    match balance.get(money.currency()) {
        Some(native) => native.clone(),
        None => balance
            .get(SOURCE_CURRENCY)
            .map(|usd| money.convert_points(usd))
            .unwrap_or_default(),
    }
}

/// Percent change since the first point.
fn rebase_to_percent(points: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let base = if first.value.is_finite() && first.value != 0.0 { first.value } else { 1.0 };
    points
        .iter()
        .map(|p| {
            let mut out = p.clone();
            out.value = (p.value / base - 1.0) * 100.0;
            out
        })
        .collect()
}

fn is_visible(state: &TransactionState, kind: ChartKind, key: &str) -> bool {
    if kind.is_performance_family() || is_benchmark_key(key) {
        return state.is_series_visible(key);
    }
    state.chart_visibility.get(key).copied().unwrap_or(true)
}

fn month_start_millis(year: i32, month: u32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, month, 1).map(date_to_millis)
}

fn month_abbr(date: NaiveDate) -> &'static str {
    MONTH_ABBR[date.month0() as usize]
}

/// The year the span spends more time in.
fn primary_year(start: NaiveDate, end: NaiveDate) -> i32 {
    if start.year() == end.year() {
        return start.year();
    }
    let end_of_start = NaiveDate::from_ymd_opt(start.year(), 12, 31).unwrap_or(start);
    let start_of_end = NaiveDate::from_ymd_opt(end.year(), 1, 1).unwrap_or(end);
    let in_start = (end_of_start - start).num_days();
    let in_end = (end - start_of_end).num_days();
    if in_end > in_start {
        end.year()
    } else {
        start.year()
    }
}

fn dedupe_ticks(ticks: Vec<YearTick>, span: i64) -> Vec<YearTick> {
    let min_gap = DAY_MS.max((10 * DAY_MS).min(span / 15));
    let mut kept: Vec<YearTick> = Vec::new();
    for tick in ticks {
        if kept.iter().any(|t| t.label == tick.label) {
            continue;
        }
        match kept.iter().position(|t| (t.time - tick.time).abs() < min_gap) {
            None => kept.push(tick),
            Some(idx) => {
                if tick.is_year_start && !kept[idx].is_year_start {
                    kept[idx] = tick;
                }
            }
        }
    }
    kept
}

/// Round-number spacing for about six ticks over `range`.
fn initial_spacing(range: f64) -> f64 {
    let segments = (DESIRED_VALUE_TICKS - 1) as f64;
    let nice_range = nice_number(range, false);
    let spacing = nice_number(nice_range / segments, true).abs();
    if spacing.is_finite() && spacing != 0.0 {
        spacing
    } else {
        nice_number(range / segments, true).abs()
    }
}

/// Ticks from `start` through `end` at `spacing`, rounded to 6 decimals.
/// At most [`MAX_TICK_COUNT`] ticks; positions are computed by index so a
/// spacing below the precision of `start` cannot stall the run.
fn tick_run(start: f64, end: f64, spacing: f64) -> Vec<f64> {
    if !(start.is_finite() && end.is_finite() && spacing.is_finite()) || spacing <= 0.0 {
        return Vec::new();
    }
    if end < start - spacing * 0.001 {
        return Vec::new();
    }
    let count = (((end - start) / spacing).round() as usize)
        .saturating_add(1)
        .min(MAX_TICK_COUNT);
    (0..count)
        .map(|i| start + spacing * i as f64)
        .map(|tick| (tick / spacing).round() * spacing)
        .map(|snapped| (snapped * 1e6).round() / 1e6)
        .collect()
}

/// Closest "nice" number (1, 2, 5 × 10ⁿ) to `range`.
#[must_use]
pub fn nice_number(range: f64, round: bool) -> f64 {
    if !range.is_finite() || range == 0.0 {
        return 1.0;
    }
    let exponent = range.abs().log10().floor();
    let fraction = range.abs() / 10f64.powf(exponent);
    let nice = if round {
        if fraction < 1.5 {
            1.0
        } else if fraction < 3.0 {
            2.0
        } else if fraction < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    range.signum() * nice * 10f64.powf(exponent)
}
