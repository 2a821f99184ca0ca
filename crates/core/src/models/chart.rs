use serde::{Deserialize, Serialize};

use super::series::TimeSeriesPoint;

/// The chart currently shown. Absolute-value views are distinct kinds so the
/// active chart stays a single selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Contribution,
    Performance,
    Composition,
    CompositionAbs,
    Sectors,
    SectorsAbs,
    Geography,
    GeographyAbs,
    Fx,
    Drawdown,
    DrawdownAbs,
    Concentration,
    Pe,
    Rolling,
    Volatility,
    Beta,
    Yield,
}

impl ChartKind {
    pub const ALL: [ChartKind; 17] = [
        ChartKind::Contribution,
        ChartKind::Performance,
        ChartKind::Composition,
        ChartKind::CompositionAbs,
        ChartKind::Sectors,
        ChartKind::SectorsAbs,
        ChartKind::Geography,
        ChartKind::GeographyAbs,
        ChartKind::Fx,
        ChartKind::Drawdown,
        ChartKind::DrawdownAbs,
        ChartKind::Concentration,
        ChartKind::Pe,
        ChartKind::Rolling,
        ChartKind::Volatility,
        ChartKind::Beta,
        ChartKind::Yield,
    ];

    /// Whether the kind is an absolute-value view.
    #[must_use]
    pub fn is_absolute(self) -> bool {
        matches!(
            self,
            ChartKind::CompositionAbs
                | ChartKind::SectorsAbs
                | ChartKind::GeographyAbs
                | ChartKind::DrawdownAbs
        )
    }

    /// Whether the kind has a percent/absolute counterpart.
    #[must_use]
    pub fn has_absolute_view(self) -> bool {
        self.with_absolute(true) != self.with_absolute(false)
    }

    /// Same chart family in the requested view. Kinds without an absolute
    /// view are returned unchanged.
    #[must_use]
    pub fn with_absolute(self, absolute: bool) -> ChartKind {
        use ChartKind::*;
        match (self, absolute) {
            (Composition | CompositionAbs, true) => CompositionAbs,
            (Composition | CompositionAbs, false) => Composition,
            (Sectors | SectorsAbs, true) => SectorsAbs,
            (Sectors | SectorsAbs, false) => Sectors,
            (Geography | GeographyAbs, true) => GeographyAbs,
            (Geography | GeographyAbs, false) => Geography,
            (Drawdown | DrawdownAbs, true) => DrawdownAbs,
            (Drawdown | DrawdownAbs, false) => Drawdown,
            (other, _) => other,
        }
    }

    /// Charts plotting the performance series (portfolio plus benchmarks).
    /// Legend clicks on these follow the benchmark radio rules.
    #[must_use]
    pub fn is_performance_family(self) -> bool {
        matches!(
            self,
            ChartKind::Performance
                | ChartKind::Drawdown
                | ChartKind::DrawdownAbs
                | ChartKind::Rolling
                | ChartKind::Volatility
                | ChartKind::Beta
        )
    }

    /// Allocation charts drawn from the composition, sector and geography
    /// snapshots. Their legends are read-only.
    #[must_use]
    pub fn is_allocation(self) -> bool {
        matches!(
            self,
            ChartKind::Composition
                | ChartKind::CompositionAbs
                | ChartKind::Sectors
                | ChartKind::SectorsAbs
                | ChartKind::Geography
                | ChartKind::GeographyAbs
        )
    }

    /// Y axis is labelled in percent.
    #[must_use]
    pub fn is_percent_axis(self) -> bool {
        matches!(
            self,
            ChartKind::Performance
                | ChartKind::Composition
                | ChartKind::Sectors
                | ChartKind::Geography
                | ChartKind::Drawdown
                | ChartKind::Rolling
                | ChartKind::Volatility
                | ChartKind::Yield
        )
    }

    /// Noun used in "Hidden ... chart." replies.
    #[must_use]
    pub fn hidden_label(self) -> &'static str {
        use ChartKind::*;
        match self {
            Contribution => "contribution",
            Performance => "performance",
            Composition | CompositionAbs => "composition",
            Sectors | SectorsAbs => "sector allocation",
            Geography | GeographyAbs => "geography",
            Fx => "FX",
            Drawdown | DrawdownAbs => "drawdown",
            Concentration => "concentration",
            Pe => "P/E ratio",
            Rolling => "1-Year rolling returns",
            Volatility => "90-Day annualized rolling volatility",
            Beta => "portfolio beta",
            Yield => "dividend yield and income",
        }
    }

    /// Noun used in "Showing ... chart for <range>." replies.
    #[must_use]
    pub fn showing_label(self) -> String {
        use ChartKind::*;
        let base = match self {
            Contribution => "contribution",
            Performance => "performance",
            Composition | CompositionAbs => "composition",
            Sectors | SectorsAbs => "sector allocation",
            Geography | GeographyAbs => "geography allocation",
            Fx => "FX",
            Drawdown | DrawdownAbs => "drawdown",
            Concentration => "concentration (HHI)",
            Pe => "weighted average P/E ratio",
            Rolling => "1-Year rolling returns",
            Volatility => "90-Day annualized rolling volatility",
            Beta => "6-Month rolling portfolio beta",
            Yield => "dividend yield and income",
        };
        if self.is_absolute() {
            format!("{base} (absolute)")
        } else {
            base.to_string()
        }
    }

    /// Short family name, as typed after `plot`.
    #[must_use]
    pub fn command_name(self) -> &'static str {
        use ChartKind::*;
        match self {
            Contribution => "balance",
            Performance => "performance",
            Composition | CompositionAbs => "composition",
            Sectors | SectorsAbs => "sectors",
            Geography | GeographyAbs => "geography",
            Fx => "fx",
            Drawdown | DrawdownAbs => "drawdown",
            Concentration => "concentration",
            Pe => "pe",
            Rolling => "rolling",
            Volatility => "volatility",
            Beta => "beta",
            Yield => "yield",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hidden_label())
    }
}

/// An x-axis tick. `time` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTick {
    pub time: i64,
    pub label: String,
    pub is_year_start: bool,
}

/// Value lookup at arbitrary times for one series.
///
/// Times are clamped into the series span and values between samples are
/// linearly interpolated.
#[derive(Debug, Clone)]
pub struct TimeInterpolator {
    times: Vec<i64>,
    values: Vec<f64>,
}

impl TimeInterpolator {
    /// Build from points in any order. Returns `None` when no finite point exists.
    pub fn new(points: &[TimeSeriesPoint]) -> Option<Self> {
        let mut samples: Vec<(i64, f64)> = points
            .iter()
            .filter(|p| p.value.is_finite())
            .map(|p| (p.time(), p.value))
            .collect();
        if samples.is_empty() {
            return None;
        }
        samples.sort_by_key(|(t, _)| *t);
        let (times, values) = samples.into_iter().unzip();
        Some(Self { times, values })
    }

    #[must_use]
    pub fn first_time(&self) -> i64 {
        self.times[0]
    }

    #[must_use]
    pub fn last_time(&self) -> i64 {
        self.times[self.times.len() - 1]
    }

    /// Interpolated value at `time`.
    #[must_use]
    pub fn value_at(&self, time: i64) -> f64 {
        let t = time.clamp(self.first_time(), self.last_time());
        match self.times.binary_search(&t) {
            Ok(idx) => self.values[idx],
            Err(idx) => {
                // 0 < idx < len after clamping.
                let (t0, t1) = (self.times[idx - 1], self.times[idx]);
                let (v0, v1) = (self.values[idx - 1], self.values[idx]);
                let ratio = (t - t0) as f64 / (t1 - t0) as f64;
                v0 + (v1 - v0) * ratio
            }
        }
    }
}

/// One drawn series inside a [`ChartLayout`].
#[derive(Debug, Clone)]
pub struct LayoutSeries {
    pub key: String,
    pub points: Vec<TimeSeriesPoint>,
    pub interpolator: TimeInterpolator,
}

/// Derived geometry for one render pass: time/value bounds plus the
/// interpolators used by crosshair readouts. Rebuilt on every redraw.
#[derive(Debug, Clone)]
pub struct ChartLayout {
    pub kind: ChartKind,
    pub min_time: i64,
    pub max_time: i64,
    pub min_value: f64,
    pub max_value: f64,
    pub series: Vec<LayoutSeries>,
}

impl ChartLayout {
    /// Interpolated value of every series at `time`, in layout order.
    #[must_use]
    pub fn values_at(&self, time: i64) -> Vec<(&str, f64)> {
        self.series
            .iter()
            .map(|s| (s.key.as_str(), s.interpolator.value_at(time)))
            .collect()
    }

    /// Look up a series by key.
    #[must_use]
    pub fn series(&self, key: &str) -> Option<&LayoutSeries> {
        self.series.iter().find(|s| s.key == key)
    }
}
