// ═══════════════════════════════════════════════════════════════════
// Analytics Tests — daily returns, rolling beta, rolling volatility,
// rolling 1-year returns, drawdowns, range summaries
// ═══════════════════════════════════════════════════════════════════

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};

use fund_terminal_core::models::range::ChartDateRange;
use fund_terminal_core::models::series::{SeriesMap, TimeSeriesPoint};
use fund_terminal_core::services::analytics_service::AnalyticsService;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn series(values: &[f64]) -> Vec<TimeSeriesPoint> {
    let start = d(2023, 1, 2);
    values
        .iter()
        .enumerate()
        .map(|(i, v)| TimeSeriesPoint::new(start + Duration::days(i as i64), *v))
        .collect()
}

/// Cumulative values from per-step returns, starting at 100.
fn compound(returns: &[f64]) -> Vec<f64> {
    let mut value = 100.0;
    let mut out = vec![value];
    for r in returns {
        value *= 1.0 + r;
        out.push(value);
    }
    out
}

fn market_returns(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.01 * ((i % 5) as f64 - 2.0)).collect()
}

// ═══════════════════════════════════════════════════════════════════
// Returns
// ═══════════════════════════════════════════════════════════════════

mod returns {
    use super::*;

    #[test]
    fn skips_steps_from_zero() {
        let svc = AnalyticsService::new();
        let returns = svc.daily_returns(&series(&[100.0, 110.0, 0.0, 50.0]));
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].0, d(2023, 1, 3));
        assert_relative_eq!(returns[0].1, 0.1, epsilon = 1e-12);
        assert_relative_eq!(returns[1].1, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_and_single_point() {
        let svc = AnalyticsService::new();
        assert!(svc.daily_returns(&[]).is_empty());
        assert!(svc.daily_returns(&series(&[1.0])).is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Beta
// ═══════════════════════════════════════════════════════════════════

mod beta {
    use super::*;

    #[test]
    fn doubled_returns_have_beta_two() {
        let svc = AnalyticsService::new();
        let m = market_returns(29);
        let a: Vec<f64> = m.iter().map(|r| r * 2.0).collect();
        let market = series(&compound(&m));
        let asset = series(&compound(&a));

        let beta = svc.rolling_beta(&asset, &market, 10);
        assert_eq!(beta.len(), 20);
        assert_eq!(beta[0].date, market[10].date);
        for point in &beta {
            assert_relative_eq!(point.value, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn flat_market_gives_zero() {
        let svc = AnalyticsService::new();
        let market = series(&[100.0; 15]);
        let asset = series(&compound(&market_returns(14)));
        let beta = svc.rolling_beta(&asset, &market, 5);
        assert!(!beta.is_empty());
        assert!(beta.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn too_short_for_window() {
        let svc = AnalyticsService::new();
        let market = series(&compound(&market_returns(5)));
        assert!(svc.rolling_beta(&market, &market, 10).is_empty());
        assert!(svc.rolling_beta(&market, &market, 1).is_empty());
    }

    #[test]
    fn only_shared_dates_are_used() {
        let svc = AnalyticsService::new();
        let market = series(&compound(&market_returns(29)));
        let asset: Vec<TimeSeriesPoint> = market.iter().step_by(2).cloned().collect();
        let beta = svc.rolling_beta(&asset, &market, 5);
        assert!(beta.iter().all(|p| asset.iter().any(|a| a.date == p.date)));
    }

    #[test]
    fn market_key_is_exactly_one() {
        let svc = AnalyticsService::new();
        let m = market_returns(29);
        let a: Vec<f64> = m.iter().map(|r| r * 0.5).collect();
        let mut perf = SeriesMap::new();
        perf.insert("^GSPC".into(), series(&compound(&m)));
        perf.insert("^LZ".into(), series(&compound(&a)));

        let out = svc.build_beta_series(&perf, 10);
        assert!(out["^GSPC"].iter().all(|p| p.value == 1.0));
        assert_relative_eq!(out["^LZ"][0].value, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn needs_twenty_market_returns() {
        let svc = AnalyticsService::new();
        let mut perf = SeriesMap::new();
        perf.insert("^GSPC".into(), series(&compound(&market_returns(19))));
        perf.insert("^LZ".into(), series(&compound(&market_returns(19))));
        assert!(svc.build_beta_series(&perf, 5).is_empty());
    }

    #[test]
    fn no_market_no_beta() {
        let svc = AnalyticsService::new();
        let mut perf = SeriesMap::new();
        perf.insert("^LZ".into(), series(&compound(&market_returns(40))));
        assert!(svc.build_beta_series(&perf, 5).is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Rolling windows
// ═══════════════════════════════════════════════════════════════════

mod rolling {
    use super::*;

    #[test]
    fn constant_growth_has_no_volatility() {
        let svc = AnalyticsService::new();
        let vol = svc.rolling_volatility(&series(&compound(&[0.01; 10])), 5);
        assert_eq!(vol.len(), 6);
        for point in &vol {
            assert_relative_eq!(point.value, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn alternating_returns_annualize() {
        let svc = AnalyticsService::new();
        let vol = svc.rolling_volatility(&series(&compound(&[0.01, -0.01])), 2);
        assert_eq!(vol.len(), 1);
        let expected = 0.0002_f64.sqrt() * 252.0_f64.sqrt() * 100.0;
        assert_relative_eq!(vol[0].value, expected, epsilon = 1e-6);
    }

    #[test]
    fn one_year_returns_need_a_year_of_history() {
        let svc = AnalyticsService::new();
        let points = vec![
            TimeSeriesPoint::new(d(2022, 1, 1), 100.0),
            TimeSeriesPoint::new(d(2022, 7, 1), 110.0),
            TimeSeriesPoint::new(d(2023, 1, 1), 120.0),
        ];
        let rolling = svc.rolling_returns(&points);
        assert_eq!(rolling.len(), 1);
        assert_eq!(rolling[0].date, d(2023, 1, 1));
        assert_relative_eq!(rolling[0].value, 20.0, epsilon = 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Drawdown
// ═══════════════════════════════════════════════════════════════════

mod drawdown {
    use super::*;

    #[test]
    fn historical_peak_is_strictly_before() {
        let svc = AnalyticsService::new();
        let points = series(&[100.0, 150.0, 120.0]);
        assert_eq!(svc.historical_peak(&points, d(2023, 1, 3)), 100.0);
        assert_eq!(svc.historical_peak(&points, d(2023, 1, 2)), f64::NEG_INFINITY);
    }

    #[test]
    fn absolute_uses_seeded_peak() {
        let svc = AnalyticsService::new();
        let dd = svc.drawdown_absolute(&series(&[100.0, 160.0, 140.0]), 150.0);
        let values: Vec<f64> = dd.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![-50.0, 0.0, -20.0]);
    }

    #[test]
    fn absolute_never_positive() {
        let svc = AnalyticsService::new();
        let dd = svc.drawdown_absolute(&series(&[5.0, 3.0, 8.0, 1.0]), f64::NEG_INFINITY);
        assert!(dd.iter().all(|p| p.value <= 0.0));
        assert_eq!(dd[0].value, 0.0);
    }

    #[test]
    fn percent_from_high_water_mark() {
        let svc = AnalyticsService::new();
        let dd = svc.drawdown_percent(&series(&[100.0, 120.0, 90.0]));
        assert_eq!(dd[1].value, 0.0);
        assert_relative_eq!(dd[2].value, -25.0, epsilon = 1e-9);
        assert_eq!(dd[2].peak, 120.0);
        assert_eq!(dd[2].raw_value, 90.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Range summary
// ═══════════════════════════════════════════════════════════════════

mod summary {
    use super::*;

    fn sample() -> Vec<TimeSeriesPoint> {
        vec![
            TimeSeriesPoint::new(d(2023, 1, 2), 10.0),
            TimeSeriesPoint::new(d(2023, 6, 30), 20.0),
            TimeSeriesPoint::new(d(2023, 12, 29), 30.0),
        ]
    }

    #[test]
    fn start_is_last_point_on_or_before_from() {
        let svc = AnalyticsService::new();
        let range = ChartDateRange::new(Some(d(2023, 3, 1)), Some(d(2023, 12, 31))).unwrap();
        let summary = svc.summarize_series(&sample(), range).unwrap();
        assert_eq!(summary.start_date, d(2023, 1, 2));
        assert_eq!(summary.end_value, 30.0);
        assert_eq!(summary.net_change, 20.0);
    }

    #[test]
    fn range_before_data_has_no_summary() {
        let svc = AnalyticsService::new();
        let range = ChartDateRange::year(2020).unwrap();
        assert!(svc.summarize_series(&sample(), range).is_none());
    }

    #[test]
    fn unbounded_covers_everything() {
        let svc = AnalyticsService::new();
        let summary = svc.summarize_series(&sample(), ChartDateRange::all()).unwrap();
        assert_eq!(summary.start_value, 10.0);
        assert_eq!(summary.end_date, d(2023, 12, 29));
    }

    #[test]
    fn empty_series() {
        let svc = AnalyticsService::new();
        assert!(svc.summarize_series(&[], ChartDateRange::all()).is_none());
    }
}
