// ═══════════════════════════════════════════════════════════════════
// Dashboard Tests — FundDashboard end to end over a data directory
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use std::path::Path;

use fund_terminal_core::models::chart::ChartKind;
use fund_terminal_core::models::settings::DashboardConfig;
use fund_terminal_core::models::state::LegendToggle;
use fund_terminal_core::services::animation_service::AnimatedChart;
use fund_terminal_core::storage::preferences::PreferenceStore;
use fund_terminal_core::FundDashboard;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn seed(root: &Path) {
    write(
        root,
        "transactions.csv",
        "tradeDate,orderType,security,quantity,price\n\
         2023-01-05,Buy,VT,10,100\n\
         2023-06-01,Buy,VOO,2,400\n\
         2024-02-01,Sell,VT,3,110\n",
    );
    write(root, "output/cagr.txt", "CAGR since inception: 7.42%\n\n");
}

fn dashboard(root: &Path, prefs: PreferenceStore) -> FundDashboard {
    let config = DashboardConfig {
        data_dir: Some(root.to_path_buf()),
        ..DashboardConfig::default()
    };
    FundDashboard::new(config, prefs).with_today(d(2024, 6, 15))
}

// ═══════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════

mod loading {
    use super::*;

    #[tokio::test]
    async fn transactions_load_and_contribution_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.load_data().await;

        assert_eq!(dash.state().all_transactions.len(), 3);
        let contribution = &dash.state().data.contribution["USD"];
        assert!(!contribution.is_empty());
        assert_eq!(contribution.last().unwrap().trade_date, d(2024, 6, 15));
        assert_eq!(dash.provider_names(), vec!["File"]);
    }

    #[tokio::test]
    async fn filtered_contribution_pads_to_pinned_today() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.load_data().await;
        dash.run_command("vt").await;
        assert!(dash.state().has_active_filter());

        let series = dash
            .terminal()
            .charts()
            .series_for(dash.state(), ChartKind::Contribution);
        let last = series["contribution"].last().unwrap();
        assert_eq!(last.date, d(2024, 6, 15));
        assert_eq!(last.value, 670.0);
    }

    #[tokio::test]
    async fn empty_directory_leaves_views_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.load_data().await;

        assert!(dash.state().all_transactions.is_empty());
        assert!(dash.state().data.contribution.is_empty());
        dash.run_command("plot performance").await;
        assert!(dash.render_active_svg(960.0, 540.0).is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════

mod commands {
    use super::*;

    #[tokio::test]
    async fn static_text_is_fetched_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());

        let out = dash.run_command("stats cagr").await;
        assert_eq!(out.text(), "CAGR since inception: 7.42%");
        assert!(out.fetch.is_none());
    }

    #[tokio::test]
    async fn missing_static_text_reports_an_error_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        let out = dash.run_command("stats ratio").await;
        assert_eq!(out.text(), "Error loading Sharpe and Sortino ratios.");
    }

    #[tokio::test]
    async fn plotting_renders_and_animates() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.load_data().await;

        let out = dash.run_command("plot contribution").await;
        assert!(out.redraw);
        assert_eq!(dash.state().active_chart, Some(ChartKind::Contribution));
        assert_eq!(dash.animations().running(), vec![AnimatedChart::Contribution]);

        let svg = dash.render_active_svg(960.0, 540.0).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("<circle"));

        dash.run_command("plot contribution").await;
        assert_eq!(dash.state().active_chart, None);
        assert!(dash.animations().running().is_empty());
        assert!(dash.render_active_svg(960.0, 540.0).is_none());
    }

    #[tokio::test]
    async fn reduced_motion_renders_without_glow() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.set_animations_enabled(false);
        dash.load_data().await;

        dash.run_command("plot contribution").await;
        assert!(dash.animations().running().is_empty());
        let svg = dash.render_active_svg(960.0, 540.0).unwrap();
        assert!(!svg.contains("<circle"));
    }

    #[tokio::test]
    async fn legend_toggle_goes_through_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.run_command("plot performance").await;
        assert_eq!(dash.toggle_series("^LZ"), LegendToggle::Locked);
        assert_eq!(dash.toggle_series("^IXIC"), LegendToggle::Toggled(true));
        assert!(!dash.state().is_series_visible("^GSPC"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Currency preference
// ═══════════════════════════════════════════════════════════════════

mod currency {
    use super::*;

    #[test]
    fn selection_is_persisted_and_restored() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");

        let mut dash = dashboard(dir.path(), PreferenceStore::new(&prefs_path));
        assert_eq!(dash.selected_currency(), "USD");
        dash.set_currency("jpy").unwrap();
        assert_eq!(dash.selected_currency(), "JPY");

        let restored = dashboard(dir.path(), PreferenceStore::new(&prefs_path));
        assert_eq!(restored.selected_currency(), "JPY");
    }

    #[tokio::test]
    async fn amounts_are_converted_into_the_selected_currency() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        write(
            dir.path(),
            "output/fx_daily_rates.json",
            r#"{"base":"USD","rates":{"JPY":{"2023-01-02":130}}}"#,
        );
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.load_data().await;
        dash.set_currency("JPY").unwrap();

        let holdings = dash.run_command("stats holdings").await.text();
        assert!(holdings.contains("¥13,000"));
        assert!(holdings.contains("¥91,000"));
        assert!(holdings.contains("¥104,000"));

        dash.run_command("plot contribution").await;
        // 1,000 + 800 − 330 USD contributed, all at 130.
        assert!(dash.chart_summary().unwrap().contains("¥191,100"));
    }

    #[tokio::test]
    async fn currency_without_rates_is_not_relabelled() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.load_data().await;
        dash.set_currency("KRW").unwrap();

        let holdings = dash.run_command("stats holdings").await.text();
        assert!(holdings.contains("$100.00"));
        assert!(!holdings.contains('₩'));
    }

    #[test]
    fn unknown_codes_fall_back_to_usd() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = dashboard(dir.path(), PreferenceStore::in_memory());
        dash.set_currency("XYZ").unwrap();
        assert_eq!(dash.selected_currency(), "USD");
    }
}
