// ═══════════════════════════════════════════════════════════════════
// Model Tests — ChartDateRange, Transaction, TransactionFilter,
// ChartKind, Preferences, TransactionState
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use std::collections::BTreeMap;

use fund_terminal_core::models::chart::ChartKind;
use fund_terminal_core::models::range::ChartDateRange;
use fund_terminal_core::models::series::{
    date_to_millis, millis_to_date, normalize_series_key, ordered_keys, SeriesMap,
    TimeSeriesPoint,
};
use fund_terminal_core::models::settings::Preferences;
use fund_terminal_core::models::snapshot::FxRates;
use fund_terminal_core::models::state::{ChartData, LegendToggle, TransactionState};
use fund_terminal_core::models::transaction::{
    normalize_ticker_token, AssetClass, OrderType, Transaction, TransactionFilter,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn buy(id: usize, date: NaiveDate, security: &str, qty: f64, price: f64) -> Transaction {
    Transaction::new(id, date, OrderType::Buy, security, qty, price)
}

fn sell(id: usize, date: NaiveDate, security: &str, qty: f64, price: f64) -> Transaction {
    Transaction::new(id, date, OrderType::Sell, security, qty, price)
}

// ═══════════════════════════════════════════════════════════════════
// ChartDateRange
// ═══════════════════════════════════════════════════════════════════

mod date_range {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        assert!(ChartDateRange::new(Some(d(2024, 1, 1)), Some(d(2023, 1, 1))).is_err());
        assert!(ChartDateRange::new(Some(d(2023, 1, 1)), Some(d(2023, 1, 1))).is_ok());
        assert!(ChartDateRange::new(None, Some(d(2023, 1, 1))).is_ok());
    }

    #[test]
    fn contains_is_inclusive() {
        let range = ChartDateRange::year(2023).unwrap();
        assert!(range.contains(d(2023, 1, 1)));
        assert!(range.contains(d(2023, 12, 31)));
        assert!(!range.contains(d(2024, 1, 1)));
        assert!(ChartDateRange::all().contains(d(1990, 5, 5)));
    }

    #[test]
    fn display_names_years_and_quarters() {
        assert_eq!(ChartDateRange::year(2023).unwrap().to_string(), "2023");
        let q1 = ChartDateRange::new(Some(d(2023, 1, 1)), Some(d(2023, 3, 31))).unwrap();
        assert_eq!(q1.to_string(), "Q1 2023");
        let span = ChartDateRange::new(Some(d(2020, 1, 1)), Some(d(2023, 12, 31))).unwrap();
        assert_eq!(span.to_string(), "2020-01-01 to 2023-12-31");
        let open = ChartDateRange::new(Some(d(2022, 1, 1)), None).unwrap();
        assert_eq!(open.to_string(), "from 2022-01-01");
        assert_eq!(ChartDateRange::all().to_string(), "all time");
    }

    #[test]
    fn anchor_year_prefers_from() {
        let range = ChartDateRange::new(Some(d(2021, 4, 1)), Some(d(2023, 1, 1))).unwrap();
        assert_eq!(range.anchor_year(), Some(2021));
        let to_only = ChartDateRange::new(None, Some(d(2019, 6, 30))).unwrap();
        assert_eq!(to_only.anchor_year(), Some(2019));
        assert_eq!(ChartDateRange::all().anchor_year(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Transactions & filters
// ═══════════════════════════════════════════════════════════════════

mod transactions {
    use super::*;

    #[test]
    fn net_amount_is_signed() {
        assert_eq!(buy(0, d(2023, 1, 1), "VT", 10.0, 100.0).net_amount, 1000.0);
        assert_eq!(sell(1, d(2023, 1, 2), "VT", 2.0, 110.0).net_amount, -220.0);
    }

    #[test]
    fn security_is_trimmed_and_uppercased() {
        let tx = buy(0, d(2023, 1, 1), "  aapl ", 1.0, 1.0);
        assert_eq!(tx.security, "AAPL");
    }

    #[test]
    fn order_type_parses_case_insensitively() {
        assert_eq!(OrderType::parse("BUY"), Some(OrderType::Buy));
        assert_eq!(OrderType::parse(" sell "), Some(OrderType::Sell));
        assert_eq!(OrderType::parse("hold"), None);
    }

    #[test]
    fn ticker_tokens_fold_aliases() {
        assert_eq!(normalize_ticker_token("brk.b").as_deref(), Some("BRKB"));
        assert_eq!(normalize_ticker_token("BRK-B").as_deref(), Some("BRKB"));
        assert_eq!(normalize_ticker_token("nvda,").as_deref(), Some("NVDA"));
        assert_eq!(normalize_ticker_token("2023"), None);
    }

    #[test]
    fn asset_class_uses_etf_list() {
        assert_eq!(AssetClass::of("vt"), AssetClass::Etf);
        assert_eq!(AssetClass::of("AAPL"), AssetClass::Stock);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TransactionFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&buy(0, d(2023, 1, 1), "VT", 1.0, 1.0)));
    }

    #[test]
    fn filter_criteria_combine() {
        let filter = TransactionFilter {
            order_type: Some(OrderType::Buy),
            min_amount: Some(500.0),
            ..TransactionFilter::default()
        };
        assert!(filter.matches(&buy(0, d(2023, 1, 1), "VT", 10.0, 100.0)));
        assert!(!filter.matches(&buy(1, d(2023, 1, 1), "VT", 1.0, 100.0)));
        assert!(!filter.matches(&sell(2, d(2023, 1, 1), "VT", 10.0, 100.0)));
    }

    #[test]
    fn ticker_set_is_an_alternative() {
        let filter = TransactionFilter {
            tickers: vec!["AAPL".into(), "NVDA".into()],
            ..TransactionFilter::default()
        };
        assert!(filter.matches(&buy(0, d(2023, 1, 1), "AAPL", 1.0, 1.0)));
        assert!(filter.matches(&buy(1, d(2023, 1, 1), "NVDA", 1.0, 1.0)));
        assert!(!filter.matches(&buy(2, d(2023, 1, 1), "VT", 1.0, 1.0)));
    }

    #[test]
    fn free_text_searches_security_type_and_date() {
        let filter = TransactionFilter {
            text: "2023-05".into(),
            ..TransactionFilter::default()
        };
        assert!(filter.matches(&buy(0, d(2023, 5, 10), "VT", 1.0, 1.0)));
        assert!(!filter.matches(&buy(1, d(2023, 6, 10), "VT", 1.0, 1.0)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Series helpers & ChartKind
// ═══════════════════════════════════════════════════════════════════

mod series {
    use super::*;

    #[test]
    fn millis_round_trip_by_day() {
        let date = d(2023, 7, 14);
        assert_eq!(millis_to_date(date_to_millis(date)), date);
        assert_eq!(date_to_millis(d(1970, 1, 2)), 86_400_000);
    }

    #[test]
    fn sse_alias_is_normalized() {
        assert_eq!(normalize_series_key("^SSE"), "^SSEC");
        assert_eq!(normalize_series_key(" ^GSPC "), "^GSPC");
    }

    #[test]
    fn portfolio_key_sorts_first() {
        let mut map = SeriesMap::new();
        for key in ["^GSPC", "^LZ", "^DJI"] {
            map.insert(key.to_string(), vec![TimeSeriesPoint::new(d(2023, 1, 1), 0.0)]);
        }
        assert_eq!(ordered_keys(&map), vec!["^LZ", "^DJI", "^GSPC"]);
    }

    #[test]
    fn absolute_views_pair_up() {
        assert_eq!(ChartKind::Composition.with_absolute(true), ChartKind::CompositionAbs);
        assert_eq!(ChartKind::DrawdownAbs.with_absolute(false), ChartKind::Drawdown);
        assert_eq!(ChartKind::Performance.with_absolute(true), ChartKind::Performance);
        assert!(ChartKind::Sectors.has_absolute_view());
        assert!(!ChartKind::Fx.has_absolute_view());
    }

    #[test]
    fn labels_follow_the_view() {
        assert_eq!(ChartKind::GeographyAbs.showing_label(), "geography allocation (absolute)");
        assert_eq!(ChartKind::Sectors.hidden_label(), "sector allocation");
        assert_eq!(ChartKind::Contribution.command_name(), "balance");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Preferences
// ═══════════════════════════════════════════════════════════════════

mod preferences {
    use super::*;

    #[test]
    fn unknown_currency_falls_back_to_usd() {
        assert_eq!(Preferences::normalize_currency(" jpy "), "JPY");
        assert_eq!(Preferences::normalize_currency("EUR"), "USD");
        assert_eq!(Preferences::normalize_currency(""), "USD");
    }

    #[test]
    fn serialized_under_storage_key() {
        let json = serde_json::to_string(&Preferences::default()).unwrap();
        assert_eq!(json, r#"{"fund.selectedCurrency":"USD"}"#);
        let parsed: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.selected_currency, "USD");
    }
}

// ═══════════════════════════════════════════════════════════════════
// TransactionState
// ═══════════════════════════════════════════════════════════════════

mod state {
    use super::*;

    fn sample_state() -> TransactionState {
        let mut state = TransactionState::new();
        state.set_all_transactions(vec![
            buy(0, d(2022, 3, 1), "VT", 10.0, 90.0),
            buy(1, d(2023, 3, 1), "AAPL", 5.0, 150.0),
            sell(2, d(2023, 9, 1), "VT", 2.0, 100.0),
        ]);
        state
    }

    #[test]
    fn date_range_filters_table_only_when_visible() {
        let mut state = sample_state();
        state.set_chart_date_range(ChartDateRange::year(2023).unwrap());
        assert_eq!(state.filtered_transactions.len(), 3);

        state.set_show_table(true);
        assert_eq!(state.filtered_transactions.len(), 2);
        assert!(state.has_active_filter());
    }

    #[test]
    fn setting_range_records_context_year() {
        let mut state = sample_state();
        state.set_chart_date_range(ChartDateRange::year(2021).unwrap());
        assert_eq!(state.last_context_year, Some(2021));
    }

    #[test]
    fn ticker_filter_feeds_composition() {
        let mut state = sample_state();
        let filter = TransactionFilter {
            tickers: vec!["AAPL".into()],
            ..TransactionFilter::default()
        };
        state.set_transaction_filter("aapl", filter);
        assert_eq!(state.composition_tickers, vec!["AAPL"]);
        assert_eq!(state.filtered_transactions.len(), 1);
        assert_eq!(state.active_filter_text, "aapl");
    }

    #[test]
    fn portfolio_line_is_locked_on_performance() {
        let mut state = TransactionState::new();
        state.set_active_chart(Some(ChartKind::Performance));
        assert_eq!(state.toggle_series("^LZ"), LegendToggle::Locked);
        assert!(state.is_series_visible("^LZ"));
    }

    #[test]
    fn benchmarks_behave_like_radio_buttons() {
        let mut state = TransactionState::new();
        state.set_active_chart(Some(ChartKind::Performance));
        assert!(state.is_series_visible("^GSPC"));

        assert_eq!(state.toggle_series("^IXIC"), LegendToggle::Toggled(true));
        assert!(state.is_series_visible("^IXIC"));
        assert!(!state.is_series_visible("^GSPC"));

        assert_eq!(state.toggle_series("^IXIC"), LegendToggle::Toggled(false));
        assert!(!state.is_series_visible("^IXIC"));
    }

    #[test]
    fn allocation_legends_are_read_only() {
        for kind in [
            ChartKind::Composition,
            ChartKind::CompositionAbs,
            ChartKind::Sectors,
            ChartKind::SectorsAbs,
            ChartKind::Geography,
            ChartKind::GeographyAbs,
        ] {
            let mut state = TransactionState::new();
            state.set_active_chart(Some(kind));
            let before = state.is_series_visible("AAPL");
            assert_eq!(state.toggle_series("AAPL"), LegendToggle::Locked, "{kind}");
            assert_eq!(state.is_series_visible("AAPL"), before);
        }
    }

    #[test]
    fn amount_filter_uses_display_currency() {
        let mut state = sample_state();
        state.set_data(ChartData {
            fx: Some(FxRates {
                base: "USD".to_string(),
                rates: BTreeMap::from([(
                    "JPY".to_string(),
                    BTreeMap::from([(d(2022, 1, 3), 150.0)]),
                )]),
            }),
            ..ChartData::default()
        });
        let filter = TransactionFilter {
            min_amount: Some(100_000.0),
            ..TransactionFilter::default()
        };
        state.set_transaction_filter("min:100000", filter);
        assert!(state.filtered_transactions.is_empty());

        // VT 900 → ¥135,000 and AAPL 750 → ¥112,500 pass; VT 200 → ¥30,000 does not.
        state.set_selected_currency("JPY");
        let ids: Vec<usize> = state.filtered_transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1]);

        state.set_selected_currency("USD");
        assert!(state.filtered_transactions.is_empty());
    }

    #[test]
    fn plain_toggle_elsewhere() {
        let mut state = TransactionState::new();
        state.set_active_chart(Some(ChartKind::Contribution));
        assert_eq!(state.toggle_series("balance"), LegendToggle::Toggled(false));
        assert_eq!(state.toggle_series("balance"), LegendToggle::Toggled(true));
    }

    #[test]
    fn history_is_newest_first() {
        let mut state = TransactionState::new();
        state.push_command_history("plot fx");
        state.push_command_history("zoom");
        assert_eq!(state.command_history, vec!["zoom", "plot fx"]);
    }

    #[test]
    fn reset_view_clears_everything_visible() {
        let mut state = sample_state();
        state.set_active_chart(Some(ChartKind::Fx));
        state.set_show_table(true);
        state.toggle_zoom();
        state.set_chart_date_range(ChartDateRange::year(2023).unwrap());
        state.reset_view();

        assert_eq!(state.active_chart, None);
        assert!(!state.show_table);
        assert!(!state.zoomed);
        assert!(state.chart_date_range.is_unbounded());
        assert_eq!(state.filtered_transactions.len(), 3);
    }

    #[test]
    fn earliest_year_from_transactions() {
        assert_eq!(sample_state().earliest_transaction_year(), Some(2022));
        assert_eq!(TransactionState::new().earliest_transaction_year(), None);
    }
}
