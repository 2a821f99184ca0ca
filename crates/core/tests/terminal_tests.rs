// ═══════════════════════════════════════════════════════════════════
// Terminal Tests — command dispatch, chart toggles, table filters,
// date-range fallback, static text requests
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;

use fund_terminal_core::models::chart::ChartKind;
use fund_terminal_core::models::range::ChartDateRange;
use fund_terminal_core::models::state::TransactionState;
use fund_terminal_core::models::transaction::{OrderType, Transaction};
use fund_terminal_core::services::chart_service::ChartService;
use fund_terminal_core::services::date_range_service::DateRangeParser;
use fund_terminal_core::services::terminal_service::{percent_inline, StaticText, TerminalService};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn terminal() -> TerminalService {
    TerminalService::new(DateRangeParser::new(d(2024, 6, 15)), ChartService::new())
}

fn state_with_trades() -> TransactionState {
    let mut state = TransactionState::new();
    state.set_all_transactions(vec![
        Transaction::new(0, d(2022, 3, 1), OrderType::Buy, "VT", 10.0, 100.0),
        Transaction::new(1, d(2023, 2, 1), OrderType::Buy, "VT", 5.0, 120.0),
        Transaction::new(2, d(2023, 9, 1), OrderType::Sell, "VT", 2.0, 130.0),
        Transaction::new(3, d(2024, 1, 10), OrderType::Buy, "VOO", 1.0, 400.0),
    ]);
    state
}

// ═══════════════════════════════════════════════════════════════════
// Dispatch basics
// ═══════════════════════════════════════════════════════════════════

mod dispatch {
    use super::*;

    #[test]
    fn blank_input_does_nothing() {
        let mut state = TransactionState::new();
        let out = terminal().execute(&mut state, "   ");
        assert!(out.messages.is_empty());
        assert!(!out.redraw);
        assert!(state.command_history.is_empty());
    }

    #[test]
    fn history_is_newest_first() {
        let term = terminal();
        let mut state = TransactionState::new();
        term.execute(&mut state, "zoom");
        term.execute(&mut state, "label");
        assert_eq!(state.command_history, vec!["label", "zoom"]);
    }

    #[test]
    fn zoom_and_label_toggle() {
        let term = terminal();
        let mut state = TransactionState::new();
        assert_eq!(term.execute(&mut state, "z").text(), "Terminal zoomed in.");
        assert!(state.zoomed);
        assert_eq!(term.execute(&mut state, "zoom").text(), "Terminal zoomed out.");
        assert!(!state.zoomed);

        assert_eq!(term.execute(&mut state, "l").text(), "Chart labels are now hidden.");
        assert!(!state.show_labels);
        assert_eq!(term.execute(&mut state, "label").text(), "Chart labels are now visible.");
    }

    #[test]
    fn unknown_subcommands_list_alternatives() {
        let term = terminal();
        let mut state = TransactionState::new();
        assert!(term
            .execute(&mut state, "plot bogus")
            .text()
            .starts_with("Unknown plot subcommand: bogus\nAvailable: "));
        assert!(term
            .execute(&mut state, "stats bogus")
            .text()
            .starts_with("Unknown stats subcommand: bogus\nAvailable: "));
        assert!(term
            .execute(&mut state, "help bogus")
            .text()
            .starts_with("Unknown help subcommand: bogus\nAvailable: "));
        assert_eq!(state.active_chart, None);
    }

    #[test]
    fn static_text_commands_request_a_fetch() {
        let term = terminal();
        let mut state = TransactionState::new();
        let out = term.execute(&mut state, "stats cagr");
        assert_eq!(out.fetch, Some(StaticText::Cagr));
        assert!(out.messages.is_empty());
        assert_eq!(term.execute(&mut state, "s return").fetch, Some(StaticText::AnnualReturns));
        assert_eq!(term.execute(&mut state, "s ratio").fetch, Some(StaticText::Ratios));
        assert_eq!(StaticText::Ratios.path(), "output/ratios.txt");
        assert_eq!(StaticText::Cagr.error_message(), "Error loading CAGR data.");
    }

    #[test]
    fn summary_without_anything_active() {
        let mut state = TransactionState::new();
        assert_eq!(
            terminal().execute(&mut state, "summary").text(),
            "No active chart or summary available."
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// plot
// ═══════════════════════════════════════════════════════════════════

mod plot {
    use super::*;

    #[test]
    fn shows_then_hides() {
        let term = terminal();
        let mut state = TransactionState::new();

        let out = term.execute(&mut state, "plot performance");
        assert!(out.redraw);
        assert!(out.text().starts_with("Showing performance chart for all time."));
        assert_eq!(state.active_chart, Some(ChartKind::Performance));

        let out = term.execute(&mut state, "p performance");
        assert_eq!(out.text(), "Hidden performance chart.");
        assert_eq!(state.active_chart, None);
    }

    #[test]
    fn date_arguments_set_the_range() {
        let term = terminal();
        let mut state = TransactionState::new();
        let out = term.execute(&mut state, "plot balance 2023");
        assert!(out.text().starts_with("Showing contribution chart for 2023."));
        assert_eq!(state.active_chart, Some(ChartKind::Contribution));
        assert_eq!(state.chart_date_range, ChartDateRange::year(2023).unwrap());

        // Same chart with dates stays visible.
        term.execute(&mut state, "plot contribution from 2022");
        assert_eq!(state.active_chart, Some(ChartKind::Contribution));
        assert_eq!(state.chart_date_range.from, Some(d(2022, 1, 1)));
        assert_eq!(state.chart_date_range.to, None);

        term.execute(&mut state, "plot drawdown all");
        assert!(state.chart_date_range.is_unbounded());
    }

    #[test]
    fn abs_modifier_selects_absolute_variant() {
        let term = terminal();
        let mut state = TransactionState::new();
        term.execute(&mut state, "plot composition abs");
        assert_eq!(state.active_chart, Some(ChartKind::CompositionAbs));
        assert!(state.chart_date_range.is_unbounded());
    }

    #[test]
    fn fx_names_the_base_currency() {
        let term = terminal();
        let mut state = TransactionState::new();
        state.set_selected_currency("cny");
        let out = term.execute(&mut state, "plot fx");
        assert!(out.text().starts_with("Showing FX chart (base CNY) for all time."));
    }

    #[test]
    fn yield_without_data_says_so() {
        let mut state = TransactionState::new();
        let out = terminal().execute(&mut state, "plot yield");
        assert!(out.text().ends_with("No yield data in range."));
    }

    #[test]
    fn plotting_unzooms_and_hides_the_table() {
        let term = terminal();
        let mut state = state_with_trades();
        term.execute(&mut state, "transaction");
        term.execute(&mut state, "zoom");
        term.execute(&mut state, "plot beta");
        assert!(!state.zoomed);
        assert!(!state.show_table);
        assert_eq!(state.active_chart, Some(ChartKind::Beta));
    }
}

// ═══════════════════════════════════════════════════════════════════
// abs / per
// ═══════════════════════════════════════════════════════════════════

mod view_switch {
    use super::*;

    #[test]
    fn requires_a_switchable_chart() {
        let term = terminal();
        let mut state = TransactionState::new();
        let expected = "Composition, sectors, geography, or drawdown chart must be active to use this command.";
        assert_eq!(term.execute(&mut state, "abs").text(), expected);

        term.execute(&mut state, "plot performance");
        assert_eq!(term.execute(&mut state, "per").text(), expected);
    }

    #[test]
    fn switches_within_the_family() {
        let term = terminal();
        let mut state = TransactionState::new();
        term.execute(&mut state, "plot drawdown");

        let out = term.execute(&mut state, "abs");
        assert!(out.redraw);
        assert!(out.text().starts_with("Switched drawdown chart to absolute view."));
        assert_eq!(state.active_chart, Some(ChartKind::DrawdownAbs));

        let out = term.execute(&mut state, "absolute");
        assert_eq!(out.text(), "Drawdown chart is already showing absolute values.");
        assert!(!out.redraw);

        term.execute(&mut state, "percentage");
        assert_eq!(state.active_chart, Some(ChartKind::Drawdown));
    }
}

// ═══════════════════════════════════════════════════════════════════
// transaction
// ═══════════════════════════════════════════════════════════════════

mod transaction {
    use super::*;

    #[test]
    fn bare_command_toggles_the_table() {
        let term = terminal();
        let mut state = state_with_trades();

        let out = term.execute(&mut state, "transaction");
        assert!(state.show_table);
        assert!(out.messages[0].starts_with("Toggled transaction table visibility."));
        assert_eq!(out.messages.len(), 2);

        let out = term.execute(&mut state, "t");
        assert!(!state.show_table);
        assert_eq!(out.text(), "Toggled transaction table visibility.");
    }

    #[test]
    fn text_filters_the_rows() {
        let term = terminal();
        let mut state = state_with_trades();
        let out = term.execute(&mut state, "transaction type:sell");
        assert!(state.show_table);
        assert!(out.messages[0].starts_with("Filtering transactions by: \"type:sell\""));
        assert_eq!(state.active_filter_text, "type:sell");
        assert_eq!(state.filtered_transactions.len(), 1);
        assert_eq!(state.filtered_transactions[0].order_type, OrderType::Sell);
    }

    #[test]
    fn date_argument_filters_the_table() {
        let term = terminal();
        let mut state = state_with_trades();
        let out = term.execute(&mut state, "transaction 2023");
        assert!(out.messages[0].starts_with("Applied date filter 2023 to transactions table."));
        assert_eq!(state.filtered_transactions.len(), 2);
        assert!(state
            .filtered_transactions
            .iter()
            .all(|tx| tx.trade_date >= d(2023, 1, 1) && tx.trade_date <= d(2023, 12, 31)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fallback input
// ═══════════════════════════════════════════════════════════════════

mod fallback {
    use super::*;

    #[test]
    fn bare_range_needs_a_target() {
        let term = terminal();
        let mut state = state_with_trades();
        let out = term.execute(&mut state, "2023");
        assert_eq!(
            out.text(),
            "Transaction table is hidden. Use the \"transaction\" command to show it before applying date filters."
        );
        assert!(state.chart_date_range.is_unbounded());
    }

    #[test]
    fn bare_range_goes_to_the_active_chart() {
        let term = terminal();
        let mut state = TransactionState::new();
        term.execute(&mut state, "plot performance");
        let out = term.execute(&mut state, "2023q1");
        assert!(out.text().starts_with("Applied date filter Q1 2023 to performance chart."));
        assert_eq!(state.chart_date_range.from, Some(d(2023, 1, 1)));
        assert_eq!(state.chart_date_range.to, Some(d(2023, 3, 31)));
    }

    #[test]
    fn other_input_becomes_a_filter() {
        let term = terminal();
        let mut state = state_with_trades();
        let out = term.execute(&mut state, "type:buy");
        assert!(out.redraw);
        assert_eq!(out.text(), "Filtering transactions by: \"type:buy\"");
        assert_eq!(state.filtered_transactions.len(), 3);
    }

    #[test]
    fn all_clears_filters_and_ranges() {
        let term = terminal();
        let mut state = state_with_trades();
        term.execute(&mut state, "transaction 2023");
        term.execute(&mut state, "type:buy");

        let out = term.execute(&mut state, "alltime");
        assert!(out.text().starts_with("Cleared chart date filters."));
        assert!(state.chart_date_range.is_unbounded());
        assert_eq!(state.active_filter_text, "type:buy");

        let out = term.execute(&mut state, "all");
        assert!(out.text().starts_with("Showing all data (filters and date ranges cleared)."));
        assert!(state.active_filter_text.is_empty());
        assert_eq!(state.filtered_transactions.len(), 4);
    }

    #[test]
    fn reset_and_clear_hide_everything() {
        let term = terminal();
        let mut state = state_with_trades();
        term.execute(&mut state, "plot performance 2023");

        let out = term.execute(&mut state, "reset");
        assert_eq!(
            out.text(),
            "Reset filters and date ranges. All views hidden. Use `transaction` or `plot` to view data."
        );
        assert_eq!(state.active_chart, None);
        assert!(state.chart_date_range.is_unbounded());

        term.execute(&mut state, "transaction");
        let out = term.execute(&mut state, "clear");
        assert!(out.clear_output);
        assert!(out.redraw);
        assert!(out.messages.is_empty());
        assert!(!state.show_table);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Inline formatting
// ═══════════════════════════════════════════════════════════════════

mod formatting {
    use super::*;

    #[test]
    fn percent_inline_signs() {
        assert_eq!(percent_inline(1.234), "+1.23%");
        assert_eq!(percent_inline(-1.234), "\u{2212}1.23%");
        assert_eq!(percent_inline(0.0), "0.00%");
        assert_eq!(percent_inline(f64::NAN), "0%");
    }
}
