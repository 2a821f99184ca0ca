// ═══════════════════════════════════════════════════════════════════
// Date Range Parser Tests — simplified (colon) grammar, worded
// grammar, quarter tokens and the context year
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;

use fund_terminal_core::models::range::ChartDateRange;
use fund_terminal_core::models::state::TransactionState;
use fund_terminal_core::models::transaction::{OrderType, Transaction};
use fund_terminal_core::services::date_range_service::{DateRangeParser, QuarterMode};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn parser() -> DateRangeParser {
    DateRangeParser::new(d(2024, 6, 15))
}

fn range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ChartDateRange {
    ChartDateRange { from, to }
}

// ═══════════════════════════════════════════════════════════════════
// Token primitives
// ═══════════════════════════════════════════════════════════════════

mod primitives {
    use super::*;

    #[test]
    fn quarter_tokens() {
        assert_eq!(DateRangeParser::parse_quarter_token("2023Q4", 0), Some((2023, 4)));
        assert_eq!(DateRangeParser::parse_quarter_token("q2", 2021), Some((2021, 2)));
        assert_eq!(DateRangeParser::parse_quarter_token("q5", 2021), None);
        assert_eq!(DateRangeParser::parse_quarter_token("23q1", 2021), None);
        assert_eq!(DateRangeParser::parse_quarter_token("2023q12", 2021), None);
    }

    #[test]
    fn quarter_bounds() {
        assert_eq!(
            DateRangeParser::quarter_range(2023, 4, QuarterMode::Full),
            Some(range(Some(d(2023, 10, 1)), Some(d(2023, 12, 31))))
        );
        assert_eq!(
            DateRangeParser::quarter_range(2024, 1, QuarterMode::End),
            Some(range(None, Some(d(2024, 3, 31))))
        );
        assert_eq!(
            DateRangeParser::quarter_range(2022, 3, QuarterMode::Start),
            Some(range(Some(d(2022, 7, 1)), None))
        );
        assert_eq!(DateRangeParser::quarter_range(2022, 0, QuarterMode::Full), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Simplified grammar
// ═══════════════════════════════════════════════════════════════════

mod simplified {
    use super::*;

    #[test]
    fn bare_year() {
        let mut state = TransactionState::new();
        let parsed = parser().parse_simplified(&mut state, "2023");
        assert_eq!(parsed, ChartDateRange::year(2023));
        assert_eq!(state.last_context_year, Some(2023));
    }

    #[test]
    fn year_quarter() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_simplified(&mut state, "2023q1"),
            Some(range(Some(d(2023, 1, 1)), Some(d(2023, 3, 31))))
        );
    }

    #[test]
    fn from_and_to() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_simplified(&mut state, "from:2022"),
            Some(range(Some(d(2022, 1, 1)), None))
        );
        assert_eq!(
            parser().parse_simplified(&mut state, "to:2024"),
            Some(range(None, Some(d(2024, 12, 31))))
        );
    }

    #[test]
    fn short_from_with_bare_quarter_uses_context() {
        let mut state = TransactionState::new();
        state.last_context_year = Some(2023);
        assert_eq!(
            parser().parse_simplified(&mut state, "f:q3"),
            Some(range(Some(d(2023, 7, 1)), None))
        );
    }

    #[test]
    fn year_span() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_simplified(&mut state, "2020:2023"),
            Some(range(Some(d(2020, 1, 1)), Some(d(2023, 12, 31))))
        );
        assert_eq!(state.last_context_year, Some(2020));
    }

    #[test]
    fn quarter_span() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_simplified(&mut state, "2022Q3:2023q1"),
            Some(range(Some(d(2022, 7, 1)), Some(d(2023, 3, 31))))
        );
    }

    #[test]
    fn inverted_span_is_rejected_and_keeps_context() {
        let mut state = TransactionState::new();
        state.last_context_year = Some(2019);
        assert_eq!(parser().parse_simplified(&mut state, "2024:2020"), None);
        assert_eq!(state.last_context_year, Some(2019));
    }

    #[test]
    fn all_is_unbounded() {
        let mut state = TransactionState::new();
        let parsed = parser().parse_simplified(&mut state, "ALL").unwrap();
        assert!(parsed.is_unbounded());
    }

    #[test]
    fn year_window() {
        let mut state = TransactionState::new();
        assert_eq!(parser().parse_simplified(&mut state, "1899"), None);
        assert_eq!(parser().parse_simplified(&mut state, "2030"), None);
        assert!(parser().parse_simplified(&mut state, "2029").is_some());
    }

    #[test]
    fn unrecognized_input_leaves_state_alone() {
        let mut state = TransactionState::new();
        assert_eq!(parser().parse_simplified(&mut state, "nvda"), None);
        assert_eq!(parser().parse_simplified(&mut state, "a:b:c"), None);
        assert_eq!(state.last_context_year, None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Context year
// ═══════════════════════════════════════════════════════════════════

mod context_year {
    use super::*;

    #[test]
    fn falls_back_to_today() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_simplified(&mut state, "q2"),
            Some(range(Some(d(2024, 4, 1)), Some(d(2024, 6, 30))))
        );
    }

    #[test]
    fn active_range_wins() {
        let mut state = TransactionState::new();
        state.set_chart_date_range(ChartDateRange::year(2021).unwrap());
        state.last_context_year = Some(2018);
        assert_eq!(parser().default_year(&mut state), 2021);
        assert_eq!(state.last_context_year, Some(2021));
    }

    #[test]
    fn earliest_transaction_before_today() {
        let mut state = TransactionState::new();
        state.set_all_transactions(vec![Transaction::new(
            0,
            d(2019, 5, 1),
            OrderType::Buy,
            "VT",
            1.0,
            100.0,
        )]);
        assert_eq!(parser().default_year(&mut state), 2019);
    }

    #[test]
    fn quarter_updates_context() {
        let mut state = TransactionState::new();
        parser().parse_simplified(&mut state, "2022q4");
        assert_eq!(state.last_context_year, Some(2022));
        assert_eq!(
            parser().parse_simplified(&mut state, "q1"),
            Some(range(Some(d(2022, 1, 1)), Some(d(2022, 3, 31))))
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// Worded grammar
// ═══════════════════════════════════════════════════════════════════

mod words {
    use super::*;

    #[test]
    fn single_word_delegates() {
        let mut state = TransactionState::new();
        assert_eq!(parser().parse_words(&mut state, &["2023"]), ChartDateRange::year(2023));
    }

    #[test]
    fn from_word() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_words(&mut state, &["from", "2022"]),
            Some(range(Some(d(2022, 1, 1)), None))
        );
    }

    #[test]
    fn to_word_span() {
        let mut state = TransactionState::new();
        assert_eq!(
            parser().parse_words(&mut state, &["2022", "to", "2023q2"]),
            Some(range(Some(d(2022, 1, 1)), Some(d(2023, 6, 30))))
        );
    }

    #[test]
    fn other_shapes_are_rejected() {
        let mut state = TransactionState::new();
        assert_eq!(parser().parse_words(&mut state, &["foo", "bar"]), None);
        assert_eq!(parser().parse_words(&mut state, &[]), None);
        assert_eq!(parser().parse_words(&mut state, &["2022", "until", "2023"]), None);
    }
}
