use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::range::ChartDateRange;
use crate::models::state::TransactionState;

/// Lowest year accepted in a year token.
const MIN_YEAR: i32 = 1900;

/// Years beyond the current one still accepted in a year token.
const MAX_YEARS_AHEAD: i32 = 5;

/// Which side(s) of a quarter a token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarterMode {
    /// First to last day of the quarter.
    Full,
    /// From the first day of the quarter, open-ended.
    Start,
    /// Up to the last day of the quarter, open start.
    End,
}

/// Parses date tokens typed into the terminal into [`ChartDateRange`]s.
///
/// Bare quarter tokens (`q2`) resolve against a context year taken from the
/// active range, then the last parsed year, then the earliest transaction,
/// then today. Unrecognized tokens yield `None` and leave state untouched.
pub struct DateRangeParser {
    today: NaiveDate,
}

impl DateRangeParser {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Parser anchored at the local system date.
    pub fn from_system_clock() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    // ── Context year ────────────────────────────────────────────────

    /// Year used for quarter tokens without an explicit year.
    pub fn default_year(&self, state: &mut TransactionState) -> i32 {
        if let Some(year) = state.chart_date_range.anchor_year() {
            state.last_context_year = Some(year);
            return year;
        }
        if let Some(year) = state.last_context_year {
            return year;
        }
        let fallback = state
            .earliest_transaction_year()
            .unwrap_or_else(|| self.today.year());
        state.last_context_year = Some(fallback);
        fallback
    }

    // ── Token primitives ────────────────────────────────────────────

    /// `YYYYqN` or `qN` (case-insensitive). Returns `(year, quarter)`.
    #[must_use]
    pub fn parse_quarter_token(token: &str, default_year: i32) -> Option<(i32, u32)> {
        let lower = token.trim().to_ascii_lowercase();
        let (year_part, quarter_part) = lower.split_once('q')?;
        if quarter_part.len() != 1 {
            return None;
        }
        let quarter: u32 = quarter_part.parse().ok()?;
        if !(1..=4).contains(&quarter) {
            return None;
        }
        let year = if year_part.is_empty() {
            default_year
        } else if year_part.len() == 4 && year_part.chars().all(|c| c.is_ascii_digit()) {
            year_part.parse().ok()?
        } else {
            return None;
        };
        Some((year, quarter))
    }

    /// Bounds of quarter `quarter` of `year` in the requested mode.
    #[must_use]
    pub fn quarter_range(year: i32, quarter: u32, mode: QuarterMode) -> Option<ChartDateRange> {
        let start_month = (quarter.checked_sub(1)?) * 3 + 1;
        let start = NaiveDate::from_ymd_opt(year, start_month, 1)?;
        let end = if quarter == 4 {
            NaiveDate::from_ymd_opt(year, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(year, start_month + 3, 1)?.pred_opt()?
        };
        let range = match mode {
            QuarterMode::Full => ChartDateRange {
                from: Some(start),
                to: Some(end),
            },
            QuarterMode::Start => ChartDateRange {
                from: Some(start),
                to: None,
            },
            QuarterMode::End => ChartDateRange {
                from: None,
                to: Some(end),
            },
        };
        Some(range)
    }

    /// A four-digit year within the accepted window.
    fn parse_year(&self, token: &str) -> Option<i32> {
        let token = token.trim();
        if token.len() != 4 || !token.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let year: i32 = token.parse().ok()?;
        (MIN_YEAR..=self.today.year() + MAX_YEARS_AHEAD)
            .contains(&year)
            .then_some(year)
    }

    fn resolve_quarter(
        &self,
        state: &mut TransactionState,
        token: &str,
        mode: QuarterMode,
    ) -> Option<ChartDateRange> {
        // Syntax check first so non-quarter input never touches the context year.
        Self::parse_quarter_token(token, 0)?;
        let default_year = self.default_year(state);
        let (year, quarter) = Self::parse_quarter_token(token, default_year)?;
        state.last_context_year = Some(year);
        Self::quarter_range(year, quarter, mode)
    }

    // ── Grammars ────────────────────────────────────────────────────

    /// Colon grammar used for bare terminal input: `2023`, `2023q1`, `q2`,
    /// `from:2022`, `f:q3`, `to:2024`, `2020:2023`, `2022q3:2023q1`, `all`.
    pub fn parse_simplified(
        &self,
        state: &mut TransactionState,
        input: &str,
    ) -> Option<ChartDateRange> {
        let lower = input.trim().to_ascii_lowercase();
        if lower == "all" || lower == "alltime" {
            return Some(ChartDateRange::all());
        }
        let parts: Vec<&str> = lower.split(':').collect();
        let range = match parts.as_slice() {
            [single] => self.single_token(state, single, QuarterMode::Full),
            ["from" | "f", value] => self.single_token(state, value, QuarterMode::Start),
            ["to", value] => self.single_token(state, value, QuarterMode::End),
            [start, end] => self.span(state, start, end),
            _ => None,
        };
        debug!(input, ?range, "parsed simplified date range");
        range
    }

    /// Word grammar used after `plot <chart>` and `transaction`:
    /// `[tok]`, `[from, tok]`, `[a, to, b]`.
    pub fn parse_words(
        &self,
        state: &mut TransactionState,
        args: &[&str],
    ) -> Option<ChartDateRange> {
        let range = match args {
            [single] => self.parse_simplified(state, single),
            [from, value] if from.eq_ignore_ascii_case("from") => {
                self.single_token(state, value, QuarterMode::Start)
            }
            [start, to, end] if to.eq_ignore_ascii_case("to") => self.span(state, start, end),
            _ => None,
        };
        debug!(?args, ?range, "parsed worded date range");
        range
    }

    /// One quarter or year token in `mode`.
    fn single_token(
        &self,
        state: &mut TransactionState,
        token: &str,
        mode: QuarterMode,
    ) -> Option<ChartDateRange> {
        if let Some(range) = self.resolve_quarter(state, token, mode) {
            return Some(range);
        }
        let year = self.parse_year(token)?;
        state.last_context_year = Some(year);
        let full = ChartDateRange::year(year)?;
        Some(match mode {
            QuarterMode::Full => full,
            QuarterMode::Start => ChartDateRange {
                from: full.from,
                to: None,
            },
            QuarterMode::End => ChartDateRange {
                from: None,
                to: full.to,
            },
        })
    }

    /// `A..B` where each side is a quarter or a year; requires `from <= to`.
    fn span(&self, state: &mut TransactionState, start: &str, end: &str) -> Option<ChartDateRange> {
        let previous_context = state.last_context_year;
        let range = self
            .span_bounds(state, start, end)
            .and_then(|(from, to)| ChartDateRange::new(from, to).ok());
        state.last_context_year = match range {
            Some(r) => r.anchor_year(),
            None => previous_context,
        };
        range
    }

    fn span_bounds(
        &self,
        state: &mut TransactionState,
        start: &str,
        end: &str,
    ) -> Option<(Option<NaiveDate>, Option<NaiveDate>)> {
        let from = self
            .resolve_quarter(state, start, QuarterMode::Full)
            .or_else(|| self.parse_year(start).and_then(ChartDateRange::year))?
            .from;
        let to = self
            .resolve_quarter(state, end, QuarterMode::Full)
            .or_else(|| self.parse_year(end).and_then(ChartDateRange::year))?
            .to;
        Some((from, to))
    }
}

impl Default for DateRangeParser {
    fn default() -> Self {
        Self::from_system_clock()
    }
}
