use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Active chart/table date filter. `None` on either side means unbounded.
///
/// Invariant: when both bounds are set, `from <= to`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartDateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ChartDateRange {
    /// Build a range, rejecting `from > to`.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, CoreError> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(CoreError::ValidationError(format!(
                    "'from' date ({f}) must not be after 'to' date ({t})"
                )));
            }
        }
        Ok(Self { from, to })
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Self::default()
    }

    /// Jan 1 to Dec 31 of `year`.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            from: NaiveDate::from_ymd_opt(year, 1, 1),
            to: Some(NaiveDate::from_ymd_opt(year, 12, 31)?),
        })
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Inclusive containment check.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }

    /// Year of `from`, else of `to`.
    #[must_use]
    pub fn anchor_year(&self) -> Option<i32> {
        self.from.or(self.to).map(|d| d.year())
    }
}

/// Quarter (1..=4) whose first or last day is `date`.
fn quarter_boundary(date: NaiveDate) -> Option<u32> {
    match (date.month(), date.day()) {
        (1, 1) | (3, 31) => Some(1),
        (4, 1) | (6, 30) => Some(2),
        (7, 1) | (9, 30) => Some(3),
        (10, 1) | (12, 31) => Some(4),
        _ => None,
    }
}

impl std::fmt::Display for ChartDateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                if from.year() == to.year() {
                    if let (Some(qa), Some(qb)) = (quarter_boundary(from), quarter_boundary(to)) {
                        if qa == qb {
                            return write!(f, "Q{qa} {}", from.year());
                        }
                    }
                    if (from.month(), from.day()) == (1, 1) && (to.month(), to.day()) == (12, 31) {
                        return write!(f, "{}", from.year());
                    }
                }
                write!(f, "{from} to {to}")
            }
            (Some(from), None) => write!(f, "from {from}"),
            (None, Some(to)) => write!(f, "to {to}"),
            (None, None) => write!(f, "all time"),
        }
    }
}
