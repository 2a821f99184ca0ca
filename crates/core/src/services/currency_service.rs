use chrono::NaiveDate;
use tracing::debug;

use crate::models::series::TimeSeriesPoint;
use crate::models::snapshot::{ContributionEntry, FxRates};
use crate::models::state::TransactionState;
use crate::models::transaction::Transaction;
use crate::services::table_service::format_currency;

/// Currency every amount in the data files is recorded in.
pub const SOURCE_CURRENCY: &str = "USD";

/// Converts USD amounts into the display currency at each amount's own date.
///
/// The display currency is the requested one only when the FX table can
/// price it; otherwise everything stays in USD and is labelled as USD.
/// Once built, every conversion succeeds: a date without a rate uses the
/// closest earlier rate, or the first one on record.
#[derive(Debug, Clone)]
pub struct CurrencyConverter<'a> {
    fx: Option<&'a FxRates>,
    currency: String,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(fx: Option<&'a FxRates>, requested: &str) -> Self {
        let requested = requested.trim().to_ascii_uppercase();
        let convertible = fx.is_some_and(|fx| fx.supports(SOURCE_CURRENCY) && fx.supports(&requested));
        let currency = if requested == SOURCE_CURRENCY || convertible {
            requested
        } else {
            debug!(requested = %requested, "no FX rates for currency; showing USD");
            SOURCE_CURRENCY.to_string()
        };
        Self { fx, currency }
    }

    /// Converter for the state's loaded FX table and selected currency.
    pub fn for_state(state: &'a TransactionState) -> Self {
        Self::new(state.data.fx.as_ref(), &state.selected_currency)
    }

    /// Currency amounts come out in.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.currency == SOURCE_CURRENCY
    }

    /// `amount` (USD) in the display currency on `date`.
    #[must_use]
    pub fn convert(&self, amount: f64, date: NaiveDate) -> f64 {
        if self.is_identity() {
            return amount;
        }
        // `new` only picks a foreign currency when both legs have rates.
        self.fx
            .and_then(|fx| fx.convert(amount, SOURCE_CURRENCY, &self.currency, date))
            .unwrap_or(amount)
    }

    /// `amount` converted on `date`, with the display currency's symbol.
    #[must_use]
    pub fn format(&self, amount: f64, date: NaiveDate) -> String {
        format_currency(self.convert(amount, date), &self.currency)
    }

    /// Display-currency amount, for values already converted.
    #[must_use]
    pub fn format_converted(&self, amount: f64) -> String {
        format_currency(amount, &self.currency)
    }

    /// Trade with price and net amount in the display currency on its trade date.
    #[must_use]
    pub fn localize(&self, tx: &Transaction) -> Transaction {
        if self.is_identity() {
            return tx.clone();
        }
        Transaction {
            price: self.convert(tx.price, tx.trade_date),
            net_amount: self.convert(tx.net_amount, tx.trade_date),
            ..tx.clone()
        }
    }

    #[must_use]
    pub fn localize_all(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        transactions.iter().map(|tx| self.localize(tx)).collect()
    }

    /// Each point converted at its own date.
    #[must_use]
    pub fn convert_points(&self, points: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
        if self.is_identity() {
            return points.to_vec();
        }
        points
            .iter()
            .map(|p| TimeSeriesPoint::new(p.date, self.convert(p.value, p.date)))
            .collect()
    }

    /// Running contribution rebuilt in the display currency: every trade's
    /// net amount is converted on its trade date and re-accumulated, so
    /// earlier contributions keep the rate they were made at.
    #[must_use]
    pub fn convert_contribution(&self, entries: &[ContributionEntry]) -> Vec<ContributionEntry> {
        if self.is_identity() {
            return entries.to_vec();
        }
        let mut cumulative = 0.0;
        entries
            .iter()
            .map(|entry| {
                let net = self.convert(entry.net_amount, entry.trade_date);
                cumulative += net;
                ContributionEntry {
                    amount: cumulative,
                    net_amount: net,
                    ..entry.clone()
                }
            })
            .collect()
    }
}
