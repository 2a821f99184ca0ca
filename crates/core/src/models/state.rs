use std::collections::{BTreeMap, HashMap};

use super::chart::ChartKind;
use super::range::ChartDateRange;
use super::series::{is_benchmark_key, SeriesMap, TimeSeriesPoint, MARKET_KEY, PORTFOLIO_KEY};
use super::snapshot::{CompositionSnapshot, ContributionEntry, FxRates, PeSnapshot, SplitEvent, YieldEntry};
use super::transaction::{Transaction, TransactionFilter};
use crate::services::currency_service::CurrencyConverter;

/// Raw data loaded from the data files. Builders derive chart series from
/// these on demand.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    /// Currency code → portfolio balance series.
    pub balance: BTreeMap<String, Vec<TimeSeriesPoint>>,
    /// Currency code → running contribution entries.
    pub contribution: BTreeMap<String, Vec<ContributionEntry>>,
    /// Cumulative TWRR per key (`^LZ` plus benchmarks).
    pub performance: SeriesMap,
    pub composition: Option<CompositionSnapshot>,
    pub sectors: Option<CompositionSnapshot>,
    pub geography: Option<CompositionSnapshot>,
    pub pe: Option<PeSnapshot>,
    pub yields: Vec<YieldEntry>,
    pub fx: Option<FxRates>,
    /// Stock splits applied when replaying trades.
    pub splits: Vec<SplitEvent>,
}

/// Outcome of a legend click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendToggle {
    /// Visibility changed; the new state of the clicked key.
    Toggled(bool),
    /// Nothing changed: the portfolio line on performance-family charts, or
    /// any key on an allocation chart.
    Locked,
}

/// The single view-state context. Owned by the dashboard facade and
/// mutated only through the methods below.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub active_chart: Option<ChartKind>,
    pub chart_visibility: HashMap<String, bool>,
    pub chart_date_range: ChartDateRange,
    pub selected_currency: String,

    pub all_transactions: Vec<Transaction>,
    pub filtered_transactions: Vec<Transaction>,
    pub active_filter: TransactionFilter,
    pub active_filter_text: String,
    pub show_table: bool,

    /// Tickers picked out of the table filter for composition charts.
    pub composition_tickers: Vec<String>,
    pub zoomed: bool,
    pub show_labels: bool,

    pub data: ChartData,

    /// Newest first.
    pub command_history: Vec<String>,
    /// Year used for bare quarter tokens like `q2`.
    pub last_context_year: Option<i32>,
}

impl Default for TransactionState {
    fn default() -> Self {
        let chart_visibility = ["contribution", "balance", "buy", "sell"]
            .into_iter()
            .map(|k| (k.to_string(), true))
            .collect();
        Self {
            active_chart: None,
            chart_visibility,
            chart_date_range: ChartDateRange::all(),
            selected_currency: "USD".to_string(),
            all_transactions: Vec::new(),
            filtered_transactions: Vec::new(),
            active_filter: TransactionFilter::default(),
            active_filter_text: String::new(),
            show_table: false,
            composition_tickers: Vec::new(),
            zoomed: false,
            show_labels: true,
            data: ChartData::default(),
            command_history: Vec::new(),
            last_context_year: None,
        }
    }
}

impl TransactionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Charts ──────────────────────────────────────────────────────

    pub fn set_active_chart(&mut self, chart: Option<ChartKind>) {
        self.active_chart = chart;
    }

    pub fn set_chart_date_range(&mut self, range: ChartDateRange) {
        self.chart_date_range = range;
        if let Some(year) = range.anchor_year() {
            self.last_context_year = Some(year);
        }
        self.refresh_filtered_transactions();
    }

    pub fn clear_chart_date_range(&mut self) {
        self.set_chart_date_range(ChartDateRange::all());
    }

    /// Visibility of a series key. Unknown keys default to the portfolio and
    /// the market reference being shown.
    #[must_use]
    pub fn is_series_visible(&self, key: &str) -> bool {
        self.chart_visibility
            .get(key)
            .copied()
            .unwrap_or(key == PORTFOLIO_KEY || key == MARKET_KEY)
    }

    /// Seed default visibility for keys seen for the first time.
    pub fn ensure_default_visibility<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            self.chart_visibility
                .entry(key.to_string())
                .or_insert(key == PORTFOLIO_KEY || key == MARKET_KEY);
        }
    }

    /// Legend click on `key`.
    ///
    /// On performance-family charts the portfolio line cannot be hidden and
    /// benchmarks behave like a radio group: clicking one hides every other
    /// benchmark and flips the clicked one. Allocation charts ignore legend
    /// clicks. Elsewhere it is a plain toggle.
    pub fn toggle_series(&mut self, key: &str) -> LegendToggle {
        if self.active_chart.is_some_and(ChartKind::is_allocation) {
            return LegendToggle::Locked;
        }
        let radio = self.active_chart.is_some_and(|c| c.is_performance_family());
        if radio {
            if key == PORTFOLIO_KEY {
                return LegendToggle::Locked;
            }
            if is_benchmark_key(key) {
                let next = !self.is_series_visible(key);
                for other in super::series::BENCHMARK_KEYS {
                    if other != key {
                        self.chart_visibility.insert(other.to_string(), false);
                    }
                }
                self.chart_visibility.insert(key.to_string(), next);
                return LegendToggle::Toggled(next);
            }
        }
        let next = !self.is_series_visible(key);
        self.chart_visibility.insert(key.to_string(), next);
        LegendToggle::Toggled(next)
    }

    // ── Transactions ────────────────────────────────────────────────

    pub fn set_all_transactions(&mut self, transactions: Vec<Transaction>) {
        self.all_transactions = transactions;
        self.refresh_filtered_transactions();
    }

    /// Replace the table filter and recompute the filtered rows.
    pub fn set_transaction_filter(&mut self, text: &str, filter: TransactionFilter) {
        self.active_filter_text = text.trim().to_string();
        self.composition_tickers = match (&filter.security, filter.tickers.is_empty()) {
            (_, false) => filter.tickers.clone(),
            (Some(sec), true) => vec![sec.clone()],
            (None, true) => Vec::new(),
        };
        self.active_filter = filter;
        self.refresh_filtered_transactions();
    }

    pub fn clear_transaction_filter(&mut self) {
        self.set_transaction_filter("", TransactionFilter::default());
    }

    pub fn clear_composition_tickers(&mut self) {
        self.composition_tickers.clear();
    }

    pub fn set_show_table(&mut self, show: bool) {
        self.show_table = show;
        self.refresh_filtered_transactions();
    }

    /// Replace the loaded chart data. Amount filters are re-evaluated
    /// because the FX table may have changed.
    pub fn set_data(&mut self, data: ChartData) {
        self.data = data;
        self.refresh_filtered_transactions();
    }

    /// Date range applies to the table only while it is visible. `min:` and
    /// `max:` compare against amounts in the display currency.
    fn refresh_filtered_transactions(&mut self) {
        let range = self.chart_date_range;
        let use_range = self.show_table && !range.is_unbounded();
        let money = CurrencyConverter::for_state(self);
        let filtered = self
            .all_transactions
            .iter()
            .filter(|tx| !use_range || range.contains(tx.trade_date))
            .filter(|tx| {
                let amount = money.convert(tx.net_amount, tx.trade_date).abs();
                self.active_filter.matches_amount(tx, amount)
            })
            .cloned()
            .collect();
        self.filtered_transactions = filtered;
    }

    /// Whether any table filter (text or date) narrows the rows.
    #[must_use]
    pub fn has_active_filter(&self) -> bool {
        !self.active_filter.is_empty() || (self.show_table && !self.chart_date_range.is_unbounded())
    }

    // ── Misc ────────────────────────────────────────────────────────

    pub fn set_selected_currency(&mut self, currency: &str) {
        self.selected_currency = super::settings::Preferences::normalize_currency(currency);
        self.refresh_filtered_transactions();
    }

    pub fn toggle_zoom(&mut self) -> bool {
        self.zoomed = !self.zoomed;
        self.zoomed
    }

    pub fn toggle_labels(&mut self) -> bool {
        self.show_labels = !self.show_labels;
        self.show_labels
    }

    pub fn push_command_history(&mut self, command: &str) {
        self.command_history.insert(0, command.to_string());
    }

    /// Earliest trade year, if any transactions are loaded.
    #[must_use]
    pub fn earliest_transaction_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.all_transactions.iter().map(|t| t.trade_date.year()).min()
    }

    /// Clear filters, ranges and the active chart.
    pub fn reset_view(&mut self) {
        self.active_chart = None;
        self.zoomed = false;
        self.show_table = false;
        self.chart_date_range = ChartDateRange::all();
        self.composition_tickers.clear();
        self.clear_transaction_filter();
    }
}
