use tracing::debug;

use crate::models::chart::ChartKind;
use crate::models::range::ChartDateRange;
use crate::models::series::{ordered_keys, SeriesMap, TimeSeriesPoint};
use crate::models::snapshot::CompositionSnapshot;
use crate::models::state::TransactionState;
use crate::services::chart_service::ChartService;
use crate::services::currency_service::CurrencyConverter;
use crate::services::date_range_service::DateRangeParser;
use crate::services::snapshot_service::{BALANCE_KEY, CONTRIBUTION_KEY};
use crate::services::table_service::{format_currency, parse_command_palette, TableService};

// ── Reply texts ─────────────────────────────────────────────────────

const TWRR_MESSAGE: &str = "TWRR (Time-Weighted Rate of Return) describes how efficiently the portfolio has grown regardless of when money moved in or out. It focuses purely on investment performance, so the result is not distorted by the size or timing of deposits and withdrawals.\n\nWe follow the industry-standard method: for each day we compute a return factor by dividing the ending market value by the prior-day value after applying that day's net contribution (cash in is added, cash out is subtracted). Multiplying, or \"chaining,\" these daily factors produces the cumulative TWRR curve shown in the chart.";

const ROLLING_EXPLANATION: &str = "Rolling returns show the investment performance for a fixed period (1 year) ending on each day. This provides a \"rolling\" window of performance that helps identify consistency over time and smooths out the dependency on a single arbitrary start date, offering a clearer view of historical return volatility.";

const VOLATILITY_EXPLANATION: &str = "Rolling volatility shows the annualized standard deviation of daily returns over a fixed period (90 days) ending on each day. It provides a visual representation of the portfolio's risk profile, indicating how much returns deviate from their average. Comparing your portfolio's volatility against benchmarks like the S&P 500 helps you understand your relative risk exposure.";

const BETA_EXPLANATION: &str = "Beta measures the portfolio's sensitivity to the broader market (S&P 500). A Beta of 1.0 means the portfolio moves in line with the market; >1.0 is more aggressive, and <1.0 is more defensive. This chart shows the 6-month (126 trading days) rolling Beta calculated as Covariance(Portfolio, Market) / Variance(Market), illustrating how your risk profile evolves as your holdings change.";

const YIELD_EXPLANATION: &str = "This chart maps your portfolio's Forward Dividend Yield (%) against actual Trailing 12-Month (TTM) Dividend Income ($). The line represents the aggregate yield if current holdings were held for a year, while the bars show the actual cash dividends collected in the preceding 12 months.\n\nNote: Early period yields may appear inflated due to the smaller portfolio base and the TTM dividend proxy used in the calculation.";

const HELP_TEXT: &str = "Available commands:
  stats (s)          - Statistics commands
                       Use \"stats\" or \"s\" for subcommands
                       Subcommands: transactions, holdings, concentration, cagr, return, ratio
                       Examples: stats holdings, s cagr, stats concentration
  plot (p)           - Chart commands
                       Use \"plot\" or \"p\" for subcommands
                       Subcommands: balance, performance, drawdown, rolling, volatility, beta, yield, composition,
                                    composition-abs, sectors, sectors-abs, geography, geography-abs,
                                    concentration, pe, fx
                       Examples: plot balance, p performance, plot drawdown, plot composition 2023,
                                 plot composition abs 2023, plot sectors abs, plot pe, plot fx
  transaction (t)    - Toggle the transaction table visibility
  zoom (z)           - Toggle terminal zoom (expand to take over chart area)
  label (l)          - Toggle chart labels
  abs (a) / per      - Switch the active chart between absolute and percentage views
  summary            - Show summary of the currently active chart
  all                - Show all data (remove filters and date ranges)
  alltime            - Clear chart date filters only
  allstock           - Clear composition ticker filters
  reset              - Hide every view and clear filters
  clear              - Clear the terminal screen
  help (h)           - Show this help message
                       Use \"help filter\", \"help plot\", \"help stats\" or \"help transaction\" for details

Any other input is treated as a filter for the transaction table
When a chart is active, you can use simplified date commands like '2023', '2023q1', 'from:2023q2' (or 'f:2023q2'), '2022:2023'";

const FILTER_HELP: &str = "Usage: <filter>:<value>

Available filters:
  type     - Filter by order type (buy or sell).
             Example: type:buy
  security - Filter by security ticker.
             Example: security:NVDA or s:NVDA
  min      - Show transactions with a net amount greater than value.
             Example: min:1000
  max      - Show transactions with a net amount less than value.
             Example: max:5000
  stock    - Show individual stock positions (excludes ETFs/funds).
             Example: stock
  etf      - Show ETF/mutual fund positions (excludes individual stocks).
             Example: etf
  abs/a    - When composition, sectors, geography, or drawdown chart is open, switch to absolute view.
             Example: abs
  per      - When absolute view is open, switch back to percentage view.
             Example: per
  alltime  - Clear chart date filters without touching other filters.
             Example: alltime
  allstock - Clear composition ticker filters (show all holdings).
             Example: allstock

Date filters (when chart is active):
  from:YYYY or f:YYYY     - Filter from year (e.g., from:2022 or f:2022)
  to:YYYY                 - Filter to year (e.g., to:2023)
  YYYY:YYYY               - Filter year range (e.g., 2022:2023)
  YYYYqN                  - Filter by quarter (e.g., 2023q1)
  YYYYqN:YYYYqN           - Filter between two quarters (e.g., 2022q1:2023q2)
  from:YYYYqN or f:YYYYqN - Filter from quarter (e.g., from:2022q3)
  qN                      - Quarter of the current range (e.g., q2)
  from:qN or f:qN         - From the start of that quarter (e.g., f:q3)
  to:qN                   - To the end of that quarter (e.g., to:q4)

Chart label toggle:
  label (l)               - Toggle chart labels (start/end annotations).
                            Example: label

Any text not part of a command is used for a general text search.";

const PLOT_HELP: &str = "Plot commands:
  plot balance           - Show contribution/balance chart
  plot performance       - Show TWRR performance chart
  plot drawdown          - Show underwater drawdown chart (percentage)
  plot drawdown abs      - Show drawdown chart with absolute values
  plot rolling           - Show 1-Year rolling returns chart
  plot volatility        - Show 90-Day annualized rolling volatility chart
  plot beta              - Show 6-Month rolling portfolio Beta vs S&P 500
  plot yield             - Show portfolio forward yield (%) and TTM income ($)
  plot composition       - Show portfolio composition chart (percent view)
  plot composition abs   - Show composition chart with absolute values
  plot sectors           - Show sector allocation chart (percent view)
  plot sectors abs       - Show sector allocation chart with absolute values
  plot geography         - Show geography allocation chart (percent view)
  plot geography abs     - Show geography allocation chart with absolute values
  plot concentration     - Show portfolio concentration (HHI) chart
  plot pe                - Show weighted average P/E ratio chart
  plot fx                - Show FX rate chart for the selected base currency

Usage: plot <subcommand> or p <subcommand>
  balance       [year|quarter|qN] | [from <...>] | [<...> to <...>]
  performance   [year|quarter|qN] | [from <...>] | [<...> to <...>]
  drawdown      [abs] [year|quarter|qN] | [from <...>] | [<...> to <...>]
  composition   [abs] [year|quarter|qN] | [from <...>] | [<...> to <...>]
  sectors       [abs] [year|quarter|qN] | [from <...>] | [<...> to <...>]
  geography     [abs] [year|quarter|qN] | [from <...>] | [<...> to <...>]
  concentration [year|quarter|qN] | [from <...>] | [<...> to <...>]
  pe            [year|quarter|qN] | [from <...>] | [<...> to <...>]
  fx            [year|quarter|qN] | [from <...>] | [<...> to <...>]
  rolling       [year|quarter|qN] | [from <...>] | [<...> to <...>]
  volatility    [year|quarter|qN] | [from <...>] | [<...> to <...>]
  beta          [year|quarter|qN] | [from <...>] | [<...> to <...>]
  yield         [year|quarter|qN] | [from <...>] | [<...> to <...>]

Passing 'all' as the date clears the chart's date range.";

const STATS_HELP: &str = "Stats commands:
  stats transactions  - Show transaction statistics
  stats holdings      - Show current holdings
  stats concentration - Show Herfindahl concentration & effective holdings
  stats cagr          - Show CAGR based on TWRR series
  stats return        - Show annual returns for portfolio and benchmarks
  stats ratio         - Show Sharpe and Sortino ratios

Usage: stats <subcommand> or s <subcommand>";

const TRANSACTION_HELP: &str = "Transaction commands:
  transaction (t)           - Toggle the transaction table
  transaction <date>        - Show the table and apply a date range (e.g., t 2023q1, t from:2022)
  transaction <filter>      - Show the table filtered by a command palette query (e.g., t type:buy min:1000)

Use \"help filter\" for the filter grammar.";

const PLOT_SUBCOMMANDS: [&str; 17] = [
    "balance",
    "performance",
    "composition",
    "composition-abs",
    "sectors",
    "sectors-abs",
    "geography",
    "geography-abs",
    "fx",
    "drawdown",
    "drawdown-abs",
    "concentration",
    "pe",
    "rolling",
    "volatility",
    "beta",
    "yield",
];

const STATS_SUBCOMMANDS: [&str; 6] = ["transactions", "holdings", "concentration", "cagr", "return", "ratio"];

const HELP_SUBCOMMANDS: [&str; 4] = ["filter", "plot", "stats", "transaction"];

const VIEW_SWITCH_ERROR: &str =
    "Composition, sectors, geography, or drawdown chart must be active to use this command.";

/// Holdings under this weight are left out of allocation summaries.
const MIN_SUMMARY_WEIGHT: f64 = 0.1;

// ── Output ──────────────────────────────────────────────────────────

/// Pre-computed text files served by `stats cagr|return|ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticText {
    Cagr,
    AnnualReturns,
    Ratios,
}

impl StaticText {
    /// Path relative to the data root.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            StaticText::Cagr => "output/cagr.txt",
            StaticText::AnnualReturns => "output/annual_returns.txt",
            StaticText::Ratios => "output/ratios.txt",
        }
    }

    /// Scrollback message when the file cannot be fetched.
    #[must_use]
    pub fn error_message(self) -> &'static str {
        match self {
            StaticText::Cagr => "Error loading CAGR data.",
            StaticText::AnnualReturns => "Error loading annual returns.",
            StaticText::Ratios => "Error loading Sharpe and Sortino ratios.",
        }
    }
}

/// Result of one terminal command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// Blocks to append to the scrollback, in order.
    pub messages: Vec<String>,
    /// The chart area must be redrawn from state.
    pub redraw: bool,
    /// The scrollback must be emptied before appending.
    pub clear_output: bool,
    /// A static text file the caller should fetch and append.
    pub fetch: Option<StaticText>,
}

impl CommandOutput {
    fn message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![text.into()],
            ..Self::default()
        }
    }

    fn redraw(text: impl Into<String>) -> Self {
        Self {
            messages: vec![text.into()],
            redraw: true,
            ..Self::default()
        }
    }

    /// All messages joined by blank lines.
    #[must_use]
    pub fn text(&self) -> String {
        self.messages.join("\n\n")
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Interprets terminal input against the view state.
///
/// Every command either mutates [`TransactionState`] (and asks for a redraw),
/// appends text to the scrollback, or both. Unrecognized input is tried as a
/// simplified date range, then as a transaction filter.
pub struct TerminalService {
    parser: DateRangeParser,
    charts: ChartService,
    tables: TableService,
}

impl TerminalService {
    pub fn new(parser: DateRangeParser, charts: ChartService) -> Self {
        Self {
            parser,
            charts,
            tables: TableService::new(),
        }
    }

    #[must_use]
    pub fn parser(&self) -> &DateRangeParser {
        &self.parser
    }

    #[must_use]
    pub fn charts(&self) -> &ChartService {
        &self.charts
    }

    #[must_use]
    pub fn tables(&self) -> &TableService {
        &self.tables
    }

    /// Run one line of input.
    pub fn execute(&self, state: &mut TransactionState, input: &str) -> CommandOutput {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return CommandOutput::default();
        }
        state.push_command_history(trimmed);

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let command = tokens[0].to_ascii_lowercase();
        let args = &tokens[1..];
        debug!(command = %command, ?args, "dispatching terminal command");

        match command.as_str() {
            "h" | "help" => self.help(args),
            "s" | "stats" => self.stats(state, args),
            "p" | "plot" => self.plot(state, args),
            "t" | "transaction" => self.transaction(state, args),
            "z" | "zoom" => {
                let zoomed = state.toggle_zoom();
                CommandOutput::redraw(if zoomed {
                    "Terminal zoomed in."
                } else {
                    "Terminal zoomed out."
                })
            }
            "l" | "label" => {
                let visible = state.toggle_labels();
                CommandOutput::redraw(format!(
                    "Chart labels are now {}.",
                    if visible { "visible" } else { "hidden" }
                ))
            }
            "a" | "abs" | "absolute" => self.switch_view(state, true),
            "per" | "percent" | "percentage" => self.switch_view(state, false),
            "all" => {
                state.clear_chart_date_range();
                state.clear_transaction_filter();
                let mut text = "Showing all data (filters and date ranges cleared).".to_string();
                self.append_context(state, &mut text);
                if state.active_chart != Some(ChartKind::Fx) {
                    if let Some(fx) = self.fx_line(state) {
                        text.push('\n');
                        text.push_str(&fx);
                    }
                }
                CommandOutput::redraw(text)
            }
            "alltime" => {
                state.clear_chart_date_range();
                let mut text = "Cleared chart date filters.".to_string();
                self.append_context(state, &mut text);
                CommandOutput::redraw(text)
            }
            "allstock" => {
                self.clear_composition_filters(state);
                let mut text = "Cleared composition ticker filters.".to_string();
                self.append_context(state, &mut text);
                CommandOutput::redraw(text)
            }
            "reset" => {
                state.reset_view();
                CommandOutput::redraw(
                    "Reset filters and date ranges. All views hidden. Use `transaction` or `plot` to view data.",
                )
            }
            "clear" => {
                state.reset_view();
                CommandOutput {
                    redraw: true,
                    clear_output: true,
                    ..CommandOutput::default()
                }
            }
            "summary" => {
                let text = if state.show_table {
                    Some(self.dynamic_stats(state))
                } else {
                    self.chart_summary(state)
                };
                CommandOutput::message(text.unwrap_or_else(|| "No active chart or summary available.".to_string()))
            }
            _ => self.default_command(state, trimmed),
        }
    }

    // ── help ────────────────────────────────────────────────────────

    fn help(&self, args: &[&str]) -> CommandOutput {
        let Some(sub) = args.first() else {
            return CommandOutput::message(HELP_TEXT);
        };
        let sub = sub.to_ascii_lowercase();
        let text = match sub.as_str() {
            "filter" => FILTER_HELP.to_string(),
            "plot" | "p" => PLOT_HELP.to_string(),
            "stats" | "s" => STATS_HELP.to_string(),
            "transaction" | "t" => TRANSACTION_HELP.to_string(),
            _ => format!(
                "Unknown help subcommand: {sub}\nAvailable: {}",
                HELP_SUBCOMMANDS.join(", ")
            ),
        };
        CommandOutput::message(text)
    }

    // ── stats ───────────────────────────────────────────────────────

    fn stats(&self, state: &TransactionState, args: &[&str]) -> CommandOutput {
        let Some(sub) = args.first() else {
            return CommandOutput::message(STATS_HELP);
        };
        let sub = sub.to_ascii_lowercase();
        match sub.as_str() {
            "transactions" => CommandOutput::message(self.dynamic_stats(state)),
            "holdings" => CommandOutput::message(self.tables.holdings_table(
                &state.all_transactions,
                &state.data.splits,
                &CurrencyConverter::for_state(state),
            )),
            "concentration" => CommandOutput::message(self.concentration_text(state)),
            "cagr" => self.fetch(StaticText::Cagr),
            "return" => self.fetch(StaticText::AnnualReturns),
            "ratio" => self.fetch(StaticText::Ratios),
            _ => CommandOutput::message(format!(
                "Unknown stats subcommand: {sub}\nAvailable: {}",
                STATS_SUBCOMMANDS.join(", ")
            )),
        }
    }

    fn fetch(&self, text: StaticText) -> CommandOutput {
        CommandOutput {
            fetch: Some(text),
            ..CommandOutput::default()
        }
    }

    /// `FILTERED STATS` while any filter narrows the table, otherwise
    /// `TRANSACTION STATS`.
    fn dynamic_stats(&self, state: &TransactionState) -> String {
        let money = CurrencyConverter::for_state(state);
        let splits = &state.data.splits;
        if state.has_active_filter() {
            self.tables.filtered_stats_table(&state.filtered_transactions, splits, &money)
        } else {
            self.tables.transaction_stats_table(&state.all_transactions, splits, &money)
        }
    }

    fn concentration_text(&self, state: &TransactionState) -> String {
        let Some(snapshot) = state.data.composition.as_ref().filter(|s| !s.is_empty()) else {
            return "Composition snapshot unavailable.".to_string();
        };
        match self.charts.snapshots().latest_concentration(snapshot) {
            Some(summary) => self.tables.concentration_tables(&summary),
            None => "No positive weights in composition data.".to_string(),
        }
    }

    // ── plot ────────────────────────────────────────────────────────

    fn plot(&self, state: &mut TransactionState, args: &[&str]) -> CommandOutput {
        let Some(sub) = args.first() else {
            return CommandOutput::message(PLOT_HELP);
        };
        if state.zoomed {
            state.toggle_zoom();
        }

        let sub = sub.to_ascii_lowercase();
        let mut rest: Vec<&str> = args[1..].to_vec();
        let Some(mut target) = plot_target(&sub) else {
            return CommandOutput::message(format!(
                "Unknown plot subcommand: {sub}\nAvailable: {}",
                PLOT_SUBCOMMANDS.join(", ")
            ));
        };
        if target.has_absolute_view() && !target.is_absolute() {
            if let Some(first) = rest.first() {
                if matches!(first.to_ascii_lowercase().as_str(), "abs" | "absolute") {
                    target = target.with_absolute(true);
                    rest.remove(0);
                }
            }
        }

        let has_date_args = !rest.is_empty();
        self.apply_date_args(state, &rest);

        if state.active_chart == Some(target) && !has_date_args {
            state.set_active_chart(None);
            return CommandOutput::redraw(format!("Hidden {} chart.", target.hidden_label()));
        }

        state.set_active_chart(Some(target));
        state.set_show_table(false);
        let range = state.chart_date_range;
        let mut text = if target == ChartKind::Fx {
            format!(
                "Showing FX chart (base {}) for {range}.",
                state.selected_currency.to_ascii_uppercase()
            )
        } else {
            format!("Showing {} chart for {range}.", target.showing_label())
        };

        let explanation = match target {
            ChartKind::Performance => Some(TWRR_MESSAGE),
            ChartKind::Rolling => Some(ROLLING_EXPLANATION),
            ChartKind::Volatility => Some(VOLATILITY_EXPLANATION),
            ChartKind::Beta => Some(BETA_EXPLANATION),
            ChartKind::Yield => Some(YIELD_EXPLANATION),
            _ => None,
        };
        let summary = self.chart_summary(state);
        match explanation {
            Some(explanation) => {
                text.push_str("\n\n");
                text.push_str(explanation);
                if let Some(summary) = summary {
                    text.push_str("\n\n");
                    text.push_str(&summary);
                }
            }
            None => {
                if let Some(summary) = summary {
                    text.push_str(if target == ChartKind::Contribution { "\n\n" } else { "\n" });
                    text.push_str(&summary);
                }
            }
        }
        CommandOutput::redraw(text)
    }

    /// No tokens keep the current range, `all`/`reset`/`clear` drop it, and a
    /// range that does not parse leaves it as it was.
    fn apply_date_args(&self, state: &mut TransactionState, tokens: &[&str]) {
        match tokens {
            [] => {}
            [single] if matches!(single.to_ascii_lowercase().as_str(), "all" | "reset" | "clear") => {
                state.clear_chart_date_range();
            }
            _ => {
                if let Some(range) = self.parser.parse_words(state, tokens) {
                    state.set_chart_date_range(range);
                }
            }
        }
    }

    // ── abs / per ───────────────────────────────────────────────────

    fn switch_view(&self, state: &mut TransactionState, absolute: bool) -> CommandOutput {
        let Some(active) = state.active_chart.filter(|k| k.has_absolute_view()) else {
            return CommandOutput::message(VIEW_SWITCH_ERROR);
        };
        let family = active.hidden_label();
        if active.is_absolute() == absolute {
            let what = if absolute { "absolute values" } else { "percentages" };
            return CommandOutput::message(format!(
                "{} chart is already showing {what}.",
                capitalize(family)
            ));
        }
        state.set_active_chart(Some(active.with_absolute(absolute)));
        let mut text = format!(
            "Switched {family} chart to {} view.",
            if absolute { "absolute" } else { "percentage" }
        );
        if let Some(summary) = self.chart_summary(state) {
            text.push('\n');
            text.push_str(&summary);
        }
        CommandOutput::redraw(text)
    }

    // ── transaction ─────────────────────────────────────────────────

    fn transaction(&self, state: &mut TransactionState, args: &[&str]) -> CommandOutput {
        if state.zoomed {
            state.toggle_zoom();
        }

        let text = if args.is_empty() {
            let show = !state.show_table;
            state.set_show_table(show);
            "Toggled transaction table visibility.".to_string()
        } else {
            state.set_show_table(true);
            let trailing = args.join(" ");
            match self.parser.parse_words(state, args).filter(|r| !r.is_unbounded()) {
                Some(range) => self.apply_date_filter(state, range),
                None => {
                    state.set_transaction_filter(&trailing, parse_command_palette(&trailing));
                    let mut text = format!("Filtering transactions by: \"{trailing}\"");
                    if let Some(summary) = self.chart_summary(state) {
                        text.push('\n');
                        text.push_str(&summary);
                    }
                    text
                }
            }
        };

        let mut output = CommandOutput::redraw(text);
        if state.show_table {
            output.messages[0].push('\n');
            output.messages[0].push_str(&self.dynamic_stats(state));
            output.messages.push(
                self.tables
                    .transactions_table(&state.filtered_transactions, &CurrencyConverter::for_state(state)),
            );
        }
        output
    }

    /// Apply `range` to the active chart, else to the visible table.
    fn apply_date_filter(&self, state: &mut TransactionState, range: ChartDateRange) -> String {
        if let Some(active) = state.active_chart {
            state.set_chart_date_range(range);
            let mut text = format!("Applied date filter {range} to {} chart.", active.hidden_label());
            if let Some(summary) = self.chart_summary(state) {
                text.push('\n');
                text.push_str(&summary);
            }
            return text;
        }
        if !state.show_table {
            return "Transaction table is hidden. Use the \"transaction\" command to show it before applying date filters."
                .to_string();
        }
        state.set_chart_date_range(range);
        format!("Applied date filter {range} to transactions table.")
    }

    // ── Fallback input ──────────────────────────────────────────────

    fn default_command(&self, state: &mut TransactionState, input: &str) -> CommandOutput {
        if let Some(range) = self
            .parser
            .parse_simplified(state, input)
            .filter(|r| !r.is_unbounded())
        {
            let mut text = self.apply_date_filter(state, range);
            if state.show_table {
                text.push('\n');
                text.push_str(&self.dynamic_stats(state));
            }
            return CommandOutput::redraw(text);
        }

        state.set_transaction_filter(input, parse_command_palette(input));
        debug!(filter = ?state.active_filter, "applied transaction filter");
        let context = if state.show_table {
            Some(self.dynamic_stats(state))
        } else {
            self.chart_summary(state)
        };
        CommandOutput::redraw(context.unwrap_or_else(|| format!("Filtering transactions by: \"{input}\"")))
    }

    /// Stats when the table is visible, else the active chart summary.
    fn append_context(&self, state: &TransactionState, text: &mut String) {
        let context = if state.show_table {
            Some(self.dynamic_stats(state))
        } else {
            self.chart_summary(state)
        };
        if let Some(context) = context {
            text.push('\n');
            text.push_str(&context);
        }
    }

    /// Drop ticker, security and asset-class criteria from the filter and
    /// keep everything else.
    fn clear_composition_filters(&self, state: &mut TransactionState) {
        let kept: Vec<&str> = state
            .active_filter_text
            .split_whitespace()
            .filter(|token| {
                let parsed = parse_command_palette(token);
                parsed.tickers.is_empty() && parsed.security.is_none() && parsed.asset_class.is_none()
            })
            .collect();
        let text = kept.join(" ");
        state.set_transaction_filter(&text, parse_command_palette(&text));
        state.clear_composition_tickers();
    }

    // ── Chart summaries ─────────────────────────────────────────────

    /// One text block describing the active chart over the current range.
    #[must_use]
    pub fn chart_summary(&self, state: &TransactionState) -> Option<String> {
        let kind = state.active_chart?;
        match kind {
            ChartKind::Contribution => self.contribution_summary(state),
            ChartKind::Performance => self.performance_line(state),
            ChartKind::Drawdown | ChartKind::DrawdownAbs => self.drawdown_line(state, kind),
            ChartKind::Composition | ChartKind::CompositionAbs => self.allocation_line(
                state,
                state.data.composition.as_ref()?,
                if kind.is_absolute() { "Composition Abs" } else { "Composition" },
                &state.composition_tickers,
            ),
            ChartKind::Sectors | ChartKind::SectorsAbs => self.allocation_line(
                state,
                state.data.sectors.as_ref()?,
                if kind.is_absolute() { "Sectors Abs" } else { "Sectors" },
                &[],
            ),
            ChartKind::Geography | ChartKind::GeographyAbs => self.allocation_line(
                state,
                state.data.geography.as_ref()?,
                if kind.is_absolute() { "Geography Abs" } else { "Geography" },
                &[],
            ),
            ChartKind::Fx => self.fx_line(state),
            ChartKind::Concentration => self.concentration_line(state),
            ChartKind::Pe => self.pe_line(state),
            ChartKind::Rolling => latest_line("1-Year Rolling Return", &self.charts.series_for(state, kind), percent_inline),
            ChartKind::Volatility => latest_line("Volatility (annualized)", &self.charts.series_for(state, kind), |v| {
                format!("{v:.2}%")
            }),
            ChartKind::Beta => latest_line("Beta", &self.charts.series_for(state, kind), |v| format!("{v:.2}")),
            ChartKind::Yield => Some(
                self.charts
                    .snapshots()
                    .yield_snapshot(&state.data.yields, state.chart_date_range)
                    .to_string(),
            ),
        }
    }

    fn contribution_summary(&self, state: &TransactionState) -> Option<String> {
        let series = self.charts.series_for(state, ChartKind::Contribution);
        let range = state.chart_date_range;
        let money = CurrencyConverter::for_state(state);
        let currency = money.currency();
        let analytics = self.charts.analytics();
        let contribution = series
            .get(CONTRIBUTION_KEY)
            .and_then(|points| analytics.summarize_series(points, range));
        let balance = series
            .get(BALANCE_KEY)
            .and_then(|points| analytics.summarize_series(points, range));
        if contribution.is_none() && balance.is_none() {
            return None;
        }

        let mut lines = vec!["Contribution & Balance Summary".to_string()];
        for (label, summary) in [("Contribution", &contribution), ("Balance", &balance)] {
            if let Some(s) = summary {
                lines.push(format!(
                    "  {label}: {} → {} ({}{}) [{} → {}]",
                    format_currency(s.start_value, currency),
                    format_currency(s.end_value, currency),
                    if s.net_change >= 0.0 { "+" } else { "" },
                    format_currency(s.net_change, currency),
                    s.start_date,
                    s.end_date,
                ));
            }
        }
        if let (Some(c), Some(b)) = (&contribution, &balance) {
            let appreciation = b.end_value - c.end_value;
            let mut line = format!("  Appreciation: {}", format_currency(appreciation, currency));
            if c.end_value.abs() > f64::EPSILON {
                line.push_str(&format!(" ({})", percent_inline(appreciation / c.end_value * 100.0)));
            }
            lines.push(line);
        }
        Some(lines.join("\n"))
    }

    /// Change of every performance series over the range, four per line.
    fn performance_line(&self, state: &TransactionState) -> Option<String> {
        let performance = &state.data.performance;
        if performance.is_empty() {
            return None;
        }
        let entries: Vec<String> = ordered_keys(performance)
            .into_iter()
            .map(|key| {
                let points = ChartService::filter_to_range(&performance[&key], state.chart_date_range);
                let change = match (points.first(), points.last()) {
                    (Some(first), Some(last))
                        if first.value.is_finite() && first.value.abs() >= 1e-9 && last.value.is_finite() =>
                    {
                        Some((last.value / first.value - 1.0) * 100.0)
                    }
                    _ => None,
                };
                match change {
                    Some(change) => format!("{key} {}", percent_inline(change)),
                    None => format!("{key} –"),
                }
            })
            .collect();
        Some(format!(
            "Performance (base {}):\n{}",
            state.selected_currency,
            chunk_lines(&entries, 4)
        ))
    }

    fn drawdown_line(&self, state: &TransactionState, kind: ChartKind) -> Option<String> {
        let series = self.charts.series_for(state, kind);
        if kind.is_absolute() {
            let points = series.get(BALANCE_KEY)?;
            let current = points.last()?.value;
            let worst = points.iter().map(|p| p.value).fold(0.0, f64::min);
            let money = CurrencyConverter::for_state(state);
            let currency = money.currency();
            return Some(format!(
                "Drawdown (absolute): current {} | max {}",
                format_currency(current, currency),
                format_currency(worst, currency)
            ));
        }
        let entries: Vec<String> = ordered_keys(&series)
            .into_iter()
            .filter_map(|key| {
                let points = &series[&key];
                let current = points.last()?.value;
                let worst = points.iter().map(|p| p.value).fold(0.0, f64::min);
                Some(format!("{key} {} (max {})", percent_inline(current), percent_inline(worst)))
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        Some(format!("Drawdown:\n{}", chunk_lines(&entries, 3)))
    }

    /// Latest allocation in range, heaviest first, three holdings per line.
    /// With `focus` tickers, the rest collapse into `Others`.
    fn allocation_line(
        &self,
        state: &TransactionState,
        snapshot: &CompositionSnapshot,
        label: &str,
        focus: &[String],
    ) -> Option<String> {
        if snapshot.dates.is_empty() {
            return None;
        }
        let range = state.chart_date_range;
        let idx = snapshot
            .dates
            .iter()
            .rposition(|d| range.contains(*d))
            .unwrap_or(snapshot.dates.len() - 1);
        let total = snapshot.total_values.get(idx).copied().flatten().unwrap_or(0.0);

        let mut holdings: Vec<(String, f64)> = snapshot
            .composition
            .keys()
            .filter_map(|ticker| {
                snapshot
                    .weight_at(ticker, idx)
                    .filter(|w| *w > 0.0)
                    .map(|w| (ticker.clone(), w))
            })
            .collect();
        if holdings.is_empty() {
            return None;
        }
        holdings.sort_by(|a, b| b.1.total_cmp(&a.1));

        if !focus.is_empty() {
            let (mut selected, rest): (Vec<_>, Vec<_>) = holdings
                .into_iter()
                .partition(|(t, _)| focus.iter().any(|f| f.eq_ignore_ascii_case(t)));
            if !selected.is_empty() && !rest.is_empty() {
                selected.push(("Others".to_string(), rest.iter().map(|(_, w)| w).sum()));
            }
            holdings = if selected.is_empty() { rest } else { selected };
        }

        let money = CurrencyConverter::for_state(state);
        let date = snapshot.dates[idx];
        let entries: Vec<String> = holdings
            .iter()
            .filter(|(_, w)| *w > MIN_SUMMARY_WEIGHT)
            .map(|(ticker, weight)| {
                let name = if ticker == "BRKB" { "BRK-B" } else { ticker.as_str() };
                format!("{name} {} ({weight:.2}%)", money.format(total * weight / 100.0, date))
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        let hint = match label {
            "Composition" => "\n(Hint: use 'abs' for absolute values)",
            "Composition Abs" => "\n(Hint: use 'per' for percentages)",
            _ => "",
        };
        Some(format!(
            "{label} ({date}):\n{}{hint}",
            chunk_lines(&entries, 3)
        ))
    }

    /// Latest cross rate of each visible currency against the selected base.
    fn fx_line(&self, state: &TransactionState) -> Option<String> {
        let fx = state.data.fx.as_ref()?;
        let base = state.selected_currency.to_ascii_uppercase();
        let series = self.charts.series_for(state, ChartKind::Fx);
        let snapshots = self.charts.snapshots();
        let entries: Vec<String> = series
            .iter()
            .filter_map(|(currency, points)| {
                let date = points.last()?.date;
                let rate = snapshots.cross_rate(fx, &base, currency, date)?;
                Some(format!("{base}/{currency} {}", fx_inline(rate)))
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        Some(format!("FX ({base} base): {}", entries.join("   ")))
    }

    fn concentration_line(&self, state: &TransactionState) -> Option<String> {
        let snapshot = state.data.composition.as_ref()?;
        let points = self
            .charts
            .snapshots()
            .concentration_series(snapshot, state.chart_date_range);
        let last = points.last()?;
        Some(format!(
            "HHI: {:.3} | Effective holdings: {:.2} | As of {}",
            last.hhi, last.effective_holdings, last.date
        ))
    }

    fn pe_line(&self, state: &TransactionState) -> Option<String> {
        let snapshot = state.data.pe.as_ref()?;
        let points = self.charts.snapshots().pe_series(snapshot, state.chart_date_range);
        let Some(last) = points.last() else {
            return Some("No PE data in range".to_string());
        };
        let (min, max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.pe), hi.max(p.pe)));
        let mut text = format!(
            "Current: {:.2}x | Range: {min:.2}x - {max:.2}x | Harmonic Mean (1 / Σ(w/PE))",
            last.pe
        );

        let mut components: Vec<(&String, f64)> = last.ticker_pes.iter().map(|(t, pe)| (t, *pe)).collect();
        components.sort_by(|a, b| {
            let wa = last.ticker_weights.get(a.0).copied().unwrap_or(0.0);
            let wb = last.ticker_weights.get(b.0).copied().unwrap_or(0.0);
            wb.total_cmp(&wa)
        });
        if !components.is_empty() {
            let breakdown: Vec<String> = components
                .iter()
                .take(8)
                .map(|(t, pe)| format!("{t}:{pe:.0}"))
                .collect();
            text.push_str("\nComponents: ");
            text.push_str(&breakdown.join(" "));
        }
        Some(text)
    }
}

impl Default for TerminalService {
    fn default() -> Self {
        Self::new(DateRangeParser::default(), ChartService::default())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Chart kind named by a `plot` subcommand.
fn plot_target(sub: &str) -> Option<ChartKind> {
    let kind = match sub {
        "balance" | "contribution" => ChartKind::Contribution,
        "performance" => ChartKind::Performance,
        "composition" => ChartKind::Composition,
        "composition-abs" | "compositionabs" | "compositionabsolute" => ChartKind::CompositionAbs,
        "sectors" => ChartKind::Sectors,
        "sectors-abs" | "sectorsabs" | "sectorsabsolute" => ChartKind::SectorsAbs,
        "geography" => ChartKind::Geography,
        "geography-abs" | "geographyabs" | "geographyabsolute" => ChartKind::GeographyAbs,
        "fx" => ChartKind::Fx,
        "drawdown" => ChartKind::Drawdown,
        "drawdown-abs" | "drawdownabs" | "drawdownabsolute" => ChartKind::DrawdownAbs,
        "concentration" => ChartKind::Concentration,
        "pe" => ChartKind::Pe,
        "rolling" => ChartKind::Rolling,
        "volatility" => ChartKind::Volatility,
        "beta" => ChartKind::Beta,
        "yield" => ChartKind::Yield,
        _ => return None,
    };
    Some(kind)
}

/// `+1.23%`, `−1.23%` (U+2212) or `0%` for non-finite input.
#[must_use]
pub fn percent_inline(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    let sign = if value > 0.0 {
        "+"
    } else if value < 0.0 {
        "−"
    } else {
        ""
    };
    format!("{sign}{:.2}%", value.abs())
}

/// Significant digits shrink as the rate grows.
fn fx_inline(value: f64) -> String {
    if !value.is_finite() {
        return "–".to_string();
    }
    match value.abs() {
        v if v >= 100.0 => format!("{value:.1}"),
        v if v >= 10.0 => format!("{value:.2}"),
        v if v >= 1.0 => format!("{value:.3}"),
        _ => format!("{value:.4}"),
    }
}

fn chunk_lines(entries: &[String], per_line: usize) -> String {
    entries
        .chunks(per_line)
        .map(|chunk| chunk.join("   "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `Label: KEY v   KEY v` from the last point of each series.
fn latest_line(label: &str, series: &SeriesMap, format: impl Fn(f64) -> String) -> Option<String> {
    let entries: Vec<String> = ordered_keys(series)
        .into_iter()
        .filter_map(|key| {
            let last: &TimeSeriesPoint = series[&key].last()?;
            Some(format!("{key} {}", format(last.value)))
        })
        .collect();
    if entries.is_empty() {
        return None;
    }
    Some(format!("{label}: {}", entries.join("   ")))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
