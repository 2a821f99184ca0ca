use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDate;

use crate::models::snapshot::SplitEvent;
use crate::models::transaction::{normalize_ticker_token, AssetClass, OrderType, Transaction, TransactionFilter};
use crate::services::currency_service::CurrencyConverter;
use crate::services::snapshot_service::ConcentrationSummary;

/// Lots smaller than this are treated as closed.
const SHARE_EPSILON: f64 = 1e-8;

/// Column alignment in an ASCII table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}

/// Render rows as a bordered ASCII table:
///
/// ```text
/// +-----+-----+
/// |   TITLE   |
/// +-----+-----+
/// | Hdr | Hdr |
/// +=====+=====+
/// | a   |   1 |
/// +-----+-----+
/// ```
#[must_use]
pub fn render_ascii_table(
    title: Option<&str>,
    headers: &[&str],
    rows: &[Vec<String>],
    alignments: &[Alignment],
) -> String {
    let columns = if headers.is_empty() {
        rows.first().map_or(0, Vec::len)
    } else {
        headers.len()
    };
    if columns == 0 {
        return title.unwrap_or_default().to_string();
    }

    let mut widths = vec![0usize; columns];
    for (i, header) in headers.iter().enumerate() {
        widths[i] = widths[i].max(header.chars().count());
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let total_width: usize = widths.iter().map(|w| w + 2).sum::<usize>() + columns + 1;

    let border = |fill: char| -> String {
        let segments: Vec<String> = widths.iter().map(|w| fill.to_string().repeat(w + 2)).collect();
        format!("+{}+", segments.join("+"))
    };
    let format_row = |cells: &[String]| -> String {
        let formatted: Vec<String> = (0..columns)
            .map(|i| {
                let text = cells.get(i).map(String::as_str).unwrap_or("");
                let align = alignments.get(i).copied().unwrap_or_default();
                format!(" {} ", pad(text, widths[i], align))
            })
            .collect();
        format!("|{}|", formatted.join("|"))
    };

    let mut lines = vec![border('-')];
    if let Some(title) = title {
        lines.push(format!("|{}|", pad(title, total_width - 2, Alignment::Center)));
        lines.push(border('-'));
    }
    if !headers.is_empty() {
        let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        lines.push(format_row(&header_cells));
        lines.push(border('='));
    }
    for row in rows {
        lines.push(format_row(row));
    }
    lines.push(border('-'));
    lines.join("\n")
}

fn pad(text: &str, width: usize, align: Alignment) -> String {
    let len = text.chars().count();
    let gap = width.saturating_sub(len);
    match align {
        Alignment::Left => format!("{text}{}", " ".repeat(gap)),
        Alignment::Right => format!("{}{text}", " ".repeat(gap)),
        Alignment::Center => {
            let left = gap / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
        }
    }
}

/// Parse command-palette text into a [`TransactionFilter`].
///
/// `type:buy|sell`, `security:X` / `s:X`, `min:N`, `max:N`,
/// `asset:etf|stock` / `class:...`, bare `etf` / `stock`, bare tickers.
/// Anything else is kept as free text.
#[must_use]
pub fn parse_command_palette(input: &str) -> TransactionFilter {
    let mut filter = TransactionFilter::default();
    let mut text_tokens: Vec<&str> = Vec::new();

    for token in input.split_whitespace() {
        let (key, value) = match token.split_once(':') {
            Some((key, value)) if !value.is_empty() => (key, value),
            _ => {
                let bare = token.trim_end_matches(':');
                let class = match bare.to_ascii_lowercase().as_str() {
                    "etf" => Some(AssetClass::Etf),
                    "stock" => Some(AssetClass::Stock),
                    _ => None,
                };
                if class.is_some() {
                    filter.asset_class = class;
                } else if let Some(ticker) = normalize_ticker_token(bare) {
                    filter.tickers.push(ticker);
                } else {
                    text_tokens.push(token);
                }
                continue;
            }
        };
        match key.to_ascii_lowercase().as_str() {
            "type" => filter.order_type = OrderType::parse(value),
            "security" | "s" => filter.security = Some(value.to_uppercase()),
            "min" => filter.min_amount = value.parse::<f64>().ok().filter(|v| v.is_finite()),
            "max" => filter.max_amount = value.parse::<f64>().ok().filter(|v| v.is_finite()),
            "asset" | "class" => filter.asset_class = AssetClass::parse(value),
            _ => match normalize_ticker_token(token) {
                Some(ticker) => filter.tickers.push(ticker),
                None => text_tokens.push(token),
            },
        }
    }
    filter.text = text_tokens.join(" ");
    filter
}

/// Format an amount with the currency's symbol and thousands separators.
/// Yen and won carry no minor unit.
#[must_use]
pub fn format_currency(value: f64, currency: &str) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let (symbol, decimals) = match currency.to_ascii_uppercase().as_str() {
        "CNY" => ("¥", 2),
        "JPY" => ("¥", 0),
        "KRW" => ("₩", 0),
        _ => ("$", 2),
    };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{}", group_thousands(value.abs(), decimals))
}

/// `1234567.891` → `"1,234,567.89"` at `decimals` places.
#[must_use]
pub fn group_thousands(value: f64, decimals: usize) -> String {
    if value < 0.0 {
        return format!("-{}", group_thousands(-value, decimals));
    }
    let fixed = format!("{value:.decimals$}");
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

/// Net position in one security after replaying its trades.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub security: String,
    /// Split-adjusted share count.
    pub shares: f64,
    /// Cost per share of the lots still open.
    pub average_price: f64,
    pub total_cost: f64,
}

/// Totals over a set of trades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionTotals {
    pub count: usize,
    pub buy_orders: usize,
    pub sell_orders: usize,
    pub total_buy: f64,
    pub total_sell: f64,
    /// Sale proceeds above the cost of the lots they closed, first in first out.
    pub realized_gain: f64,
}

impl TransactionTotals {
    #[must_use]
    pub fn net_contributions(&self) -> f64 {
        self.total_buy - self.total_sell
    }
}

/// Open purchase lot in split-adjusted units.
#[derive(Debug, Clone, Copy)]
struct Lot {
    shares: f64,
    price: f64,
}

/// Product of the multipliers of every `security` split after `date`.
/// A trade on or after a split date is already in post-split units.
#[must_use]
pub fn split_adjustment(splits: &[SplitEvent], security: &str, date: NaiveDate) -> f64 {
    splits
        .iter()
        .filter(|s| s.split_date > date && s.symbol.eq_ignore_ascii_case(security))
        .map(|s| s.split_multiplier)
        .filter(|m| m.is_finite() && *m > 0.0)
        .product()
}

/// Builds the text tables printed by `stats` and `transaction`.
///
/// Amounts are recorded in USD; the tables convert each trade on its trade
/// date through the given [`CurrencyConverter`] before aggregating.
pub struct TableService;

impl TableService {
    pub fn new() -> Self {
        Self
    }

    // ── Aggregation ─────────────────────────────────────────────────

    #[must_use]
    pub fn totals(&self, transactions: &[Transaction], splits: &[SplitEvent]) -> TransactionTotals {
        let mut totals = TransactionTotals {
            count: transactions.len(),
            ..TransactionTotals::default()
        };
        for tx in transactions {
            match tx.order_type {
                OrderType::Buy => {
                    totals.buy_orders += 1;
                    totals.total_buy += tx.net_amount.abs();
                }
                OrderType::Sell => {
                    totals.sell_orders += 1;
                    totals.total_sell += tx.net_amount.abs();
                }
            }
        }
        totals.realized_gain = self.replay(transactions, splits).1;
        totals
    }

    /// Open positions from FIFO lots, sorted by security.
    #[must_use]
    pub fn holdings(&self, transactions: &[Transaction], splits: &[SplitEvent]) -> Vec<Holding> {
        self.replay(transactions, splits).0
    }

    /// Replays trades in date order against per-security FIFO lots.
    /// Returns open positions and realized gain.
    fn replay(&self, transactions: &[Transaction], splits: &[SplitEvent]) -> (Vec<Holding>, f64) {
        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by_key(|tx| (tx.trade_date, tx.id));

        let mut books: BTreeMap<String, VecDeque<Lot>> = BTreeMap::new();
        let mut realized = 0.0;
        for tx in ordered {
            if !tx.quantity.is_finite() || !tx.price.is_finite() || tx.quantity <= 0.0 {
                continue;
            }
            let adjustment = split_adjustment(splits, &tx.security, tx.trade_date);
            let lots = books.entry(tx.security.clone()).or_default();
            match tx.order_type {
                OrderType::Buy => lots.push_back(Lot {
                    shares: tx.quantity * adjustment,
                    price: tx.price / adjustment,
                }),
                OrderType::Sell => {
                    let mut remaining = tx.quantity * adjustment;
                    let mut cost = 0.0;
                    while remaining > 0.0 {
                        let Some(lot) = lots.front_mut() else {
                            break;
                        };
                        let taken = remaining.min(lot.shares);
                        cost += taken * lot.price;
                        lot.shares -= taken;
                        remaining -= taken;
                        if lot.shares < SHARE_EPSILON {
                            lots.pop_front();
                        }
                    }
                    realized += tx.quantity * tx.price - cost;
                }
            }
        }

        let holdings = books
            .into_iter()
            .filter_map(|(security, lots)| {
                let shares: f64 = lots.iter().map(|l| l.shares).sum();
                if shares <= SHARE_EPSILON {
                    return None;
                }
                let total_cost: f64 = lots.iter().map(|l| l.shares * l.price).sum();
                Some(Holding {
                    security,
                    shares,
                    average_price: total_cost / shares,
                    total_cost,
                })
            })
            .collect();
        (holdings, realized)
    }

    // ── Tables ──────────────────────────────────────────────────────

    /// `TRANSACTION STATS` over every loaded trade.
    #[must_use]
    pub fn transaction_stats_table(
        &self,
        transactions: &[Transaction],
        splits: &[SplitEvent],
        money: &CurrencyConverter<'_>,
    ) -> String {
        let totals = self.totals(&money.localize_all(transactions), splits);
        let rows = vec![
            row("Total Transactions", group_thousands(totals.count as f64, 0)),
            row("Buy Orders", group_thousands(totals.buy_orders as f64, 0)),
            row("Sell Orders", group_thousands(totals.sell_orders as f64, 0)),
            row("Total Buy Amount", money.format_converted(totals.total_buy)),
            row("Total Sell Amount", money.format_converted(totals.total_sell)),
            row("Net Contributions", money.format_converted(totals.net_contributions())),
            row("Realized Gain", money.format_converted(totals.realized_gain)),
        ];
        render_ascii_table(
            Some("TRANSACTION STATS"),
            &["Metric", "Value"],
            &rows,
            &[Alignment::Left, Alignment::Right],
        )
    }

    /// `FILTERED STATS` over the rows left by the active filter.
    #[must_use]
    pub fn filtered_stats_table(
        &self,
        transactions: &[Transaction],
        splits: &[SplitEvent],
        money: &CurrencyConverter<'_>,
    ) -> String {
        let totals = self.totals(&money.localize_all(transactions), splits);
        let rows = vec![
            row("Transactions", group_thousands(totals.count as f64, 0)),
            row("Total Buy", money.format_converted(totals.total_buy)),
            row("Total Sell", money.format_converted(totals.total_sell)),
            row("Net Invested", money.format_converted(totals.net_contributions())),
        ];
        render_ascii_table(
            Some("FILTERED STATS"),
            &[],
            &rows,
            &[Alignment::Left, Alignment::Right],
        )
    }

    /// Open positions with cost in the display currency at each lot's trade date.
    #[must_use]
    pub fn holdings_table(
        &self,
        transactions: &[Transaction],
        splits: &[SplitEvent],
        money: &CurrencyConverter<'_>,
    ) -> String {
        let holdings = self.holdings(&money.localize_all(transactions), splits);
        if holdings.is_empty() {
            return "No current holdings.".to_string();
        }
        let rows: Vec<Vec<String>> = holdings
            .iter()
            .map(|h| {
                vec![
                    h.security.clone(),
                    group_thousands(h.shares, 2),
                    money.format_converted(h.average_price),
                    money.format_converted(h.total_cost),
                ]
            })
            .collect();
        render_ascii_table(
            Some("HOLDINGS"),
            &["Security", "Shares", "Avg Price", "Total Cost"],
            &rows,
            &[Alignment::Left, Alignment::Right, Alignment::Right, Alignment::Right],
        )
    }

    /// `PORTFOLIO CONCENTRATION` summary plus the top-10 weight table.
    #[must_use]
    pub fn concentration_tables(&self, summary: &ConcentrationSummary) -> String {
        let top = summary
            .holdings
            .first()
            .map_or_else(|| "N/A".to_string(), |h| format!("{} · {:.2}%", h.ticker, h.weight));
        let rows = vec![
            row("Snapshot Date", summary.date.to_string()),
            row("Equivalent Holdings", format!("{:.2}", summary.effective_holdings)),
            row("HHI (0-1)", format!("{:.3}", summary.hhi)),
            row("Top Holding", top),
            row("Top 3 Weight", format!("{:.2}%", summary.top_weight(3))),
            row("Top 5 Weight", format!("{:.2}%", summary.top_weight(5))),
        ];
        let summary_table = render_ascii_table(
            Some("PORTFOLIO CONCENTRATION"),
            &[],
            &rows,
            &[Alignment::Left, Alignment::Right],
        );

        let detail: Vec<Vec<String>> = summary
            .holdings
            .iter()
            .take(10)
            .map(|h| {
                let share = h.weight / 100.0;
                vec![
                    h.ticker.clone(),
                    format!("{:.2}%", h.weight),
                    format!("{:.2}", share * share * 100.0),
                ]
            })
            .collect();
        let detail_table = render_ascii_table(
            Some("HHI CONTRIBUTION (TOP 10)"),
            &["Ticker", "Weight", "w² (pts)"],
            &detail,
            &[Alignment::Left, Alignment::Right, Alignment::Right],
        );
        format!("{summary_table}\n\n{detail_table}")
    }

    /// The transaction table shown by `transaction`, newest first.
    #[must_use]
    pub fn transactions_table(&self, transactions: &[Transaction], money: &CurrencyConverter<'_>) -> String {
        if transactions.is_empty() {
            return "No transactions match the current filter.".to_string();
        }
        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by(|a, b| b.trade_date.cmp(&a.trade_date).then(b.id.cmp(&a.id)));
        let rows: Vec<Vec<String>> = ordered
            .into_iter()
            .map(|tx| {
                vec![
                    tx.trade_date.to_string(),
                    tx.order_type.to_string(),
                    tx.security.clone(),
                    group_thousands(tx.quantity, 4),
                    money.format(tx.price, tx.trade_date),
                    money.format(tx.net_amount, tx.trade_date),
                ]
            })
            .collect();
        render_ascii_table(
            Some("TRANSACTIONS"),
            &["Date", "Type", "Security", "Quantity", "Price", "Net Amount"],
            &rows,
            &[
                Alignment::Left,
                Alignment::Center,
                Alignment::Left,
                Alignment::Right,
                Alignment::Right,
                Alignment::Right,
            ],
        )
    }
}

impl Default for TableService {
    fn default() -> Self {
        Self::new()
    }
}

fn row(label: &str, value: String) -> Vec<String> {
    vec![label.to_string(), value]
}
