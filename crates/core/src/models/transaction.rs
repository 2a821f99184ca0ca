use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tickers treated as exchange-traded funds by the `etf` / `asset:etf` filter.
pub const ETF_TICKERS: [&str; 12] = [
    "VT", "VTI", "VOO", "VXUS", "VEA", "VWO", "QQQ", "SPY", "IVV", "SCHD", "BND", "GLD",
];

/// Clean a free-text token into a ticker symbol: keep alphanumerics and `-`,
/// uppercase, require at least one letter, and fold known aliases.
#[must_use]
pub fn normalize_ticker_token(token: &str) -> Option<String> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_uppercase();
    if !cleaned.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    match cleaned.as_str() {
        "BRK" | "BRK-B" | "BRKB" => Some("BRKB".to_string()),
        _ => Some(cleaned),
    }
}

/// Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    /// Parse case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Some(OrderType::Buy),
            "sell" => Some(OrderType::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Buy => write!(f, "Buy"),
            OrderType::Sell => write!(f, "Sell"),
        }
    }
}

/// Coarse asset class used by table filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Etf,
    Stock,
}

impl AssetClass {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "etf" | "etfs" => Some(AssetClass::Etf),
            "stock" | "stocks" => Some(AssetClass::Stock),
            _ => None,
        }
    }

    /// Classify a security symbol.
    #[must_use]
    pub fn of(security: &str) -> Self {
        if ETF_TICKERS.contains(&security.to_ascii_uppercase().as_str()) {
            AssetClass::Etf
        } else {
            AssetClass::Stock
        }
    }
}

/// One trade row from `transactions.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Zero-based row index; stable sort key for same-day trades.
    pub id: usize,
    pub trade_date: NaiveDate,
    pub order_type: OrderType,
    pub security: String,
    pub quantity: f64,
    pub price: f64,
    /// `quantity * price`, negative for sells.
    pub net_amount: f64,
}

impl Transaction {
    pub fn new(
        id: usize,
        trade_date: NaiveDate,
        order_type: OrderType,
        security: impl Into<String>,
        quantity: f64,
        price: f64,
    ) -> Self {
        let sign = match order_type {
            OrderType::Buy => 1.0,
            OrderType::Sell => -1.0,
        };
        Self {
            id,
            trade_date,
            order_type,
            security: security.into().trim().to_uppercase(),
            quantity,
            price,
            net_amount: quantity * price * sign,
        }
    }

    #[must_use]
    pub fn asset_class(&self) -> AssetClass {
        AssetClass::of(&self.security)
    }
}

/// Parsed transaction-table filter (the command palette).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub order_type: Option<OrderType>,
    pub security: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub asset_class: Option<AssetClass>,
    /// Bare ticker tokens. Together with `security` these form one
    /// alternative set: a transaction matches if it hits any of them.
    pub tickers: Vec<String>,
    /// Remaining free text, matched as a case-insensitive substring.
    pub text: String,
}

impl TransactionFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_type.is_none()
            && self.security.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.asset_class.is_none()
            && self.tickers.is_empty()
            && self.text.is_empty()
    }

    /// Whether `tx` passes every active criterion, with `min:`/`max:`
    /// compared against the recorded net amount.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.matches_amount(tx, tx.net_amount.abs())
    }

    /// Like [`matches`](Self::matches), with `min:`/`max:` compared against
    /// `amount`, the trade's absolute net amount in the display currency.
    #[must_use]
    pub fn matches_amount(&self, tx: &Transaction, amount: f64) -> bool {
        if let Some(ot) = self.order_type {
            if tx.order_type != ot {
                return false;
            }
        }
        if self.security.is_some() || !self.tickers.is_empty() {
            let ticker = normalize_ticker_token(&tx.security).unwrap_or_default();
            let by_security = self.security.as_deref().is_some_and(|s| {
                s == tx.security || normalize_ticker_token(s).as_deref() == Some(ticker.as_str())
            });
            if !by_security && !self.tickers.contains(&ticker) {
                return false;
            }
        }
        if self.min_amount.is_some_and(|min| amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| amount > max) {
            return false;
        }
        if let Some(class) = self.asset_class {
            if tx.asset_class() != class {
                return false;
            }
        }
        if !self.text.is_empty() {
            let needle = self.text.to_lowercase();
            let haystacks = [
                tx.security.to_lowercase(),
                tx.order_type.to_string().to_lowercase(),
                tx.trade_date.to_string(),
            ];
            if !haystacks.iter().any(|h| h.contains(&needle)) {
                return false;
            }
        }
        true
    }
}
