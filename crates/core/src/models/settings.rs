use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage key for the display currency preference.
pub const SELECTED_CURRENCY_KEY: &str = "fund.selectedCurrency";

/// Currencies the pre-converted balance series are published in.
pub const SUPPORTED_CURRENCIES: [&str; 4] = ["USD", "CNY", "JPY", "KRW"];

/// User preferences persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Display currency (e.g., "USD", "JPY").
    #[serde(rename = "fund.selectedCurrency", default = "default_currency")]
    pub selected_currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_currency: default_currency(),
        }
    }
}

impl Preferences {
    /// Normalize a currency code; unknown or blank codes fall back to USD.
    #[must_use]
    pub fn normalize_currency(code: &str) -> String {
        let upper = code.trim().to_ascii_uppercase();
        if SUPPORTED_CURRENCIES.contains(&upper.as_str()) {
            upper
        } else {
            default_currency()
        }
    }
}

/// Runtime configuration for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Directory holding the data files (`transactions.csv`, `output/...`).
    pub data_dir: Option<PathBuf>,

    /// Base URL to fetch the same files over HTTP. Tried after `data_dir`.
    pub base_url: Option<String>,

    /// Animation loops on/off (reduced-motion).
    pub animations_enabled: bool,

    /// Rolling beta window in daily returns.
    pub beta_window: usize,

    /// Rolling volatility window in daily returns.
    pub volatility_window: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_url: None,
            animations_enabled: true,
            beta_window: 126,
            volatility_window: 90,
        }
    }
}
