use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::series::{normalize_series_key, SeriesMap, TimeSeriesPoint};
use crate::models::snapshot::{
    CompositionSnapshot, ContributionEntry, FxRates, PeSnapshot, SplitEvent, YieldEntry,
};
use crate::models::state::ChartData;
use crate::models::transaction::{OrderType, Transaction};
use crate::providers::registry::DataProviderRegistry;

// ── Data file paths (relative to the data root) ────────────────────

pub const TRANSACTIONS_PATH: &str = "transactions.csv";
pub const SPLIT_HISTORY_PATH: &str = "split_history.csv";
pub const BALANCE_PATH: &str = "output/balance_series.json";
pub const CONTRIBUTION_PATH: &str = "output/contribution_series.json";
pub const PERFORMANCE_PATH: &str = "output/performance_series.json";
pub const COMPOSITION_PATH: &str = "output/figures/composition.json";
pub const SECTORS_PATH: &str = "output/figures/sectors.json";
pub const GEOGRAPHY_PATH: &str = "output/figures/geography.json";
pub const PE_PATH: &str = "output/figures/pe_ratio.json";
pub const YIELD_PATH: &str = "yield_data.json";
pub const FX_PATH: &str = "output/fx_daily_rates.json";

/// Currency assumed for series files published without a currency map.
const DEFAULT_SERIES_CURRENCY: &str = "USD";

/// Everything read from the data root in one pass.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub transactions: Vec<Transaction>,
    pub chart_data: ChartData,
}

// ── Raw file shapes ─────────────────────────────────────────────────

/// Series files come either as one array (USD) or keyed by currency.
#[derive(Deserialize)]
#[serde(untagged)]
enum PerCurrency<T> {
    Single(Vec<T>),
    ByCurrency(BTreeMap<String, Vec<T>>),
}

impl<T> PerCurrency<T> {
    fn into_map(self) -> BTreeMap<String, Vec<T>> {
        match self {
            PerCurrency::Single(entries) => BTreeMap::from([(DEFAULT_SERIES_CURRENCY.to_string(), entries)]),
            PerCurrency::ByCurrency(map) => map
                .into_iter()
                .map(|(ccy, entries)| (ccy.trim().to_ascii_uppercase(), entries))
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContribution {
    #[serde(default)]
    trade_date: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    order_type: Option<String>,
    #[serde(default)]
    net_amount: Option<f64>,
}

/// Loads the dashboard's data files through a provider registry.
///
/// A missing or malformed file is logged and leaves its part of the data
/// empty; loading itself never fails.
pub struct DataLoader;

impl DataLoader {
    pub async fn load_all(registry: &DataProviderRegistry) -> LoadedData {
        let (transactions, splits, balance, contribution, performance) = tokio::join!(
            Self::load_transactions(registry),
            Self::load_split_history(registry),
            load_optional::<PerCurrency<RawPoint>>(registry, BALANCE_PATH),
            load_optional::<PerCurrency<RawContribution>>(registry, CONTRIBUTION_PATH),
            load_optional::<BTreeMap<String, Vec<RawPoint>>>(registry, PERFORMANCE_PATH),
        );
        let (composition, sectors, geography, pe, yields, fx) = tokio::join!(
            load_optional::<CompositionSnapshot>(registry, COMPOSITION_PATH),
            load_optional::<CompositionSnapshot>(registry, SECTORS_PATH),
            load_optional::<CompositionSnapshot>(registry, GEOGRAPHY_PATH),
            load_optional::<PeSnapshot>(registry, PE_PATH),
            load_optional::<Vec<YieldEntry>>(registry, YIELD_PATH),
            load_optional::<FxRates>(registry, FX_PATH),
        );

        let chart_data = ChartData {
            balance: balance.map(|raw| normalize_balance(raw.into_map())).unwrap_or_default(),
            contribution: contribution
                .map(|raw| normalize_contribution(raw.into_map()))
                .unwrap_or_default(),
            performance: performance.map(normalize_performance).unwrap_or_default(),
            composition: composition.filter(|s| !s.is_empty()),
            sectors: sectors.filter(|s| !s.is_empty()),
            geography: geography.filter(|s| !s.is_empty()),
            pe: pe.filter(|s| !s.dates.is_empty()),
            yields: yields.unwrap_or_default(),
            fx,
            splits,
        };
        info!(
            transactions = transactions.len(),
            splits = chart_data.splits.len(),
            balance_currencies = chart_data.balance.len(),
            performance_keys = chart_data.performance.len(),
            "data loaded"
        );
        LoadedData {
            transactions,
            chart_data,
        }
    }

    async fn load_transactions(registry: &DataProviderRegistry) -> Vec<Transaction> {
        match registry.fetch_text(TRANSACTIONS_PATH).await {
            Ok(text) => Self::parse_transactions_csv(&text).unwrap_or_else(|e| {
                warn!(error = %e, "transactions.csv could not be parsed");
                Vec::new()
            }),
            Err(e) => {
                warn!(error = %e, "transactions.csv unavailable");
                Vec::new()
            }
        }
    }

    async fn load_split_history(registry: &DataProviderRegistry) -> Vec<SplitEvent> {
        match registry.fetch_text(SPLIT_HISTORY_PATH).await {
            Ok(text) => Self::parse_split_history_csv(&text).unwrap_or_else(|e| {
                warn!(error = %e, "split_history.csv could not be parsed");
                Vec::new()
            }),
            Err(e) => {
                warn!(error = %e, "split history unavailable; trades are not split-adjusted");
                Vec::new()
            }
        }
    }

    /// Parse `symbol,splitDate,splitRatio,splitMultiplier` rows.
    ///
    /// Rows with fewer than four columns or an unreadable date are skipped.
    /// An unparsable or non-positive multiplier counts as 1.
    pub fn parse_split_history_csv(text: &str) -> Result<Vec<SplitEvent>, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut splits = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < 4 {
                continue;
            }
            let Some(split_date) = parse_date(&record[1]) else {
                warn!(row = idx + 1, "skipping split row with unreadable date");
                continue;
            };
            let split_multiplier = record[3]
                .parse::<f64>()
                .ok()
                .filter(|m| m.is_finite() && *m > 0.0)
                .unwrap_or(1.0);
            splits.push(SplitEvent {
                symbol: record[0].to_uppercase(),
                split_date,
                split_ratio: record[2].to_string(),
                split_multiplier,
            });
        }
        Ok(splits)
    }

    /// Parse `tradeDate,orderType,security,quantity,price` rows.
    ///
    /// Rows with fewer than five columns, an unreadable date or an unknown
    /// order type are skipped. Unparsable quantities and prices count as 0.
    pub fn parse_transactions_csv(text: &str) -> Result<Vec<Transaction>, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut transactions = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < 5 {
                continue;
            }
            let (Some(date), Some(order_type)) = (parse_date(&record[0]), OrderType::parse(&record[1])) else {
                warn!(row = idx + 1, "skipping malformed transaction row");
                continue;
            };
            let quantity = record[3].parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
            let price = record[4].parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0);
            transactions.push(Transaction::new(idx, date, order_type, &record[2], quantity, price));
        }
        Ok(transactions)
    }
}

/// Fetch and decode one JSON file, logging and swallowing failures.
async fn load_optional<T: DeserializeOwned>(registry: &DataProviderRegistry, path: &str) -> Option<T> {
    match registry.fetch_json::<T>(path).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path, error = %e, "data file unavailable; view disabled");
            None
        }
    }
}

/// `YYYY-MM-DD`, optionally followed by a time part, or `MM/DD/YYYY`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

fn normalize_points(raw: Vec<RawPoint>) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<TimeSeriesPoint> = raw
        .into_iter()
        .filter_map(|p| {
            let date = parse_date(p.date.as_deref()?)?;
            let value = p.value.filter(|v| v.is_finite())?;
            Some(TimeSeriesPoint::new(date, value))
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

fn normalize_balance(raw: BTreeMap<String, Vec<RawPoint>>) -> BTreeMap<String, Vec<TimeSeriesPoint>> {
    raw.into_iter()
        .map(|(ccy, points)| (ccy, normalize_points(points)))
        .filter(|(_, points)| !points.is_empty())
        .collect()
}

fn normalize_contribution(
    raw: BTreeMap<String, Vec<RawContribution>>,
) -> BTreeMap<String, Vec<ContributionEntry>> {
    raw.into_iter()
        .map(|(ccy, entries)| {
            let mut entries: Vec<ContributionEntry> = entries
                .into_iter()
                .filter_map(|e| {
                    Some(ContributionEntry {
                        trade_date: parse_date(e.trade_date.as_deref()?)?,
                        amount: e.amount.filter(|v| v.is_finite())?,
                        order_type: e.order_type.unwrap_or_else(|| "padding".to_string()),
                        net_amount: e.net_amount.filter(|v| v.is_finite()).unwrap_or(0.0),
                        synthetic: false,
                    })
                })
                .collect();
            entries.sort_by_key(|e| e.trade_date);
            (ccy, entries)
        })
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
}

/// Keys are normalized (`^SSE` → `^SSEC`); empty series are dropped.
fn normalize_performance(raw: BTreeMap<String, Vec<RawPoint>>) -> SeriesMap {
    raw.into_iter()
        .map(|(key, points)| (normalize_series_key(&key), normalize_points(points)))
        .filter(|(_, points)| !points.is_empty())
        .collect()
}
