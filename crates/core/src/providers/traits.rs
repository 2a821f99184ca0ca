use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::errors::CoreError;

/// Source of the dashboard's static data files.
///
/// Paths are relative to a data root (`output/cagr.txt`,
/// `transactions.csv`, ...). A file store and a web host implement this
/// trait; the loader never knows which one answered.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Raw text of the file at `path`.
    async fn fetch_text(&self, path: &str) -> Result<String, CoreError>;
}

/// Fetch `path` from `provider` and deserialize it as JSON.
pub async fn fetch_json<T: DeserializeOwned>(
    provider: &dyn DataProvider,
    path: &str,
) -> Result<T, CoreError> {
    let text = provider.fetch_text(path).await?;
    Ok(serde_json::from_str(&text)?)
}
