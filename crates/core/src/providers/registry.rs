use tracing::warn;

use crate::errors::CoreError;
use crate::models::settings::DashboardConfig;

use super::file::FileDataProvider;
use super::http::HttpDataProvider;
use super::traits::DataProvider;

/// Ordered list of data providers.
///
/// Fetches go to the first provider; when it fails the next one is tried,
/// and the last error is returned if every provider fails.
pub struct DataProviderRegistry {
    providers: Vec<Box<dyn DataProvider>>,
}

impl DataProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Registry for `config`: the local data directory first, then the web
    /// host when a base URL is configured.
    pub fn from_config(config: &DashboardConfig) -> Self {
        let mut registry = Self::new();
        if let Some(dir) = &config.data_dir {
            registry.register(Box::new(FileDataProvider::new(dir.clone())));
        }
        if let Some(url) = &config.base_url {
            registry.register(Box::new(HttpDataProvider::new(url.clone())));
        }
        registry
    }

    pub fn register(&mut self, provider: Box<dyn DataProvider>) {
        self.providers.push(provider);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Names in fallback order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Text of `path` from the first provider that has it.
    pub async fn fetch_text(&self, path: &str) -> Result<String, CoreError> {
        let mut last_error = None;
        for provider in &self.providers {
            match provider.fetch_text(path).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(provider = provider.name(), path, error = %e, "data fetch failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(CoreError::NoProvider))
    }

    /// JSON of `path`, deserialized. A provider whose file fails to parse
    /// counts as failed and the next one is tried.
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let mut last_error = None;
        for provider in &self.providers {
            match super::traits::fetch_json(provider.as_ref(), path).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(provider = provider.name(), path, error = %e, "data fetch failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(CoreError::NoProvider))
    }
}

impl Default for DataProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
