use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use super::traits::DataProvider;

/// Reads data files from a static web host, e.g. the dashboard's own
/// deployment at `https://example.org/` serving `output/*.json`.
pub struct HttpDataProvider {
    client: Client,
    base_url: String,
}

impl HttpDataProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DataProvider for HttpDataProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, CoreError> {
        let url = self.url_for(path);
        debug!(%url, "fetching data file");
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Fetch {
                provider: self.name().to_string(),
                message: format!("HTTP {status} for {path}"),
            });
        }
        Ok(resp.text().await?)
    }
}
