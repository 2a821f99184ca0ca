use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::CoreError;
use super::traits::DataProvider;

/// Reads data files from a local directory.
pub struct FileDataProvider {
    root: PathBuf,
}

impl FileDataProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `path`. Leading slashes are ignored so web-style
    /// paths resolve under the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, CoreError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(CoreError::ValidationError(format!(
                "Path escapes the data directory: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DataProvider for FileDataProvider {
    fn name(&self) -> &str {
        "File"
    }

    async fn fetch_text(&self, path: &str) -> Result<String, CoreError> {
        let full = self.resolve(path)?;
        debug!(path = %full.display(), "reading data file");
        Ok(tokio::fs::read_to_string(&full).await?)
    }
}
