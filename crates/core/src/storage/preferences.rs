use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::CoreError;
use crate::models::settings::Preferences;

/// JSON file holding [`Preferences`] between sessions.
///
/// Without a path the store keeps nothing: loads return defaults and saves
/// are no-ops.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stored preferences, or defaults when the file does not exist yet.
    /// The currency is normalized on the way in.
    pub fn load(&self) -> Result<Preferences, CoreError> {
        let Some(path) = &self.path else {
            return Ok(Preferences::default());
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(e) => return Err(e.into()),
        };
        let mut prefs: Preferences = serde_json::from_str(&text)?;
        prefs.selected_currency = Preferences::normalize_currency(&prefs.selected_currency);
        debug!(path = %path.display(), currency = %prefs.selected_currency, "preferences loaded");
        Ok(prefs)
    }

    pub fn save(&self, prefs: &Preferences) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(prefs)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize preferences: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
