//! Document settings, read from a TOML file.

use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Tunables for a [`Document`](crate::Document).
///
/// ```toml
/// undo_limit = 250
/// pretty = false
/// header_group = "Header"
/// body_group = "ObjectTree"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Maximum number of undoable edits; 0 keeps everything.
    pub undo_limit: usize,
    /// Pretty-print the persisted JSON.
    pub pretty: bool,
    pub header_group: String,
    pub body_group: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            undo_limit: 100,
            pretty: true,
            header_group: "Header".to_string(),
            body_group: "ObjectTree".to_string(),
        }
    }
}

impl DocumentSettings {
    /// Parses settings from TOML text. Missing keys take their defaults.
    pub fn from_toml(contents: &str) -> DocumentResult<Self> {
        let settings: Self =
            toml::from_str(contents).map_err(|e| DocumentError::Configuration(e.to_string()))?;
        if settings.header_group == settings.body_group {
            return Err(DocumentError::Configuration(format!(
                "header and body groups must differ (both are {:?})",
                settings.header_group
            )));
        }
        Ok(settings)
    }

    /// Loads settings from a file, falling back to defaults if the file is
    /// missing or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No document settings at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml(&contents) {
                Ok(settings) => {
                    info!("Loaded document settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!(
                        "Failed to parse document settings {:?}: {}. Using defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read document settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
