use crate::error::AppError;
use crate::result::CompressionResult;
use crate::settings::Settings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Record of one input's last successful compression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub output: String,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub settings_used: Settings,
    pub created_at: DateTime<Utc>,
}

impl From<&CompressionResult> for ManifestEntry {
    fn from(result: &CompressionResult) -> Self {
        Self {
            output: result.file_name.clone(),
            input_bytes: result.input_bytes,
            output_bytes: result.output_bytes,
            settings_used: result.settings_used.clone(),
            created_at: result.created_at,
        }
    }
}

/// Per-directory index of outputs keyed by input path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Load a manifest, starting empty when it is missing or unreadable
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!("Ignoring corrupt manifest {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No manifest at {}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, input: &str) -> Option<&ManifestEntry> {
        self.entries.get(input)
    }

    pub fn record(&mut self, input: impl Into<String>, result: &CompressionResult) {
        self.entries.insert(input.into(), ManifestEntry::from(result));
    }
}
