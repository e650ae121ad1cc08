//! Project serialization with versioning and migration.
//!
//! Projects are stored as JSON with a schema version so older files can be
//! upgraded on load.

use std::path::Path;

use reel_core::{ReelError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::project::Project;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned project file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Schema version for migration.
    pub version: u32,
    /// The project data.
    pub project: Project,
    /// Application version that wrote this file.
    pub app_version: String,
}

impl ProjectFile {
    /// Wrap a project at the current schema version.
    pub fn new(project: Project) -> Self {
        Self {
            version: CURRENT_VERSION,
            project,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to pretty JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ReelError::Serialization(format!("Failed to serialize project: {}", e)))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ReelError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        if version > CURRENT_VERSION {
            return Err(ReelError::Serialization(format!(
                "Project file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;
        serde_json::from_value(migrated)
            .map_err(|e| ReelError::Serialization(format!("Failed to parse project: {}", e)))
    }

    /// Save to a file path.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        debug!(path = %path.display(), "Project saved");
        Ok(())
    }

    /// Load from a file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Apply sequential migrations from `from_version` to `CURRENT_VERSION`.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 files are a bare project without the wrapper.
                if data.get("project").is_none() {
                    data = serde_json::json!({
                        "version": 1,
                        "project": data,
                        "app_version": "0.0.0",
                    });
                }
                version = 1;
            }
            _ => {
                return Err(ReelError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
