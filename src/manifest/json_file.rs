use crate::error::ApiError;
use crate::manifest::contract::{InstalledAgentRecord, InstalledStore};
use crate::types::Target;
use std::path::{Path, PathBuf};

/// Installed manifest persisted as a single JSON array.
///
/// Every write replaces the whole document through a temp file and rename.
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the manifest, surfacing corruption instead of hiding it.
    pub fn load(&self) -> Result<Vec<InstalledAgentRecord>, ApiError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| ApiError::ManifestCorrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn persist(&self, records: &[InstalledAgentRecord]) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::ConfigError(format!(
                    "Failed to create manifest directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(records).map_err(|e| {
            ApiError::ConfigError(format!("Failed to serialize installed manifest: {}", e))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl InstalledStore for JsonManifestStore {
    fn list(&self) -> Vec<InstalledAgentRecord> {
        match self.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Treating installed manifest as empty");
                Vec::new()
            }
        }
    }

    fn upsert(&self, record: InstalledAgentRecord) -> Result<(), ApiError> {
        let mut records: Vec<InstalledAgentRecord> = self
            .list()
            .into_iter()
            .filter(|r| !r.same_key(&record.id, record.target))
            .collect();
        records.push(record);
        self.persist(&records)
    }

    fn remove(&self, id: &str, target: Target) -> Result<(), ApiError> {
        let records: Vec<InstalledAgentRecord> = self
            .list()
            .into_iter()
            .filter(|r| !r.same_key(id, target))
            .collect();
        self.persist(&records)
    }
}
