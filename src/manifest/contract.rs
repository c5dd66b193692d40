use crate::error::ApiError;
use crate::types::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One installed agent for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledAgentRecord {
    /// Canonical `author/name`
    pub id: String,
    pub version: String,
    pub target: Target,
    #[serde(rename = "path")]
    pub install_path: PathBuf,
    pub installed_at: DateTime<Utc>,
}

impl InstalledAgentRecord {
    pub fn same_key(&self, id: &str, target: Target) -> bool {
        self.id == id && self.target == target
    }
}

/// Persistent set of installed agents, at most one record per `(id, target)`.
pub trait InstalledStore: Send + Sync {
    /// All records. A missing or unreadable manifest reads as empty.
    fn list(&self) -> Vec<InstalledAgentRecord>;

    /// Replace any record with the same `(id, target)`, then persist.
    fn upsert(&self, record: InstalledAgentRecord) -> Result<(), ApiError>;

    /// Drop the record for `(id, target)`, if any, then persist.
    fn remove(&self, id: &str, target: Target) -> Result<(), ApiError>;

    fn find(&self, id: &str, target: Target) -> Option<InstalledAgentRecord> {
        self.list().into_iter().find(|r| r.same_key(id, target))
    }
}
