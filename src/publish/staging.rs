//! Offline staging area laid out like the registry repository.

use crate::agent::{AgentDescriptor, AgentMetadata};
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_STAGING_DIR: &str = "temp-publish";

/// `registry.json` at the staging root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingIndex {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    pub total_agents: usize,
    /// Agents per category, recomputed from `agents` on every write
    pub categories: BTreeMap<String, u64>,
    /// Keyed `author/id`
    pub agents: BTreeMap<String, AgentDescriptor>,
}

impl Default for StagingIndex {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            last_updated: Utc::now(),
            total_agents: 0,
            categories: BTreeMap::new(),
            agents: BTreeMap::new(),
        }
    }
}

impl StagingIndex {
    fn recount(&mut self) {
        let mut categories = BTreeMap::new();
        for agent in self.agents.values() {
            *categories.entry(agent.category.clone()).or_insert(0) += 1;
        }
        self.categories = categories;
        self.total_agents = self.agents.len();
        self.last_updated = Utc::now();
    }
}

/// `metadata.json` beside each staged version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedMetadata {
    #[serde(flatten)]
    descriptor: AgentDescriptor,
    created_at: DateTime<Utc>,
}

pub struct LocalStaging {
    root: PathBuf,
}

impl LocalStaging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("registry.json")
    }

    pub fn agent_dir(&self, author: &str, id: &str) -> PathBuf {
        self.root.join("agents").join(author).join(id)
    }

    pub fn load_index(&self) -> Result<StagingIndex, ApiError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(StagingIndex::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            ApiError::ConfigError(format!(
                "Staging index {} is not valid: {}",
                path.display(),
                e
            ))
        })
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize {}: {}", path.display(), e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Stage one agent version. Replacing an entry requires `update`.
    pub fn stage(
        &self,
        metadata: &AgentMetadata,
        author: &str,
        content: &str,
        update: bool,
    ) -> Result<PathBuf, ApiError> {
        let key = format!("{}/{}", author, metadata.id);
        let mut index = self.load_index()?;
        if !update && index.agents.contains_key(&key) {
            return Err(ApiError::AlreadyPublished(key));
        }

        let now = Utc::now();
        let descriptor = AgentDescriptor {
            id: metadata.id.clone(),
            author: author.to_string(),
            category: metadata.category.clone(),
            version: metadata.version.clone(),
            tags: metadata.tags.iter().cloned().collect(),
            compatibility: metadata.compatibility.clone(),
            downloads: 0,
            rating: 0.0,
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            updated_at: Some(now),
            license: metadata.license.clone(),
            homepage: metadata.homepage.clone(),
        };

        let agent_dir = self.agent_dir(author, &metadata.id);
        std::fs::create_dir_all(&agent_dir)?;

        let metadata_path = agent_dir.join("metadata.json");
        let created_at = std::fs::read_to_string(&metadata_path)
            .ok()
            .and_then(|existing| serde_json::from_str::<StagedMetadata>(&existing).ok())
            .map(|existing| existing.created_at)
            .unwrap_or(now);
        Self::write_json(
            &metadata_path,
            &StagedMetadata {
                descriptor: descriptor.clone(),
                created_at,
            },
        )?;
        std::fs::write(agent_dir.join(format!("v{}.md", metadata.version)), content)?;

        index.agents.insert(key, descriptor);
        index.recount();
        Self::write_json(&self.index_path(), &index)?;

        Ok(agent_dir)
    }
}
