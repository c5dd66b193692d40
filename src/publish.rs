//! Publish pipeline: parse and validate agent files, then submit them to the
//! hub or stage them locally for a registry pull request.

pub mod scan;
pub mod staging;

pub use scan::find_agent_files;
pub use staging::{LocalStaging, StagingIndex, DEFAULT_STAGING_DIR};

use crate::agent::{AgentDocument, AgentMetadata};
use crate::error::ApiError;
use crate::hub::{HubClient, PublishResponse};
use std::path::{Path, PathBuf};

const FALLBACK_AUTHOR: &str = "community";

/// A validated agent file ready to publish.
#[derive(Debug, Clone)]
pub struct PreparedAgent {
    pub path: PathBuf,
    pub metadata: AgentMetadata,
    /// Resolved publishing author
    pub author: String,
    pub content: String,
    /// Non-fatal findings such as unrecognized frontmatter keys
    pub warnings: Vec<String>,
}

impl PreparedAgent {
    pub fn key(&self) -> String {
        format!("{}/{}", self.author, self.metadata.id)
    }
}

/// Read, parse and validate one agent file.
///
/// The author comes from the file, then `default_author`, then `community`.
pub fn prepare_agent(path: &Path, default_author: Option<&str>) -> Result<PreparedAgent, ApiError> {
    let content = std::fs::read_to_string(path)?;
    let document = AgentDocument::parse(&content);
    let stem = path.file_stem().and_then(|s| s.to_str());
    let metadata = document.validate(stem)?;

    let warnings = document
        .unknown_keys()
        .into_iter()
        .map(|key| format!("unrecognized frontmatter key '{}' ignored", key))
        .collect();
    let author = metadata
        .author
        .clone()
        .or_else(|| default_author.filter(|a| !a.is_empty()).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_AUTHOR.to_string());

    Ok(PreparedAgent {
        path: path.to_path_buf(),
        metadata,
        author,
        content,
        warnings,
    })
}

pub enum PublishDestination {
    Hub(HubClient),
    Staging(LocalStaging),
}

#[derive(Debug)]
pub enum PublishReceipt {
    Remote {
        key: String,
        response: PublishResponse,
    },
    Staged {
        key: String,
        directory: PathBuf,
    },
}

/// Outcome of publishing every agent file under a directory.
#[derive(Debug, Default)]
pub struct DirectoryPublishReport {
    pub invalid: Vec<(PathBuf, ApiError)>,
    pub published: Vec<(PathBuf, PublishReceipt)>,
    pub failed: Vec<(PathBuf, ApiError)>,
}

impl DirectoryPublishReport {
    pub fn exit_code(&self) -> i32 {
        if self.published.is_empty() && (!self.invalid.is_empty() || !self.failed.is_empty()) {
            1
        } else {
            0
        }
    }
}

pub struct PublishService {
    destination: PublishDestination,
    default_author: Option<String>,
}

impl PublishService {
    pub fn new(destination: PublishDestination, default_author: Option<String>) -> Self {
        Self {
            destination,
            default_author,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.destination, PublishDestination::Hub(_))
    }

    pub fn prepare(&self, path: &Path) -> Result<PreparedAgent, ApiError> {
        prepare_agent(path, self.default_author.as_deref())
    }

    pub async fn publish(
        &self,
        prepared: &PreparedAgent,
        update: bool,
    ) -> Result<PublishReceipt, ApiError> {
        let key = prepared.key();
        let receipt = match &self.destination {
            PublishDestination::Hub(hub) => {
                let mut metadata = prepared.metadata.clone();
                metadata.author = Some(prepared.author.clone());
                let file_name = prepared
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("{}.md", metadata.id));
                let response = hub.publish(&metadata, &file_name, &prepared.content).await?;
                PublishReceipt::Remote { key, response }
            }
            PublishDestination::Staging(staging) => {
                let directory = staging.stage(
                    &prepared.metadata,
                    &prepared.author,
                    &prepared.content,
                    update,
                )?;
                PublishReceipt::Staged { key, directory }
            }
        };
        tracing::info!(agent = %prepared.key(), version = %prepared.metadata.version, "Published agent");
        Ok(receipt)
    }

    pub async fn publish_file(&self, path: &Path, update: bool) -> Result<PublishReceipt, ApiError> {
        let prepared = self.prepare(path)?;
        for warning in &prepared.warnings {
            tracing::warn!(file = %path.display(), "{}", warning);
        }
        self.publish(&prepared, update).await
    }

    /// Validate every agent file under `dir` first, then publish the valid ones.
    pub async fn publish_dir(
        &self,
        dir: &Path,
        update: bool,
    ) -> Result<DirectoryPublishReport, ApiError> {
        if !dir.is_dir() {
            return Err(ApiError::ConfigError(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut report = DirectoryPublishReport::default();
        let mut valid = Vec::new();
        for path in find_agent_files(dir) {
            match self.prepare(&path) {
                Ok(prepared) => valid.push(prepared),
                Err(e) => report.invalid.push((path, e)),
            }
        }

        for prepared in valid {
            match self.publish(&prepared, update).await {
                Ok(receipt) => report.published.push((prepared.path, receipt)),
                Err(e) => {
                    tracing::warn!(file = %prepared.path.display(), error = %e, "Publish failed");
                    report.failed.push((prepared.path, e));
                }
            }
        }
        Ok(report)
    }
}
