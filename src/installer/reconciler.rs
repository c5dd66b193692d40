use crate::agent::{AgentDescriptor, AgentIdentity};
use crate::error::ApiError;
use crate::installer::batch::{BatchReport, Outcome};
use crate::installer::layout::InstallLayout;
use crate::manifest::{InstalledAgentRecord, InstalledStore};
use crate::registry::RegistryClient;
use crate::types::Target;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

/// Decisions for one install, all supplied up front.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Overrides the version in the reference and the catalog latest
    pub version: Option<String>,
    pub target: Target,
    pub force: bool,
    pub dry_run: bool,
}

impl InstallOptions {
    pub fn new(target: Target) -> Self {
        Self {
            version: None,
            target,
            force: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Restrict to records of this target
    pub target: Option<Target>,
    pub dry_run: bool,
}

/// An installed record whose catalog version differs.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCandidate {
    pub record: InstalledAgentRecord,
    pub latest: String,
}

/// Brings local installed state in line with install, uninstall and update requests.
pub struct Installer {
    registry: Arc<RegistryClient>,
    store: Arc<dyn InstalledStore>,
    layout: InstallLayout,
}

fn remove_agent_file(path: &Path) -> Result<(), ApiError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Agent file already absent");
            Ok(())
        }
        Err(e) => Err(ApiError::StorageError(e)),
    }
}

impl Installer {
    pub fn new(
        registry: Arc<RegistryClient>,
        store: Arc<dyn InstalledStore>,
        layout: InstallLayout,
    ) -> Self {
        Self {
            registry,
            store,
            layout,
        }
    }

    pub fn installed(&self) -> Vec<InstalledAgentRecord> {
        self.store.list()
    }

    async fn resolve(&self, identity: &AgentIdentity) -> Result<AgentDescriptor, ApiError> {
        self.registry
            .lookup(identity)
            .await?
            .ok_or_else(|| ApiError::AgentNotFound(identity.unversioned().to_string()))
    }

    /// Install one agent reference.
    pub async fn install(
        &self,
        reference: &str,
        options: &InstallOptions,
    ) -> Result<Outcome, ApiError> {
        let identity = AgentIdentity::parse(reference)?;
        let descriptor = self.resolve(&identity).await?;

        let version = options
            .version
            .clone()
            .or_else(|| identity.version.clone())
            .unwrap_or_else(|| descriptor.version.clone());
        let id = descriptor.key();
        let target = options.target;
        let install_path =
            self.layout
                .install_path(target, &descriptor.author, &descriptor.id, &version)?;
        let existing = self.store.find(&id, target);

        if options.dry_run {
            return Ok(Outcome::Planned {
                id,
                version,
                target,
                install_path,
                existing: existing.map(|r| r.version),
            });
        }

        if let Some(record) = &existing {
            if !options.force {
                return Err(ApiError::AlreadyInstalled {
                    id,
                    target,
                    version: record.version.clone(),
                });
            }
        }

        if !descriptor.compatibility.is_empty() && !descriptor.supports(target) {
            tracing::warn!(
                agent = %id,
                target = %target,
                "Agent does not declare support for this target"
            );
        }

        let content = self.registry.fetch_content(&descriptor, &version).await?;
        if let Some(parent) = install_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&install_path, content)?;

        let record = InstalledAgentRecord {
            id: id.clone(),
            version: version.clone(),
            target,
            install_path: install_path.clone(),
            installed_at: Utc::now(),
        };
        self.store.upsert(record.clone())?;

        if let Some(previous) = &existing {
            if previous.install_path != install_path {
                if let Err(e) = remove_agent_file(&previous.install_path) {
                    tracing::warn!(
                        path = %previous.install_path.display(),
                        error = %e,
                        "Failed to remove superseded agent file"
                    );
                }
            }
        }

        tracing::info!(agent = %id, version = %version, target = %target, "Installed agent");
        Ok(Outcome::Installed {
            record,
            previous: existing.map(|r| r.version),
        })
    }

    /// Remove one installed agent. Needs no catalog access.
    pub async fn uninstall(&self, reference: &str, target: Target) -> Result<Outcome, ApiError> {
        let identity = AgentIdentity::parse(reference)?;
        let mut matches: Vec<InstalledAgentRecord> = self
            .store
            .list()
            .into_iter()
            .filter(|r| r.target == target && identity.matches_key(&r.id))
            .collect();

        let record = match matches.len() {
            0 => {
                return Err(ApiError::NotInstalled {
                    id: identity.key(),
                    target,
                })
            }
            1 => matches.remove(0),
            _ => {
                return Err(ApiError::AmbiguousIdentity {
                    name: identity.name.clone(),
                    candidates: matches.into_iter().map(|r| r.id).collect(),
                })
            }
        };

        remove_agent_file(&record.install_path)?;
        self.store.remove(&record.id, record.target)?;

        tracing::info!(agent = %record.id, target = %target, "Uninstalled agent");
        Ok(Outcome::Uninstalled(record))
    }

    async fn latest_for(&self, record: &InstalledAgentRecord) -> Result<Option<String>, ApiError> {
        let identity = AgentIdentity::parse(&record.id)?;
        Ok(self.registry.lookup(&identity).await?.map(|d| d.version))
    }

    /// Installed records whose catalog version differs, without changing anything.
    ///
    /// Records that no longer resolve in the catalog are skipped.
    pub async fn check_updates(
        &self,
        target: Option<Target>,
    ) -> Result<Vec<UpdateCandidate>, ApiError> {
        let mut candidates = Vec::new();
        for record in self.store.list() {
            if target.map(|t| t != record.target).unwrap_or(false) {
                continue;
            }
            match self.latest_for(&record).await {
                Ok(Some(latest)) if latest != record.version => {
                    candidates.push(UpdateCandidate { record, latest })
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::warn!(agent = %record.id, "Installed agent no longer in catalog");
                }
                Err(e) if e.is_per_item() => {
                    tracing::warn!(agent = %record.id, error = %e, "Skipping update check");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(candidates)
    }

    async fn reinstall(
        &self,
        record: &InstalledAgentRecord,
        latest: &str,
        dry_run: bool,
    ) -> Result<Outcome, ApiError> {
        let options = InstallOptions {
            version: Some(latest.to_string()),
            target: record.target,
            force: true,
            dry_run,
        };
        self.install(&record.id, &options).await
    }

    /// Update installed agents to the catalog's latest version.
    ///
    /// With no references every eligible record is updated. A reference that
    /// matches no installed record fails with [`ApiError::NotInstalled`].
    pub async fn update(
        &self,
        references: &[String],
        options: &UpdateOptions,
    ) -> Result<BatchReport, ApiError> {
        let mut report = BatchReport::default();

        if references.is_empty() {
            for candidate in self.check_updates(options.target).await? {
                match self
                    .reinstall(&candidate.record, &candidate.latest, options.dry_run)
                    .await
                {
                    Err(e) if !e.is_per_item() => return Err(e),
                    result => report.push(candidate.record.id.clone(), result),
                }
            }
            return Ok(report);
        }

        let records: Vec<InstalledAgentRecord> = self
            .store
            .list()
            .into_iter()
            .filter(|r| options.target.map(|t| t == r.target).unwrap_or(true))
            .collect();

        for reference in references {
            let identity = match AgentIdentity::parse(reference) {
                Ok(identity) => identity,
                Err(e) => {
                    report.push(reference.clone(), Err(e));
                    continue;
                }
            };

            let matching: Vec<&InstalledAgentRecord> = records
                .iter()
                .filter(|r| identity.matches_key(&r.id))
                .collect();
            if matching.is_empty() {
                let target = options.target.unwrap_or_default();
                report.push(
                    reference.clone(),
                    Err(ApiError::NotInstalled {
                        id: identity.key(),
                        target,
                    }),
                );
                continue;
            }

            for record in matching {
                let result = match self.latest_for(record).await {
                    Ok(Some(latest)) if latest != record.version => {
                        self.reinstall(record, &latest, options.dry_run).await
                    }
                    Ok(Some(latest)) => Ok(Outcome::UpToDate {
                        id: record.id.clone(),
                        target: record.target,
                        version: latest,
                    }),
                    Ok(None) => Err(ApiError::AgentNotFound(record.id.clone())),
                    Err(e) => Err(e),
                };
                match result {
                    Err(e) if !e.is_per_item() => return Err(e),
                    result => report.push(format!("{} ({})", record.id, record.target), result),
                }
            }
        }
        Ok(report)
    }

    pub async fn install_many(
        &self,
        references: &[String],
        options: &InstallOptions,
    ) -> Result<BatchReport, ApiError> {
        let mut report = BatchReport::default();
        for reference in references {
            match self.install(reference, options).await {
                Err(e) if !e.is_per_item() => return Err(e),
                result => report.push(reference.clone(), result),
            }
        }
        Ok(report)
    }

    pub async fn uninstall_many(
        &self,
        references: &[String],
        target: Target,
    ) -> Result<BatchReport, ApiError> {
        let mut report = BatchReport::default();
        for reference in references {
            match self.uninstall(reference, target).await {
                Err(e) if !e.is_per_item() => return Err(e),
                result => report.push(reference.clone(), result),
            }
        }
        Ok(report)
    }
}
