use crate::error::ApiError;
use crate::manifest::InstalledAgentRecord;
use crate::types::Target;
use std::path::PathBuf;

/// What happened to one agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Written to disk and recorded; `previous` is the version it replaced
    Installed {
        record: InstalledAgentRecord,
        previous: Option<String>,
    },
    /// Dry run: nothing fetched or written
    Planned {
        id: String,
        version: String,
        target: Target,
        install_path: PathBuf,
        existing: Option<String>,
    },
    Uninstalled(InstalledAgentRecord),
    UpToDate {
        id: String,
        target: Target,
        version: String,
    },
}

#[derive(Debug)]
pub struct BatchItem {
    pub reference: String,
    pub result: Result<Outcome, ApiError>,
}

/// Per-item results of a multi-agent command, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn push(&mut self, reference: impl Into<String>, result: Result<Outcome, ApiError>) {
        let reference = reference.into();
        if let Err(e) = &result {
            tracing::warn!(agent = %reference, error = %e, "Batch item failed");
        }
        self.items.push(BatchItem { reference, result });
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Process exit code for this batch.
    ///
    /// Failure when every item failed (which covers a failed single-item
    /// batch). With `strict`, any failed item fails the batch.
    pub fn exit_code(&self, strict: bool) -> i32 {
        let failed = self.failed();
        if failed == 0 {
            0
        } else if strict || failed == self.items.len() {
            1
        } else {
            0
        }
    }
}
