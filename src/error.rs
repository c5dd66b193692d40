//! Error types for agent resolution, installation and publishing.

use crate::types::Target;
use thiserror::Error;

/// Crate-wide error type.
///
/// Per-item variants (`InvalidIdentity` through `Validation`) are caught at the
/// batch boundary and reported; system-level variants terminate the command.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid agent reference '{0}'")]
    InvalidIdentity(String),

    #[error("Agent {0} not found")]
    AgentNotFound(String),

    #[error("Agent {id} is already installed for {target} (version {version}). Use --force to reinstall.")]
    AlreadyInstalled {
        id: String,
        target: Target,
        version: String,
    },

    #[error("Agent {id} is not installed for {target}")]
    NotInstalled { id: String, target: Target },

    #[error("Agent name '{name}' is ambiguous, matches: {}", candidates.join(", "))]
    AmbiguousIdentity {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Content for {id}@{version} not found in registry")]
    ContentNotFound { id: String, version: String },

    #[error("Content for {id}@{version} could not be downloaded: {reason}")]
    ContentUnavailable {
        id: String,
        version: String,
        reason: String,
    },

    #[error("Agent {id} has an unusable {field} '{value}'")]
    UnsafeDescriptor {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("Installed manifest {path} is corrupt: {reason}")]
    ManifestCorrupt { path: String, reason: String },

    #[error("Validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error("Agent {0} is already staged. Use --update to replace it.")]
    AlreadyPublished(String),

    #[error("Unknown target '{0}' (expected claude-code, codex or copilot)")]
    InvalidTarget(String),

    #[error("Not logged in. Run `agt login` first.")]
    AuthRequired,

    #[error("Hub request failed ({status}): {message}")]
    HubError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),
}

impl ApiError {
    /// Whether this error only affects a single batch item.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidIdentity(_)
                | ApiError::AgentNotFound(_)
                | ApiError::AlreadyInstalled { .. }
                | ApiError::NotInstalled { .. }
                | ApiError::AmbiguousIdentity { .. }
                | ApiError::ContentNotFound { .. }
                | ApiError::ContentUnavailable { .. }
                | ApiError::UnsafeDescriptor { .. }
                | ApiError::Validation(_)
                | ApiError::AlreadyPublished(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Failure at the registry transport seam, before it is mapped into [`ApiError`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("{url} not found")]
    NotFound { url: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid catalog document {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_installed_message_suggests_force() {
        let err = ApiError::AlreadyInstalled {
            id: "acme/reviewer".to_string(),
            target: Target::ClaudeCode,
            version: "1.0.0".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("acme/reviewer"));
        assert!(message.contains("1.0.0"));
        assert!(message.contains("--force"));
    }

    #[test]
    fn validation_lists_every_violation() {
        let err = ApiError::Validation(vec!["missing id".to_string(), "bad version".to_string()]);
        let message = err.to_string();
        assert!(message.contains("missing id"));
        assert!(message.contains("bad version"));
    }

    #[test]
    fn system_errors_are_not_per_item() {
        assert!(ApiError::AgentNotFound("x".to_string()).is_per_item());
        assert!(!ApiError::RegistryUnavailable("down".to_string()).is_per_item());
        assert!(!ApiError::ConfigError("bad".to_string()).is_per_item());
    }
}
