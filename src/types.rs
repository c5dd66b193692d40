//! Core types shared across the agt crate.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Languages an agent may carry localized name/description text for.
pub const SUPPORTED_LANGUAGES: [&str; 4] = ["en", "zh", "ja", "vi"];

/// Destination tool an agent is installed for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    #[default]
    ClaudeCode,
    Codex,
    Copilot,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::ClaudeCode, Target::Codex, Target::Copilot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::ClaudeCode => "claude-code",
            Target::Codex => "codex",
            Target::Copilot => "copilot",
        }
    }

    /// Agents directory relative to the user's home directory.
    pub fn agents_subdir(&self) -> PathBuf {
        let dot_dir = match self {
            Target::ClaudeCode => ".claude",
            Target::Codex => ".codex",
            Target::Copilot => ".copilot",
        };
        PathBuf::from(dot_dir).join("agents")
    }

    /// Parse a compatibility key as the registry writes it (`claudeCode` or `claude-code`).
    pub fn from_compat_key(key: &str) -> Option<Target> {
        match key {
            "claudeCode" | "claude-code" | "claude_code" => Some(Target::ClaudeCode),
            "codex" => Some(Target::Codex),
            "copilot" => Some(Target::Copilot),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "claude-code" | "claudeCode" => Ok(Target::ClaudeCode),
            "codex" => Ok(Target::Codex),
            "copilot" => Ok(Target::Copilot),
            other => Err(ApiError::InvalidTarget(other.to_string())),
        }
    }
}
