//! Agent reference parsing.
//!
//! A reference names an agent as `name`, `author/name` or `author/name@version`.
//! Parsing is pure: no catalog or filesystem access happens here.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parsed agent reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Author namespace; `None` until resolved against the catalog
    pub author: Option<String>,
    pub name: String,
    /// Requested version, if the reference carried one
    pub version: Option<String>,
}

impl AgentIdentity {
    pub fn new(author: Option<&str>, name: &str, version: Option<&str>) -> Self {
        Self {
            author: author.map(str::to_string),
            name: name.to_string(),
            version: version.map(str::to_string),
        }
    }

    /// Parse a raw reference string.
    ///
    /// The version is whatever follows the last `@`, provided that `@` is neither
    /// the first nor the final character. The remaining identity is split on its
    /// first `/` into author and name.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ApiError::InvalidIdentity(raw.to_string()));
        }

        let (ident, version) = match raw.rfind('@') {
            Some(at) if at > 0 && at < raw.len() - 1 => (&raw[..at], Some(&raw[at + 1..])),
            _ => (raw, None),
        };

        let (author, name) = match ident.split_once('/') {
            Some((author, name)) => (Some(author), name),
            None => (None, ident),
        };

        Ok(Self::new(author, name, version))
    }

    /// Key used in the installed manifest: `author/name` or `name`.
    pub fn key(&self) -> String {
        match &self.author {
            Some(author) => format!("{}/{}", author, self.name),
            None => self.name.clone(),
        }
    }

    /// Same identity without a version.
    pub fn unversioned(&self) -> Self {
        Self {
            author: self.author.clone(),
            name: self.name.clone(),
            version: None,
        }
    }

    /// Whether a manifest key refers to this identity.
    ///
    /// With an author the key must match exactly; a bare name matches any author.
    pub fn matches_key(&self, key: &str) -> bool {
        match &self.author {
            Some(_) => key == self.key(),
            None => match key.split_once('/') {
                Some((_, name)) => name == self.name,
                None => key == self.name,
            },
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.key(), version),
            None => f.write_str(&self.key()),
        }
    }
}

impl FromStr for AgentIdentity {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
