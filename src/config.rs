//! Configuration: registry, install and logging settings plus hub credentials.
//!
//! Loaded once per invocation by [`ConfigLoader`] and handed to components by
//! value. Only explicit commands (`config ...`, `login`) write it back.

pub mod loader;
pub mod paths;

pub use loader::ConfigLoader;
pub use paths::AgtPaths;

use crate::logging::LoggingConfig;
use crate::types::Target;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/chameleon-nexus/agents-registry/master";
pub const DEFAULT_API_URL: &str = "https://www.agthub.org";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Named hub environments for `config use-env`.
pub const ENVIRONMENTS: [(&str, &str); 3] = [
    ("local", "http://localhost:3000"),
    ("production", DEFAULT_API_URL),
    ("staging", "https://agthub-staging.vercel.app"),
];

pub fn environment_url(name: &str) -> Option<&'static str> {
    ENVIRONMENTS
        .iter()
        .find(|(env, _)| *env == name)
        .map(|(_, url)| *url)
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Catalog cache lifetime in seconds
    #[serde(
        default = "default_cache_ttl",
        rename = "cacheTtl",
        alias = "cachettl",
        alias = "cache_ttl"
    )]
    pub cache_ttl: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            cache_ttl: default_cache_ttl(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub target: Target,

    /// Holds `installed.json`; `~/.agents` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgtConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(
        default,
        rename = "apiUrl",
        alias = "apiurl",
        alias = "api_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(
        default,
        rename = "userName",
        alias = "username",
        alias = "user_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_name: Option<String>,
}

impl AgtConfig {
    /// Defaults with the install directory spelled out for `paths`.
    pub fn defaults_for(paths: &AgtPaths) -> Self {
        let mut config = Self::default();
        config.install.directory = Some(paths.default_install_dir());
        config.api_url = Some(DEFAULT_API_URL.to_string());
        config
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
    }

    pub fn install_dir(&self, paths: &AgtPaths) -> PathBuf {
        self.install
            .directory
            .clone()
            .unwrap_or_else(|| paths.default_install_dir())
    }

    pub fn manifest_path(&self, paths: &AgtPaths) -> PathBuf {
        self.install_dir(paths).join("installed.json")
    }

    /// Token, if a login has been stored.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
