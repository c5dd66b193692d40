//! Filesystem locations derived from the user's home directory.

use crate::error::ApiError;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".agents-cli";
const CONFIG_FILE_NAME: &str = "config.yaml";
const INSTALL_DIR_NAME: &str = ".agents";

/// Home-relative paths for config, logs and installs.
#[derive(Debug, Clone)]
pub struct AgtPaths {
    home: PathBuf,
    config_file: PathBuf,
}

impl AgtPaths {
    /// Paths rooted at the current user's home directory.
    pub fn from_env() -> Result<Self, ApiError> {
        let base = directories::BaseDirs::new().ok_or_else(|| {
            ApiError::ConfigError("Could not determine home directory".to_string())
        })?;
        Ok(Self::with_home(base.home_dir()))
    }

    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let config_file = home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        Self { home, config_file }
    }

    /// Use an explicit config file instead of `~/.agents-cli/config.yaml`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Directory holding the config file.
    pub fn config_dir(&self) -> PathBuf {
        self.config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.home.join(CONFIG_DIR_NAME))
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.config_dir().join("logs").join("agt.log")
    }

    /// `~/.agents`, where the installed manifest lives by default.
    pub fn default_install_dir(&self) -> PathBuf {
        self.home.join(INSTALL_DIR_NAME)
    }
}
