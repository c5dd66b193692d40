//! Config loading: YAML file, then `AGT__*` environment overlay.

use crate::config::{AgtConfig, AgtPaths};
use crate::error::ApiError;
use config::{Config, Environment, File, FileFormat};

/// Environment overlay, e.g. `AGT__REGISTRY__URL`.
fn environment_source() -> Environment {
    Environment::with_prefix("AGT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config file plus the environment overlay, writing defaults
    /// first when the file does not exist.
    pub fn load(paths: &AgtPaths) -> Result<AgtConfig, ApiError> {
        Self::load_with(paths, Some(environment_source()))
    }

    /// The file alone. Mutating commands start from this so values that only
    /// come from the environment are never written back.
    pub fn load_file(paths: &AgtPaths) -> Result<AgtConfig, ApiError> {
        Self::load_with(paths, None)
    }

    fn load_with(paths: &AgtPaths, env: Option<Environment>) -> Result<AgtConfig, ApiError> {
        let path = paths.config_file();
        if !path.exists() {
            Self::save(paths, &AgtConfig::defaults_for(paths))?;
        }

        let mut builder =
            Config::builder().add_source(File::from(path).format(FileFormat::Yaml).required(true));
        if let Some(env) = env {
            builder = builder.add_source(env);
        }
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Apply `change` to the file contents and persist the result.
    pub fn update<F>(paths: &AgtPaths, change: F) -> Result<AgtConfig, ApiError>
    where
        F: FnOnce(&mut AgtConfig),
    {
        let mut config = Self::load_file(paths)?;
        change(&mut config);
        Self::save(paths, &config)?;
        Ok(config)
    }

    /// Persist the whole document.
    pub fn save(paths: &AgtPaths, config: &AgtConfig) -> Result<(), ApiError> {
        let path = paths.config_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let yaml = serde_yaml::to_string(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, yaml).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to write config to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Overwrite the file with defaults.
    pub fn reset(paths: &AgtPaths) -> Result<AgtConfig, ApiError> {
        let config = AgtConfig::defaults_for(paths);
        Self::save(paths, &config)?;
        Ok(config)
    }
}
