use crate::error::ApiError;
use crate::types::Target;
use std::path::{Component, PathBuf};

/// Where agent files land on disk for each target.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    home: PathBuf,
}

impl InstallLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `~/.claude/agents`, `~/.codex/agents` or `~/.copilot/agents`
    pub fn target_dir(&self, target: Target) -> PathBuf {
        self.home.join(target.agents_subdir())
    }

    /// `<target dir>/{author}_{name}_v{version}.md`
    ///
    /// Catalog values become part of a file name, so any of them that could
    /// leave the target directory is rejected.
    pub fn install_path(
        &self,
        target: Target,
        author: &str,
        name: &str,
        version: &str,
    ) -> Result<PathBuf, ApiError> {
        let id = format!("{}/{}", author, name);
        for (field, value) in [("author", author), ("id", name), ("version", version)] {
            check_segment(&id, field, value)?;
        }

        let dir = self.target_dir(target);
        let path = dir.join(format!("{}_{}_v{}.md", author, name, version));
        let contained = path.parent() == Some(dir.as_path())
            && matches!(path.components().last(), Some(Component::Normal(_)));
        if !contained {
            return Err(ApiError::UnsafeDescriptor {
                id,
                field: "path",
                value: path.display().to_string(),
            });
        }
        Ok(path)
    }
}

fn check_segment(id: &str, field: &'static str, value: &str) -> Result<(), ApiError> {
    let unsafe_value = value.is_empty()
        || value.contains("..")
        || value.contains(['/', '\\'])
        || value.chars().any(char::is_control);
    if unsafe_value {
        return Err(ApiError::UnsafeDescriptor {
            id: id.to_string(),
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
