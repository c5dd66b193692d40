use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: [&str; 4] = ["node_modules", "target", "dist", "build"];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn is_agent_file(path: &Path) -> bool {
    let is_markdown = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false);
    let is_readme = path
        .file_name()
        .map(|name| name.to_string_lossy().eq_ignore_ascii_case("README.md"))
        .unwrap_or(false);
    is_markdown && !is_readme
}

/// Markdown agent files under `root`, skipping hidden and build directories.
pub fn find_agent_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable path during scan: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_agent_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
