//! Java source file enumeration.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ReviewConfig;

/// Build output directories that never hold sources worth reviewing.
const SKIPPED_DIRS: &[&str] = &["target", "build", "out", "node_modules"];

/// Collect `.java` files under `root`, sorted. A file root is returned as is.
///
/// Hidden directories, build output directories and paths matching the
/// config's `excluded_paths` are skipped. Entries that cannot be read are
/// logged and left out.
pub fn collect_java_files(root: &Path, config: &ReviewConfig) -> anyhow::Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !(name.starts_with('.') || SKIPPED_DIRS.contains(&&*name))
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // e.g. a dangling symlink
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("java") {
            continue;
        }
        if config.is_path_excluded(path) {
            tracing::debug!(path = %path.display(), "excluded by config");
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}
