use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::resolve::{ensure_contained, get_relative_path};

/// Collect the relative path of every regular file under `root` that the
/// configured match mode selects for `query`.
///
/// Walks the whole tree in file-name order. Entries that cannot be read are
/// skipped. Symlinks are not followed into, but a symlink to a regular file
/// inside the root is listed under its own path.
pub fn list_matching(root: &Path, query: &str, config: &Config) -> Vec<String> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry during listing: {}", e);
                continue;
            }
        };

        if !is_listable_file(root, &entry) {
            continue;
        }

        let relative_path = get_relative_path(root, entry.path());
        if config.is_listed(&relative_path, query) {
            files.push(relative_path);
        }
    }

    files
}

fn is_listable_file(root: &Path, entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        return false;
    }

    let target_is_file = std::fs::metadata(entry.path())
        .map(|m| m.is_file())
        .unwrap_or(false);
    target_is_file && ensure_contained(root, entry.path()).is_ok()
}

/// Newline-terminated listing body.
pub fn render_listing(files: &[String]) -> String {
    let mut body = String::with_capacity(files.iter().map(|f| f.len() + 1).sum());
    for file in files {
        body.push_str(file);
        body.push('\n');
    }
    body
}
