//! Request path resolution and the containment boundary.
//!
//! [`resolve`] is purely lexical and never touches the filesystem, so a
//! traversal attempt is rejected before any I/O happens. [`ensure_contained`]
//! adds the symlink-aware check that handlers run before acting on a path.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{error, warn};

use crate::error::FileHostError;

/// Resolve a URL path against the served root.
///
/// Leading slashes are stripped, `.` segments are dropped and `..` segments
/// consume the previous segment. A `..` with nothing left to consume would
/// escape the root and is rejected, as are absolute components and names
/// containing a NUL byte.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, FileHostError> {
    let relative = request_path.trim_start_matches('/');

    let mut segments: Vec<&OsStr> = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(name) => {
                if name.to_string_lossy().contains('\0') {
                    warn!("Path component contains null byte: {:?}", name);
                    return Err(FileHostError::InvalidPath);
                }
                segments.push(name);
            }
            Component::CurDir => continue,
            Component::ParentDir => {
                if segments.pop().is_none() {
                    warn!("Path traversal attempt: {:?}", request_path);
                    return Err(FileHostError::InvalidPath);
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                warn!("Absolute path component in request path: {:?}", request_path);
                return Err(FileHostError::InvalidPath);
            }
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(segments);

    if !resolved.starts_with(root) {
        error!("Path resolution escaped root: {:?}", resolved);
        return Err(FileHostError::InvalidPath);
    }

    Ok(resolved)
}

/// Verify that `path` still lies inside `root` once symlinks are followed.
///
/// The deepest ancestor of `path` that exists on disk (the path itself when
/// present) is canonicalized and compared with the canonical root. A dangling
/// symlink on the way is treated as an escape.
pub fn ensure_contained(root: &Path, path: &Path) -> Result<(), FileHostError> {
    let canonical_root = root.canonicalize()?;

    let mut probe = path;
    while std::fs::symlink_metadata(probe).is_err() {
        match probe.parent() {
            Some(parent) => probe = parent,
            None => return Ok(()),
        }
    }

    let canonical = match probe.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Dangling symlink on request path: {:?}", probe);
            return Err(FileHostError::InvalidPath);
        }
        Err(e) => return Err(FileHostError::Io(e)),
    };

    if !canonical.starts_with(&canonical_root) {
        warn!(
            "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
            probe, canonical, canonical_root
        );
        return Err(FileHostError::InvalidPath);
    }

    Ok(())
}

/// Render `full_path` relative to `root` with `/` separators, the only form
/// of a path that is ever shown to clients.
pub fn get_relative_path(root: &Path, full_path: &Path) -> String {
    full_path
        .strip_prefix(root)
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
