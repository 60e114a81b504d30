/**
 * Path Guard
 *
 * Resolves a raw request path against a tenant root and guarantees the
 * result stays inside that root.
 *
 * Resolution is purely lexical: the target of a request frequently does
 * not exist yet (documents are materialized on first access), so
 * filesystem canonicalization cannot be used. `..` segments pop the last
 * component and clamp at the filesystem root, `.` segments disappear, and
 * the containment check runs on the normalized result - never on the raw
 * string, because normalization is exactly what can change containment.
 *
 * The prefix check compares whole path components, so a root of
 * `/data/alice` does not admit `/data/alicex`.
 */

use std::path::{Component, Path, PathBuf};

use crate::error::ServerError;

/// Lexically normalize a path: resolve `.` and `..` without touching the
/// filesystem. `..` above the root clamps rather than underflowing.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Reduce a configured directory name to a strictly relative subtree
/// path: root and prefix components are dropped, as are `.` and `..`
/// segments, so joining the result under a root can only descend.
pub fn subtree(name: &str) -> PathBuf {
    Path::new(name)
        .components()
        .filter(|part| matches!(part, Component::Normal(_)))
        .collect()
}

/// Resolve `request_path` under `root` and require the result to stay
/// within `root`.
///
/// `root` must already be absolute and normalized (configuration
/// guarantees this). The request path is treated as root-relative
/// regardless of its leading slash.
///
/// # Errors
///
/// Returns `ServerError::PathEscape` when the normalized result is not a
/// descendant of (or equal to) `root`.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, ServerError> {
    let joined = root.join(request_path.trim_start_matches('/'));
    let full = normalize(&joined);

    if full.starts_with(root) {
        Ok(full)
    } else {
        Err(ServerError::PathEscape)
    }
}
