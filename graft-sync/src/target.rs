//! Namespace → output path mapping.
//!
//! The base namespace owns the target root; every further namespace segment
//! is one directory below it. Directories are created by the writer, so
//! resolving a path has no side effects.

use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// `true` when `namespace` is `base` or nested under it.
pub fn is_under_base(namespace: &str, base: &str) -> bool {
    base.is_empty()
        || namespace == base
        || namespace
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Output path for `file_name` declared in `namespace`.
pub fn resolve(root: &Path, base: &str, namespace: &str, file_name: &str) -> Result<PathBuf, SyncError> {
    if !is_under_base(namespace, base) {
        return Err(SyncError::OutsideBase {
            namespace: namespace.to_string(),
            base: base.to_string(),
        });
    }
    let rest = namespace[base.len()..].trim_start_matches('.');
    let mut path = root.to_path_buf();
    for segment in rest.split('.').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(file_name);
    Ok(path)
}
