//! Unified diffs between on-disk output and what a run would write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::error::{io_err, SyncError};
use crate::writer::normalize_line_endings;

/// A single output-file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Diff `rendered` against the file at `path`, relative to `root` in the
/// headers. `None` when nothing would change.
pub fn diff_output(root: &Path, path: &Path, rendered: &str) -> Result<Option<FileDiff>, SyncError> {
    let rendered = normalize_line_endings(rendered);
    let existing = read_existing_or_empty(path)?;
    if existing == rendered {
        return Ok(None);
    }

    let relative = path.strip_prefix(root).unwrap_or(path);
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified = TextDiff::from_lines(&existing, &rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(FileDiff {
        path: path.to_path_buf(),
        unified_diff: unified,
    }))
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(normalize_line_endings(&content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_output_has_no_diff() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("Bar.cs");
        fs::write(&path, "class Bar {}\r\n").unwrap();
        assert!(diff_output(root.path(), &path, "class Bar {}\n").unwrap().is_none());
    }

    #[test]
    fn local_edit_produces_unified_diff() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("Foo").join("Bar.cs");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "class Bar {}\n// manual tweak\n").unwrap();

        let diff = diff_output(root.path(), &path, "class Bar {}\n").unwrap().expect("diff");
        assert!(diff.unified_diff.contains("--- a/Foo/Bar.cs"));
        assert!(diff.unified_diff.contains("+++ b/Foo/Bar.cs"));
        assert!(diff.unified_diff.contains("-// manual tweak"));
    }

    #[test]
    fn missing_file_diffs_against_empty() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("New.cs");
        let diff = diff_output(root.path(), &path, "class New {}\n").unwrap().expect("diff");
        assert!(diff.unified_diff.contains("+class New {}"));
        assert!(!path.exists());
    }
}
