//! Revision-control access.
//!
//! Everything the pipeline needs from upstream is two calls: list the blobs
//! of a branch and read one file at that branch. [`GitRepo`] answers them by
//! shelling out to `git` with its checkout directory passed explicitly on
//! every invocation; [`MemorySource`] answers them from memory for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{io_err, SyncError};

/// Marker whose presence means a checkout exists.
pub const CHECKOUT_MARKER: &str = ".git";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Blob,
    Tree,
}

/// One entry of a branch listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub path: String,
    pub kind: BlobKind,
    pub content_hash: String,
}

impl BlobEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == BlobKind::Blob
    }
}

/// Read-only view of an upstream repository.
pub trait RevisionSource: Send + Sync {
    /// Every blob and tree reachable from `branch`. Failure is fatal.
    fn list(&self, branch: &str) -> Result<Vec<BlobEntry>, SyncError>;

    /// Text of `path` at `branch`. Failure skips the file.
    fn read(&self, branch: &str, path: &str) -> Result<String, SyncError>;
}

// ---------------------------------------------------------------------------
// GitRepo
// ---------------------------------------------------------------------------

/// Result of [`GitRepo::clone_or_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Cloned,
    Fetched,
}

/// A local checkout driven through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitRepo {
    dir: PathBuf,
}

impl GitRepo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `true` when the checkout marker exists.
    pub fn exists(&self) -> bool {
        self.dir.join(CHECKOUT_MARKER).exists()
    }

    /// Clone `url` into `dir`, or fetch when a checkout is already there.
    pub fn clone_or_fetch(url: &str, dir: &Path) -> Result<(Self, FetchOutcome), SyncError> {
        let repo = GitRepo::new(dir);
        if repo.exists() {
            tracing::info!("fetching {} in {}", url, dir.display());
            repo.git(&["fetch", "--prune", "origin"])?;
            return Ok((repo, FetchOutcome::Fetched));
        }
        let parent = match dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        tracing::info!("cloning {} into {}", url, dir.display());
        // `git clone` runs inside `parent`, so the target is the last component only.
        let target = dir.file_name().map_or_else(|| dir.to_string_lossy(), |n| n.to_string_lossy());
        run_git(parent, &["clone", "--no-checkout", url, target.as_ref()])?;
        Ok((repo, FetchOutcome::Cloned))
    }

    fn git(&self, args: &[&str]) -> Result<String, SyncError> {
        run_git(&self.dir, args)
    }

    /// Prefer the remote-tracking ref so fetched changes are seen without a
    /// local merge.
    fn revision(&self, branch: &str) -> String {
        let remote = format!("origin/{branch}");
        match self.git(&["rev-parse", "--verify", "--quiet", &remote]) {
            Ok(_) => remote,
            Err(_) => branch.to_string(),
        }
    }
}

impl RevisionSource for GitRepo {
    fn list(&self, branch: &str) -> Result<Vec<BlobEntry>, SyncError> {
        let rev = self.revision(branch);
        let out = self.git(&["ls-tree", "-r", "-t", "--full-tree", &rev])?;
        Ok(out.lines().filter_map(parse_ls_tree_line).collect())
    }

    fn read(&self, branch: &str, path: &str) -> Result<String, SyncError> {
        let rev = self.revision(branch);
        self.git(&["show", &format!("{rev}:{path}")])
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String, SyncError> {
    let command = args.first().copied().unwrap_or_default().to_string();
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| SyncError::Git {
            command: command.clone(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(SyncError::Git {
            command,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `<mode> SP <type> SP <hash> TAB <path>`
fn parse_ls_tree_line(line: &str) -> Option<BlobEntry> {
    let (meta, path) = line.split_once('\t')?;
    let mut fields = meta.split_whitespace();
    let _mode = fields.next()?;
    let kind = match fields.next()? {
        "blob" => BlobKind::Blob,
        "tree" => BlobKind::Tree,
        _ => return None,
    };
    let hash = fields.next()?;
    Some(BlobEntry {
        path: path.to_string(),
        kind,
        content_hash: hash.to_string(),
    })
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryBlob {
    hash: String,
    content: Option<String>,
}

/// In-memory upstream used by tests and dry runs over fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    branches: BTreeMap<String, BTreeMap<String, MemoryBlob>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable file.
    pub fn with_file(mut self, branch: &str, path: &str, hash: &str, content: &str) -> Self {
        self.insert(branch, path, hash, Some(content.to_string()));
        self
    }

    /// Add a file that lists fine but fails to read.
    pub fn with_unreadable(mut self, branch: &str, path: &str, hash: &str) -> Self {
        self.insert(branch, path, hash, None);
        self
    }

    pub fn insert(&mut self, branch: &str, path: &str, hash: &str, content: Option<String>) {
        self.branches.entry(branch.to_string()).or_default().insert(
            path.to_string(),
            MemoryBlob {
                hash: hash.to_string(),
                content,
            },
        );
    }
}

impl RevisionSource for MemorySource {
    fn list(&self, branch: &str) -> Result<Vec<BlobEntry>, SyncError> {
        let files = self.branches.get(branch).ok_or_else(|| SyncError::Git {
            command: "ls-tree".into(),
            message: format!("unknown branch '{branch}'"),
        })?;
        let mut trees = BTreeSet::new();
        for path in files.keys() {
            let mut dir = path.as_str();
            while let Some((parent, _)) = dir.rsplit_once('/') {
                trees.insert(parent.to_string());
                dir = parent;
            }
        }
        let mut out: Vec<BlobEntry> = trees
            .into_iter()
            .map(|path| BlobEntry {
                path,
                kind: BlobKind::Tree,
                content_hash: String::new(),
            })
            .chain(files.iter().map(|(path, blob)| BlobEntry {
                path: path.clone(),
                kind: BlobKind::Blob,
                content_hash: blob.hash.clone(),
            }))
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn read(&self, branch: &str, path: &str) -> Result<String, SyncError> {
        self.branches
            .get(branch)
            .and_then(|files| files.get(path))
            .and_then(|blob| blob.content.clone())
            .ok_or_else(|| SyncError::Git {
                command: "show".into(),
                message: format!("cannot read {branch}:{path}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ls_tree_lines_parse() {
        let blob = parse_ls_tree_line("100644 blob 3b18e512dba79e4c8300dd08aeb37f8e728b8dad\tsrc/Foo/Bar.cs").unwrap();
        assert_eq!(blob.path, "src/Foo/Bar.cs");
        assert_eq!(blob.kind, BlobKind::Blob);
        assert_eq!(blob.content_hash, "3b18e512dba79e4c8300dd08aeb37f8e728b8dad");

        let tree = parse_ls_tree_line("040000 tree 9f2c\tsrc/Foo").unwrap();
        assert_eq!(tree.kind, BlobKind::Tree);

        assert!(parse_ls_tree_line("160000 commit abcd\tvendor/lib").is_none());
        assert!(parse_ls_tree_line("garbage").is_none());
    }

    #[test]
    fn memory_source_lists_trees_and_blobs() {
        let source = MemorySource::new()
            .with_file("main", "Foo/Bar.cs", "abc123", "namespace Foo {}")
            .with_unreadable("main", "Foo/Deep/Baz.cs", "def456");
        let listing = source.list("main").unwrap();
        let paths: Vec<&str> = listing.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["Foo", "Foo/Bar.cs", "Foo/Deep", "Foo/Deep/Baz.cs"]);
        assert_eq!(source.read("main", "Foo/Bar.cs").unwrap(), "namespace Foo {}");
        assert!(source.read("main", "Foo/Deep/Baz.cs").is_err());
        assert!(source.list("develop").is_err());
    }

    #[test]
    fn missing_checkout_has_no_marker() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(!GitRepo::new(tmp.path()).exists());
        std::fs::create_dir(tmp.path().join(CHECKOUT_MARKER)).unwrap();
        assert!(GitRepo::new(tmp.path()).exists());
    }
}
