//! Candidate selection: pattern mode, reimport mode and the recency filter.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use graft_core::{matcher, provenance, ImportRegistry, ProvenanceHeader};
use walkdir::WalkDir;

use crate::error::{io_err, SyncError};
use crate::prompt::Prompter;
use crate::source::BlobEntry;

/// One `(path, alias, hash)` picked for an import pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub alias: Option<String>,
    /// Upstream content hash at the branch being imported.
    pub hash: String,
}

impl Candidate {
    pub fn new(path: impl Into<String>, alias: Option<String>, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias,
            hash: hash.into(),
        }
    }

    /// Human-readable line for a selection menu.
    pub fn label(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} [{}]", self.path, alias),
            None => self.path.clone(),
        }
    }

    fn key(&self) -> (&str, Option<&str>) {
        (self.path.as_str(), self.alias.as_deref())
    }
}

/// How many of the selected candidates to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    All,
    /// Ask the user to pick exactly one.
    Choose,
}

// ---------------------------------------------------------------------------
// Pattern mode
// ---------------------------------------------------------------------------

/// Every source blob matching `pattern`, without an alias.
///
/// Only files matching `source_glob` are sources; bundles and other
/// non-source blobs never become candidates.
pub fn select_by_pattern(
    listing: &[BlobEntry],
    pattern: &str,
    source_glob: &str,
) -> Result<Vec<Candidate>, SyncError> {
    let wanted = matcher::compile(pattern)?;
    let sources = matcher::compile(source_glob)?;
    let out: Vec<Candidate> = listing
        .iter()
        .filter(|e| e.is_blob())
        .filter(|e| matcher::path_matches(&sources, &e.path) && matcher::path_matches(&wanted, &e.path))
        .map(|e| Candidate::new(&e.path, None, &e.content_hash))
        .collect();
    if out.is_empty() {
        return Err(SyncError::NoCandidates {
            what: format!("no source file matches '{pattern}'"),
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Reimport mode
// ---------------------------------------------------------------------------

/// A previously generated output file, recovered from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub source_path: String,
    pub alias: Option<String>,
    pub output: PathBuf,
    pub modified: DateTime<Utc>,
    /// Upstream hash recorded when the file was generated.
    pub content_hash: String,
}

/// Scan `root` for generated files whose header points under
/// `remote_prefix/branch/`.
///
/// The `.graft` state directory and hidden directories are not searched.
/// Files without a header, or with a header for another prefix or branch,
/// are ignored.
pub fn scan_generated(root: &Path, remote_prefix: &str, branch: &str) -> Result<Vec<GeneratedFile>, SyncError> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
    });
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
            io_err(path, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        let Some(header) = ProvenanceHeader::decode(&text) else {
            continue;
        };
        let Some(source_path) = provenance::source_path_under(&header.remote_url, remote_prefix, branch) else {
            tracing::debug!("{} was generated from another branch or remote", entry.path().display());
            continue;
        };
        let modified = entry
            .metadata()
            .map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "metadata"));
                io_err(entry.path(), source)
            })?
            .modified()
            .map_err(|e| io_err(entry.path(), e))?;
        out.push(GeneratedFile {
            source_path,
            alias: header.alias,
            output: entry.path().to_path_buf(),
            modified: DateTime::<Utc>::from(modified),
            content_hash: header.content_hash,
        });
    }
    Ok(out)
}

/// Registry records that still exist upstream, with the current upstream
/// hash.
///
/// With `recent = Some((generated, n))` only the `n` candidates whose
/// generated output was modified most recently survive; candidates with no
/// generated output are dropped.
pub fn select_for_reimport(
    registry: &ImportRegistry,
    listing: &[BlobEntry],
    recent: Option<(&[GeneratedFile], usize)>,
) -> Result<Vec<Candidate>, SyncError> {
    registry.check_unique()?;

    let hashes: HashMap<&str, &str> = listing
        .iter()
        .filter(|e| e.is_blob())
        .map(|e| (e.path.as_str(), e.content_hash.as_str()))
        .collect();

    let mut out = Vec::new();
    for record in &registry.file_records {
        match hashes.get(record.path.as_str()) {
            Some(hash) => out.push(Candidate::new(&record.path, record.alias.clone(), *hash)),
            None => tracing::warn!("{} is no longer upstream; skipping", record.path),
        }
    }

    if let Some((generated, n)) = recent {
        out = most_recent(out, generated, n);
    }

    if out.is_empty() {
        return Err(SyncError::NoCandidates {
            what: match recent {
                Some(_) => "no recently generated file maps to a registry record".into(),
                None => "no registry record exists upstream".into(),
            },
        });
    }
    Ok(out)
}

fn most_recent(candidates: Vec<Candidate>, generated: &[GeneratedFile], n: usize) -> Vec<Candidate> {
    let mut latest: BTreeMap<(&str, Option<&str>), DateTime<Utc>> = BTreeMap::new();
    for file in generated {
        let key = (file.source_path.as_str(), file.alias.as_deref());
        let entry = latest.entry(key).or_insert(file.modified);
        if file.modified > *entry {
            *entry = file.modified;
        }
    }

    let mut dated: Vec<(DateTime<Utc>, Candidate)> = candidates
        .into_iter()
        .filter_map(|c| {
            let at = latest.get(&c.key()).copied()?;
            Some((at, c))
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.path.cmp(&b.1.path)));
    dated.truncate(n);
    dated.into_iter().map(|(_, c)| c).collect()
}

// ---------------------------------------------------------------------------
// Output mode
// ---------------------------------------------------------------------------

/// Apply the output mode; `Choose` asks for exactly one candidate.
pub fn choose(
    candidates: Vec<Candidate>,
    mode: OutputMode,
    prompter: &mut dyn Prompter,
) -> Result<Vec<Candidate>, SyncError> {
    if mode == OutputMode::All || candidates.len() <= 1 {
        return Ok(candidates);
    }
    let labels: Vec<String> = candidates.iter().map(Candidate::label).collect();
    let index = prompter.choose("Select a file to import", &labels, 0)?;
    Ok(candidates.into_iter().nth(index).into_iter().collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, Scripted};
    use crate::source::{MemorySource, RevisionSource};
    use chrono::TimeZone;
    use graft_core::FileRecord;

    fn listing() -> Vec<BlobEntry> {
        MemorySource::new()
            .with_file("main", "Foo/Bar.cs", "abc123", "")
            .with_file("main", "Foo/Baz.cs", "def456", "")
            .with_file("main", "Foo/Strings.resx", "0", "")
            .list("main")
            .unwrap()
    }

    fn generated(path: &str, alias: Option<&str>, secs: i64) -> GeneratedFile {
        GeneratedFile {
            source_path: path.into(),
            alias: alias.map(str::to_string),
            output: PathBuf::from(path),
            modified: Utc.timestamp_opt(secs, 0).unwrap(),
            content_hash: "old".into(),
        }
    }

    #[test]
    fn pattern_selects_only_source_blobs() {
        let found = select_by_pattern(&listing(), "*", "**/*.cs").unwrap();
        let paths: Vec<&str> = found.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["Foo/Bar.cs", "Foo/Baz.cs"]);
        assert!(found.iter().all(|c| c.alias.is_none()));
    }

    #[test]
    fn pattern_without_matches_fails() {
        let err = select_by_pattern(&listing(), "Nope/*.cs", "**/*.cs").unwrap_err();
        assert!(matches!(err, SyncError::NoCandidates { .. }));
    }

    #[test]
    fn reimport_uses_current_upstream_hash() {
        let mut reg = ImportRegistry::default();
        reg.insert_record(FileRecord::new("Foo/Bar.cs", None)).unwrap();
        reg.insert_record(FileRecord::new("Gone/Old.cs", None)).unwrap();
        let found = select_for_reimport(&reg, &listing(), None).unwrap();
        assert_eq!(found, vec![Candidate::new("Foo/Bar.cs", None, "abc123")]);
    }

    #[test]
    fn reimport_rejects_duplicate_records() {
        let mut reg = ImportRegistry::default();
        reg.file_records.push(FileRecord::new("Foo/Bar.cs", None));
        reg.file_records.push(FileRecord::new("Foo/Bar.cs", None));
        let err = select_for_reimport(&reg, &listing(), None).unwrap_err();
        assert!(matches!(err, SyncError::Registry(graft_core::RegistryError::DuplicateRecord { .. })));
    }

    #[test]
    fn recency_filter_keeps_newest_and_joins_on_alias() {
        let mut reg = ImportRegistry::default();
        reg.insert_record(FileRecord::new("Foo/Bar.cs", Some("sync".into()))).unwrap();
        reg.insert_record(FileRecord::new("Foo/Bar.cs", None)).unwrap();
        reg.insert_record(FileRecord::new("Foo/Baz.cs", None)).unwrap();
        let files = vec![
            generated("Foo/Bar.cs", None, 100),
            generated("Foo/Baz.cs", None, 300),
            generated("Foo/Bar.cs", Some("sync"), 200),
        ];
        let found = select_for_reimport(&reg, &listing(), Some((files.as_slice(), 2))).unwrap();
        let labels: Vec<String> = found.iter().map(Candidate::label).collect();
        assert_eq!(labels, vec!["Foo/Baz.cs", "Foo/Bar.cs [sync]"]);
    }

    #[test]
    fn recency_filter_without_generated_files_fails() {
        let mut reg = ImportRegistry::default();
        reg.insert_record(FileRecord::new("Foo/Bar.cs", None)).unwrap();
        let err = select_for_reimport(&reg, &listing(), Some((Vec::new().as_slice(), 1))).unwrap_err();
        assert!(matches!(err, SyncError::NoCandidates { .. }));
    }

    #[test]
    fn choose_returns_exactly_one() {
        let candidates = select_by_pattern(&listing(), "*", "**/*.cs").unwrap();
        let mut prompter = Scripted::new([Answer::Choice(1)]);
        let picked = choose(candidates.clone(), OutputMode::Choose, &mut prompter).unwrap();
        assert_eq!(picked, vec![candidates[1].clone()]);
        let all = choose(candidates.clone(), OutputMode::All, &mut prompter).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn scan_reads_headers_and_skips_state_dir() {
        let root = tempfile::TempDir::new().unwrap();
        let header = ProvenanceHeader::new("https://git.example/r", "main", "Foo/Bar.cs", "abc123", None);
        std::fs::create_dir_all(root.path().join("Foo")).unwrap();
        std::fs::write(root.path().join("Foo/Bar.cs"), format!("{}namespace T {{}}\n", header.encode())).unwrap();
        std::fs::create_dir_all(root.path().join(".graft")).unwrap();
        std::fs::write(root.path().join(".graft/Copy.cs"), header.encode()).unwrap();
        std::fs::write(root.path().join("Plain.cs"), "namespace T {}\n").unwrap();
        let other = ProvenanceHeader::new("https://git.example/r", "dev", "Foo/Dev.cs", "1", None);
        std::fs::write(root.path().join("Dev.cs"), other.encode()).unwrap();

        let found = scan_generated(root.path(), "https://git.example/r", "main").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_path, "Foo/Bar.cs");
        assert_eq!(found[0].content_hash, "abc123");
    }
}
