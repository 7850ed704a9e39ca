//! Per-record drift detection for `graft status`.
//!
//! Classification precedence:
//! 1. `MissingUpstream` (the record's path is gone from the branch)
//! 2. `NotGenerated` (no output file carries a header for the record)
//! 3. `Drifted` (header hash differs from the current upstream hash)
//! 4. `Current`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use graft_core::{ImportConfig, ImportRegistry};
use serde::Serialize;

use crate::error::SyncError;
use crate::selection::{scan_generated, GeneratedFile};
use crate::source::{BlobEntry, RevisionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Current,
    Drifted,
    MissingUpstream,
    NotGenerated,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Current => "current",
            RecordStatus::Drifted => "drifted",
            RecordStatus::MissingUpstream => "missing-upstream",
            RecordStatus::NotGenerated => "not-generated",
        }
    }
}

/// Status of one file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Classify every record in `registry`, in registry order.
pub fn check(registry: &ImportRegistry, listing: &[BlobEntry], generated: &[GeneratedFile]) -> Vec<StatusEntry> {
    let upstream: HashMap<&str, &str> = listing
        .iter()
        .filter(|e| e.is_blob())
        .map(|e| (e.path.as_str(), e.content_hash.as_str()))
        .collect();
    let mut outputs: HashMap<(&str, Option<&str>), &GeneratedFile> = HashMap::new();
    for file in generated {
        let key = (file.source_path.as_str(), file.alias.as_deref());
        let newer = outputs.get(&key).map_or(true, |seen| file.modified > seen.modified);
        if newer {
            outputs.insert(key, file);
        }
    }

    registry
        .file_records
        .iter()
        .map(|record| {
            let upstream_hash = upstream.get(record.path.as_str()).copied();
            let output = outputs.get(&(record.path.as_str(), record.alias.as_deref())).copied();
            let status = match (upstream_hash, output) {
                (None, _) => RecordStatus::MissingUpstream,
                (Some(_), None) => RecordStatus::NotGenerated,
                (Some(hash), Some(file)) if file.content_hash == hash => RecordStatus::Current,
                (Some(_), Some(_)) => RecordStatus::Drifted,
            };
            StatusEntry {
                path: record.path.clone(),
                alias: record.alias.clone(),
                status,
                output: output.map(|f| f.output.clone()),
                imported_hash: output.map(|f| f.content_hash.clone()),
                upstream_hash: upstream_hash.map(str::to_string),
                generated_at: output.map(|f| f.modified),
            }
        })
        .collect()
}

/// List the branch, scan `root` for output and classify every record.
pub fn check_at(
    root: &Path,
    config: &ImportConfig,
    registry: &ImportRegistry,
    source: &dyn RevisionSource,
    branch: &str,
) -> Result<Vec<StatusEntry>, SyncError> {
    let listing = source.list(branch)?;
    let generated = scan_generated(root, &config.remote_prefix, branch)?;
    Ok(check(registry, &listing, &generated))
}

/// Short age such as `42s`, `5m`, `3h` or `2d`.
pub fn format_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::TimeZone;
    use graft_core::FileRecord;

    fn generated(path: &str, hash: &str) -> GeneratedFile {
        GeneratedFile {
            source_path: path.into(),
            alias: None,
            output: PathBuf::from("/out").join(path),
            modified: Utc.timestamp_opt(1_000, 0).unwrap(),
            content_hash: hash.into(),
        }
    }

    #[test]
    fn each_record_is_classified() {
        let source = MemorySource::new()
            .with_file("main", "A.cs", "h1", "")
            .with_file("main", "B.cs", "h2", "")
            .with_file("main", "C.cs", "h3", "");
        let listing = source.list("main").unwrap();
        let mut reg = ImportRegistry::default();
        for path in ["A.cs", "B.cs", "C.cs", "Gone.cs"] {
            reg.insert_record(FileRecord::new(path, None)).unwrap();
        }
        let files = vec![generated("A.cs", "h1"), generated("B.cs", "old")];

        let statuses: Vec<RecordStatus> = check(&reg, &listing, &files).into_iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                RecordStatus::Current,
                RecordStatus::Drifted,
                RecordStatus::NotGenerated,
                RecordStatus::MissingUpstream,
            ]
        );
    }

    #[test]
    fn status_serializes_kebab_case() {
        let yaml = serde_yaml::to_string(&RecordStatus::MissingUpstream).unwrap();
        assert_eq!(yaml.trim(), RecordStatus::MissingUpstream.as_str());
    }

    #[test]
    fn format_seconds_buckets() {
        assert_eq!(format_seconds(5), "5s");
        assert_eq!(format_seconds(120), "2m");
        assert_eq!(format_seconds(7_200), "2h");
        assert_eq!(format_seconds(172_800), "2d");
    }
}
