//! Domain types for the project import registry and import config.
//!
//! All types are serializable/deserializable via serde + serde_yaml. The
//! registry document keeps camelCase keys so it stays hand-editable next to
//! the rest of a .NET tree.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::matcher::{self, AliasPredicate};
use crate::rewrite::{RewriteOp, Rewriter};

/// Name of the always-present rule set that collects ad hoc renames.
pub const DEFAULT_RULE_SET: &str = "default";

// ---------------------------------------------------------------------------
// File records
// ---------------------------------------------------------------------------

/// A pinned decision for one `(path, alias)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Target namespace, when it deviates from the namespace-map default.
    #[serde(default, rename = "namespace", skip_serializing_if = "Option::is_none")]
    pub namespace_override: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewriters: Vec<Rewriter>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            path: path.into(),
            alias,
            namespace_override: None,
            rewriters: Vec::new(),
        }
    }

    fn sort_key(&self) -> (&str, Option<&str>) {
        (self.path.as_str(), self.alias.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

/// A pattern-matched group of rewrite operations.
///
/// `include`/`includes`, `exclude`/`excludes` and `alias`/`aliases` are
/// accepted as singular or plural spellings and merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<AliasPredicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub rewriters: Vec<Rewriter>,
}

impl RuleSet {
    /// The always-present bucket for interactive rename decisions.
    pub fn default_bucket() -> Self {
        Self {
            name: Some(DEFAULT_RULE_SET.to_string()),
            ..Self::default()
        }
    }

    pub fn is_default(&self) -> bool {
        self.name.as_deref() == Some(DEFAULT_RULE_SET)
    }

    pub fn include_patterns(&self) -> Vec<String> {
        self.include.iter().chain(self.includes.iter()).cloned().collect()
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.exclude.iter().chain(self.excludes.iter()).cloned().collect()
    }

    /// `alias` and `aliases` folded into one predicate.
    pub fn alias_predicate(&self) -> Option<AliasPredicate> {
        let mut terms: Vec<String> = match &self.alias {
            Some(AliasPredicate::One(term)) => vec![term.clone()],
            Some(AliasPredicate::Many(terms)) => terms.clone(),
            None => Vec::new(),
        };
        terms.extend(self.aliases.iter().cloned());
        match terms.len() {
            0 => None,
            1 => terms.pop().map(AliasPredicate::One),
            _ => Some(AliasPredicate::Many(terms)),
        }
    }

    /// Does this rule set apply to `path` imported under `alias`?
    ///
    /// A rule set without include patterns is inert, except the default
    /// bucket, which applies everywhere.
    pub fn matches(&self, path: &str, alias: Option<&str>) -> Result<bool, RegistryError> {
        if !matcher::alias_matches(self.alias_predicate().as_ref(), alias) {
            return Ok(false);
        }
        let includes = self.include_patterns();
        if includes.is_empty() {
            return Ok(self.is_default());
        }
        matcher::included(&includes, &self.exclude_patterns(), path)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Root of the persisted import registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRegistry {
    #[serde(default)]
    pub namespace_map: BTreeMap<String, String>,
    #[serde(default)]
    pub file_records: Vec<FileRecord>,
    #[serde(default)]
    pub rule_sets: Vec<RuleSet>,
}

impl Default for ImportRegistry {
    fn default() -> Self {
        Self {
            namespace_map: BTreeMap::new(),
            file_records: Vec::new(),
            rule_sets: vec![RuleSet::default_bucket()],
        }
    }
}

impl ImportRegistry {
    /// Restore invariants after loading a hand-edited document: records
    /// sorted by path and a default rule set present.
    pub fn normalize(&mut self) {
        self.file_records
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        if !self.rule_sets.iter().any(RuleSet::is_default) {
            self.rule_sets.push(RuleSet::default_bucket());
        }
    }

    /// Insert a record keeping the list sorted by `(path, alias)`.
    pub fn insert_record(&mut self, record: FileRecord) -> Result<(), RegistryError> {
        match self
            .file_records
            .binary_search_by(|existing| existing.sort_key().cmp(&record.sort_key()))
        {
            Ok(_) => Err(RegistryError::DuplicateRecord {
                path: record.path,
                alias: record.alias,
            }),
            Err(idx) => {
                self.file_records.insert(idx, record);
                Ok(())
            }
        }
    }

    /// All records pinned to `path`, any alias. The records borrow from the
    /// registry only; `path` just has to outlive the iteration.
    pub fn records_for<'a, 'p>(&'a self, path: &'p str) -> impl Iterator<Item = &'a FileRecord> + 'p
    where
        'a: 'p,
    {
        self.file_records.iter().filter(move |r| r.path == path)
    }

    /// The single record for `(path, alias)`.
    ///
    /// Several records on one path with no alias to choose between them is
    /// an ambiguous mapping.
    pub fn find_record(
        &self,
        path: &str,
        alias: Option<&str>,
    ) -> Result<Option<&FileRecord>, RegistryError> {
        let on_path: Vec<&FileRecord> = self.records_for(path).collect();
        let exact: Vec<&FileRecord> = on_path
            .iter()
            .copied()
            .filter(|r| r.alias.as_deref() == alias)
            .collect();
        match exact.len() {
            1 => Ok(exact.into_iter().next()),
            0 if alias.is_none() && on_path.len() > 1 => Err(RegistryError::AmbiguousMapping {
                path: path.to_string(),
                count: on_path.len(),
            }),
            0 => Ok(None),
            count => Err(RegistryError::AmbiguousMapping {
                path: path.to_string(),
                count,
            }),
        }
    }

    /// Fail on the first `(path, alias)` pair pinned more than once.
    pub fn check_unique(&self) -> Result<(), RegistryError> {
        let mut keys: Vec<(&str, Option<&str>)> =
            self.file_records.iter().map(FileRecord::sort_key).collect();
        keys.sort();
        for pair in keys.windows(2) {
            if pair[0] == pair[1] {
                return Err(RegistryError::DuplicateRecord {
                    path: pair[0].0.to_string(),
                    alias: pair[0].1.map(str::to_string),
                });
            }
        }
        Ok(())
    }

    /// Rule sets applying to `(path, alias)`, in registry order.
    pub fn matching_rule_sets(
        &self,
        path: &str,
        alias: Option<&str>,
    ) -> Result<Vec<&RuleSet>, RegistryError> {
        let mut out = Vec::new();
        for rule_set in &self.rule_sets {
            if rule_set.matches(path, alias)? {
                out.push(rule_set);
            }
        }
        Ok(out)
    }

    /// The default bucket, created when a hand-edited document dropped it.
    pub fn default_rule_set_mut(&mut self) -> &mut RuleSet {
        let idx = match self.rule_sets.iter().position(RuleSet::is_default) {
            Some(idx) => idx,
            None => {
                self.rule_sets.push(RuleSet::default_bucket());
                self.rule_sets.len() - 1
            }
        };
        &mut self.rule_sets[idx]
    }

    /// Record an interactive type rename in the default bucket, once.
    pub fn add_default_rename(&mut self, from: &str, to: &str) -> bool {
        let rename = Rewriter::new(RewriteOp::RenameType {
            from: from.to_string(),
            to: to.to_string(),
        });
        let bucket = self.default_rule_set_mut();
        if bucket.rewriters.contains(&rename) {
            return false;
        }
        bucket.rewriters.push(rename);
        true
    }
}

// ---------------------------------------------------------------------------
// Import config
// ---------------------------------------------------------------------------

/// Per-target-project settings stored in `.graft/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConfig {
    /// Clone URL of the upstream repository.
    pub upstream: String,
    /// Browse URL prefix; provenance links are `remotePrefix/branch/path`.
    pub remote_prefix: String,
    pub branch: String,
    /// Namespace that maps onto the target root directory.
    pub base_namespace: String,
    /// Local upstream checkout. Relative paths resolve against the target root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<PathBuf>,
    #[serde(default = "default_source_glob")]
    pub source_glob: String,
    #[serde(default = "default_bundle_suffix")]
    pub bundle_suffix: String,
}

fn default_source_glob() -> String {
    "**/*.cs".to_string()
}

fn default_bundle_suffix() -> String {
    ".resx".to_string()
}

impl ImportConfig {
    pub fn new(
        upstream: impl Into<String>,
        remote_prefix: impl Into<String>,
        branch: impl Into<String>,
        base_namespace: impl Into<String>,
    ) -> Self {
        Self {
            upstream: upstream.into(),
            remote_prefix: remote_prefix.into(),
            branch: branch.into(),
            base_namespace: base_namespace.into(),
            checkout: None,
            source_glob: default_source_glob(),
            bundle_suffix: default_bundle_suffix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
