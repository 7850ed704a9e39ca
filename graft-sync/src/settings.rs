//! Per-file import settings and the interactive registry decisions behind
//! them.
//!
//! This is the only code that mutates the registry during a run, and it
//! runs on one thread.

use std::path::{Path, PathBuf};

use graft_core::{FileRecord, ImportConfig, ImportRegistry, RewriteOp};
use graft_rewrite::Discovery;

use crate::error::SyncError;
use crate::prompt::Prompter;
use crate::selection::Candidate;
use crate::target::{self, is_under_base};

/// Everything the assembler needs to know about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImportSettings {
    pub source_namespace: String,
    pub source_path: String,
    pub source_type: Option<String>,
    pub source_hash: String,
    pub target_namespace: String,
    /// Output path before any `rename-type` renames the file.
    pub target_path: PathBuf,
    pub alias: Option<String>,
}

impl FileImportSettings {
    /// Base name of the upstream file.
    pub fn source_file_name(&self) -> &str {
        self.source_path.rsplit('/').next().unwrap_or(&self.source_path)
    }
}

/// Work out where `candidate` goes, asking the user where the registry has
/// no answer yet.
///
/// Target namespace precedence: the record's own override, then the first
/// matching rule set's `namespace`, then the namespace map, then a prompt.
/// A never-seen path gets a new record carrying only the overrides that
/// deviate from those defaults.
pub fn resolve_settings(
    registry: &mut ImportRegistry,
    config: &ImportConfig,
    root: &Path,
    candidate: &Candidate,
    discovery: &Discovery,
    prompter: &mut dyn Prompter,
) -> Result<FileImportSettings, SyncError> {
    let path = candidate.path.as_str();
    let alias = candidate.alias.as_deref();
    let source_ns = discovery.namespace.as_str();

    let pinned = registry
        .find_record(path, alias)?
        .map(|record| record.namespace_override.clone());
    let seen = pinned.is_some();
    let default_ns = default_namespace(registry, path, alias, source_ns)?;

    let target_ns = match (pinned.flatten(), &default_ns) {
        (Some(ns), _) => ns,
        (None, Some(ns)) => ns.clone(),
        (None, None) => {
            let ns = ask_namespace(config, source_ns, prompter)?;
            let question = format!("Map namespace {source_ns} to {ns} for every file?");
            if prompter.confirm(&question, true)? {
                registry.namespace_map.insert(source_ns.to_string(), ns.clone());
            }
            ns
        }
    };
    // The prompt may just have added a namespace-map entry.
    let deviates = default_namespace(registry, path, alias, source_ns)?.as_deref() != Some(target_ns.as_str());

    if seen {
        if deviates {
            pin_namespace(registry, path, alias, &target_ns);
        }
    } else {
        if let Some(ty) = &discovery.primary_type {
            ask_type_rename(registry, ty, prompter)?;
        }
        let mut record = FileRecord::new(path, candidate.alias.clone());
        if deviates {
            record.namespace_override = Some(target_ns.clone());
        }
        tracing::debug!("recording {}", candidate.label());
        registry.insert_record(record)?;
    }

    let mut settings = FileImportSettings {
        source_namespace: source_ns.to_string(),
        source_path: path.to_string(),
        source_type: discovery.primary_type.clone(),
        source_hash: candidate.hash.clone(),
        target_namespace: target_ns,
        target_path: PathBuf::new(),
        alias: candidate.alias.clone(),
    };
    settings.target_path = target::resolve(
        root,
        &config.base_namespace,
        &settings.target_namespace,
        settings.source_file_name(),
    )?;
    Ok(settings)
}

/// Namespace this file gets without a per-file override.
fn default_namespace(
    registry: &ImportRegistry,
    path: &str,
    alias: Option<&str>,
    source_ns: &str,
) -> Result<Option<String>, SyncError> {
    let from_rules = registry
        .matching_rule_sets(path, alias)?
        .into_iter()
        .find_map(|rule_set| rule_set.namespace.clone());
    Ok(from_rules.or_else(|| registry.namespace_map.get(source_ns).cloned()))
}

fn pin_namespace(registry: &mut ImportRegistry, path: &str, alias: Option<&str>, ns: &str) {
    if let Some(record) = registry
        .file_records
        .iter_mut()
        .find(|r| r.path == path && r.alias.as_deref() == alias)
    {
        record.namespace_override = Some(ns.to_string());
    }
}

/// `source_ns` when it already lives under the base, else `base.source_ns`.
pub fn suggested_namespace(base: &str, source_ns: &str) -> String {
    if base.is_empty() || is_under_base(source_ns, base) {
        source_ns.to_string()
    } else {
        format!("{base}.{source_ns}")
    }
}

fn ask_namespace(config: &ImportConfig, source_ns: &str, prompter: &mut dyn Prompter) -> Result<String, SyncError> {
    let suggestion = suggested_namespace(&config.base_namespace, source_ns);
    let question = format!("Target namespace for {source_ns}");
    let answer = prompter.input(&question, Some(&suggestion))?;
    let answer = answer.trim().to_string();
    if !is_under_base(&answer, &config.base_namespace) {
        return Err(SyncError::OutsideBase {
            namespace: answer,
            base: config.base_namespace.clone(),
        });
    }
    Ok(answer)
}

/// Offer to rename the file's type, once per type across the project.
fn ask_type_rename(registry: &mut ImportRegistry, ty: &str, prompter: &mut dyn Prompter) -> Result<(), SyncError> {
    let already = registry.rule_sets.iter().filter(|r| r.is_default()).any(|bucket| {
        bucket
            .rewriters
            .iter()
            .any(|rw| matches!(&rw.op, RewriteOp::RenameType { from, .. } if from == ty))
    });
    if already {
        return Ok(());
    }
    let answer = prompter.input(&format!("Type name for {ty}"), Some(ty))?;
    let answer = answer.trim();
    if !answer.is_empty() && answer != ty && registry.add_default_rename(ty, answer) {
        tracing::info!("renaming type {} to {}", ty, answer);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{AcceptDefaults, Answer, Scripted};
    use graft_core::RuleSet;

    fn config() -> ImportConfig {
        ImportConfig::new("u", "https://git.example/r", "main", "Target")
    }

    fn discovery(ns: &str, ty: Option<&str>) -> Discovery {
        Discovery {
            namespace: ns.into(),
            primary_type: ty.map(str::to_string),
        }
    }

    fn candidate(path: &str) -> Candidate {
        Candidate::new(path, None, "abc123")
    }

    #[test]
    fn suggestion_nests_foreign_namespaces_under_base() {
        assert_eq!(suggested_namespace("Target", "Foo"), "Target.Foo");
        assert_eq!(suggested_namespace("Target", "Target.Foo"), "Target.Foo");
        assert_eq!(suggested_namespace("Target", "TargetX"), "Target.TargetX");
    }

    #[test]
    fn new_path_prompts_and_persists_namespace_map() {
        let mut reg = ImportRegistry::default();
        let mut prompter = Scripted::new([Answer::Default, Answer::Yes(true), Answer::Default]);
        let settings = resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Bar.cs"),
            &discovery("Foo", Some("Bar")),
            &mut prompter,
        )
        .unwrap();

        assert_eq!(settings.target_namespace, "Target.Foo");
        assert_eq!(settings.target_path, PathBuf::from("/out/Foo/Bar.cs"));
        assert_eq!(reg.namespace_map.get("Foo").map(String::as_str), Some("Target.Foo"));
        assert_eq!(reg.file_records.len(), 1);
        assert_eq!(reg.file_records[0].namespace_override, None);
        assert_eq!(prompter.asked.len(), 3);
    }

    #[test]
    fn declining_the_map_pins_an_override() {
        let mut reg = ImportRegistry::default();
        let mut prompter = Scripted::new([Answer::Text("Target.Special".into()), Answer::Yes(false)]);
        resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Bar.cs"),
            &discovery("Foo", None),
            &mut prompter,
        )
        .unwrap();
        assert!(reg.namespace_map.is_empty());
        assert_eq!(reg.file_records[0].namespace_override.as_deref(), Some("Target.Special"));
    }

    #[test]
    fn mapped_namespace_is_reused_without_prompting() {
        let mut reg = ImportRegistry::default();
        reg.namespace_map.insert("Foo".into(), "Target.Foo".into());
        reg.add_default_rename("Bar", "Baz");
        let mut prompter = Scripted::new([]);
        let settings = resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Bar.cs"),
            &discovery("Foo", Some("Bar")),
            &mut prompter,
        )
        .unwrap();
        assert_eq!(settings.target_namespace, "Target.Foo");
        assert!(prompter.asked.is_empty(), "asked: {:?}", prompter.asked);
    }

    #[test]
    fn type_rename_goes_to_default_bucket() {
        let mut reg = ImportRegistry::default();
        reg.namespace_map.insert("Foo".into(), "Target.Foo".into());
        let mut prompter = Scripted::new([Answer::Text("Gadget".into())]);
        resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Widget.cs"),
            &discovery("Foo", Some("Widget")),
            &mut prompter,
        )
        .unwrap();
        let bucket = reg.rule_sets.iter().find(|r| r.is_default()).unwrap();
        assert_eq!(
            bucket.rewriters[0].op,
            RewriteOp::RenameType {
                from: "Widget".into(),
                to: "Gadget".into()
            }
        );
    }

    #[test]
    fn rule_set_namespace_beats_namespace_map() {
        let mut reg = ImportRegistry::default();
        reg.namespace_map.insert("Foo".into(), "Target.Foo".into());
        reg.rule_sets.push(RuleSet {
            include: Some("Foo/**".into()),
            namespace: Some("Target.Ruled".into()),
            ..RuleSet::default()
        });
        let settings = resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Bar.cs"),
            &discovery("Foo", None),
            &mut AcceptDefaults,
        )
        .unwrap();
        assert_eq!(settings.target_namespace, "Target.Ruled");
        assert_eq!(reg.file_records[0].namespace_override, None);
    }

    #[test]
    fn pinned_override_wins_and_is_outside_base_checked() {
        let mut reg = ImportRegistry::default();
        let mut record = FileRecord::new("Foo/Bar.cs", None);
        record.namespace_override = Some("Elsewhere".into());
        reg.insert_record(record).unwrap();
        let err = resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Bar.cs"),
            &discovery("Foo", None),
            &mut AcceptDefaults,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::OutsideBase { .. }));
    }

    #[test]
    fn non_interactive_run_without_mapping_uses_suggestion() {
        let mut reg = ImportRegistry::default();
        let settings = resolve_settings(
            &mut reg,
            &config(),
            Path::new("/out"),
            &candidate("Foo/Bar.cs"),
            &discovery("Foo", Some("Bar")),
            &mut AcceptDefaults,
        )
        .unwrap();
        assert_eq!(settings.target_namespace, "Target.Foo");
        assert_eq!(reg.namespace_map.get("Foo").map(String::as_str), Some("Target.Foo"));
    }
}
