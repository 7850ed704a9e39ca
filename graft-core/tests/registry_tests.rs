//! Registry error-message, atomic-write-safety, and mutation integration tests.
//! Storage: <root>/.graft/registry.yaml

use assert_fs::prelude::*;
use graft_core::{
    registry, FileRecord, ImportConfig, ImportRegistry, RegistryError, RewriteOp, Rewriter,
};
use predicates::prelude::predicate;
use std::fs;

fn config() -> ImportConfig {
    ImportConfig::new(
        "https://git.example/upstream.git",
        "https://git.example/upstream/blob",
        "main",
        "Target",
    )
}

fn write_registry(root: &assert_fs::TempDir, text: &str) {
    let dir = root.path().join(".graft");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("registry.yaml"), text).expect("write");
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_registry(&root, ": : corrupt : yaml : !!!\n  - broken: [unclosed");

    let err = registry::load_at(root.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("registry.yaml"), "must contain file path, got: {msg}");
}

#[test]
fn load_wrong_type_yaml_returns_parse_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_registry(&root, "- this is a list, not a mapping\n");

    let err = registry::load_at(root.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "got: {err}");
}

#[test]
fn load_unknown_rewriter_kind_is_a_parse_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_registry(&root, "fileRecords:\n  - path: A.cs\n    rewriters:\n      - kind: teleport\n");

    let err = registry::load_at(root.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "got: {err}");
}

#[test]
fn empty_document_loads_as_empty_registry() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    write_registry(&root, "");
    let reg = registry::load_at(root.path()).expect("load");
    assert_eq!(reg, ImportRegistry::default());
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn mid_write_crash_leaves_original_intact() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    registry::save_at(root.path(), &ImportRegistry::default()).expect("save");

    let yaml_path = registry::registry_path_at(root.path());
    let original_bytes = fs::read(&yaml_path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = yaml_path.with_extension("yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    let current_bytes = fs::read(&yaml_path).expect("read after crash");
    assert_eq!(original_bytes, current_bytes, "original must be unchanged after crash");
    assert!(registry::load_at(root.path()).is_ok(), "orphan .tmp must not affect load");
}

#[test]
fn save_writes_records_sorted_by_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let mut reg = ImportRegistry::default();
    // Bypass insert_record to simulate a hand-edited, unsorted list.
    reg.file_records.push(FileRecord::new("z/Z.cs", None));
    reg.file_records.push(FileRecord::new("a/A.cs", None));
    registry::save_at(root.path(), &reg).expect("save");

    let text = fs::read_to_string(registry::registry_path_at(root.path())).expect("read");
    let a = text.find("a/A.cs").expect("a present");
    let z = text.find("z/Z.cs").expect("z present");
    assert!(a < z, "records must be written in path order:\n{text}");
}

// ---------------------------------------------------------------------------
// 3. Init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_registry() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    registry::init_at(root.path(), &config()).expect("init");

    root.child(".graft/config.yaml").assert(predicate::path::exists());
    root.child(".graft/registry.yaml").assert(predicate::path::exists());

    let loaded = registry::load_config_at(root.path()).expect("config");
    assert_eq!(loaded.source_glob, "**/*.cs");
    assert_eq!(loaded.bundle_suffix, ".resx");
}

// ---------------------------------------------------------------------------
// 4. Record lookup
// ---------------------------------------------------------------------------

#[test]
fn duplicate_pairs_are_detected() {
    let mut reg = ImportRegistry::default();
    reg.file_records.push(FileRecord::new("A.cs", Some("sync".into())));
    reg.file_records.push(FileRecord::new("A.cs", Some("sync".into())));
    let err = reg.check_unique().unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateRecord { .. }));
    assert!(err.to_string().contains("alias 'sync'"));
}

#[test]
fn aliased_records_resolve_by_alias() {
    let mut reg = ImportRegistry::default();
    let mut sync = FileRecord::new("A.cs", Some("sync".into()));
    sync.rewriters.push(Rewriter::new(RewriteOp::StripAsync));
    reg.insert_record(sync).unwrap();
    reg.insert_record(FileRecord::new("A.cs", Some("async".into()))).unwrap();

    let found = reg.find_record("A.cs", Some("sync")).unwrap().expect("record");
    assert_eq!(found.rewriters.len(), 1);
    assert!(reg.find_record("B.cs", None).unwrap().is_none());
}

#[test]
fn aliased_records_without_alias_are_ambiguous() {
    let mut reg = ImportRegistry::default();
    reg.insert_record(FileRecord::new("A.cs", Some("sync".into()))).unwrap();
    reg.insert_record(FileRecord::new("A.cs", Some("async".into()))).unwrap();

    let err = reg.find_record("A.cs", None).unwrap_err();
    assert!(matches!(err, RegistryError::AmbiguousMapping { count: 2, .. }));
}

#[test]
fn found_records_outlive_the_lookup_path() {
    let mut reg = ImportRegistry::default();
    reg.insert_record(FileRecord::new("Lib/A.cs", None)).unwrap();

    let found = {
        let path = format!("Lib/{}", "A.cs");
        reg.find_record(&path, None).unwrap()
    };
    let listed: Vec<&FileRecord> = {
        let path = String::from("Lib/A.cs");
        reg.records_for(&path).collect()
    };
    assert_eq!(found.map(|r| r.path.as_str()), Some("Lib/A.cs"));
    assert_eq!(listed.len(), 1);
}
