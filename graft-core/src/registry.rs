//! Per-target-project YAML registry and import config.
//!
//! # Storage layout
//!
//! ```text
//! <target root>/
//!   .graft/
//!     config.yaml     (upstream URL, remote prefix, branch, base namespace)
//!     registry.yaml   (namespace map, file records, rule sets)
//!     upstream/       (default checkout of the upstream repository)
//! ```
//!
//! Both documents are written with the same atomic `.tmp` + rename flow.
//! The registry is re-serialized in full on every save with file records
//! sorted, so diffs of `registry.yaml` stay readable.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, RegistryError};
use crate::types::{ImportConfig, ImportRegistry};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<root>/.graft/`
pub fn state_dir_at(root: &Path) -> PathBuf {
    root.join(".graft")
}

/// `<root>/.graft/registry.yaml`: pure, no I/O.
pub fn registry_path_at(root: &Path) -> PathBuf {
    state_dir_at(root).join("registry.yaml")
}

/// `<root>/.graft/config.yaml`: pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    state_dir_at(root).join("config.yaml")
}

/// Resolved upstream checkout directory for `config`.
pub fn checkout_dir_at(root: &Path, config: &ImportConfig) -> PathBuf {
    match &config.checkout {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => root.join(dir),
        None => state_dir_at(root).join("upstream"),
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the registry for the target project at `root`.
///
/// A missing document is not an error and yields an empty registry;
/// malformed YAML is a [`RegistryError::Parse`] carrying the path.
pub fn load_at(root: &Path) -> Result<ImportRegistry, RegistryError> {
    let path = registry_path_at(root);
    if !path.exists() {
        return Ok(ImportRegistry::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let mut registry: ImportRegistry = if contents.trim().is_empty() {
        ImportRegistry::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })?
    };
    registry.normalize();
    Ok(registry)
}

/// Load the import config for the target project at `root`.
pub fn load_config_at(root: &Path) -> Result<ImportConfig, RegistryError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Err(RegistryError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the registry to `<root>/.graft/registry.yaml`.
pub fn save_at(root: &Path, registry: &ImportRegistry) -> Result<(), RegistryError> {
    let mut sorted = registry.clone();
    sorted.normalize();
    write_yaml_atomic(&registry_path_at(root), &sorted)
}

/// Atomically save the import config to `<root>/.graft/config.yaml`.
pub fn save_config_at(root: &Path, config: &ImportConfig) -> Result<(), RegistryError> {
    write_yaml_atomic(&config_path_at(root), config)
}

/// Write flow: serialize → `.yaml.tmp` sibling → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem).
fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), RegistryError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let tmp_path = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(value)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Write `config` and an empty registry under `root`.
///
/// Idempotent for the registry: an existing `registry.yaml` is kept as is.
pub fn init_at(root: &Path, config: &ImportConfig) -> Result<ImportRegistry, RegistryError> {
    save_config_at(root, config)?;
    if registry_path_at(root).exists() {
        return load_at(root);
    }
    let registry = ImportRegistry::default();
    save_at(root, &registry)?;
    Ok(registry)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
