//! Error types for graft-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from registry and config operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure, annotated with the path being accessed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The import config did not exist at the expected path.
    #[error("import config not found at {path}; run `graft init` first")]
    ConfigNotFound { path: PathBuf },

    /// Two file records share the same `(path, alias)` pair.
    #[error("duplicate file record for '{path}'{}", alias_suffix(.alias))]
    DuplicateRecord { path: String, alias: Option<String> },

    /// Several file records share a path and the alias does not pick one.
    #[error("ambiguous file mapping for '{path}': {count} records and no alias to pick one")]
    AmbiguousMapping { path: String, count: usize },

    /// A rule-set include/exclude pattern is not a valid glob.
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A bare-string rewriter shorthand names no parameterless operation.
    #[error("unknown rewriter shorthand '{0}'")]
    UnknownShorthand(String),
}

fn alias_suffix(alias: &Option<String>) -> String {
    match alias {
        Some(alias) => format!(" (alias '{alias}')"),
        None => String::new(),
    }
}

/// Convenience constructor for [`RegistryError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
