//! Error types for graft-sync.

use std::path::PathBuf;

use thiserror::Error;

use graft_core::RegistryError;
use graft_rewrite::RewriteError;

/// All errors that can arise from selection, assembly and writing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the registry or config layer.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An error from the rewrite engine.
    #[error("rewrite error: {0}")]
    Rewrite(#[from] RewriteError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `git` invocation failed or could not be started.
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    /// Selection produced nothing to import.
    #[error("no candidates found ({what})")]
    NoCandidates { what: String },

    /// A resource bundle could not be decoded.
    #[error("failed to read resource bundle {path}: {message}")]
    Resource { path: String, message: String },

    /// The target namespace does not live under the configured base.
    #[error("target namespace '{namespace}' is not under base namespace '{base}'")]
    OutsideBase { namespace: String, base: String },

    /// A prompt could not be answered.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
