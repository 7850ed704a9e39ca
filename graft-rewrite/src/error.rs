//! Error types for graft-rewrite.

use thiserror::Error;

/// All errors that can arise while parsing, discovering or rewriting a file.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The C# grammar could not be loaded into the parser.
    #[error("failed to load C# grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser returned no tree (cancelled or timed out).
    #[error("failed to parse {file}")]
    Parse { file: String },

    /// Discovery found no namespace declaration.
    #[error("no namespace declaration in {file}")]
    NoNamespace { file: String },

    /// An operation parameter is not usable (bad regex, empty name, ...).
    #[error("invalid {kind} parameters: {message}")]
    InvalidParameters { kind: &'static str, message: String },

    /// `inline-resources` ran without a resolved bundle in the file context.
    #[error("inline-resources for bundle '{bundle}' has no resolved bundle")]
    MissingBundle { bundle: String },
}
