//! graft core library: registry model, persistence, matching, provenance.
//!
//! - [`types`]: registry document, file records, rule sets, import config
//! - [`rewrite`]: declarative schema of the rewrite-operation catalog
//! - [`registry`]: load / save / init under `<root>/.graft/`
//! - [`matcher`]: glob and alias predicates
//! - [`provenance`]: generated-file header codec
//! - [`naming`]: the file-type naming predicate
//! - [`error`]: [`RegistryError`]

pub mod error;
pub mod matcher;
pub mod naming;
pub mod provenance;
pub mod registry;
pub mod rewrite;
pub mod types;

pub use error::RegistryError;
pub use matcher::AliasPredicate;
pub use provenance::ProvenanceHeader;
pub use rewrite::{RewriteOp, Rewriter};
pub use types::{FileRecord, ImportConfig, ImportRegistry, RuleSet, DEFAULT_RULE_SET};
