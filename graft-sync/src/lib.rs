//! # graft-sync
//!
//! Candidate selection, settings resolution, pipeline assembly and the
//! atomic output writer.
//!
//! Call [`pipeline::run`] to import or reimport files into a target project,
//! or [`status::check_at`] to compare generated output against upstream.

pub mod assembler;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod resources;
pub mod selection;
pub mod settings;
pub mod source;
pub mod status;
pub mod target;
pub mod writer;

pub use error::SyncError;
pub use pipeline::{run, Emit, FileReport, Outcome, RunOptions, RunSummary, SelectionMode};
pub use prompt::{AcceptDefaults, Prompter};
pub use selection::{Candidate, OutputMode};
pub use source::{BlobEntry, BlobKind, FetchOutcome, GitRepo, MemorySource, RevisionSource};
pub use writer::WriteResult;
