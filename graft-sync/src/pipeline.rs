//! Import run entrypoint shared by `graft import`, `reimport` and `diff`.
//!
//! A run has three phases:
//!
//! 1. **load** (parallel): read, parse and discover every candidate.
//! 2. **settle** (single thread): resolve settings, prompting and mutating
//!    the registry. Nothing else touches the registry while it is mutable.
//! 3. **emit** (parallel): assemble, rewrite and write or diff each file
//!    against the now read-only registry.
//!
//! The registry is saved once, after every file is done, and only when the
//! run actually writes.

use std::path::{Path, PathBuf};

use graft_core::{registry, ImportConfig, ImportRegistry};
use graft_rewrite::{apply_all, discover, Discovery, SyntaxDoc};
use rayon::prelude::*;

use crate::assembler::assemble;
use crate::diff::{diff_output, FileDiff};
use crate::error::SyncError;
use crate::prompt::Prompter;
use crate::resources::ResourceResolver;
use crate::selection::{self, Candidate, OutputMode};
use crate::settings::{resolve_settings, FileImportSettings};
use crate::source::RevisionSource;
use crate::writer::{write_output, WriteResult};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Where candidates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Upstream files matching a glob; `None` means every source file.
    Pattern(Option<String>),
    /// Files already in the registry, optionally only the `last` N most
    /// recently generated.
    Reimport { last: Option<usize> },
}

/// What happens to each rewritten file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Write,
    DryRun,
    Diff,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub selection: SelectionMode,
    pub output: OutputMode,
    pub emit: Emit,
    /// Overrides the configured branch for this run.
    pub branch: Option<String>,
}

impl RunOptions {
    pub fn new(selection: SelectionMode) -> Self {
        Self {
            selection,
            output: OutputMode::All,
            emit: Emit::Write,
            branch: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Wrote(WriteResult),
    /// `None` when the output is already up to date.
    Diffed(Option<FileDiff>),
    /// Content could not be read or has no namespace.
    Skipped { reason: String },
    /// A configuration error aborted this file.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub alias: Option<String>,
    pub outcome: Outcome,
}

impl FileReport {
    fn new(candidate: &Candidate, outcome: Outcome) -> Self {
        Self {
            path: candidate.path.clone(),
            alias: candidate.alias.clone(),
            outcome,
        }
    }
}

/// Everything a run did, one report per selected candidate.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
    pub registry_saved: bool,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Wrote(WriteResult::Written { .. } | WriteResult::WouldWrite { .. })))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Wrote(WriteResult::Unchanged { .. }) | Outcome::Diffed(None)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn diffs(&self) -> impl Iterator<Item = &FileDiff> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            Outcome::Diffed(Some(diff)) => Some(diff),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct Loaded {
    candidate: Candidate,
    doc: SyntaxDoc,
    discovery: Discovery,
}

struct Settled {
    candidate: Candidate,
    doc: SyntaxDoc,
    settings: FileImportSettings,
}

/// Run one import pass for the target project at `root`.
///
/// Errors returned here are fatal for the whole run: registry load or save,
/// listing the branch, or an empty selection. Per-file problems are
/// reported in the summary instead.
pub fn run(
    root: &Path,
    config: &ImportConfig,
    source: &dyn RevisionSource,
    options: &RunOptions,
    prompter: &mut dyn Prompter,
) -> Result<RunSummary, SyncError> {
    let branch = options.branch.as_deref().unwrap_or(&config.branch);
    let mut registry = registry::load_at(root)?;
    let listing = source.list(branch)?;

    let candidates = match &options.selection {
        SelectionMode::Pattern(pattern) => {
            let pattern = pattern.as_deref().unwrap_or(&config.source_glob);
            selection::select_by_pattern(&listing, pattern, &config.source_glob)?
        }
        SelectionMode::Reimport { last } => {
            let generated = match last {
                Some(_) => selection::scan_generated(root, &config.remote_prefix, branch)?,
                None => Vec::new(),
            };
            let recent = last.map(|n| (generated.as_slice(), n));
            selection::select_for_reimport(&registry, &listing, recent)?
        }
    };
    let candidates = selection::choose(candidates, options.output, prompter)?;
    tracing::info!("{} file(s) selected on {}", candidates.len(), branch);

    let mut reports = Vec::new();

    // Phase 1: load.
    let loaded: Vec<Result<Loaded, FileReport>> = candidates
        .into_par_iter()
        .map(|candidate| load(source, branch, candidate))
        .collect();

    // Phase 2: settle.
    let mut settled = Vec::new();
    for item in loaded {
        let Loaded {
            candidate,
            doc,
            discovery,
        } = match item {
            Ok(loaded) => loaded,
            Err(report) => {
                reports.push(report);
                continue;
            }
        };
        match resolve_settings(&mut registry, config, root, &candidate, &discovery, prompter) {
            Ok(settings) => settled.push(Settled {
                candidate,
                doc,
                settings,
            }),
            Err(err) => {
                tracing::error!("{}: {}", candidate.label(), err);
                reports.push(FileReport::new(&candidate, Outcome::Failed { error: err.to_string() }));
            }
        }
    }

    // Phase 3: emit.
    let resources = ResourceResolver::discover(source, branch, &listing, &config.bundle_suffix);
    let registry_ref = &registry;
    let emitted: Vec<FileReport> = settled
        .into_par_iter()
        .map(|item| {
            let outcome = match emit(item.doc, &item.settings, registry_ref, config, branch, &resources, root, options.emit) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!("{}: {}", item.candidate.label(), err);
                    Outcome::Failed { error: err.to_string() }
                }
            };
            FileReport::new(&item.candidate, outcome)
        })
        .collect();
    reports.extend(emitted);
    reports.sort_by(|a, b| (&a.path, &a.alias).cmp(&(&b.path, &b.alias)));

    let registry_saved = options.emit == Emit::Write;
    if registry_saved {
        registry::save_at(root, &registry)?;
    }

    let summary = RunSummary {
        reports,
        registry_saved,
    };
    tracing::info!(
        written = summary.written(),
        unchanged = summary.unchanged(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "run complete"
    );
    Ok(summary)
}

fn load(source: &dyn RevisionSource, branch: &str, candidate: Candidate) -> Result<Loaded, FileReport> {
    let skip = |candidate: &Candidate, reason: String| {
        tracing::warn!("skipping {}: {}", candidate.label(), reason);
        FileReport::new(candidate, Outcome::Skipped { reason })
    };
    let text = match source.read(branch, &candidate.path) {
        Ok(text) => text,
        Err(err) => return Err(skip(&candidate, err.to_string())),
    };
    let file_name = candidate.path.rsplit('/').next().unwrap_or(&candidate.path).to_string();
    let doc = match SyntaxDoc::parse(file_name, text) {
        Ok(doc) => doc,
        Err(err) => return Err(skip(&candidate, err.to_string())),
    };
    if doc.has_errors() {
        tracing::debug!("{} parsed with syntax errors", candidate.path);
    }
    match discover(&doc) {
        Ok(discovery) => Ok(Loaded {
            candidate,
            doc,
            discovery,
        }),
        Err(err) => Err(skip(&candidate, err.to_string())),
    }
}

#[allow(clippy::too_many_arguments)]
fn emit(
    doc: SyntaxDoc,
    settings: &FileImportSettings,
    registry: &ImportRegistry,
    config: &ImportConfig,
    branch: &str,
    resources: &ResourceResolver<'_>,
    root: &Path,
    mode: Emit,
) -> Result<Outcome, SyncError> {
    let pipeline = assemble(settings, registry, &config.remote_prefix, branch, resources)?;
    let doc = apply_all(doc, &pipeline.rewriters, &pipeline.context)?;
    let path = output_path(&settings.target_path, doc.file_name());
    match mode {
        Emit::Write => Ok(Outcome::Wrote(write_output(&path, doc.source(), false)?)),
        Emit::DryRun => Ok(Outcome::Wrote(write_output(&path, doc.source(), true)?)),
        Emit::Diff => Ok(Outcome::Diffed(diff_output(root, &path, doc.source())?)),
    }
}

/// `rename-type` may have renamed the file since its path was resolved.
fn output_path(resolved: &Path, file_name: &str) -> PathBuf {
    resolved.with_file_name(file_name)
}
