pub mod diff;
pub mod fetch;
pub mod import;
pub mod init;
pub mod reimport;
pub mod status;

use std::path::Path;

use anyhow::{bail, Context, Result};
use graft_core::{registry, ImportConfig};
use graft_sync::{AcceptDefaults, FileReport, GitRepo, Outcome, Prompter, RunSummary, WriteResult};

use crate::prompt::TerminalPrompter;

// ---------------------------------------------------------------------------
// Shared command plumbing
// ---------------------------------------------------------------------------

pub(crate) fn load_config(root: &Path) -> Result<ImportConfig> {
    registry::load_config_at(root)
        .with_context(|| format!("failed to load import config under {}", root.display()))
}

/// The local upstream checkout; `graft fetch` must have created it.
pub(crate) fn open_checkout(root: &Path, config: &ImportConfig) -> Result<GitRepo> {
    let repo = GitRepo::new(registry::checkout_dir_at(root, config));
    if !repo.exists() {
        bail!(
            "no upstream checkout at {}; run `graft fetch` first",
            repo.dir().display()
        );
    }
    tracing::debug!("reading upstream from {}", repo.dir().display());
    Ok(repo)
}

pub(crate) fn prompter(yes: bool) -> Box<dyn Prompter> {
    if yes {
        Box::new(AcceptDefaults)
    } else {
        Box::new(TerminalPrompter::stdio())
    }
}

/// Print one line per file, then fail if any file hit a configuration error.
pub(crate) fn print_results(summary: &RunSummary, dry_run: bool) -> Result<()> {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}✓ {} written, {} unchanged, {} skipped, {} failed",
        summary.written(),
        summary.unchanged(),
        summary.skipped(),
        summary.failed(),
    );

    for report in &summary.reports {
        let label = report_label(report);
        match &report.outcome {
            Outcome::Wrote(WriteResult::Written { path }) => println!("  ✎  {}", path.display()),
            Outcome::Wrote(WriteResult::WouldWrite { path }) => println!("  ~  {}", path.display()),
            Outcome::Wrote(WriteResult::Unchanged { path }) => println!("  ·  {}", path.display()),
            Outcome::Diffed(_) => {}
            Outcome::Skipped { reason } => println!("  -  {label}: {reason}"),
            Outcome::Failed { error } => println!("  ✗  {label}: {error}"),
        }
    }

    if summary.has_failures() {
        bail!("{} file(s) failed", summary.failed());
    }
    Ok(())
}

fn report_label(report: &FileReport) -> String {
    match &report.alias {
        Some(alias) => format!("{} [{alias}]", report.path),
        None => report.path.clone(),
    }
}
