//! `graft import`: import upstream files matching a pattern.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use graft_sync::{run, Emit, OutputMode, RunOptions, SelectionMode};

use super::{load_config, open_checkout, print_results, prompter};

/// Arguments for `graft import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Glob over upstream paths; defaults to the configured source glob.
    pub pattern: Option<String>,

    /// Import every match instead of picking one.
    #[arg(long)]
    pub all: bool,

    /// Show what would be written without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Accept every default instead of prompting.
    #[arg(long)]
    pub yes: bool,

    /// Upstream branch for this run only.
    #[arg(long)]
    pub branch: Option<String>,
}

impl ImportArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let config = load_config(root)?;
        let repo = open_checkout(root, &config)?;

        let mut options = RunOptions::new(SelectionMode::Pattern(self.pattern.clone()));
        options.output = if self.all || self.yes { OutputMode::All } else { OutputMode::Choose };
        options.emit = if self.dry_run { Emit::DryRun } else { Emit::Write };
        options.branch = self.branch;

        let mut prompter = prompter(self.yes);
        let what = self.pattern.as_deref().unwrap_or(&config.source_glob);
        let summary = run(root, &config, &repo, &options, prompter.as_mut())
            .with_context(|| format!("import of '{what}' failed"))?;
        print_results(&summary, self.dry_run)
    }
}
