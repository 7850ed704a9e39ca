//! `graft reimport`: regenerate files already in the registry.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use graft_sync::{run, Emit, OutputMode, RunOptions, SelectionMode};

use super::{load_config, open_checkout, print_results, prompter};

/// Arguments for `graft reimport`.
#[derive(Args, Debug)]
pub struct ReimportArgs {
    /// Only the N most recently generated files.
    #[arg(long, value_name = "N")]
    pub last: Option<usize>,

    /// Reimport every candidate instead of picking one.
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

impl ReimportArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let config = load_config(root)?;
        let repo = open_checkout(root, &config)?;

        let mut options = RunOptions::new(SelectionMode::Reimport { last: self.last });
        options.output = if self.all || self.yes { OutputMode::All } else { OutputMode::Choose };
        options.emit = if self.dry_run { Emit::DryRun } else { Emit::Write };
        options.branch = self.branch;

        let mut prompter = prompter(self.yes);
        let summary = run(root, &config, &repo, &options, prompter.as_mut()).context("reimport failed")?;
        print_results(&summary, self.dry_run)
    }
}
