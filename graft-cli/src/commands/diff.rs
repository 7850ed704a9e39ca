//! `graft diff`: show what a reimport would change, without writing.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use graft_sync::{run, AcceptDefaults, Emit, RunOptions, SelectionMode};

use super::{load_config, open_checkout};

/// Arguments for `graft diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Only the N most recently generated files.
    #[arg(long, value_name = "N")]
    pub last: Option<usize>,
}

impl DiffArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let config = load_config(root)?;
        let repo = open_checkout(root, &config)?;

        let mut options = RunOptions::new(SelectionMode::Reimport { last: self.last });
        options.emit = Emit::Diff;
        let summary = run(root, &config, &repo, &options, &mut AcceptDefaults).context("diff failed")?;

        let mut printed = false;
        for diff in summary.diffs() {
            printed = true;
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        if !printed {
            println!("No differences.");
        }

        if summary.has_failures() {
            bail!("{} file(s) failed", summary.failed());
        }
        Ok(())
    }
}
