//! `graft fetch`: clone or update the upstream checkout.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use graft_core::registry;
use graft_sync::{FetchOutcome, GitRepo};

use super::load_config;

/// Arguments for `graft fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {}

impl FetchArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let config = load_config(root)?;
        let dir = registry::checkout_dir_at(root, &config);
        let (repo, outcome) = GitRepo::clone_or_fetch(&config.upstream, &dir)
            .with_context(|| format!("failed to fetch {}", config.upstream))?;
        match outcome {
            FetchOutcome::Cloned => println!("✓ Cloned {} into {}", config.upstream, repo.dir().display()),
            FetchOutcome::Fetched => println!("✓ Fetched {} in {}", config.upstream, repo.dir().display()),
        }
        Ok(())
    }
}
