//! `graft init`: write the import config and an empty registry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use graft_core::{registry, ImportConfig};

/// Arguments for `graft init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Clone URL of the upstream repository.
    #[arg(long)]
    pub upstream: String,

    /// Browse URL prefix used in provenance headers.
    #[arg(long)]
    pub remote_prefix: String,

    /// Upstream branch to import from.
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Namespace that maps onto the target root directory.
    #[arg(long)]
    pub base_namespace: String,

    /// Existing upstream checkout to use instead of `.graft/upstream`.
    #[arg(long)]
    pub checkout: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let mut config = ImportConfig::new(self.upstream, self.remote_prefix, self.branch, self.base_namespace);
        config.checkout = self.checkout;

        let reg = registry::init_at(root, &config)
            .with_context(|| format!("failed to initialise {}", root.display()))?;

        println!("✓ Initialised graft in {}", root.display());
        println!("  config:   {}", registry::config_path_at(root).display());
        println!(
            "  registry: {} ({} records)",
            registry::registry_path_at(root).display(),
            reg.file_records.len()
        );
        println!("Run `graft fetch` to clone {}.", config.upstream);
        Ok(())
    }
}
