//! graft: one-way C# source import with declarative rewrites.
//!
//! # Usage
//!
//! ```text
//! graft [--root <dir>] init --upstream <url> --remote-prefix <url> [--branch <b>] --base-namespace <ns>
//! graft [--root <dir>] fetch
//! graft [--root <dir>] import [PATTERN] [--all] [--dry-run] [--yes] [--branch <b>]
//! graft [--root <dir>] reimport [--last <N>] [--all] [--dry-run] [--yes] [--branch <b>]
//! graft [--root <dir>] diff [--last <N>]
//! graft [--root <dir>] status [--json]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

mod commands;
mod prompt;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, fetch::FetchArgs, import::ImportArgs, init::InitArgs, reimport::ReimportArgs,
    status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "graft",
    version,
    about = "Import and adapt C# sources from an upstream repository",
    long_about = None,
)]
struct Cli {
    /// Root of the target project.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write `.graft/config.yaml` and an empty import registry.
    Init(InitArgs),

    /// Clone or update the local upstream checkout.
    Fetch(FetchArgs),

    /// Import upstream files matching a pattern.
    Import(ImportArgs),

    /// Regenerate files already recorded in the registry.
    Reimport(ReimportArgs),

    /// Show unified diff of what reimport would write.
    Diff(DiffArgs),

    /// Show drift between imported files and upstream.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let root = cli.root;
    match cli.command {
        Commands::Init(args) => args.run(&root),
        Commands::Fetch(args) => args.run(&root),
        Commands::Import(args) => args.run(&root),
        Commands::Reimport(args) => args.run(&root),
        Commands::Diff(args) => args.run(&root),
        Commands::Status(args) => args.run(&root),
    }
}
