//! `graft status`: compare imported files against upstream.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use graft_core::registry;
use graft_sync::status::{check_at, format_age, RecordStatus, StatusEntry};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::{load_config, open_checkout};

/// Arguments for `graft status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Upstream branch to compare against.
    #[arg(long)]
    pub branch: Option<String>,
}

impl StatusArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let config = load_config(root)?;
        let repo = open_checkout(root, &config)?;
        let reg = registry::load_at(root).context("failed to load registry")?;
        let branch = self.branch.as_deref().unwrap_or(&config.branch);

        let entries = check_at(root, &config, &reg, &repo, branch)
            .with_context(|| format!("status check against '{branch}' failed"))?;

        if self.json {
            print_json(branch, entries)
        } else {
            print_table(branch, entries);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct StatusJson {
    branch: String,
    summary: SummaryJson,
    records: Vec<StatusEntry>,
}

#[derive(Serialize)]
struct SummaryJson {
    records: usize,
    current: usize,
    drifted: usize,
    #[serde(rename = "missingUpstream")]
    missing_upstream: usize,
    #[serde(rename = "notGenerated")]
    not_generated: usize,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "")]
    indicator: String,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "imported")]
    imported: String,
    #[tabled(rename = "upstream")]
    upstream: String,
    #[tabled(rename = "generated")]
    generated: String,
}

fn count(entries: &[StatusEntry], status: RecordStatus) -> usize {
    entries.iter().filter(|e| e.status == status).count()
}

fn print_json(branch: &str, entries: Vec<StatusEntry>) -> Result<()> {
    let payload = StatusJson {
        branch: branch.to_string(),
        summary: SummaryJson {
            records: entries.len(),
            current: count(&entries, RecordStatus::Current),
            drifted: count(&entries, RecordStatus::Drifted),
            missing_upstream: count(&entries, RecordStatus::MissingUpstream),
            not_generated: count(&entries, RecordStatus::NotGenerated),
        },
        records: entries,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(branch: &str, entries: Vec<StatusEntry>) {
    println!(
        "graft v{} | {} | {} records | {} drifted",
        env!("CARGO_PKG_VERSION"),
        branch,
        entries.len(),
        count(&entries, RecordStatus::Drifted),
    );

    if entries.is_empty() {
        println!("No files imported yet.");
        return;
    }

    println!(
        "Indicators: {} CURRENT  {} DRIFTED  {} MISSING UPSTREAM  {} NOT GENERATED",
        indicator(RecordStatus::Current),
        indicator(RecordStatus::Drifted),
        indicator(RecordStatus::MissingUpstream),
        indicator(RecordStatus::NotGenerated),
    );

    let needs_reimport = entries.iter().any(|e| e.status != RecordStatus::Current);
    let rows: Vec<StatusRow> = entries
        .into_iter()
        .map(|entry| StatusRow {
            indicator: indicator(entry.status),
            file: match &entry.alias {
                Some(alias) => format!("{} [{alias}]", entry.path),
                None => entry.path.clone(),
            },
            status: entry.status.as_str().to_string(),
            imported: short_hash(entry.imported_hash.as_deref()),
            upstream: short_hash(entry.upstream_hash.as_deref()),
            generated: entry.generated_at.map(format_age).unwrap_or_else(|| "never".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if needs_reimport {
        println!("Run 'graft reimport --all' to refresh drifted files.");
    }
}

fn indicator(status: RecordStatus) -> String {
    match status {
        RecordStatus::Current => "■".green().bold().to_string(),
        RecordStatus::Drifted => "■".yellow().bold().to_string(),
        RecordStatus::MissingUpstream => "■".red().bold().to_string(),
        RecordStatus::NotGenerated => "■".bright_black().bold().to_string(),
    }
}

fn short_hash(hash: Option<&str>) -> String {
    match hash {
        Some(h) => h.chars().take(10).collect(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_and_marks_missing() {
        assert_eq!(short_hash(Some("0123456789abcdef")), "0123456789");
        assert_eq!(short_hash(Some("abc")), "abc");
        assert_eq!(short_hash(None), "-");
    }
}
