// src/commands/repo.rs
//! Repository commands: makecache and repolist

use super::{load_config, open_sack, GlobalOptions};
use anyhow::Result;
use serde_json::json;
use tracing::info;

/// Refresh metadata for every enabled repository
pub fn cmd_makecache(opts: &GlobalOptions) -> Result<()> {
    info!("Refreshing metadata cache");
    let mut config = load_config(opts)?;
    let (sack, report) = open_sack(&mut config, opts)?;

    for name in &report.disabled {
        println!("Repository '{}' is unavailable and was disabled", name);
    }
    println!(
        "Metadata cache created ({} repos, {} packages)",
        report.loaded.len(),
        sack.pool().len()
    );
    Ok(())
}

/// List configured repositories
pub fn cmd_repolist(opts: &GlobalOptions, all: bool) -> Result<()> {
    let config = load_config(opts)?;
    let repos: Vec<_> = config
        .repos
        .iter()
        .filter(|r| all || r.enabled)
        .collect();

    if opts.json {
        let list: Vec<_> = repos
            .iter()
            .map(|r| {
                json!({
                    "id": r.name,
                    "name": r.description,
                    "baseurl": r.baseurl,
                    "enabled": r.enabled,
                    "priority": r.priority,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if repos.is_empty() {
        println!("No repositories configured");
        return Ok(());
    }
    println!("{:<24} {:<40} {:>8} {}", "repo id", "repo name", "priority", "status");
    for repo in repos {
        let status = if repo.enabled { "enabled" } else { "disabled" };
        println!(
            "{:<24} {:<40} {:>8} {}",
            repo.name, repo.description, repo.priority, status
        );
    }
    Ok(())
}
