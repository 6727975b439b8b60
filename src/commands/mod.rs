// src/commands/mod.rs
//! Command handlers for the pkgmgr CLI

mod history;
mod repo;
mod repoquery;
mod reposync;
mod size_estimate;

pub use history::cmd_history;
pub use repo::{cmd_makecache, cmd_repolist};
pub use repoquery::cmd_repoquery;
pub use reposync::cmd_reposync;
pub use size_estimate::cmd_size_estimate;

use anyhow::{Context, Result};
use pkgmgr::repository::{FsCache, LocalFetcher, RefreshReport, SolvSack};
use pkgmgr::{Config, SackRefresher};
use std::path::Path;
use tracing::info;

/// Options that apply to every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<String>,
    pub setopts: Vec<String>,
    pub cache_only: bool,
    pub refresh: bool,
    pub json: bool,
    pub verbose: bool,
    pub enable_repos: Vec<String>,
    pub disable_repos: Vec<String>,
}

/// Read configuration and apply command-line repo and cache overrides
pub fn load_config(opts: &GlobalOptions) -> Result<Config> {
    let path = opts.config.as_deref().map(Path::new);
    let mut config = Config::load(path, &opts.setopts).with_context(|| match path {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => "Failed to load configuration".to_string(),
    })?;
    config.toggle_repos(&opts.enable_repos, &opts.disable_repos)?;
    if opts.cache_only {
        config.cache_only = true;
    }
    Ok(config)
}

/// Load the installed set and refresh every enabled repo into a new sack
pub fn open_sack(
    config: &mut Config,
    opts: &GlobalOptions,
) -> Result<(SolvSack<LocalFetcher>, RefreshReport)> {
    let mut sack = SolvSack::new(LocalFetcher, config.cache_only);
    sack.load_installed(&config.installed_db)
        .with_context(|| format!("Failed to load {}", config.installed_db.display()))?;

    let cache = FsCache;
    let mut refresher = SackRefresher::new(&cache);
    let report = refresher
        .refresh_sack(config, &mut sack, opts.refresh)
        .context("Failed to refresh repositories")?;
    info!(
        "Loaded {} repos ({} disabled)",
        report.loaded.len(),
        report.disabled.len()
    );
    Ok((sack, report))
}
