// src/cli/mod.rs
//! CLI definitions for pkgmgr
//!
//! Command implementations are in the `commands` module. Global options
//! (configuration, repo selection, cache policy, output) come before the
//! subcommand:
//!
//! - `makecache` - Refresh metadata for every enabled repo
//! - `repolist` - List configured repos
//! - `size-estimate` - Estimate the compressed size of a package set
//! - `history` - Transaction history and rollback/undo/redo plans
//! - `repoquery` - Query repository and installed packages
//! - `reposync` - Mirror enabled repos to a local directory

use clap::{Parser, Subcommand};

mod history;
mod repoquery;
mod reposync;

pub use history::HistoryArgs;
pub use repoquery::RepoqueryArgs;
pub use reposync::ReposyncArgs;

#[derive(Parser)]
#[command(name = "pkgmgr")]
#[command(author = "pkgmgr Contributors")]
#[command(version)]
#[command(about = "Repository metadata, package queries and size estimation", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Override a configuration option (KEY=VALUE, repeatable)
    #[arg(long = "setopt", global = true, value_name = "KEY=VALUE")]
    pub setopt: Vec<String>,

    /// Run entirely from the metadata cache
    #[arg(short = 'C', long = "cacheonly", global = true)]
    pub cache_only: bool,

    /// Re-fetch metadata even if the cache is current
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Machine-readable JSON output where supported
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    /// More output, and info-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable repos matching this glob (repeatable)
    #[arg(long = "enablerepo", global = true, value_name = "GLOB")]
    pub enable_repo: Vec<String>,

    /// Disable repos matching this glob (repeatable)
    #[arg(long = "disablerepo", global = true, value_name = "GLOB")]
    pub disable_repo: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh metadata for every enabled repository
    Makecache,

    /// List configured repositories
    Repolist {
        /// Include disabled repositories
        #[arg(long)]
        all: bool,
    },

    /// Estimate the compressed image size of a set of packages
    ///
    /// Prints the estimate in bytes. Tune the model with
    /// `--setopt=buffer-percent=N` and `--setopt=comp-ratio=R`.
    SizeEstimate {
        /// Package names or NEVRAs
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Show transaction history or compute rollback, undo and redo plans
    History(HistoryArgs),

    /// Query packages in enabled repositories and the installed set
    Repoquery(RepoqueryArgs),

    /// Mirror enabled repositories to a local directory
    Reposync(ReposyncArgs),
}
