// src/repository/mod.rs

//! Repository descriptors, caches and metadata synchronization
//!
//! This module provides functionality for:
//! - Describing configured repositories
//! - Checking and purging on-disk metadata caches
//! - Loading repositories into the solvable pool in priority order
//! - Applying pinned snapshots
//! - Mirroring repositories to local directories (reposync)

mod cache;
mod fetch;
mod refresh;
mod reposync;
mod sack;

pub use cache::{
    is_not_found, metadata_dir, solv_cache_path, touch_marker, CacheStore, FsCache,
    LASTREFRESH_MARKER, PRIMARY_FILE, REPODATA_DIR, SOLVCACHE_DIR,
};
pub use fetch::{LocalFetcher, MetadataFetcher};
pub use refresh::{RefreshReport, SackRefresher};
pub use reposync::{reposync, ReposyncReport};
pub use sack::{read_snapshot, Sack, SnapshotPin, SolvSack};

use std::path::PathBuf;

/// Id of the pseudo-repo holding packages given on the command line
pub const CMDLINE_REPO: &str = "@cmdline";

/// Id of the pseudo-repo holding installed packages
pub const SYSTEM_REPO: &str = "@System";

/// Default repo priority; lower values sort first
pub const DEFAULT_PRIORITY: i32 = 50;

/// A configured repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepoDescriptor {
    /// Repo id, unique across the configuration
    pub name: String,
    /// Human readable description
    pub description: String,
    pub baseurl: Option<String>,
    pub priority: i32,
    pub enabled: bool,
    /// Seconds before cached metadata goes stale; negative means never
    pub metadata_expire: i64,
    pub cache_dir: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub skip_if_unavailable: bool,
}

impl RepoDescriptor {
    /// A descriptor with defaults, caching under `cachedir/<name>`
    pub fn new(name: impl Into<String>, cachedir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let cache_dir = cachedir.into().join(&name);
        Self {
            description: name.clone(),
            name,
            baseurl: None,
            priority: DEFAULT_PRIORITY,
            enabled: true,
            metadata_expire: crate::config::DEFAULT_METADATA_EXPIRE,
            cache_dir,
            snapshot: None,
            skip_if_unavailable: false,
        }
    }

    /// True for the command-line pseudo-repo, which never takes part in refresh
    pub fn is_cmdline(&self) -> bool {
        self.name == CMDLINE_REPO
    }

    /// Full URL of a package file given its metadata location
    pub fn package_url(&self, location: &str) -> String {
        package_url(self.baseurl.as_deref(), location)
    }
}

/// Join a package location onto a baseurl; without one the location is returned as is
pub fn package_url(baseurl: Option<&str>, location: &str) -> String {
    match baseurl {
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            location.trim_start_matches('/')
        ),
        None => location.to_string(),
    }
}
