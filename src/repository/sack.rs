// src/repository/sack.rs

//! Loading repositories into the pool
//!
//! `Sack` is the seam between refresh orchestration and the solver pool:
//! the refresher decides *when* and *in which order* repos load, the sack
//! decides *how*.

use super::cache::{self, PRIMARY_FILE};
use super::fetch::MetadataFetcher;
use super::{RepoDescriptor, SYSTEM_REPO};
use crate::error::{Error, Result};
use crate::nevra::{split_name_equals_evr, Nevra};
use crate::pool::{read_records, write_records, Pool, RepoId, SolvableId};
use crate::query::find_by_nevr_in_repo;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Solver-side operations driven by the refresher
pub trait Sack {
    /// Load one repo from its cache directory into the pool
    ///
    /// With `refresh_requested` the metadata is re-fetched even when a cached
    /// copy exists.
    fn load_repo(
        &mut self,
        repo: &RepoDescriptor,
        cache_dir: &Path,
        refresh_requested: bool,
    ) -> Result<()>;

    /// Restrict a loaded repo to the versions pinned in a snapshot file
    fn apply_snapshot(&mut self, repo: &RepoDescriptor, snapshot: &Path) -> Result<()>;
}

/// `Sack` over an in-memory [`Pool`]
pub struct SolvSack<F: MetadataFetcher> {
    pool: Pool,
    fetcher: F,
    cache_only: bool,
}

impl<F: MetadataFetcher> SolvSack<F> {
    pub fn new(fetcher: F, cache_only: bool) -> Self {
        Self {
            pool: Pool::new(),
            fetcher,
            cache_only,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn into_pool(self) -> Pool {
        self.pool
    }

    /// Load the installed-package database as the system repo
    ///
    /// A missing database means nothing is installed.
    pub fn load_installed(&mut self, path: &Path) -> Result<RepoId> {
        let records = match read_records(path) {
            Ok(records) => records,
            Err(Error::FileNotFound(_)) => {
                debug!("No installed database at {}", path.display());
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        info!("Loaded {} installed packages", records.len());
        let repo = self.pool.add_repo(SYSTEM_REPO, 0, None, records);
        self.pool.set_installed(repo);
        Ok(repo)
    }
}

impl<F: MetadataFetcher> Sack for SolvSack<F> {
    fn load_repo(
        &mut self,
        repo: &RepoDescriptor,
        cache_dir: &Path,
        refresh_requested: bool,
    ) -> Result<()> {
        let repodata = cache::metadata_dir(cache_dir);
        let primary = repodata.join(PRIMARY_FILE);

        let mut fetched = false;
        if !primary.exists() || (refresh_requested && !self.cache_only) {
            if self.cache_only {
                return Err(Error::FileNotFound(primary));
            }
            info!("Fetching metadata for {}", repo.name);
            self.fetcher.fetch_metadata(repo, &repodata)?;
            cache::touch_marker(cache_dir)?;
            fetched = true;
        }

        let solv = cache::solv_cache_path(cache_dir, &repo.name);
        let cached = if fetched {
            None
        } else {
            match read_records(&solv) {
                Ok(records) => Some(records),
                Err(e) if cache::is_not_found(&e) => None,
                Err(e) if e.is_permission_denied() => return Err(e),
                Err(e) => {
                    warn!("Ignoring unreadable solver cache {}: {}", solv.display(), e);
                    None
                }
            }
        };

        let records = match cached {
            Some(records) => {
                debug!("Using solver cache {}", solv.display());
                records
            }
            None => {
                let records = read_records(&primary)?;
                write_records(&solv, &records)?;
                records
            }
        };

        info!("Loaded {} packages from {}", records.len(), repo.name);
        self.pool
            .add_repo(&repo.name, repo.priority, repo.baseurl.clone(), records);
        Ok(())
    }

    fn apply_snapshot(&mut self, repo: &RepoDescriptor, snapshot: &Path) -> Result<()> {
        let pins = read_snapshot(snapshot)?;
        let repo_id = self
            .pool
            .repo_by_name(&repo.name)
            .ok_or_else(|| Error::NoMatch(format!("repo '{}' is not loaded", repo.name)))?;

        let mut keep = HashSet::new();
        for pin in &pins {
            let found = pin.resolve(&self.pool, repo_id);
            if found.is_empty() {
                warn!("Snapshot entry '{}' matches nothing in {}", pin, repo.name);
            }
            keep.extend(found);
        }

        let hidden: Vec<_> = self
            .pool
            .repo_solvables(repo_id)
            .filter(|id| !keep.contains(id))
            .collect();
        for &id in &hidden {
            self.pool.exclude(id);
        }

        info!(
            "Snapshot {} pins {} packages in {} ({} hidden)",
            snapshot.display(),
            keep.len(),
            repo.name,
            hidden.len()
        );
        Ok(())
    }
}

/// One entry of a snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotPin {
    /// `name-evr.arch`
    Nevra(Nevra),
    /// `name=evr`, every arch of that version
    NameEvr { name: String, evr: String },
}

impl SnapshotPin {
    pub fn parse(line: &str) -> Result<Self> {
        if line.contains('=') {
            let (name, evr) = split_name_equals_evr(line)?;
            if name.is_empty() || evr.is_empty() {
                return Err(Error::ParseError(format!("'{}' is not name=evr", line)));
            }
            return Ok(SnapshotPin::NameEvr { name, evr });
        }
        Ok(SnapshotPin::Nevra(Nevra::parse(line)?))
    }

    /// Solvables of `repo` this entry pins
    pub fn resolve(&self, pool: &Pool, repo: RepoId) -> Vec<SolvableId> {
        match self {
            SnapshotPin::Nevra(nevra) => {
                find_by_nevr_in_repo(pool, repo, &nevra.name, &nevra.evr)
                    .into_iter()
                    .filter(|&id| pool.arch(id) == nevra.arch)
                    .collect()
            }
            SnapshotPin::NameEvr { name, evr } => find_by_nevr_in_repo(pool, repo, name, evr),
        }
    }
}

impl fmt::Display for SnapshotPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotPin::Nevra(nevra) => write!(f, "{}", nevra),
            SnapshotPin::NameEvr { name, evr } => write!(f, "{}={}", name, evr),
        }
    }
}

/// Read a snapshot file: one NEVRA or `name=evr` per line, `#` comments allowed
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotPin>> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::system(format!("Failed to read snapshot {}", path.display()), e)
        }
    })?;

    let mut pins = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let pin = SnapshotPin::parse(line).map_err(|_| {
            Error::ParseError(format!(
                "{}:{}: '{}' is not a NEVRA or name=evr",
                path.display(),
                lineno + 1,
                line
            ))
        })?;
        pins.push(pin);
    }
    Ok(pins)
}
