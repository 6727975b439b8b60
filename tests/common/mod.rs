// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use pkgmgr::pool::{write_records, PackageRecord};
use pkgmgr::repository::{CacheStore, Sack, PRIMARY_FILE, REPODATA_DIR};
use pkgmgr::{Config, Error, RepoDescriptor, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// One recorded call against a fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Expired(String),
    RemoveMetadata(String),
    RemoveSolv(String),
    Load(String),
    Snapshot(String),
}

/// How a fake load should fail
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotFound,
    PermissionDenied,
}

impl Failure {
    fn error(self, repo: &str) -> Error {
        match self {
            Failure::NotFound => Error::NoData(format!("{} has no metadata", repo)),
            Failure::PermissionDenied => Error::system(
                format!("Failed to read {}", repo),
                io::Error::from_raw_os_error(libc::EACCES),
            ),
        }
    }
}

/// Sack that records calls and never touches a pool
#[derive(Debug, Default)]
pub struct FakeSack {
    pub calls: Vec<Call>,
    pub refresh_flags: Vec<bool>,
    pub failures: HashMap<String, Failure>,
}

impl FakeSack {
    pub fn failing(repo: &str, failure: Failure) -> Self {
        let mut sack = Self::default();
        sack.failures.insert(repo.to_string(), failure);
        sack
    }

    pub fn loads(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Load(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Sack for FakeSack {
    fn load_repo(
        &mut self,
        repo: &RepoDescriptor,
        _cache_dir: &Path,
        refresh_requested: bool,
    ) -> Result<()> {
        self.calls.push(Call::Load(repo.name.clone()));
        self.refresh_flags.push(refresh_requested);
        match self.failures.get(&repo.name) {
            Some(failure) => Err(failure.error(&repo.name)),
            None => Ok(()),
        }
    }

    fn apply_snapshot(&mut self, repo: &RepoDescriptor, _snapshot: &Path) -> Result<()> {
        self.calls.push(Call::Snapshot(repo.name.clone()));
        Ok(())
    }
}

/// Cache store whose expiry answers are fixed per repo
///
/// The cache directory is the repo name, so calls can be matched back.
#[derive(Debug, Default)]
pub struct FakeCache {
    pub calls: RefCell<Vec<Call>>,
    pub expired: HashSet<String>,
}

impl FakeCache {
    pub fn with_expired(repos: &[&str]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            expired: repos.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

fn dir_name(cache_dir: &Path) -> String {
    cache_dir.display().to_string()
}

impl CacheStore for FakeCache {
    fn resolve_cache_dir(&self, repo: &RepoDescriptor) -> Result<PathBuf> {
        Ok(PathBuf::from(&repo.name))
    }

    fn is_expired(&self, cache_dir: &Path, _metadata_expire: i64) -> Result<bool> {
        let name = dir_name(cache_dir);
        let expired = self.expired.contains(&name);
        self.calls.borrow_mut().push(Call::Expired(name));
        Ok(expired)
    }

    fn remove_metadata(&self, cache_dir: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::RemoveMetadata(dir_name(cache_dir)));
        Ok(())
    }

    fn remove_solv_cache(&self, _cache_dir: &Path, repo_name: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::RemoveSolv(repo_name.to_string()));
        Ok(())
    }
}

/// Descriptor with a priority, cached under a throwaway path
pub fn repo(name: &str, priority: i32) -> RepoDescriptor {
    let mut repo = RepoDescriptor::new(name, "/nonexistent/cache");
    repo.priority = priority;
    repo
}

pub fn config_with(repos: Vec<RepoDescriptor>) -> Config {
    let mut config = Config::default();
    config.repos = repos;
    config
}

/// Write a local mirror with `primary.json` under `root`
pub fn write_mirror(root: &Path, records: &[PackageRecord]) {
    write_records(&root.join(REPODATA_DIR).join(PRIMARY_FILE), records).unwrap();
}
