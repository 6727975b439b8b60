// src/repository/cache.rs

//! On-disk metadata cache handling
//!
//! Layout under a repo's cache directory:
//! - `repodata/primary.json` - the repository metadata
//! - `lastrefresh` - marker whose mtime is the cache age
//! - `solvcache/<repo>.solv` - precomputed solver cache

use super::RepoDescriptor;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

pub const REPODATA_DIR: &str = "repodata";
pub const PRIMARY_FILE: &str = "primary.json";
pub const LASTREFRESH_MARKER: &str = "lastrefresh";
pub const SOLVCACHE_DIR: &str = "solvcache";

/// Cache and filesystem operations used by the refresher
pub trait CacheStore {
    /// Resolve the directory holding a repo's cached metadata
    fn resolve_cache_dir(&self, repo: &RepoDescriptor) -> Result<PathBuf>;

    /// Whether the cache in `cache_dir` is older than `metadata_expire` seconds
    fn is_expired(&self, cache_dir: &Path, metadata_expire: i64) -> Result<bool>;

    /// Remove the metadata cache; an absent cache is not an error
    fn remove_metadata(&self, cache_dir: &Path) -> Result<()>;

    /// Remove the precomputed solver cache; an absent cache is not an error
    fn remove_solv_cache(&self, cache_dir: &Path, repo_name: &str) -> Result<()>;
}

/// `CacheStore` backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCache;

impl CacheStore for FsCache {
    fn resolve_cache_dir(&self, repo: &RepoDescriptor) -> Result<PathBuf> {
        if repo.cache_dir.as_os_str().is_empty() {
            return Err(Error::InvalidParameter(format!(
                "repo '{}' has no cache directory",
                repo.name
            )));
        }
        Ok(repo.cache_dir.clone())
    }

    fn is_expired(&self, cache_dir: &Path, metadata_expire: i64) -> Result<bool> {
        if metadata_expire < 0 {
            return Ok(false);
        }

        let marker = cache_dir.join(LASTREFRESH_MARKER);
        let modified = match fs::metadata(&marker).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No refresh marker at {}", marker.display());
                return Ok(true);
            }
            Err(e) => {
                return Err(Error::system(
                    format!("Failed to stat {}", marker.display()),
                    e,
                ));
            }
        };

        // A marker from the future counts as fresh
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Ok(age.as_secs() >= metadata_expire as u64)
    }

    fn remove_metadata(&self, cache_dir: &Path) -> Result<()> {
        let repodata = metadata_dir(cache_dir);
        ignore_not_found(fs::remove_dir_all(&repodata))
            .map_err(|e| Error::system(format!("Failed to remove {}", repodata.display()), e))?;

        let marker = cache_dir.join(LASTREFRESH_MARKER);
        ignore_not_found(fs::remove_file(&marker))
            .map_err(|e| Error::system(format!("Failed to remove {}", marker.display()), e))
    }

    fn remove_solv_cache(&self, cache_dir: &Path, repo_name: &str) -> Result<()> {
        let path = solv_cache_path(cache_dir, repo_name);
        ignore_not_found(fs::remove_file(&path))
            .map_err(|e| Error::system(format!("Failed to remove {}", path.display()), e))
    }
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// True for `FileNotFound` and for system errors caused by a missing path
pub fn is_not_found(err: &Error) -> bool {
    match err {
        Error::FileNotFound(_) => true,
        Error::System { source, .. } => source.kind() == ErrorKind::NotFound,
        _ => false,
    }
}

/// `<cache_dir>/repodata`
pub fn metadata_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join(REPODATA_DIR)
}

/// `<cache_dir>/solvcache/<repo>.solv`
pub fn solv_cache_path(cache_dir: &Path, repo_name: &str) -> PathBuf {
    cache_dir
        .join(SOLVCACHE_DIR)
        .join(format!("{}.solv", repo_name))
}

/// Create or refresh the age marker
pub fn touch_marker(cache_dir: &Path) -> Result<()> {
    let marker = cache_dir.join(LASTREFRESH_MARKER);
    fs::create_dir_all(cache_dir)
        .map_err(|e| Error::system(format!("Failed to create {}", cache_dir.display()), e))?;
    File::create(&marker)
        .and_then(|f| f.set_modified(SystemTime::now()))
        .map_err(|e| Error::system(format!("Failed to write {}", marker.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_marker_is_expired() {
        let dir = TempDir::new().unwrap();
        assert!(FsCache.is_expired(dir.path(), 3600).unwrap());
    }

    #[test]
    fn test_fresh_marker_is_not_expired() {
        let dir = TempDir::new().unwrap();
        touch_marker(dir.path()).unwrap();
        assert!(!FsCache.is_expired(dir.path(), 3600).unwrap());
        // zero means "always stale"
        assert!(FsCache.is_expired(dir.path(), 0).unwrap());
    }

    #[test]
    fn test_negative_expire_never_expires() {
        let dir = TempDir::new().unwrap();
        // no marker at all, still not expired
        assert!(!FsCache.is_expired(dir.path(), -1).unwrap());
    }

    #[test]
    fn test_removal_tolerates_absent_cache() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("never-created");
        FsCache.remove_metadata(&cache_dir).unwrap();
        FsCache.remove_solv_cache(&cache_dir, "base").unwrap();
    }

    #[test]
    fn test_removal_deletes_cache() {
        let dir = TempDir::new().unwrap();
        let repodata = metadata_dir(dir.path());
        fs::create_dir_all(&repodata).unwrap();
        fs::write(repodata.join(PRIMARY_FILE), b"{}").unwrap();
        touch_marker(dir.path()).unwrap();
        let solv = solv_cache_path(dir.path(), "base");
        fs::create_dir_all(solv.parent().unwrap()).unwrap();
        fs::write(&solv, b"{}").unwrap();

        FsCache.remove_metadata(dir.path()).unwrap();
        FsCache.remove_solv_cache(dir.path(), "base").unwrap();

        assert!(!repodata.exists());
        assert!(!dir.path().join(LASTREFRESH_MARKER).exists());
        assert!(!solv.exists());
    }

    #[test]
    fn test_resolve_cache_dir() {
        let repo = RepoDescriptor::new("base", "/var/cache/pkgmgr");
        assert_eq!(
            FsCache.resolve_cache_dir(&repo).unwrap(),
            PathBuf::from("/var/cache/pkgmgr/base")
        );

        let mut repo = repo;
        repo.cache_dir = PathBuf::new();
        assert!(matches!(
            FsCache.resolve_cache_dir(&repo),
            Err(Error::InvalidParameter(_))
        ));
    }
}
