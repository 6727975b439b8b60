// src/repository/fetch.rs

//! Metadata and package retrieval
//!
//! Network transport lives outside this crate. `LocalFetcher` covers mirrors
//! reachable through the filesystem (`file://` URLs or plain paths); other
//! transports plug in through `MetadataFetcher`.

use super::cache::{PRIMARY_FILE, REPODATA_DIR};
use super::RepoDescriptor;
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Source of repository metadata and package files
pub trait MetadataFetcher {
    /// Populate `dest` with the repo's `repodata/` contents, replacing it wholesale
    fn fetch_metadata(&self, repo: &RepoDescriptor, dest: &Path) -> Result<()>;

    /// Copy one package file (`location` relative to the baseurl) to `dest`
    fn fetch_package(&self, repo: &RepoDescriptor, location: &str, dest: &Path) -> Result<()>;
}

/// Fetcher for `file://` and plain-path baseurls
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl LocalFetcher {
    fn base_path(repo: &RepoDescriptor) -> Result<PathBuf> {
        let baseurl = repo
            .baseurl
            .as_deref()
            .ok_or_else(|| Error::Config(format!("repo '{}' has no baseurl", repo.name)))?;

        if baseurl.starts_with('/') {
            return Ok(PathBuf::from(baseurl));
        }

        match Url::parse(baseurl) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| {
                Error::ParseError(format!("invalid file URL '{}' in repo '{}'", baseurl, repo.name))
            }),
            Ok(url) => Err(Error::Unsupported(format!(
                "{} transport for repo '{}'",
                url.scheme(),
                repo.name
            ))),
            // Relative path
            Err(_) => Ok(PathBuf::from(baseurl)),
        }
    }
}

impl MetadataFetcher for LocalFetcher {
    fn fetch_metadata(&self, repo: &RepoDescriptor, dest: &Path) -> Result<()> {
        let src = Self::base_path(repo)?.join(REPODATA_DIR);
        if !src.join(PRIMARY_FILE).exists() {
            return Err(Error::FileNotFound(src.join(PRIMARY_FILE)));
        }
        debug!("Copying metadata for {} from {}", repo.name, src.display());

        // Stage next to the destination, then swap
        let staging = dest.with_extension("staging");
        remove_dir_if_exists(&staging)?;
        fs::create_dir_all(&staging)
            .map_err(|e| Error::system(format!("Failed to create {}", staging.display()), e))?;

        let entries = fs::read_dir(&src)
            .map_err(|e| Error::system(format!("Failed to read {}", src.display()), e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::system(format!("Failed to read {}", src.display()), e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let target = staging.join(entry.file_name());
            fs::copy(&path, &target)
                .map_err(|e| Error::system(format!("Failed to copy {}", path.display()), e))?;
        }

        remove_dir_if_exists(dest)?;
        fs::rename(&staging, dest)
            .map_err(|e| Error::system(format!("Failed to install {}", dest.display()), e))?;
        Ok(())
    }

    fn fetch_package(&self, repo: &RepoDescriptor, location: &str, dest: &Path) -> Result<()> {
        let src = Self::base_path(repo)?.join(location.trim_start_matches('/'));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::system(format!("Failed to create {}", parent.display()), e))?;
        }
        fs::copy(&src, dest).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::FileNotFound(src.clone())
            } else {
                Error::system(format!("Failed to copy {}", src.display()), e)
            }
        })?;
        Ok(())
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(Error::system(
            format!("Failed to remove {}", path.display()),
            e,
        )),
        _ => Ok(()),
    }
}
