// src/repository/reposync.rs

//! Mirror enabled repositories to a local directory

use super::cache::REPODATA_DIR;
use super::fetch::MetadataFetcher;
use super::RepoDescriptor;
use crate::args::ReposyncRequest;
use crate::error::{Error, Result};
use crate::pool::{Pool, SolvableId};
use crate::query::{newest_per_name_arch, Query, Scope};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SOURCE_ARCH: &str = "src";

/// What a reposync run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReposyncReport {
    /// Package URLs (print-urls-only mode)
    pub urls: Vec<String>,
    pub downloaded: Vec<PathBuf>,
    /// Already present with the expected size
    pub kept: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Metadata directories written
    pub metadata: Vec<PathBuf>,
}

/// Sync every given repo according to `req`
///
/// `repos` are the enabled repos, already loaded into `pool`.
pub fn reposync<F: MetadataFetcher>(
    pool: &Pool,
    repos: &[RepoDescriptor],
    fetcher: &F,
    req: &ReposyncRequest,
) -> Result<ReposyncReport> {
    req.check_repo_count(repos.len())?;

    let download_root = req
        .download_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut report = ReposyncReport::default();

    for repo in repos {
        let Some(repo_id) = pool.repo_by_name(&repo.name) else {
            warn!("Repo {} is not loaded, skipping", repo.name);
            continue;
        };

        let mut query = Query::new(pool);
        query
            .apply_scope(Scope::Available)
            .in_repo(repo_id)
            .filter_arches(&req.arches);
        let mut ids: Vec<SolvableId> = query
            .run()
            .into_iter()
            .filter(|&id| (pool.arch(id) == SOURCE_ARCH) == req.source_only)
            .collect();
        if req.newest_only {
            ids = newest_per_name_arch(pool, &ids);
        }
        debug!("{} packages selected from {}", ids.len(), repo.name);

        if req.print_urls_only {
            for &id in &ids {
                if let Some(location) = &pool.solvable(id).location {
                    report.urls.push(repo.package_url(location));
                }
            }
            continue;
        }

        let target = if req.norepopath {
            download_root.clone()
        } else {
            download_root.join(&repo.name)
        };
        sync_packages(pool, repo, fetcher, &ids, &target, &mut report)?;

        if req.delete {
            let deleted = delete_stale(&target, &report)?;
            report.deleted.extend(deleted);
        }

        if req.download_metadata {
            let root = req.metadata_path.as_ref().unwrap_or(&download_root);
            let dest = root.join(&repo.name).join(REPODATA_DIR);
            fetcher.fetch_metadata(repo, &dest)?;
            info!("Metadata for {} written to {}", repo.name, dest.display());
            report.metadata.push(dest);
        }
    }

    Ok(report)
}

fn sync_packages<F: MetadataFetcher>(
    pool: &Pool,
    repo: &RepoDescriptor,
    fetcher: &F,
    ids: &[SolvableId],
    target: &Path,
    report: &mut ReposyncReport,
) -> Result<()> {
    for &id in ids {
        let solvable = pool.solvable(id);
        let Some(location) = solvable.location.as_deref() else {
            warn!("{} has no location, skipping", pool.nevra(id));
            continue;
        };
        let dest = target.join(safe_relative(location)?);

        let existing = fs::metadata(&dest).ok().map(|m| m.len());
        if existing.is_some_and(|len| solvable.download_size == 0 || len == solvable.download_size)
        {
            debug!("{} already present", dest.display());
            report.kept.push(dest);
            continue;
        }

        fetcher.fetch_package(repo, location, &dest)?;
        info!("Downloaded {}", pool.nevra(id));
        report.downloaded.push(dest);
    }
    Ok(())
}

/// Remove `*.rpm` files under `target` that this run neither kept nor downloaded
fn delete_stale(target: &Path, report: &ReposyncReport) -> Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();
    let synced: HashSet<&Path> = report
        .downloaded
        .iter()
        .chain(report.kept.iter())
        .map(PathBuf::as_path)
        .collect();

    if !target.exists() {
        return Ok(deleted);
    }

    for entry in WalkDir::new(target) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let at = e.path().unwrap_or(target).display().to_string();
                warn!("Cannot inspect {} for stale packages: {}", at, e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().is_none_or(|ext| ext != "rpm")
            || synced.contains(path)
        {
            continue;
        }
        fs::remove_file(path)
            .map_err(|e| Error::system(format!("Failed to remove {}", path.display()), e))?;
        info!("Deleted {}", path.display());
        deleted.push(path.to_path_buf());
    }
    Ok(deleted)
}

/// Reject absolute locations and `..` components
fn safe_relative(location: &str) -> Result<PathBuf> {
    let path = Path::new(location.trim_start_matches('/'));
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(Error::InvalidParameter(format!(
            "package location '{}' escapes the download directory",
            location
        )));
    }
    Ok(path.to_path_buf())
}
