// src/repository/refresh.rs

//! Ordered repository refresh
//!
//! Repos load one at a time in ascending priority order. For each repo the
//! cache age is checked first and a stale cache is purged before loading.
//! Snapshots are applied in a second pass so they always see the fully
//! merged pool.

use super::cache::CacheStore;
use super::sack::Sack;
use crate::config::Config;
use crate::error::Result;
use tracing::{debug, info, warn};

/// What a refresh did, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Repos whose stale cache was removed
    pub purged: Vec<String>,
    pub loaded: Vec<String>,
    /// skip_if_unavailable repos that failed and were disabled
    pub disabled: Vec<String>,
    /// Repos that had a snapshot applied
    pub snapshots: Vec<String>,
}

/// Drives repository loading against a [`Sack`]
pub struct SackRefresher<'a, C: CacheStore + ?Sized> {
    cache: &'a C,
    refresh_requested: bool,
}

impl<'a, C: CacheStore + ?Sized> SackRefresher<'a, C> {
    pub fn new(cache: &'a C) -> Self {
        Self {
            cache,
            refresh_requested: false,
        }
    }

    /// Whether a forced metadata refresh has been requested
    pub fn refresh_requested(&self) -> bool {
        self.refresh_requested
    }

    /// Load every enabled repo into `sack`
    ///
    /// Equal priorities keep their declaration order. A failing repo aborts
    /// the refresh unless it is skip_if_unavailable and the failure is not a
    /// permission error; such a repo is disabled in `config` and skipped.
    pub fn refresh_sack<S: Sack + ?Sized>(
        &mut self,
        config: &mut Config,
        sack: &mut S,
        force_clean_metadata: bool,
    ) -> Result<RefreshReport> {
        if force_clean_metadata {
            self.refresh_requested = true;
        }

        let mut order: Vec<usize> = config
            .repos
            .iter()
            .enumerate()
            .filter(|(_, r)| r.enabled && !r.is_cmdline())
            .map(|(i, _)| i)
            .collect();
        // sort_by_key is stable
        order.sort_by_key(|&i| config.repos[i].priority);

        let mut report = RefreshReport::default();

        for &i in &order {
            let repo = &config.repos[i];
            let cache_dir = self.cache.resolve_cache_dir(repo)?;

            if repo.metadata_expire >= 0 && !config.cache_only {
                if self.cache.is_expired(&cache_dir, repo.metadata_expire)? {
                    info!("Metadata for {} expired, removing cache", repo.name);
                    self.cache.remove_metadata(&cache_dir)?;
                    self.cache.remove_solv_cache(&cache_dir, &repo.name)?;
                    report.purged.push(repo.name.clone());
                } else {
                    debug!("Metadata for {} is current", repo.name);
                }
            }

            let name = repo.name.clone();
            let skippable = repo.skip_if_unavailable;
            match sack.load_repo(repo, &cache_dir, self.refresh_requested) {
                Ok(()) => report.loaded.push(name),
                Err(e) if skippable && !e.is_permission_denied() => {
                    warn!("Disabling repo '{}': {}", name, e);
                    config.repos[i].enabled = false;
                    report.disabled.push(name);
                }
                Err(e) => return Err(e),
            }
        }

        for &i in &order {
            let repo = &config.repos[i];
            if !repo.enabled {
                continue;
            }
            if let Some(snapshot) = &repo.snapshot {
                sack.apply_snapshot(repo, snapshot)?;
                report.snapshots.push(repo.name.clone());
            }
        }

        Ok(report)
    }
}
