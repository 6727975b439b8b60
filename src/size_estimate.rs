// src/size_estimate.rs

//! Install/download size totals and compressed-archive size estimation
//!
//! The estimate models an image built from the requested packages:
//!
//! ```text
//! buffer     = total_install * buffer_percent / 100
//! max        = total_install + buffer
//! estimate   = floor(max * compression_ratio)
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pool::Pool;
use crate::query::{newest_per_name_arch, Query, Scope};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{debug, warn};

pub const DEFAULT_BUFFER_PERCENT: u64 = 2;
pub const DEFAULT_COMPRESSION_RATIO: f64 = 0.44;

/// Setopt keys read by [`SizeEstimateParams::from_setopts`]
pub const BUFFER_PERCENT_KEY: &str = "buffer-percent";
pub const COMPRESSION_RATIO_KEY: &str = "comp-ratio";

/// Sizes of one resolved package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSizeInfo {
    pub name: String,
    pub version: String,
    pub install_size: u64,
    pub download_size: u64,
}

/// Looks packages up by name spec
pub trait PackageInfoProvider {
    /// Zero matches is reported as `Error::NoMatch`
    fn package_info(&self, scope: Scope, specs: &[&str]) -> Result<Vec<PackageSizeInfo>>;
}

/// Estimation model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeEstimateParams {
    pub buffer_percent: u64,
    pub compression_ratio: f64,
}

impl Default for SizeEstimateParams {
    fn default() -> Self {
        Self {
            buffer_percent: DEFAULT_BUFFER_PERCENT,
            compression_ratio: DEFAULT_COMPRESSION_RATIO,
        }
    }
}

impl SizeEstimateParams {
    /// Validated parameters: percent in [0, 100], ratio in (0, 1]
    pub fn new(buffer_percent: u64, compression_ratio: f64) -> Result<Self> {
        if buffer_percent > 100 {
            return Err(Error::InvalidParameter(format!(
                "buffer percent must be between 0 and 100, got {}",
                buffer_percent
            )));
        }
        if !(compression_ratio > 0.0 && compression_ratio <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "compression ratio must be in (0, 1], got {}",
                compression_ratio
            )));
        }
        Ok(Self {
            buffer_percent,
            compression_ratio,
        })
    }

    /// Read `buffer-percent` and `comp-ratio` from `--setopt`, falling back to defaults
    pub fn from_setopts(config: &Config) -> Result<Self> {
        let buffer_percent = match config.setopt(BUFFER_PERCENT_KEY) {
            Some(v) => v.trim().parse().map_err(|_| {
                Error::InvalidParameter(format!("invalid {} '{}'", BUFFER_PERCENT_KEY, v))
            })?,
            None => DEFAULT_BUFFER_PERCENT,
        };
        let compression_ratio = match config.setopt(COMPRESSION_RATIO_KEY) {
            Some(v) => v.trim().parse().map_err(|_| {
                Error::InvalidParameter(format!("invalid {} '{}'", COMPRESSION_RATIO_KEY, v))
            })?,
            None => DEFAULT_COMPRESSION_RATIO,
        };
        Self::new(buffer_percent, compression_ratio)
    }
}

/// Totals and the derived estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeEstimateResult {
    pub total_install_size: u64,
    pub total_download_size: u64,
    pub buffer_size: u64,
    pub max_allowed_size: u64,
    pub estimated_size: u64,
    pub buffer_percent: u64,
    pub compression_ratio: f64,
}

impl SizeEstimateResult {
    pub fn compute(total_install: u64, total_download: u64, params: SizeEstimateParams) -> Self {
        let buffer = (u128::from(total_install) * u128::from(params.buffer_percent) / 100) as u64;
        let max_allowed = total_install.saturating_add(buffer);
        let estimated = (max_allowed as f64 * params.compression_ratio).floor() as u64;
        Self {
            total_install_size: total_install,
            total_download_size: total_download,
            buffer_size: buffer,
            max_allowed_size: max_allowed,
            estimated_size: estimated,
            buffer_percent: params.buffer_percent,
            compression_ratio: params.compression_ratio,
        }
    }
}

/// Full estimation outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeEstimate {
    pub packages: Vec<PackageSizeInfo>,
    /// Names that matched nothing
    pub skipped: Vec<String>,
    #[serde(flatten)]
    pub summary: SizeEstimateResult,
}

pub struct SizeEstimator<'a, P: PackageInfoProvider + ?Sized> {
    provider: &'a P,
    params: SizeEstimateParams,
}

impl<'a, P: PackageInfoProvider + ?Sized> SizeEstimator<'a, P> {
    pub fn new(provider: &'a P, params: SizeEstimateParams) -> Self {
        Self { provider, params }
    }

    /// Resolve every name among available packages and sum their sizes
    ///
    /// Unmatched names are skipped; if nothing contributes any install size
    /// the result is `Error::NoData`.
    pub fn estimate(&self, names: &[String]) -> Result<SizeEstimate> {
        let mut packages = Vec::new();
        let mut skipped = Vec::new();

        for name in names {
            match self.provider.package_info(Scope::Available, &[name.as_str()]) {
                Ok(found) if !found.is_empty() => packages.extend(found),
                Ok(_) | Err(Error::NoMatch(_)) => {
                    warn!("No package matches '{}', skipping", name);
                    skipped.push(name.clone());
                }
                Err(e) => return Err(e),
            }
        }

        let total_install = checked_total(&packages, "install", |p| p.install_size)?;
        let total_download = checked_total(&packages, "download", |p| p.download_size)?;
        if total_install == 0 {
            return Err(Error::NoData(
                "no install size to estimate from".to_string(),
            ));
        }
        debug!(
            "{} packages, {} bytes installed, {} bytes downloaded",
            packages.len(),
            total_install,
            total_download
        );

        Ok(SizeEstimate {
            packages,
            skipped,
            summary: SizeEstimateResult::compute(total_install, total_download, self.params),
        })
    }
}

/// Sum one size field, rejecting totals that do not fit in 64 bits
fn checked_total(
    packages: &[PackageSizeInfo],
    what: &str,
    size: impl Fn(&PackageSizeInfo) -> u64,
) -> Result<u64> {
    packages.iter().try_fold(0u64, |total, p| {
        total.checked_add(size(p)).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "total {} size overflows at package {} {}",
                what, p.name, p.version
            ))
        })
    })
}

/// [`PackageInfoProvider`] over a loaded pool
///
/// A spec is a name glob or full NEVRA. For available packages only the
/// newest version per name and arch is reported.
pub struct PoolPackageInfo<'p> {
    pool: &'p Pool,
}

impl<'p> PoolPackageInfo<'p> {
    pub fn new(pool: &'p Pool) -> Self {
        Self { pool }
    }
}

impl PackageInfoProvider for PoolPackageInfo<'_> {
    fn package_info(&self, scope: Scope, specs: &[&str]) -> Result<Vec<PackageSizeInfo>> {
        let mut query = Query::new(self.pool);
        query.apply_scope(scope);
        for spec in specs {
            query.filter_spec(spec)?;
        }
        let mut ids = query.run();
        if scope == Scope::Available {
            ids = newest_per_name_arch(self.pool, &ids);
        }
        if ids.is_empty() {
            return Err(Error::NoMatch(specs.join(" ")));
        }

        Ok(ids
            .into_iter()
            .map(|id| {
                let s = self.pool.solvable(id);
                PackageSizeInfo {
                    name: self.pool.name(id).to_string(),
                    version: self.pool.evr(id).to_string(),
                    install_size: s.install_size,
                    download_size: s.download_size,
                }
            })
            .collect())
    }
}

/// How `size-estimate` prints its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The estimate in bytes, nothing else
    #[default]
    Plain,
    Verbose,
    Json,
}

pub fn render(estimate: &SizeEstimate, mode: OutputMode) -> Result<String> {
    match mode {
        OutputMode::Plain => Ok(format!("{}\n", estimate.summary.estimated_size)),
        OutputMode::Json => Ok(format!("{}\n", serde_json::to_string_pretty(estimate)?)),
        OutputMode::Verbose => Ok(render_verbose(estimate)),
    }
}

fn render_verbose(estimate: &SizeEstimate) -> String {
    let s = &estimate.summary;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<32} {:<24} {:>12} {:>12}",
        "Package", "Version", "Installed", "Download"
    );
    for p in &estimate.packages {
        let _ = writeln!(
            out,
            "{:<32} {:<24} {:>12} {:>12}",
            p.name,
            p.version,
            format_size(p.install_size),
            format_size(p.download_size)
        );
    }
    for name in &estimate.skipped {
        let _ = writeln!(out, "{:<32} (no match)", name);
    }
    out.push('\n');

    let rows = [
        ("Total install size", s.total_install_size),
        ("Total download size", s.total_download_size),
        ("Buffer", s.buffer_size),
        ("Max uncompressed size", s.max_allowed_size),
        ("Estimated compressed size", s.estimated_size),
    ];
    for (label, bytes) in rows {
        let _ = writeln!(out, "{:<27} {:>12} ({} bytes)", label, format_size(bytes), bytes);
    }
    let _ = writeln!(out, "{:<27} {:>11}%", "Buffer percent", s.buffer_percent);
    let _ = writeln!(out, "{:<27} {:>12}", "Compression ratio", s.compression_ratio);
    out
}

/// Format bytes as a human-readable size
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
