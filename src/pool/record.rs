// src/pool/record.rs

//! Package records as stored in repository metadata and the solver cache

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One package entry of `primary.json` (and of the installed database)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageRecord {
    pub name: String,
    pub epoch: u64,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub summary: String,
    /// Path of the package file relative to the repo baseurl
    pub location: Option<String>,
    pub sourcerpm: Option<String>,
    pub install_size: u64,
    pub download_size: u64,
    pub files: Vec<String>,
    pub provides: Vec<String>,
    pub obsoletes: Vec<String>,
    pub conflicts: Vec<String>,
    pub requires: Vec<String>,
    pub requires_pre: Vec<String>,
    pub recommends: Vec<String>,
    pub suggests: Vec<String>,
    pub supplements: Vec<String>,
    pub enhances: Vec<String>,
}

impl PackageRecord {
    /// Minimal record, mostly useful for building pools by hand
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        release: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            release: release.into(),
            arch: arch.into(),
            ..Default::default()
        }
    }

    /// `[epoch:]version-release`, epoch omitted when zero
    pub fn evr(&self) -> String {
        if self.epoch > 0 {
            format!("{}:{}-{}", self.epoch, self.version, self.release)
        } else {
            format!("{}-{}", self.version, self.release)
        }
    }
}

/// Top-level layout of a `primary.json` file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
}

/// Read package records from a metadata or cache file
pub fn read_records(path: &Path) -> Result<Vec<PackageRecord>> {
    let data = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::system(format!("Failed to read {}", path.display()), e)
        }
    })?;
    let metadata: RepoMetadata = serde_json::from_slice(&data)?;
    Ok(metadata.packages)
}

/// Write package records, replacing the file wholesale
pub fn write_records(path: &Path, packages: &[PackageRecord]) -> Result<()> {
    let metadata = RepoMetadata {
        packages: packages.to_vec(),
    };
    let data = serde_json::to_vec(&metadata)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::system(format!("Failed to create {}", parent.display()), e))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)
        .map_err(|e| Error::system(format!("Failed to write {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| Error::system(format!("Failed to replace {}", path.display()), e))?;
    Ok(())
}
