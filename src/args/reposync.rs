// src/args/reposync.rs

//! `reposync` request

use super::push_arches;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// A validated reposync request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReposyncRequest {
    pub arches: Vec<String>,
    /// Remove local packages no longer in the repo
    pub delete: bool,
    pub download_metadata: bool,
    pub gpgcheck: bool,
    pub newest_only: bool,
    /// Do not add the repo id to the download path
    pub norepopath: bool,
    pub source_only: bool,
    pub print_urls_only: bool,
    pub download_path: Option<PathBuf>,
    pub metadata_path: Option<PathBuf>,
}

impl ReposyncRequest {
    /// `norepopath` puts every repo in the same directory, so it takes exactly one
    pub fn check_repo_count(&self, count: usize) -> Result<()> {
        if self.norepopath && count > 1 {
            return Err(Error::InvalidParameter(format!(
                "--norepopath can only be used with a single repo ({} enabled)",
                count
            )));
        }
        Ok(())
    }
}

/// Builder for [`ReposyncRequest`]
#[derive(Debug, Default)]
pub struct ReposyncRequestBuilder {
    req: ReposyncRequest,
}

impl ReposyncRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arch(&mut self, value: &str) -> Result<&mut Self> {
        push_arches(&mut self.req.arches, value)?;
        Ok(self)
    }

    pub fn delete(&mut self, v: bool) -> &mut Self {
        self.req.delete |= v;
        self
    }

    pub fn download_metadata(&mut self, v: bool) -> &mut Self {
        self.req.download_metadata |= v;
        self
    }

    pub fn gpgcheck(&mut self, v: bool) -> &mut Self {
        self.req.gpgcheck |= v;
        self
    }

    pub fn newest_only(&mut self, v: bool) -> &mut Self {
        self.req.newest_only |= v;
        self
    }

    pub fn norepopath(&mut self, v: bool) -> &mut Self {
        self.req.norepopath |= v;
        self
    }

    pub fn source_only(&mut self, v: bool) -> &mut Self {
        self.req.source_only |= v;
        self
    }

    pub fn print_urls_only(&mut self, v: bool) -> &mut Self {
        self.req.print_urls_only |= v;
        self
    }

    pub fn download_path(&mut self, path: &str) -> Result<&mut Self> {
        self.req.download_path = Some(non_empty_path("download-path", path)?);
        Ok(self)
    }

    pub fn metadata_path(&mut self, path: &str) -> Result<&mut Self> {
        self.req.metadata_path = Some(non_empty_path("metadata-path", path)?);
        Ok(self)
    }

    pub fn build(&self) -> Result<ReposyncRequest> {
        if self.req.gpgcheck {
            return Err(Error::Unsupported(
                "package signature checking".to_string(),
            ));
        }
        if self.req.metadata_path.is_some() && !self.req.download_metadata {
            return Err(Error::InvalidParameter(
                "--metadata-path requires --download-metadata".to_string(),
            ));
        }
        Ok(self.req.clone())
    }
}

fn non_empty_path(option: &str, path: &str) -> Result<PathBuf> {
    if path.trim().is_empty() {
        return Err(Error::InvalidParameter(format!("--{} is empty", option)));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_flags_and_paths() {
        let mut b = ReposyncRequestBuilder::new();
        b.arch("x86_64,noarch").unwrap();
        b.delete(true).newest_only(true).download_metadata(true);
        b.download_path("/srv/mirror").unwrap();
        b.metadata_path("/srv/meta").unwrap();
        let req = b.build().unwrap();

        assert_eq!(req.arches, vec!["x86_64", "noarch"]);
        assert!(req.delete && req.newest_only && req.download_metadata);
        assert!(!req.gpgcheck && !req.norepopath);
        assert_eq!(req.download_path, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(req.metadata_path, Some(PathBuf::from("/srv/meta")));
    }

    #[test]
    fn test_metadata_path_needs_download_metadata() {
        let mut b = ReposyncRequestBuilder::new();
        b.metadata_path("/srv/meta").unwrap();
        assert!(matches!(b.build(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_gpgcheck_rejected_at_build() {
        let mut b = ReposyncRequestBuilder::new();
        b.gpgcheck(true).newest_only(true);
        assert!(matches!(b.build(), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_norepopath_repo_count() {
        let mut b = ReposyncRequestBuilder::new();
        b.norepopath(true);
        let req = b.build().unwrap();
        assert!(req.check_repo_count(1).is_ok());
        assert!(matches!(
            req.check_repo_count(2),
            Err(Error::InvalidParameter(_))
        ));
        assert!(ReposyncRequest::default().check_repo_count(3).is_ok());
    }

    #[test]
    fn test_empty_download_path() {
        assert!(ReposyncRequestBuilder::new().download_path("  ").is_err());
    }
}
