// src/commands/reposync.rs
//! Reposync command

use super::{load_config, open_sack, GlobalOptions};
use crate::cli::ReposyncArgs;
use anyhow::{Context, Result};
use pkgmgr::args::{ReposyncRequest, ReposyncRequestBuilder};
use pkgmgr::repository::reposync;

pub fn build_request(args: &ReposyncArgs) -> pkgmgr::Result<ReposyncRequest> {
    let mut b = ReposyncRequestBuilder::new();
    for arch in &args.arch {
        b.arch(arch)?;
    }
    b.delete(args.delete)
        .download_metadata(args.download_metadata)
        .gpgcheck(args.gpgcheck)
        .newest_only(args.newest_only)
        .norepopath(args.norepopath)
        .source_only(args.source_only)
        .print_urls_only(args.print_urls_only);
    if let Some(path) = &args.download_path {
        b.download_path(path)?;
    }
    if let Some(path) = &args.metadata_path {
        b.metadata_path(path)?;
    }
    b.build()
}

pub fn cmd_reposync(opts: &GlobalOptions, args: &ReposyncArgs) -> Result<()> {
    let req = build_request(args)?;
    let mut config = load_config(opts)?;
    req.check_repo_count(config.enabled_repos().count())?;
    let (sack, _) = open_sack(&mut config, opts)?;

    let repos: Vec<_> = config.enabled_repos().cloned().collect();
    let report = reposync(sack.pool(), &repos, sack.fetcher(), &req).context("Reposync failed")?;

    if req.print_urls_only {
        for url in &report.urls {
            println!("{}", url);
        }
        return Ok(());
    }

    println!(
        "{} downloaded, {} already present, {} deleted",
        report.downloaded.len(),
        report.kept.len(),
        report.deleted.len()
    );
    for dir in &report.metadata {
        println!("Metadata written to {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use pkgmgr::Error;

    fn parse(argv: &[&str]) -> pkgmgr::Result<ReposyncRequest> {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Commands::Reposync(args)) => build_request(&args),
            _ => panic!("not a reposync command"),
        }
    }

    #[test]
    fn test_gpgcheck_fails_before_loading() {
        let err = parse(&["pkgmgr", "reposync", "--gpgcheck"]).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_paths_and_flags() {
        let req = parse(&[
            "pkgmgr",
            "reposync",
            "--newest-only",
            "--download-metadata",
            "--download-path",
            "/srv/mirror",
        ])
        .unwrap();
        assert!(req.newest_only && req.download_metadata);
        assert_eq!(req.download_path, Some("/srv/mirror".into()));
    }
}
