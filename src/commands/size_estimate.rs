// src/commands/size_estimate.rs
//! Size estimation command

use super::{load_config, open_sack, GlobalOptions};
use anyhow::{Context, Result};
use pkgmgr::size_estimate::{
    render, OutputMode, PoolPackageInfo, SizeEstimateParams, SizeEstimator,
};
use std::io::Write;

pub fn cmd_size_estimate(opts: &GlobalOptions, packages: &[String]) -> Result<()> {
    let mut config = load_config(opts)?;
    let params = SizeEstimateParams::from_setopts(&config)?;
    let (sack, _) = open_sack(&mut config, opts)?;

    let provider = PoolPackageInfo::new(sack.pool());
    let estimate = SizeEstimator::new(&provider, params)
        .estimate(packages)
        .context("Size estimation failed")?;

    let mode = if opts.json {
        OutputMode::Json
    } else if opts.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Plain
    };
    let out = render(&estimate, mode)?;
    std::io::stdout().write_all(out.as_bytes())?;
    Ok(())
}
