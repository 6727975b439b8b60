// src/args/mod.rs

//! Validated request structures for the history, repoquery and reposync commands
//!
//! Each builder takes options one at a time, rejects invalid combinations as
//! soon as they appear, and produces a request in `build()`. All of this
//! happens before configuration is read or any repo is touched.

mod history;
mod repoquery;
mod reposync;

pub use history::{HistoryCommand, HistoryRequest, HistoryRequestBuilder};
pub use repoquery::{DepKey, RepoqueryRequest, RepoqueryRequestBuilder, WhatKey};
pub use reposync::{ReposyncRequest, ReposyncRequestBuilder};

use crate::error::{Error, Result};

/// Upper bound on architectures in one request
pub const MAX_ARCHS: usize = 10;

/// Append a comma-separated architecture list, keeping order and dropping repeats
pub(crate) fn push_arches(arches: &mut Vec<String>, value: &str) -> Result<()> {
    for arch in value.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        if arches.iter().any(|a| a == arch) {
            continue;
        }
        if arches.len() >= MAX_ARCHS {
            return Err(Error::InvalidParameter(format!(
                "at most {} architectures may be given",
                MAX_ARCHS
            )));
        }
        arches.push(arch.to_string());
    }
    Ok(())
}
