// src/lib.rs

//! Package metadata synchronization and solvable queries
//!
//! This crate is the layer between configured repositories and the package
//! pool:
//!
//! - Repository refresh: priority ordering, cache expiry, per-repo failure
//!   policy and snapshot pinning
//! - NEVRA parsing and RPM version comparison
//! - Scope-filtered solvable queries and repoquery
//! - Size estimation for a package list
//! - Validated requests for history, repoquery and reposync
//! - Transaction history (SQLite)
//!
//! Dependency solving, signature verification and RPM transaction execution
//! are outside this crate.

pub mod args;
pub mod config;
mod error;
pub mod history;
pub mod nevra;
pub mod pool;
pub mod query;
pub mod repository;
pub mod size_estimate;

pub use config::Config;
pub use error::{Error, Result};
pub use nevra::{split_name_equals_evr, split_nevra, Nevra};
pub use pool::Pool;
pub use query::{Query, Scope};
pub use repository::{RepoDescriptor, SackRefresher};
