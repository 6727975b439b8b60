// src/error.rs

//! Error types for the metadata and query layer

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by refresh, query, estimation and argument validation
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// A query found nothing. Callers decide whether that is fatal.
    #[error("No match for: {0}")]
    NoMatch(String),

    /// An aggregate had nothing to work with.
    #[error("No data: {0}")]
    NoData(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{context}: {source}")]
    System {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Only one dependency key option may be given")]
    OneDepOnly,

    #[error("A query format cannot be combined with a dependency key option")]
    MixedQueryFormat,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Wrap an I/O error with a short description of what was attempted
    pub fn system(context: impl Into<String>, source: io::Error) -> Self {
        Error::System {
            context: context.into(),
            source,
        }
    }

    /// True for `EACCES` system errors
    ///
    /// Refresh never tolerates these, even for skip-if-unavailable repos.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::System { source, .. } => source.raw_os_error() == Some(libc::EACCES),
            _ => false,
        }
    }

    /// True when the error only says "nothing matched"
    pub fn is_no_match(&self) -> bool {
        matches!(self, Error::NoMatch(_))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::system("I/O error", err)
    }
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_detection() {
        let err = Error::system("load repo", io::Error::from_raw_os_error(libc::EACCES));
        assert!(err.is_permission_denied());

        let err = Error::system("load repo", io::Error::from_raw_os_error(libc::ENOENT));
        assert!(!err.is_permission_denied());

        assert!(!Error::NoMatch("bash".to_string()).is_permission_denied());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::OneDepOnly.to_string(),
            "Only one dependency key option may be given"
        );
        let err = Error::FileNotFound(PathBuf::from("/tmp/missing"));
        assert_eq!(err.to_string(), "File not found: /tmp/missing");
    }
}
