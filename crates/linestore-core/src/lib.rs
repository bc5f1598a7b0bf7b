//! linestore — Flat Text Files as Line Collections (core library)
//!
//! This crate provides the line-store engine used by the `linestore` CLI and the
//! Python binding: an ordered collection of lines loaded from a file, with
//! uniqueness and sort policies, dirty tracking, search, replace and persist.

mod input;
mod log;
mod policy;
mod store;

pub use input::{split_lines, LineInput};
pub use log::{EventLog, Identity};
pub use policy::PolicyFlag;
pub use store::{LineStore, StoreOptions};

use thiserror::Error;

/// Library error type.
///
/// Missing data (an absent line, a search with no hits) is never an error;
/// these variants cover I/O failures, bad arguments and corrupted policy state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store has no backing file to write to")]
    NoSourcePath,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("policy flag `{flag}` is not true or false (got {value:?})")]
    InvalidPolicyState { flag: &'static str, value: String },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl StoreError {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_string(),
            }
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }

    /// Whether this error came from the file system (open, read, write) rather than
    /// from the caller's arguments or the store's state.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::Io { .. } | Self::NoSourcePath
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn not_found_maps_to_file_not_found() {
        let err = StoreError::io(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, StoreError::FileNotFound { ref path } if path == "/nope"));
        assert!(err.is_io());
    }

    #[test]
    fn other_io_kinds_keep_source() {
        let err = StoreError::io(
            "/etc/hosts",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(err.to_string().contains("/etc/hosts"));
    }

    #[test]
    fn pattern_errors_are_not_io() {
        let err: StoreError = regex::Regex::new("(").unwrap_err().into();
        assert!(!err.is_io());
        assert!(err.to_string().starts_with("invalid pattern"));
    }

    #[test]
    fn open_add_persist_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        std::fs::write(&path, "127.0.0.1 localhost\n").unwrap();

        let mut store = LineStore::open(path.to_str().unwrap()).unwrap();
        assert!(store.add("10.0.0.1 host01").unwrap());
        store.persist().unwrap();

        let again = LineStore::open(path.to_str().unwrap()).unwrap();
        assert_eq!(again.lines(), ["127.0.0.1 localhost", "10.0.0.1 host01"]);
    }
}
