//! Error taxonomy for the request source and the transfer engine.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Coarse classification surfaced to the operator in a `Failed` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputNotFound,
    ProbeFailed,
    NetworkFailure,
    FilesystemFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InputNotFound => "input not found",
            ErrorKind::ProbeFailed => "probe failed",
            ErrorKind::NetworkFailure => "network failure",
            ErrorKind::FilesystemFailure => "filesystem failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    /// The advisory HEAD probe gave no usable length. Never fatal to an item.
    #[error("size probe failed: {0}")]
    Probe(String),
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    HttpStatus(StatusCode),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("server sent bytes from {served} but {requested} was requested")]
    RangeMismatch { requested: u64, served: u64 },
    #[error("stream ended early: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    #[error("{}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Probe(_) => ErrorKind::ProbeFailed,
            TransferError::Network(_)
            | TransferError::HttpStatus(_)
            | TransferError::Timeout(_)
            | TransferError::RangeMismatch { .. }
            | TransferError::Truncated { .. } => ErrorKind::NetworkFailure,
            TransferError::Filesystem { .. } => ErrorKind::FilesystemFailure,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransferError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("the file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::InputNotFound(_) => ErrorKind::InputNotFound,
            SourceError::Io { .. } => ErrorKind::FilesystemFailure,
        }
    }
}
