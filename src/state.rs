use std::fmt;

use crate::error::ErrorKind;
use crate::providers::DownloadRequest;

/// How a transfer should begin, decided before any content bytes move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    FreshDownload,
    AlreadyComplete { local_size: u64, remote_size: u64 },
    ResumeFromOffset(u64),
}

impl TransferMode {
    /// Byte offset the fetch starts at; `None` when nothing should be fetched.
    pub fn start_offset(&self) -> Option<u64> {
        match self {
            TransferMode::FreshDownload => Some(0),
            TransferMode::AlreadyComplete { .. } => None,
            TransferMode::ResumeFromOffset(offset) => Some(*offset),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `remote_size` is `None` when the server answered a ranged GET with 416.
    AlreadyComplete {
        local_size: u64,
        remote_size: Option<u64>,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyComplete { .. } => f.write_str("already complete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Skipped { reason: SkipReason },
    /// `bytes_written` counts only bytes appended by this invocation.
    Completed { bytes_written: u64 },
    Failed { kind: ErrorKind, message: String },
}

/// Lifecycle of one engine invocation. Each request gets a fresh machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Init(DownloadRequest),
    ProbeAndDecide(DownloadRequest),
    Skip(SkipReason),
    Fetch { request: DownloadRequest, offset: u64 },
    Done(TransferOutcome),
}
