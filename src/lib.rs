//! Sequential, resumable batch downloader for `<title> - <url>` lists.

pub mod cli;
pub mod commands;
pub mod config;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod progress;
pub mod providers;
pub mod state;
pub mod utils;

pub use config::EngineConfig;
pub use downloader::Downloader;
pub use error::{ErrorKind, SourceError, TransferError};
pub use progress::{ConsoleProgress, NoProgress, ProgressSink};
pub use providers::DownloadRequest;
pub use state::{SkipReason, TransferMode, TransferOutcome};
