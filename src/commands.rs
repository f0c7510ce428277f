use anyhow::{Context, Result};
use indicatif::HumanBytes;
use std::path::Path;
use tokio::fs;

use crate::config::EngineConfig;
use crate::downloader::Downloader;
use crate::error::SourceError;
use crate::progress::{ConsoleProgress, NoProgress, ProgressSink};
use crate::providers::{self, DownloadRequest};
use crate::state::{SkipReason, TransferOutcome};

/// Tallies for one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_written: u64,
    pub input_missing: bool,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Skipped { .. } => self.skipped += 1,
            TransferOutcome::Completed { bytes_written } => {
                self.completed += 1;
                self.bytes_written += bytes_written;
            }
            TransferOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// 0 when every item completed or was skipped; 1 on a missing list or any failure.
    pub fn exit_code(&self) -> u8 {
        if self.input_missing || self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Downloads every entry of `list_path` into `download_folder`, one at a time.
pub async fn run_downloads(
    list_path: &Path,
    download_folder: &Path,
    config: EngineConfig,
    show_progress: bool,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    let requests = match providers::read_request_list(list_path, download_folder).await {
        Ok(requests) => requests,
        Err(e @ SourceError::InputNotFound(_)) => {
            tracing::warn!(kind = %e.kind(), "{}", e);
            println!("The file '{}' does not exist.", list_path.display());
            summary.input_missing = true;
            Vec::new()
        }
        Err(e) => return Err(e).context("Failed to read the video list"),
    };

    if requests.is_empty() {
        println!("No videos found to download.");
        return Ok(summary);
    }

    if !download_folder.exists() {
        fs::create_dir_all(download_folder)
            .await
            .context("Failed to create download folder")?;
    }

    let downloader = Downloader::new(config).context("Failed to build HTTP client")?;
    let progress: Box<dyn ProgressSink> = if show_progress {
        Box::new(ConsoleProgress::new())
    } else {
        Box::new(NoProgress)
    };

    for request in &requests {
        let outcome = downloader.download(request, progress.as_ref()).await;
        report(&downloader, request, &outcome);
        summary.record(&outcome);
        println!();
    }

    println!(
        "Summary: Completed: {} | Skipped: {} | Failed: {} | Downloaded: {}",
        summary.completed,
        summary.skipped,
        summary.failed,
        HumanBytes(summary.bytes_written)
    );
    Ok(summary)
}

fn report(downloader: &Downloader, request: &DownloadRequest, outcome: &TransferOutcome) {
    if let TransferOutcome::Failed { kind, .. } = outcome {
        tracing::warn!(%kind, title = %request.title, "item failed");
    }
    println!("{}", describe(downloader, request, outcome));
}

fn describe(downloader: &Downloader, request: &DownloadRequest, outcome: &TransferOutcome) -> String {
    let title = &request.title;
    match outcome {
        TransferOutcome::Skipped {
            reason: SkipReason::AlreadyComplete { .. },
        } => format!("'{}' is already fully downloaded. Skipping download.", title),
        TransferOutcome::Completed { .. } => format!(
            "'{}' downloaded successfully to '{}'.",
            title,
            downloader.destination_for(request).display()
        ),
        TransferOutcome::Failed { message, .. } => {
            format!("Failed to download '{}': {}", title, message)
        }
    }
}
