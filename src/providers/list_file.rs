//! Reads `<title> - <url>` lines into download requests.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::DownloadRequest;
use crate::error::SourceError;

const SEPARATOR: &str = " - ";

/// Splits a line on the first `" - "`. Lines without it, or with an empty side, are skipped.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let (title, url) = line.trim().split_once(SEPARATOR)?;
    let (title, url) = (title.trim(), url.trim());
    if title.is_empty() || url.is_empty() {
        return None;
    }
    Some((title.to_string(), url.to_string()))
}

pub async fn read_request_list(
    path: &Path,
    destination_folder: &Path,
) -> Result<Vec<DownloadRequest>, SourceError> {
    let file = fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SourceError::InputNotFound(path.to_path_buf()),
        _ => SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut lines = BufReader::new(file).lines();
    let mut requests = Vec::new();
    let mut skipped = 0usize;
    loop {
        let line = lines.next_line().await.map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let Some(line) = line else { break };
        match parse_line(&line) {
            Some((title, url)) => requests.push(DownloadRequest {
                title,
                source_url: url,
                destination_folder: PathBuf::from(destination_folder),
            }),
            None => {
                if !line.trim().is_empty() {
                    skipped += 1;
                }
            }
        }
    }

    tracing::debug!(
        "read {} requests from {} ({} malformed lines skipped)",
        requests.len(),
        path.display(),
        skipped
    );
    Ok(requests)
}
