use futures::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderName};
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

use crate::config::EngineConfig;
use crate::error::TransferError;
use crate::progress::ProgressSink;
use crate::providers::DownloadRequest;
use crate::state::{EngineState, SkipReason, TransferMode, TransferOutcome};
use crate::utils::destination_path;

/// Result of the streaming step, before it is folded into a `TransferOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResult {
    Completed { bytes_written: u64 },
    /// The server had nothing past the local size (416, or an unranged body no longer than it).
    AlreadyComplete,
}

pub struct Downloader {
    client: Client,
    config: EngineConfig,
}

impl Downloader {
    pub fn new(config: EngineConfig) -> Result<Self, TransferError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn destination_for(&self, request: &DownloadRequest) -> PathBuf {
        destination_path(&request.destination_folder, &request.title, &self.config.extension)
    }

    /// Runs one request through probe, decide and fetch. Never fails: every
    /// error is folded into `TransferOutcome::Failed`.
    #[tracing::instrument(skip_all, fields(title = %request.title))]
    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: &dyn ProgressSink,
    ) -> TransferOutcome {
        let mut state = EngineState::Init(request.clone());
        loop {
            state = match state {
                EngineState::Done(outcome) => {
                    tracing::info!(?outcome, "transfer finished");
                    return outcome;
                }
                other => self.step(other, progress).await,
            };
        }
    }

    async fn step(&self, state: EngineState, progress: &dyn ProgressSink) -> EngineState {
        match state {
            EngineState::Init(request) => EngineState::ProbeAndDecide(request),
            EngineState::ProbeAndDecide(request) => {
                let path = self.destination_for(&request);
                match self.reconcile(&path, &request.source_url).await {
                    Ok(TransferMode::AlreadyComplete {
                        local_size,
                        remote_size,
                    }) => EngineState::Skip(SkipReason::AlreadyComplete {
                        local_size,
                        remote_size: Some(remote_size),
                    }),
                    Ok(mode) => EngineState::Fetch {
                        offset: mode.start_offset().unwrap_or(0),
                        request,
                    },
                    Err(e) => EngineState::Done(failed(e)),
                }
            }
            EngineState::Skip(reason) => EngineState::Done(TransferOutcome::Skipped { reason }),
            EngineState::Fetch { request, offset } => {
                let path = self.destination_for(&request);
                let outcome = match self
                    .fetch(&request.source_url, offset, &path, &request.title, progress)
                    .await
                {
                    Ok(FetchResult::Completed { bytes_written }) => {
                        TransferOutcome::Completed { bytes_written }
                    }
                    Ok(FetchResult::AlreadyComplete) => TransferOutcome::Skipped {
                        reason: SkipReason::AlreadyComplete {
                            local_size: offset,
                            remote_size: None,
                        },
                    },
                    Err(e) => failed(e),
                };
                EngineState::Done(outcome)
            }
            done @ EngineState::Done(_) => done,
        }
    }

    /// Decides the transfer mode from the local file and an advisory HEAD probe.
    pub async fn reconcile(&self, path: &Path, url: &str) -> Result<TransferMode, TransferError> {
        let local_size = match fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist, fresh download", path.display());
                return Ok(TransferMode::FreshDownload);
            }
            Err(e) => return Err(TransferError::filesystem(path, e)),
        };

        let mode = match self.probe_remote_size(url).await {
            Ok(remote_size) if local_size >= remote_size => TransferMode::AlreadyComplete {
                local_size,
                remote_size,
            },
            Ok(_) => TransferMode::ResumeFromOffset(local_size),
            Err(e) => {
                tracing::warn!("{}; resuming from {} anyway", e, local_size);
                TransferMode::ResumeFromOffset(local_size)
            }
        };
        tracing::debug!(?mode, local_size, "reconciled {}", path.display());
        Ok(mode)
    }

    /// HEAD request for `Content-Length`. Any failure maps to `TransferError::Probe`.
    pub async fn probe_remote_size(&self, url: &str) -> Result<u64, TransferError> {
        let limit = self.config.connect_timeout();
        let response = timeout(limit, self.client.head(url).send())
            .await
            .map_err(|_| TransferError::Probe(format!("no response within {:?}", limit)))?
            .map_err(|e| TransferError::Probe(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TransferError::Probe(format!("HTTP {}", response.status())));
        }
        // Response::content_length() reports the (empty) HEAD body, so read the header.
        header_u64(response.headers(), header::CONTENT_LENGTH)
            .ok_or_else(|| TransferError::Probe("no usable Content-Length".to_string()))
    }

    /// Streams `url` into `path`, appending from `offset`. Bytes already on
    /// disk stay there on error.
    pub async fn fetch(
        &self,
        url: &str,
        offset: u64,
        path: &Path,
        label: &str,
        progress: &dyn ProgressSink,
    ) -> Result<FetchResult, TransferError> {
        let mut request = self.client.get(url);
        if offset > 0 {
            let range = format!("bytes={}-", offset);
            tracing::debug!("requesting Range: {}", range);
            request = request.header(header::RANGE, range);
        }

        // Covers connect plus response headers; the body stream itself has no deadline.
        let limit = self.config.connect_timeout();
        let response = timeout(limit, request.send())
            .await
            .map_err(|_| TransferError::Timeout(limit))??;
        let status = response.status();
        if offset > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
            tracing::debug!("server has nothing past byte {}", offset);
            return Ok(FetchResult::AlreadyComplete);
        }
        if !status.is_success() {
            return Err(TransferError::HttpStatus(status));
        }

        let plan = BodyPlan::from_response(&response, offset)?;
        if plan.discard > 0 {
            tracing::warn!("body starts before byte {}, skipping first {} bytes", offset, plan.discard);
            if matches!(plan.expected, Some(0)) {
                return Ok(FetchResult::AlreadyComplete);
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| TransferError::filesystem(path, e))?;

        progress.start(label, offset, plan.total);
        let streamed = self
            .stream_to_file(response, &mut file, path, offset, &plan, progress)
            .await;
        let flushed = file
            .flush()
            .await
            .map_err(|e| TransferError::filesystem(path, e));
        progress.finish(label);

        let (written, leftover_discard) = streamed?;
        flushed?;

        if leftover_discard > 0 {
            return Ok(FetchResult::AlreadyComplete);
        }
        if let Some(expected) = plan.expected {
            if written < expected {
                return Err(TransferError::Truncated {
                    expected,
                    received: written,
                });
            }
        }
        Ok(FetchResult::Completed {
            bytes_written: written,
        })
    }

    async fn stream_to_file(
        &self,
        response: Response,
        file: &mut File,
        path: &Path,
        offset: u64,
        plan: &BodyPlan,
        progress: &dyn ProgressSink,
    ) -> Result<(u64, u64), TransferError> {
        let chunk_size = self.config.chunk_size.max(1);
        let mut stream = response.bytes_stream();
        let mut discard = plan.discard;
        let mut position = offset;
        let mut written = 0u64;

        while let Some(item) = stream.next().await {
            let mut chunk = item?;
            if discard > 0 {
                let n = discard.min(chunk.len() as u64);
                chunk = chunk.slice(n as usize..);
                discard -= n;
            }
            for piece in chunk.chunks(chunk_size) {
                file.write_all(piece)
                    .await
                    .map_err(|e| TransferError::filesystem(path, e))?;
                written += piece.len() as u64;
                position += piece.len() as u64;
                progress.update(position, plan.total);
            }
        }
        Ok((written, discard))
    }
}

fn failed(e: TransferError) -> TransferOutcome {
    TransferOutcome::Failed {
        kind: e.kind(),
        message: e.to_string(),
    }
}

/// What to expect from a successful GET body given the requested offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BodyPlan {
    /// Leading bytes to drop: a 200 reply to a ranged request, or a 206 starting too early.
    discard: u64,
    /// Bytes that should be appended, if the server said.
    expected: Option<u64>,
    /// Final file size for progress, if known.
    total: Option<u64>,
}

impl BodyPlan {
    fn from_response(response: &Response, offset: u64) -> Result<Self, TransferError> {
        Self::from_parts(response.status(), response.headers(), offset)
    }

    fn from_parts(
        status: StatusCode,
        headers: &HeaderMap,
        offset: u64,
    ) -> Result<Self, TransferError> {
        let body_len = header_u64(headers, header::CONTENT_LENGTH);
        if status != StatusCode::PARTIAL_CONTENT {
            return Ok(BodyPlan {
                discard: offset,
                expected: body_len.map(|len| len.saturating_sub(offset)),
                total: body_len.map(|len| len.max(offset)),
            });
        }

        let served = content_range_start(headers).unwrap_or(offset);
        if served > offset {
            return Err(TransferError::RangeMismatch {
                requested: offset,
                served,
            });
        }
        let discard = offset - served;
        let total = content_range_total(headers).or(body_len.map(|len| len + served));
        Ok(BodyPlan {
            discard,
            expected: body_len.map(|len| len.saturating_sub(discard)),
            total,
        })
    }
}

fn header_u64(headers: &HeaderMap, name: HeaderName) -> Option<u64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

/// First byte from `Content-Range: bytes <a>-<b>/<total>`.
fn content_range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::CONTENT_RANGE)?.to_str().ok()?;
    let spec = value.trim().strip_prefix("bytes")?.trim_start();
    let (start, _) = spec.split_once('-')?;
    start.trim().parse::<u64>().ok()
}

/// Total length from `Content-Range: bytes <a>-<b>/<total>` (or `bytes */<total>`).
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::CONTENT_RANGE)?.to_str().ok()?;
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse::<u64>().ok()
}
