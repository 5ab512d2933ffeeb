use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::{self, ChunkSlots};
use crate::data::{ChunkResult, ChunkSpec, FailurePolicy, FetchOptions, FetchPhase, Progress};
use crate::effects::http::HttpClient;
use crate::error::{Error, Result};

/// Message sent by a chunk task when it finishes.
type Completion = (u32, Result<ChunkResult>);

/// Upper bound on the body buffer reserved before any data arrives.
const MAX_PREALLOCATE: u64 = 8 * 1024 * 1024;

/// Fetches one resource as concurrent byte ranges and reassembles it.
///
/// The client is shared between chunk tasks through an [`Arc`], so one
/// connection pool serves the whole download.
pub struct RangeFetcher<C: HttpClient> {
    client: Arc<C>,
    options: FetchOptions,
}

impl<C: HttpClient + 'static> RangeFetcher<C> {
    /// Create a new fetcher with default options.
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            options: FetchOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetch a single chunk.
    ///
    /// Sends one GET with a `Range` header covering `spec` and buffers the
    /// whole body. The response is validated according to the configured
    /// [`FailurePolicy`].
    pub async fn fetch_chunk(&self, url: &str, spec: ChunkSpec) -> Result<ChunkResult> {
        fetch_range(self.client.as_ref(), url, spec, &self.options).await
    }

    /// Query the resource length with a HEAD request.
    pub async fn probe_length(&self, url: &str) -> Result<Option<u64>> {
        self.client
            .head(url)
            .await
            .map_err(|e| Error::Probe(e.to_string()))
    }

    /// Download `chunk_count` chunks of `chunk_size` bytes concurrently and
    /// return them concatenated in index order.
    ///
    /// The first failing chunk aborts every chunk still in flight and its
    /// error is returned.
    pub async fn fetch_and_assemble(
        &self,
        url: &str,
        chunk_size: u64,
        chunk_count: u32,
    ) -> Result<Bytes> {
        let mut specs = core::plan(chunk_size, chunk_count)?;

        if self.options.probe_length {
            match self.probe_length(url).await? {
                Some(total) => {
                    specs = core::clip_to_length(specs, total);
                    debug!(total, chunks = specs.len(), "clipped plan to probed length");
                }
                None => debug!("server did not report a length, keeping full plan"),
            }
        }

        info!(url, chunk_size, chunks = specs.len(), "starting ranged download");

        match self.options.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.fetch_all(url, specs))
                .await
                .map_err(|_| Error::DeadlineExceeded(deadline))?,
            None => self.fetch_all(url, specs).await,
        }
    }

    async fn fetch_all(&self, url: &str, specs: Vec<ChunkSpec>) -> Result<Bytes> {
        let total_chunks = specs.len() as u32;
        let bytes_requested: u64 = specs.iter().map(ChunkSpec::len).sum();
        let mut progress = Progress {
            phase: FetchPhase::Planned,
            chunks_completed: 0,
            total_chunks,
            bytes_downloaded: 0,
            bytes_requested,
            chunk_index: None,
        };
        self.report_progress(&progress);

        let (tx, mut rx) = mpsc::channel::<Completion>(specs.len().max(1));
        let limiter = self
            .options
            .max_concurrent
            .map(|n| Arc::new(Semaphore::new(n.get())));
        let url: Arc<str> = Arc::from(url);
        let mut tasks = JoinSet::new();

        for spec in &specs {
            let spec = *spec;
            let client = Arc::clone(&self.client);
            let options = self.options.clone();
            let limiter = limiter.clone();
            let url = Arc::clone(&url);
            let tx = tx.clone();

            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            let _ = tx.send((spec.index, Err(Error::Task(e.to_string())))).await;
                            return;
                        }
                    },
                    None => None,
                };
                let result = fetch_range(client.as_ref(), &url, spec, &options).await;
                let _ = tx.send((spec.index, result)).await;
            });
        }
        drop(tx);

        let mut slots = ChunkSlots::new(specs.len());
        progress.phase = FetchPhase::Downloading;

        while let Some((index, result)) = rx.recv().await {
            let chunk = match result {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(index, error = %e, "chunk failed, aborting remaining requests");
                    tasks.abort_all();
                    return Err(e);
                }
            };

            progress.bytes_downloaded += chunk.data.len() as u64;
            slots.insert(chunk)?;
            progress.chunks_completed = slots.filled() as u32;
            progress.chunk_index = Some(index);
            self.report_progress(&progress);
        }

        // Every sender is gone; surface panics before reading the slots.
        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| Error::Task(e.to_string()))?;
        }

        progress.phase = FetchPhase::Assembling;
        progress.chunk_index = None;
        self.report_progress(&progress);

        let output = slots.assemble()?;
        info!(bytes = output.len(), chunks = total_chunks, "assembled download");

        progress.phase = FetchPhase::Completed;
        self.report_progress(&progress);

        Ok(output)
    }

    /// Report progress if callback is configured.
    fn report_progress(&self, progress: &Progress) {
        if let Some(ref callback) = self.options.on_progress {
            callback(progress);
        }
    }
}

async fn fetch_range<C: HttpClient>(
    client: &C,
    url: &str,
    spec: ChunkSpec,
    options: &FetchOptions,
) -> Result<ChunkResult> {
    match options.request_timeout {
        Some(timeout) => tokio::time::timeout(timeout, request_range(client, url, spec, options))
            .await
            .map_err(|_| Error::Timeout {
                index: spec.index,
                timeout,
            })?,
        None => request_range(client, url, spec, options).await,
    }
}

async fn request_range<C: HttpClient>(
    client: &C,
    url: &str,
    spec: ChunkSpec,
    options: &FetchOptions,
) -> Result<ChunkResult> {
    let index = spec.index;
    let network = |e: C::Error| Error::Network {
        index,
        message: e.to_string(),
    };

    let mut headers: Vec<(String, String)> = options.headers.iter().cloned().collect();
    headers.push(("Range".to_string(), core::range_header(&spec)));

    debug!(index, start = spec.start, end = spec.end, "requesting chunk");
    let response = client.get(url, &headers).await.map_err(network)?;
    let status = response.status;

    let expected = response.content_length.unwrap_or(spec.len()).min(spec.len());
    let capacity = usize::try_from(expected.min(MAX_PREALLOCATE)).unwrap_or(0);
    let mut buffer = BytesMut::with_capacity(capacity);
    let mut body = response.body;
    while let Some(piece) = body.next().await {
        buffer.extend_from_slice(&piece.map_err(network)?);
    }
    let data = buffer.freeze();

    let data = match options.policy {
        FailurePolicy::Strict => {
            core::validate_response(
                &spec,
                status,
                response.content_range.as_deref(),
                data.len() as u64,
            )?;
            if status == 416 {
                debug!(index, "chunk starts past the end of the resource");
                Bytes::new()
            } else {
                data
            }
        }
        FailurePolicy::Lenient => {
            if !core::is_success(status) {
                warn!(index, status, "keeping body of unsuccessful chunk response");
            }
            data
        }
    };

    debug!(index, status, bytes = data.len(), "chunk complete");
    Ok(ChunkResult { index, data })
}
