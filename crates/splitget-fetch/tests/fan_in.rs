//! Fan-out/fan-in behavior of `RangeFetcher` against an in-memory server.
//!
//! The fake client answers range requests from a byte buffer and can delay,
//! fail or ignore ranges per chunk, which lets these tests control
//! completion order precisely.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use splitget_fetch::{
    BoxStream, ChunkSpec, Error, FailurePolicy, FetchOptions, FetchPhase, HttpClient,
    HttpResponse, Progress, RangeFetcher,
};

#[derive(Debug)]
struct FakeError(String);

impl std::fmt::Display for FakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FakeError {}

type DelayFn = Arc<dyn Fn(u64) -> Duration + Send + Sync>;

#[derive(Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    cancelled: AtomicUsize,
}

/// Tracks one request; a drop before `finish` means it was cancelled.
struct InFlight {
    counters: Arc<Counters>,
    done: bool,
}

impl InFlight {
    fn start(counters: &Arc<Counters>) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(now, Ordering::SeqCst);
        Self {
            counters: Arc::clone(counters),
            done: false,
        }
    }

    fn finish(mut self) {
        self.done = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.done {
            self.counters.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Clone)]
struct MemoryServer {
    data: Arc<Vec<u8>>,
    delay: DelayFn,
    /// Chunk start offsets answered with `500 boom`.
    error_status_at: Option<u64>,
    /// Chunk start offsets that fail at the transport level.
    transport_error_at: Option<u64>,
    /// Chunk start offsets answered with `416` although they are in range.
    unsatisfiable_at: Option<u64>,
    ignore_ranges: bool,
    /// Stream bodies without a `Content-Length`, as chunked encoding does.
    omit_content_length: bool,
    /// Whether HEAD reports the resource length.
    report_length: bool,
    requests: Arc<Mutex<Vec<String>>>,
    counters: Arc<Counters>,
}

impl MemoryServer {
    fn new(data: &[u8]) -> Self {
        Self {
            data: Arc::new(data.to_vec()),
            delay: Arc::new(|_| Duration::ZERO),
            error_status_at: None,
            transport_error_at: None,
            unsatisfiable_at: None,
            ignore_ranges: false,
            omit_content_length: false,
            report_length: true,
            requests: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    fn with_delay(mut self, delay: impl Fn(u64) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    fn requests(&self) -> Vec<String> {
        let mut requests = self.requests.lock().unwrap().clone();
        requests.sort();
        requests
    }

    fn respond(&self, range: &str) -> (u16, Option<String>, Vec<u8>) {
        let len = self.data.len() as u64;
        if self.ignore_ranges {
            return (200, None, self.data.to_vec());
        }

        let (start, end) = range
            .strip_prefix("bytes=")
            .and_then(|r| r.split_once('-'))
            .map(|(s, e)| (s.parse::<u64>().unwrap(), e.parse::<u64>().unwrap()))
            .unwrap();

        if self.error_status_at == Some(start) {
            return (500, None, b"boom".to_vec());
        }
        if start >= len || self.unsatisfiable_at == Some(start) {
            let page = b"range not satisfiable".to_vec();
            return (416, Some(format!("bytes */{len}")), page);
        }

        let end = end.min(len - 1);
        let body = self.data[start as usize..=end as usize].to_vec();
        (206, Some(format!("bytes {start}-{end}/{len}")), body)
    }
}

impl HttpClient for MemoryServer {
    type Error = FakeError;

    fn get(
        &self,
        _url: &str,
        headers: &[(String, String)],
    ) -> impl std::future::Future<Output = Result<HttpResponse<FakeError>, FakeError>> + Send {
        let range = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("range"))
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        let server = self.clone();

        async move {
            server.requests.lock().unwrap().push(range.clone());
            let guard = InFlight::start(&server.counters);

            let start = range
                .strip_prefix("bytes=")
                .and_then(|r| r.split_once('-'))
                .and_then(|(s, _)| s.parse::<u64>().ok())
                .unwrap_or(0);
            tokio::time::sleep((server.delay)(start)).await;

            if server.transport_error_at == Some(start) {
                guard.finish();
                return Err(FakeError(format!("connection reset at {start}")));
            }

            let (status, content_range, body) = server.respond(&range);
            guard.finish();

            // Split the body to exercise buffering of multi-piece streams.
            let pieces: Vec<Result<Bytes, FakeError>> = body
                .chunks(3)
                .map(|piece| Ok(Bytes::copy_from_slice(piece)))
                .collect();
            let stream: BoxStream<'static, Result<Bytes, FakeError>> =
                Box::pin(futures_util::stream::iter(pieces));

            Ok(HttpResponse {
                status,
                content_range,
                content_length: (!server.omit_content_length).then_some(body.len() as u64),
                body: stream,
            })
        }
    }

    fn head(
        &self,
        _url: &str,
    ) -> impl std::future::Future<Output = Result<Option<u64>, FakeError>> + Send {
        let len = self.report_length.then_some(self.data.len() as u64);
        async move { Ok(len) }
    }
}

const URL: &str = "http://origin.test/file.jar";

fn alphabet(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'A' + (i % 26) as u8).collect()
}

#[tokio::test]
async fn small_case_requests_expected_ranges() {
    let server = MemoryServer::new(b"ABCDEFGH");
    let fetcher = RangeFetcher::new(server.clone());

    let output = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABCDEFGH"));
    assert_eq!(server.requests(), vec!["bytes=0-3", "bytes=4-7"]);
}

#[tokio::test]
async fn reverse_completion_order_still_assembles_forward() {
    let data = alphabet(80);
    let chunk_size = 8u64;
    let server = MemoryServer::new(&data)
        .with_delay(move |start| Duration::from_millis(10 * (10 - start / chunk_size)));

    let order = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&order);
    let options = FetchOptions::default().on_progress(Arc::new(move |p: &Progress| {
        if p.phase == FetchPhase::Downloading {
            seen.lock().unwrap().push(p.chunk_index.unwrap());
        }
    }));
    let fetcher = RangeFetcher::new(server).with_options(options);

    let output = fetcher.fetch_and_assemble(URL, chunk_size, 10).await.unwrap();

    assert_eq!(output.as_ref(), data.as_slice());
    assert_eq!(*order.lock().unwrap(), (0..10).rev().collect::<Vec<u32>>());
}

#[tokio::test]
async fn oversized_last_chunk_yields_real_length() {
    let fetcher = RangeFetcher::new(MemoryServer::new(b"ABCDE"));

    let output = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap();

    assert_eq!(output.len(), 5);
    assert_eq!(output, Bytes::from_static(b"ABCDE"));
}

#[tokio::test]
async fn single_chunk_is_a_plain_ranged_get() {
    let server = MemoryServer::new(b"ABCDEFGH");
    let fetcher = RangeFetcher::new(server.clone());

    let output = fetcher.fetch_and_assemble(URL, 6, 1).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABCDEF"));
    assert_eq!(server.requests(), vec!["bytes=0-5"]);
}

#[tokio::test]
async fn fetch_chunk_returns_one_range() {
    let fetcher = RangeFetcher::new(MemoryServer::new(b"ABCDEFGH"));
    let spec = ChunkSpec { index: 1, start: 4, end: 7 };

    let chunk = fetcher.fetch_chunk(URL, spec).await.unwrap();

    assert_eq!(chunk.index, 1);
    assert_eq!(chunk.data, Bytes::from_static(b"EFGH"));
}

#[tokio::test]
async fn failed_chunk_fails_download_and_cancels_siblings() {
    let mut server = MemoryServer::new(&alphabet(40));
    server.error_status_at = Some(0);
    let server = server.with_delay(|start| {
        if start == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(30)
        }
    });
    let counters = Arc::clone(&server.counters);
    let fetcher = RangeFetcher::new(server);

    let started = Instant::now();
    let err = fetcher.fetch_and_assemble(URL, 10, 4).await.unwrap_err();

    assert!(matches!(err, Error::UnexpectedStatus { index: 0, status: 500 }));
    assert!(started.elapsed() < Duration::from_secs(5));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(counters.cancelled.load(Ordering::SeqCst), 3);
    assert_eq!(counters.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transport_error_is_surfaced() {
    let mut server = MemoryServer::new(b"ABCDEFGH");
    server.transport_error_at = Some(4);
    let fetcher = RangeFetcher::new(server);

    let err = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap_err();

    assert!(matches!(err, Error::Network { index: 1, .. }));
    assert_eq!(err.chunk_index(), Some(1));
}

#[tokio::test]
async fn lenient_policy_passes_error_bodies_through() {
    let mut server = MemoryServer::new(b"ABCDEFGH");
    server.error_status_at = Some(4);
    let fetcher = RangeFetcher::new(server)
        .with_options(FetchOptions::default().policy(FailurePolicy::Lenient));

    let output = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABCDboom"));
}

#[tokio::test]
async fn ignored_range_is_detected() {
    let mut server = MemoryServer::new(b"ABCDEFGH");
    server.ignore_ranges = true;
    let fetcher = RangeFetcher::new(server);

    let err = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap_err();

    assert!(matches!(err, Error::RangeIgnored { .. }));
}

#[tokio::test]
async fn whole_resource_smaller_than_single_chunk_is_accepted_as_200() {
    let mut server = MemoryServer::new(b"ABC");
    server.ignore_ranges = true;
    let fetcher = RangeFetcher::new(server);

    let output = fetcher.fetch_and_assemble(URL, 16, 1).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABC"));
}

#[tokio::test]
async fn chunks_past_end_are_empty_without_probe() {
    let server = MemoryServer::new(b"ABCDE");
    let fetcher = RangeFetcher::new(server.clone());

    let output = fetcher.fetch_and_assemble(URL, 4, 4).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABCDE"));
    assert_eq!(
        server.requests(),
        vec!["bytes=0-3", "bytes=12-15", "bytes=4-7", "bytes=8-11"]
    );
}

#[tokio::test]
async fn unsatisfiable_range_inside_resource_fails() {
    let mut server = MemoryServer::new(b"ABCDEFGH");
    server.unsatisfiable_at = Some(4);
    let fetcher = RangeFetcher::new(server);

    let err = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap_err();

    assert!(matches!(err, Error::UnexpectedStatus { index: 1, status: 416 }));
}

#[tokio::test]
async fn huge_chunk_without_content_length_buffers_what_arrives() {
    let mut server = MemoryServer::new(b"ABCDE");
    server.omit_content_length = true;
    let fetcher = RangeFetcher::new(server);

    for chunk_size in [1u64 << 46, u64::MAX] {
        let output = fetcher.fetch_and_assemble(URL, chunk_size, 1).await.unwrap();
        assert_eq!(output, Bytes::from_static(b"ABCDE"));
    }
}

#[tokio::test]
async fn probe_clips_plan_to_resource_length() {
    let server = MemoryServer::new(b"ABCDE");
    let fetcher =
        RangeFetcher::new(server.clone()).with_options(FetchOptions::default().probe_length(true));

    let output = fetcher.fetch_and_assemble(URL, 4, 4).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABCDE"));
    assert_eq!(server.requests(), vec!["bytes=0-3", "bytes=4-4"]);
}

#[tokio::test]
async fn probe_without_length_keeps_full_plan() {
    let mut server = MemoryServer::new(b"ABCDE");
    server.report_length = false;
    let fetcher =
        RangeFetcher::new(server.clone()).with_options(FetchOptions::default().probe_length(true));

    let output = fetcher.fetch_and_assemble(URL, 4, 3).await.unwrap();

    assert_eq!(output, Bytes::from_static(b"ABCDE"));
    assert_eq!(server.requests().len(), 3);
}

#[tokio::test]
async fn concurrency_limit_bounds_in_flight_requests() {
    let server = MemoryServer::new(&alphabet(64)).with_delay(|_| Duration::from_millis(20));
    let counters = Arc::clone(&server.counters);
    let fetcher = RangeFetcher::new(server)
        .with_options(FetchOptions::default().max_concurrent(NonZeroUsize::new(2)));

    let output = fetcher.fetch_and_assemble(URL, 4, 16).await.unwrap();

    assert_eq!(output.len(), 64);
    assert!(counters.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn unbounded_fan_out_issues_all_requests_at_once() {
    let server = MemoryServer::new(&alphabet(64)).with_delay(|_| Duration::from_millis(50));
    let counters = Arc::clone(&server.counters);
    let fetcher = RangeFetcher::new(server);

    fetcher.fetch_and_assemble(URL, 4, 16).await.unwrap();

    assert_eq!(counters.peak.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn request_timeout_names_the_slow_chunk() {
    let server = MemoryServer::new(b"ABCDEFGH").with_delay(|start| {
        if start == 4 {
            Duration::from_secs(30)
        } else {
            Duration::ZERO
        }
    });
    let fetcher = RangeFetcher::new(server).with_options(
        FetchOptions::default().request_timeout(Some(Duration::from_millis(50))),
    );

    let err = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { index: 1, .. }));
}

#[tokio::test]
async fn deadline_bounds_whole_download() {
    let server = MemoryServer::new(b"ABCDEFGH").with_delay(|_| Duration::from_secs(30));
    let counters = Arc::clone(&server.counters);
    let deadline = Duration::from_millis(50);
    let fetcher =
        RangeFetcher::new(server).with_options(FetchOptions::default().deadline(Some(deadline)));

    let err = fetcher.fetch_and_assemble(URL, 4, 2).await.unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded(d) if d == deadline));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(counters.cancelled.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn progress_reports_every_phase_in_order() {
    let events = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = Arc::clone(&events);
    let options = FetchOptions::default().on_progress(Arc::new(move |p: &Progress| {
        sink.lock().unwrap().push(p.clone());
    }));
    let fetcher = RangeFetcher::new(MemoryServer::new(b"ABCDE")).with_options(options);

    fetcher.fetch_and_assemble(URL, 2, 3).await.unwrap();

    let events = events.lock().unwrap();
    let phases: Vec<FetchPhase> = events.iter().map(|p| p.phase).collect();
    assert_eq!(
        phases,
        vec![
            FetchPhase::Planned,
            FetchPhase::Downloading,
            FetchPhase::Downloading,
            FetchPhase::Downloading,
            FetchPhase::Assembling,
            FetchPhase::Completed,
        ]
    );

    let completed: Vec<u32> = events.iter().map(|p| p.chunks_completed).collect();
    assert_eq!(completed, vec![0, 1, 2, 3, 3, 3]);

    let last = events.last().unwrap();
    assert_eq!(last.bytes_requested, 6);
    assert_eq!(last.bytes_downloaded, 5);
    assert!(last.is_completed());
}

#[tokio::test]
async fn invalid_plan_issues_no_requests() {
    let server = MemoryServer::new(b"ABCDEFGH");
    let fetcher = RangeFetcher::new(server.clone());

    assert!(matches!(
        fetcher.fetch_and_assemble(URL, 0, 2).await,
        Err(Error::InvalidPlan(_))
    ));
    assert!(matches!(
        fetcher.fetch_and_assemble(URL, 4, 0).await,
        Err(Error::InvalidPlan(_))
    ));
    assert!(server.requests().is_empty());
}
