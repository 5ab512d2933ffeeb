use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;

/// Phases of a ranged download.
///
/// Downloads progress through these phases in order:
/// Planned → Downloading → Assembling → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// The chunk plan is known and no body has arrived yet.
    #[default]
    Planned,

    /// Chunk requests are in flight.
    ///
    /// One snapshot is emitted in this phase for every completed chunk.
    Downloading,

    /// All chunks arrived and are being concatenated in index order.
    Assembling,

    /// The output bytes are ready.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Planned => write!(f, "Planned"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Assembling => write!(f, "Assembling"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// How chunk responses are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Every response must be a well-formed answer to its `Range` request.
    ///
    /// Non-2xx statuses, ignored ranges and length mismatches fail the
    /// whole download.
    #[default]
    Strict,

    /// Take whatever body the server sends for a chunk, error pages
    /// included. Transport failures still fail the download.
    Lenient,
}

/// Configuration for ranged fetching.
///
/// # Examples
///
/// ```
/// use splitget_fetch::{FailurePolicy, FetchOptions};
/// use std::num::NonZeroUsize;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_concurrent(NonZeroUsize::new(8))
///     .request_timeout(Some(Duration::from_secs(30)))
///     .policy(FailurePolicy::Strict)
///     .header("User-Agent", "splitget");
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Extra HTTP headers sent with every chunk request.
    ///
    /// The `Range` header is always set by the fetcher.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,

    /// Upper bound on simultaneous chunk requests.
    ///
    /// Default: None (every chunk is requested immediately)
    pub max_concurrent: Option<NonZeroUsize>,

    /// Time allowed for one chunk, from request send to the last body byte.
    ///
    /// Default: None
    pub request_timeout: Option<Duration>,

    /// Time allowed for the whole download.
    ///
    /// Default: None
    pub deadline: Option<Duration>,

    /// How chunk responses are validated.
    ///
    /// Default: [`FailurePolicy::Strict`]
    pub policy: FailurePolicy,

    /// Issue a HEAD request first and clip the plan to the reported
    /// `Content-Length`.
    ///
    /// Default: false
    pub probe_length: bool,

    /// Progress callback.
    ///
    /// Invoked after planning, after each completed chunk, when assembly
    /// starts and when the output is ready. It runs on the aggregating task
    /// and must not block.
    ///
    /// Default: None
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("headers", &self.headers)
            .field("max_concurrent", &self.max_concurrent)
            .field("request_timeout", &self.request_timeout)
            .field("deadline", &self.deadline)
            .field("policy", &self.policy)
            .field("probe_length", &self.probe_length)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: Arc::new([]),
            max_concurrent: None,
            request_timeout: None,
            deadline: None,
            policy: FailurePolicy::default(),
            probe_length: false,
            on_progress: None,
        }
    }
}

impl FetchOptions {
    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all custom HTTP headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    /// Limit the number of chunk requests in flight. `None` removes the limit.
    #[must_use]
    pub fn max_concurrent(mut self, max_concurrent: Option<NonZeroUsize>) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn probe_length(mut self, probe: bool) -> Self {
        self.probe_length = probe;
        self
    }

    /// Set the progress callback.
    ///
    /// # Examples
    ///
    /// ```
    /// use splitget_fetch::{FetchOptions, FetchPhase};
    /// use std::sync::Arc;
    ///
    /// let options = FetchOptions::default().on_progress(Arc::new(|progress| {
    ///     if progress.phase == FetchPhase::Downloading {
    ///         print!(".");
    ///     }
    /// }));
    /// ```
    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}
