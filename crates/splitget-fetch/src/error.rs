//! Error types for splitget-fetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid chunk plan: {0}")]
    InvalidPlan(String),

    #[error("chunk {index}: network error: {message}")]
    Network { index: u32, message: String },

    #[error("chunk {index}: request timed out after {timeout:?}")]
    Timeout { index: u32, timeout: Duration },

    #[error("download did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("chunk {index}: unexpected HTTP status {status}")]
    UnexpectedStatus { index: u32, status: u16 },

    #[error("chunk {index}: server ignored the Range header and sent the whole resource")]
    RangeIgnored { index: u32 },

    #[error("chunk {index}: requested {expected}, received {actual}")]
    RangeMismatch {
        index: u32,
        expected: String,
        actual: String,
    },

    #[error("chunk {index}: malformed Content-Range header {value:?}")]
    InvalidContentRange { index: u32, value: String },

    #[error("chunk {index} produced no data")]
    ChunkMissing { index: u32 },

    #[error("chunk task failed: {0}")]
    Task(String),

    #[error("size probe failed: {0}")]
    Probe(String),

    #[error("output file \"{}\" already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("failed to write \"{}\": {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Index of the chunk this error belongs to, if any.
    pub fn chunk_index(&self) -> Option<u32> {
        match self {
            Error::Network { index, .. }
            | Error::Timeout { index, .. }
            | Error::UnexpectedStatus { index, .. }
            | Error::RangeIgnored { index }
            | Error::RangeMismatch { index, .. }
            | Error::InvalidContentRange { index, .. }
            | Error::ChunkMissing { index } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
