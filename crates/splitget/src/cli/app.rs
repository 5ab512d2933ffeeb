use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, value_parser};
use splitget_fetch::{FailurePolicy, FetchOptions};

pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "splitget",
    version = env!("CARGO_PKG_VERSION"),
    about = "Download a file as concurrent HTTP byte ranges",
    long_about = None
)]
pub struct App {
    /// URL of the file to download
    pub url: Option<String>,

    /// Number of chunks to download
    #[arg(
        long = "numChunks",
        value_name = "NUM",
        default_value_t = 4,
        value_parser = value_parser!(u32).range(1..)
    )]
    pub num_chunks: u32,

    /// Size of each chunk in bytes
    #[arg(
        long = "chunkSize",
        value_name = "BYTES",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = value_parser!(u64).range(1..)
    )]
    pub chunk_size: u64,

    /// Name of the file to write to
    #[arg(long = "outputFile", value_name = "PATH", default_value = "output.jar")]
    pub output_file: PathBuf,

    /// Maximum number of chunk requests in flight [default: all chunks]
    #[arg(long = "maxConcurrent", value_name = "NUM")]
    pub max_concurrent: Option<NonZeroUsize>,

    /// Per-chunk timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Timeout for establishing each connection, in seconds
    #[arg(long = "connectTimeout", value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Overall download timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Keep whatever body the server returns for a chunk, error pages included
    #[arg(long)]
    pub lenient: bool,

    /// Ask the server for the file size first and skip chunks past the end
    #[arg(long)]
    pub probe: bool,

    /// Show a progress bar instead of one dot per chunk
    #[arg(long)]
    pub bar: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl App {
    /// Fetch options described by the flags, without a progress callback.
    pub fn fetch_options(&self) -> FetchOptions {
        let policy = if self.lenient {
            FailurePolicy::Lenient
        } else {
            FailurePolicy::Strict
        };

        FetchOptions::default()
            .max_concurrent(self.max_concurrent)
            .request_timeout(self.timeout.map(Duration::from_secs))
            .deadline(self.deadline.map(Duration::from_secs))
            .policy(policy)
            .probe_length(self.probe)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }
}
