//! Concurrent HTTP range fetching with ordered reassembly.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Fan-out/fan-in**: one task per chunk, results collected over a channel
//!   and assembled strictly by chunk index
//! - **Fail-fast**: the first failing chunk cancels its siblings
//! - **Bounded or unbounded**: optional concurrency limit, per-request timeout
//!   and overall deadline
//! - **No partial output**: results are written atomically and never replace an
//!   existing file

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{ChunkResult, ChunkSpec, FailurePolicy, FetchOptions, FetchPhase, Progress};
pub use effects::output::{ensure_absent, write_output};
pub use effects::{BoxStream, HttpClient, HttpResponse, RangeFetcher};

#[cfg(feature = "reqwest")]
pub use effects::{ReqwestClient, ReqwestClientBuilder};

pub use error::{Error, Result};
