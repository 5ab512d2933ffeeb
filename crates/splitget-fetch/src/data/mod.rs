//! Immutable data types for ranged fetching.
//!
//! Chunk descriptors, configuration and progress snapshots. Nothing in here
//! performs I/O.

pub mod chunk;
pub mod options;
pub mod progress;

pub use chunk::{ChunkResult, ChunkSpec};
pub use options::{FailurePolicy, FetchOptions, FetchPhase};
pub use progress::Progress;
