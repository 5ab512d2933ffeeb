use crate::data::options::FetchPhase;

/// Snapshot of a ranged download, handed to progress callbacks.
///
/// A snapshot is emitted once the plan is known, once per completed chunk
/// (in completion order, not index order), and once after assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Current phase of the download.
    pub phase: FetchPhase,

    /// Chunks whose body has been fully received.
    pub chunks_completed: u32,

    /// Number of chunks in the plan.
    pub total_chunks: u32,

    /// Sum of the body lengths received so far.
    pub bytes_downloaded: u64,

    /// Bytes requested by the plan. This is an upper bound: the last chunk
    /// may be cut short by the end of the resource.
    pub bytes_requested: u64,

    /// Index of the chunk that triggered this snapshot, if any.
    pub chunk_index: Option<u32>,
}

impl Progress {
    /// Share of completed chunks, in percent.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_chunks == 0 {
            if self.is_completed() { 100.0 } else { 0.0 }
        } else {
            (self.chunks_completed as f64 / self.total_chunks as f64) * 100.0
        }
    }

    /// Returns `true` once the output has been assembled.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == FetchPhase::Completed
    }
}
