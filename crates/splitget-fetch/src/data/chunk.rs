use bytes::Bytes;

/// One byte range of the target resource.
///
/// `end` is inclusive, matching the `Range: bytes=start-end` wire syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSpec {
    /// Position of the chunk in the assembled output (0-based).
    pub index: u32,
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ChunkSpec {
    /// Number of bytes this chunk asks for.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A chunk always covers at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Body received for one [`ChunkSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    pub index: u32,
    pub data: Bytes,
}

impl ChunkResult {
    pub fn new(index: u32, data: impl Into<Bytes>) -> Self {
        Self {
            index,
            data: data.into(),
        }
    }
}
