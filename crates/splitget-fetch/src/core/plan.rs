use crate::data::ChunkSpec;
use crate::error::{Error, Result};

/// Split `[0, chunk_size * chunk_count)` into `chunk_count` ranges of
/// `chunk_size` bytes.
///
/// Chunk `i` covers `i * chunk_size ..= i * chunk_size + chunk_size - 1`.
/// The last range is not clipped to the real resource length; a server
/// answering a range past the end sends a shorter body (see
/// [`clip_to_length`] for planning against a known length).
///
/// # Errors
///
/// Returns [`Error::InvalidPlan`] if either argument is zero or the last
/// byte offset does not fit in a `u64`.
///
/// # Examples
///
/// ```
/// use splitget_fetch::core::plan;
///
/// let specs = plan(4, 2).unwrap();
/// assert_eq!((specs[0].start, specs[0].end), (0, 3));
/// assert_eq!((specs[1].start, specs[1].end), (4, 7));
/// ```
pub fn plan(chunk_size: u64, chunk_count: u32) -> Result<Vec<ChunkSpec>> {
    if chunk_size == 0 {
        return Err(Error::InvalidPlan("chunk size must be greater than 0".into()));
    }
    if chunk_count == 0 {
        return Err(Error::InvalidPlan("chunk count must be greater than 0".into()));
    }

    chunk_size
        .checked_mul(u64::from(chunk_count))
        .ok_or_else(|| {
            Error::InvalidPlan(format!(
                "{chunk_count} chunks of {chunk_size} bytes exceed the addressable range"
            ))
        })?;

    Ok((0..chunk_count)
        .map(|index| {
            let start = u64::from(index) * chunk_size;
            ChunkSpec {
                index,
                start,
                end: start + chunk_size - 1,
            }
        })
        .collect())
}

/// Restrict a plan to a resource of `total_len` bytes.
///
/// Chunks starting at or past `total_len` are dropped and the last
/// surviving chunk ends at `total_len - 1`. Indices stay contiguous because
/// only trailing chunks can be dropped.
pub fn clip_to_length(specs: Vec<ChunkSpec>, total_len: u64) -> Vec<ChunkSpec> {
    specs
        .into_iter()
        .take_while(|spec| spec.start < total_len)
        .map(|spec| ChunkSpec {
            end: spec.end.min(total_len - 1),
            ..spec
        })
        .collect()
}
