use crate::data::ChunkSpec;
use crate::error::{Error, Result};

/// Value of the `Range` request header for `spec`.
///
/// # Examples
///
/// ```
/// use splitget_fetch::ChunkSpec;
/// use splitget_fetch::core::range_header;
///
/// let spec = ChunkSpec { index: 1, start: 4, end: 7 };
/// assert_eq!(range_header(&spec), "bytes=4-7");
/// ```
pub fn range_header(spec: &ChunkSpec) -> String {
    format!("bytes={}-{}", spec.start, spec.end)
}

/// Parsed `Content-Range` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRange {
    /// `bytes <start>-<end>/<total>`; `total` is `None` for `*`.
    Bytes {
        start: u64,
        end: u64,
        total: Option<u64>,
    },
    /// `bytes */<total>`, sent alongside 416.
    Unsatisfied { total: u64 },
}

impl ContentRange {
    /// Parse a header value. Returns `None` for anything that is not a
    /// well-formed `bytes` range.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.trim().strip_prefix("bytes")?.trim_start();
        let (range, total) = rest.split_once('/')?;
        let total = total.trim();

        if range.trim() == "*" {
            return total.parse().ok().map(|total| Self::Unsatisfied { total });
        }

        let (start, end) = range.trim().split_once('-')?;
        let start: u64 = start.parse().ok()?;
        let end: u64 = end.parse().ok()?;
        if end < start {
            return None;
        }

        let total = match total {
            "*" => None,
            t => {
                let t: u64 = t.parse().ok()?;
                if end >= t {
                    return None;
                }
                Some(t)
            }
        };

        Some(Self::Bytes { start, end, total })
    }
}

/// Returns `true` for 2xx statuses.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Check that a response is a faithful answer to the range request for
/// `spec`.
///
/// - `206` with `Content-Range`: the range must start where requested,
///   end no later than requested and match the body length. A shorter range
///   is only accepted when it runs to the end of the resource.
/// - `206` without `Content-Range`: the body must fit the requested range.
/// - `200`: only valid for a chunk starting at 0 whose body fits the
///   requested range, i.e. the whole resource is smaller than the chunk.
/// - `416` with `Content-Range: bytes */<total>`: valid when `total` shows
///   the chunk starts at or past the end of the resource. The chunk is then
///   empty.
/// - Anything else is rejected.
pub fn validate_response(
    spec: &ChunkSpec,
    status: u16,
    content_range: Option<&str>,
    body_len: u64,
) -> Result<()> {
    let index = spec.index;
    match status {
        206 => match content_range {
            Some(value) => {
                let parsed = ContentRange::parse(value).ok_or_else(|| {
                    Error::InvalidContentRange {
                        index,
                        value: value.to_string(),
                    }
                })?;
                check_partial(spec, parsed, body_len)
            }
            None if body_len <= spec.len() => Ok(()),
            None => Err(mismatch(spec, format!("{body_len} bytes without Content-Range"))),
        },
        200 if spec.start == 0 && body_len <= spec.len() => Ok(()),
        200 => Err(Error::RangeIgnored { index }),
        416 if is_past_end(spec, content_range) => Ok(()),
        status => Err(Error::UnexpectedStatus { index, status }),
    }
}

/// Whether a `416` carries a `Content-Range` placing `spec` past the end.
fn is_past_end(spec: &ChunkSpec, content_range: Option<&str>) -> bool {
    matches!(
        content_range.and_then(ContentRange::parse),
        Some(ContentRange::Unsatisfied { total }) if total <= spec.start
    )
}

fn check_partial(spec: &ChunkSpec, range: ContentRange, body_len: u64) -> Result<()> {
    let ContentRange::Bytes { start, end, total } = range else {
        return Err(mismatch(spec, "an unsatisfied range".to_string()));
    };

    let describe = || match total {
        Some(t) => format!("bytes {start}-{end}/{t} ({body_len} body bytes)"),
        None => format!("bytes {start}-{end}/* ({body_len} body bytes)"),
    };

    if start != spec.start || end > spec.end || body_len != end - start + 1 {
        return Err(mismatch(spec, describe()));
    }
    if end < spec.end && total != Some(end + 1) {
        return Err(mismatch(spec, describe()));
    }
    Ok(())
}

fn mismatch(spec: &ChunkSpec, actual: String) -> Error {
    Error::RangeMismatch {
        index: spec.index,
        expected: format!("bytes {}-{}", spec.start, spec.end),
        actual,
    }
}
