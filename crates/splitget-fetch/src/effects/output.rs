use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Fail with [`Error::OutputExists`] if anything is already at `path`.
///
/// Broken symlinks count as existing.
pub fn ensure_absent(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match path.symlink_metadata() {
        Ok(_) => Err(Error::OutputExists(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Write {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `content` to `path` in one step, never replacing an existing file.
///
/// The bytes go to a temporary file next to `path`, are synced, and the
/// file is then linked into place. On any failure the temporary file is
/// removed and nothing is left at `path`.
pub fn write_output(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source: io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".splitget-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(write_err)?;
    write_all_synced(&mut tmp, content).map_err(write_err)?;

    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            Error::OutputExists(path.to_path_buf())
        } else {
            write_err(e.error)
        }
    })?;

    debug!(path = %path.display(), bytes = content.len(), "wrote output");
    Ok(())
}

fn write_all_synced(tmp: &mut NamedTempFile, content: &[u8]) -> io::Result<()> {
    tmp.write_all(content)?;
    tmp.as_file().sync_all()
}
