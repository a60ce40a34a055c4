//! Atomic file replacement.

use crate::error::{ErrorKind, Result};
use std::io::Write;
use std::path::Path;
use tracing::instrument;

/// Write `data` to `path` so that readers only ever observe the previous
/// content or the complete new content.
///
/// The data goes to a hidden temporary file in the same directory which is
/// then renamed over the destination. On failure the temporary file is
/// removed and the destination is left untouched.
#[instrument(level = "debug", skip(data), fields(path = %path.as_ref().display(), bytes = data.len()))]
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    // Derived content is as public as its source.
    replace(path.as_ref(), data, 0o644)
}

/// Like [`write_atomic`], but the result is only readable by its owner
/// (mode `0600` on Unix). Used for private keys.
#[instrument(level = "debug", skip(data), fields(path = %path.as_ref().display()))]
pub fn write_private(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    replace(path.as_ref(), data, 0o600)
}

#[cfg_attr(not(unix), allow(unused_variables))]
fn replace(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".litepub-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| ErrorKind::from_io(e, parent))?;
    temp.write_all(data).map_err(|e| ErrorKind::from_io(e, path))?;
    temp.as_file().sync_all().map_err(|e| ErrorKind::from_io(e, path))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(|e| ErrorKind::from_io(e, path))?;
    }
    temp.persist(path).map_err(|e| ErrorKind::from_io(e.error, path))?;
    Ok(())
}
