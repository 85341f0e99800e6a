//! Filesystem helpers for materializing verified content.

use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Create `dir` and its ancestors.
///
/// Losing a race to another task that created the same directory is fine;
/// a non-directory already sitting at `dir` is not.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be created or
/// the path is occupied by something that is not a directory.
pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Replace `dest` with `data` so readers see either the old file or the new
/// one, never a partial write.
///
/// The bytes go to a temp file in the destination's directory which is then
/// renamed over `dest`.
///
/// # Errors
///
/// Returns any I/O error from creating the directory, writing, or renaming.
pub fn write_atomic(dest: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = dest.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", dest.display()),
        )
    })?;
    ensure_dir(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".packsync-")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Async wrapper around [`write_atomic`] that runs on the blocking pool.
///
/// # Errors
///
/// Same as [`write_atomic`].
pub async fn write_atomic_async(dest: PathBuf, data: Bytes) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || write_atomic(&dest, &data))
        .await
        .map_err(std::io::Error::other)?
}

/// Remove a file if present. Returns whether something was removed.
///
/// # Errors
///
/// Returns the I/O error for anything other than the file being absent.
pub fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
