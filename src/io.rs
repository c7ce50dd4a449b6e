//! Low-level I/O for record files.
//!
//! A record is never written in place. The bytes go to a temporary file in the
//! destination folder, which is flushed and then renamed over the target, so a
//! reader sees either the previous record or the new one and never a partial file.

use crate::error::{ArchiveError, Result};
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Prefix of in-flight temporary files. Record listings skip these names.
pub(crate) const PENDING_PREFIX: &str = ".pending-";

/// Atomically replaces `target` with `bytes`.
///
/// The temporary file is created next to `target` so the final rename never crosses
/// a filesystem boundary. If anything fails the temporary file is removed when it
/// goes out of scope.
pub(crate) fn persist_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| ArchiveError::InvalidName(target.display().to_string()))?;

    let tmp = tempfile::Builder::new()
        .prefix(PENDING_PREFIX)
        .tempfile_in(dir)?;
    let tmp = write_through(tmp, bytes)?;

    tmp.persist(target).map_err(|e| ArchiveError::from(e.error))?;
    Ok(())
}

fn write_through(tmp: NamedTempFile, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut writer = BufWriter::new(tmp);
    writer.write_all(bytes)?;
    let tmp = writer
        .into_inner()
        .map_err(|e| ArchiveError::from(e.into_error()))?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Reads a whole record file. A missing file is `Ok(None)`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Deletes a record file. Returns `false` if it did not exist.
pub(crate) fn remove_optional(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn persist_replaces_the_target() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("spawn");
        persist_atomic(&target, b"first")?;
        persist_atomic(&target, b"second")?;
        assert_eq!(fs::read(&target)?, b"second");

        let leftovers = fs::read_dir(dir.path())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(PENDING_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[test]
    fn missing_files_are_not_errors() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nothing");
        assert_eq!(read_optional(&path)?, None);
        assert!(!remove_optional(&path)?);
        Ok(())
    }
}
