//! Named records inside one folder.
//!
//! A [`StorageFolder`] maps logical record names to files of the same name. Writes
//! encode the whole record in memory and then replace the file atomically; reads
//! load the whole file and decode it into a caller-supplied object.

use crate::context::ArchiveContext;
use crate::descriptor::Archivable;
use crate::error::{ArchiveError, Result};
use crate::format::{RecordReader, RecordWriter};
use crate::inspector::{RecordInspector, RecordReport};
use crate::io;
use crate::record;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of [`StorageFolder::read`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// The record name that was read.
    pub record: String,
    /// False when no record of that name exists; the object was not touched.
    pub found: bool,
    /// Number of fields assigned from the record.
    pub applied: usize,
    /// Field names stored in the record that the object's type does not declare.
    pub unresolved: Vec<String>,
}

impl ReadSummary {
    /// True when the record existed and every stored field was understood.
    pub fn is_clean(&self) -> bool {
        self.found && self.unresolved.is_empty()
    }
}

/// One folder of named records.
#[derive(Debug, Clone)]
pub struct StorageFolder {
    path: PathBuf,
    cx: Arc<ArchiveContext>,
}

impl StorageFolder {
    /// Opens `path` as a record folder, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P, cx: Arc<ArchiveContext>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Ok(Self { path, cx })
    }

    /// Wraps an existing directory without touching the filesystem.
    pub(crate) fn existing(path: PathBuf, cx: Arc<ArchiveContext>) -> Self {
        Self { path, cx }
    }

    /// The folder on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The context records are encoded with.
    pub fn context(&self) -> &ArchiveContext {
        &self.cx
    }

    /// Persists every persistable field of `object` as the record `name`,
    /// replacing any previous record of that name.
    ///
    /// # Errors
    /// Fails with [`ArchiveError::Record`] wrapping [`ArchiveError::PackerNotFound`]
    /// if a present field has no packer; no file is created or modified in that case.
    pub fn write<R: Archivable>(&self, name: &str, object: &R) -> Result<()> {
        let target = self.record_path(name)?;

        let mut out = RecordWriter::new();
        record::encode_record(&self.cx, name, object, &mut out)?;
        let bytes = out.into_bytes();

        io::persist_atomic(&target, &bytes).map_err(|e| e.within(name, None))?;
        tracing::debug!(
            folder = %self.path.display(),
            record = name,
            record_type = R::TYPE_NAME,
            bytes = bytes.len(),
            "record written"
        );
        Ok(())
    }

    /// Restores the record `name` into `object`.
    ///
    /// A missing record is not an error: `object` is left untouched and the summary
    /// reports `found = false`. Stored fields the type no longer declares are
    /// skipped with a warning and listed in [`ReadSummary::unresolved`]; declared
    /// fields the record lacks keep their current value.
    pub fn read<R: Archivable>(&self, name: &str, object: &mut R) -> Result<ReadSummary> {
        let path = self.record_path(name)?;
        let Some(bytes) = io::read_optional(&path).map_err(|e| e.within(name, None))? else {
            tracing::debug!(folder = %self.path.display(), record = name, "no such record");
            return Ok(ReadSummary {
                record: name.to_string(),
                ..ReadSummary::default()
            });
        };

        let mut input = RecordReader::new(&bytes);
        let decoded = record::decode_record(&self.cx, name, &mut input, object)?;
        input.finish().map_err(|e| e.within(name, None))?;

        tracing::debug!(
            folder = %self.path.display(),
            record = name,
            record_type = R::TYPE_NAME,
            applied = decoded.applied,
            unresolved = decoded.unresolved.len(),
            "record read"
        );
        Ok(ReadSummary {
            record: name.to_string(),
            found: true,
            applied: decoded.applied,
            unresolved: decoded.unresolved,
        })
    }

    /// Returns true if a record named `name` exists.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.record_path(name)?.is_file())
    }

    /// Deletes the record `name`. Returns `false` if there was none.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let removed = io::remove_optional(&self.record_path(name)?)?;
        if removed {
            tracing::debug!(folder = %self.path.display(), record = name, "record removed");
        }
        Ok(removed)
    }

    /// Names of all records in the folder, sorted.
    ///
    /// Subdirectories, in-flight temporary files and names that are not valid UTF-8
    /// are skipped. A folder that does not exist holds no records.
    pub fn list_record_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(io::PENDING_PREFIX) {
                continue;
            }
            names.push(name);
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Structural dump of the record `name`, or `None` if it does not exist.
    pub fn inspect(&self, name: &str) -> Result<Option<RecordReport>> {
        let path = self.record_path(name)?;
        match io::read_optional(&path)? {
            Some(bytes) => RecordInspector::inspect_bytes(name, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn record_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.path.join(name))
    }
}

/// Accepts names usable as a single file name in the folder.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with(io::PENDING_PREFIX)
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(ArchiveError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_single_components() {
        for bad in ["", ".", "..", "a/b", "a\\b", ".pending-x", "nul\0"] {
            assert!(
                matches!(validate_name(bad), Err(ArchiveError::InvalidName(_))),
                "{bad:?} accepted"
            );
        }
        for good in ["spawn", "Spawn Town", "town.1", "..hidden"] {
            assert!(validate_name(good).is_ok(), "{good:?} rejected");
        }
    }

    #[test]
    fn summary_is_clean_only_when_fully_understood() {
        let mut summary = ReadSummary {
            record: "a".into(),
            found: true,
            ..ReadSummary::default()
        };
        assert!(summary.is_clean());
        summary.unresolved.push("old".into());
        assert!(!summary.is_clean());
    }
}
