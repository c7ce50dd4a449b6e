// src/inspector.rs

//! Tools for inspecting the physical structure of record files.
//! Useful for debugging schema evolution: the report lists what a record actually
//! stores, independent of any type that might read it.

use crate::error::{ArchiveError, Result};
use crate::format::RecordReader;
use serde::Serialize;
use std::path::Path;

/// A structural report of one record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordReport {
    /// Record name (the file name).
    pub name: String,
    /// Total size of the record in bytes.
    pub size: u64,
    /// Stored fields in file order.
    pub fields: Vec<FieldEntry>,
}

impl RecordReport {
    /// Looks up a stored field by name (first match).
    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One stored field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldEntry {
    /// Field name.
    pub name: String,
    /// Presence flag.
    pub present: bool,
    /// Offset of the field entry within the record.
    pub offset: u64,
    /// Size of the value frame body; `None` for absent values.
    pub value_len: Option<u64>,
}

/// The record inspector.
#[derive(Debug)]
pub struct RecordInspector;

impl RecordInspector {
    /// Reads a record file and reports its layout.
    pub fn inspect_path<P: AsRef<Path>>(path: P) -> Result<RecordReport> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::inspect_bytes(&name, &bytes)
    }

    /// Reports the layout of in-memory record bytes.
    ///
    /// Value frames are measured, never decoded, so no packer registry is needed.
    pub fn inspect_bytes(name: &str, bytes: &[u8]) -> Result<RecordReport> {
        let wrap = |e: ArchiveError| e.within(name, None);
        let mut input = RecordReader::new(bytes);
        let count = input.size().map_err(wrap)?;

        let mut fields = Vec::with_capacity(count.min(input.remaining()));
        for _ in 0..count {
            let offset = (bytes.len() - input.remaining()) as u64;
            let field = input.string().map_err(wrap)?;
            let present = input.boolean().map_err(|e| e.within(name, Some(&field)))?;
            let value_len = if present {
                let len = input
                    .skip_frame()
                    .map_err(|e| e.within(name, Some(&field)))?;
                Some(len as u64)
            } else {
                None
            };
            fields.push(FieldEntry {
                name: field,
                present,
                offset,
                value_len,
            });
        }
        input.finish().map_err(wrap)?;

        Ok(RecordReport {
            name: name.to_string(),
            size: bytes.len() as u64,
            fields,
        })
    }
}

impl std::fmt::Display for RecordReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== RECORD {} ===", self.name)?;
        writeln!(f, "Size:   {}b", self.size)?;
        writeln!(f, "Fields: {}", self.fields.len())?;
        for (i, field) in self.fields.iter().enumerate() {
            let connector = if i + 1 == self.fields.len() {
                "└── "
            } else {
                "├── "
            };
            let value = field
                .value_len
                .map(|len| format!("{len}b"))
                .unwrap_or_else(|| "absent".to_string());
            writeln!(
                f,
                "{}{} @{} | {}",
                connector, field.name, field.offset, value
            )?;
        }
        Ok(())
    }
}
