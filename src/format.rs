//! Defines the binary layout of packfold records.
//!
//! # Record Layout
//! A record file is a count-prefixed sequence of fields:
//!
//! ```text
//! Record := FieldCount:uint  Field*
//! Field  := Name:string  Present:bool  Value?     // Value omitted when Present = false
//! Value  := Length:uint  Bytes[Length]
//! ```
//!
//! Every value is wrapped in a length-prefixed frame so that a reader can step over
//! a field it does not recognise without knowing how its packer encodes it.
//!
//! Scalars are encoded with bincode's `standard()` configuration: unsigned integers
//! are variable-length little endian, strings are length-prefixed UTF-8.

use crate::error::{ArchiveError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Upper bound on the bytes a single decoded value may claim.
///
/// Length prefixes above this fail with a serialization error before anything is
/// allocated.
pub const MAX_VALUE_BYTES: usize = 64 * 1024 * 1024;

fn config() -> bincode::config::Configuration {
    bincode::config::standard()
}

fn decode_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_VALUE_BYTES>()
}

/// An in-memory sink that accumulates one record (or one value frame).
#[derive(Debug, Default, Clone)]
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes any serde value with the record's bincode configuration.
    pub fn put<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        bincode::serde::encode_into_std_write(value, &mut self.buf, config())?;
        Ok(())
    }

    /// Writes a count or size header.
    pub fn put_len(&mut self, len: usize) -> Result<()> {
        self.put(&(len as u64))
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn put_str(&mut self, s: &str) -> Result<()> {
        self.put(s)
    }

    /// Writes a presence flag or any other boolean.
    pub fn put_bool(&mut self, b: bool) -> Result<()> {
        self.put(&b)
    }

    /// Writes whatever `body` produces as one length-prefixed frame.
    ///
    /// Nothing is appended if `body` fails.
    pub fn framed<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut RecordWriter) -> Result<()>,
    {
        let mut inner = RecordWriter::new();
        body(&mut inner)?;
        self.put_len(inner.buf.len())?;
        self.buf.extend_from_slice(&inner.buf);
        Ok(())
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A cursor over record bytes. Every read advances the cursor.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    /// Starts reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decodes any serde value with the record's bincode configuration.
    pub fn take<T: DeserializeOwned>(&mut self) -> Result<T> {
        let rest = self.data.get(self.pos..).unwrap_or_default();
        let (value, used) = bincode::serde::decode_from_slice(rest, decode_config())?;
        self.pos += used;
        Ok(value)
    }

    /// Reads a count or size header.
    pub fn size(&mut self) -> Result<usize> {
        let len: u64 = self.take()?;
        usize::try_from(len).map_err(|_| ArchiveError::Format(format!("Length {len} overflows")))
    }

    /// Reads a string.
    ///
    /// The length prefix is checked against the remaining input before any bytes
    /// are copied.
    pub fn string(&mut self) -> Result<String> {
        let len = self.size()?;
        let body = self.bytes(len)?;
        String::from_utf8(body.to_vec())
            .map_err(|e| ArchiveError::Serialization(format!("Invalid UTF-8 string: {e}")))
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                ArchiveError::Format(format!(
                    "Length {len} at offset {} runs past the end ({} bytes)",
                    self.pos,
                    self.data.len()
                ))
            })?;
        let body = &self.data[self.pos..end];
        self.pos = end;
        Ok(body)
    }

    /// Reads a boolean.
    pub fn boolean(&mut self) -> Result<bool> {
        self.take()
    }

    /// Reads a frame header and returns a reader bounded to the frame body.
    pub fn frame(&mut self) -> Result<RecordReader<'a>> {
        let len = self.size()?;
        self.bytes(len).map(RecordReader::new)
    }

    /// Steps over one frame without decoding it. Returns the body length.
    pub fn skip_frame(&mut self) -> Result<usize> {
        self.frame().map(|f| f.data.len())
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Fails if any bytes were left unread.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ArchiveError::Format(format!("{n} trailing bytes left unread"))),
        }
    }
}
