//! Centralized error handling for packfold.
//!
//! Every failure of the engine is an [`ArchiveError`]; nothing in the library
//! panics. Errors are `Clone` so that a failed field-set computation can be
//! handed to every caller that was waiting on it.
//!
//! ## Error Categories
//!
//! - **I/O Errors** ([`ArchiveError::Io`]): the folder or a record file could not be
//!   created, read, renamed or listed.
//! - **Serialization Errors** ([`ArchiveError::Serialization`]): bincode could not
//!   encode or decode a scalar.
//! - **Format Errors** ([`ArchiveError::Format`]): the record framing is violated
//!   (truncated frames, trailing bytes, container type-name mismatch).
//! - **Missing Packers** ([`ArchiveError::PackerNotFound`]): a value type has no
//!   registered packer. Fatal for the whole record.
//! - **Access Errors** ([`ArchiveError::Access`]): a record type's accessors disagree
//!   with its descriptor, or a decoded value has the wrong type for its field.
//! - **Registry Errors** ([`ArchiveError::Registry`]): the registration table cannot
//!   be resolved.
//!
//! Failures that happen while a specific record is being encoded or decoded are
//! wrapped in [`ArchiveError::Record`], which names the record and the offending
//! field and keeps the cause reachable through [`std::error::Error::source`].
//!
//! A field name found in a record file but not in the current type is *not* an
//! error: it is logged and reported through [`crate::store::ReadSummary`].
//!
//! ```rust
//! use packfold::ArchiveError;
//!
//! fn describe(err: &ArchiveError) -> &'static str {
//!     match err.root_cause() {
//!         ArchiveError::PackerNotFound(_) => "register a packer for this type",
//!         ArchiveError::Io(_) => "check the archive folder",
//!         _ => "corrupt or incompatible record",
//!     }
//! }
//! # let _ = describe(&ArchiveError::Format("x".into()));
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for packfold operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// The master error enum covering all failure domains in packfold.
#[derive(Debug, Clone)]
pub enum ArchiveError {
    /// Low-level I/O failure (missing permissions, disk full, rename failure).
    ///
    /// The underlying `io::Error` is wrapped in an `Arc` to make the error `Clone`.
    Io(Arc<io::Error>),

    /// Bincode could not encode or decode a value.
    Serialization(String),

    /// The record bytes do not follow the record framing.
    Format(String),

    /// No packer is registered for the named type.
    PackerNotFound(String),

    /// Reading or assigning a field by name failed.
    Access {
        /// Stable name of the record type that owns the field.
        owner: &'static str,
        /// Field name.
        field: String,
        /// What went wrong.
        reason: String,
    },

    /// A record or folder name is not usable as a single file name.
    InvalidName(String),

    /// The packer registration table could not be resolved.
    Registry(String),

    /// Poisoned locks and other conditions that indicate a bug.
    Internal(String),

    /// A failure while encoding or decoding one record.
    Record {
        /// Record name (or record type name for nested records).
        record: String,
        /// The field being processed, when the failure is field-specific.
        field: Option<String>,
        /// The cause.
        source: Box<ArchiveError>,
    },
}

impl ArchiveError {
    /// Wraps `self` with the record and field it occurred in.
    pub fn within(self, record: &str, field: Option<&str>) -> Self {
        Self::Record {
            record: record.to_string(),
            field: field.map(str::to_string),
            source: Box::new(self),
        }
    }

    /// Follows [`ArchiveError::Record`] wrappers down to the originating error.
    pub fn root_cause(&self) -> &ArchiveError {
        let mut current = self;
        while let Self::Record { source, .. } = current {
            current = source;
        }
        current
    }

    pub(crate) fn access(owner: &'static str, field: &str, reason: impl Into<String>) -> Self {
        Self::Access {
            owner,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::Serialization(s) => write!(f, "Serialization Error: {s}"),
            Self::Format(s) => write!(f, "Format Error: {s}"),
            Self::PackerNotFound(t) => write!(f, "No packer registered for type {t}"),
            Self::Access {
                owner,
                field,
                reason,
            } => write!(f, "Access Error on {owner}.{field}: {reason}"),
            Self::InvalidName(n) => write!(f, "Invalid record name {n:?}"),
            Self::Registry(s) => write!(f, "Registry Error: {s}"),
            Self::Internal(s) => write!(f, "Internal Logic Error: {s}"),
            Self::Record {
                record,
                field: Some(field),
                source,
            } => write!(f, "record '{record}', field '{field}': {source}"),
            Self::Record {
                record,
                field: None,
                source,
            } => write!(f, "record '{record}': {source}"),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e.as_ref()),
            Self::Record { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchiveError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<bincode::error::EncodeError> for ArchiveError {
    fn from(err: bincode::error::EncodeError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for ArchiveError {
    fn from(err: bincode::error::DecodeError) -> Self {
        Self::Serialization(err.to_string())
    }
}
