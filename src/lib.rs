//! # packfold
//!
//! Descriptor-driven record archiving: persist plain Rust structs as named binary
//! records inside folders, and restore them later, without writing per-type
//! encode/decode code.
//!
//! ## Overview
//!
//! A record type declares which of its fields are persistable, usually with
//! `#[derive(Archivable)]`. Each field value is encoded by a [`Packer`] looked up in
//! a [`PackerRegistry`] by the field's type. The resulting record is a
//! count-prefixed list of `(name, present, value)` entries, so records written by
//! an older or newer version of a type can still be read:
//!
//! *   fields stored in the record but no longer declared are skipped (and reported);
//! *   declared fields missing from the record keep their current value;
//! *   `Option` fields holding `None` are stored as absent and never overwrite on read.
//!
//! ## Architecture
//!
//! * [`descriptor`]: the [`Archivable`] trait, an explicit description of a type's
//!   persistable fields and optional base type.
//! * [`fields`]: the field descriptor cache. Computes each type's ordered field set
//!   once (own fields, then inherited ones) and evicts it after a period of disuse.
//! * [`registry`]: the type → packer table, built once from explicit registrations.
//!   Types can inherit their ancestor's packer via [`InheritPacker`].
//! * [`packers`]: the built-in packers (bincode scalars, hash and ordered maps, lists,
//!   nested records, inherited adapters).
//! * [`store`]: [`StorageFolder`], write/read/list of named records in one folder,
//!   with atomic file replacement.
//! * [`inspector`]: a schema-free dump of a record's layout.
//!
//! ## Record Layout
//!
//! ```text
//! Record := FieldCount:uint  Field*
//! Field  := Name:string  Present:bool  Value?
//! Value  := Length:uint  Bytes[Length]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use packfold::{Archive, Archivable, PackerRegistry};
//! use std::collections::HashMap;
//!
//! #[derive(Archivable, Default)]
//! struct Town {
//!     #[archive]
//!     name: String,
//!     #[archive]
//!     board: Option<String>,
//!     #[archive]
//!     plots: HashMap<String, i32>,
//!     visitors_online: u32, // runtime state, not persisted
//! }
//!
//! let registry = PackerRegistry::builder()
//!     .with_primitives()
//!     .map::<String, i32>()
//!     .build()?;
//!
//! let root = tempfile::tempdir()?;
//! let archive = Archive::builder(root.path()).registry(registry).build()?;
//! let towns = archive.folder("towns")?;
//!
//! let mut town = Town { name: "Spawn".into(), ..Town::default() };
//! town.plots.insert("0,0".into(), 4);
//! towns.write("spawn", &town)?;
//!
//! assert_eq!(towns.list_record_names()?, ["spawn"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Safety and Error Handling
//!
//! * **No Unsafe:** the crate is `#![deny(unsafe_code)]`.
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to an [`ArchiveError`].
//! * **Atomic Writes:** a failed write never leaves a partial record behind.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// Lets the derive macro's `::packfold::` paths resolve inside this crate too.
extern crate self as packfold;

// --- PUBLIC API MODULES ---
pub mod api;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod fields;
pub mod format;
pub mod inspector;
pub mod packer;
pub mod packers;
pub mod registry;
pub mod store;

// --- INTERNAL IMPLEMENTATION MODULES ---
mod io;
mod record;

// --- MACRO SUPPORT MODULES ---

/// Runtime utilities used by the derived code.
#[doc(hidden)]
pub mod rt;

// --- RE-EXPORTS ---

pub use api::{Archive, ArchiveBuilder};
pub use config::{ArchiveOptions, ArchiveOptionsBuilder};
pub use context::ArchiveContext;
pub use descriptor::{Archivable, FieldDescriptor, FieldValue, TypeDescriptor, TypeKey};
pub use error::{ArchiveError, Result};
pub use fields::{FieldCache, FieldSet, PersistableField};
pub use format::{RecordReader, RecordWriter};
pub use inspector::{FieldEntry, RecordInspector, RecordReport};
pub use packer::{InheritPacker, Packer};
pub use registry::{PackerEntry, PackerRegistry, RegistryBuilder};
pub use store::{ReadSummary, StorageFolder};

// Re-export the derive macro so it is accessible as `packfold::Archivable`
pub use packfold_derive::Archivable;
