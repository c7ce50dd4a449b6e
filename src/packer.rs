//! The pluggable encoder/decoder capability.
//!
//! A [`Packer`] converts values of exactly one Rust type to and from the record
//! encoding. Packers are stateless; the ones that recurse (containers, nested
//! records) reach other packers through the [`ArchiveContext`] they are handed.
//!
//! [`InheritPacker`] is the opt-in marker for "pack me as my ancestor": any number of
//! leaf types can share the single packer registered for a common ancestor type.

use crate::context::ArchiveContext;
use crate::descriptor::TypeKey;
use crate::error::Result;
use crate::format::{RecordReader, RecordWriter};
use std::any::Any;

/// Interface for per-type encoders/decoders.
pub trait Packer: Send + Sync + std::fmt::Debug {
    /// The exact type this packer serves.
    fn packs(&self) -> TypeKey;

    /// Encodes `value`, which must be of the served type.
    fn pack(&self, value: &dyn Any, out: &mut RecordWriter, cx: &ArchiveContext) -> Result<()>;

    /// Decodes one value of the served type.
    fn unpack(&self, input: &mut RecordReader<'_>, cx: &ArchiveContext) -> Result<Box<dyn Any>>;
}

/// Marks a type that is packed through its ancestor's packer.
///
/// Registered with [`crate::RegistryBuilder::inherit`]. The leaf's entry reuses the
/// ancestor's stable name, so containers of leaves and containers of ancestors are
/// encoded identically.
///
/// ```rust
/// use packfold::InheritPacker;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Permission(String);
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct BuildPermission;
///
/// impl InheritPacker for BuildPermission {
///     type Ancestor = Permission;
///
///     fn to_ancestor(&self) -> Permission {
///         Permission("town.build".into())
///     }
///
///     fn from_ancestor(ancestor: Permission) -> Option<Self> {
///         (ancestor.0 == "town.build").then_some(BuildPermission)
///     }
/// }
/// ```
pub trait InheritPacker: Any + Sized {
    /// The type whose packer is used.
    type Ancestor: Any;

    /// Converts to the ancestor for encoding.
    fn to_ancestor(&self) -> Self::Ancestor;

    /// Converts a decoded ancestor back. `None` means the ancestor does not
    /// describe a value of this leaf type.
    fn from_ancestor(ancestor: Self::Ancestor) -> Option<Self>;
}
