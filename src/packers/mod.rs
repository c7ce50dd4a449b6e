//! Built-in packer implementations.
//!
//! - [`SerdePacker`]: scalars and any other serde type, encoded directly with bincode.
//! - [`MapPacker`] / [`ListPacker`]: homogeneous containers that write their element
//!   type names once and reuse one pair of packers for every entry.
//! - [`RecordPacker`]: a nested `Archivable` record, embedded with the record layout.
//! - [`InheritedPacker`]: adapts a leaf type onto its ancestor's packer.

mod container;
mod inherit;
mod primitive;
mod record;

pub use container::{AssocContainer, ListPacker, MapPacker};
pub use inherit::InheritedPacker;
pub use primitive::SerdePacker;
pub use record::RecordPacker;

pub(crate) use primitive::register_primitives;
