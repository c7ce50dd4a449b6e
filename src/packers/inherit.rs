//! Adapter that packs a leaf type through its ancestor's packer.

use crate::context::ArchiveContext;
use crate::descriptor::TypeKey;
use crate::error::{ArchiveError, Result};
use crate::format::{RecordReader, RecordWriter};
use crate::packer::{InheritPacker, Packer};
use crate::rt;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Serves `L` by converting to and from `L::Ancestor` around the ancestor's packer.
///
/// Built by the registry when it resolves an `inherit` registration; the wrapped
/// packer may itself be an adapter when ancestors chain.
pub struct InheritedPacker<L> {
    ancestor: Arc<dyn Packer>,
    _leaf: PhantomData<fn() -> L>,
}

impl<L: InheritPacker> InheritedPacker<L> {
    /// Wraps the ancestor's packer.
    pub fn new(ancestor: Arc<dyn Packer>) -> Self {
        Self {
            ancestor,
            _leaf: PhantomData,
        }
    }
}

impl<L> fmt::Debug for InheritedPacker<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InheritedPacker")
            .field("leaf", &std::any::type_name::<L>())
            .field("ancestor", &self.ancestor)
            .finish()
    }
}

impl<L: InheritPacker> Packer for InheritedPacker<L> {
    fn packs(&self) -> TypeKey {
        TypeKey::of::<L>()
    }

    fn pack(&self, value: &dyn Any, out: &mut RecordWriter, cx: &ArchiveContext) -> Result<()> {
        let ancestor = rt::expect_ref::<L>(value)?.to_ancestor();
        self.ancestor.pack(&ancestor, out, cx)
    }

    fn unpack(&self, input: &mut RecordReader<'_>, cx: &ArchiveContext) -> Result<Box<dyn Any>> {
        let ancestor = rt::take::<L::Ancestor>(self.ancestor.unpack(input, cx)?)?;
        match L::from_ancestor(ancestor) {
            Some(leaf) => Ok(Box::new(leaf)),
            None => Err(ArchiveError::Format(format!(
                "decoded {} does not describe a {}",
                std::any::type_name::<L::Ancestor>(),
                std::any::type_name::<L>()
            ))),
        }
    }
}
