//! Packs a nested `Archivable` record with the record layout itself.

use crate::context::ArchiveContext;
use crate::descriptor::{Archivable, TypeKey};
use crate::error::Result;
use crate::format::{RecordReader, RecordWriter};
use crate::packer::Packer;
use crate::record;
use crate::rt;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Embeds `R` as a count-prefixed field list, so nested records get the same
/// presence flags and schema-evolution tolerance as top-level ones.
///
/// Decoding starts from `R::default()`; fields missing from the bytes keep their
/// default value.
pub struct RecordPacker<R> {
    _m: PhantomData<fn() -> R>,
}

impl<R> RecordPacker<R> {
    /// Creates the packer.
    pub fn new() -> Self {
        Self { _m: PhantomData }
    }
}

impl<R> Default for RecordPacker<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for RecordPacker<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordPacker<{}>", std::any::type_name::<R>())
    }
}

impl<R: Archivable + Default> Packer for RecordPacker<R> {
    fn packs(&self) -> TypeKey {
        TypeKey::of::<R>()
    }

    fn pack(&self, value: &dyn Any, out: &mut RecordWriter, cx: &ArchiveContext) -> Result<()> {
        record::encode_record(cx, R::TYPE_NAME, rt::expect_ref::<R>(value)?, out)
    }

    fn unpack(&self, input: &mut RecordReader<'_>, cx: &ArchiveContext) -> Result<Box<dyn Any>> {
        let mut nested = R::default();
        record::decode_record(cx, R::TYPE_NAME, input, &mut nested)?;
        Ok(Box::new(nested))
    }
}
