//! Leaf packers for scalars.

use crate::context::ArchiveContext;
use crate::descriptor::TypeKey;
use crate::error::Result;
use crate::format::{RecordReader, RecordWriter};
use crate::packer::Packer;
use crate::registry::RegistryBuilder;
use crate::rt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Packs any serde type directly with the record's bincode configuration.
pub struct SerdePacker<T> {
    _m: PhantomData<fn() -> T>,
}

impl<T> SerdePacker<T> {
    /// Creates the packer.
    pub fn new() -> Self {
        Self { _m: PhantomData }
    }
}

impl<T> Default for SerdePacker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdePacker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdePacker<{}>", std::any::type_name::<T>())
    }
}

impl<T> Packer for SerdePacker<T>
where
    T: Serialize + DeserializeOwned + Any,
{
    fn packs(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn pack(&self, value: &dyn Any, out: &mut RecordWriter, _cx: &ArchiveContext) -> Result<()> {
        out.put(rt::expect_ref::<T>(value)?)
    }

    fn unpack(&self, input: &mut RecordReader<'_>, _cx: &ArchiveContext) -> Result<Box<dyn Any>> {
        Ok(Box::new(input.take::<T>()?))
    }
}

/// Registers every listed type under its stable name.
macro_rules! impl_primitive_table {
    ($builder:expr, $($t:ty => $name:literal),* $(,)?) => {
        $builder $(.primitive::<$t>($name))*
    };
}

/// Registers the standard scalar packers.
pub(crate) fn register_primitives(builder: RegistryBuilder) -> RegistryBuilder {
    impl_primitive_table!(builder,
        u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64", u128 => "u128",
        i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64", i128 => "i128",
        f32 => "f32", f64 => "f64", bool => "bool", char => "char", String => "string",
    )
}
