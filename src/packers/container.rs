//! Homogeneous container packers.
//!
//! Layout of a map value:
//! `[Size] ([KeyTypeName] [ValueTypeName] ([Key] [Value])*)?`
//!
//! Layout of a list value:
//! `[Size] ([ElementTypeName] [Element]*)?`
//!
//! Type names are the registry's stable names, written once. Every key (and every
//! value) of one container is encoded with the same packer.

use crate::context::ArchiveContext;
use crate::descriptor::TypeKey;
use crate::error::{ArchiveError, Result};
use crate::format::{RecordReader, RecordWriter};
use crate::packer::Packer;
use crate::registry::PackerEntry;
use crate::rt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Associative containers the [`MapPacker`] can fill.
pub trait AssocContainer: Any {
    /// Key type.
    type Key: Any;
    /// Value type.
    type Value: Any;

    /// Number of entries.
    fn size(&self) -> usize;

    /// Entries in iteration order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&Self::Key, &Self::Value)> + '_>;

    /// An empty container sized for `capacity` entries.
    fn with_capacity(capacity: usize) -> Self;

    /// Adds one decoded entry.
    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);
}

impl<K: Eq + Hash + Any, V: Any> AssocContainer for HashMap<K, V> {
    type Key = K;
    type Value = V;

    fn size(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity(capacity)
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Ord + Any, V: Any> AssocContainer for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn size(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.iter())
    }

    fn with_capacity(_capacity: usize) -> Self {
        BTreeMap::new()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

/// Reads one element type name and checks it against the statically expected type.
///
/// An unknown name is a hard failure; a known name that is not `T`'s is a format error.
fn element_entry<'r, T: Any>(
    input: &mut RecordReader<'_>,
    cx: &'r ArchiveContext,
    role: &str,
) -> Result<&'r PackerEntry> {
    let written = input.string()?;
    cx.registry().require_name(&written)?;
    let expected = cx.registry().require(TypeKey::of::<T>())?;
    if expected.name() != written {
        return Err(ArchiveError::Format(format!(
            "container {role} type is {written:?}, expected {:?}",
            expected.name()
        )));
    }
    Ok(expected)
}

/// Packs a homogeneous associative container.
pub struct MapPacker<M> {
    _m: PhantomData<fn() -> M>,
}

impl<M> MapPacker<M> {
    /// Creates the packer.
    pub fn new() -> Self {
        Self { _m: PhantomData }
    }
}

impl<M> Default for MapPacker<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for MapPacker<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapPacker<{}>", std::any::type_name::<M>())
    }
}

impl<M: AssocContainer> Packer for MapPacker<M> {
    fn packs(&self) -> TypeKey {
        TypeKey::of::<M>()
    }

    fn pack(&self, value: &dyn Any, out: &mut RecordWriter, cx: &ArchiveContext) -> Result<()> {
        let map = rt::expect_ref::<M>(value)?;
        out.put_len(map.size())?;
        if map.size() == 0 {
            return Ok(());
        }

        let key = cx.registry().require(TypeKey::of::<M::Key>())?;
        let val = cx.registry().require(TypeKey::of::<M::Value>())?;
        out.put_str(key.name())?;
        out.put_str(val.name())?;

        for (k, v) in map.entries() {
            key.packer().pack(k, out, cx)?;
            val.packer().pack(v, out, cx)?;
        }
        Ok(())
    }

    fn unpack(&self, input: &mut RecordReader<'_>, cx: &ArchiveContext) -> Result<Box<dyn Any>> {
        let size = input.size()?;
        // A corrupt size must not trigger a huge allocation.
        let mut map = M::with_capacity(size.min(input.remaining()));
        if size == 0 {
            return Ok(Box::new(map));
        }

        let key = element_entry::<M::Key>(input, cx, "key")?;
        let val = element_entry::<M::Value>(input, cx, "value")?;

        for _ in 0..size {
            let k = rt::take::<M::Key>(key.packer().unpack(input, cx)?)?;
            let v = rt::take::<M::Value>(val.packer().unpack(input, cx)?)?;
            map.insert_entry(k, v);
        }
        Ok(Box::new(map))
    }
}

/// Packs a homogeneous `Vec<T>`.
pub struct ListPacker<T> {
    _m: PhantomData<fn() -> T>,
}

impl<T> ListPacker<T> {
    /// Creates the packer.
    pub fn new() -> Self {
        Self { _m: PhantomData }
    }
}

impl<T> Default for ListPacker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListPacker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListPacker<{}>", std::any::type_name::<T>())
    }
}

impl<T: Any> Packer for ListPacker<T> {
    fn packs(&self) -> TypeKey {
        TypeKey::of::<Vec<T>>()
    }

    fn pack(&self, value: &dyn Any, out: &mut RecordWriter, cx: &ArchiveContext) -> Result<()> {
        let list = rt::expect_ref::<Vec<T>>(value)?;
        out.put_len(list.len())?;
        if list.is_empty() {
            return Ok(());
        }

        let element = cx.registry().require(TypeKey::of::<T>())?;
        out.put_str(element.name())?;
        for item in list {
            element.packer().pack(item, out, cx)?;
        }
        Ok(())
    }

    fn unpack(&self, input: &mut RecordReader<'_>, cx: &ArchiveContext) -> Result<Box<dyn Any>> {
        let size = input.size()?;
        let mut list: Vec<T> = Vec::with_capacity(size.min(input.remaining()));
        if size == 0 {
            return Ok(Box::new(list));
        }

        let element = element_entry::<T>(input, cx, "element")?;
        for _ in 0..size {
            list.push(rt::take::<T>(element.packer().unpack(input, cx)?)?);
        }
        Ok(Box::new(list))
    }
}
