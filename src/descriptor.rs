//! Defines the `Archivable` trait and the descriptors it returns.
//!
//! A record type describes itself explicitly instead of being inspected at runtime:
//! [`Archivable::descriptor`] lists the persistable fields declared on the type, in
//! declaration order, plus an optional *base* type whose fields are inherited.
//! [`Archivable::field_value`] and [`Archivable::set_field`] read and assign those
//! fields by name.
//!
//! `#[derive(Archivable)]` generates all of this:
//!
//! ```rust
//! use packfold::Archivable;
//!
//! #[derive(Archivable, Default)]
//! struct Rank {
//!     #[archive]
//!     name: String,
//!     #[archive]
//!     display: Option<String>,
//!     cached_lowercase: String, // not persisted
//! }
//!
//! #[derive(Archivable, Default)]
//! #[archive(name = "OwnerRank")]
//! struct OwnerRank {
//!     #[archive(base)]
//!     rank: Rank,
//!     #[archive]
//!     removable: bool,
//! }
//!
//! let d = <OwnerRank as Archivable>::descriptor();
//! assert_eq!(d.type_name(), "OwnerRank");
//! assert_eq!(d.fields().len(), 1);
//! assert!(d.base().is_some());
//! ```

use crate::error::Result;
use std::any::{Any, TypeId};
use std::fmt;

/// Runtime identity of a Rust type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    rust_name: &'static str,
}

impl TypeKey {
    /// The key of `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler's name for the type (not stable across builds, diagnostics only).
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name)
    }
}

/// One persistable field declared directly on a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    declared: TypeKey,
    nullable: bool,
}

impl FieldDescriptor {
    /// Describes a field of value type `T`.
    ///
    /// For an `Option<T>` field pass the inner `T` and `nullable = true`.
    pub fn new<T: Any>(name: &'static str, nullable: bool) -> Self {
        Self {
            name,
            declared: TypeKey::of::<T>(),
            nullable,
        }
    }

    /// The field name as written into records.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The value type of the field (`T` for `Option<T>` fields).
    pub fn declared(&self) -> TypeKey {
        self.declared
    }

    /// True for `Option<T>` fields.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

/// Points at the base type a record inherits fields from.
#[derive(Clone, Copy)]
pub struct BaseDescriptor {
    key: TypeKey,
    describe: fn() -> TypeDescriptor,
}

impl BaseDescriptor {
    /// The base type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Produces the base type's own descriptor.
    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }

    pub(crate) fn describe_fn(&self) -> fn() -> TypeDescriptor {
        self.describe
    }
}

impl fmt::Debug for BaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseDescriptor").field("key", &self.key).finish()
    }
}

/// Everything a record type declares about its persistable state.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    base: Option<BaseDescriptor>,
}

impl TypeDescriptor {
    /// Starts a descriptor for `T` with the given stable type name.
    pub fn new<T: Any>(type_name: &'static str) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            type_name,
            fields: Vec::new(),
            base: None,
        }
    }

    /// Appends an own field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares `B` as the base type whose fields follow the own fields.
    pub fn with_base<B: Archivable>(mut self) -> Self {
        self.base = Some(BaseDescriptor {
            key: TypeKey::of::<B>(),
            describe: B::descriptor,
        });
        self
    }

    /// The described type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Stable name of the record type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields declared directly on the type, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The base type, if any.
    pub fn base(&self) -> Option<&BaseDescriptor> {
        self.base.as_ref()
    }
}

/// The current value of one field, as seen by the encoder.
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    /// The field holds a value.
    Present(&'a dyn Any),
    /// The field is an `Option` holding `None`.
    Null,
}

impl<'a> FieldValue<'a> {
    /// Wraps a non-nullable field.
    pub fn of<T: Any>(value: &'a T) -> Self {
        Self::Present(value)
    }

    /// Wraps an `Option` field.
    pub fn from_option<T: Any>(value: Option<&'a T>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Null,
        }
    }

    /// Returns true for [`FieldValue::Present`].
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(_) => f.write_str("Present(..)"),
            Self::Null => f.write_str("Null"),
        }
    }
}

/// A type whose persistable fields can be enumerated, read and assigned by name.
///
/// Usually derived; see the module documentation.
pub trait Archivable: Any {
    /// Stable name of the record type, used in diagnostics and container headers.
    const TYPE_NAME: &'static str;

    /// The explicit field declaration of this type.
    fn descriptor() -> TypeDescriptor
    where
        Self: Sized;

    /// Reads a persistable field (own or inherited) by name.
    ///
    /// Returns `None` if no such field exists.
    fn field_value(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Assigns a decoded value to a persistable field (own or inherited) by name.
    ///
    /// Nullable fields receive `Some(value)`.
    fn set_field(&mut self, name: &str, value: Box<dyn Any>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Archivable for Plain {
        const TYPE_NAME: &'static str = "Plain";

        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new::<Self>(Self::TYPE_NAME)
                .field(FieldDescriptor::new::<u32>("a", false))
                .field(FieldDescriptor::new::<String>("b", true))
        }

        fn field_value(&self, _name: &str) -> Option<FieldValue<'_>> {
            None
        }

        fn set_field(&mut self, name: &str, _value: Box<dyn Any>) -> Result<()> {
            Err(crate::ArchiveError::access(Self::TYPE_NAME, name, "no fields"))
        }
    }

    #[test]
    fn descriptor_keeps_declaration_order() {
        let d = Plain::descriptor();
        let names: Vec<_> = d.fields().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(d.fields()[1].declared(), TypeKey::of::<String>());
        assert!(d.fields()[1].nullable());
        assert!(d.base().is_none());
    }

    #[test]
    fn type_keys_compare_by_identity() {
        assert_eq!(TypeKey::of::<u8>(), TypeKey::of::<u8>());
        assert_ne!(TypeKey::of::<u8>(), TypeKey::of::<i8>());
        assert!(TypeKey::of::<String>().rust_name().ends_with("String"));
    }

    #[test]
    fn option_values_map_to_presence() {
        let some = Some(5u8);
        let none: Option<u8> = None;
        assert!(FieldValue::from_option(some.as_ref()).is_present());
        assert!(!FieldValue::from_option(none.as_ref()).is_present());
    }
}
