//! Runtime utilities for generated code (Macros) and packer implementations.
//! Do not use directly.

use crate::error::{ArchiveError, Result};
use std::any::Any;

/// Moves a decoded value out of its box, as the field type `T`.
///
/// Used by `#[derive(Archivable)]` in `set_field`. A type mismatch means the packer
/// that produced `value` does not serve the field's declared type.
pub fn assign<T: Any>(value: Box<dyn Any>, owner: &'static str, field: &str) -> Result<T> {
    value.downcast::<T>().map(|v| *v).map_err(|_| {
        ArchiveError::access(
            owner,
            field,
            format!("decoded value is not a {}", std::any::type_name::<T>()),
        )
    })
}

/// The error `set_field` returns for a name the type does not declare.
pub fn unknown_field(owner: &'static str, field: &str) -> ArchiveError {
    ArchiveError::access(owner, field, "no such persistable field")
}

/// Borrows the value a packer was handed as its served type.
pub fn expect_ref<T: Any>(value: &dyn Any) -> Result<&T> {
    value.downcast_ref::<T>().ok_or_else(|| {
        ArchiveError::Internal(format!(
            "packer for {} received a value of another type",
            std::any::type_name::<T>()
        ))
    })
}

/// Unboxes the value a nested packer produced.
pub fn take<T: Any>(value: Box<dyn Any>) -> Result<T> {
    value.downcast::<T>().map(|v| *v).map_err(|_| {
        ArchiveError::Internal(format!(
            "nested packer did not produce a {}",
            std::any::type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_reports_the_field_on_mismatch() {
        let err = assign::<u32>(Box::new("nope".to_string()), "Town", "money")
            .err()
            .map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("Access Error on Town.money: decoded value is not a u32")
        );
    }

    #[test]
    fn take_and_expect_ref_round_trip() -> Result<()> {
        let boxed: Box<dyn Any> = Box::new(12i64);
        assert_eq!(*expect_ref::<i64>(&*boxed)?, 12);
        assert_eq!(take::<i64>(boxed)?, 12);
        Ok(())
    }
}
