//! The shared state every archive operation runs against.

use crate::descriptor::Archivable;
use crate::error::Result;
use crate::fields::{FieldCache, FieldSet};
use crate::registry::PackerRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Packer registry plus field descriptor cache.
///
/// Built once, shared through an `Arc`, and handed by reference to the store and
/// to every packer that recurses into other packers.
#[derive(Debug)]
pub struct ArchiveContext {
    registry: PackerRegistry,
    fields: FieldCache,
}

impl ArchiveContext {
    /// Wraps a built registry with a field cache using the default idle timeout.
    pub fn new(registry: PackerRegistry) -> Self {
        Self {
            registry,
            fields: FieldCache::default(),
        }
    }

    /// Wraps a built registry with a field cache expiring after `idle`.
    pub fn with_idle_timeout(registry: PackerRegistry, idle: Duration) -> Self {
        Self {
            registry,
            fields: FieldCache::new(idle),
        }
    }

    /// The packer registry.
    pub fn registry(&self) -> &PackerRegistry {
        &self.registry
    }

    /// The field descriptor cache.
    pub fn field_cache(&self) -> &FieldCache {
        &self.fields
    }

    /// The cached field set of `R`.
    pub fn fields_of<R: Archivable>(&self) -> Result<Arc<FieldSet>> {
        self.fields.fields_of::<R>(&self.registry)
    }
}
