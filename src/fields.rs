//! The field descriptor cache.
//!
//! For every record type the cache computes, once, the ordered [`FieldSet`]: the
//! type's own persistable fields in declaration order followed by the fields of
//! its base type chain. Entries expire after a period without access.
//!
//! Each cache slot is a `OnceLock`, handed out under a short-lived lock on the slot
//! map. Callers racing on the same uncached type all block on the same `OnceLock`,
//! so the descriptor is scanned once and every caller receives the same
//! `Arc<FieldSet>`.

use crate::descriptor::{Archivable, TypeDescriptor, TypeKey};
use crate::error::{ArchiveError, Result};
use crate::registry::PackerRegistry;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Default time an unused field set stays cached.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// One persistable field with its packer type resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistableField {
    name: &'static str,
    declared: TypeKey,
    effective: TypeKey,
    nullable: bool,
}

impl PersistableField {
    /// Field name as written into records.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared value type (`T` for `Option<T>`).
    pub fn declared(&self) -> TypeKey {
        self.declared
    }

    /// The declared type after ancestor delegation.
    ///
    /// Reported for inspection only. Encoding and decoding look the packer up by
    /// [`declared`](Self::declared): an inherited type's entry already wraps the
    /// ancestor's packer and converts values in both directions.
    pub fn effective(&self) -> TypeKey {
        self.effective
    }

    /// True for `Option<T>` fields.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

/// The ordered persistable fields of one record type, inherited ones included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    owner: TypeKey,
    type_name: &'static str,
    fields: Vec<PersistableField>,
}

impl FieldSet {
    /// The record type.
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Stable name of the record type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the type persists nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in encoding order.
    pub fn iter(&self) -> std::slice::Iter<'_, PersistableField> {
        self.fields.iter()
    }

    /// The first field with this name.
    pub fn find(&self, name: &str) -> Option<&PersistableField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in encoding order.
    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a PersistableField;
    type IntoIter = std::slice::Iter<'a, PersistableField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

type Slot = Arc<OnceLock<Result<Arc<FieldSet>>>>;

#[derive(Debug)]
struct CacheEntry {
    slot: Slot,
    last_access: Instant,
}

/// Memoizes [`FieldSet`]s per record type with idle-timeout eviction.
#[derive(Debug)]
pub struct FieldCache {
    idle: Duration,
    entries: Mutex<HashMap<TypeId, CacheEntry>>,
    scans: AtomicUsize,
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl FieldCache {
    /// Creates a cache whose entries expire after `idle` without access.
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            entries: Mutex::new(HashMap::new()),
            scans: AtomicUsize::new(0),
        }
    }

    /// The configured idle timeout.
    pub fn idle_timeout(&self) -> Duration {
        self.idle
    }

    /// Returns the field set of `R`, scanning its descriptor on a cache miss.
    ///
    /// Effective types are resolved through `registry`.
    pub fn fields_of<R: Archivable>(&self, registry: &PackerRegistry) -> Result<Arc<FieldSet>> {
        self.get(TypeKey::of::<R>(), R::descriptor, registry)
    }

    fn get(
        &self,
        key: TypeKey,
        describe: fn() -> TypeDescriptor,
        registry: &PackerRegistry,
    ) -> Result<Arc<FieldSet>> {
        let slot = self.slot(key)?;
        let result = slot.get_or_init(|| self.scan(describe, registry)).clone();
        if result.is_err() {
            // Failed scans are not memoized.
            self.forget(key)?;
        }
        result
    }

    fn slot(&self, key: TypeKey) -> Result<Slot> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        Self::sweep(&mut entries, now, self.idle);
        let entry = entries.entry(key.id()).or_insert_with(|| CacheEntry {
            slot: Arc::new(OnceLock::new()),
            last_access: now,
        });
        entry.last_access = now;
        Ok(Arc::clone(&entry.slot))
    }

    /// Drops expired entries, keeping any a caller is still waiting on.
    fn sweep(entries: &mut HashMap<TypeId, CacheEntry>, now: Instant, idle: Duration) {
        entries.retain(|_, e| {
            now.duration_since(e.last_access) < idle || Arc::strong_count(&e.slot) > 1
        });
    }

    fn scan(&self, describe: fn() -> TypeDescriptor, registry: &PackerRegistry) -> Result<Arc<FieldSet>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let descriptor = describe();

        let mut fields: Vec<PersistableField> = descriptor
            .fields()
            .iter()
            .map(|f| PersistableField {
                name: f.name(),
                declared: f.declared(),
                effective: registry.effective(f.declared()),
                nullable: f.nullable(),
            })
            .collect();

        if let Some(base) = descriptor.base() {
            let inherited = self.get(base.key(), base.describe_fn(), registry)?;
            fields.extend(inherited.iter().copied());
        }

        tracing::debug!(
            record_type = descriptor.type_name(),
            fields = fields.len(),
            "scanned persistable fields"
        );

        Ok(Arc::new(FieldSet {
            owner: descriptor.key(),
            type_name: descriptor.type_name(),
            fields,
        }))
    }

    fn forget(&self, key: TypeKey) -> Result<()> {
        self.lock()?.remove(&key.id());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TypeId, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|_| ArchiveError::Internal("FieldCache Mutex poisoned".into()))
    }

    /// Number of descriptor scans performed since creation.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Number of cached types (expired entries included until the next sweep).
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Drops every entry idle for longer than the timeout.
    pub fn evict_idle(&self) -> Result<()> {
        let mut entries = self.lock()?;
        Self::sweep(&mut entries, Instant::now(), self.idle);
        Ok(())
    }

    /// Drops every entry.
    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, FieldValue};
    use std::any::Any;

    struct Base;
    struct Child;

    impl Archivable for Base {
        const TYPE_NAME: &'static str = "Base";
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new::<Self>(Self::TYPE_NAME)
                .field(FieldDescriptor::new::<String>("name", false))
                .field(FieldDescriptor::new::<u32>("level", false))
        }
        fn field_value(&self, _: &str) -> Option<FieldValue<'_>> {
            None
        }
        fn set_field(&mut self, name: &str, _: Box<dyn Any>) -> Result<()> {
            Err(crate::rt::unknown_field(Self::TYPE_NAME, name))
        }
    }

    impl Archivable for Child {
        const TYPE_NAME: &'static str = "Child";
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new::<Self>(Self::TYPE_NAME)
                .field(FieldDescriptor::new::<f64>("money", false))
                .field(FieldDescriptor::new::<String>("name", true))
                .with_base::<Base>()
        }
        fn field_value(&self, _: &str) -> Option<FieldValue<'_>> {
            None
        }
        fn set_field(&mut self, name: &str, _: Box<dyn Any>) -> Result<()> {
            Err(crate::rt::unknown_field(Self::TYPE_NAME, name))
        }
    }

    #[test]
    fn own_fields_precede_inherited_ones() -> Result<()> {
        let registry = PackerRegistry::primitives()?;
        let cache = FieldCache::default();
        let set = cache.fields_of::<Child>(&registry)?;

        assert_eq!(set.names(), ["money", "name", "name", "level"]);
        assert_eq!(set.type_name(), "Child");
        // Shadowed names resolve to the own field.
        assert!(set.find("name").is_some_and(PersistableField::nullable));
        assert_eq!(cache.scan_count(), 2);
        assert_eq!(cache.len()?, 2);
        Ok(())
    }

    #[test]
    fn hits_do_not_rescan() -> Result<()> {
        let registry = PackerRegistry::primitives()?;
        let cache = FieldCache::default();
        let first = cache.fields_of::<Base>(&registry)?;
        let second = cache.fields_of::<Base>(&registry)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.scan_count(), 1);
        Ok(())
    }

    #[test]
    fn idle_entries_expire() -> Result<()> {
        let registry = PackerRegistry::primitives()?;
        let cache = FieldCache::new(Duration::from_millis(20));
        cache.fields_of::<Base>(&registry)?;
        std::thread::sleep(Duration::from_millis(60));
        cache.evict_idle()?;
        assert!(cache.is_empty()?);

        cache.fields_of::<Base>(&registry)?;
        assert_eq!(cache.scan_count(), 2);
        Ok(())
    }

    #[test]
    fn effective_types_follow_the_registry() -> Result<()> {
        let registry = PackerRegistry::primitives()?;
        let cache = FieldCache::default();
        let set = cache.fields_of::<Base>(&registry)?;
        let level = set.find("level").copied();
        assert_eq!(level.map(|f| f.effective()), Some(TypeKey::of::<u32>()));
        Ok(())
    }
}
