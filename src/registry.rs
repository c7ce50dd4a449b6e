//! Centralized registry of packers.
//!
//! The registry maps a concrete Rust type to the [`Packer`] that serves it, and a
//! stable textual name to the canonical type behind it. It is assembled from an
//! explicit registration table ([`RegistryBuilder`]) and resolved exactly once by
//! [`RegistryBuilder::build`]; afterwards it is immutable and freely shared.
//!
//! Two things are resolved at build time rather than on every lookup:
//!
//! 1. **Ancestor delegation.** A type registered with [`RegistryBuilder::inherit`]
//!    is bound to its ancestor's packer (following ancestor chains), and takes the
//!    ancestor's stable name and effective type.
//! 2. **Composite names.** Container entries are named from their parts, e.g.
//!    `map<string,i32>` or `list<Rank>`. A container with an inherited part is an
//!    alias: `Vec<Leaf>` is named `list<ancestor>` and may coexist with
//!    `Vec<Ancestor>`, which owns the name.
//!
//! ```rust
//! use packfold::PackerRegistry;
//! use std::collections::HashMap;
//!
//! let registry = PackerRegistry::builder()
//!     .with_primitives()
//!     .map::<String, i32>()
//!     .build()?;
//!
//! let entry = registry.lookup_type::<HashMap<String, i32>>().expect("registered");
//! assert_eq!(entry.name(), "map<string,i32>");
//! assert!(registry.lookup_name("i32").is_some());
//! # Ok::<(), packfold::ArchiveError>(())
//! ```

use crate::descriptor::{Archivable, TypeKey};
use crate::error::{ArchiveError, Result};
use crate::packer::{InheritPacker, Packer};
use crate::packers::{self, InheritedPacker, ListPacker, MapPacker, RecordPacker, SerdePacker};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

/// One resolved registration.
#[derive(Debug, Clone)]
pub struct PackerEntry {
    served: TypeKey,
    effective: TypeKey,
    name: Arc<str>,
    packer: Arc<dyn Packer>,
    alias: bool,
}

impl PackerEntry {
    /// The type this entry is looked up by.
    pub fn served(&self) -> TypeKey {
        self.served
    }

    /// The type whose packer actually encodes the value (the served type unless
    /// the entry was inherited).
    pub fn effective(&self) -> TypeKey {
        self.effective
    }

    /// Stable name written into container headers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The packer.
    pub fn packer(&self) -> &dyn Packer {
        self.packer.as_ref()
    }

    /// True when the entry delegates to an ancestor's packer.
    pub fn is_inherited(&self) -> bool {
        self.served != self.effective
    }

    /// True when the stable name is borrowed from another type: inherited entries,
    /// and containers with an inherited part (`Vec<Leaf>` shares `list<ancestor>`).
    pub fn is_alias(&self) -> bool {
        self.alias
    }
}

/// Read-only type → packer table.
#[derive(Debug, Default)]
pub struct PackerRegistry {
    entries: HashMap<TypeId, PackerEntry>,
    names: HashMap<Arc<str>, TypeId>,
}

impl PackerRegistry {
    /// Starts an empty registration table.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry holding only the scalar packers.
    pub fn primitives() -> Result<Self> {
        Self::builder().with_primitives().build()
    }

    /// Looks up the entry serving `key`.
    pub fn lookup(&self, key: TypeKey) -> Option<&PackerEntry> {
        self.entries.get(&key.id())
    }

    /// Looks up the entry serving `T`.
    pub fn lookup_type<T: Any>(&self) -> Option<&PackerEntry> {
        self.lookup(TypeKey::of::<T>())
    }

    /// Like [`lookup`](Self::lookup), failing with [`ArchiveError::PackerNotFound`].
    pub fn require(&self, key: TypeKey) -> Result<&PackerEntry> {
        self.lookup(key)
            .ok_or_else(|| ArchiveError::PackerNotFound(key.rust_name().to_string()))
    }

    /// Looks up the canonical entry registered under a stable name.
    pub fn lookup_name(&self, name: &str) -> Option<&PackerEntry> {
        self.names.get(name).and_then(|id| self.entries.get(id))
    }

    /// Like [`lookup_name`](Self::lookup_name), failing with
    /// [`ArchiveError::PackerNotFound`].
    pub fn require_name(&self, name: &str) -> Result<&PackerEntry> {
        self.lookup_name(name)
            .ok_or_else(|| ArchiveError::PackerNotFound(format!("type named {name:?}")))
    }

    /// The effective type for `key`: its ancestor's type if it inherits a packer,
    /// otherwise `key` itself (including when nothing is registered for it).
    pub fn effective(&self, key: TypeKey) -> TypeKey {
        self.lookup(key).map_or(key, PackerEntry::effective)
    }

    /// Number of served types, inherited ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable names known to the registry, sorted. Each name appears once.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(AsRef::as_ref).collect();
        names.sort_unstable();
        names
    }
}

enum Naming {
    Fixed(String),
    Composite {
        kind: &'static str,
        parts: Vec<TypeKey>,
    },
}

enum Source {
    Direct {
        packer: Arc<dyn Packer>,
        naming: Naming,
    },
    Inherit {
        ancestor: TypeKey,
        adapt: fn(Arc<dyn Packer>) -> Arc<dyn Packer>,
    },
}

struct Pending {
    served: TypeKey,
    source: Source,
}

impl Pending {
    fn resolve(&self, done: &HashMap<TypeId, PackerEntry>) -> Option<PackerEntry> {
        match &self.source {
            Source::Direct { packer, naming } => {
                let (name, alias) = match naming {
                    Naming::Fixed(name) => (name.clone(), false),
                    Naming::Composite { kind, parts } => {
                        let parts = parts
                            .iter()
                            .map(|k| done.get(&k.id()))
                            .collect::<Option<Vec<_>>>()?;
                        let names: Vec<&str> = parts.iter().map(|e| e.name()).collect();
                        let alias = parts.iter().any(|e| e.alias);
                        (format!("{kind}<{}>", names.join(",")), alias)
                    }
                };
                Some(PackerEntry {
                    served: self.served,
                    effective: self.served,
                    name: name.into(),
                    packer: Arc::clone(packer),
                    alias,
                })
            }
            Source::Inherit { ancestor, adapt } => {
                let base = done.get(&ancestor.id())?;
                Some(PackerEntry {
                    served: self.served,
                    effective: base.effective,
                    name: Arc::clone(&base.name),
                    packer: adapt(Arc::clone(&base.packer)),
                    alias: true,
                })
            }
        }
    }

    fn missing(&self, done: &HashMap<TypeId, PackerEntry>) -> String {
        let needs: Vec<&str> = match &self.source {
            Source::Direct {
                naming: Naming::Composite { parts, .. },
                ..
            } => parts
                .iter()
                .filter(|k| !done.contains_key(&k.id()))
                .map(TypeKey::rust_name)
                .collect(),
            Source::Direct { .. } => Vec::new(),
            Source::Inherit { ancestor, .. } => vec![ancestor.rust_name()],
        };
        format!("{} needs {}", self.served, needs.join(", "))
    }
}

/// The explicit registration table a [`PackerRegistry`] is built from.
///
/// Registering a type twice keeps the later registration.
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<Pending>,
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl RegistryBuilder {
    fn push(mut self, served: TypeKey, source: Source) -> Self {
        self.pending.retain(|p| p.served != served);
        self.pending.push(Pending { served, source });
        self
    }

    /// Registers a packer under a stable name. The served type is `packer.packs()`.
    pub fn register<P: Packer + 'static>(self, name: impl Into<String>, packer: P) -> Self {
        let served = packer.packs();
        self.push(
            served,
            Source::Direct {
                packer: Arc::new(packer),
                naming: Naming::Fixed(name.into()),
            },
        )
    }

    /// Registers a serde type packed directly with bincode.
    pub fn primitive<T>(self, name: &str) -> Self
    where
        T: Serialize + DeserializeOwned + Any,
    {
        self.register(name, SerdePacker::<T>::new())
    }

    /// Registers the integer, float, `bool`, `char` and `String` packers.
    pub fn with_primitives(self) -> Self {
        packers::register_primitives(self)
    }

    /// Registers a nested record type under its `TYPE_NAME`.
    pub fn record<R: Archivable + Default>(self) -> Self {
        self.register(R::TYPE_NAME, RecordPacker::<R>::new())
    }

    /// Registers `HashMap<K, V>`. `K` and `V` must be registered too.
    pub fn map<K: Eq + Hash + Any, V: Any>(self) -> Self {
        self.composite::<HashMap<K, V>>(
            "map",
            vec![TypeKey::of::<K>(), TypeKey::of::<V>()],
            Arc::new(MapPacker::<HashMap<K, V>>::new()),
        )
    }

    /// Registers `BTreeMap<K, V>`. `K` and `V` must be registered too.
    pub fn ordered_map<K: Ord + Any, V: Any>(self) -> Self {
        self.composite::<BTreeMap<K, V>>(
            "ordered_map",
            vec![TypeKey::of::<K>(), TypeKey::of::<V>()],
            Arc::new(MapPacker::<BTreeMap<K, V>>::new()),
        )
    }

    /// Registers `Vec<T>`. `T` must be registered too.
    pub fn list<T: Any>(self) -> Self {
        self.composite::<Vec<T>>(
            "list",
            vec![TypeKey::of::<T>()],
            Arc::new(ListPacker::<T>::new()),
        )
    }

    /// Packs `L` with the packer of `L::Ancestor` (which must be registered,
    /// directly or by inheritance).
    pub fn inherit<L: InheritPacker>(self) -> Self {
        self.push(
            TypeKey::of::<L>(),
            Source::Inherit {
                ancestor: TypeKey::of::<L::Ancestor>(),
                adapt: |ancestor| Arc::new(InheritedPacker::<L>::new(ancestor)) as Arc<dyn Packer>,
            },
        )
    }

    fn composite<C: Any>(
        self,
        kind: &'static str,
        parts: Vec<TypeKey>,
        packer: Arc<dyn Packer>,
    ) -> Self {
        self.push(
            TypeKey::of::<C>(),
            Source::Direct {
                packer,
                naming: Naming::Composite { kind, parts },
            },
        )
    }

    /// Resolves every registration.
    ///
    /// # Errors
    /// Returns [`ArchiveError::Registry`] if an ancestor or container part is never
    /// registered, or if two canonical types claim the same stable name.
    pub fn build(self) -> Result<PackerRegistry> {
        let mut entries: HashMap<TypeId, PackerEntry> = HashMap::new();
        let mut pending = self.pending;

        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for p in pending {
                match p.resolve(&entries) {
                    Some(entry) => {
                        entries.insert(p.served.id(), entry);
                    }
                    None => waiting.push(p),
                }
            }
            if waiting.len() == before {
                let missing: Vec<String> = waiting.iter().map(|p| p.missing(&entries)).collect();
                return Err(ArchiveError::Registry(format!(
                    "unresolved registrations: {}",
                    missing.join("; ")
                )));
            }
            pending = waiting;
        }

        let mut names: HashMap<Arc<str>, TypeId> = HashMap::new();
        for entry in entries.values().filter(|e| !e.alias) {
            if let Some(previous) = names.insert(Arc::clone(&entry.name), entry.served.id()) {
                let other = entries
                    .get(&previous)
                    .map_or("<unknown>", |e| e.served.rust_name());
                return Err(ArchiveError::Registry(format!(
                    "stable name {:?} is claimed by both {} and {}",
                    entry.name, other, entry.served
                )));
            }
        }

        // Aliases encode exactly like the canonical entry of the same name, so
        // they only fill names no canonical type claims.
        for entry in entries.values().filter(|e| e.alias) {
            names
                .entry(Arc::clone(&entry.name))
                .or_insert(entry.served.id());
        }

        tracing::debug!(
            packers = entries.len(),
            names = names.len(),
            "packer registry built"
        );
        Ok(PackerRegistry { entries, names })
    }
}
