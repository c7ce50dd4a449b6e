//! The archive entry point.

use crate::config::ArchiveOptions;
use crate::context::ArchiveContext;
use crate::error::Result;
use crate::registry::PackerRegistry;
use crate::store::{self, StorageFolder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// The main entry point: a root directory of record folders.
///
/// ```rust
/// use packfold::{Archive, Archivable, PackerRegistry};
///
/// #[derive(Archivable, Default, Debug, PartialEq)]
/// struct Resident {
///     #[archive]
///     name: String,
///     #[archive]
///     balance: f64,
/// }
///
/// let root = tempfile::tempdir()?;
/// let archive = Archive::builder(root.path())
///     .registry(PackerRegistry::primitives()?)
///     .build()?;
///
/// let residents = archive.folder("residents")?;
/// residents.write("alice", &Resident { name: "Alice".into(), balance: 12.5 })?;
///
/// let mut back = Resident::default();
/// assert!(residents.read("alice", &mut back)?.found);
/// assert_eq!(back.balance, 12.5);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
    options: ArchiveOptions,
    cx: Arc<ArchiveContext>,
}

impl Archive {
    /// Starts configuring an archive rooted at `root`.
    pub fn builder<P: AsRef<Path>>(root: P) -> ArchiveBuilder {
        ArchiveBuilder {
            root: root.as_ref().to_path_buf(),
            registry: None,
            options: ArchiveOptions::default(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The options the archive was built with.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// The shared registry and field cache.
    pub fn context(&self) -> &Arc<ArchiveContext> {
        &self.cx
    }

    /// The record folder `name` under the root.
    ///
    /// The directory is created unless `create_folders` is disabled.
    pub fn folder(&self, name: &str) -> Result<StorageFolder> {
        store::validate_name(name)?;
        let path = self.root.join(name);
        if self.options.create_folders {
            StorageFolder::open(path, Arc::clone(&self.cx))
        } else {
            Ok(StorageFolder::existing(path, Arc::clone(&self.cx)))
        }
    }
}

/// Builder for [`Archive`].
#[derive(Debug)]
pub struct ArchiveBuilder {
    root: PathBuf,
    registry: Option<PackerRegistry>,
    options: ArchiveOptions,
}

impl ArchiveBuilder {
    /// Sets the packer registry. Defaults to [`PackerRegistry::primitives`].
    pub fn registry(mut self, registry: PackerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces all options.
    pub fn options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the field cache idle timeout (whole seconds).
    pub fn field_cache_idle(mut self, idle: Duration) -> Self {
        self.options.field_cache_idle_secs = idle.as_secs();
        self
    }

    /// Builds the archive, creating the root directory if folders are auto-created.
    pub fn build(self) -> Result<Archive> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => PackerRegistry::primitives()?,
        };
        if self.options.create_folders {
            std::fs::create_dir_all(&self.root)?;
        }

        tracing::debug!(
            root = %self.root.display(),
            packers = registry.len(),
            field_cache_idle_secs = self.options.field_cache_idle_secs,
            "archive opened"
        );
        let cx = ArchiveContext::with_idle_timeout(registry, self.options.field_cache_idle());
        Ok(Archive {
            root: self.root,
            options: self.options,
            cx: Arc::new(cx),
        })
    }
}
