//! Archive configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Archive configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveOptions {
    /// Seconds an unused field set stays in the descriptor cache
    pub field_cache_idle_secs: u64,

    /// Create record folders on first use (default: true)
    pub create_folders: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            field_cache_idle_secs: 60,
            create_folders: true,
        }
    }
}

impl ArchiveOptions {
    /// Create a new options builder
    pub fn builder() -> ArchiveOptionsBuilder {
        ArchiveOptionsBuilder::default()
    }

    /// The field cache idle timeout
    pub fn field_cache_idle(&self) -> Duration {
        Duration::from_secs(self.field_cache_idle_secs)
    }
}

/// Options builder for fluent API
#[derive(Debug, Default)]
pub struct ArchiveOptionsBuilder {
    field_cache_idle_secs: Option<u64>,
    create_folders: Option<bool>,
}

impl ArchiveOptionsBuilder {
    /// Set the field cache idle timeout in seconds
    pub fn field_cache_idle_secs(mut self, secs: u64) -> Self {
        self.field_cache_idle_secs = Some(secs);
        self
    }

    /// Create record folders on first use (default: true)
    pub fn create_folders(mut self, create: bool) -> Self {
        self.create_folders = Some(create);
        self
    }

    /// Build the options
    pub fn build(self) -> ArchiveOptions {
        let defaults = ArchiveOptions::default();

        ArchiveOptions {
            field_cache_idle_secs: self
                .field_cache_idle_secs
                .unwrap_or(defaults.field_cache_idle_secs),
            create_folders: self.create_folders.unwrap_or(defaults.create_folders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ArchiveOptions::builder()
            .field_cache_idle_secs(5)
            .create_folders(false)
            .build();

        assert_eq!(options.field_cache_idle(), Duration::from_secs(5));
        assert!(!options.create_folders);
    }

    #[test]
    fn test_options_defaults() {
        let options = ArchiveOptions::builder().build();
        assert_eq!(options, ArchiveOptions::default());
        assert_eq!(options.field_cache_idle_secs, 60);
        assert!(options.create_folders);
    }
}
