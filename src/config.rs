//! Configuration for a File-set
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::dataset::uid;

/// Main configuration for a [`FileSet`](crate::FileSet)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Staging Configuration
    // -------------------------------------------------------------------------
    /// Parent directory for the staging area.
    ///
    /// Each File-set creates its own temporary directory underneath:
    ///   {staging_dir}/
    ///     └── .fileset-XXXXXX/   (one per FileSet, removed on close/clear)
    ///         └── <SOP Instance UID>   (one file per staged addition)
    ///
    /// `None` uses the platform temporary directory.
    pub staging_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Encoding Configuration
    // -------------------------------------------------------------------------
    /// Reject directory files that use a non-conformant transfer syntax
    /// instead of loading them with a warning
    pub strict_encoding: bool,

    /// Implementation Class UID written to every file meta group
    pub implementation_class_uid: String,

    /// Implementation Version Name written to every file meta group
    pub implementation_version_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            staging_dir: None,
            strict_encoding: false,
            implementation_class_uid: uid::IMPLEMENTATION_CLASS_UID.to_string(),
            implementation_version_name: uid::IMPLEMENTATION_VERSION_NAME.to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the parent directory of the staging area
    pub fn staging_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(path.into());
        self
    }

    /// Fail to load directory files with a non-conformant transfer syntax
    pub fn strict_encoding(mut self, strict: bool) -> Self {
        self.config.strict_encoding = strict;
        self
    }

    /// Set the Implementation Class UID
    pub fn implementation_class_uid(mut self, uid: impl Into<String>) -> Self {
        self.config.implementation_class_uid = uid.into();
        self
    }

    /// Set the Implementation Version Name
    pub fn implementation_version_name(mut self, name: impl Into<String>) -> Self {
        self.config.implementation_version_name = name.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
