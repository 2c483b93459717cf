//! Staging area
//!
//! Everything a File-set has changed but not yet written: the temporary
//! directory holding the bytes of staged additions, the pending additions
//! and removals keyed by SOP Instance UID, and two flags for changes that
//! have no per-instance entry.
//!
//! ```text
//! {staging_dir}/.fileset-XXXXXX/
//!   ├── 1.2.826.0.1.3680043.8.498.1   (staged addition)
//!   └── 1.2.826.0.1.3680043.8.498.2
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::Config;
use crate::error::Result;
use crate::tree::NodeId;

/// Pending changes of a File-set
#[derive(Debug)]
pub struct Stage {
    dir: TempDir,
    pub(crate) additions: BTreeMap<String, NodeId>,
    pub(crate) removals: BTreeMap<String, NodeId>,
    /// Some File IDs no longer match the tree
    pub(crate) restructure: bool,
    /// Top-level DICOMDIR values changed
    pub(crate) metadata_dirty: bool,
}

impl Stage {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".fileset-");
        let dir = match &config.staging_dir {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        Ok(Self {
            dir,
            additions: BTreeMap::new(),
            removals: BTreeMap::new(),
            restructure: false,
            metadata_dirty: false,
        })
    }

    /// The staging directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where a staged addition with this UID keeps its bytes
    ///
    /// Only valid UIDs are staged, so the UID is a safe file name.
    pub fn staged_path(&self, sop_instance_uid: &str) -> PathBuf {
        self.dir.path().join(sop_instance_uid)
    }

    /// Where a committed file waits while another instance takes its path
    pub fn relocation_path(&self, index: usize) -> PathBuf {
        self.dir.path().join(format!("relocated-{}", index))
    }

    /// Whether anything is waiting to be written
    pub fn is_pending(&self) -> bool {
        !self.additions.is_empty()
            || !self.removals.is_empty()
            || self.restructure
            || self.metadata_dirty
    }

    /// Delete the staging directory
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}
