//! Managed instances
//!
//! [`FileInstance`] is the staging state stored on a leaf node.
//! [`Instance`] is a borrowed view that resolves attributes through the
//! leaf's ancestors.

use std::path::{Path, PathBuf};

use crate::codec::DicomFile;
use crate::dataset::{tags, Element, Tag, Value};
use crate::error::{FileSetError, Result};
use crate::records::RecordType;
use crate::tree::{NodeId, RecordNode};

use super::FileSet;

/// Pending change for one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staging {
    /// Matches the File-set on disk
    Committed,
    /// Not yet in the File-set; the bytes wait at `path`
    Addition { path: PathBuf },
    /// Deleted from disk on the next write
    Removal,
}

/// Staging state of a managed file, owned by its leaf node
#[derive(Debug, Clone)]
pub struct FileInstance {
    sop_instance_uid: String,
    staging: Staging,
}

impl FileInstance {
    pub(crate) fn committed(sop_instance_uid: impl Into<String>) -> Self {
        Self {
            sop_instance_uid: sop_instance_uid.into(),
            staging: Staging::Committed,
        }
    }

    pub(crate) fn staged_for_addition(sop_instance_uid: impl Into<String>, path: PathBuf) -> Self {
        Self {
            sop_instance_uid: sop_instance_uid.into(),
            staging: Staging::Addition { path },
        }
    }

    pub fn sop_instance_uid(&self) -> &str {
        &self.sop_instance_uid
    }

    pub fn staging(&self) -> &Staging {
        &self.staging
    }

    pub fn for_addition(&self) -> bool {
        matches!(self.staging, Staging::Addition { .. })
    }

    pub fn for_removal(&self) -> bool {
        matches!(self.staging, Staging::Removal)
    }

    /// Where a staged addition keeps its bytes
    pub fn stage_path(&self) -> Option<&Path> {
        match &self.staging {
            Staging::Addition { path } => Some(path),
            _ => None,
        }
    }

    /// Re-adding a committed instance staged for removal cancels both
    ///
    /// Returns whether a removal was cancelled.
    pub(crate) fn cancel_removal(&mut self) -> bool {
        if self.for_removal() {
            self.staging = Staging::Committed;
            return true;
        }
        false
    }

    /// Stage for removal
    ///
    /// A pending addition is cancelled instead and the staged file it no
    /// longer needs is returned.
    pub(crate) fn stage_removal(&mut self) -> Option<PathBuf> {
        match std::mem::replace(&mut self.staging, Staging::Removal) {
            Staging::Addition { path } => {
                self.staging = Staging::Committed;
                Some(path)
            }
            _ => None,
        }
    }
}

/// A managed instance, borrowed from its File-set
#[derive(Clone, Copy)]
pub struct Instance<'a> {
    fileset: &'a FileSet,
    node: NodeId,
}

impl<'a> Instance<'a> {
    pub(crate) fn new(fileset: &'a FileSet, node: NodeId) -> Self {
        Self { fileset, node }
    }

    /// The leaf node in the File-set's record tree
    pub fn node(&self) -> NodeId {
        self.node
    }

    fn leaf(&self) -> &'a RecordNode {
        &self.fileset.tree()[self.node]
    }

    fn state(&self) -> Option<&'a FileInstance> {
        self.leaf().instance()
    }

    pub fn sop_instance_uid(&self) -> &'a str {
        self.state()
            .map(FileInstance::sop_instance_uid)
            .unwrap_or_default()
    }

    pub fn sop_class_uid(&self) -> Option<&'a str> {
        self.leaf()
            .record()
            .string(tags::REFERENCED_SOP_CLASS_UID_IN_FILE)
    }

    pub fn transfer_syntax_uid(&self) -> Option<&'a str> {
        self.leaf()
            .record()
            .string(tags::REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE)
    }

    pub fn record_type(&self) -> &'a RecordType {
        self.leaf().record_type()
    }

    /// Find `tag` in the leaf record or the nearest ancestor holding it
    ///
    /// The file's own SOP Instance, SOP Class and Transfer Syntax UIDs are
    /// answered from the leaf's referenced-file fields.
    pub fn get(&self, tag: Tag) -> Option<&'a Element> {
        let tag = match tag {
            tags::SOP_INSTANCE_UID => tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE,
            tags::SOP_CLASS_UID => tags::REFERENCED_SOP_CLASS_UID_IN_FILE,
            tags::TRANSFER_SYNTAX_UID => tags::REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE,
            other => other,
        };
        let tree = self.fileset.tree();
        tree.reverse(self.node)
            .find_map(|id| tree[id].record().get(tag))
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.get(tag).is_some()
    }

    pub fn value(&self, tag: Tag) -> Option<&'a Value> {
        self.get(tag).map(|element| &element.value)
    }

    /// The File ID this instance will be written to
    pub fn file_id(&self) -> Result<Vec<String>> {
        self.fileset
            .tree()
            .file_id(self.node, self.fileset.alphabet())
    }

    /// The File ID currently stored in the leaf record
    pub fn referenced_file_id(&self) -> Option<&'a [String]> {
        self.leaf().referenced_file_id()
    }

    /// Where the instance's bytes are right now
    pub fn path(&self) -> Option<PathBuf> {
        if let Some(path) = self.state().and_then(FileInstance::stage_path) {
            return Some(path.to_path_buf());
        }
        let root = self.fileset.path()?;
        let components = self.referenced_file_id()?;
        Some(components.iter().fold(root.to_path_buf(), |path, component| path.join(component)))
    }

    /// Decode the instance's file
    pub fn load(&self) -> Result<DicomFile> {
        let path = self.path().ok_or_else(|| {
            FileSetError::Usage(format!(
                "the instance '{}' has no file to load yet",
                self.sop_instance_uid()
            ))
        })?;
        DicomFile::open(path)
    }

    pub fn for_addition(&self) -> bool {
        self.state().map_or(false, FileInstance::for_addition)
    }

    pub fn for_removal(&self) -> bool {
        self.state().map_or(false, FileInstance::for_removal)
    }

    /// Whether the next write moves the file to a new File ID
    pub fn for_moving(&self) -> bool {
        if self.for_addition() {
            return false;
        }
        match (self.referenced_file_id(), self.file_id()) {
            (Some(current), Ok(generated)) => current != generated.as_slice(),
            _ => true,
        }
    }

    pub fn is_staged(&self) -> bool {
        self.for_addition() || self.for_removal() || self.for_moving()
    }

    pub fn is_private(&self) -> bool {
        *self.record_type() == RecordType::Private
    }
}

impl std::fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("node", &self.node)
            .field("sop_instance_uid", &self.sop_instance_uid())
            .field("record_type", self.record_type())
            .finish()
    }
}
