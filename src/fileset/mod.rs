//! File-set
//!
//! A [`FileSet`] owns the record tree, the registry of managed instances
//! and the staging area. Changes are staged in memory (and in the staging
//! directory for the bytes of new files) until `write()` commits them.
//!
//! ## Lifecycle
//! ```text
//!   new() ──► Fresh ──add/remove──► Staged ──write()──► Committed
//!               ▲                     ▲                     │
//!               │                     └────add/remove───────┘
//!               └──────────── clear() from any state
//! ```
//!
//! ## On-disk layout
//! ```text
//! <root>/
//!   ├── DICOMDIR
//!   ├── PT000000/ST000000/SE000000/IM000000
//!   ├── PT000000/ST000000/SE000000/IM000001
//!   └── HG000000                      (single-level record)
//! ```

mod instance;
mod load;
mod stage;
mod summary;
mod write;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::{create_meta, DicomFile, TransferSyntax};
use crate::config::Config;
use crate::dataset::{tags, uid, Dataset, Tag, Value};
use crate::error::{FileSetError, Result};
use crate::file_id::Alphabet;
use crate::records::RecordFactory;
use crate::tree::{NodeId, RecordChain, RecordTree};

pub use instance::{FileInstance, Instance, Staging};
pub use load::{LoadOptions, LoadReport};
pub use stage::Stage;
pub use write::WriteOptions;

/// Maximum length of the File-set ID
pub const MAX_FILE_SET_ID_LEN: usize = 16;

/// Maximum length of one descriptor File ID component
pub const MAX_DESCRIPTOR_COMPONENT_LEN: usize = 16;

/// Where an instance to add comes from
#[derive(Debug, Clone)]
pub enum Source {
    /// A Part-10 file on disk, staged byte for byte
    Path(PathBuf),
    /// A decoded file, re-encoded into the staging area
    File(DicomFile),
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&PathBuf> for Source {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl From<DicomFile> for Source {
    fn from(file: DicomFile) -> Self {
        Self::File(file)
    }
}

/// A DICOM File-set
pub struct FileSet {
    config: Config,
    factory: RecordFactory,
    tree: RecordTree,
    /// Live instances in the order they joined the File-set
    instances: Vec<NodeId>,
    /// Live instances by SOP Instance UID
    live: HashMap<String, NodeId>,
    stage: Stage,

    /// Root directory; `None` until loaded or written
    path: Option<PathBuf>,
    id: Option<String>,
    uid: String,
    descriptor_file_id: Option<Vec<String>>,
    descriptor_character_set: Option<String>,
    /// Top-level DICOMDIR elements read from disk that are not managed here
    extra_elements: Dataset,
    /// Whether a DICOMDIR was loaded or written
    has_directory: bool,
    alphabet: Alphabet,
}

impl FileSet {
    /// A fresh, empty File-set
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let stage = Stage::new(&config)?;
        Ok(Self {
            config,
            factory: RecordFactory::new(),
            tree: RecordTree::new(),
            instances: Vec::new(),
            live: HashMap::new(),
            stage,
            path: None,
            id: None,
            uid: uid::generate_uid(),
            descriptor_file_id: None,
            descriptor_character_set: None,
            extra_elements: Dataset::new(),
            has_directory: false,
            alphabet: Alphabet::Numeric,
        })
    }

    /// Use `factory` to build records for new instances
    pub fn with_factory(mut self, factory: RecordFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn factory_mut(&mut self) -> &mut RecordFactory {
        &mut self.factory
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &RecordTree {
        &self.tree
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Root directory of the File-set
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File-set ID (0004,1130)
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// File-set UID, the DICOMDIR's Media Storage SOP Instance UID
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn descriptor_file_id(&self) -> Option<&[String]> {
        self.descriptor_file_id.as_deref()
    }

    pub fn descriptor_character_set(&self) -> Option<&str> {
        self.descriptor_character_set.as_deref()
    }

    /// Alphabet File ID components are generated with
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether `write()` has anything to do
    pub fn is_staged(&self) -> bool {
        !self.has_directory || self.stage.is_pending()
    }

    /// Live instances in the order they joined
    pub fn instances(&self) -> impl Iterator<Item = Instance<'_>> + '_ {
        self.instances.iter().map(move |&id| Instance::new(self, id))
    }

    /// Live instance with the given SOP Instance UID
    pub fn instance(&self, sop_instance_uid: &str) -> Option<Instance<'_>> {
        self.live
            .get(sop_instance_uid)
            .map(|&id| Instance::new(self, id))
    }

    /// Instances staged for removal
    pub fn removals(&self) -> impl Iterator<Item = Instance<'_>> + '_ {
        self.stage
            .removals
            .values()
            .map(move |&id| Instance::new(self, id))
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Set or clear the File-set ID
    pub fn set_id(&mut self, id: Option<&str>) -> Result<()> {
        if self.id.as_deref() == id {
            return Ok(());
        }
        if let Some(id) = id {
            if id.len() > MAX_FILE_SET_ID_LEN {
                return Err(FileSetError::Validation(format!(
                    "the File-set ID '{}' exceeds the maximum length of {} characters",
                    id, MAX_FILE_SET_ID_LEN
                )));
            }
        }
        self.id = id.map(str::to_string);
        self.stage.metadata_dirty = true;
        Ok(())
    }

    pub fn set_uid(&mut self, uid: &str) -> Result<()> {
        if self.uid == uid {
            return Ok(());
        }
        if !uid::is_valid_uid(uid) {
            return Err(FileSetError::Validation(format!(
                "'{}' is not a valid UID",
                uid
            )));
        }
        self.uid = uid.to_string();
        self.stage.metadata_dirty = true;
        Ok(())
    }

    /// Set or clear the File-set Descriptor File ID
    pub fn set_descriptor_file_id(&mut self, file_id: Option<Vec<String>>) -> Result<()> {
        if self.descriptor_file_id == file_id {
            return Ok(());
        }
        if let Some(components) = &file_id {
            if components.is_empty() || components.len() > crate::file_id::MAX_DEPTH {
                return Err(FileSetError::Validation(format!(
                    "the descriptor File ID must have between 1 and {} components, got {}",
                    crate::file_id::MAX_DEPTH,
                    components.len()
                )));
            }
            if let Some(component) = components
                .iter()
                .find(|c| c.is_empty() || c.len() > MAX_DESCRIPTOR_COMPONENT_LEN)
            {
                return Err(FileSetError::Validation(format!(
                    "the descriptor File ID component '{}' must be 1 to {} characters",
                    component, MAX_DESCRIPTOR_COMPONENT_LEN
                )));
            }
        }
        self.descriptor_file_id = file_id;
        self.stage.metadata_dirty = true;
        Ok(())
    }

    pub fn set_descriptor_character_set(&mut self, character_set: Option<&str>) -> Result<()> {
        if self.descriptor_character_set.as_deref() == character_set {
            return Ok(());
        }
        self.descriptor_character_set = character_set.map(str::to_string);
        self.stage.metadata_dirty = true;
        Ok(())
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Stage an instance for addition
    ///
    /// Adding an instance that is already managed returns it unchanged.
    /// Adding one that is staged for removal cancels the removal.
    pub fn add(&mut self, source: impl Into<Source>) -> Result<Instance<'_>> {
        let (file, bytes) = self.prepare(source.into())?;
        let sop_instance_uid = required_uid(&file)?;

        if let Some(id) = self.restore(&sop_instance_uid) {
            return Ok(Instance::new(self, id));
        }
        let chain = self.factory.build_chain(&file)?;
        let id = self.stage_chain(chain, sop_instance_uid, &bytes)?;
        Ok(Instance::new(self, id))
    }

    /// Stage an instance for addition under caller-built records
    ///
    /// `records` run from the top of the hierarchy down to the leaf, eight
    /// at most. The leaf's referenced-file fields are filled in if missing.
    pub fn add_custom(
        &mut self,
        source: impl Into<Source>,
        records: Vec<Dataset>,
    ) -> Result<Instance<'_>> {
        let (file, bytes) = self.prepare(source.into())?;
        let sop_instance_uid = required_uid(&file)?;

        if let Some(id) = self.restore(&sop_instance_uid) {
            return Ok(Instance::new(self, id));
        }
        let chain = self.factory.custom_chain(records, &file)?;
        let id = self.stage_chain(chain, sop_instance_uid, &bytes)?;
        Ok(Instance::new(self, id))
    }

    /// Decode a source and get the bytes to stage for it
    fn prepare(&self, source: Source) -> Result<(DicomFile, Vec<u8>)> {
        match source {
            Source::Path(path) => {
                let bytes = fs::read(&path)?;
                let file = DicomFile::from_bytes(&bytes)?;
                Ok((file, bytes))
            }
            Source::File(mut file) => {
                self.complete_meta(&mut file);
                let bytes = file.to_bytes()?;
                Ok((file, bytes))
            }
        }
    }

    /// Give an in-memory dataset the file meta elements it needs to be staged
    fn complete_meta(&self, file: &mut DicomFile) {
        let sop_class_uid = file.dataset.string(tags::SOP_CLASS_UID).unwrap_or_default();
        let sop_instance_uid = file
            .dataset
            .string(tags::SOP_INSTANCE_UID)
            .unwrap_or_default();
        let defaults = create_meta(
            sop_class_uid,
            sop_instance_uid,
            TransferSyntax::ExplicitVrLittleEndian,
            &self.config.implementation_class_uid,
            &self.config.implementation_version_name,
        );
        for (tag, element) in defaults {
            if file.meta.get(tag).map_or(true, |existing| existing.is_empty()) {
                file.meta.insert(tag, element);
            }
        }
    }

    /// Bring back an instance staged for removal, or find a live one
    fn restore(&mut self, sop_instance_uid: &str) -> Option<NodeId> {
        if let Some(&id) = self.live.get(sop_instance_uid) {
            return Some(id);
        }

        let id = self.stage.removals.remove(sop_instance_uid)?;
        if let Some(instance) = self.tree[id].instance.as_mut() {
            instance.cancel_removal();
        }
        self.live.insert(sop_instance_uid.to_string(), id);
        self.instances.push(id);
        debug!(sop_instance_uid, "removal cancelled");
        Some(id)
    }

    /// Write the staged bytes, then splice the chain into the tree
    fn stage_chain(
        &mut self,
        mut chain: RecordChain,
        sop_instance_uid: String,
        bytes: &[u8],
    ) -> Result<NodeId> {
        let staged = self.stage.staged_path(&sop_instance_uid);
        fs::write(&staged, bytes)?;

        chain.leaf_mut().instance = Some(FileInstance::staged_for_addition(
            sop_instance_uid.clone(),
            staged,
        ));
        let id = self.tree.add(chain);

        debug!(
            sop_instance_uid = %sop_instance_uid,
            record_type = %self.tree[id].record_type(),
            "staged for addition"
        );
        self.stage.additions.insert(sop_instance_uid.clone(), id);
        self.live.insert(sop_instance_uid, id);
        self.instances.push(id);
        Ok(id)
    }

    /// Stage one instance for removal
    ///
    /// Removing an instance that is staged for addition drops it entirely.
    pub fn remove(&mut self, sop_instance_uid: &str) -> Result<()> {
        let id = *self
            .live
            .get(sop_instance_uid)
            .ok_or_else(|| FileSetError::InstanceNotFound(sop_instance_uid.to_string()))?;

        let for_addition = self.tree[id]
            .instance()
            .map_or(false, FileInstance::for_addition);

        if for_addition {
            // Detach first so a failure leaves the registry as it was
            let mut node = self.tree.remove(id)?;
            self.forget(sop_instance_uid, id);
            self.stage.additions.remove(sop_instance_uid);
            if let Some(staged) = node.instance.as_mut().and_then(FileInstance::stage_removal) {
                match fs::remove_file(&staged) {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => warn!(
                        sop_instance_uid,
                        path = %staged.display(),
                        error = %e,
                        "unable to delete the staged file"
                    ),
                    _ => {}
                }
            }
            debug!(sop_instance_uid, "addition cancelled");
        } else {
            if let Some(instance) = self.tree[id].instance.as_mut() {
                instance.stage_removal();
            }
            self.forget(sop_instance_uid, id);
            self.stage
                .removals
                .insert(sop_instance_uid.to_string(), id);
            debug!(sop_instance_uid, "staged for removal");
        }
        Ok(())
    }

    /// Drop an instance from the live registry
    fn forget(&mut self, sop_instance_uid: &str, id: NodeId) {
        self.live.remove(sop_instance_uid);
        self.instances.retain(|&live| live != id);
    }

    /// Stage several instances for removal
    ///
    /// Every UID is checked before any is removed.
    pub fn remove_all<S: AsRef<str>>(&mut self, sop_instance_uids: &[S]) -> Result<()> {
        if let Some(missing) = sop_instance_uids
            .iter()
            .map(AsRef::as_ref)
            .find(|uid| !self.live.contains_key(*uid))
        {
            return Err(FileSetError::InstanceNotFound(missing.to_string()));
        }
        for sop_instance_uid in sop_instance_uids.iter().map(AsRef::as_ref) {
            if self.live.contains_key(sop_instance_uid) {
                self.remove(sop_instance_uid)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Instances whose values equal every `(tag, value)` filter
    ///
    /// Without `load` only directory records are searched, which cover a
    /// small set of attributes. A warning is logged when no record holds
    /// all the filter tags. With `load` every file is decoded.
    pub fn find(&self, filters: &[(Tag, Value)], load: bool) -> Result<Vec<Instance<'_>>> {
        if !load {
            self.warn_uncovered(filters.iter().map(|(tag, _)| *tag));
        }

        let mut matches = Vec::new();
        for instance in self.instances() {
            let matched = if load {
                let file = instance.load()?;
                filters
                    .iter()
                    .all(|(tag, value)| loaded_value(&file, *tag) == Some(value))
            } else {
                filters
                    .iter()
                    .all(|(tag, value)| instance.value(*tag) == Some(value))
            };
            if matched {
                matches.push(instance);
            }
        }
        Ok(matches)
    }

    /// Distinct values of `tags` across instances
    ///
    /// `sop_instance_uids` limits the search; `None` searches every live
    /// instance. Values keep the order they were first seen in.
    pub fn find_values(
        &self,
        tags: &[Tag],
        sop_instance_uids: Option<&[&str]>,
        load: bool,
    ) -> Result<BTreeMap<Tag, Vec<Value>>> {
        if !load {
            self.warn_uncovered(tags.iter().copied());
        }

        let candidates: Vec<Instance<'_>> = match sop_instance_uids {
            Some(uids) => uids
                .iter()
                .map(|uid| {
                    self.instance(uid)
                        .ok_or_else(|| FileSetError::InstanceNotFound(uid.to_string()))
                })
                .collect::<Result<_>>()?,
            None => self.instances().collect(),
        };

        let mut found: BTreeMap<Tag, Vec<Value>> =
            tags.iter().map(|&tag| (tag, Vec::new())).collect();
        for instance in candidates {
            let file = if load { Some(instance.load()?) } else { None };
            for &tag in tags {
                let value = match &file {
                    Some(file) => loaded_value(file, tag),
                    None => instance.value(tag),
                };
                if let (Some(value), Some(values)) = (value, found.get_mut(&tag)) {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
            }
        }
        Ok(found)
    }

    /// Warn when no directory record carries every tag in `tags`
    fn warn_uncovered(&self, tags: impl Iterator<Item = Tag>) {
        let tags: Vec<Tag> = tags.collect();
        if tags.is_empty() {
            return;
        }
        let covered = self.instances().any(|instance| tags.iter().all(|&tag| instance.contains(tag)));
        if !covered {
            warn!(
                "None of the records in the DICOMDIR dataset contain all the query elements, consider using the 'load' parameter to expand the search to the corresponding SOP instances"
            );
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Go back to a fresh File-set with a new staging directory
    pub fn clear(&mut self) -> Result<()> {
        let stage = Stage::new(&self.config)?;
        let old = std::mem::replace(&mut self.stage, stage);

        self.tree = RecordTree::new();
        self.instances.clear();
        self.live.clear();
        self.path = None;
        self.id = None;
        self.uid = uid::generate_uid();
        self.descriptor_file_id = None;
        self.descriptor_character_set = None;
        self.extra_elements = Dataset::new();
        self.has_directory = false;
        self.alphabet = Alphabet::Numeric;

        old.close()
    }

    /// Delete the staging directory and drop the File-set
    pub fn close(self) -> Result<()> {
        self.stage.close()
    }
}

/// SOP Instance UID of a file that is about to be added
fn required_uid(file: &DicomFile) -> Result<String> {
    match file.dataset.string(tags::SOP_INSTANCE_UID) {
        Some(value) if uid::is_valid_uid(value) => Ok(value.to_string()),
        // Staged files are named after the UID, so it must be well formed
        Some(value) if !value.is_empty() => Err(FileSetError::Validation(format!(
            "Unable to add the instance, its SOP Instance UID '{}' is not a valid UID",
            value
        ))),
        Some(_) => Err(FileSetError::EmptyElement {
            context: "Unable to add the instance".to_string(),
            tag: tags::SOP_INSTANCE_UID,
            keyword: tags::SOP_INSTANCE_UID.keyword(),
        }),
        None => Err(FileSetError::MissingElement {
            context: "Unable to add the instance".to_string(),
            tag: tags::SOP_INSTANCE_UID,
            keyword: tags::SOP_INSTANCE_UID.keyword(),
        }),
    }
}

/// Value of `tag` in a decoded file, meta group included
fn loaded_value(file: &DicomFile, tag: Tag) -> Option<&Value> {
    if tag.group() == 0x0002 {
        return file.meta.value(tag);
    }
    file.dataset.value(tag)
}
