//! Loading an existing File-set
//!
//! Records are linked by following offsets from (0004,1200): next-sibling
//! pointers along a level, lower-level pointers down to the children.
//! Records never reached that way are orphans.
//!
//! ```text
//! (0004,1200) ──► PATIENT ──next──► PATIENT ──next──► 0
//!                    │ lower
//!                    ▼
//!                  STUDY ──next──► 0
//! ```

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::TransferSyntax;
use crate::dataset::{tags, Dataset, Tag};
use crate::directory::{DirectoryFile, DICOMDIR};
use crate::error::{FileSetError, Result};
use crate::file_id::{self, Alphabet};
use crate::records::RecordType;
use crate::tree::{NodeId, RecordNode, RecordTree};

use super::{FileInstance, FileSet, Source};

/// Top-level elements the File-set writes itself
const MANAGED_ELEMENTS: [Tag; 7] = [
    tags::FILE_SET_ID,
    tags::FILE_SET_DESCRIPTOR_FILE_ID,
    tags::SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE,
    tags::OFFSET_OF_FIRST_ROOT_RECORD,
    tags::OFFSET_OF_LAST_ROOT_RECORD,
    tags::FILE_SET_CONSISTENCY_FLAG,
    tags::DIRECTORY_RECORD_SEQUENCE,
];

/// How orphaned records are treated
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Add orphans that reference an existing file back into the tree
    pub include_orphans: bool,
    /// Fail if there are any orphans at all
    pub raise_orphans: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            include_orphans: true,
            raise_orphans: false,
        }
    }
}

/// What happened while loading
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Live instances after loading
    pub instances: usize,
    pub orphans_adopted: usize,
    pub orphans_skipped: usize,
    /// Records whose referenced file was not on disk
    pub missing_files: usize,
    /// The DICOMDIR will be rewritten as explicit VR little endian
    pub transfer_syntax_normalised: bool,
    /// Every warning logged during the load
    pub warnings: Vec<String>,
}

impl LoadReport {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

impl FileSet {
    /// Load the File-set at `path`
    ///
    /// `path` is the DICOMDIR file or the directory holding it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut fileset = Self::new()?;
        fileset.load(path)?;
        Ok(fileset)
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        self.load_with(path, LoadOptions::default())
    }

    /// Replace this File-set's contents with the File-set at `path`
    ///
    /// Problems with single records are logged and reported; the rest of
    /// the File-set still loads.
    pub fn load_with(&mut self, path: impl AsRef<Path>, options: LoadOptions) -> Result<LoadReport> {
        let strict = self.config.strict_encoding;
        self.load_from(path.as_ref(), options, strict)
    }

    pub(super) fn load_from(
        &mut self,
        path: &Path,
        options: LoadOptions,
        strict: bool,
    ) -> Result<LoadReport> {
        let dicomdir = if path.is_dir() {
            path.join(DICOMDIR)
        } else {
            path.to_path_buf()
        };
        let dicomdir = fs::canonicalize(&dicomdir)?;
        let root = dicomdir
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                FileSetError::Usage(format!(
                    "'{}' has no parent directory to use as the File-set root",
                    dicomdir.display()
                ))
            })?;

        let DirectoryFile {
            meta,
            dataset,
            records,
            transfer_syntax,
        } = DirectoryFile::open(&dicomdir)?;

        let encoding_warning = (transfer_syntax != TransferSyntax::ExplicitVrLittleEndian).then(|| {
            format!(
                "The DICOMDIR dataset uses an invalid transfer syntax '{}' and will be updated to use 'Explicit VR Little Endian'",
                transfer_syntax.uid()
            )
        });
        if let (Some(message), true) = (&encoding_warning, strict) {
            return Err(FileSetError::Encoding(message.clone()));
        }

        let first_root = dataset.u32(tags::OFFSET_OF_FIRST_ROOT_RECORD).unwrap_or(0) as u64;
        let linked = LinkedRecords::link(first_root, records)?;
        let orphan_count = linked.orphan_count();
        if options.raise_orphans && orphan_count > 0 {
            return Err(FileSetError::Structural(format!(
                "The DICOMDIR contains {} orphaned directory record{}",
                orphan_count,
                if orphan_count == 1 { "" } else { "s" }
            )));
        }
        let (tree, orphans) = linked.into_tree()?;

        // Everything above leaves the File-set as it was on failure
        self.clear()?;
        let mut report = LoadReport::default();
        if let Some(message) = encoding_warning {
            report.warn(message);
            report.transfer_syntax_normalised = true;
            self.stage.metadata_dirty = true;
        }

        match meta.string(tags::MEDIA_STORAGE_SOP_INSTANCE_UID) {
            Some(value) if !value.is_empty() => self.uid = value.to_string(),
            _ => {
                debug!(uid = %self.uid, "DICOMDIR has no File-set UID, generated one");
                self.stage.metadata_dirty = true;
            }
        }
        self.id = dataset
            .string(tags::FILE_SET_ID)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        self.descriptor_file_id = dataset
            .strings(tags::FILE_SET_DESCRIPTOR_FILE_ID)
            .filter(|components| components.iter().any(|c| !c.is_empty()))
            .map(<[String]>::to_vec);
        self.descriptor_character_set = dataset
            .string(tags::SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE)
            .filter(|charset| !charset.is_empty())
            .map(str::to_string);
        self.extra_elements = dataset
            .into_iter()
            .filter(|(tag, _)| !tag.is_group_length() && !MANAGED_ELEMENTS.contains(tag))
            .collect();
        self.path = Some(root.clone());
        self.has_directory = true;
        self.tree = tree;

        self.register_instances(&root, &mut report)?;
        self.adopt_orphans(orphans, &root, options.include_orphans, &mut report);

        self.alphabet = Alphabet::for_count(self.len()).unwrap_or(Alphabet::Alphanumeric);
        self.stage.restructure = self.layout_changed()?;
        report.instances = self.len();

        info!(
            path = %root.display(),
            instances = report.instances,
            orphans_adopted = report.orphans_adopted,
            warnings = report.warnings.len(),
            "File-set loaded"
        );
        Ok(report)
    }

    /// Turn leaf records that reference a file on disk into instances
    ///
    /// Leaves without a usable reference are detached, along with any
    /// ancestor left empty.
    fn register_instances(&mut self, root: &Path, report: &mut LoadReport) -> Result<()> {
        let leaves: Vec<NodeId> = self
            .tree
            .iter()
            .filter(|&id| self.tree[id].children().is_empty())
            .collect();

        for id in leaves {
            if !self.tree.contains(id) {
                continue;
            }
            let node = &self.tree[id];
            let offset = node.offset().unwrap_or(0);
            let components = node.referenced_file_id().map(<[String]>::to_vec);
            let sop_instance_uid = node
                .record()
                .string(tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE)
                .filter(|uid| !uid.is_empty())
                .map(str::to_string);

            let components = match components {
                Some(components) => components,
                None => {
                    self.tree.remove(id)?;
                    continue;
                }
            };

            let problem = match &sop_instance_uid {
                _ if !components.iter().all(|c| file_id::is_safe_component(c)) => Some(format!(
                    "The directory record at offset {} has an unusable Referenced File ID '{}'",
                    offset,
                    components.join("\\")
                )),
                None => Some(format!(
                    "The directory record at offset {} references a file but has no Referenced SOP Instance UID in File",
                    offset
                )),
                Some(uid) if self.live.contains_key(uid) => Some(format!(
                    "The directory record at offset {} references the SOP Instance '{}' which is already in the File-set",
                    offset, uid
                )),
                Some(_) => {
                    let path = join_file_id(root, &components);
                    if path.is_file() {
                        None
                    } else {
                        report.missing_files += 1;
                        Some(format!(
                            "The referenced SOP Instance for the directory record at offset {} does not exist: {}",
                            offset,
                            path.display()
                        ))
                    }
                }
            };

            match (problem, sop_instance_uid) {
                (None, Some(uid)) => {
                    self.tree[id].instance = Some(FileInstance::committed(uid.clone()));
                    self.live.insert(uid, id);
                    self.instances.push(id);
                }
                (problem, _) => {
                    if let Some(message) = problem {
                        report.warn(message);
                    }
                    self.tree.remove(id)?;
                    self.stage.metadata_dirty = true;
                }
            }
        }
        Ok(())
    }

    /// Stage orphaned records that reference a file for addition
    fn adopt_orphans(
        &mut self,
        orphans: Vec<(u64, Dataset)>,
        root: &Path,
        include: bool,
        report: &mut LoadReport,
    ) {
        let candidates: Vec<(u64, Dataset, Vec<String>)> = orphans
            .into_iter()
            .filter_map(|(offset, record)| {
                let components = record
                    .strings(tags::REFERENCED_FILE_ID)
                    .filter(|components| !components.is_empty())?
                    .to_vec();
                Some((offset, record, components))
            })
            .collect();

        if candidates.is_empty() {
            return;
        }
        if !include {
            report.orphans_skipped = candidates.len();
            report.warn(format!(
                "The DICOMDIR has {} orphaned directory records that reference an instance that will not be included in the File-set",
                candidates.len()
            ));
            return;
        }

        for (offset, record, components) in candidates {
            match self.adopt(record, root, &components) {
                Ok(id) => {
                    report.orphans_adopted += 1;
                    report.warn(format!(
                        "The orphaned directory record at offset {} was added to the File-set as '{}'",
                        offset,
                        self.tree[id].key()
                    ));
                }
                Err(e) => {
                    report.orphans_skipped += 1;
                    report.warn(format!(
                        "The orphaned directory record at offset {} could not be added to the File-set: {}",
                        offset, e
                    ));
                }
            }
        }
    }

    fn adopt(&mut self, record: Dataset, root: &Path, components: &[String]) -> Result<NodeId> {
        if !components.iter().all(|c| file_id::is_safe_component(c)) {
            return Err(FileSetError::Validation(format!(
                "unusable Referenced File ID '{}'",
                components.join("\\")
            )));
        }
        if let Some(uid) = record.string(tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE) {
            if self.live.contains_key(uid) {
                return Err(FileSetError::Validation(format!(
                    "the SOP Instance '{}' is already in the File-set",
                    uid
                )));
            }
        }
        let path = join_file_id(root, components);
        if !path.is_file() {
            return Err(FileSetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("the referenced file does not exist: {}", path.display()),
            )));
        }

        let is_private = record
            .string(tags::DIRECTORY_RECORD_TYPE)
            .map_or(false, |value| RecordType::parse(value) == RecordType::Private);
        let id = if is_private {
            self.add_custom(Source::Path(path), vec![record])?.node()
        } else {
            self.add(Source::Path(path))?.node()
        };

        self.tree[id]
            .record_mut()
            .put(tags::REFERENCED_FILE_ID, components.to_vec());
        Ok(id)
    }

    /// Whether any committed instance sits somewhere other than its File ID
    pub(super) fn layout_changed(&self) -> Result<bool> {
        let mut planned = self.tree.clone();
        for &id in self.stage.removals.values() {
            planned.remove(id)?;
        }
        let file_ids = match planned.leaf_file_ids(self.alphabet) {
            Ok(file_ids) => file_ids,
            Err(FileSetError::Capacity(_)) => return Ok(true),
            Err(e) => return Err(e),
        };
        Ok(file_ids.iter().any(|(id, file_id)| {
            let node = &self.tree[*id];
            let committed = node.instance().map_or(false, |i| !i.for_addition());
            committed && node.referenced_file_id() != Some(file_id.as_slice())
        }))
    }
}

/// `root` joined with every File ID component
pub(super) fn join_file_id<S: AsRef<str>>(root: &Path, components: &[S]) -> PathBuf {
    components
        .iter()
        .fold(root.to_path_buf(), |path, component| path.join(component.as_ref()))
}

/// Directory records linked through their offset fields
struct LinkedRecords {
    offsets: Vec<u64>,
    /// Taken as they are attached to the tree
    records: Vec<Option<Dataset>>,
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
    reachable: Vec<bool>,
}

impl LinkedRecords {
    fn link(first_root: u64, records: Vec<(u64, Dataset)>) -> Result<Self> {
        let (offsets, records): (Vec<u64>, Vec<Dataset>) = records.into_iter().unzip();
        let index: HashMap<u64, usize> = offsets
            .iter()
            .enumerate()
            .map(|(position, &offset)| (offset, position))
            .collect();

        let mut reachable = vec![false; records.len()];
        let mut children = vec![Vec::new(); records.len()];
        let roots = follow_level(first_root, &index, &records, &mut reachable)?;

        let mut queue: VecDeque<usize> = roots.iter().copied().collect();
        while let Some(parent) = queue.pop_front() {
            let lower = records[parent]
                .u32(tags::OFFSET_OF_LOWER_LEVEL_ENTITY)
                .unwrap_or(0) as u64;
            let level = follow_level(lower, &index, &records, &mut reachable)?;
            queue.extend(level.iter().copied());
            children[parent] = level;
        }

        Ok(Self {
            offsets,
            records: records.into_iter().map(Some).collect(),
            roots,
            children,
            reachable,
        })
    }

    fn orphan_count(&self) -> usize {
        self.reachable.iter().filter(|&&reached| !reached).count()
    }

    /// Build the tree from the reachable records
    ///
    /// Returns the tree and the orphans with their offsets.
    fn into_tree(mut self) -> Result<(RecordTree, Vec<(u64, Dataset)>)> {
        let mut tree = RecordTree::new();
        let mut queue: VecDeque<(Option<NodeId>, usize)> =
            self.roots.iter().map(|&root| (None, root)).collect();

        while let Some((parent, position)) = queue.pop_front() {
            let record = self.records[position].take().unwrap_or_default();
            let node = RecordNode::from_record(record, Some(self.offsets[position]))?;
            let id = tree.attach(parent, node);
            queue.extend(self.children[position].iter().map(|&child| (Some(id), child)));
        }

        let orphans = self
            .offsets
            .into_iter()
            .zip(self.records)
            .filter_map(|(offset, record)| record.map(|record| (offset, record)))
            .collect();
        Ok((tree, orphans))
    }
}

/// Follow next-sibling pointers from `start` and return the records passed
fn follow_level(
    start: u64,
    index: &HashMap<u64, usize>,
    records: &[Dataset],
    reachable: &mut [bool],
) -> Result<Vec<usize>> {
    let mut level = Vec::new();
    let mut offset = start;
    while offset != 0 {
        let position = *index.get(&offset).ok_or_else(|| {
            FileSetError::Structural(format!(
                "a directory record points to offset {} where no record starts",
                offset
            ))
        })?;
        if reachable[position] {
            return Err(FileSetError::Structural(format!(
                "the directory record at offset {} is referenced more than once",
                offset
            )));
        }
        reachable[position] = true;
        level.push(position);
        offset = records[position]
            .u32(tags::OFFSET_OF_NEXT_RECORD)
            .unwrap_or(0) as u64;
    }
    Ok(level)
}

