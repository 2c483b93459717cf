//! Writing and copying a File-set
//!
//! A write runs in a fixed order so that a failure leaves every managed
//! file readable somewhere:
//!
//! ```text
//! 1. usage and capacity checks       (nothing touched yet)
//! 2. plan File IDs on a copy of the tree without staged removals
//! 3. delete the files of staged removals
//! 4. pre-copy files a move would overwrite into the staging area
//! 5. copy staged files / move committed files to their File IDs
//! 6. write DICOMDIR, then load it back with orphans treated as errors
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codec::{create_meta, TransferSyntax};
use crate::dataset::{tags, uid, Dataset};
use crate::directory::{DirectoryWriter, WrittenDirectory, DICOMDIR};
use crate::error::{FileSetError, Result};
use crate::file_id::Alphabet;
use crate::tree::{NodeId, RecordTree};

use super::load::join_file_id;
use super::{FileSet, Instance, LoadOptions};

/// Options for [`FileSet::write_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Keep every committed file where it is; only the DICOMDIR is rewritten
    pub use_existing: bool,
    /// Encode the DICOMDIR as implicit VR little endian, which is not conformant
    pub force_implicit: bool,
}

impl WriteOptions {
    pub fn use_existing(mut self, use_existing: bool) -> Self {
        self.use_existing = use_existing;
        self
    }

    pub fn force_implicit(mut self, force_implicit: bool) -> Self {
        self.force_implicit = force_implicit;
        self
    }
}

/// Where one instance's bytes come from and go to
struct Relocation {
    node: NodeId,
    source: PathBuf,
    destination: PathBuf,
    /// Copy rather than move the source
    copy: bool,
}

impl FileSet {
    /// Write staged changes
    ///
    /// `path` is required for a File-set that has never been written and
    /// must be omitted (or unchanged) afterwards.
    pub fn write(&mut self, path: Option<&Path>) -> Result<()> {
        self.write_with(path, WriteOptions::default())
    }

    pub fn write_with(&mut self, path: Option<&Path>, options: WriteOptions) -> Result<()> {
        let root = self.resolve_root(path)?;
        if !self.is_staged() {
            debug!(path = %root.display(), "nothing staged, write skipped");
            return Ok(());
        }

        let additions = !self.stage.additions.is_empty();
        if options.use_existing && additions {
            return Err(FileSetError::Usage(
                "'write()' was called with 'use_existing' but additions to the File-set's managed instances are staged"
                    .to_string(),
            ));
        }

        let alphabet = Alphabet::for_count(self.len())?;
        let planned = self.without_removals()?;
        let file_ids = planned.leaf_file_ids(alphabet)?;

        fs::create_dir_all(&root)?;
        let root = fs::canonicalize(&root)?;
        self.path = Some(root.clone());

        let removed = self.delete_removals(&root)?;
        self.tree = planned;
        self.stage.removals.clear();

        let moving = file_ids.iter().any(|(id, file_id)| {
            let node = &self.tree[*id];
            node.instance().map_or(false, |i| !i.for_addition())
                && node.referenced_file_id() != Some(file_id.as_slice())
        });
        let major = additions || (!options.use_existing && moving);

        if major {
            self.alphabet = alphabet;
            let relocations = self.plan_relocations(&root, &file_ids)?;
            self.relocate(relocations)?;
            for (id, file_id) in file_ids {
                self.tree[id]
                    .record_mut()
                    .put(tags::REFERENCED_FILE_ID, file_id);
            }
        }

        let meta = self.directory_meta(options.force_implicit);
        let top = self.directory_dataset(false);
        let written = write_directory(
            &root.join(DICOMDIR),
            &meta,
            top,
            &mut self.tree,
            options.force_implicit,
        )?;

        self.load_from(
            &root,
            LoadOptions {
                include_orphans: true,
                raise_orphans: true,
            },
            false,
        )?;

        info!(
            path = %root.display(),
            instances = self.len(),
            removed,
            records = written.record_count,
            restructured = major,
            "File-set written"
        );
        Ok(())
    }

    /// Write the File-set with its staged changes to a new root
    ///
    /// This File-set, its files and its staging are left as they were.
    pub fn copy(&self, path: impl AsRef<Path>, force_implicit: bool) -> Result<FileSet> {
        let destination = path.as_ref();
        if let Some(current) = &self.path {
            if same_location(current, destination) {
                return Err(FileSetError::Usage(
                    "cannot copy the File-set as the 'path' is unchanged".to_string(),
                ));
            }
        }

        let alphabet = Alphabet::for_count(self.len())?;
        let mut tree = self.without_removals()?;
        let file_ids = tree.leaf_file_ids(alphabet)?;

        fs::create_dir_all(destination)?;
        let destination = fs::canonicalize(destination)?;
        for (id, file_id) in file_ids {
            let source = self.current_path(id)?;
            let target = join_file_id(&destination, &file_id);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &target)?;
            tree[id].record_mut().put(tags::REFERENCED_FILE_ID, file_id);
        }

        let meta = self.directory_meta(force_implicit);
        let top = self.directory_dataset(true);
        write_directory(
            &destination.join(DICOMDIR),
            &meta,
            top,
            &mut tree,
            force_implicit,
        )?;

        let mut copy = FileSet::with_config(self.config.clone())?.with_factory(self.factory.clone());
        copy.load_from(
            &destination,
            LoadOptions {
                include_orphans: true,
                raise_orphans: true,
            },
            false,
        )?;

        info!(
            from = ?self.path,
            to = %destination.display(),
            instances = copy.len(),
            "File-set copied"
        );
        Ok(copy)
    }

    fn resolve_root(&self, path: Option<&Path>) -> Result<PathBuf> {
        match (path, &self.path) {
            (None, None) => Err(FileSetError::Usage(
                "the File-set's 'path' must be set before it can be written".to_string(),
            )),
            (Some(path), Some(current)) if !same_location(current, path) => {
                Err(FileSetError::Usage(
                    "the path of an existing File-set cannot be changed, use 'copy()' to write it to a new location"
                        .to_string(),
                ))
            }
            (_, Some(current)) => Ok(current.clone()),
            (Some(path), None) => Ok(path.to_path_buf()),
        }
    }

    /// The record tree as it will be once staged removals are gone
    fn without_removals(&self) -> Result<RecordTree> {
        let mut tree = self.tree.clone();
        for &id in self.stage.removals.values() {
            tree.remove(id)?;
        }
        Ok(tree)
    }

    /// Where the bytes of the instance at `id` are right now
    fn current_path(&self, id: NodeId) -> Result<PathBuf> {
        let instance = Instance::new(self, id);
        instance.path().ok_or_else(|| {
            FileSetError::Structural(format!(
                "the SOP Instance '{}' has no file to write",
                instance.sop_instance_uid()
            ))
        })
    }

    /// Delete the files of staged removals; returns how many were staged
    fn delete_removals(&self, root: &Path) -> Result<usize> {
        for &id in self.stage.removals.values() {
            if let Some(components) = self.tree[id].referenced_file_id() {
                let path = join_file_id(root, components);
                match fs::remove_file(&path) {
                    Ok(()) => debug!(path = %path.display(), "removed"),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(self.stage.removals.len())
    }

    /// Decide how each instance reaches its File ID
    ///
    /// A committed file whose current path is another instance's new path
    /// would be overwritten before it is read, so it is copied into the
    /// staging area first and placed from there.
    fn plan_relocations(
        &self,
        root: &Path,
        file_ids: &[(NodeId, Vec<String>)],
    ) -> Result<Vec<Relocation>> {
        let mut relocations = file_ids
            .iter()
            .map(|(id, file_id)| {
                Ok(Relocation {
                    node: *id,
                    source: self.current_path(*id)?,
                    destination: join_file_id(root, file_id),
                    copy: Instance::new(self, *id).for_addition(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let destinations: HashMap<PathBuf, NodeId> = relocations
            .iter()
            .map(|relocation| (relocation.destination.clone(), relocation.node))
            .collect();

        for (index, relocation) in relocations.iter_mut().filter(|r| !r.copy).enumerate() {
            let overwritten = destinations
                .get(&relocation.source)
                .map_or(false, |&other| other != relocation.node);
            if !overwritten {
                continue;
            }

            let uid = Instance::new(self, relocation.node).sop_instance_uid();
            let staged = self.stage.relocation_path(index);
            fs::copy(&relocation.source, &staged)?;
            verify_copy(&relocation.source, &staged)?;
            debug!(
                sop_instance_uid = uid,
                from = %relocation.source.display(),
                "pre-copied into the staging area"
            );
            relocation.source = staged;
            relocation.copy = true;
        }
        Ok(relocations)
    }

    fn relocate(&self, relocations: Vec<Relocation>) -> Result<()> {
        for relocation in relocations {
            if relocation.source == relocation.destination {
                continue;
            }
            if let Some(parent) = relocation.destination.parent() {
                fs::create_dir_all(parent)?;
            }
            if relocation.copy {
                fs::copy(&relocation.source, &relocation.destination)?;
            } else {
                fs::rename(&relocation.source, &relocation.destination)?;
            }
            debug!(
                from = %relocation.source.display(),
                to = %relocation.destination.display(),
                copy = relocation.copy,
                "placed"
            );
        }
        Ok(())
    }

    /// File meta group for the DICOMDIR
    fn directory_meta(&self, force_implicit: bool) -> Dataset {
        create_meta(
            uid::MEDIA_STORAGE_DIRECTORY_STORAGE,
            &self.uid,
            directory_syntax(force_implicit),
            &self.config.implementation_class_uid,
            &self.config.implementation_version_name,
        )
    }

    /// Top-level DICOMDIR elements, without the records
    ///
    /// `fresh` leaves out elements carried over from a loaded DICOMDIR.
    fn directory_dataset(&self, fresh: bool) -> Dataset {
        let mut top = if fresh {
            Dataset::new()
        } else {
            self.extra_elements.clone()
        };
        top.put(tags::FILE_SET_ID, self.id.as_deref().unwrap_or_default());
        if let Some(file_id) = &self.descriptor_file_id {
            top.put(tags::FILE_SET_DESCRIPTOR_FILE_ID, file_id.clone());
        }
        if let Some(charset) = &self.descriptor_character_set {
            top.put(
                tags::SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE,
                charset.as_str(),
            );
        }
        top.put(tags::FILE_SET_CONSISTENCY_FLAG, 0u16);
        top
    }
}

fn directory_syntax(force_implicit: bool) -> TransferSyntax {
    if force_implicit {
        TransferSyntax::ImplicitVrLittleEndian
    } else {
        TransferSyntax::ExplicitVrLittleEndian
    }
}

fn write_directory(
    path: &Path,
    meta: &Dataset,
    top: Dataset,
    tree: &mut RecordTree,
    force_implicit: bool,
) -> Result<WrittenDirectory> {
    let mut writer = DirectoryWriter::new(path, directory_syntax(force_implicit))?;
    writer.write_meta(meta)?;
    writer.write_dataset(top, tree)?;
    writer.finish()
}

/// Compare the CRC32 of a file and its copy
fn verify_copy(source: &Path, copy: &Path) -> Result<()> {
    let expected = crc32fast::hash(&fs::read(source)?);
    let actual = crc32fast::hash(&fs::read(copy)?);
    if expected != actual {
        return Err(FileSetError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "staged copy of '{}' is corrupt: crc {:08x} != {:08x}",
                source.display(),
                actual,
                expected
            ),
        )));
    }
    Ok(())
}

/// Whether two paths name the same directory
fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
