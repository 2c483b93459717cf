//! Tests for loading an existing File-set
//!
//! These tests verify:
//! - Opening by directory or by DICOMDIR path
//! - Orphaned records: adopted, skipped or rejected
//! - Broken record links are structural errors
//! - Records whose file is missing are dropped with a warning
//! - Non-conformant DICOMDIR encodings are normalised on the next write
//! - Implicit VR records decode with dictionary VRs and stay searchable
//! - Big endian DICOMDIRs keep their values through normalisation
//! - Unmanaged top-level elements survive a rewrite
//! - Layout drift left by `use_existing` is detected

#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::path::Path;

use fileset::codec::TransferSyntax;
use fileset::dataset::{tags, uid, Dataset, Value, Vr};
use fileset::directory::{DirectoryFile, DirectoryWriter};
use fileset::tree::{RecordChain, RecordTree};
use fileset::records::{standard_record, RecordFactory, RecordType};
use fileset::{Config, FileSet, FileSetError, LoadOptions, WriteOptions};
use tracing_test::traced_test;

// =============================================================================
// Helper Functions
// =============================================================================

/// Offsets of the IMAGE records, in file order
fn image_offsets(root: &Path) -> Vec<u64> {
    DirectoryFile::open(root.join("DICOMDIR"))
        .unwrap()
        .records
        .into_iter()
        .filter(|(_, record)| record.string(tags::DIRECTORY_RECORD_TYPE) == Some("IMAGE"))
        .map(|(offset, _)| offset)
        .collect()
}

/// A written two-image File-set whose second image is unreachable
fn fileset_with_orphan() -> common::Workspace {
    let (workspace, fs) = common::written_fileset(2);
    fs.close().unwrap();

    let root = workspace.root();
    let images = image_offsets(&root);
    common::patch_next_pointer(&root.join("DICOMDIR"), images[0], 0);
    workspace
}

fn leaf_path(root: &Path, image: &str) -> std::path::PathBuf {
    root.join("PT000000")
        .join("ST000000")
        .join("SE000000")
        .join(image)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_by_directory_or_file() {
    let (workspace, fs) = common::written_fileset(2);
    let uid = fs.uid().to_string();
    let root = fs.path().unwrap().to_path_buf();

    let by_dir = FileSet::open(workspace.root()).unwrap();
    let by_file = FileSet::open(workspace.root().join("DICOMDIR")).unwrap();

    for loaded in [&by_dir, &by_file] {
        assert_eq!(loaded.path(), Some(root.as_path()));
        assert_eq!(loaded.uid(), uid);
        assert_eq!(loaded.len(), 2);
        assert!(!loaded.is_staged());
    }
}

#[test]
fn test_open_missing_dicomdir() {
    let workspace = common::Workspace::new();
    fs::create_dir_all(workspace.root()).unwrap();
    assert!(matches!(
        FileSet::open(workspace.root()),
        Err(FileSetError::Io(_))
    ));
}

#[test]
fn test_open_rejects_plain_instance() {
    let workspace = common::Workspace::new();
    let path = common::write_ct(&workspace.sources(), 1, 1, 1, 0);
    assert!(matches!(
        FileSet::open(&path),
        Err(FileSetError::Validation(_))
    ));
}

#[test]
fn test_load_report_counts() {
    let (workspace, _fs) = common::written_fileset(3);
    let mut loaded = workspace.fileset();

    let report = loaded.load(workspace.root()).unwrap();
    assert_eq!(report.instances, 3);
    assert_eq!(report.orphans_adopted, 0);
    assert_eq!(report.missing_files, 0);
    assert!(!report.transfer_syntax_normalised);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_load_replaces_contents() {
    let (workspace, _fs) = common::written_fileset(2);
    let mut other = workspace.fileset();
    other
        .add(common::write_ct(&workspace.sources(), 5, 1, 1, 0))
        .unwrap();

    other.load(workspace.root()).unwrap();
    assert_eq!(other.len(), 2);
    assert!(other.instance(&common::instance_uid(5, 1, 1, 0)).is_none());
    assert!(!other.is_staged());
}

#[test]
fn test_loaded_instances_resolve_records() {
    let (workspace, _fs) = common::written_fileset(2);
    let loaded = FileSet::open(workspace.root()).unwrap();

    let instance = loaded
        .instance(&common::instance_uid(1, 1, 1, 1))
        .unwrap();
    assert!(!instance.is_staged());
    assert_eq!(
        instance.referenced_file_id().unwrap(),
        ["PT000000", "ST000000", "SE000000", "IM000001"]
    );
    assert_eq!(instance.value(tags::PATIENT_ID), Some(&Value::from("PAT1")));
    assert_eq!(
        instance.value(tags::SOP_CLASS_UID),
        Some(&Value::from(uid::CT_IMAGE_STORAGE))
    );
    let file = instance.load().unwrap();
    assert_eq!(file.dataset.string(tags::INSTANCE_NUMBER), Some("1"));
}

// =============================================================================
// Orphan Tests
// =============================================================================

#[test]
#[traced_test]
fn test_orphan_adopted_by_default() {
    let workspace = fileset_with_orphan();
    let mut loaded = workspace.fileset();

    let report = loaded.load(workspace.root()).unwrap();
    assert_eq!(report.orphans_adopted, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(loaded.len(), 2);
    assert!(logs_contain("orphaned directory record"));

    let uid = common::instance_uid(1, 1, 1, 1);
    let instance = loaded.instance(&uid).unwrap();
    assert!(instance.for_addition());
    assert_eq!(
        instance.referenced_file_id().unwrap(),
        ["PT000000", "ST000000", "SE000000", "IM000001"]
    );
    // Adopted under the existing branches
    assert_eq!(loaded.tree().len(), 5);

    let found = loaded
        .find(&[(tags::SOP_INSTANCE_UID, Value::from(uid.as_str()))], false)
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_orphan_adoption_survives_write() {
    let workspace = fileset_with_orphan();
    let mut loaded = workspace.fileset();
    loaded.load(workspace.root()).unwrap();

    loaded.write(None).unwrap();
    assert!(!loaded.is_staged());

    let report = workspace.fileset().load(workspace.root()).unwrap();
    assert_eq!(report.instances, 2);
    assert_eq!(report.orphans_adopted, 0);
    assert_eq!(
        common::managed_files(&workspace.root()),
        vec![
            "PT000000/ST000000/SE000000/IM000000",
            "PT000000/ST000000/SE000000/IM000001"
        ]
    );
}

#[test]
fn test_orphans_raise() {
    let workspace = fileset_with_orphan();
    let mut loaded = workspace.fileset();
    loaded
        .add(common::write_ct(&workspace.sources(), 9, 1, 1, 0))
        .unwrap();

    let options = LoadOptions {
        include_orphans: true,
        raise_orphans: true,
    };
    let result = loaded.load_with(workspace.root(), options);
    assert!(matches!(result, Err(FileSetError::Structural(_))));

    // The failed load left the File-set alone
    assert_eq!(loaded.len(), 1);
    assert!(loaded.path().is_none());
}

#[test]
fn test_orphans_excluded() {
    let workspace = fileset_with_orphan();
    let mut loaded = workspace.fileset();

    let options = LoadOptions {
        include_orphans: false,
        raise_orphans: false,
    };
    let report = loaded.load_with(workspace.root(), options).unwrap();
    assert_eq!(report.orphans_skipped, 1);
    assert_eq!(report.orphans_adopted, 0);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(loaded.len(), 1);
    assert!(loaded.instance(&common::instance_uid(1, 1, 1, 1)).is_none());
}

// =============================================================================
// Structural Error Tests
// =============================================================================

#[test]
fn test_pointer_to_nowhere() {
    let (workspace, fs) = common::written_fileset(2);
    fs.close().unwrap();
    let root = workspace.root();
    let images = image_offsets(&root);
    common::patch_next_pointer(&root.join("DICOMDIR"), images[0], 12345);

    assert!(matches!(
        FileSet::open(&root),
        Err(FileSetError::Structural(_))
    ));
}

#[test]
fn test_pointer_cycle() {
    let (workspace, fs) = common::written_fileset(2);
    fs.close().unwrap();
    let root = workspace.root();
    let images = image_offsets(&root);
    // Second image points back at the first
    common::patch_next_pointer(&root.join("DICOMDIR"), images[1], images[0] as u32);

    assert!(matches!(
        FileSet::open(&root),
        Err(FileSetError::Structural(_))
    ));
}

// =============================================================================
// Missing File Tests
// =============================================================================

#[test]
#[traced_test]
fn test_missing_file_is_dropped() {
    let (workspace, fs) = common::written_fileset(2);
    fs.close().unwrap();
    let root = workspace.root();
    fs::remove_file(leaf_path(&root, "IM000000")).unwrap();

    let mut loaded = workspace.fileset();
    let report = loaded.load(&root).unwrap();

    assert_eq!(report.missing_files, 1);
    assert_eq!(report.instances, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(logs_contain("does not exist"));
    assert!(loaded.instance(&common::instance_uid(1, 1, 1, 0)).is_none());
    assert!(loaded.is_staged());

    // The survivor moves into the freed File ID
    let survivor = loaded.instance(&common::instance_uid(1, 1, 1, 1)).unwrap();
    assert!(survivor.for_moving());
    loaded.write(None).unwrap();
    assert_eq!(
        common::managed_files(&root),
        vec!["PT000000/ST000000/SE000000/IM000000"]
    );
    assert!(!loaded.is_staged());
}

#[test]
fn test_all_files_missing_empties_tree() {
    let (workspace, fs) = common::written_fileset(1);
    fs.close().unwrap();
    let root = workspace.root();
    fs::remove_file(leaf_path(&root, "IM000000")).unwrap();

    let loaded = FileSet::open(&root).unwrap();
    assert!(loaded.is_empty());
    assert!(loaded.tree().is_empty());
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_implicit_dicomdir_is_normalised() {
    let (workspace, mut fs) = common::written_fileset(2);
    fs.set_id(Some("IMPLICIT")).unwrap();
    fs.write_with(None, WriteOptions::default().force_implicit(true))
        .unwrap();

    let root = workspace.root();
    let file = DirectoryFile::open(root.join("DICOMDIR")).unwrap();
    assert_eq!(file.transfer_syntax, TransferSyntax::ImplicitVrLittleEndian);
    // The reload after writing already flags the encoding
    assert!(fs.is_staged());

    let mut loaded = workspace.fileset();
    let report = loaded.load(&root).unwrap();
    assert!(report.transfer_syntax_normalised);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.id(), Some("IMPLICIT"));

    loaded.write(None).unwrap();
    let file = DirectoryFile::open(root.join("DICOMDIR")).unwrap();
    assert_eq!(file.transfer_syntax, TransferSyntax::ExplicitVrLittleEndian);
    assert!(!loaded.is_staged());
}

#[test]
fn test_implicit_dicomdir_decodes_dictionary_vrs() {
    let workspace = common::Workspace::new();
    let factory = RecordFactory::new().with_builder(RecordType::Patient, |ds: &Dataset| {
        let mut record = standard_record(&RecordType::Patient, ds)?;
        record.put(tags::PATIENT_BIRTH_DATE, "19800101");
        Ok(record)
    });
    let mut fs = workspace.fileset().with_factory(factory);
    for path in common::write_series(&workspace.sources(), 1, 2) {
        fs.add(&path).unwrap();
    }
    fs.write(Some(workspace.root().as_path())).unwrap();

    let destination = workspace.temp.path().join("implicit");
    let copy = fs.copy(&destination, true).unwrap();
    let file = DirectoryFile::open(destination.join("DICOMDIR")).unwrap();
    assert_eq!(file.transfer_syntax, TransferSyntax::ImplicitVrLittleEndian);

    for instance in copy.instances() {
        let birth_date = instance.get(tags::PATIENT_BIRTH_DATE).unwrap();
        assert_eq!(birth_date.vr, Vr::DA);
        assert_eq!(birth_date.value, Value::from("19800101"));
        assert_eq!(instance.get(tags::STUDY_DATE).unwrap().vr, Vr::DA);
        assert_eq!(instance.get(tags::PATIENT_NAME).unwrap().vr, Vr::PN);
    }
    let matches = copy
        .find(&[(tags::PATIENT_BIRTH_DATE, Value::from("19800101"))], false)
        .unwrap();
    assert_eq!(matches.len(), 2);
}

#[test]
fn test_big_endian_dicomdir_is_normalised() {
    let (workspace, mut fs) = common::written_fileset(2);
    fs.set_id(Some("BIGENDIAN")).unwrap();
    fs.write(None).unwrap();
    fs.close().unwrap();

    let root = workspace.root();
    let dicomdir = root.join("DICOMDIR");
    let before = DirectoryFile::open(&dicomdir).unwrap();
    common::convert_to_big_endian(&dicomdir);
    let file = DirectoryFile::open(&dicomdir).unwrap();
    assert_eq!(file.transfer_syntax, TransferSyntax::ExplicitVrBigEndian);
    assert_eq!(file.records, before.records);

    let mut loaded = workspace.fileset();
    let report = loaded.load(&root).unwrap();
    assert!(report.transfer_syntax_normalised);
    assert!(loaded.is_staged());
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.id(), Some("BIGENDIAN"));

    loaded.write(None).unwrap();
    let file = DirectoryFile::open(&dicomdir).unwrap();
    assert_eq!(file.transfer_syntax, TransferSyntax::ExplicitVrLittleEndian);
    assert_eq!(file.records.len(), before.records.len());

    let mut reopened = workspace.fileset();
    let report = reopened.load(&root).unwrap();
    assert!(!report.transfer_syntax_normalised);
    assert_eq!(reopened.id(), Some("BIGENDIAN"));
    for index in 0..2 {
        let uid = common::instance_uid(1, 1, 1, index);
        let instance = reopened.instance(&uid).unwrap();
        assert_eq!(instance.value(tags::PATIENT_ID), Some(&Value::from("PAT1")));
        assert_eq!(
            instance.value(tags::INSTANCE_NUMBER),
            Some(&Value::from(index.to_string()))
        );
        assert!(instance.path().unwrap().exists());
    }
}

#[test]
fn test_strict_encoding_rejects_implicit() {
    let (workspace, mut fs) = common::written_fileset(1);
    fs.set_id(Some("IMPLICIT")).unwrap();
    fs.write_with(None, WriteOptions::default().force_implicit(true))
        .unwrap();

    let config = Config::builder()
        .staging_dir(workspace.temp.path().join("staging"))
        .strict_encoding(true)
        .build();
    let mut strict = FileSet::with_config(config).unwrap();
    let result = strict.load(workspace.root());
    assert!(matches!(result, Err(FileSetError::Encoding(_))));
}

// =============================================================================
// Top-level Element Tests
// =============================================================================

#[test]
fn test_unmanaged_elements_preserved() {
    let (workspace, fs) = common::written_fileset(2);
    fs.close().unwrap();
    let dicomdir = workspace.root().join("DICOMDIR");

    // Rewrite the DICOMDIR with an extra element after the records
    let existing = DirectoryFile::open(&dicomdir).unwrap();
    let records: Vec<Dataset> = existing.record_datasets().cloned().collect();
    let mut tree = RecordTree::new();
    for image in &records[3..] {
        let mut chain = records[..3].to_vec();
        chain.push(image.clone());
        tree.add(RecordChain::from_records(chain).unwrap());
    }
    let mut top = existing.dataset.clone();
    top.put(tags::SPECIFIC_CHARACTER_SET, "ISO_IR 100");

    let mut writer = DirectoryWriter::new(&dicomdir, existing.transfer_syntax).unwrap();
    writer.write_meta(&existing.meta).unwrap();
    writer.write_dataset(top, &mut tree).unwrap();
    writer.finish().unwrap();

    let mut loaded = FileSet::open(workspace.root()).unwrap();
    assert_eq!(loaded.len(), 2);
    loaded.set_id(Some("KEPT")).unwrap();
    loaded.write(None).unwrap();

    let rewritten = DirectoryFile::open(&dicomdir).unwrap();
    assert_eq!(rewritten.dataset.string(tags::FILE_SET_ID), Some("KEPT"));
    assert_eq!(
        rewritten.dataset.string(tags::SPECIFIC_CHARACTER_SET),
        Some("ISO_IR 100")
    );
}

#[test]
fn test_metadata_round_trip() {
    let (workspace, mut fs) = common::written_fileset(1);
    fs.set_id(Some("STUDYSET")).unwrap();
    fs.set_descriptor_file_id(Some(vec!["README".to_string()]))
        .unwrap();
    fs.set_descriptor_character_set(Some("ISO_IR 100")).unwrap();
    fs.set_uid("1.2.826.0.1.3680043.8.498.1000").unwrap();
    fs.write(None).unwrap();

    let loaded = FileSet::open(workspace.root()).unwrap();
    assert_eq!(loaded.id(), Some("STUDYSET"));
    assert_eq!(loaded.uid(), "1.2.826.0.1.3680043.8.498.1000");
    assert_eq!(
        loaded.descriptor_file_id(),
        Some(&["README".to_string()][..])
    );
    assert_eq!(loaded.descriptor_character_set(), Some("ISO_IR 100"));
}

// =============================================================================
// Restructure Tests
// =============================================================================

#[test]
fn test_layout_drift_after_use_existing() {
    let (workspace, mut fs) = common::written_fileset(3);
    let root = workspace.root();

    fs.remove(&common::instance_uid(1, 1, 1, 0)).unwrap();
    fs.write_with(None, WriteOptions::default().use_existing(true))
        .unwrap();

    // Files stay where they were
    assert_eq!(
        common::managed_files(&root),
        vec![
            "PT000000/ST000000/SE000000/IM000001",
            "PT000000/ST000000/SE000000/IM000002"
        ]
    );
    assert!(fs.is_staged());
    assert!(fs.instances().all(|instance| instance.for_moving()));
    assert!(fs.to_string().contains("directory structure update"));

    // A fresh load sees the same drift
    let reloaded = FileSet::open(&root).unwrap();
    assert!(reloaded.is_staged());

    fs.write(None).unwrap();
    assert_eq!(
        common::managed_files(&root),
        vec![
            "PT000000/ST000000/SE000000/IM000000",
            "PT000000/ST000000/SE000000/IM000001"
        ]
    );
    assert!(!fs.is_staged());
    let moved = fs.instance(&common::instance_uid(1, 1, 1, 2)).unwrap();
    assert_eq!(
        moved.referenced_file_id().unwrap(),
        ["PT000000", "ST000000", "SE000000", "IM000001"]
    );
}
