//! Tests for the record tree
//!
//! These tests verify:
//! - Chain splicing with branch reuse by key
//! - Cascading removal of empty branches
//! - Sibling, ancestor and depth navigation
//! - Pre-order traversal
//! - File ID components derived from tree position

use fileset::dataset::{tags, Dataset};
use fileset::file_id::Alphabet;
use fileset::records::RecordType;
use fileset::tree::{RecordChain, RecordNode, RecordTree};
use fileset::FileSetError;

// =============================================================================
// Helper Functions
// =============================================================================

fn record(record_type: &str, key_tag: fileset::dataset::Tag, key: &str) -> Dataset {
    let mut ds = Dataset::new();
    ds.put(tags::DIRECTORY_RECORD_TYPE, record_type);
    ds.put(key_tag, key);
    ds
}

/// PATIENT / STUDY / SERIES / IMAGE chain
fn chain(patient: &str, study: &str, series: &str, instance: &str) -> RecordChain {
    RecordChain::from_records(vec![
        record("PATIENT", tags::PATIENT_ID, patient),
        record("STUDY", tags::STUDY_INSTANCE_UID, study),
        record("SERIES", tags::SERIES_INSTANCE_UID, series),
        record("IMAGE", tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE, instance),
    ])
    .unwrap()
}

// =============================================================================
// RecordNode Tests
// =============================================================================

#[test]
fn test_node_key_from_record_type() {
    let node = RecordNode::new(record("PATIENT", tags::PATIENT_ID, "P1")).unwrap();
    assert_eq!(node.key(), "P1");
    assert_eq!(*node.record_type(), RecordType::Patient);
    assert_eq!(node.record().u16(tags::RECORD_IN_USE_FLAG), Some(0xFFFF));
    assert_eq!(node.record().u32(tags::OFFSET_OF_NEXT_RECORD), Some(0));
}

#[test]
fn test_study_key_falls_back_to_referenced_instance() {
    let node = RecordNode::new(record(
        "STUDY",
        tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE,
        "1.2.3",
    ))
    .unwrap();
    assert_eq!(node.key(), "1.2.3");
}

#[test]
fn test_node_without_type_is_rejected() {
    let mut ds = Dataset::new();
    ds.put(tags::PATIENT_ID, "P1");
    assert!(matches!(
        RecordNode::new(ds),
        Err(FileSetError::Validation(_))
    ));
}

#[test]
fn test_node_without_key_is_rejected() {
    let mut ds = Dataset::new();
    ds.put(tags::DIRECTORY_RECORD_TYPE, "SERIES");
    assert!(matches!(
        RecordNode::new(ds),
        Err(FileSetError::Validation(_))
    ));
}

#[test]
fn test_unknown_record_type_is_kept() {
    let node = RecordNode::new(record(
        "TOPIC",
        tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE,
        "1.2.3",
    ))
    .unwrap();
    assert_eq!(*node.record_type(), RecordType::Other("TOPIC".to_string()));
    assert_eq!(node.record_type().prefix_at(2), "P2");
}

// =============================================================================
// Add Tests
// =============================================================================

#[test]
fn test_add_builds_four_levels() {
    let mut tree = RecordTree::new();
    let leaf = tree.add(chain("P1", "S1", "SE1", "I1"));

    assert_eq!(tree.len(), 4);
    assert_eq!(tree.depth(leaf), 3);
    assert_eq!(tree.roots().len(), 1);
}

#[test]
fn test_add_reuses_matching_branches() {
    let mut tree = RecordTree::new();
    let first = tree.add(chain("P1", "S1", "SE1", "I1"));
    let second = tree.add(chain("P1", "S1", "SE1", "I2"));

    assert_eq!(tree.len(), 5);
    assert_eq!(tree[first].parent(), tree[second].parent());
    assert_eq!(tree.index(first), 0);
    assert_eq!(tree.index(second), 1);
}

#[test]
fn test_add_diverges_below_first_mismatch() {
    let mut tree = RecordTree::new();
    tree.add(chain("P1", "S1", "SE1", "I1"));
    // Same series UID under a different study is a new series node
    tree.add(chain("P1", "S2", "SE1", "I2"));

    let patient = tree.roots()[0];
    assert_eq!(tree[patient].children().len(), 2);
    assert_eq!(tree.len(), 7);
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_cascades_to_empty_ancestors() {
    let mut tree = RecordTree::new();
    let leaf = tree.add(chain("P1", "S1", "SE1", "I1"));

    tree.remove(leaf).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
}

#[test]
fn test_remove_keeps_shared_ancestors() {
    let mut tree = RecordTree::new();
    let first = tree.add(chain("P1", "S1", "SE1", "I1"));
    let second = tree.add(chain("P1", "S1", "SE1", "I2"));

    tree.remove(first).unwrap();
    assert_eq!(tree.len(), 4);
    assert!(!tree.contains(first));
    assert_eq!(tree.index(second), 0);
}

#[test]
fn test_remove_branch_is_rejected() {
    let mut tree = RecordTree::new();
    let leaf = tree.add(chain("P1", "S1", "SE1", "I1"));
    let series = tree[leaf].parent().unwrap();

    let result = tree.remove(series);
    assert!(matches!(result, Err(FileSetError::Structural(_))));
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_remove_stale_id() {
    let mut tree = RecordTree::new();
    let leaf = tree.add(chain("P1", "S1", "SE1", "I1"));
    tree.remove(leaf).unwrap();

    assert!(tree.remove(leaf).is_err());
}

// =============================================================================
// Navigation Tests
// =============================================================================

#[test]
fn test_siblings_and_neighbours() {
    let mut tree = RecordTree::new();
    let a = tree.add(chain("P1", "S1", "SE1", "I1"));
    let b = tree.add(chain("P1", "S1", "SE1", "I2"));
    let c = tree.add(chain("P1", "S1", "SE1", "I3"));

    assert_eq!(tree.siblings(b), &[a, b, c]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.next_sibling(c), None);
    assert_eq!(tree.previous_sibling(b), Some(a));
    assert_eq!(tree.previous_sibling(a), None);
}

#[test]
fn test_ancestors_nearest_first() {
    let mut tree = RecordTree::new();
    let leaf = tree.add(chain("P1", "S1", "SE1", "I1"));

    let types: Vec<String> = tree
        .ancestors(leaf)
        .map(|id| tree[id].record_type().to_string())
        .collect();
    assert_eq!(types, vec!["SERIES", "STUDY", "PATIENT"]);
    assert_eq!(tree.top(leaf), tree.roots()[0]);
    assert_eq!(tree.reverse(leaf).count(), 4);
}

#[test]
fn test_pre_order_traversal() {
    let mut tree = RecordTree::new();
    tree.add(chain("P1", "S1", "SE1", "I1"));
    tree.add(chain("P2", "S2", "SE2", "I2"));

    let keys: Vec<&str> = tree.iter().map(|id| tree[id].key()).collect();
    assert_eq!(keys, vec!["P1", "S1", "SE1", "I1", "P2", "S2", "SE2", "I2"]);
}

// =============================================================================
// File ID Tests
// =============================================================================

#[test]
fn test_file_id_from_position() {
    let mut tree = RecordTree::new();
    tree.add(chain("P1", "S1", "SE1", "I1"));
    let leaf = tree.add(chain("P1", "S1", "SE1", "I2"));

    assert_eq!(
        tree.file_id(leaf, Alphabet::Numeric).unwrap(),
        vec!["PT000000", "ST000000", "SE000000", "IM000001"]
    );
}

#[test]
fn test_file_ids_follow_removal() {
    let mut tree = RecordTree::new();
    let first = tree.add(chain("P1", "S1", "SE1", "I1"));
    let second = tree.add(chain("P1", "S1", "SE1", "I2"));

    tree.remove(first).unwrap();
    assert_eq!(
        tree.file_id(second, Alphabet::Numeric).unwrap().last().unwrap(),
        "IM000000"
    );
}

#[test]
fn test_leaf_file_ids_only_for_instances() {
    // Nodes built directly carry no instance
    let mut tree = RecordTree::new();
    tree.add(chain("P1", "S1", "SE1", "I1"));
    assert!(tree.leaf_file_ids(Alphabet::Numeric).unwrap().is_empty());
    assert_eq!(tree.leaves().count(), 0);
}

#[test]
fn test_alphanumeric_components() {
    let mut tree = RecordTree::new();
    let mut last = None;
    for i in 0..11 {
        last = Some(tree.add(chain("P1", "S1", "SE1", &format!("I{}", i))));
    }

    let component = tree.component(last.unwrap(), Alphabet::Alphanumeric).unwrap();
    assert_eq!(component, "IM00000A");
    let component = tree.component(last.unwrap(), Alphabet::Numeric).unwrap();
    assert_eq!(component, "IM000010");
}

#[test]
fn test_private_record_prefix_uses_depth() {
    let mut tree = RecordTree::new();
    let chain = RecordChain::from_records(vec![
        record("PATIENT", tags::PATIENT_ID, "P1"),
        record("PRIVATE", tags::PRIVATE_RECORD_UID, "1.2.3.4"),
    ])
    .unwrap();
    let leaf = tree.add(chain);

    assert_eq!(
        tree.file_id(leaf, Alphabet::Numeric).unwrap(),
        vec!["PT000000", "P1000000"]
    );
}
