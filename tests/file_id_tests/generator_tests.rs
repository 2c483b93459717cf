//! Tests for File ID generation
//!
//! These tests verify:
//! - Component layout (prefix + zero padded index)
//! - Numeric and alphanumeric alphabets
//! - Capacity limits and the switch between alphabets
//! - Conformance and safety checks on stored components

use std::collections::HashSet;

use fileset::file_id::{
    component, is_conformant_component, is_conformant_file_id, is_safe_component, Alphabet,
    FileIdGenerator, MAX_COMPONENT_LEN,
};
use fileset::FileSetError;

// =============================================================================
// Component Tests
// =============================================================================

#[test]
fn test_component_zero_padded() {
    assert_eq!(component("PT", 0, Alphabet::Numeric).unwrap(), "PT000000");
    assert_eq!(component("IM", 42, Alphabet::Numeric).unwrap(), "IM000042");
    assert_eq!(component("P3", 7, Alphabet::Numeric).unwrap(), "P3000007");
}

#[test]
fn test_component_always_eight_characters() {
    for prefix in ["A", "IM", "ABC", "ABCDEFG"] {
        let c = component(prefix, 0, Alphabet::Numeric).unwrap();
        assert_eq!(c.len(), MAX_COMPONENT_LEN);
        assert!(c.starts_with(prefix));
    }
}

#[test]
fn test_component_alphanumeric_digits() {
    assert_eq!(component("IM", 9, Alphabet::Alphanumeric).unwrap(), "IM000009");
    assert_eq!(component("IM", 10, Alphabet::Alphanumeric).unwrap(), "IM00000A");
    assert_eq!(component("IM", 35, Alphabet::Alphanumeric).unwrap(), "IM00000Z");
    assert_eq!(component("IM", 36, Alphabet::Alphanumeric).unwrap(), "IM000010");
}

#[test]
fn test_component_prefix_too_long() {
    let result = component("ABCDEFGH", 0, Alphabet::Numeric);
    assert!(matches!(result, Err(FileSetError::Validation(_))));
}

#[test]
fn test_component_index_out_of_range() {
    assert_eq!(component("IM", 999_999, Alphabet::Numeric).unwrap(), "IM999999");
    let result = component("IM", 1_000_000, Alphabet::Numeric);
    assert!(matches!(result, Err(FileSetError::Capacity(_))));
}

// =============================================================================
// Alphabet Tests
// =============================================================================

#[test]
fn test_alphabet_capacity() {
    assert_eq!(Alphabet::Numeric.capacity(2), 1_000_000);
    assert_eq!(Alphabet::Alphanumeric.capacity(2), 2_176_782_336);
    assert_eq!(Alphabet::Numeric.capacity(7), 10);
}

#[test]
fn test_alphabet_for_count_boundary() {
    assert_eq!(Alphabet::for_count(0).unwrap(), Alphabet::Numeric);
    assert_eq!(Alphabet::for_count(1_000_000).unwrap(), Alphabet::Numeric);
    assert_eq!(
        Alphabet::for_count(1_000_001).unwrap(),
        Alphabet::Alphanumeric
    );
    assert_eq!(
        Alphabet::for_count(2_176_782_336).unwrap(),
        Alphabet::Alphanumeric
    );
}

#[test]
fn test_alphabet_ceiling_is_capacity_error() {
    let result = Alphabet::for_count(2_176_782_337);
    assert!(matches!(result, Err(FileSetError::Capacity(_))));
}

#[test]
fn test_alphanumeric_continues_past_numeric_without_collision() {
    // The last numeric IDs and the first alphanumeric IDs beyond them
    let numeric: HashSet<String> = FileIdGenerator::new("IM", Alphabet::Numeric)
        .unwrap()
        .starting_at(999_990)
        .collect();
    let alphanumeric: Vec<String> = FileIdGenerator::new("IM", Alphabet::Alphanumeric)
        .unwrap()
        .starting_at(1_000_000)
        .take(100)
        .collect();

    assert_eq!(numeric.len(), 10);
    for id in &alphanumeric {
        assert!(is_conformant_component(id));
        assert!(!numeric.contains(id), "{} collides", id);
    }
}

// =============================================================================
// Generator Tests
// =============================================================================

#[test]
fn test_generator_sequence() {
    let ids: Vec<String> = FileIdGenerator::new("SE", Alphabet::Numeric)
        .unwrap()
        .take(3)
        .collect();
    assert_eq!(ids, vec!["SE000000", "SE000001", "SE000002"]);
}

#[test]
fn test_generator_stops_when_exhausted() {
    let generator = FileIdGenerator::new("ABCDEF", Alphabet::Numeric).unwrap();
    assert_eq!(generator.size_hint(), (100, Some(100)));

    let ids: Vec<String> = generator.collect();
    assert_eq!(ids.len(), 100);
    assert_eq!(ids.last().unwrap(), "ABCDEF99");
}

#[test]
fn test_generator_ids_are_unique() {
    let ids: Vec<String> = FileIdGenerator::new("IM", Alphabet::Alphanumeric)
        .unwrap()
        .take(5000)
        .collect();
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn test_generator_rejects_long_prefix() {
    assert!(FileIdGenerator::new("TOOLONG8", Alphabet::Numeric).is_err());
}

// =============================================================================
// Conformance Tests
// =============================================================================

#[test]
fn test_conformant_component() {
    assert!(is_conformant_component("IM000001"));
    assert!(is_conformant_component("A_1"));
    assert!(!is_conformant_component(""));
    assert!(!is_conformant_component("im000001"));
    assert!(!is_conformant_component("IM0000001"));
    assert!(!is_conformant_component("IM-1"));
}

#[test]
fn test_conformant_file_id_depth() {
    let eight = vec!["A"; 8];
    let nine = vec!["A"; 9];
    assert!(is_conformant_file_id(&eight[..]));
    assert!(!is_conformant_file_id(&nine[..]));
    assert!(!is_conformant_file_id::<&str>(&[]));
}

#[test]
fn test_safe_component() {
    assert!(is_safe_component("IM000001"));
    assert!(is_safe_component("image.dcm"));
    assert!(!is_safe_component(""));
    assert!(!is_safe_component("."));
    assert!(!is_safe_component(".."));
    assert!(!is_safe_component("a/b"));
    assert!(!is_safe_component("a\\b"));
}
