//! Tests for the dataset codec
//!
//! These tests verify:
//! - Element encoding in explicit and implicit VR little endian
//! - Padding and trimming of odd-length values
//! - Sequence item offsets reported by the decoder
//! - Explicit VR big endian and undefined-length decoding
//! - Big endian OW values are word-swapped into little endian order
//! - Text is decoded and re-encoded byte for byte in its character set
//! - Part-10 framing (preamble, magic, meta group)
//! - Malformed input detection

#[path = "../common/mod.rs"]
mod common;

use fileset::codec::{
    encode_meta, read_meta, Decoder, DicomFile, Encoder, TransferSyntax, MAGIC, PREAMBLE_LEN,
};
use fileset::dataset::{tags, uid, Dataset, Element, Value, Vr};
use fileset::FileSetError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn explicit() -> Encoder {
    Encoder::new(TransferSyntax::ExplicitVrLittleEndian).unwrap()
}

fn implicit() -> Encoder {
    Encoder::new(TransferSyntax::ImplicitVrLittleEndian).unwrap()
}

fn patient(id: &str) -> Dataset {
    let mut ds = Dataset::new();
    ds.put(tags::PATIENT_ID, id);
    ds
}

fn named(charset: &str, name: &str) -> Dataset {
    let mut ds = Dataset::new();
    ds.put(tags::SPECIFIC_CHARACTER_SET, charset);
    ds.put(tags::PATIENT_NAME, name);
    ds
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn decode_explicit(bytes: &[u8]) -> Dataset {
    Decoder::new(bytes, TransferSyntax::ExplicitVrLittleEndian, 0)
        .read_dataset()
        .unwrap()
}

// =============================================================================
// Encoder Tests
// =============================================================================

#[test]
fn test_encode_explicit_short_element() {
    let bytes = explicit().encode_dataset(&patient("P1")).unwrap();
    assert_eq!(
        bytes,
        vec![0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x02, 0x00, b'P', b'1']
    );
}

#[test]
fn test_encode_implicit_element() {
    let bytes = implicit().encode_dataset(&patient("P1")).unwrap();
    assert_eq!(
        bytes,
        vec![0x10, 0x00, 0x20, 0x00, 0x02, 0x00, 0x00, 0x00, b'P', b'1']
    );
}

#[test]
fn test_encode_pads_odd_values() {
    let mut ds = Dataset::new();
    ds.put(tags::PATIENT_ID, "ABC");
    ds.put(tags::STUDY_INSTANCE_UID, "1.2.3");
    let bytes = explicit().encode_dataset(&ds).unwrap();

    // (0010,0020) LO "ABC " then (0020,000D) UI "1.2.3\0"
    assert_eq!(&bytes[6..8], &[0x04, 0x00]);
    assert_eq!(&bytes[8..12], b"ABC ");
    assert_eq!(&bytes[18..20], &[0x06, 0x00]);
    assert_eq!(&bytes[20..26], b"1.2.3\0");
}

#[test]
fn test_encode_sequence_uses_long_header() {
    let mut ds = Dataset::new();
    ds.put(tags::DIRECTORY_RECORD_SEQUENCE, vec![patient("A")]);
    let bytes = explicit().encode_dataset(&ds).unwrap();

    assert_eq!(&bytes[4..6], b"SQ");
    assert_eq!(&bytes[6..8], &[0x00, 0x00]);
    // One item: 8 byte header + 10 byte element
    assert_eq!(&bytes[8..12], &18u32.to_le_bytes());
    assert_eq!(bytes.len(), 12 + 18);
}

#[test]
fn test_encoder_rejects_big_endian() {
    let result = Encoder::new(TransferSyntax::ExplicitVrBigEndian);
    assert!(matches!(result, Err(FileSetError::Encoding(_))));
}

#[test]
fn test_transfer_syntax_from_uid() {
    assert_eq!(
        TransferSyntax::from_uid(uid::IMPLICIT_VR_LITTLE_ENDIAN).unwrap(),
        TransferSyntax::ImplicitVrLittleEndian
    );
    assert_eq!(
        TransferSyntax::from_uid(uid::EXPLICIT_VR_BIG_ENDIAN).unwrap(),
        TransferSyntax::ExplicitVrBigEndian
    );
    // Encapsulated syntaxes encode the dataset as explicit VR little endian
    assert_eq!(
        TransferSyntax::from_uid("1.2.840.10008.1.2.4.50").unwrap(),
        TransferSyntax::ExplicitVrLittleEndian
    );
    assert!(matches!(
        TransferSyntax::from_uid(uid::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN),
        Err(FileSetError::Encoding(_))
    ));
}

// =============================================================================
// Decoder Tests
// =============================================================================

#[test]
fn test_decode_trims_padding() {
    let mut ds = Dataset::new();
    ds.put(tags::PATIENT_ID, "ABC");
    ds.put(tags::STUDY_INSTANCE_UID, "1.2.3");
    let bytes = explicit().encode_dataset(&ds).unwrap();

    let decoded = Decoder::new(&bytes, TransferSyntax::ExplicitVrLittleEndian, 0)
        .read_dataset()
        .unwrap();
    assert_eq!(decoded, ds);
}

#[test]
fn test_decode_implicit_uses_dictionary_vr() {
    let mut ds = Dataset::new();
    ds.put(tags::PATIENT_ID, "P1");
    ds.put(tags::RECORD_IN_USE_FLAG, 0xFFFFu16);
    ds.put(tags::OFFSET_OF_NEXT_RECORD, 1234u32);
    let bytes = implicit().encode_dataset(&ds).unwrap();

    let decoded = Decoder::new(&bytes, TransferSyntax::ImplicitVrLittleEndian, 0)
        .read_dataset()
        .unwrap();
    assert_eq!(decoded.get(tags::PATIENT_ID).unwrap().vr, Vr::LO);
    assert_eq!(decoded.u16(tags::RECORD_IN_USE_FLAG), Some(0xFFFF));
    assert_eq!(decoded.u32(tags::OFFSET_OF_NEXT_RECORD), Some(1234));
}

#[test]
fn test_decode_multi_valued_strings() {
    let mut ds = Dataset::new();
    ds.put(
        tags::REFERENCED_FILE_ID,
        vec!["PT000000".to_string(), "IM000001".to_string()],
    );
    let bytes = explicit().encode_dataset(&ds).unwrap();

    let decoded = Decoder::new(&bytes, TransferSyntax::ExplicitVrLittleEndian, 0)
        .read_dataset()
        .unwrap();
    assert_eq!(
        decoded.strings(tags::REFERENCED_FILE_ID).unwrap(),
        &["PT000000".to_string(), "IM000001".to_string()]
    );
}

#[test]
fn test_read_items_reports_file_offsets() {
    let mut ds = Dataset::new();
    ds.put(
        tags::DIRECTORY_RECORD_SEQUENCE,
        vec![patient("A"), patient("B")],
    );
    let bytes = explicit().encode_dataset(&ds).unwrap();

    let mut decoder = Decoder::new(&bytes, TransferSyntax::ExplicitVrLittleEndian, 100);
    let header = decoder.read_header().unwrap();
    assert_eq!(header.tag, tags::DIRECTORY_RECORD_SEQUENCE);

    let items = decoder.read_items(header.length).unwrap();
    let offsets: Vec<u64> = items.iter().map(|(offset, _)| *offset).collect();
    assert_eq!(offsets, vec![112, 130]);
    assert_eq!(items[1].1.string(tags::PATIENT_ID), Some("B"));
}

#[test]
fn test_decode_undefined_length_sequence() {
    let mut bytes = Vec::new();
    // (0004,1220), undefined length
    bytes.extend_from_slice(&[0x04, 0x00, 0x20, 0x12, 0xFF, 0xFF, 0xFF, 0xFF]);
    // Item, undefined length
    bytes.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
    // (0010,0020) "P1"
    bytes.extend_from_slice(&[0x10, 0x00, 0x20, 0x00, 0x02, 0x00, 0x00, 0x00, b'P', b'1']);
    // Item and sequence delimiters
    bytes.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);

    let decoded = Decoder::new(&bytes, TransferSyntax::ImplicitVrLittleEndian, 0)
        .read_dataset()
        .unwrap();
    let items = decoded.items(tags::DIRECTORY_RECORD_SEQUENCE).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].string(tags::PATIENT_ID), Some("P1"));
}

#[test]
fn test_decode_explicit_big_endian() {
    let bytes = [
        // (0010,0020) LO "P1"
        0x00, 0x10, 0x00, 0x20, b'L', b'O', 0x00, 0x02, b'P', b'1',
        // (0028,0010) US 512
        0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00,
    ];
    let decoded = Decoder::new(&bytes, TransferSyntax::ExplicitVrBigEndian, 0)
        .read_dataset()
        .unwrap();
    assert_eq!(decoded.string(tags::PATIENT_ID), Some("P1"));
    assert_eq!(decoded.u16(tags::ROWS), Some(512));
}

#[test]
fn test_decode_big_endian_words_swapped() {
    let bytes = [
        // (0028,1201) OW, words 0x0102 0x0304
        0x00, 0x28, 0x12, 0x01, b'O', b'W', 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x01, 0x02, 0x03,
        0x04,
        // (0042,0011) OB, bytes have no order to swap
        0x00, 0x42, 0x00, 0x11, b'O', b'B', 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02,
    ];
    let decoded = Decoder::new(&bytes, TransferSyntax::ExplicitVrBigEndian, 0)
        .read_dataset()
        .unwrap();

    let lut = decoded.get(tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DATA).unwrap();
    assert_eq!(lut.vr, Vr::OW);
    assert_eq!(lut.value, Value::Bytes(vec![0x02, 0x01, 0x04, 0x03]));
    assert_eq!(
        decoded.get(tags::ENCAPSULATED_DOCUMENT).unwrap().value,
        Value::Bytes(vec![0x01, 0x02])
    );

    // Re-encoded little endian, the words read back as the same numbers
    let bytes = explicit().encode_dataset(&decoded).unwrap();
    assert!(contains(&bytes, &[0x02, 0x01, 0x04, 0x03]));
}

#[test]
fn test_decode_truncated_value() {
    // Claims 10 bytes of value, has 2
    let bytes = [0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x0A, 0x00, b'P', b'1'];
    let result = Decoder::new(&bytes, TransferSyntax::ExplicitVrLittleEndian, 0).read_dataset();
    assert!(matches!(result, Err(FileSetError::Codec(_))));
}

#[test]
fn test_decode_invalid_vr() {
    let bytes = [0x10, 0x00, 0x20, 0x00, b'Z', b'Z', 0x02, 0x00, b'P', b'1'];
    let result = Decoder::new(&bytes, TransferSyntax::ExplicitVrLittleEndian, 0).read_dataset();
    assert!(matches!(result, Err(FileSetError::Codec(_))));
}

// =============================================================================
// Character Set Tests
// =============================================================================

#[test]
fn test_latin1_text_round_trip() {
    let bytes = explicit()
        .encode_dataset(&named("ISO_IR 100", "Doe^P\u{e4}tient"))
        .unwrap();
    assert!(contains(&bytes, b"Doe^P\xE4tient"));
    assert!(!contains(&bytes, &[0xC3, 0xA4]));

    let decoded = decode_explicit(&bytes);
    assert_eq!(decoded.string(tags::PATIENT_NAME), Some("Doe^P\u{e4}tient"));
    assert_eq!(explicit().encode_dataset(&decoded).unwrap(), bytes);
}

#[test]
fn test_default_repertoire_keeps_high_bytes() {
    // (0010,0010) PN "Zo\xEB " with no Specific Character Set
    let bytes = [0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'Z', b'o', 0xEB, b' '];
    let decoded = decode_explicit(&bytes);
    assert_eq!(decoded.string(tags::PATIENT_NAME), Some("Zo\u{eb}"));
    assert_eq!(explicit().encode_dataset(&decoded).unwrap(), bytes.to_vec());
}

#[test]
fn test_utf8_character_set() {
    let bytes = explicit()
        .encode_dataset(&named("ISO_IR 192", "Doe^P\u{e4}tient"))
        .unwrap();
    assert!(contains(&bytes, "Doe^P\u{e4}tient".as_bytes()));

    let decoded = decode_explicit(&bytes);
    assert_eq!(decoded.string(tags::PATIENT_NAME), Some("Doe^P\u{e4}tient"));
}

#[test]
fn test_undecodable_text_kept_verbatim() {
    let mut bytes = vec![0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00];
    bytes.extend_from_slice(b"ISO_IR 192");
    // (0010,0010) PN holding an invalid UTF-8 sequence
    bytes.extend_from_slice(&[0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x02, 0x00, 0xC3, 0x28]);

    let decoded = decode_explicit(&bytes);
    let name = decoded.get(tags::PATIENT_NAME).unwrap();
    assert_eq!(name.vr, Vr::PN);
    assert_eq!(name.value, Value::Bytes(vec![0xC3, 0x28]));
    assert_eq!(explicit().encode_dataset(&decoded).unwrap(), bytes);
}

#[test]
fn test_items_inherit_character_set() {
    let mut item = Dataset::new();
    item.put(tags::PATIENT_NAME, "J\u{f6}ns");
    let mut ds = Dataset::new();
    ds.put(tags::SPECIFIC_CHARACTER_SET, "ISO_IR 192");
    ds.put(tags::REFERENCED_SERIES_SEQUENCE, vec![item]);

    let bytes = explicit().encode_dataset(&ds).unwrap();
    assert!(contains(&bytes, "J\u{f6}ns".as_bytes()));

    let decoded = decode_explicit(&bytes);
    let items = decoded.items(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
    assert_eq!(items[0].string(tags::PATIENT_NAME), Some("J\u{f6}ns"));
}

#[test]
fn test_item_character_set_does_not_leak() {
    let item = named("ISO_IR 192", "J\u{f6}ns");
    let mut ds = Dataset::new();
    ds.put(tags::REFERENCED_SERIES_SEQUENCE, vec![item]);
    ds.put(tags::PATIENT_ID, "P\u{e9}1");

    let bytes = explicit().encode_dataset(&ds).unwrap();
    // The item is UTF-8, its parent stays one byte per character
    assert!(contains(&bytes, "J\u{f6}ns".as_bytes()));
    assert!(contains(&bytes, b"P\xE91"));

    let decoded = decode_explicit(&bytes);
    assert_eq!(decoded.string(tags::PATIENT_ID), Some("P\u{e9}1"));
    let items = decoded.items(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
    assert_eq!(items[0].string(tags::PATIENT_NAME), Some("J\u{f6}ns"));
}

// =============================================================================
// Part-10 File Tests
// =============================================================================

#[test]
fn test_file_has_preamble_and_magic() {
    let bytes = common::ct_file(1, 1, 1, 0).to_bytes().unwrap();
    assert!(bytes[..PREAMBLE_LEN].iter().all(|&b| b == 0));
    assert_eq!(&bytes[PREAMBLE_LEN..PREAMBLE_LEN + 4], MAGIC);
}

#[test]
fn test_meta_group_length() {
    let bytes = common::ct_file(1, 1, 1, 0).to_bytes().unwrap();
    let (meta, start) = read_meta(&bytes).unwrap();

    // Group length element is 12 bytes and not counted in its own value
    let group_length = meta.u32(tags::FILE_META_INFORMATION_GROUP_LENGTH).unwrap() as usize;
    assert_eq!(start, PREAMBLE_LEN + 4 + 12 + group_length);
}

#[test]
fn test_encode_meta_ignores_stale_group_length() {
    let mut meta = Dataset::new();
    meta.insert(
        tags::FILE_META_INFORMATION_GROUP_LENGTH,
        Element::new(Vr::UL, 9999u32),
    );
    meta.put(tags::TRANSFER_SYNTAX_UID, uid::EXPLICIT_VR_LITTLE_ENDIAN);

    let bytes = encode_meta(&meta).unwrap();
    // "1.2.840.10008.1.2.1" is 19 characters, padded to 20
    assert_eq!(&bytes[8..12], &28u32.to_le_bytes());
    assert_eq!(bytes.len(), 12 + 28);
}

#[test]
fn test_file_round_trip_explicit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ct.dcm");
    let file = common::ct_file(1, 1, 1, 0);
    file.write(&path).unwrap();

    let read = DicomFile::open(&path).unwrap();
    assert_eq!(read.dataset, file.dataset);
    assert_eq!(read.sop_instance_uid(), file.sop_instance_uid());
    assert_eq!(read.transfer_syntax_uid(), Some(uid::EXPLICIT_VR_LITTLE_ENDIAN));
}

#[test]
fn test_file_round_trip_implicit() {
    let mut file = common::ct_file(1, 1, 1, 0);
    file.meta
        .put(tags::TRANSFER_SYNTAX_UID, uid::IMPLICIT_VR_LITTLE_ENDIAN);

    let read = DicomFile::from_bytes(&file.to_bytes().unwrap()).unwrap();
    assert_eq!(read.dataset, file.dataset);
    assert_eq!(read.transfer_syntax_uid(), Some(uid::IMPLICIT_VR_LITTLE_ENDIAN));
}

#[test]
fn test_file_missing_magic() {
    let result = DicomFile::from_bytes(&[0u8; 200]);
    assert!(matches!(result, Err(FileSetError::Codec(_))));
}

#[test]
fn test_file_too_short() {
    let result = DicomFile::from_bytes(b"DICM");
    assert!(matches!(result, Err(FileSetError::Codec(_))));
}

#[test]
fn test_value_emptiness() {
    assert!(Value::Strs(Vec::new()).is_empty());
    assert!(Value::Strs(vec![String::new()]).is_empty());
    assert!(!Value::from("X").is_empty());
    assert!(Element::empty(Vr::SQ).is_empty());
    assert_eq!(Value::from(7u32).as_u32(), Some(7));
    assert_eq!(Value::from("12").as_u32(), Some(12));
}
