//! Directory file reader

use std::fs;
use std::path::Path;

use crate::codec::{read_meta, CharacterSet, Decoder, TransferSyntax};
use crate::dataset::{tags, uid, Dataset, Element};
use crate::error::{FileSetError, Result};

/// A decoded directory file
///
/// Records are kept flat, each with the file offset of its item header,
/// since that is what the pointer fields refer to.
#[derive(Debug, Clone)]
pub struct DirectoryFile {
    pub meta: Dataset,
    /// Top-level dataset without the record sequence
    pub dataset: Dataset,
    /// `(offset, record)` in file order
    pub records: Vec<(u64, Dataset)>,
    pub transfer_syntax: TransferSyntax,
}

impl DirectoryFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (meta, start) = read_meta(bytes)?;

        match meta.string(tags::MEDIA_STORAGE_SOP_CLASS_UID) {
            Some(uid::MEDIA_STORAGE_DIRECTORY_STORAGE) => {}
            other => {
                return Err(FileSetError::Validation(format!(
                    "the file is not a DICOMDIR, its Media Storage SOP Class UID is '{}'",
                    other.unwrap_or_default()
                )))
            }
        }

        let transfer_syntax = match meta.string(tags::TRANSFER_SYNTAX_UID) {
            Some(uid::EXPLICIT_VR_LITTLE_ENDIAN) => TransferSyntax::ExplicitVrLittleEndian,
            Some(uid::IMPLICIT_VR_LITTLE_ENDIAN) => TransferSyntax::ImplicitVrLittleEndian,
            Some(uid::EXPLICIT_VR_BIG_ENDIAN) => TransferSyntax::ExplicitVrBigEndian,
            Some(other) => {
                return Err(FileSetError::Encoding(format!(
                    "the DICOMDIR uses the transfer syntax '{}' which cannot be read",
                    other
                )))
            }
            None => {
                return Err(FileSetError::Validation(
                    "the DICOMDIR file meta group has no Transfer Syntax UID".to_string(),
                ))
            }
        };

        let body = &bytes[start..];
        let (mut dataset, mut records) =
            read_body(body, start as u64, transfer_syntax, CharacterSet::default())?;

        // (0008,0005) sorts after the record sequence, so records are only
        // decoded with the right character set on a second pass
        if let Some(charset) = CharacterSet::declared_by(&dataset) {
            if charset != CharacterSet::default() {
                (dataset, records) = read_body(body, start as u64, transfer_syntax, charset)?;
            }
        }

        Ok(Self {
            meta,
            dataset,
            records,
            transfer_syntax,
        })
    }

    /// Value of (0004,1200), 0 when absent
    pub fn first_root_offset(&self) -> u64 {
        self.dataset
            .u32(tags::OFFSET_OF_FIRST_ROOT_RECORD)
            .unwrap_or(0) as u64
    }

    /// Value of (0004,1202), 0 when absent
    pub fn last_root_offset(&self) -> u64 {
        self.dataset
            .u32(tags::OFFSET_OF_LAST_ROOT_RECORD)
            .unwrap_or(0) as u64
    }

    /// Records in file order, without their offsets
    pub fn record_datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.records.iter().map(|(_, record)| record)
    }
}

/// Top-level elements and `(offset, record)` pairs of a directory body
fn read_body(
    body: &[u8],
    base: u64,
    syntax: TransferSyntax,
    charset: CharacterSet,
) -> Result<(Dataset, Vec<(u64, Dataset)>)> {
    let mut decoder = Decoder::new(body, syntax, base).with_charset(charset);
    let mut dataset = Dataset::new();
    let mut records = Vec::new();
    while !decoder.is_empty() {
        let header = decoder.read_header()?;
        if header.tag == tags::DIRECTORY_RECORD_SEQUENCE {
            records = decoder.read_items(header.length)?;
            continue;
        }
        let value = decoder.read_value(&header)?;
        dataset.insert(
            header.tag,
            Element {
                vr: header.vr,
                value,
            },
        );
    }
    Ok((dataset, records))
}
