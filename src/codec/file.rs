//! Part-10 file framing: preamble, magic and file meta group

use std::fs;
use std::path::Path;

use bytes::BufMut;

use crate::dataset::{tags, uid, Dataset, Element, Value, Vr};
use crate::error::{FileSetError, Result};

use super::{Decoder, Encoder, TransferSyntax};

/// Size of the zero-filled preamble
pub const PREAMBLE_LEN: usize = 128;

/// Magic bytes following the preamble
pub const MAGIC: &[u8; 4] = b"DICM";

/// A decoded Part-10 file
#[derive(Debug, Clone, PartialEq)]
pub struct DicomFile {
    /// File meta group (0002,xxxx)
    pub meta: Dataset,
    /// Main dataset
    pub dataset: Dataset,
}

impl DicomFile {
    pub fn new(meta: Dataset, dataset: Dataset) -> Self {
        Self { meta, dataset }
    }

    /// Read and decode a file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (meta, start) = read_meta(bytes)?;
        let syntax = TransferSyntax::from_uid(
            meta.string(tags::TRANSFER_SYNTAX_UID)
                .unwrap_or(uid::EXPLICIT_VR_LITTLE_ENDIAN),
        )?;
        let dataset = Decoder::new(&bytes[start..], syntax, start as u64).read_dataset()?;
        Ok(Self { meta, dataset })
    }

    /// Transfer Syntax UID from the file meta group
    pub fn transfer_syntax_uid(&self) -> Option<&str> {
        self.meta.string(tags::TRANSFER_SYNTAX_UID)
    }

    /// SOP Instance UID of the dataset, falling back to the meta group
    pub fn sop_instance_uid(&self) -> Option<&str> {
        self.dataset
            .string(tags::SOP_INSTANCE_UID)
            .or_else(|| self.meta.string(tags::MEDIA_STORAGE_SOP_INSTANCE_UID))
    }

    /// SOP Class UID of the dataset, falling back to the meta group
    pub fn sop_class_uid(&self) -> Option<&str> {
        self.dataset
            .string(tags::SOP_CLASS_UID)
            .or_else(|| self.meta.string(tags::MEDIA_STORAGE_SOP_CLASS_UID))
    }

    /// Encode the whole file
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let syntax = TransferSyntax::from_uid(
            self.transfer_syntax_uid()
                .unwrap_or(uid::EXPLICIT_VR_LITTLE_ENDIAN),
        )?;

        let mut buf = vec![0u8; PREAMBLE_LEN];
        buf.put_slice(MAGIC);
        buf.put_slice(&encode_meta(&self.meta)?);
        Encoder::new(syntax)?.write_dataset(&mut buf, &self.dataset)?;
        Ok(buf)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_bytes()?)?;
        Ok(())
    }
}

/// Check the preamble and magic, then decode the file meta group
///
/// Returns the meta group and the offset where the main dataset starts.
pub fn read_meta(bytes: &[u8]) -> Result<(Dataset, usize)> {
    let start = PREAMBLE_LEN + MAGIC.len();
    if bytes.len() < start || &bytes[PREAMBLE_LEN..start] != MAGIC {
        return Err(FileSetError::Codec(
            "missing 128 byte preamble and 'DICM' prefix".to_string(),
        ));
    }

    let mut decoder = Decoder::new(
        &bytes[start..],
        TransferSyntax::ExplicitVrLittleEndian,
        start as u64,
    );
    let mut meta = Dataset::new();
    while let Some(tag) = decoder.peek_tag() {
        if tag.group() != 0x0002 {
            break;
        }
        let header = decoder.read_header()?;
        let value = decoder.read_value(&header)?;
        meta.insert(
            header.tag,
            Element {
                vr: header.vr,
                value,
            },
        );
    }

    if meta.is_empty() {
        return Err(FileSetError::Codec("file meta group is missing".to_string()));
    }
    Ok((meta, start + decoder.consumed()))
}

/// Encode the file meta group with a freshly computed group length
pub fn encode_meta(meta: &Dataset) -> Result<Vec<u8>> {
    let encoder = Encoder::new(TransferSyntax::ExplicitVrLittleEndian)?;

    let mut body = Vec::new();
    for (tag, element) in meta.group(0x0002) {
        if tag.is_group_length() {
            continue;
        }
        encoder.write_element(&mut body, *tag, element)?;
    }

    let mut buf = Vec::with_capacity(12 + body.len());
    encoder.write_element(
        &mut buf,
        tags::FILE_META_INFORMATION_GROUP_LENGTH,
        &Element::new(Vr::UL, body.len() as u32),
    )?;
    buf.put_slice(&body);
    Ok(buf)
}

/// Build a file meta group
pub fn create_meta(
    sop_class_uid: &str,
    sop_instance_uid: &str,
    transfer_syntax: TransferSyntax,
    implementation_class_uid: &str,
    implementation_version_name: &str,
) -> Dataset {
    let mut meta = Dataset::new();
    meta.insert(
        tags::FILE_META_INFORMATION_VERSION,
        Element::new(Vr::OB, Value::Bytes(vec![0x00, 0x01])),
    );
    meta.put(tags::MEDIA_STORAGE_SOP_CLASS_UID, sop_class_uid);
    meta.put(tags::MEDIA_STORAGE_SOP_INSTANCE_UID, sop_instance_uid);
    meta.put(tags::TRANSFER_SYNTAX_UID, transfer_syntax.uid());
    meta.put(tags::IMPLEMENTATION_CLASS_UID, implementation_class_uid);
    meta.put(tags::IMPLEMENTATION_VERSION_NAME, implementation_version_name);
    meta
}
