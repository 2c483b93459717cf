//! Dataset encoder

use bytes::BufMut;

use crate::dataset::{tags, Dataset, Element, Tag, Value, Vr};
use crate::error::{FileSetError, Result};

use super::{CharacterSet, TransferSyntax, UNDEFINED_LENGTH};

/// Encodes datasets in a little endian transfer syntax
///
/// Text is encoded with the character set in scope: the one a dataset
/// declares, else the one inherited from the enclosing dataset.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    explicit_vr: bool,
    charset: CharacterSet,
}

impl Encoder {
    pub fn new(syntax: TransferSyntax) -> Result<Self> {
        if !syntax.is_little_endian() {
            return Err(FileSetError::Encoding(
                "encoding to explicit VR big endian is not supported".to_string(),
            ));
        }
        Ok(Self {
            explicit_vr: syntax.is_explicit_vr(),
            charset: CharacterSet::default(),
        })
    }

    pub fn with_charset(mut self, charset: CharacterSet) -> Self {
        self.charset = charset;
        self
    }

    pub fn charset(&self) -> CharacterSet {
        self.charset
    }

    /// Encoder for the elements of `dataset`
    pub fn scoped(self, dataset: &Dataset) -> Self {
        self.with_charset(self.charset.scoped(dataset))
    }

    pub fn syntax(&self) -> TransferSyntax {
        if self.explicit_vr {
            TransferSyntax::ExplicitVrLittleEndian
        } else {
            TransferSyntax::ImplicitVrLittleEndian
        }
    }

    /// Encode a whole dataset
    pub fn encode_dataset(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_dataset(&mut buf, dataset)?;
        Ok(buf)
    }

    pub fn write_dataset(&self, buf: &mut Vec<u8>, dataset: &Dataset) -> Result<()> {
        let encoder = self.scoped(dataset);
        for (tag, element) in dataset {
            encoder.write_element(buf, *tag, element)?;
        }
        Ok(())
    }

    /// Write one item: header followed by the encoded dataset
    pub fn write_item(&self, buf: &mut Vec<u8>, item: &Dataset) -> Result<()> {
        let body = self.encode_dataset(item)?;
        buf.put_u16_le(tags::ITEM.group());
        buf.put_u16_le(tags::ITEM.element());
        buf.put_u32_le(checked_len(body.len())?);
        buf.put_slice(&body);
        Ok(())
    }

    pub fn write_element(&self, buf: &mut Vec<u8>, tag: Tag, element: &Element) -> Result<()> {
        match &element.value {
            Value::Sequence(items) => {
                let mut body = Vec::new();
                for item in items {
                    self.write_item(&mut body, item)?;
                }
                self.write_header(buf, tag, Vr::SQ, checked_len(body.len())?)?;
                buf.put_slice(&body);
            }
            Value::Fragments(fragments) => {
                self.write_header(buf, tag, element.vr, UNDEFINED_LENGTH)?;
                for fragment in fragments {
                    buf.put_u16_le(tags::ITEM.group());
                    buf.put_u16_le(tags::ITEM.element());
                    buf.put_u32_le(checked_len(fragment.len())?);
                    buf.put_slice(fragment);
                    if fragment.len() % 2 == 1 {
                        buf.put_u8(0);
                    }
                }
                buf.put_u16_le(tags::SEQUENCE_DELIMITATION_ITEM.group());
                buf.put_u16_le(tags::SEQUENCE_DELIMITATION_ITEM.element());
                buf.put_u32_le(0);
            }
            value => {
                let bytes = value_bytes(element.vr, value, self.charset);
                self.write_header(buf, tag, element.vr, checked_len(bytes.len())?)?;
                buf.put_slice(&bytes);
            }
        }
        Ok(())
    }

    /// Write an element header with an explicit length
    pub fn write_header(&self, buf: &mut Vec<u8>, tag: Tag, vr: Vr, length: u32) -> Result<()> {
        buf.put_u16_le(tag.group());
        buf.put_u16_le(tag.element());

        if !self.explicit_vr {
            buf.put_u32_le(length);
            return Ok(());
        }

        buf.put_slice(vr.code().as_bytes());
        if vr.has_long_header() {
            buf.put_u16_le(0);
            buf.put_u32_le(length);
        } else {
            let short = u16::try_from(length).map_err(|_| {
                FileSetError::Codec(format!(
                    "{} value of {} bytes does not fit a {} element",
                    tag, length, vr
                ))
            })?;
            buf.put_u16_le(short);
        }
        Ok(())
    }
}

/// Encode a non-sequence value, padded to even length
fn value_bytes(vr: Vr, value: &Value, charset: CharacterSet) -> Vec<u8> {
    let mut buf = Vec::new();
    match value {
        Value::Strs(values) => buf.put_slice(&charset.encode(&values.join("\\"))),
        Value::U16(values) => values.iter().for_each(|v| buf.put_u16_le(*v)),
        Value::I16(values) => values.iter().for_each(|v| buf.put_i16_le(*v)),
        Value::U32(values) => values.iter().for_each(|v| buf.put_u32_le(*v)),
        Value::I32(values) => values.iter().for_each(|v| buf.put_i32_le(*v)),
        Value::U64(values) => values.iter().for_each(|v| buf.put_u64_le(*v)),
        Value::I64(values) => values.iter().for_each(|v| buf.put_i64_le(*v)),
        Value::F32(values) => values.iter().for_each(|v| buf.put_f32_le(*v)),
        Value::F64(values) => values.iter().for_each(|v| buf.put_f64_le(*v)),
        Value::Tags(values) => values.iter().for_each(|t| {
            buf.put_u16_le(t.group());
            buf.put_u16_le(t.element());
        }),
        Value::Bytes(bytes) => buf.put_slice(bytes),
        Value::Sequence(_) | Value::Fragments(_) => {}
    }
    if buf.len() % 2 == 1 {
        buf.put_u8(vr.padding());
    }
    buf
}

fn checked_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|&len| len != UNDEFINED_LENGTH)
        .ok_or_else(|| FileSetError::Codec(format!("value of {} bytes is too long", len)))
}
