//! Dataset decoder
//!
//! Walks a byte slice element by element. Positions are reported
//! relative to the start of the file (`base` + cursor) so callers can
//! match directory record offsets against item positions.

use bytes::Buf;

use crate::dataset::{tags, Dataset, Element, Tag, Value, Vr};
use crate::error::{FileSetError, Result};

use super::{CharacterSet, TransferSyntax, UNDEFINED_LENGTH};

/// Tag, VR and length of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHeader {
    pub tag: Tag,
    pub vr: Vr,
    pub length: u32,
}

impl ElementHeader {
    pub fn is_undefined_length(&self) -> bool {
        self.length == UNDEFINED_LENGTH
    }
}

/// Where a dataset ends
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// End of the input
    Eof,
    /// Absolute cursor position of a defined-length item
    At(usize),
    /// An item delimitation item
    Delimiter,
}

pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
    syntax: TransferSyntax,
    charset: CharacterSet,
}

impl<'a> Decoder<'a> {
    /// `base` is the file offset of `data[0]`
    pub fn new(data: &'a [u8], syntax: TransferSyntax, base: u64) -> Self {
        Self {
            data,
            pos: 0,
            base,
            syntax,
            charset: CharacterSet::default(),
        }
    }

    /// Character set in scope before the data declares its own
    pub fn with_charset(mut self, charset: CharacterSet) -> Self {
        self.charset = charset;
        self
    }

    /// Current file offset
    pub fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consumed bytes within `data`
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Tag of the next element without consuming it
    pub fn peek_tag(&self) -> Option<Tag> {
        let mut bytes = self.data.get(self.pos..self.pos + 4)?;
        Some(if self.syntax.is_little_endian() {
            Tag::new(bytes.get_u16_le(), bytes.get_u16_le())
        } else {
            Tag::new(bytes.get_u16(), bytes.get_u16())
        })
    }

    // =========================================================================
    // Primitive reads
    // =========================================================================

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                FileSetError::Codec(format!(
                    "unexpected end of data at offset {}: wanted {} bytes, {} left",
                    self.position(),
                    len,
                    self.data.len() - self.pos
                ))
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut bytes = self.take(2)?;
        Ok(if self.syntax.is_little_endian() {
            bytes.get_u16_le()
        } else {
            bytes.get_u16()
        })
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = self.take(4)?;
        Ok(if self.syntax.is_little_endian() {
            bytes.get_u32_le()
        } else {
            bytes.get_u32()
        })
    }

    fn read_tag(&mut self) -> Result<Tag> {
        let group = self.read_u16()?;
        let element = self.read_u16()?;
        Ok(Tag::new(group, element))
    }

    // =========================================================================
    // Elements
    // =========================================================================

    pub fn read_header(&mut self) -> Result<ElementHeader> {
        let tag = self.read_tag()?;

        // Items and delimiters never carry a VR
        if tag.group() == 0xFFFE {
            let length = self.read_u32()?;
            return Ok(ElementHeader {
                tag,
                vr: Vr::UN,
                length,
            });
        }

        if self.syntax.is_explicit_vr() {
            let code = self.take(2)?;
            let vr = Vr::from_code([code[0], code[1]]).ok_or_else(|| {
                FileSetError::Codec(format!(
                    "invalid VR '{}' for {} at offset {}",
                    String::from_utf8_lossy(code),
                    tag,
                    self.position() - 6
                ))
            })?;
            let length = if vr.has_long_header() {
                self.take(2)?;
                self.read_u32()?
            } else {
                u32::from(self.read_u16()?)
            };
            Ok(ElementHeader { tag, vr, length })
        } else {
            let length = self.read_u32()?;
            let mut vr = tags::vr_of(tag);
            if vr == Vr::UN && length == UNDEFINED_LENGTH {
                vr = Vr::SQ;
            }
            Ok(ElementHeader { tag, vr, length })
        }
    }

    pub fn read_value(&mut self, header: &ElementHeader) -> Result<Value> {
        match header.vr {
            Vr::SQ => Ok(Value::Sequence(self.read_sequence(header.length)?)),
            Vr::UN if header.is_undefined_length() => {
                // Undefined length UN is an implicit VR LE sequence
                let saved = self.syntax;
                self.syntax = TransferSyntax::ImplicitVrLittleEndian;
                let items = self.read_sequence(header.length);
                self.syntax = saved;
                Ok(Value::Sequence(items?))
            }
            _ if header.is_undefined_length() => Ok(Value::Fragments(self.read_fragments()?)),
            vr => {
                let bytes = self.take(header.length as usize)?;
                decode_value(vr, bytes, self.syntax.is_little_endian(), self.charset)
            }
        }
    }

    /// Read sequence items along with the file offset of each item header
    pub fn read_items(&mut self, length: u32) -> Result<Vec<(u64, Dataset)>> {
        let end = if length == UNDEFINED_LENGTH {
            None
        } else {
            Some(self.bounded_end(length)?)
        };

        let mut items = Vec::new();
        loop {
            match end {
                Some(end) if self.pos >= end => break,
                None if self.is_empty() => {
                    return Err(FileSetError::Codec(
                        "sequence is missing its delimitation item".to_string(),
                    ))
                }
                _ => {}
            }

            let offset = self.position();
            let header = self.read_header()?;
            match header.tag {
                tags::SEQUENCE_DELIMITATION_ITEM => break,
                tags::ITEM => {
                    let bound = if header.is_undefined_length() {
                        Bound::Delimiter
                    } else {
                        Bound::At(self.bounded_end(header.length)?)
                    };
                    items.push((offset, self.read_dataset_to(bound)?));
                }
                other => {
                    return Err(FileSetError::Codec(format!(
                        "unexpected {} inside a sequence at offset {}",
                        other, offset
                    )))
                }
            }
        }
        Ok(items)
    }

    fn read_sequence(&mut self, length: u32) -> Result<Vec<Dataset>> {
        Ok(self
            .read_items(length)?
            .into_iter()
            .map(|(_, item)| item)
            .collect())
    }

    fn read_fragments(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut fragments = Vec::new();
        loop {
            let header = self.read_header()?;
            match header.tag {
                tags::SEQUENCE_DELIMITATION_ITEM => return Ok(fragments),
                tags::ITEM => fragments.push(self.take(header.length as usize)?.to_vec()),
                other => {
                    return Err(FileSetError::Codec(format!(
                        "unexpected {} inside encapsulated data",
                        other
                    )))
                }
            }
        }
    }

    /// Read elements until the end of the input
    pub fn read_dataset(&mut self) -> Result<Dataset> {
        self.read_dataset_to(Bound::Eof)
    }

    fn read_dataset_to(&mut self, bound: Bound) -> Result<Dataset> {
        let inherited = self.charset;
        let result = self.read_elements(bound);
        self.charset = inherited;
        result
    }

    fn read_elements(&mut self, bound: Bound) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        loop {
            match bound {
                Bound::Eof if self.is_empty() => break,
                Bound::At(end) if self.pos >= end => break,
                Bound::Delimiter if self.is_empty() => {
                    return Err(FileSetError::Codec(
                        "item is missing its delimitation item".to_string(),
                    ))
                }
                _ => {}
            }

            let header = self.read_header()?;
            if header.tag == tags::ITEM_DELIMITATION_ITEM {
                break;
            }
            let value = self.read_value(&header)?;
            if header.tag == tags::SPECIFIC_CHARACTER_SET {
                self.charset = CharacterSet::from_terms(value.strings().unwrap_or_default());
            }
            dataset.insert(
                header.tag,
                Element {
                    vr: header.vr,
                    value,
                },
            );
        }

        if let Bound::At(end) = bound {
            if self.pos != end {
                return Err(FileSetError::Codec(format!(
                    "item content overruns its length by {} bytes",
                    self.pos - end
                )));
            }
        }
        Ok(dataset)
    }

    fn bounded_end(&self, length: u32) -> Result<usize> {
        let end = self.pos + length as usize;
        if end > self.data.len() {
            return Err(FileSetError::Codec(format!(
                "length {} at offset {} runs past the end of the data",
                length,
                self.position()
            )));
        }
        Ok(end)
    }
}

/// Decode a fixed-length value
fn decode_value(
    vr: Vr,
    bytes: &[u8],
    little_endian: bool,
    charset: CharacterSet,
) -> Result<Value> {
    if vr.is_string() {
        return Ok(decode_strings(vr, bytes, charset));
    }

    let width = match vr {
        Vr::US | Vr::SS => 2,
        Vr::UL | Vr::SL | Vr::FL | Vr::AT => 4,
        Vr::UV | Vr::SV | Vr::FD => 8,
        _ => return Ok(Value::Bytes(raw_bytes(vr, bytes, little_endian))),
    };
    if bytes.len() % width != 0 {
        return Err(FileSetError::Codec(format!(
            "{} value of {} bytes is not a multiple of {}",
            vr,
            bytes.len(),
            width
        )));
    }

    let mut buf = bytes;
    let count = bytes.len() / width;
    macro_rules! read_all {
        ($variant:ident, $le:ident, $be:ident) => {
            Value::$variant(
                (0..count)
                    .map(|_| if little_endian { buf.$le() } else { buf.$be() })
                    .collect(),
            )
        };
    }

    let value = match vr {
        Vr::US => read_all!(U16, get_u16_le, get_u16),
        Vr::SS => read_all!(I16, get_i16_le, get_i16),
        Vr::UL => read_all!(U32, get_u32_le, get_u32),
        Vr::SL => read_all!(I32, get_i32_le, get_i32),
        Vr::UV => read_all!(U64, get_u64_le, get_u64),
        Vr::SV => read_all!(I64, get_i64_le, get_i64),
        Vr::FL => read_all!(F32, get_f32_le, get_f32),
        Vr::FD => read_all!(F64, get_f64_le, get_f64),
        _ => Value::Tags(
            (0..count)
                .map(|_| {
                    if little_endian {
                        Tag::new(buf.get_u16_le(), buf.get_u16_le())
                    } else {
                        Tag::new(buf.get_u16(), buf.get_u16())
                    }
                })
                .collect(),
        ),
    };
    Ok(value)
}

/// Raw values are held in little endian byte order, so big endian words
/// of OW, OF, OL, OD and OV are swapped
fn raw_bytes(vr: Vr, bytes: &[u8], little_endian: bool) -> Vec<u8> {
    let word = match vr {
        Vr::OW => 2,
        Vr::OF | Vr::OL => 4,
        Vr::OD | Vr::OV => 8,
        _ => 1,
    };
    let mut raw = bytes.to_vec();
    if !little_endian && word > 1 {
        raw.chunks_exact_mut(word).for_each(|chunk| chunk.reverse());
    }
    raw
}

fn decode_strings(vr: Vr, bytes: &[u8], charset: CharacterSet) -> Value {
    let text = match charset.decode(bytes) {
        Some(text) => text,
        // Undecodable text keeps its bytes so it is written back unchanged
        None => return Value::Bytes(bytes.to_vec()),
    };
    let text = text.trim_end_matches(['\0', ' ']);
    if text.is_empty() {
        return Value::Strs(Vec::new());
    }
    if vr.is_single_valued_text() {
        return Value::Strs(vec![text.to_string()]);
    }

    let numeric = matches!(vr, Vr::DS | Vr::IS);
    Value::Strs(
        text.split('\\')
            .map(|component| {
                if numeric {
                    component.trim().to_string()
                } else {
                    component.trim_end_matches(['\0', ' ']).to_string()
                }
            })
            .collect(),
    )
}
