//! Element values
//!
//! Values are kept decoded: strings are split on the multi-value
//! separator and trimmed of padding, numbers are native. Anything the
//! engine has no reason to interpret stays as raw bytes so it survives a
//! read/write cycle untouched.

use super::{Dataset, Tag, Vr};

/// Decoded value of one element
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character strings, one entry per value
    Strs(Vec<String>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Attribute tags (AT)
    Tags(Vec<Tag>),
    /// Raw bytes (OB, OW, UN, ...)
    Bytes(Vec<u8>),
    /// Sequence items
    Sequence(Vec<Dataset>),
    /// Encapsulated pixel data: offset table followed by fragments
    Fragments(Vec<Vec<u8>>),
}

impl Value {
    /// Number of values held
    pub fn multiplicity(&self) -> usize {
        match self {
            Value::Strs(v) => v.len(),
            Value::U16(v) => v.len(),
            Value::I16(v) => v.len(),
            Value::U32(v) => v.len(),
            Value::I32(v) => v.len(),
            Value::U64(v) => v.len(),
            Value::I64(v) => v.len(),
            Value::F32(v) => v.len(),
            Value::F64(v) => v.len(),
            Value::Tags(v) => v.len(),
            Value::Bytes(v) => usize::from(!v.is_empty()),
            Value::Sequence(v) => v.len(),
            Value::Fragments(v) => v.len(),
        }
    }

    /// An element is empty when it has no values, or only empty strings
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Strs(v) => v.iter().all(|s| s.is_empty()),
            other => other.multiplicity() == 0,
        }
    }

    /// The empty value for a VR
    pub fn empty_for(vr: Vr) -> Self {
        match vr {
            Vr::SQ => Value::Sequence(Vec::new()),
            Vr::US => Value::U16(Vec::new()),
            Vr::SS => Value::I16(Vec::new()),
            Vr::UL => Value::U32(Vec::new()),
            Vr::SL => Value::I32(Vec::new()),
            Vr::UV => Value::U64(Vec::new()),
            Vr::SV => Value::I64(Vec::new()),
            Vr::FL => Value::F32(Vec::new()),
            Vr::FD => Value::F64(Vec::new()),
            Vr::AT => Value::Tags(Vec::new()),
            vr if vr.is_string() => Value::Strs(Vec::new()),
            _ => Value::Bytes(Vec::new()),
        }
    }

    pub fn strings(&self) -> Option<&[String]> {
        match self {
            Value::Strs(v) => Some(v),
            _ => None,
        }
    }

    /// First string value
    pub fn as_str(&self) -> Option<&str> {
        self.strings().and_then(|v| v.first()).map(String::as_str)
    }

    /// First value as an unsigned integer, whatever its width
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => v.first().copied(),
            Value::U16(v) => v.first().map(|&n| u32::from(n)),
            Value::Strs(v) => v.first().and_then(|s| s.trim().parse().ok()),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::U16(v) => v.first().copied(),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Dataset]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut Vec<Dataset>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Strs(vec![value.to_string()])
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Strs(vec![value])
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Value::Strs(values)
    }
}

impl From<&[&str]> for Value {
    fn from(values: &[&str]) -> Self {
        Value::Strs(values.iter().map(|s| s.to_string()).collect())
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::U16(vec![value])
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U32(vec![value])
    }
}

impl From<Vec<Dataset>> for Value {
    fn from(items: Vec<Dataset>) -> Self {
        Value::Sequence(items)
    }
}

/// A VR and value pair; the tag is the key it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub vr: Vr,
    pub value: Value,
}

impl Element {
    pub fn new(vr: Vr, value: impl Into<Value>) -> Self {
        Self {
            vr,
            value: value.into(),
        }
    }

    /// An element with zero length
    pub fn empty(vr: Vr) -> Self {
        Self {
            vr,
            value: Value::empty_for(vr),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
