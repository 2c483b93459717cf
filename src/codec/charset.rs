//! Specific Character Set handling
//!
//! Text values are decoded with the character set in scope for their
//! dataset and encoded back with the same one. A dataset's own (0008,0005)
//! applies to it and to every item nested inside it; otherwise the set of
//! the enclosing dataset is inherited.
//!
//! Only two repertoires are told apart. ISO_IR 192 is UTF-8. Every other
//! term, including the default repertoire, maps each byte to the code
//! point of the same value, which is exact for ISO_IR 100 and passes any
//! other single-byte or ISO 2022 set through unchanged.

use crate::dataset::{tags, Dataset};

/// Character repertoire used for text values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterSet {
    /// One byte per character (default repertoire, ISO_IR 100, ...)
    #[default]
    Latin1,
    /// ISO_IR 192
    Utf8,
}

impl CharacterSet {
    /// Resolve the defined terms of (0008,0005)
    pub fn from_terms(terms: &[String]) -> Self {
        match terms.first().map(|term| term.trim()) {
            Some("ISO_IR 192") => CharacterSet::Utf8,
            _ => CharacterSet::Latin1,
        }
    }

    /// Character set declared by the dataset itself, if any
    pub fn declared_by(dataset: &Dataset) -> Option<Self> {
        dataset
            .get(tags::SPECIFIC_CHARACTER_SET)
            .map(|element| Self::from_terms(element.value.strings().unwrap_or_default()))
    }

    /// Character set in scope for `dataset` when `self` is inherited
    pub fn scoped(self, dataset: &Dataset) -> Self {
        Self::declared_by(dataset).unwrap_or(self)
    }

    /// `None` when the bytes are not valid in this character set
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            CharacterSet::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            CharacterSet::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
        }
    }

    /// Text beyond U+00FF cannot be held in one byte per character and is
    /// written as UTF-8 instead
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            CharacterSet::Latin1 => text
                .chars()
                .map(u8::try_from)
                .collect::<std::result::Result<Vec<u8>, _>>()
                .unwrap_or_else(|_| text.as_bytes().to_vec()),
            CharacterSet::Utf8 => text.as_bytes().to_vec(),
        }
    }
}
