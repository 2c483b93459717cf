//! Element tags
//!
//! A tag is the (group, element) pair identifying one field of a dataset.

use std::fmt;

/// A DICOM element tag
///
/// Ordering is by group, then element, which is also the order elements
/// must appear in an encoded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u16, pub u16);

impl Tag {
    pub const fn new(group: u16, element: u16) -> Self {
        Self(group, element)
    }

    /// Build a tag from its packed `0xGGGGEEEE` form
    pub const fn from_u32(value: u32) -> Self {
        Self((value >> 16) as u16, (value & 0xFFFF) as u16)
    }

    pub const fn to_u32(self) -> u32 {
        ((self.0 as u32) << 16) | self.1 as u32
    }

    pub const fn group(self) -> u16 {
        self.0
    }

    pub const fn element(self) -> u16 {
        self.1
    }

    /// (gggg,0000) group length elements
    pub const fn is_group_length(self) -> bool {
        self.1 == 0
    }

    /// Odd groups are private
    pub const fn is_private(self) -> bool {
        self.0 % 2 == 1
    }

    /// Keyword from the built-in dictionary, or `"Unknown"`
    pub fn keyword(self) -> &'static str {
        super::tags::keyword(self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}
