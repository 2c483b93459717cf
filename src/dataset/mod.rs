//! In-memory datasets
//!
//! A [`Dataset`] is an ordered map from [`Tag`] to [`Element`]. Iteration
//! order is ascending tag order, which is the order the encoder writes.

mod tag;
pub mod tags;
pub mod uid;
mod value;
mod vr;

use std::collections::btree_map;
use std::collections::BTreeMap;

pub use tag::Tag;
pub use value::{Element, Value};
pub use vr::Vr;

/// An ordered collection of elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    elements: BTreeMap<Tag, Element>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.get(&tag)
    }

    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut Element> {
        self.elements.get_mut(&tag)
    }

    /// Insert an element, returning the one it replaced
    pub fn insert(&mut self, tag: Tag, element: Element) -> Option<Element> {
        self.elements.insert(tag, element)
    }

    /// Insert a value using the dictionary VR for `tag`
    pub fn put(&mut self, tag: Tag, value: impl Into<Value>) -> Option<Element> {
        self.insert(tag, Element::new(tags::vr_of(tag), value))
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Element> {
        self.elements.remove(&tag)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Tag, Element> {
        self.elements.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.elements.keys().copied()
    }

    /// Elements of a single group
    pub fn group(&self, group: u16) -> impl Iterator<Item = (&Tag, &Element)> {
        self.elements
            .range(Tag::new(group, 0x0000)..=Tag::new(group, 0xFFFF))
    }

    /// Drop every element of `group`
    pub fn remove_group(&mut self, group: u16) {
        self.elements.retain(|tag, _| tag.group() != group);
    }

    /// Drop every group length element; they go stale as soon as a value changes
    pub fn remove_group_lengths(&mut self) {
        self.elements.retain(|tag, _| !tag.is_group_length());
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    pub fn value(&self, tag: Tag) -> Option<&Value> {
        self.get(tag).map(|element| &element.value)
    }

    /// First string value of `tag`
    pub fn string(&self, tag: Tag) -> Option<&str> {
        self.value(tag).and_then(Value::as_str)
    }

    /// All string values of `tag`
    pub fn strings(&self, tag: Tag) -> Option<&[String]> {
        self.value(tag).and_then(Value::strings)
    }

    pub fn u32(&self, tag: Tag) -> Option<u32> {
        self.value(tag).and_then(Value::as_u32)
    }

    pub fn u16(&self, tag: Tag) -> Option<u16> {
        self.value(tag).and_then(Value::as_u16)
    }

    pub fn items(&self, tag: Tag) -> Option<&[Dataset]> {
        self.value(tag).and_then(Value::items)
    }
}

impl FromIterator<(Tag, Element)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (Tag, Element)>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Dataset {
    type Item = (Tag, Element);
    type IntoIter = btree_map::IntoIter<Tag, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = (&'a Tag, &'a Element);
    type IntoIter = btree_map::Iter<'a, Tag, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
