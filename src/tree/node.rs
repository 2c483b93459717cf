//! Record nodes and record chains

use crate::dataset::{tags, Dataset};
use crate::error::{FileSetError, Result};
use crate::fileset::FileInstance;
use crate::records::RecordType;

use super::NodeId;

/// Value of (0004,1410) for a record in use
pub const RECORD_IN_USE: u16 = 0xFFFF;

/// One directory record and its place in the tree
#[derive(Debug, Clone)]
pub struct RecordNode {
    /// The directory record itself
    record: Dataset,
    /// Parsed (0004,1430)
    record_type: RecordType,
    /// Uniqueness key among siblings
    key: String,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    /// Present on leaves that reference a managed file
    pub(crate) instance: Option<FileInstance>,

    /// File offset of the record's item header. Only valid right after the
    /// directory file was read or written.
    pub(crate) offset: Option<u64>,
}

impl RecordNode {
    /// Wrap a directory record
    ///
    /// The record needs a Directory Record Type and whatever element
    /// supplies its key. Missing pointer elements are added and the record
    /// is marked in use.
    pub fn new(record: Dataset) -> Result<Self> {
        Self::from_record(record, None)
    }

    /// Wrap a record read from a directory file at `offset`
    pub(crate) fn from_record(mut record: Dataset, offset: Option<u64>) -> Result<Self> {
        let description = match record.string(tags::DIRECTORY_RECORD_TYPE) {
            Some(record_type) if !record_type.is_empty() => format!("The {} directory record", record_type),
            _ => "The directory record".to_string(),
        };
        let description = match offset {
            Some(offset) => format!("{} at offset {}", description, offset),
            None => description,
        };

        let record_type = record
            .string(tags::DIRECTORY_RECORD_TYPE)
            .filter(|value| !value.is_empty())
            .map(RecordType::parse)
            .ok_or_else(|| {
                FileSetError::Validation(format!(
                    "{} is missing one or more required elements: DirectoryRecordType",
                    description
                ))
            })?;

        let key_tags = record_type.key_tags();
        let key = key_tags
            .iter()
            .find_map(|tag| record.string(*tag).filter(|value| !value.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| {
                let names: Vec<&str> = key_tags.iter().map(|tag| tag.keyword()).collect();
                FileSetError::Validation(format!(
                    "{} is missing a required element: {}",
                    description,
                    names.join(" or ")
                ))
            })?;

        record.remove_group_lengths();
        if !record.contains(tags::OFFSET_OF_NEXT_RECORD) {
            record.put(tags::OFFSET_OF_NEXT_RECORD, 0u32);
        }
        if !record.contains(tags::OFFSET_OF_LOWER_LEVEL_ENTITY) {
            record.put(tags::OFFSET_OF_LOWER_LEVEL_ENTITY, 0u32);
        }
        record.put(tags::RECORD_IN_USE_FLAG, RECORD_IN_USE);

        Ok(Self {
            record,
            record_type,
            key,
            parent: None,
            children: Vec::new(),
            instance: None,
            offset,
        })
    }

    pub fn record(&self) -> &Dataset {
        &self.record
    }

    /// Mutable access for fields that do not affect the key
    pub(crate) fn record_mut(&mut self) -> &mut Dataset {
        &mut self.record
    }

    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn instance(&self) -> Option<&FileInstance> {
        self.instance.as_ref()
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Stored (0004,1500) components, if any
    pub fn referenced_file_id(&self) -> Option<&[String]> {
        self.record
            .strings(tags::REFERENCED_FILE_ID)
            .filter(|components| !components.is_empty())
    }
}

/// An ancestor-to-leaf run of nodes waiting to be added to a tree
#[derive(Debug, Clone)]
pub struct RecordChain {
    /// Top first
    ancestors: Vec<RecordNode>,
    leaf: RecordNode,
}

impl RecordChain {
    /// A chain holding only its leaf
    pub fn new(leaf: RecordNode) -> Self {
        Self {
            ancestors: Vec::new(),
            leaf,
        }
    }

    /// Build a chain from records ordered top first
    pub fn from_records(records: Vec<Dataset>) -> Result<Self> {
        let mut nodes = records
            .into_iter()
            .map(RecordNode::new)
            .collect::<Result<Vec<_>>>()?;
        let leaf = nodes.pop().ok_or_else(|| {
            FileSetError::Validation("a record chain needs at least one record".to_string())
        })?;
        Ok(Self {
            ancestors: nodes,
            leaf,
        })
    }

    /// Put `parent` above the current top of the chain
    pub fn with_parent(mut self, parent: RecordNode) -> Self {
        self.ancestors.insert(0, parent);
        self
    }

    /// Number of records including the leaf
    pub fn len(&self) -> usize {
        self.ancestors.len() + 1
    }

    pub fn ancestors(&self) -> &[RecordNode] {
        &self.ancestors
    }

    pub fn leaf(&self) -> &RecordNode {
        &self.leaf
    }

    pub(crate) fn leaf_mut(&mut self) -> &mut RecordNode {
        &mut self.leaf
    }

    pub(crate) fn into_parts(self) -> (Vec<RecordNode>, RecordNode) {
        (self.ancestors, self.leaf)
    }
}
