//! Record factory
//!
//! Turns a managed file into the chain of directory records that
//! references it. Builders can be swapped per record type on a factory
//! value; nothing here is global.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::DicomFile;
use crate::dataset::{tags, Dataset, Element, Tag, Vr};
use crate::error::{FileSetError, Result};
use crate::file_id::MAX_DEPTH;
use crate::tree::{RecordChain, RECORD_IN_USE};

use super::{sop_class, Presence, RecordType};

/// Builds the type-specific part of a directory record from a dataset
pub type RecordBuilder = Arc<dyn Fn(&Dataset) -> Result<Dataset> + Send + Sync>;

/// Record builder registry
#[derive(Clone, Default)]
pub struct RecordFactory {
    /// Replacements for the standard builders
    overrides: HashMap<RecordType, RecordBuilder>,
}

impl RecordFactory {
    /// A factory using the standard builder for every type
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the builder for one record type
    pub fn with_builder<F>(mut self, record_type: RecordType, builder: F) -> Self
    where
        F: Fn(&Dataset) -> Result<Dataset> + Send + Sync + 'static,
    {
        self.set_builder(record_type, builder);
        self
    }

    pub fn set_builder<F>(&mut self, record_type: RecordType, builder: F)
    where
        F: Fn(&Dataset) -> Result<Dataset> + Send + Sync + 'static,
    {
        self.overrides.insert(record_type, Arc::new(builder));
    }

    /// Go back to the standard builder for `record_type`
    pub fn reset_builder(&mut self, record_type: &RecordType) {
        self.overrides.remove(record_type);
    }

    /// Build the type-specific fields of a record
    pub fn build_record(&self, record_type: &RecordType, dataset: &Dataset) -> Result<Dataset> {
        match self.overrides.get(record_type) {
            Some(builder) => builder(dataset),
            None => standard_record(record_type, dataset),
        }
    }

    /// Record types of the chain for `dataset`, top first
    pub fn classify(dataset: &Dataset) -> Vec<RecordType> {
        let single = dataset
            .string(tags::SOP_CLASS_UID)
            .and_then(sop_class::single_level);
        match single {
            Some(record_type) => vec![record_type],
            None => vec![
                RecordType::Patient,
                RecordType::Study,
                RecordType::Series,
                sop_class::four_level_leaf(dataset),
            ],
        }
    }

    /// Build the full chain of records for a managed file
    ///
    /// Fails before anything is created if a required field is missing.
    pub fn build_chain(&self, file: &DicomFile) -> Result<RecordChain> {
        let dataset = &file.dataset;
        let references = FileReference::from_file(file)?;
        let types = Self::classify(dataset);

        let mut records = Vec::with_capacity(types.len());
        for record_type in &types {
            let mut record = self.build_record(record_type, dataset)?;
            record.put(tags::OFFSET_OF_NEXT_RECORD, 0u32);
            record.put(tags::RECORD_IN_USE_FLAG, RECORD_IN_USE);
            record.put(tags::OFFSET_OF_LOWER_LEVEL_ENTITY, 0u32);
            record.put(tags::DIRECTORY_RECORD_TYPE, record_type.as_str());
            // Text copied from the file is encoded with the file's character set
            if let Some(charset) = dataset.get(tags::SPECIFIC_CHARACTER_SET) {
                record.insert(tags::SPECIFIC_CHARACTER_SET, charset.clone());
            }
            records.push(record);
        }

        if let Some(leaf) = records.last_mut() {
            references.stamp(leaf, true);
        }
        RecordChain::from_records(records)
    }

    /// Build a chain from caller-supplied records, top first
    ///
    /// The leaf gets the referenced-file fields it does not already have;
    /// everything else is used as given. At most eight levels are allowed
    /// since each level becomes one File ID component.
    pub fn custom_chain(&self, mut records: Vec<Dataset>, file: &DicomFile) -> Result<RecordChain> {
        if records.len() > MAX_DEPTH {
            return Err(FileSetError::Validation(format!(
                "the leaf record must not have more than {} ancestors as File IDs are limited to {} components",
                MAX_DEPTH - 1,
                MAX_DEPTH
            )));
        }
        let references = FileReference::from_file(file)?;
        match records.last_mut() {
            Some(leaf) => references.stamp(leaf, false),
            None => {
                return Err(FileSetError::Validation(
                    "a custom record chain needs a leaf record".to_string(),
                ))
            }
        }
        RecordChain::from_records(records)
    }
}

impl fmt::Debug for RecordFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overridden: Vec<&str> = self.overrides.keys().map(RecordType::as_str).collect();
        overridden.sort_unstable();
        f.debug_struct("RecordFactory")
            .field("overrides", &overridden)
            .finish()
    }
}

/// The three UIDs a leaf record uses to reference its file
struct FileReference {
    sop_class_uid: String,
    sop_instance_uid: String,
    transfer_syntax_uid: String,
}

impl FileReference {
    fn from_file(file: &DicomFile) -> Result<Self> {
        let context = "Unable to reference the instance from a directory record";
        let required = |value: Option<&str>, tag: Tag| -> Result<String> {
            match value {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                Some(_) => Err(FileSetError::EmptyElement {
                    context: context.to_string(),
                    tag,
                    keyword: tag.keyword(),
                }),
                None => Err(FileSetError::MissingElement {
                    context: context.to_string(),
                    tag,
                    keyword: tag.keyword(),
                }),
            }
        };

        Ok(Self {
            sop_class_uid: required(file.dataset.string(tags::SOP_CLASS_UID), tags::SOP_CLASS_UID)?,
            sop_instance_uid: required(
                file.dataset.string(tags::SOP_INSTANCE_UID),
                tags::SOP_INSTANCE_UID,
            )?,
            transfer_syntax_uid: required(file.transfer_syntax_uid(), tags::TRANSFER_SYNTAX_UID)?,
        })
    }

    fn stamp(&self, record: &mut Dataset, overwrite: bool) {
        let fields = [
            (tags::REFERENCED_SOP_CLASS_UID_IN_FILE, &self.sop_class_uid),
            (tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE, &self.sop_instance_uid),
            (tags::REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE, &self.transfer_syntax_uid),
        ];
        for (tag, value) in fields {
            if overwrite || !record.contains(tag) {
                record.put(tag, value.as_str());
            }
        }
        if overwrite || !record.contains(tags::REFERENCED_FILE_ID) {
            record.insert(tags::REFERENCED_FILE_ID, Element::empty(Vr::CS));
        }
        for tag in [tags::OFFSET_OF_NEXT_RECORD, tags::OFFSET_OF_LOWER_LEVEL_ENTITY] {
            if !record.contains(tag) {
                record.put(tag, 0u32);
            }
        }
        record.put(tags::RECORD_IN_USE_FLAG, RECORD_IN_USE);
    }
}

/// Build a record from the standard field table for `record_type`
pub fn standard_record(record_type: &RecordType, dataset: &Dataset) -> Result<Dataset> {
    let context = || format!("Unable to use the default '{}' record creator", record_type);

    let mut record = Dataset::new();
    for field in record_type.fields() {
        match (field.presence, dataset.get(field.tag)) {
            (Presence::Required, None) => {
                return Err(FileSetError::MissingElement {
                    context: context(),
                    tag: field.tag,
                    keyword: field.tag.keyword(),
                })
            }
            (Presence::Required | Presence::Conditional, Some(element)) if element.is_empty() => {
                return Err(FileSetError::EmptyElement {
                    context: context(),
                    tag: field.tag,
                    keyword: field.tag.keyword(),
                })
            }
            (_, Some(element)) => {
                record.insert(field.tag, element.clone());
            }
            (Presence::Type2, None) => {
                record.insert(field.tag, Element::empty(tags::vr_of(field.tag)));
            }
            (Presence::Conditional, None) => {}
        }
    }
    Ok(record)
}
