//! SOP Class classification
//!
//! Decides which record chain a managed file gets: a single record for
//! the organisational storage classes, or PATIENT, STUDY, SERIES plus a
//! leaf for everything else.

use crate::dataset::{tags, Dataset};

use super::RecordType;

/// Single-level record type for a SOP Class, if it is one
pub fn single_level(sop_class_uid: &str) -> Option<RecordType> {
    let record_type = match sop_class_uid {
        "1.2.840.10008.5.1.4.38.1" => RecordType::HangingProtocol,
        "1.2.840.10008.5.1.4.39.1" => RecordType::Palette,
        "1.2.840.10008.5.1.4.43.1" => RecordType::Implant,
        "1.2.840.10008.5.1.4.44.1" => RecordType::ImplantAssy,
        "1.2.840.10008.5.1.4.45.1" => RecordType::ImplantGroup,
        _ => return None,
    };
    Some(record_type)
}

/// Leaf record type for a four-level SOP Class, if it is a known one
pub fn four_level(sop_class_uid: &str) -> Option<RecordType> {
    let storage = sop_class_uid.strip_prefix("1.2.840.10008.5.1.4.1.1.")?;
    let record_type = match storage {
        "481.2" => RecordType::RtDose,
        "481.3" => RecordType::RtStructureSet,
        "481.4" | "481.6" | "481.7" | "481.9" => RecordType::RtTreatRecord,
        "11.1" | "11.2" | "11.3" | "11.4" | "11.5" | "131" => RecordType::Presentation,
        "9.1.1" | "9.1.2" | "9.1.3" | "9.2.1" | "9.3.1" | "9.4.1" | "9.4.2" | "9.5.1"
        | "9.6.1" | "9.6.2" | "9.7.1" | "9.7.2" | "9.7.3" | "9.7.4" | "9.8.1" => {
            RecordType::Waveform
        }
        "88.11" | "88.22" | "88.33" | "88.34" | "88.35" | "88.40" | "88.50" | "88.65"
        | "88.67" | "88.68" | "88.69" | "88.70" | "88.71" | "88.72" | "88.73" | "88.74"
        | "88.75" | "78.6" | "79.1" => RecordType::SrDocument,
        "88.59" => RecordType::KeyObjectDoc,
        "4.2" => RecordType::Spectroscopy,
        "66" => RecordType::RawData,
        "66.1" | "66.3" => RecordType::Registration,
        "66.2" => RecordType::Fiducial,
        "67" => RecordType::ValueMap,
        "77.1.5.3" => RecordType::Stereometric,
        "78.1" | "78.2" | "78.3" | "78.4" | "78.5" | "78.7" | "80.1" => {
            RecordType::Measurement
        }
        "66.5" => RecordType::Surface,
        "68.1" | "68.2" => RecordType::SurfaceScan,
        "66.6" => RecordType::Tract,
        "90.1" => RecordType::Assessment,
        _ => return None,
    };
    Some(record_type)
}

/// Leaf record type of a four-level chain for `dataset`
///
/// Modality and the presence of a few elements take precedence over the
/// SOP Class; unknown classes are treated as images.
pub fn four_level_leaf(dataset: &Dataset) -> RecordType {
    match dataset.string(tags::MODALITY) {
        Some("RTINTENT" | "RTSEGANN" | "RTRAD") => return RecordType::Radiotherapy,
        Some("PLAN") => return RecordType::Plan,
        _ => {}
    }

    if dataset.contains(tags::ENCAPSULATED_DOCUMENT) {
        return RecordType::EncapDoc;
    }
    if dataset.contains(tags::RT_PLAN_LABEL) {
        return RecordType::RtPlan;
    }

    dataset
        .string(tags::SOP_CLASS_UID)
        .and_then(four_level)
        .unwrap_or(RecordType::Image)
}
