//! Per-type field tables for the standard record builders

use crate::dataset::{tags, Tag};

use super::RecordType;

/// How a field is copied from the managed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present with a value
    Required,
    /// Copied when present, otherwise written with zero length
    Type2,
    /// Copied only when present, and then must have a value
    Conditional,
}

/// One field of a standard record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub tag: Tag,
    pub presence: Presence,
}

const fn req(tag: Tag) -> FieldSpec {
    FieldSpec {
        tag,
        presence: Presence::Required,
    }
}

const fn opt(tag: Tag) -> FieldSpec {
    FieldSpec {
        tag,
        presence: Presence::Type2,
    }
}

const fn cond(tag: Tag) -> FieldSpec {
    FieldSpec {
        tag,
        presence: Presence::Conditional,
    }
}

const PATIENT: &[FieldSpec] = &[req(tags::PATIENT_ID), opt(tags::PATIENT_NAME)];

const STUDY: &[FieldSpec] = &[
    req(tags::STUDY_DATE),
    req(tags::STUDY_TIME),
    req(tags::STUDY_ID),
    opt(tags::STUDY_DESCRIPTION),
    opt(tags::ACCESSION_NUMBER),
    cond(tags::STUDY_INSTANCE_UID),
];

const SERIES: &[FieldSpec] = &[
    req(tags::MODALITY),
    req(tags::SERIES_INSTANCE_UID),
    req(tags::SERIES_NUMBER),
];

const IMAGE: &[FieldSpec] = &[req(tags::INSTANCE_NUMBER)];

const RT_DOSE: &[FieldSpec] = &[req(tags::INSTANCE_NUMBER), req(tags::DOSE_SUMMATION_TYPE)];

const RT_STRUCTURE_SET: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::STRUCTURE_SET_LABEL),
    opt(tags::STRUCTURE_SET_DATE),
    opt(tags::STRUCTURE_SET_TIME),
];

const RT_PLAN: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::RT_PLAN_LABEL),
    opt(tags::RT_PLAN_DATE),
    opt(tags::RT_PLAN_TIME),
];

const RT_TREAT_RECORD: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    opt(tags::TREATMENT_DATE),
    opt(tags::TREATMENT_TIME),
];

const PRESENTATION: &[FieldSpec] = &[
    req(tags::PRESENTATION_CREATION_DATE),
    req(tags::PRESENTATION_CREATION_TIME),
    req(tags::INSTANCE_NUMBER),
    req(tags::CONTENT_LABEL),
    opt(tags::CONTENT_DESCRIPTION),
    opt(tags::CONTENT_CREATOR_NAME),
    cond(tags::REFERENCED_SERIES_SEQUENCE),
    cond(tags::BLENDING_SEQUENCE),
];

const SR_DOCUMENT: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::COMPLETION_FLAG),
    req(tags::VERIFICATION_FLAG),
    req(tags::CONTENT_DATE),
    req(tags::CONTENT_TIME),
    req(tags::CONCEPT_NAME_CODE_SEQUENCE),
    cond(tags::VERIFICATION_DATE_TIME),
    cond(tags::CONTENT_SEQUENCE),
];

const KEY_OBJECT_DOC: &[FieldSpec] = &[
    req(tags::CONTENT_DATE),
    req(tags::CONTENT_TIME),
    req(tags::INSTANCE_NUMBER),
    req(tags::CONCEPT_NAME_CODE_SEQUENCE),
    cond(tags::CONTENT_SEQUENCE),
];

const SPECTROSCOPY: &[FieldSpec] = &[
    req(tags::IMAGE_TYPE),
    req(tags::CONTENT_DATE),
    req(tags::CONTENT_TIME),
    req(tags::INSTANCE_NUMBER),
    req(tags::NUMBER_OF_FRAMES),
    req(tags::ROWS),
    req(tags::COLUMNS),
    req(tags::DATA_POINT_ROWS),
    req(tags::DATA_POINT_COLUMNS),
    cond(tags::REFERENCED_IMAGE_EVIDENCE_SEQUENCE),
];

const HANGING_PROTOCOL: &[FieldSpec] = &[
    req(tags::HANGING_PROTOCOL_CREATOR),
    req(tags::HANGING_PROTOCOL_CREATION_DATE_TIME),
    req(tags::HANGING_PROTOCOL_DEFINITION_SEQUENCE),
    req(tags::NUMBER_OF_PRIORS_REFERENCED),
    opt(tags::HANGING_PROTOCOL_USER_IDENTIFICATION_CODE_SEQUENCE),
];

const ENCAP_DOC: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::MIME_TYPE_OF_ENCAPSULATED_DOCUMENT),
    opt(tags::CONTENT_DATE),
    opt(tags::CONTENT_TIME),
    opt(tags::DOCUMENT_TITLE),
    opt(tags::CONCEPT_NAME_CODE_SEQUENCE),
    cond(tags::HL7_INSTANCE_IDENTIFIER),
];

const PALETTE: &[FieldSpec] = &[req(tags::CONTENT_LABEL), opt(tags::CONTENT_DESCRIPTION)];

const IMPLANT: &[FieldSpec] = &[
    req(tags::MANUFACTURER),
    req(tags::IMPLANT_NAME),
    req(tags::IMPLANT_PART_NUMBER),
    cond(tags::IMPLANT_SIZE),
];

const IMPLANT_ASSY: &[FieldSpec] = &[
    req(tags::IMPLANT_ASSEMBLY_TEMPLATE_NAME),
    req(tags::MANUFACTURER),
    req(tags::PROCEDURE_TYPE_CODE_SEQUENCE),
];

const IMPLANT_GROUP: &[FieldSpec] = &[
    req(tags::IMPLANT_TEMPLATE_GROUP_NAME),
    req(tags::IMPLANT_TEMPLATE_GROUP_ISSUER),
];

const SURFACE_SCAN: &[FieldSpec] = &[req(tags::CONTENT_DATE), req(tags::CONTENT_TIME)];

const ASSESSMENT: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::INSTANCE_CREATION_DATE),
    opt(tags::INSTANCE_CREATION_TIME),
];

const RADIOTHERAPY: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    cond(tags::USER_CONTENT_LABEL),
    cond(tags::USER_CONTENT_LONG_LABEL),
    opt(tags::CONTENT_DESCRIPTION),
    opt(tags::CONTENT_CREATOR_NAME),
];

/// WAVEFORM, RAW DATA
const GENERIC_CONTENT: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::CONTENT_DATE),
    req(tags::CONTENT_TIME),
];

/// REGISTRATION, FIDUCIAL, VALUE MAP, MEASUREMENT, SURFACE, TRACT
const GENERIC_CONTENT_ID: &[FieldSpec] = &[
    req(tags::INSTANCE_NUMBER),
    req(tags::CONTENT_DATE),
    req(tags::CONTENT_TIME),
    req(tags::CONTENT_LABEL),
    opt(tags::CONTENT_DESCRIPTION),
    opt(tags::CONTENT_CREATOR_NAME),
];

pub(super) fn fields_for(record_type: &RecordType) -> &'static [FieldSpec] {
    match record_type {
        RecordType::Patient => PATIENT,
        RecordType::Study => STUDY,
        RecordType::Series => SERIES,
        RecordType::Image => IMAGE,
        RecordType::RtDose => RT_DOSE,
        RecordType::RtStructureSet => RT_STRUCTURE_SET,
        RecordType::RtPlan => RT_PLAN,
        RecordType::RtTreatRecord => RT_TREAT_RECORD,
        RecordType::Presentation => PRESENTATION,
        RecordType::SrDocument => SR_DOCUMENT,
        RecordType::KeyObjectDoc => KEY_OBJECT_DOC,
        RecordType::Spectroscopy => SPECTROSCOPY,
        RecordType::HangingProtocol => HANGING_PROTOCOL,
        RecordType::EncapDoc => ENCAP_DOC,
        RecordType::Palette => PALETTE,
        RecordType::Implant => IMPLANT,
        RecordType::ImplantAssy => IMPLANT_ASSY,
        RecordType::ImplantGroup => IMPLANT_GROUP,
        RecordType::SurfaceScan => SURFACE_SCAN,
        RecordType::Assessment => ASSESSMENT,
        RecordType::Radiotherapy => RADIOTHERAPY,
        RecordType::Waveform | RecordType::RawData => GENERIC_CONTENT,
        RecordType::Registration
        | RecordType::Fiducial
        | RecordType::ValueMap
        | RecordType::Measurement
        | RecordType::Surface
        | RecordType::Tract => GENERIC_CONTENT_ID,
        RecordType::Stereometric
        | RecordType::Plan
        | RecordType::Private
        | RecordType::Other(_) => &[],
    }
}
