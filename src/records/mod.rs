//! Directory record types
//!
//! Every directory record carries a Directory Record Type (0004,1430).
//! The type decides three things:
//!
//! - the node's uniqueness key within its siblings
//! - the File ID component prefix
//! - the fields copied from a managed file into a new record
//!
//! ```text
//! four-level:    PATIENT ─► STUDY ─► SERIES ─► <leaf type>
//! single-level:  <leaf type>   (HANGING PROTOCOL, PALETTE, IMPLANT*)
//! ```

mod factory;
mod fields;
pub mod sop_class;

use std::fmt;

pub use factory::{standard_record, RecordBuilder, RecordFactory};
pub use fields::{FieldSpec, Presence};

use crate::dataset::{tags, Tag};

/// Directory Record Type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    // -------------------------------------------------------------------------
    // Four-level branches
    // -------------------------------------------------------------------------
    Patient,
    Study,
    Series,

    // -------------------------------------------------------------------------
    // Four-level leaves
    // -------------------------------------------------------------------------
    Image,
    RtDose,
    RtStructureSet,
    RtPlan,
    RtTreatRecord,
    Presentation,
    Waveform,
    SrDocument,
    KeyObjectDoc,
    Spectroscopy,
    RawData,
    Registration,
    Fiducial,
    EncapDoc,
    ValueMap,
    Stereometric,
    Plan,
    Measurement,
    Surface,
    SurfaceScan,
    Tract,
    Assessment,
    Radiotherapy,

    // -------------------------------------------------------------------------
    // Single-level leaves
    // -------------------------------------------------------------------------
    HangingProtocol,
    Palette,
    Implant,
    ImplantAssy,
    ImplantGroup,

    // -------------------------------------------------------------------------
    // Caller defined
    // -------------------------------------------------------------------------
    Private,
    /// Retired or otherwise unrecognised types read from existing File-sets
    Other(String),
}

/// Every type with a standard builder, in declaration order
pub const STANDARD_TYPES: &[RecordType] = &[
    RecordType::Patient,
    RecordType::Study,
    RecordType::Series,
    RecordType::Image,
    RecordType::RtDose,
    RecordType::RtStructureSet,
    RecordType::RtPlan,
    RecordType::RtTreatRecord,
    RecordType::Presentation,
    RecordType::Waveform,
    RecordType::SrDocument,
    RecordType::KeyObjectDoc,
    RecordType::Spectroscopy,
    RecordType::RawData,
    RecordType::Registration,
    RecordType::Fiducial,
    RecordType::EncapDoc,
    RecordType::ValueMap,
    RecordType::Stereometric,
    RecordType::Plan,
    RecordType::Measurement,
    RecordType::Surface,
    RecordType::SurfaceScan,
    RecordType::Tract,
    RecordType::Assessment,
    RecordType::Radiotherapy,
    RecordType::HangingProtocol,
    RecordType::Palette,
    RecordType::Implant,
    RecordType::ImplantAssy,
    RecordType::ImplantGroup,
];

impl RecordType {
    /// Parse a (0004,1430) value; unknown values become [`RecordType::Other`]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "PATIENT" => RecordType::Patient,
            "STUDY" => RecordType::Study,
            "SERIES" => RecordType::Series,
            "IMAGE" => RecordType::Image,
            "RT DOSE" => RecordType::RtDose,
            "RT STRUCTURE SET" => RecordType::RtStructureSet,
            "RT PLAN" => RecordType::RtPlan,
            "RT TREAT RECORD" => RecordType::RtTreatRecord,
            "PRESENTATION" => RecordType::Presentation,
            "WAVEFORM" => RecordType::Waveform,
            "SR DOCUMENT" => RecordType::SrDocument,
            "KEY OBJECT DOC" => RecordType::KeyObjectDoc,
            "SPECTROSCOPY" => RecordType::Spectroscopy,
            "RAW DATA" => RecordType::RawData,
            "REGISTRATION" => RecordType::Registration,
            "FIDUCIAL" => RecordType::Fiducial,
            "ENCAP DOC" => RecordType::EncapDoc,
            "VALUE MAP" => RecordType::ValueMap,
            "STEREOMETRIC" => RecordType::Stereometric,
            "PLAN" => RecordType::Plan,
            "MEASUREMENT" => RecordType::Measurement,
            "SURFACE" => RecordType::Surface,
            "SURFACE SCAN" => RecordType::SurfaceScan,
            "TRACT" => RecordType::Tract,
            "ASSESSMENT" => RecordType::Assessment,
            "RADIOTHERAPY" => RecordType::Radiotherapy,
            "HANGING PROTOCOL" => RecordType::HangingProtocol,
            "PALETTE" => RecordType::Palette,
            "IMPLANT" => RecordType::Implant,
            "IMPLANT ASSY" => RecordType::ImplantAssy,
            "IMPLANT GROUP" => RecordType::ImplantGroup,
            "PRIVATE" => RecordType::Private,
            other => RecordType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Patient => "PATIENT",
            RecordType::Study => "STUDY",
            RecordType::Series => "SERIES",
            RecordType::Image => "IMAGE",
            RecordType::RtDose => "RT DOSE",
            RecordType::RtStructureSet => "RT STRUCTURE SET",
            RecordType::RtPlan => "RT PLAN",
            RecordType::RtTreatRecord => "RT TREAT RECORD",
            RecordType::Presentation => "PRESENTATION",
            RecordType::Waveform => "WAVEFORM",
            RecordType::SrDocument => "SR DOCUMENT",
            RecordType::KeyObjectDoc => "KEY OBJECT DOC",
            RecordType::Spectroscopy => "SPECTROSCOPY",
            RecordType::RawData => "RAW DATA",
            RecordType::Registration => "REGISTRATION",
            RecordType::Fiducial => "FIDUCIAL",
            RecordType::EncapDoc => "ENCAP DOC",
            RecordType::ValueMap => "VALUE MAP",
            RecordType::Stereometric => "STEREOMETRIC",
            RecordType::Plan => "PLAN",
            RecordType::Measurement => "MEASUREMENT",
            RecordType::Surface => "SURFACE",
            RecordType::SurfaceScan => "SURFACE SCAN",
            RecordType::Tract => "TRACT",
            RecordType::Assessment => "ASSESSMENT",
            RecordType::Radiotherapy => "RADIOTHERAPY",
            RecordType::HangingProtocol => "HANGING PROTOCOL",
            RecordType::Palette => "PALETTE",
            RecordType::Implant => "IMPLANT",
            RecordType::ImplantAssy => "IMPLANT ASSY",
            RecordType::ImplantGroup => "IMPLANT GROUP",
            RecordType::Private => "PRIVATE",
            RecordType::Other(name) => name,
        }
    }

    /// Two letter File ID prefix
    ///
    /// `None` for PRIVATE and unrecognised types, whose prefix is `P`
    /// followed by the node depth.
    pub fn prefix(&self) -> Option<&'static str> {
        let prefix = match self {
            RecordType::Patient => "PT",
            RecordType::Study => "ST",
            RecordType::Series => "SE",
            RecordType::Image => "IM",
            RecordType::RtDose => "RD",
            RecordType::RtStructureSet => "RS",
            RecordType::RtPlan => "RP",
            RecordType::RtTreatRecord => "RX",
            RecordType::Presentation => "PR",
            RecordType::Waveform => "WV",
            RecordType::SrDocument => "SR",
            RecordType::KeyObjectDoc => "KY",
            RecordType::Spectroscopy => "SP",
            RecordType::RawData => "RW",
            RecordType::Registration => "RG",
            RecordType::Fiducial => "FD",
            RecordType::EncapDoc => "ED",
            RecordType::ValueMap => "VM",
            RecordType::Stereometric => "SX",
            RecordType::Plan => "PL",
            RecordType::Measurement => "MX",
            RecordType::Surface => "SF",
            RecordType::SurfaceScan => "SS",
            RecordType::Tract => "TR",
            RecordType::Assessment => "AS",
            RecordType::Radiotherapy => "RT",
            RecordType::HangingProtocol => "HG",
            RecordType::Palette => "PA",
            RecordType::Implant => "IP",
            RecordType::ImplantAssy => "IA",
            RecordType::ImplantGroup => "IG",
            RecordType::Private | RecordType::Other(_) => return None,
        };
        Some(prefix)
    }

    /// Prefix for a node of this type at `depth` (0 for root-level records)
    pub fn prefix_at(&self, depth: usize) -> String {
        match self.prefix() {
            Some(prefix) => prefix.to_string(),
            None => format!("P{}", depth),
        }
    }

    /// Tags supplying the uniqueness key, in order of preference
    pub fn key_tags(&self) -> &'static [Tag] {
        match self {
            RecordType::Patient => &[tags::PATIENT_ID],
            RecordType::Study => &[
                tags::STUDY_INSTANCE_UID,
                tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE,
            ],
            RecordType::Series => &[tags::SERIES_INSTANCE_UID],
            RecordType::Private => &[tags::PRIVATE_RECORD_UID],
            _ => &[tags::REFERENCED_SOP_INSTANCE_UID_IN_FILE],
        }
    }

    /// Types that appear at the top of a one-record chain
    pub fn is_single_level(&self) -> bool {
        matches!(
            self,
            RecordType::HangingProtocol
                | RecordType::Palette
                | RecordType::Implant
                | RecordType::ImplantAssy
                | RecordType::ImplantGroup
        )
    }

    /// Fields copied into a new record by the standard builder
    pub fn fields(&self) -> &'static [FieldSpec] {
        fields::fields_for(self)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
