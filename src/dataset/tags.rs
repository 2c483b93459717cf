//! Built-in data dictionary
//!
//! Lists the file meta group, the Media Storage Directory module, every
//! key the default record builders copy, and the optional keys commonly
//! found in directory records and their icon images. The dictionary
//! supplies the VR when decoding implicit VR data and when a value is set
//! without one.

use super::{Tag, Vr};

/// One dictionary entry
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub tag: Tag,
    pub vr: Vr,
    pub keyword: &'static str,
}

macro_rules! dictionary {
    ($( $name:ident = ($group:literal, $element:literal), $vr:ident, $keyword:literal; )*) => {
        $(
            #[doc = $keyword]
            pub const $name: Tag = Tag::new($group, $element);
        )*

        static DICTIONARY: &[Entry] = &[
            $( Entry { tag: $name, vr: Vr::$vr, keyword: $keyword }, )*
        ];
    };
}

dictionary! {
    // File Meta Information
    FILE_META_INFORMATION_GROUP_LENGTH = (0x0002, 0x0000), UL, "FileMetaInformationGroupLength";
    FILE_META_INFORMATION_VERSION = (0x0002, 0x0001), OB, "FileMetaInformationVersion";
    MEDIA_STORAGE_SOP_CLASS_UID = (0x0002, 0x0002), UI, "MediaStorageSOPClassUID";
    MEDIA_STORAGE_SOP_INSTANCE_UID = (0x0002, 0x0003), UI, "MediaStorageSOPInstanceUID";
    TRANSFER_SYNTAX_UID = (0x0002, 0x0010), UI, "TransferSyntaxUID";
    IMPLEMENTATION_CLASS_UID = (0x0002, 0x0012), UI, "ImplementationClassUID";
    IMPLEMENTATION_VERSION_NAME = (0x0002, 0x0013), SH, "ImplementationVersionName";

    // Media Storage Directory
    FILE_SET_ID = (0x0004, 0x1130), CS, "FileSetID";
    FILE_SET_DESCRIPTOR_FILE_ID = (0x0004, 0x1141), CS, "FileSetDescriptorFileID";
    SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE = (0x0004, 0x1142), CS, "SpecificCharacterSetOfFileSetDescriptorFile";
    OFFSET_OF_FIRST_ROOT_RECORD = (0x0004, 0x1200), UL, "OffsetOfTheFirstDirectoryRecordOfTheRootDirectoryEntity";
    OFFSET_OF_LAST_ROOT_RECORD = (0x0004, 0x1202), UL, "OffsetOfTheLastDirectoryRecordOfTheRootDirectoryEntity";
    FILE_SET_CONSISTENCY_FLAG = (0x0004, 0x1212), US, "FileSetConsistencyFlag";
    DIRECTORY_RECORD_SEQUENCE = (0x0004, 0x1220), SQ, "DirectoryRecordSequence";
    OFFSET_OF_NEXT_RECORD = (0x0004, 0x1400), UL, "OffsetOfTheNextDirectoryRecord";
    RECORD_IN_USE_FLAG = (0x0004, 0x1410), US, "RecordInUseFlag";
    OFFSET_OF_LOWER_LEVEL_ENTITY = (0x0004, 0x1420), UL, "OffsetOfReferencedLowerLevelDirectoryEntity";
    DIRECTORY_RECORD_TYPE = (0x0004, 0x1430), CS, "DirectoryRecordType";
    PRIVATE_RECORD_UID = (0x0004, 0x1432), UI, "PrivateRecordUID";
    REFERENCED_FILE_ID = (0x0004, 0x1500), CS, "ReferencedFileID";
    REFERENCED_SOP_CLASS_UID_IN_FILE = (0x0004, 0x1510), UI, "ReferencedSOPClassUIDInFile";
    REFERENCED_SOP_INSTANCE_UID_IN_FILE = (0x0004, 0x1511), UI, "ReferencedSOPInstanceUIDInFile";
    REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE = (0x0004, 0x1512), UI, "ReferencedTransferSyntaxUIDInFile";

    // SOP Common / General
    SPECIFIC_CHARACTER_SET = (0x0008, 0x0005), CS, "SpecificCharacterSet";
    IMAGE_TYPE = (0x0008, 0x0008), CS, "ImageType";
    INSTANCE_CREATION_DATE = (0x0008, 0x0012), DA, "InstanceCreationDate";
    INSTANCE_CREATION_TIME = (0x0008, 0x0013), TM, "InstanceCreationTime";
    INSTANCE_CREATOR_UID = (0x0008, 0x0014), UI, "InstanceCreatorUID";
    SOP_CLASS_UID = (0x0008, 0x0016), UI, "SOPClassUID";
    SOP_INSTANCE_UID = (0x0008, 0x0018), UI, "SOPInstanceUID";
    STUDY_DATE = (0x0008, 0x0020), DA, "StudyDate";
    SERIES_DATE = (0x0008, 0x0021), DA, "SeriesDate";
    ACQUISITION_DATE = (0x0008, 0x0022), DA, "AcquisitionDate";
    CONTENT_DATE = (0x0008, 0x0023), DA, "ContentDate";
    STUDY_TIME = (0x0008, 0x0030), TM, "StudyTime";
    SERIES_TIME = (0x0008, 0x0031), TM, "SeriesTime";
    ACQUISITION_TIME = (0x0008, 0x0032), TM, "AcquisitionTime";
    CONTENT_TIME = (0x0008, 0x0033), TM, "ContentTime";
    ACCESSION_NUMBER = (0x0008, 0x0050), SH, "AccessionNumber";
    MODALITY = (0x0008, 0x0060), CS, "Modality";
    MANUFACTURER = (0x0008, 0x0070), LO, "Manufacturer";
    INSTITUTION_NAME = (0x0008, 0x0080), LO, "InstitutionName";
    INSTITUTION_ADDRESS = (0x0008, 0x0081), ST, "InstitutionAddress";
    REFERRING_PHYSICIAN_NAME = (0x0008, 0x0090), PN, "ReferringPhysicianName";
    CODE_VALUE = (0x0008, 0x0100), SH, "CodeValue";
    CODING_SCHEME_DESIGNATOR = (0x0008, 0x0102), SH, "CodingSchemeDesignator";
    CODE_MEANING = (0x0008, 0x0104), LO, "CodeMeaning";
    STATION_NAME = (0x0008, 0x1010), SH, "StationName";
    STUDY_DESCRIPTION = (0x0008, 0x1030), LO, "StudyDescription";
    SERIES_DESCRIPTION = (0x0008, 0x103E), LO, "SeriesDescription";
    INSTITUTIONAL_DEPARTMENT_NAME = (0x0008, 0x1040), LO, "InstitutionalDepartmentName";
    PERFORMING_PHYSICIAN_NAME = (0x0008, 0x1050), PN, "PerformingPhysicianName";
    NAME_OF_PHYSICIANS_READING_STUDY = (0x0008, 0x1060), PN, "NameOfPhysiciansReadingStudy";
    OPERATORS_NAME = (0x0008, 0x1070), PN, "OperatorsName";
    MANUFACTURER_MODEL_NAME = (0x0008, 0x1090), LO, "ManufacturerModelName";
    REFERENCED_SERIES_SEQUENCE = (0x0008, 0x1115), SQ, "ReferencedSeriesSequence";
    REFERENCED_IMAGE_SEQUENCE = (0x0008, 0x1140), SQ, "ReferencedImageSequence";
    REFERENCED_SOP_CLASS_UID = (0x0008, 0x1150), UI, "ReferencedSOPClassUID";
    REFERENCED_SOP_INSTANCE_UID = (0x0008, 0x1155), UI, "ReferencedSOPInstanceUID";
    REFERENCED_IMAGE_EVIDENCE_SEQUENCE = (0x0008, 0x9092), SQ, "ReferencedImageEvidenceSequence";

    // Patient / Study / Series / Instance
    PATIENT_NAME = (0x0010, 0x0010), PN, "PatientName";
    PATIENT_ID = (0x0010, 0x0020), LO, "PatientID";
    ISSUER_OF_PATIENT_ID = (0x0010, 0x0021), LO, "IssuerOfPatientID";
    PATIENT_BIRTH_DATE = (0x0010, 0x0030), DA, "PatientBirthDate";
    PATIENT_BIRTH_TIME = (0x0010, 0x0032), TM, "PatientBirthTime";
    PATIENT_SEX = (0x0010, 0x0040), CS, "PatientSex";
    PATIENT_AGE = (0x0010, 0x1010), AS, "PatientAge";
    PATIENT_SIZE = (0x0010, 0x1020), DS, "PatientSize";
    PATIENT_WEIGHT = (0x0010, 0x1030), DS, "PatientWeight";
    ETHNIC_GROUP = (0x0010, 0x2160), SH, "EthnicGroup";
    PATIENT_COMMENTS = (0x0010, 0x4000), LT, "PatientComments";
    BODY_PART_EXAMINED = (0x0018, 0x0015), CS, "BodyPartExamined";
    SLICE_THICKNESS = (0x0018, 0x0050), DS, "SliceThickness";
    PROTOCOL_NAME = (0x0018, 0x1030), LO, "ProtocolName";
    PATIENT_POSITION = (0x0018, 0x5100), CS, "PatientPosition";
    IMPLANT_NAME = (0x0022, 0x1095), LO, "ImplantName";
    IMPLANT_PART_NUMBER = (0x0022, 0x1097), LO, "ImplantPartNumber";
    STUDY_INSTANCE_UID = (0x0020, 0x000D), UI, "StudyInstanceUID";
    SERIES_INSTANCE_UID = (0x0020, 0x000E), UI, "SeriesInstanceUID";
    STUDY_ID = (0x0020, 0x0010), SH, "StudyID";
    SERIES_NUMBER = (0x0020, 0x0011), IS, "SeriesNumber";
    ACQUISITION_NUMBER = (0x0020, 0x0012), IS, "AcquisitionNumber";
    INSTANCE_NUMBER = (0x0020, 0x0013), IS, "InstanceNumber";
    PATIENT_ORIENTATION = (0x0020, 0x0020), CS, "PatientOrientation";
    IMAGE_POSITION_PATIENT = (0x0020, 0x0032), DS, "ImagePositionPatient";
    IMAGE_ORIENTATION_PATIENT = (0x0020, 0x0037), DS, "ImageOrientationPatient";
    FRAME_OF_REFERENCE_UID = (0x0020, 0x0052), UI, "FrameOfReferenceUID";
    SLICE_LOCATION = (0x0020, 0x1041), DS, "SliceLocation";
    IMAGE_COMMENTS = (0x0020, 0x4000), LT, "ImageComments";

    // Image Pixel / Spectroscopy
    SAMPLES_PER_PIXEL = (0x0028, 0x0002), US, "SamplesPerPixel";
    PHOTOMETRIC_INTERPRETATION = (0x0028, 0x0004), CS, "PhotometricInterpretation";
    NUMBER_OF_FRAMES = (0x0028, 0x0008), IS, "NumberOfFrames";
    ROWS = (0x0028, 0x0010), US, "Rows";
    COLUMNS = (0x0028, 0x0011), US, "Columns";
    PIXEL_SPACING = (0x0028, 0x0030), DS, "PixelSpacing";
    BITS_ALLOCATED = (0x0028, 0x0100), US, "BitsAllocated";
    BITS_STORED = (0x0028, 0x0101), US, "BitsStored";
    HIGH_BIT = (0x0028, 0x0102), US, "HighBit";
    PIXEL_REPRESENTATION = (0x0028, 0x0103), US, "PixelRepresentation";
    RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR = (0x0028, 0x1101), US, "RedPaletteColorLookupTableDescriptor";
    GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR = (0x0028, 0x1102), US, "GreenPaletteColorLookupTableDescriptor";
    BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR = (0x0028, 0x1103), US, "BluePaletteColorLookupTableDescriptor";
    RED_PALETTE_COLOR_LOOKUP_TABLE_DATA = (0x0028, 0x1201), OW, "RedPaletteColorLookupTableData";
    GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA = (0x0028, 0x1202), OW, "GreenPaletteColorLookupTableData";
    BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA = (0x0028, 0x1203), OW, "BluePaletteColorLookupTableData";
    DATA_POINT_ROWS = (0x0028, 0x9001), UL, "DataPointRows";
    DATA_POINT_COLUMNS = (0x0028, 0x9002), UL, "DataPointColumns";

    // Procedures
    REQUESTED_PROCEDURE_DESCRIPTION = (0x0032, 0x1060), LO, "RequestedProcedureDescription";
    PERFORMED_PROCEDURE_STEP_START_DATE = (0x0040, 0x0244), DA, "PerformedProcedureStepStartDate";
    PERFORMED_PROCEDURE_STEP_START_TIME = (0x0040, 0x0245), TM, "PerformedProcedureStepStartTime";
    PERFORMED_PROCEDURE_STEP_ID = (0x0040, 0x0253), SH, "PerformedProcedureStepID";

    // Structured Reporting / Encapsulated Documents
    VERIFICATION_DATE_TIME = (0x0040, 0xA030), DT, "VerificationDateTime";
    VALUE_TYPE = (0x0040, 0xA040), CS, "ValueType";
    CONCEPT_NAME_CODE_SEQUENCE = (0x0040, 0xA043), SQ, "ConceptNameCodeSequence";
    COMPLETION_FLAG = (0x0040, 0xA491), CS, "CompletionFlag";
    VERIFICATION_FLAG = (0x0040, 0xA493), CS, "VerificationFlag";
    CONTENT_SEQUENCE = (0x0040, 0xA730), SQ, "ContentSequence";
    HL7_INSTANCE_IDENTIFIER = (0x0040, 0xE001), ST, "HL7InstanceIdentifier";
    DOCUMENT_TITLE = (0x0042, 0x0010), ST, "DocumentTitle";
    ENCAPSULATED_DOCUMENT = (0x0042, 0x0011), OB, "EncapsulatedDocument";
    MIME_TYPE_OF_ENCAPSULATED_DOCUMENT = (0x0042, 0x0012), LO, "MIMETypeOfEncapsulatedDocument";

    // Implants
    IMPLANT_SIZE = (0x0068, 0x6210), LO, "ImplantSize";
    IMPLANT_ASSEMBLY_TEMPLATE_NAME = (0x0076, 0x0001), LO, "ImplantAssemblyTemplateName";
    PROCEDURE_TYPE_CODE_SEQUENCE = (0x0076, 0x000A), SQ, "ProcedureTypeCodeSequence";
    IMPLANT_TEMPLATE_GROUP_NAME = (0x0078, 0x0001), LO, "ImplantTemplateGroupName";
    IMPLANT_TEMPLATE_GROUP_ISSUER = (0x0078, 0x0024), LO, "ImplantTemplateGroupIssuer";

    // Presentation State / Content Identification
    CONTENT_LABEL = (0x0070, 0x0080), CS, "ContentLabel";
    CONTENT_DESCRIPTION = (0x0070, 0x0081), LO, "ContentDescription";
    PRESENTATION_CREATION_DATE = (0x0070, 0x0082), DA, "PresentationCreationDate";
    PRESENTATION_CREATION_TIME = (0x0070, 0x0083), TM, "PresentationCreationTime";
    CONTENT_CREATOR_NAME = (0x0070, 0x0084), PN, "ContentCreatorName";
    BLENDING_SEQUENCE = (0x0070, 0x0402), SQ, "BlendingSequence";

    // Hanging Protocols
    HANGING_PROTOCOL_CREATOR = (0x0072, 0x0008), LO, "HangingProtocolCreator";
    HANGING_PROTOCOL_CREATION_DATE_TIME = (0x0072, 0x000A), DT, "HangingProtocolCreationDateTime";
    HANGING_PROTOCOL_DEFINITION_SEQUENCE = (0x0072, 0x000C), SQ, "HangingProtocolDefinitionSequence";
    HANGING_PROTOCOL_USER_IDENTIFICATION_CODE_SEQUENCE = (0x0072, 0x000E), SQ, "HangingProtocolUserIdentificationCodeSequence";
    NUMBER_OF_PRIORS_REFERENCED = (0x0072, 0x0014), US, "NumberOfPriorsReferenced";

    // Radiotherapy
    DOSE_SUMMATION_TYPE = (0x3004, 0x000A), CS, "DoseSummationType";
    STRUCTURE_SET_LABEL = (0x3006, 0x0002), SH, "StructureSetLabel";
    STRUCTURE_SET_DATE = (0x3006, 0x0008), DA, "StructureSetDate";
    STRUCTURE_SET_TIME = (0x3006, 0x0009), TM, "StructureSetTime";
    TREATMENT_DATE = (0x3008, 0x0250), DA, "TreatmentDate";
    TREATMENT_TIME = (0x3008, 0x0251), TM, "TreatmentTime";
    RT_PLAN_LABEL = (0x300A, 0x0002), SH, "RTPlanLabel";
    RT_PLAN_DATE = (0x300A, 0x0006), DA, "RTPlanDate";
    RT_PLAN_TIME = (0x300A, 0x0007), TM, "RTPlanTime";
    USER_CONTENT_LABEL = (0x3010, 0x0033), SH, "UserContentLabel";
    USER_CONTENT_LONG_LABEL = (0x3010, 0x0034), LO, "UserContentLongLabel";

    // Storage Media / Icon Image
    STORAGE_MEDIA_FILE_SET_ID = (0x0088, 0x0130), SH, "StorageMediaFileSetID";
    STORAGE_MEDIA_FILE_SET_UID = (0x0088, 0x0140), UI, "StorageMediaFileSetUID";
    ICON_IMAGE_SEQUENCE = (0x0088, 0x0200), SQ, "IconImageSequence";

    // Pixel Data
    PIXEL_DATA = (0x7FE0, 0x0010), OB, "PixelData";
}

/// Sequence item
pub const ITEM: Tag = Tag::new(0xFFFE, 0xE000);
/// Item Delimitation Item
pub const ITEM_DELIMITATION_ITEM: Tag = Tag::new(0xFFFE, 0xE00D);
/// Sequence Delimitation Item
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag::new(0xFFFE, 0xE0DD);

/// Look up a dictionary entry
pub fn lookup(tag: Tag) -> Option<&'static Entry> {
    DICTIONARY.iter().find(|entry| entry.tag == tag)
}

/// Keyword for `tag`, or `"Unknown"` when not in the dictionary
pub fn keyword(tag: Tag) -> &'static str {
    lookup(tag).map(|entry| entry.keyword).unwrap_or("Unknown")
}

/// VR for `tag`; group lengths are UL and anything unknown is UN
pub fn vr_of(tag: Tag) -> Vr {
    if tag.is_group_length() {
        return Vr::UL;
    }
    lookup(tag).map(|entry| entry.vr).unwrap_or(Vr::UN)
}

/// Reverse lookup by keyword
pub fn tag_for_keyword(keyword: &str) -> Option<Tag> {
    DICTIONARY
        .iter()
        .find(|entry| entry.keyword == keyword)
        .map(|entry| entry.tag)
}
