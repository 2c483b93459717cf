//! Dataset codec
//!
//! A small Part-10 codec covering what the File-set engine reads and
//! writes. It encodes explicit and implicit VR little endian and decodes
//! explicit VR big endian too.
//!
//! ## File Format
//! ```text
//! ┌────────────────┬────────┬─────────────────────┬──────────────────────┐
//! │ Preamble (128) │ "DICM" │ File meta (0002,*)  │ Dataset              │
//! │ zero bytes     │        │ explicit VR LE      │ in transfer syntax   │
//! └────────────────┴────────┴─────────────────────┴──────────────────────┘
//! ```
//!
//! ## Element Format
//! ```text
//! explicit VR, short:  │ Tag (4) │ VR (2) │ Len (2) │ Value │
//! explicit VR, long:   │ Tag (4) │ VR (2) │ 00 00   │ Len (4) │ Value │
//! implicit VR:         │ Tag (4) │ Len (4) │ Value │
//! sequence item:       │ FFFE,E000 │ Len (4) │ nested dataset │
//! ```
//!
//! Sequences and items are always written with defined lengths so that
//! every byte offset in a directory file can be computed up front.
//!
//! Text values go through the Specific Character Set in scope for their
//! dataset in both directions, so they are written back byte for byte.

mod charset;
mod decoder;
mod encoder;
mod file;

pub use charset::CharacterSet;
pub use decoder::{Decoder, ElementHeader};
pub use encoder::Encoder;
pub use file::{create_meta, encode_meta, read_meta, DicomFile, MAGIC, PREAMBLE_LEN};

use crate::dataset::uid;
use crate::error::{FileSetError, Result};

/// Length value marking an undefined-length sequence, item or element
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Size of an item or delimiter header
pub const ITEM_HEADER_SIZE: u64 = 8;

/// Transfer syntaxes the codec understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntax {
    ExplicitVrLittleEndian,
    ImplicitVrLittleEndian,
    /// Decode only
    ExplicitVrBigEndian,
}

impl TransferSyntax {
    /// Resolve a transfer syntax UID
    ///
    /// Encapsulated (compressed pixel data) syntaxes encode the dataset
    /// itself as explicit VR little endian and map to that variant.
    /// Deflate is not supported.
    pub fn from_uid(transfer_syntax_uid: &str) -> Result<Self> {
        match transfer_syntax_uid {
            uid::IMPLICIT_VR_LITTLE_ENDIAN => Ok(Self::ImplicitVrLittleEndian),
            uid::EXPLICIT_VR_BIG_ENDIAN => Ok(Self::ExplicitVrBigEndian),
            uid::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN => Err(FileSetError::Encoding(format!(
                "deflated transfer syntax '{}' is not supported",
                transfer_syntax_uid
            ))),
            _ => Ok(Self::ExplicitVrLittleEndian),
        }
    }

    pub fn uid(self) -> &'static str {
        match self {
            Self::ExplicitVrLittleEndian => uid::EXPLICIT_VR_LITTLE_ENDIAN,
            Self::ImplicitVrLittleEndian => uid::IMPLICIT_VR_LITTLE_ENDIAN,
            Self::ExplicitVrBigEndian => uid::EXPLICIT_VR_BIG_ENDIAN,
        }
    }

    pub fn is_explicit_vr(self) -> bool {
        !matches!(self, Self::ImplicitVrLittleEndian)
    }

    pub fn is_little_endian(self) -> bool {
        !matches!(self, Self::ExplicitVrBigEndian)
    }

    /// Size of a sequence element header
    pub fn sequence_header_size(self) -> u64 {
        if self.is_explicit_vr() {
            12
        } else {
            8
        }
    }
}
