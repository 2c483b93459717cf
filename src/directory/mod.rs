//! Directory file
//!
//! Reads and writes the DICOMDIR file that indexes a File-set. Records
//! are stored as items of one sequence and linked to each other by
//! absolute byte offsets, so the writer has to know the encoded size of
//! every record before it can fill in a single pointer.
//!
//! ## File Format
//! ```text
//! ┌──────────────┬────────┬───────────┬──────────────────────────────────────┐
//! │ Preamble 128 │ "DICM" │ Meta 0002 │ Top-level dataset                    │
//! └──────────────┴────────┴───────────┴──────────────────────────────────────┘
//!
//! Top-level dataset:
//! ┌──────────────┬───────────────┬──────────────┬─────────────┬─────────────────┐
//! │ (0004,1130)  │ (0004,1200)   │ (0004,1202)  │ (0004,1212) │ (0004,1220) SQ  │
//! │ File-set ID  │ first root UL │ last root UL │ consistency │ record items... │
//! └──────────────┴───────────────┴──────────────┴─────────────┴─────────────────┘
//!
//! Record item (offset = position of the item header):
//! ┌───────────┬─────────┬─────────────────┬──────┬─────────────────┬──────┬─────┐
//! │ FFFE,E000 │ Len (4) │ (0004,1400) UL  │ 1410 │ (0004,1420) UL  │ 1430 │ ... │
//! │           │         │ next sibling    │ flag │ first child     │ type │     │
//! └───────────┴─────────┴─────────────────┴──────┴─────────────────┴──────┴─────┘
//! ```
//!
//! A pointer value of 0 means "none". Root-level records are chained by
//! their next-sibling pointers starting at (0004,1200).

mod reader;
mod writer;

pub use reader::DirectoryFile;
pub use writer::{DirectoryWriter, WrittenDirectory};

/// File name of the directory file inside the File-set root
pub const DICOMDIR: &str = "DICOMDIR";

/// Size of the header of a UL element, explicit or implicit VR
pub(crate) const UL_HEADER_SIZE: u64 = 8;
