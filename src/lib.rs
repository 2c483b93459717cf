//! # dicom-fileset
//!
//! A DICOM File-set index engine with:
//! - Lossless DICOMDIR read/write with recomputed record offsets
//! - Staged additions and removals committed in a single `write()`
//! - Deterministic File ID generation and on-disk restructuring
//! - Pluggable directory record construction
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         FileSet                              │
//! │          (add / remove / find / write / copy)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────┐
//!          │            │                 │
//!          ▼            ▼                 ▼
//!   ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!   │    Stage    │ │ RecordTree  │ │  Records    │
//!   │  (tempdir)  │ │ (arena)     │ │ (factory)   │
//!   └─────────────┘ └──────┬──────┘ └─────────────┘
//!                          │
//!                          ▼
//!                  ┌─────────────┐       ┌─────────────┐
//!                  │  Directory  │──────►│    Codec    │
//!                  │ (DICOMDIR)  │       │ (Part-10)   │
//!                  └─────────────┘       └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod dataset;
pub mod codec;
pub mod file_id;
pub mod records;
pub mod tree;
pub mod directory;
pub mod fileset;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FileSetError, Result};
pub use config::Config;
pub use fileset::{FileSet, Instance, LoadOptions, LoadReport, Source, WriteOptions};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dicom-fileset
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
