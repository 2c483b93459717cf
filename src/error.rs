//! Error types for the File-set engine
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::dataset::Tag;

/// Result type alias using FileSetError
pub type Result<T> = std::result::Result<T, FileSetError>;

/// Unified error type for File-set operations
#[derive(Debug, Error)]
pub enum FileSetError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Unsupported encoding: {0}")]
    Encoding(String),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{context}: the instance's {tag} '{keyword}' element is missing")]
    MissingElement {
        context: String,
        tag: Tag,
        keyword: &'static str,
    },

    #[error("{context}: the instance's {tag} '{keyword}' element cannot be empty")]
    EmptyElement {
        context: String,
        tag: Tag,
        keyword: &'static str,
    },

    // -------------------------------------------------------------------------
    // Structural Errors
    // -------------------------------------------------------------------------
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("No such instance in the File-set: {0}")]
    InstanceNotFound(String),
}
