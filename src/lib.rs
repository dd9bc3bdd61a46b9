//! docx-blocks: editable block model for .docx documents
//!
//! This library extracts a word-processing document into ordered, typed blocks
//! with stable ids, validates edited block lists against the original, and
//! rebuilds the package from the edited blocks while keeping the original
//! formatting wherever a block survives.

pub mod config;
pub mod document;
pub mod error;

// Re-export commonly used types
pub use config::CodecConfig;
pub use document::{
    Block, BlockKind, Cell, Document, DocumentMetadata, ReconstructOptions, ValidationOptions,
    ValidationReport, extract_document, extract_file, reconstruct_document,
    reconstruct_document_with, validate_candidate_str, validate_document, validate_document_with,
};
pub use error::{Error, Result};
