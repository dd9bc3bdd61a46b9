//! Block model codec for .docx packages
//!
//! This module turns the main markup part of a word-processing package into a
//! flat list of blocks, checks edited block lists against the original, and
//! writes edited blocks back into a copy of the package.

pub(crate) mod extract;
pub mod models;
pub mod package;
pub(crate) mod parsing;
pub(crate) mod reconstruct;
pub(crate) mod validate;
pub(crate) mod xml;

// Re-export the public surface
pub use extract::{extract_blocks, extract_document, extract_file};
pub use models::*;
pub use package::{DocxPackage, validate_docx_file};
pub use parsing::formatting::render_runs;
pub use parsing::markdown::parse_inline_markdown;
pub use parsing::styles::HeadingStyleMap;
pub use reconstruct::{ReconstructOptions, reconstruct_document, reconstruct_document_with};
pub use validate::{
    ValidationOptions, ValidationReport, validate_candidate_str, validate_document,
    validate_document_with,
};
