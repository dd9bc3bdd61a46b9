use std::path::Path;

use chrono::{SecondsFormat, Utc};

// Import types from the models module
use super::models::*;
// Import package I/O
use super::package::{DocxPackage, validate_docx_file};
// Import body traversal
use super::parsing::body::{BodyNode, find_body, walk_body};
// Import formatting and text extraction
use super::parsing::formatting::{contains_images, extract_formatted_text, extract_paragraph_text};
// Import heading detection
use super::parsing::heading::{ParagraphClass, classify_paragraph};
use super::parsing::styles::HeadingStyleMap;
// Import table extraction
use super::parsing::table::extract_table;
use super::xml::{NodeId, XmlTree};
use crate::error::Result;

/// Immutable state shared by every step of one traversal
#[derive(Clone, Copy)]
pub(crate) struct ExtractContext<'a> {
    pub(crate) tree: &'a XmlTree,
    pub(crate) styles: &'a HeadingStyleMap,
}

/// Why a paragraph produced no block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Empty,
    ImageOnly,
}

/// Extract the block model from .docx package bytes
pub fn extract_document(bytes: &[u8], file_name: &str) -> Result<Document> {
    let package = DocxPackage::from_bytes(bytes)?;
    let document_xml = package.document_xml()?;
    let styles = load_heading_styles(&package)?;

    let blocks = extract_blocks(&document_xml, &styles)?;
    let table_count = blocks
        .iter()
        .filter(|block| block.kind() == BlockKind::Table)
        .count();

    log::debug!(
        "extracted {} blocks ({} tables) from {}",
        blocks.len(),
        table_count,
        file_name
    );

    Ok(Document {
        metadata: DocumentMetadata {
            file_name: file_name.to_string(),
            extracted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            block_count: blocks.len(),
            table_count,
        },
        blocks,
    })
}

/// Extract the block model from a .docx file on disk
pub fn extract_file(file_path: &Path) -> Result<Document> {
    // Validate file type before attempting to parse
    validate_docx_file(file_path)?;

    let bytes = std::fs::read(file_path)?;
    let file_name = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document.docx");
    extract_document(&bytes, file_name)
}

/// Heading-style map from the package's style part, empty when absent
pub(crate) fn load_heading_styles(package: &DocxPackage) -> Result<HeadingStyleMap> {
    match package.styles_xml()? {
        Some(xml) => HeadingStyleMap::from_styles_xml(&xml),
        None => Ok(HeadingStyleMap::default()),
    }
}

/// Extract blocks from the main markup part
pub fn extract_blocks(document_xml: &str, styles: &HeadingStyleMap) -> Result<Vec<Block>> {
    let tree = XmlTree::parse(document_xml)?;
    let body = find_body(&tree)?;
    let ctx = ExtractContext {
        tree: &tree,
        styles,
    };

    let mut blocks = Vec::new();
    for node in walk_body(&tree, body) {
        match node {
            BodyNode::Paragraph { index, node } => match paragraph_block(ctx, node, index) {
                Ok(block) => blocks.push(block),
                Err(reason) => log::debug!("skipping {} ({reason:?})", block_id(index)),
            },
            BodyNode::Table { index, node } => blocks.push(extract_table(&tree, node, index)),
            BodyNode::Other(_) => {}
        }
    }

    assign_title(&mut blocks);
    Ok(blocks)
}

fn paragraph_block(
    ctx: ExtractContext<'_>,
    para: NodeId,
    index: usize,
) -> std::result::Result<Block, SkipReason> {
    let plain_text = extract_paragraph_text(ctx.tree, para);
    if plain_text.trim().is_empty() {
        return Err(if contains_images(ctx.tree, para) {
            SkipReason::ImageOnly
        } else {
            SkipReason::Empty
        });
    }

    let id = block_id(index);
    let text = extract_formatted_text(ctx.tree, para);
    Ok(
        match classify_paragraph(ctx.tree, para, &plain_text, ctx.styles) {
            ParagraphClass::Heading(level) => Block::Heading { id, level, text },
            ParagraphClass::ListItem(level) => Block::ListItem { id, level, text },
            ParagraphClass::Paragraph => Block::Paragraph { id, text },
        },
    )
}

/// The first paragraph becomes the title unless a heading or table comes first
fn assign_title(blocks: &mut [Block]) {
    let first = blocks.iter().position(|block| {
        matches!(
            block,
            Block::Heading { .. } | Block::Table { .. } | Block::Paragraph { .. }
        )
    });

    if let Some(position) = first {
        if let Block::Paragraph { id, text } = &blocks[position] {
            blocks[position] = Block::Title {
                id: id.clone(),
                text: text.clone(),
            };
        }
    }
}
