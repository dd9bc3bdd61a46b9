//! Rebuilding a package from an edited block model
//!
//! The original markup is parsed once and never edited. The output tree starts
//! as a copy of it with an empty body; every candidate block is then appended
//! either as a copy of the node it was extracted from, with its text replaced,
//! or as a node synthesized from a template of the same kind. Body children
//! that never become blocks, such as the section properties, are appended
//! after the last block.
//!
//! Callers validate the candidate first; blocks that would fail validation are
//! tolerated here but the result is unspecified.

mod rewrite;
mod synthesize;
mod templates;

use std::collections::HashMap;

use super::extract::load_heading_styles;
use super::models::*;
use super::package::DocxPackage;
use super::parsing::body::{BodyNode, find_body, walk_body};
use super::parsing::styles::HeadingStyleMap;
use super::xml::{NodeId, XmlTree};
use crate::error::Result;

use rewrite::{set_list_level, set_paragraph_text, set_table_text, strip_images};
use synthesize::synthesize_block;
use templates::TemplateSet;

/// Options for writing the rebuilt package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructOptions {
    /// DEFLATE level for every entry of the output archive
    pub compression_level: i64,
    /// Width in twips of tables built without a template
    pub default_table_width: u32,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            default_table_width: 9000,
        }
    }
}

/// Immutable state shared by every step of one reconstruction
#[derive(Clone, Copy)]
pub(crate) struct ReconstructContext<'a> {
    pub(crate) source: &'a XmlTree,
    pub(crate) styles: &'a HeadingStyleMap,
    pub(crate) templates: &'a TemplateSet,
    pub(crate) options: &'a ReconstructOptions,
}

/// Block ids of the original document mapped to the nodes they came from
struct SourceMap {
    paragraphs: HashMap<String, NodeId>,
    tables: HashMap<String, NodeId>,
    /// Body children that never become blocks, in document order
    preserved: Vec<NodeId>,
}

impl SourceMap {
    fn build(tree: &XmlTree, body: NodeId, original: &Document) -> Self {
        let mut map = SourceMap {
            paragraphs: HashMap::new(),
            tables: HashMap::new(),
            preserved: Vec::new(),
        };

        let kinds: HashMap<&str, BlockKind> = original
            .blocks
            .iter()
            .map(|block| (block.id(), block.kind()))
            .collect();

        for node in walk_body(tree, body) {
            match node {
                BodyNode::Paragraph { index, node } => {
                    let id = block_id(index);
                    if kinds
                        .get(id.as_str())
                        .is_some_and(|&kind| kind != BlockKind::Table)
                    {
                        map.paragraphs.insert(id, node);
                    }
                }
                BodyNode::Table { index, node } => {
                    let id = block_id(index);
                    if kinds.get(id.as_str()) == Some(&BlockKind::Table) {
                        map.tables.insert(id, node);
                    }
                }
                BodyNode::Other(node) => map.preserved.push(node),
            }
        }

        map
    }

    fn nodes(&self) -> HashMap<String, NodeId> {
        self.paragraphs
            .iter()
            .chain(&self.tables)
            .map(|(id, &node)| (id.clone(), node))
            .collect()
    }

    /// The original node for a candidate block, if it is an existing block
    fn lookup(&self, block: &Block) -> Option<NodeId> {
        match block {
            Block::Table { id, .. } => self.tables.get(id).copied(),
            _ => self.paragraphs.get(block.id()).copied(),
        }
    }
}

/// Rebuild a package from its original bytes, the document extracted from
/// them and an edited candidate, with default options
pub fn reconstruct_document(
    bytes: &[u8],
    original: &Document,
    candidate: &Document,
) -> Result<Vec<u8>> {
    reconstruct_document_with(bytes, original, candidate, &ReconstructOptions::default())
}

/// Rebuild a package with explicit options
pub fn reconstruct_document_with(
    bytes: &[u8],
    original: &Document,
    candidate: &Document,
    options: &ReconstructOptions,
) -> Result<Vec<u8>> {
    let mut package = DocxPackage::from_bytes(bytes)?;
    let part_name = package.document_part_name()?;
    let document_xml = package.document_xml()?;
    let styles = load_heading_styles(&package)?;

    let rebuilt = rebuild_markup(&document_xml, &styles, original, candidate, options)?;

    package.replace_part(&part_name, rebuilt.into_bytes());
    package.to_bytes(options.compression_level)
}

/// Rebuild the main markup part
pub(crate) fn rebuild_markup(
    document_xml: &str,
    styles: &HeadingStyleMap,
    original: &Document,
    candidate: &Document,
    options: &ReconstructOptions,
) -> Result<String> {
    let source = XmlTree::parse(document_xml)?;
    let source_body = find_body(&source)?;
    let sources = SourceMap::build(&source, source_body, original);
    let templates = TemplateSet::collect(&original.blocks, &sources.nodes());

    let ctx = ReconstructContext {
        source: &source,
        styles,
        templates: &templates,
        options,
    };

    // Same arena layout as the source, so body ids carry over
    let mut out = source.clone();
    out.clear_children(source_body);

    let mut synthesized = 0;
    for block in &candidate.blocks {
        let node = match sources.lookup(block) {
            Some(original_node) => rewrite_existing(&mut out, ctx, original_node, block),
            None => {
                synthesized += 1;
                log::debug!("synthesizing {} {}", block.kind().as_str(), block.id());
                synthesize_block(&mut out, ctx, block)
            }
        };
        out.append_child(source_body, node);
    }

    for &node in &sources.preserved {
        let copy = out.import_subtree(&source, node);
        out.append_child(source_body, copy);
    }

    log::debug!(
        "rebuilt {} blocks ({} synthesized, {} preserved nodes)",
        candidate.blocks.len(),
        synthesized,
        sources.preserved.len()
    );
    out.to_xml()
}

/// Copy an original node and apply the block's text to it
fn rewrite_existing(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    original: NodeId,
    block: &Block,
) -> NodeId {
    let node = out.import_subtree(ctx.source, original);
    strip_images(out, node);

    match block {
        Block::Table { rows, .. } => set_table_text(out, node, rows),
        Block::ListItem { level, text, .. } => {
            set_paragraph_text(out, node, text);
            set_list_level(out, node, *level);
        }
        Block::Title { text, .. } | Block::Heading { text, .. } | Block::Paragraph { text, .. } => {
            set_paragraph_text(out, node, text)
        }
    }
    node
}
