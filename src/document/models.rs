//! Core data structures for the block model
//!
//! This module defines the public types exchanged between extraction,
//! validation and reconstruction. Their JSON shape is the wire format.

use serde::{Deserialize, Serialize};

// Type aliases for convenience
pub type TableRows = Vec<Vec<Cell>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub extracted_at: String,
    pub block_count: usize,
    pub table_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Title { id: String, text: String },
    Heading { id: String, level: u32, text: String },
    Paragraph { id: String, text: String },
    ListItem { id: String, level: u32, text: String },
    Table { id: String, rows: TableRows },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub text: String,
}

/// Discriminant of [`Block`], named the way the wire format names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Title,
    Heading,
    Paragraph,
    ListItem,
    Table,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Title => "title",
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::ListItem => "list_item",
            BlockKind::Table => "table",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "title" => Some(BlockKind::Title),
            "heading" => Some(BlockKind::Heading),
            "paragraph" => Some(BlockKind::Paragraph),
            "list_item" => Some(BlockKind::ListItem),
            "table" => Some(BlockKind::Table),
            _ => None,
        }
    }
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Block::Title { id, .. }
            | Block::Heading { id, .. }
            | Block::Paragraph { id, .. }
            | Block::ListItem { id, .. }
            | Block::Table { id, .. } => id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Title { .. } => BlockKind::Title,
            Block::Heading { .. } => BlockKind::Heading,
            Block::Paragraph { .. } => BlockKind::Paragraph,
            Block::ListItem { .. } => BlockKind::ListItem,
            Block::Table { .. } => BlockKind::Table,
        }
    }

    /// Text of a paragraph-like block, `None` for tables
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Title { text, .. }
            | Block::Heading { text, .. }
            | Block::Paragraph { text, .. }
            | Block::ListItem { text, .. } => Some(text),
            Block::Table { .. } => None,
        }
    }
}

impl Document {
    /// Look up a block by id
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id() == id)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Identifier of the block at body position `index`
pub fn block_id(index: usize) -> String {
    format!("block_{index:04}")
}

/// Identifier of a table cell, derived from the table's body position
pub fn cell_id(table_index: usize, row: usize, column: usize) -> String {
    format!("block_{table_index:04}_r{row}_c{column}")
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextFormatting {
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRun {
    pub text: String,
    pub formatting: TextFormatting,
}

impl FormattedRun {
    pub fn new(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        FormattedRun {
            text: text.into(),
            formatting: TextFormatting { bold, italic },
        }
    }

    /// Consolidate adjacent runs with identical formatting into single runs
    pub fn consolidate_runs(runs: Vec<FormattedRun>) -> Vec<FormattedRun> {
        let mut consolidated: Vec<FormattedRun> = Vec::with_capacity(runs.len());

        for run in runs {
            match consolidated.last_mut() {
                // Same formatting - merge the text
                Some(current) if current.formatting == run.formatting => {
                    current.text.push_str(&run.text);
                }
                _ => consolidated.push(run),
            }
        }

        consolidated
    }
}
