//! Table extraction
//!
//! Rows and cells are captured strictly by position; spans and merges are not
//! interpreted, so the grid seen here is the grid the reconstructor edits.

use super::super::models::*;
use super::super::xml::{NodeId, XmlTree};
use super::formatting::extract_formatted_text;

pub(crate) fn table_rows(tree: &XmlTree, table: NodeId) -> Vec<NodeId> {
    tree.children_named(table, "tr").collect()
}

pub(crate) fn row_cells(tree: &XmlTree, row: NodeId) -> Vec<NodeId> {
    tree.children_named(row, "tc").collect()
}

pub(crate) fn cell_paragraphs(tree: &XmlTree, cell: NodeId) -> Vec<NodeId> {
    tree.children_named(cell, "p").collect()
}

/// Cell text: newline-joined formatted text of the cell's paragraphs
pub(crate) fn extract_cell_text(tree: &XmlTree, cell: NodeId) -> String {
    cell_paragraphs(tree, cell)
        .into_iter()
        .map(|para| extract_formatted_text(tree, para))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract a table block for the table at body position `index`
pub(crate) fn extract_table(tree: &XmlTree, table: NodeId, index: usize) -> Block {
    let rows = table_rows(tree, table)
        .into_iter()
        .enumerate()
        .map(|(row_index, row)| {
            row_cells(tree, row)
                .into_iter()
                .enumerate()
                .map(|(column, cell)| Cell {
                    id: cell_id(index, row_index, column),
                    text: extract_cell_text(tree, cell),
                })
                .collect()
        })
        .collect();

    Block::Table {
        id: block_id(index),
        rows,
    }
}
