//! Structural validation of candidate documents
//!
//! A candidate is a relaxed diff of the original: blocks may be inserted or
//! removed freely, but a block whose id exists in the original must keep its
//! type, its heading level and, for tables, its grid. Validation works on raw
//! JSON so malformed input is reported instead of rejected by deserialization.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::models::*;

/// Outcome of validation; `errors` is empty iff `valid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report cells of an existing table that moved to another position
    pub reject_reordered_cells: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            reject_reordered_cells: true,
        }
    }
}

/// Validate a candidate against the original with default options
pub fn validate_document(candidate: &Value, original: &Document) -> ValidationReport {
    validate_document_with(candidate, original, &ValidationOptions::default())
}

/// Validate candidate JSON text; unparsable text is a single violation
pub fn validate_candidate_str(
    candidate: &str,
    original: &Document,
    options: &ValidationOptions,
) -> ValidationReport {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => validate_document_with(&value, original, options),
        Err(err) => ValidationReport::from_errors(vec![format!(
            "Candidate is not valid JSON: {err}"
        )]),
    }
}

pub fn validate_document_with(
    candidate: &Value,
    original: &Document,
    options: &ValidationOptions,
) -> ValidationReport {
    let Some(object) = candidate.as_object() else {
        return ValidationReport::from_errors(vec![
            "Candidate document must be a JSON object".to_string(),
        ]);
    };
    let Some(blocks) = object.get("blocks").and_then(Value::as_array) else {
        return ValidationReport::from_errors(vec![
            "Candidate document must contain a 'blocks' array".to_string(),
        ]);
    };

    let mut validator = Validator::new(original, options);
    for (position, block) in blocks.iter().enumerate() {
        validator.check_block(position, block);
    }
    ValidationReport::from_errors(validator.errors)
}

struct Validator<'a> {
    original: HashMap<&'a str, &'a Block>,
    options: &'a ValidationOptions,
    seen_ids: HashSet<&'a str>,
    errors: Vec<String>,
}

impl<'a> Validator<'a> {
    fn new(original: &'a Document, options: &'a ValidationOptions) -> Self {
        Validator {
            original: original
                .blocks
                .iter()
                .map(|block| (block.id(), block))
                .collect(),
            options,
            seen_ids: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn check_block(&mut self, position: usize, value: &'a Value) {
        let Some(block) = value.as_object() else {
            self.errors
                .push(format!("Block {position}: must be a JSON object"));
            return;
        };

        // Identity
        let id = block.get("id").and_then(Value::as_str);
        let label = match id {
            Some(id) => format!("Block {position} ('{id}')"),
            None => format!("Block {position}"),
        };
        match id {
            Some(id) => self.claim_id(&label, id),
            None => self.errors.push(format!("{label}: 'id' must be a string")),
        }

        let Some(kind) = self.check_type(&label, block) else {
            return;
        };

        // Existing blocks keep their shape
        let existing = id.and_then(|id| self.original.get(id).copied());
        if let Some(existing) = existing {
            self.check_stability(&label, kind, block, existing);
        }

        match kind {
            BlockKind::Heading | BlockKind::ListItem => {
                self.check_level(&label, block);
                self.check_text(&label, block);
            }
            BlockKind::Title | BlockKind::Paragraph => self.check_text(&label, block),
            BlockKind::Table => {
                let Some(rows) = self.check_rows(&label, block) else {
                    return;
                };
                if let Some(Block::Table {
                    rows: original_rows,
                    ..
                }) = existing
                {
                    self.check_geometry(&label, rows, original_rows);
                }
            }
        }
    }

    fn claim_id(&mut self, label: &str, id: &'a str) {
        if !self.seen_ids.insert(id) {
            self.errors.push(format!("{label}: duplicate id '{id}'"));
        }
    }

    fn check_type(&mut self, label: &str, block: &Map<String, Value>) -> Option<BlockKind> {
        match block.get("type") {
            Some(Value::String(tag)) => {
                let kind = BlockKind::parse(tag);
                if kind.is_none() {
                    self.errors.push(format!(
                        "{label}: unknown type '{tag}' (expected title, heading, paragraph, list_item or table)"
                    ));
                }
                kind
            }
            _ => {
                self.errors
                    .push(format!("{label}: 'type' must be a string"));
                None
            }
        }
    }

    fn check_stability(
        &mut self,
        label: &str,
        kind: BlockKind,
        block: &Map<String, Value>,
        existing: &Block,
    ) {
        if existing.kind() != kind {
            self.errors.push(format!(
                "{label}: type changed from '{}' to '{}'",
                existing.kind().as_str(),
                kind.as_str()
            ));
            return;
        }

        if let Block::Heading { level: before, .. } = existing {
            if let Some(after) = level_of(block) {
                if after != *before {
                    self.errors.push(format!(
                        "{label}: heading level changed from {before} to {after}"
                    ));
                }
            }
        }
    }

    fn check_level(&mut self, label: &str, block: &Map<String, Value>) {
        if level_of(block).is_none() {
            self.errors
                .push(format!("{label}: 'level' must be an integer >= 1"));
        }
    }

    fn check_text(&mut self, label: &str, block: &Map<String, Value>) {
        if !block.get("text").is_some_and(Value::is_string) {
            self.errors
                .push(format!("{label}: 'text' must be a string"));
        }
    }

    /// Shape of `rows`; cell ids join the block id namespace
    fn check_rows(
        &mut self,
        label: &str,
        block: &'a Map<String, Value>,
    ) -> Option<&'a Vec<Value>> {
        let Some(rows) = block.get("rows").and_then(Value::as_array) else {
            self.errors
                .push(format!("{label}: 'rows' must be an array of rows"));
            return None;
        };

        for (r, row) in rows.iter().enumerate() {
            let Some(cells) = row.as_array() else {
                self.errors
                    .push(format!("{label}: row {r} must be an array of cells"));
                continue;
            };
            for (c, cell) in cells.iter().enumerate() {
                let cell_label = format!("{label} row {r} cell {c}");
                let Some(cell) = cell.as_object() else {
                    self.errors
                        .push(format!("{cell_label}: must be a JSON object"));
                    continue;
                };
                match cell.get("id").and_then(Value::as_str) {
                    Some(id) => self.claim_id(&cell_label, id),
                    None => self
                        .errors
                        .push(format!("{cell_label}: 'id' must be a string")),
                }
                if !cell.get("text").is_some_and(Value::is_string) {
                    self.errors
                        .push(format!("{cell_label}: 'text' must be a string"));
                }
            }
        }

        Some(rows)
    }

    /// Existing tables are edited in place, cell by position
    fn check_geometry(&mut self, label: &str, rows: &[Value], original_rows: &TableRows) {
        if rows.len() != original_rows.len() {
            self.errors.push(format!(
                "{label}: row count changed from {} to {}",
                original_rows.len(),
                rows.len()
            ));
        }

        for (r, (row, original_row)) in rows.iter().zip(original_rows).enumerate() {
            if let Some(cells) = row.as_array() {
                if cells.len() != original_row.len() {
                    self.errors.push(format!(
                        "{label}: row {r} cell count changed from {} to {}",
                        original_row.len(),
                        cells.len()
                    ));
                }
            }
        }

        if self.options.reject_reordered_cells {
            self.check_cell_positions(label, rows, original_rows);
        }
    }

    fn check_cell_positions(&mut self, label: &str, rows: &[Value], original_rows: &TableRows) {
        let positions: HashMap<&str, (usize, usize)> = original_rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(c, cell)| (cell.id.as_str(), (r, c)))
            })
            .collect();

        for (r, row) in rows.iter().enumerate() {
            let Some(cells) = row.as_array() else {
                continue;
            };
            for (c, cell) in cells.iter().enumerate() {
                let Some(id) = cell.get("id").and_then(Value::as_str) else {
                    continue;
                };
                if let Some(&(from_r, from_c)) = positions.get(id) {
                    if (from_r, from_c) != (r, c) {
                        self.errors.push(format!(
                            "{label}: cell '{id}' moved from row {from_r} column {from_c} to row {r} column {c}"
                        ));
                    }
                }
            }
        }
    }
}

fn level_of(block: &Map<String, Value>) -> Option<u32> {
    block
        .get("level")
        .and_then(Value::as_u64)
        .filter(|level| *level >= 1)
        .and_then(|level| u32::try_from(level).ok())
}
