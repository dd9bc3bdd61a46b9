//! Heading detection and classification
//!
//! This module handles detection of headings from paragraphs: style-based
//! detection through the heading-style map, explicit outline levels, and
//! numbered text such as `2.1. Scope`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::super::xml::{NodeId, XmlTree};
use super::list::detect_list_level;
use super::styles::{HeadingStyleMap, MAX_OUTLINE_LEVEL};

static NUMERAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*").unwrap());

const NUMBER_SEPARATORS: [char; 6] = ['.', '-', '–', '—', ':', ')'];

/// How a body paragraph is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParagraphClass {
    Heading(u32),
    ListItem(u32),
    Paragraph,
}

/// Style id referenced by the paragraph's properties
pub(crate) fn paragraph_style(tree: &XmlTree, para: NodeId) -> Option<&str> {
    tree.child(para, "pPr")
        .and_then(|props| tree.child(props, "pStyle"))
        .and_then(|style| tree.attr(style, "val"))
}

/// Detect heading level from the paragraph style
pub(crate) fn detect_heading_from_style(
    tree: &XmlTree,
    para: NodeId,
    styles: &HeadingStyleMap,
) -> Option<u32> {
    paragraph_style(tree, para).and_then(|style| styles.level_for(style))
}

/// Detect heading level from an explicit `w:outlineLvl`
pub(crate) fn detect_heading_from_outline(tree: &XmlTree, para: NodeId) -> Option<u32> {
    tree.child(para, "pPr")
        .and_then(|props| tree.child(props, "outlineLvl"))
        .and_then(|outline| tree.attr(outline, "val"))
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|level| *level <= MAX_OUTLINE_LEVEL)
        .map(|level| level + 1)
}

/// Detect numbered headings in plain text.
///
/// `1. Intro`, `2.3) Scope` and `4 - Costs` yield the number of dotted
/// components; `3Results` or `3 Résumé` (integer then capital or accented
/// letter) yields level 1. A multi-part numeral needs a separator.
pub(crate) fn detect_heading_from_text(text: &str) -> Option<u32> {
    let text = text.trim();
    let numeral = NUMERAL_PREFIX.find(text)?;
    let level = numeral.as_str().split('.').count() as u32;
    let rest = &text[numeral.end()..];
    let trimmed = rest.trim_start();

    if let Some(after) = trimmed.strip_prefix(NUMBER_SEPARATORS) {
        return (!after.trim().is_empty()).then_some(level);
    }

    let starts_heading_word = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || (!c.is_ascii() && c.is_alphabetic()));
    (level == 1 && starts_heading_word).then_some(1)
}

/// Classify a body paragraph; first match wins
pub(crate) fn classify_paragraph(
    tree: &XmlTree,
    para: NodeId,
    plain_text: &str,
    styles: &HeadingStyleMap,
) -> ParagraphClass {
    if let Some(level) = detect_heading_from_style(tree, para, styles) {
        return ParagraphClass::Heading(level);
    }
    if let Some(level) = detect_heading_from_outline(tree, para) {
        return ParagraphClass::Heading(level);
    }
    if let Some(level) = detect_heading_from_text(plain_text) {
        return ParagraphClass::Heading(level);
    }
    if let Some(level) = detect_list_level(tree, para) {
        return ParagraphClass::ListItem(level);
    }
    ParagraphClass::Paragraph
}
