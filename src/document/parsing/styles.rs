//! Heading styles from the style definitions part
//!
//! A paragraph style is a heading style when it declares an outline level,
//! or when its display name reads `Heading <n>`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::super::xml::{NodeId, XmlTree};
use crate::error::Result;

static HEADING_STYLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^heading\s*(\d+)$").unwrap());

/// Outline levels 0-8 are headings; 9 is body text
pub(crate) const MAX_OUTLINE_LEVEL: u32 = 8;

/// Lookup from paragraph style id to heading level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadingStyleMap {
    levels: HashMap<String, u32>,
}

impl HeadingStyleMap {
    /// Build the map from `styles.xml` content
    pub fn from_styles_xml(xml: &str) -> Result<Self> {
        let tree = XmlTree::parse(xml)?;
        let mut levels = HashMap::new();

        if let Some(root) = tree.root_element() {
            for style in tree.children_named(root, "style") {
                if tree.attr(style, "type").is_some_and(|kind| kind != "paragraph") {
                    continue;
                }
                let Some(style_id) = tree.attr(style, "styleId") else {
                    continue;
                };
                if let Some(level) = style_heading_level(&tree, style) {
                    levels.insert(style_id.to_string(), level);
                }
            }
        }

        log::debug!("found {} heading styles", levels.len());
        Ok(HeadingStyleMap { levels })
    }

    pub fn from_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        HeadingStyleMap {
            levels: levels
                .into_iter()
                .map(|(style, level)| (style.into(), level))
                .collect(),
        }
    }

    pub fn level_for(&self, style_id: &str) -> Option<u32> {
        self.levels.get(style_id).copied()
    }

    /// Style id to use for a heading of `level`.
    /// Prefers `Heading<level>` when defined, else the lowest id mapping to it.
    pub fn style_for_level(&self, level: u32) -> Option<&str> {
        let conventional = format!("Heading{level}");
        if self.levels.get(&conventional) == Some(&level) {
            return self.levels.get_key_value(&conventional).map(|(id, _)| id.as_str());
        }
        self.levels
            .iter()
            .filter(|(_, mapped)| **mapped == level)
            .map(|(id, _)| id.as_str())
            .min()
    }
}

fn style_heading_level(tree: &XmlTree, style: NodeId) -> Option<u32> {
    let outline = tree
        .child(style, "pPr")
        .and_then(|props| tree.child(props, "outlineLvl"))
        .and_then(|node| tree.attr(node, "val"))
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|level| *level <= MAX_OUTLINE_LEVEL);
    if let Some(outline) = outline {
        return Some(outline + 1);
    }

    let name = tree
        .child(style, "name")
        .and_then(|node| tree.attr(node, "val"))?;
    HEADING_STYLE_NAME
        .captures(name.trim())
        .and_then(|captures| captures[1].parse::<u32>().ok())
        .filter(|level| *level >= 1)
}
