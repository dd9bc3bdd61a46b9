use std::collections::{BTreeMap, HashMap};

use super::super::models::*;
use super::super::xml::NodeId;

/// Exemplar nodes in the original arena, one per block kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TemplateSet {
    pub(crate) title: Option<NodeId>,
    pub(crate) paragraph: Option<NodeId>,
    pub(crate) list_item: Option<NodeId>,
    pub(crate) headings: BTreeMap<u32, NodeId>,
    pub(crate) table: Option<NodeId>,
}

impl TemplateSet {
    /// First node of each kind, walking the original blocks in order
    pub(crate) fn collect(blocks: &[Block], nodes: &HashMap<String, NodeId>) -> Self {
        let mut templates = TemplateSet::default();

        for block in blocks {
            let Some(&node) = nodes.get(block.id()) else {
                continue;
            };
            let slot = match block {
                Block::Title { .. } => &mut templates.title,
                Block::Paragraph { .. } => &mut templates.paragraph,
                Block::ListItem { .. } => &mut templates.list_item,
                Block::Table { .. } => &mut templates.table,
                Block::Heading { level, .. } => {
                    templates.headings.entry(*level).or_insert(node);
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(node);
            }
        }

        log::debug!(
            "templates: title={:?} paragraph={:?} list_item={:?} headings={:?} table={:?}",
            templates.title,
            templates.paragraph,
            templates.list_item,
            templates.headings.keys().collect::<Vec<_>>(),
            templates.table
        );
        templates
    }

    /// Heading template for `level`: exact match, else the nearest level,
    /// preferring the lower level on ties. Returns the template's level too.
    pub(crate) fn heading(&self, level: u32) -> Option<(u32, NodeId)> {
        self.headings
            .iter()
            .min_by_key(|(candidate, _)| (candidate.abs_diff(level), **candidate))
            .map(|(&candidate, &node)| (candidate, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(index: usize, level: u32) -> Block {
        Block::Heading {
            id: block_id(index),
            level,
            text: format!("Heading {index}"),
        }
    }

    fn paragraph(index: usize) -> Block {
        Block::Paragraph {
            id: block_id(index),
            text: "text".to_string(),
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let blocks = vec![paragraph(0), heading(1, 2), paragraph(2), heading(3, 2)];
        let nodes: HashMap<String, NodeId> =
            (0..4).map(|i| (block_id(i), 10 + i)).collect();

        let templates = TemplateSet::collect(&blocks, &nodes);
        assert_eq!(templates.paragraph, Some(10));
        assert_eq!(templates.headings.get(&2), Some(&11));
        assert_eq!(templates.title, None);
        assert_eq!(templates.table, None);
    }

    #[test]
    fn test_nearest_heading_prefers_lower_level() {
        let mut templates = TemplateSet::default();
        templates.headings.insert(1, 100);
        templates.headings.insert(3, 300);

        assert_eq!(templates.heading(3), Some((3, 300)));
        assert_eq!(templates.heading(2), Some((1, 100)));
        assert_eq!(templates.heading(6), Some((3, 300)));
        assert_eq!(TemplateSet::default().heading(1), None);
    }
}
