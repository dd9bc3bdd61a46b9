//! List item detection
//!
//! Paragraphs that reference a numbering definition (`w:numPr`) are list
//! items; their level is the numbering indent level plus one.

use super::super::xml::{NodeId, XmlTree};

/// Detect a list level from paragraph numbering metadata
pub(crate) fn detect_list_level(tree: &XmlTree, para: NodeId) -> Option<u32> {
    let num_pr = tree
        .child(para, "pPr")
        .and_then(|props| tree.child(props, "numPr"))?;

    // numId 0 removes numbering inherited from the style
    let num_id = tree
        .child(num_pr, "numId")
        .and_then(|node| tree.attr(node, "val"));
    if num_id.is_some_and(|id| id.trim() == "0") {
        return None;
    }

    // Extract numbering level (default to 0 if not specified)
    let indent = tree
        .child(num_pr, "ilvl")
        .and_then(|node| tree.attr(node, "val"))
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(0);

    Some(indent + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_of(props: &str) -> Option<u32> {
        let tree = XmlTree::parse(&format!(r#"<w:p xmlns:w="urn:w"><w:pPr>{props}</w:pPr></w:p>"#))
            .unwrap();
        let para = tree.root_element().unwrap();
        detect_list_level(&tree, para)
    }

    #[test]
    fn test_list_levels() {
        assert_eq!(
            level_of(r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr>"#),
            Some(1)
        );
        assert_eq!(
            level_of(r#"<w:numPr><w:ilvl w:val="2"/><w:numId w:val="4"/></w:numPr>"#),
            Some(3)
        );
        assert_eq!(level_of(r#"<w:numPr><w:numId w:val="4"/></w:numPr>"#), Some(1));
    }

    #[test]
    fn test_numbering_removed_or_absent() {
        assert_eq!(level_of(r#"<w:numPr><w:numId w:val="0"/></w:numPr>"#), None);
        assert_eq!(level_of(r#"<w:jc w:val="center"/>"#), None);
    }
}
