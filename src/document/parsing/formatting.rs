//! Text extraction and formatting utilities
//!
//! This module walks the inline content of a paragraph (runs, hyperlinks)
//! and renders it as text with emphasis markers.

use super::super::models::*;
use super::super::xml::{NodeId, XmlTree};

/// Elements that carry embedded images
pub(crate) const IMAGE_ELEMENTS: [&str; 2] = ["drawing", "pict"];

/// Direct children of a paragraph that matter for text
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum InlineContent {
    Run(NodeId),
    Hyperlink(NodeId),
    Other,
}

/// Children of a run
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RunContent {
    Text(String),
    Tab,
    Break,
    Image,
    Other,
}

/// Only WordprocessingML runs count; math runs (`m:r`) are other content
pub(crate) fn classify_inline(tree: &XmlTree, id: NodeId) -> InlineContent {
    match tree.name(id) {
        Some("w:r") => InlineContent::Run(id),
        Some("w:hyperlink") => InlineContent::Hyperlink(id),
        _ => InlineContent::Other,
    }
}

pub(crate) fn classify_run_child(tree: &XmlTree, id: NodeId) -> RunContent {
    match tree.local_name(id) {
        Some("t") => RunContent::Text(tree.text(id)),
        Some("tab") => RunContent::Tab,
        Some("br") | Some("cr") => RunContent::Break,
        Some(name) if IMAGE_ELEMENTS.contains(&name) => RunContent::Image,
        _ => RunContent::Other,
    }
}

/// Parse a WML toggle element (`w:b`, `w:i`).
/// Present with no val, or a val other than "0"/"false"/"off", means true.
pub(crate) fn wml_bool(tree: &XmlTree, parent: NodeId, name: &str) -> Option<bool> {
    tree.child(parent, name).map(|node| {
        tree.attr(node, "val")
            .is_none_or(|value| !matches!(value, "0" | "false" | "off"))
    })
}

/// Bold/italic flags set directly on a run
pub(crate) fn extract_run_formatting(tree: &XmlTree, run: NodeId) -> TextFormatting {
    let Some(props) = tree.child(run, "rPr") else {
        return TextFormatting::default();
    };
    TextFormatting {
        bold: wml_bool(tree, props, "b").unwrap_or(false),
        italic: wml_bool(tree, props, "i").unwrap_or(false),
    }
}

/// Extract text from a run; tabs and breaks become `\t` and `\n`
pub(crate) fn extract_run_text(tree: &XmlTree, run: NodeId) -> String {
    let mut text = String::new();

    for child in tree.element_children(run) {
        match classify_run_child(tree, child) {
            RunContent::Text(value) => text.push_str(&value),
            RunContent::Tab => text.push('\t'),
            RunContent::Break => text.push('\n'),
            RunContent::Image | RunContent::Other => {}
        }
    }

    text
}

/// Collect the formatted runs of a paragraph, descending into hyperlinks
pub(crate) fn extract_paragraph_runs(tree: &XmlTree, para: NodeId) -> Vec<FormattedRun> {
    let mut runs = Vec::new();
    visit_inline(tree, para, &mut runs);
    runs
}

fn visit_inline(tree: &XmlTree, parent: NodeId, runs: &mut Vec<FormattedRun>) {
    for child in tree.element_children(parent) {
        match classify_inline(tree, child) {
            InlineContent::Run(run) => {
                let text = extract_run_text(tree, run);
                if !text.is_empty() {
                    runs.push(FormattedRun {
                        text,
                        formatting: extract_run_formatting(tree, run),
                    });
                }
            }
            InlineContent::Hyperlink(link) => visit_inline(tree, link, runs),
            InlineContent::Other => {}
        }
    }
}

/// Plain (marker-free) text of a paragraph
pub(crate) fn extract_paragraph_text(tree: &XmlTree, para: NodeId) -> String {
    extract_paragraph_runs(tree, para)
        .into_iter()
        .map(|run| run.text)
        .collect()
}

/// Paragraph text with emphasis markers
pub(crate) fn extract_formatted_text(tree: &XmlTree, para: NodeId) -> String {
    render_runs(&FormattedRun::consolidate_runs(extract_paragraph_runs(
        tree, para,
    )))
}

/// Render runs with marker precedence: `***` for bold+italic, `**` bold, `*` italic
pub fn render_runs(runs: &[FormattedRun]) -> String {
    let mut text = String::new();

    for run in runs.iter().filter(|run| !run.text.is_empty()) {
        let marker = match (run.formatting.bold, run.formatting.italic) {
            (true, true) => "***",
            (true, false) => "**",
            (false, true) => "*",
            (false, false) => "",
        };
        text.push_str(marker);
        text.push_str(&run.text);
        text.push_str(marker);
    }

    text
}

/// Whether any image element sits anywhere below `id`
pub(crate) fn contains_images(tree: &XmlTree, id: NodeId) -> bool {
    tree.descendants(id).into_iter().any(|node| {
        tree.local_name(node)
            .is_some_and(|name| IMAGE_ELEMENTS.contains(&name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(xml: &str) -> (XmlTree, NodeId) {
        let tree = XmlTree::parse(&format!(r#"<w:p xmlns:w="urn:w">{xml}</w:p>"#)).unwrap();
        let para = tree.root_element().unwrap();
        (tree, para)
    }

    #[test]
    fn test_markdown_rendering_of_mixed_runs() {
        let (tree, para) = paragraph(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>a</w:t></w:r><w:r><w:t xml:space="preserve"> </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>b</w:t></w:r><w:r><w:t xml:space="preserve"> </w:t></w:r><w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>c</w:t></w:r>"#,
        );
        assert_eq!(extract_formatted_text(&tree, para), "**a** *b* ***c***");
        assert_eq!(extract_paragraph_text(&tree, para), "a b c");
    }

    #[test]
    fn test_adjacent_runs_merge() {
        let (tree, para) = paragraph(
            r#"<w:r><w:rPr><w:b/></w:rPr><w:t>Hel</w:t></w:r><w:r><w:rPr><w:b w:val="true"/></w:rPr><w:t>lo</w:t></w:r><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>!</w:t></w:r>"#,
        );
        assert_eq!(extract_formatted_text(&tree, para), "**Hello**!");
    }

    #[test]
    fn test_hyperlinks_tabs_and_breaks() {
        let (tree, para) = paragraph(
            r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r><w:hyperlink><w:r><w:t>link</w:t><w:br/></w:r></w:hyperlink>"#,
        );
        assert_eq!(extract_formatted_text(&tree, para), "a\tblink\n");
    }

    #[test]
    fn test_images_are_ignored_for_text() {
        let (tree, para) =
            paragraph(r#"<w:r><w:drawing><wp:inline/></w:drawing></w:r><w:r><w:t>caption</w:t></w:r>"#);
        assert!(contains_images(&tree, para));
        assert_eq!(extract_formatted_text(&tree, para), "caption");
    }
}
