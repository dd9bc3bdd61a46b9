//! In-place text substitution on cloned nodes
//!
//! Everything here edits the output arena only. Paragraph text is replaced by
//! rebuilding the runs from emphasis-marked text; tables are edited cell by
//! cell, strictly by position.

use super::super::models::*;
use super::super::parsing::formatting::{
    IMAGE_ELEMENTS, InlineContent, classify_inline, contains_images,
};
use super::super::parsing::markdown::parse_inline_markdown;
use super::super::parsing::table::{cell_paragraphs, row_cells, table_rows};
use super::super::xml::{NodeId, XmlTree};

/// Run properties that precede `w:b` in schema order
const BEFORE_BOLD: [&str; 2] = ["rStyle", "rFonts"];
/// Run properties that precede `w:i` in schema order
const BEFORE_ITALIC: [&str; 4] = ["rStyle", "rFonts", "b", "bCs"];
/// Emphasis toggles dropped from the captured style template
const EMPHASIS_PROPERTIES: [&str; 4] = ["b", "bCs", "i", "iCs"];

fn is_image_bearing(tree: &XmlTree, id: NodeId) -> bool {
    match tree.local_name(id) {
        Some(name) if IMAGE_ELEMENTS.contains(&name) => true,
        Some("AlternateContent") => contains_images(tree, id),
        _ => false,
    }
}

/// Whether a run holds nothing but its properties
fn run_is_empty(tree: &XmlTree, run: NodeId) -> bool {
    tree.element_children(run).all(|child| tree.is(child, "rPr"))
}

/// Remove every image-bearing element below `id`, and runs left empty by it.
/// Returns whether anything was removed.
pub(crate) fn strip_images(tree: &mut XmlTree, id: NodeId) -> bool {
    let mut removed_any = false;

    for child in tree.children(id).to_vec() {
        if is_image_bearing(tree, child) {
            tree.detach(child);
            removed_any = true;
        } else if strip_images(tree, child) {
            removed_any = true;
            if tree.is(child, "r") && run_is_empty(tree, child) {
                tree.detach(child);
            }
        }
    }

    removed_any
}

/// First text run of the inline content, looking inside hyperlinks
fn first_inline_run(tree: &XmlTree, parent: NodeId) -> Option<NodeId> {
    tree.element_children(parent)
        .find_map(|child| match classify_inline(tree, child) {
            InlineContent::Run(run) => Some(run),
            InlineContent::Hyperlink(link) => first_inline_run(tree, link),
            InlineContent::Other => None,
        })
}

/// Properties of the first run, without emphasis, as a detached copy
fn capture_run_style(tree: &mut XmlTree, para: NodeId) -> Option<NodeId> {
    let first_run = first_inline_run(tree, para)?;
    let props = tree
        .element_children(first_run)
        .find(|&child| tree.has_name(child, "w:rPr"))?;

    let style = tree.clone_subtree(props);
    for child in tree.children(style).to_vec() {
        if tree
            .local_name(child)
            .is_some_and(|name| EMPHASIS_PROPERTIES.contains(&name))
        {
            tree.detach(child);
        }
    }
    Some(style)
}

/// Insert an emphasis toggle after the properties that must precede it
fn insert_toggle(tree: &mut XmlTree, props: NodeId, name: &str, preceding: &[&str]) {
    let position = tree
        .children(props)
        .iter()
        .position(|&child| {
            !tree
                .local_name(child)
                .is_some_and(|local| preceding.contains(&local))
        })
        .unwrap_or(tree.children(props).len());
    let toggle = tree.new_element(name);
    tree.insert_child(props, position, toggle);
}

fn append_text(tree: &mut XmlTree, run: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    let t = tree.new_element_with("w:t", &[("xml:space", "preserve")]);
    let content = tree.new_text(text);
    tree.append_child(t, content);
    tree.append_child(run, t);
}

/// Build one run for a segment, styled like `style` plus its emphasis
pub(crate) fn build_run(
    tree: &mut XmlTree,
    style: Option<NodeId>,
    segment: &FormattedRun,
) -> NodeId {
    let run = tree.new_element("w:r");

    let props = match style {
        Some(style) => tree.clone_subtree(style),
        None => tree.new_element("w:rPr"),
    };
    if segment.formatting.bold {
        insert_toggle(tree, props, "w:b", &BEFORE_BOLD);
    }
    if segment.formatting.italic {
        insert_toggle(tree, props, "w:i", &BEFORE_ITALIC);
    }
    if !tree.children(props).is_empty() {
        tree.append_child(run, props);
    }

    let mut pending = String::new();
    for ch in segment.text.chars() {
        match ch {
            '\t' | '\n' => {
                append_text(tree, run, &std::mem::take(&mut pending));
                let name = if ch == '\t' { "w:tab" } else { "w:br" };
                let node = tree.new_element(name);
                tree.append_child(run, node);
            }
            '\r' => {}
            _ => pending.push(ch),
        }
    }
    append_text(tree, run, &pending);

    run
}

/// Replace a paragraph's content with runs built from marked text.
/// Paragraph properties are kept; runs, hyperlinks and bookmarks go.
pub(crate) fn set_paragraph_text(tree: &mut XmlTree, para: NodeId, text: &str) {
    let style = capture_run_style(tree, para);

    for child in tree.children(para).to_vec() {
        if !tree.is(child, "pPr") {
            tree.detach(child);
        }
    }

    for segment in parse_inline_markdown(text) {
        let run = build_run(tree, style, &segment);
        tree.append_child(para, run);
    }
}

/// Replace a cell's text line by line across its paragraphs.
/// Lines beyond the paragraph count go to the last paragraph.
pub(crate) fn set_cell_text(tree: &mut XmlTree, cell: NodeId, text: &str) {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut paragraphs = cell_paragraphs(tree, cell);
    if paragraphs.is_empty() {
        let para = tree.new_element("w:p");
        tree.append_child(cell, para);
        paragraphs.push(para);
    }

    let last = paragraphs.len() - 1;
    for (i, &para) in paragraphs.iter().enumerate() {
        let line = if i < last {
            lines.get(i).copied().unwrap_or_default().to_string()
        } else {
            lines.get(last..).map(|rest| rest.join("\n")).unwrap_or_default()
        };
        set_paragraph_text(tree, para, &line);
    }
}

/// Apply cell texts to an existing table by row/column position
pub(crate) fn set_table_text(tree: &mut XmlTree, table: NodeId, rows: &TableRows) {
    let row_nodes = table_rows(tree, table);
    if row_nodes.len() != rows.len() {
        log::warn!(
            "table has {} rows but {} were supplied; extra rows are ignored",
            row_nodes.len(),
            rows.len()
        );
    }

    for (row_node, row) in row_nodes.into_iter().zip(rows) {
        let cell_nodes = row_cells(tree, row_node);
        if cell_nodes.len() != row.len() {
            log::warn!(
                "row has {} cells but {} were supplied; extra cells are ignored",
                cell_nodes.len(),
                row.len()
            );
        }
        for (cell_node, cell) in cell_nodes.into_iter().zip(row) {
            set_cell_text(tree, cell_node, &cell.text);
        }
    }
}

/// Point the paragraph at a style, creating `pPr/pStyle` when absent
pub(crate) fn set_paragraph_style(tree: &mut XmlTree, para: NodeId, style_id: &str) {
    let props = tree.ensure_child(para, "w:pPr", 0);
    let style = tree.ensure_child(props, "w:pStyle", 0);
    tree.set_attr(style, "w:val", style_id);
}

/// Patch an explicit outline level, leaving paragraphs without one alone
pub(crate) fn set_outline_level(tree: &mut XmlTree, para: NodeId, level: u32) {
    let outline = tree
        .child(para, "pPr")
        .and_then(|props| tree.child(props, "outlineLvl"));
    if let Some(outline) = outline {
        tree.set_attr(outline, "w:val", &level.saturating_sub(1).to_string());
    }
}

/// Patch `numPr/ilvl` to `level - 1` on paragraphs that carry numbering
pub(crate) fn set_list_level(tree: &mut XmlTree, para: NodeId, level: u32) {
    let numbering = tree
        .child(para, "pPr")
        .and_then(|props| tree.child(props, "numPr"));
    if let Some(numbering) = numbering {
        let indent = tree.ensure_child(numbering, "w:ilvl", 0);
        tree.set_attr(indent, "w:val", &level.saturating_sub(1).to_string());
    }
}

/// Drop what must stay unique to the node a copy was taken from:
/// paragraph-level section breaks and revision-stable paragraph ids.
pub(crate) fn scrub_copied_paragraph(tree: &mut XmlTree, para: NodeId) {
    if let Some(section) = tree
        .child(para, "pPr")
        .and_then(|props| tree.child(props, "sectPr"))
    {
        tree.detach(section);
    }
    tree.remove_attr(para, "paraId");
    tree.remove_attr(para, "textId");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parsing::formatting::{extract_formatted_text, extract_paragraph_text};

    fn paragraph(xml: &str) -> (XmlTree, NodeId) {
        let tree = XmlTree::parse(&format!(r#"<w:p xmlns:w="urn:w">{xml}</w:p>"#)).unwrap();
        let para = tree.root_element().unwrap();
        (tree, para)
    }

    #[test]
    fn test_set_paragraph_text_keeps_style() {
        let (mut tree, para) = paragraph(
            r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:bookmarkStart w:id="0"/><w:r><w:rPr><w:rFonts w:ascii="Arial"/><w:b/><w:sz w:val="28"/></w:rPr><w:t>Old</w:t></w:r><w:hyperlink><w:r><w:t>link</w:t></w:r></w:hyperlink>"#,
        );

        set_paragraph_text(&mut tree, para, "New *text*");
        let xml = tree.to_xml().unwrap();

        assert_eq!(extract_formatted_text(&tree, para), "New *text*");
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(!xml.contains("bookmarkStart"));
        assert!(!xml.contains("hyperlink"));
        assert!(!xml.contains("<w:b/>"));
        assert_eq!(xml.matches(r#"<w:rFonts w:ascii="Arial"/>"#).count(), 2);
        assert!(xml.contains(r#"<w:rFonts w:ascii="Arial"/><w:i/><w:sz w:val="28"/>"#));
    }

    #[test]
    fn test_leading_equation_style_not_captured() {
        let (mut tree, para) = paragraph(
            r#"<m:oMath xmlns:m="urn:m"><m:r><m:rPr><m:sty m:val="p"/></m:rPr><m:t>A</m:t></m:r></m:oMath><w:r><w:rPr><w:sz w:val="24"/></w:rPr><w:t>is the area</w:t></w:r>"#,
        );

        set_paragraph_text(&mut tree, para, "is **the** area");
        let xml = tree.to_xml().unwrap();

        assert!(!xml.contains("<w:r><m:rPr>"));
        assert!(!xml.contains("m:sty"));
        assert!(xml.contains(r#"<w:rPr><w:b/><w:sz w:val="24"/></w:rPr>"#));
        assert_eq!(extract_formatted_text(&tree, para), "is **the** area");
    }

    #[test]
    fn test_bold_italic_order_in_properties() {
        let mut tree = XmlTree::parse(
            r#"<w:rPr xmlns:w="urn:w"><w:rStyle w:val="X"/><w:color w:val="FF0000"/></w:rPr>"#,
        )
        .unwrap();
        let style = tree.root_element().unwrap();
        let run = build_run(&mut tree, Some(style), &FormattedRun::new("a\tb\nc", true, true));
        tree.append_child(style, run);

        let xml = tree.to_xml().unwrap();
        assert!(xml.contains(r#"<w:rStyle w:val="X"/><w:b/><w:i/><w:color w:val="FF0000"/>"#));
        assert!(xml.contains(
            r#"<w:t xml:space="preserve">a</w:t><w:tab/><w:t xml:space="preserve">b</w:t><w:br/><w:t xml:space="preserve">c</w:t>"#
        ));
    }

    #[test]
    fn test_plain_text_without_style_has_no_properties() {
        let (mut tree, para) = paragraph(r#"<w:r><w:t>Hello</w:t></w:r>"#);
        set_paragraph_text(&mut tree, para, "Hello World");
        let xml = tree.to_xml().unwrap();
        assert!(!xml.contains("rPr"));
        assert_eq!(extract_paragraph_text(&tree, para), "Hello World");
    }

    #[test]
    fn test_strip_images() {
        let (mut tree, para) = paragraph(
            r#"<w:r><w:drawing/></w:r><w:r><w:t>kept</w:t><w:pict/></w:r><w:r><w:rPr/></w:r>"#,
        );
        assert!(strip_images(&mut tree, para));

        let runs: Vec<_> = tree.children_named(para, "r").collect();
        // the emptied run goes, the already-empty run stays
        assert_eq!(runs.len(), 2);
        assert!(!contains_images(&tree, para));
        assert_eq!(extract_paragraph_text(&tree, para), "kept");
    }

    #[test]
    fn test_cell_overflow_lines() {
        let mut tree = XmlTree::parse(
            r#"<w:tc xmlns:w="urn:w"><w:tcPr/><w:p><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>"#,
        )
        .unwrap();
        let cell = tree.root_element().unwrap();

        set_cell_text(&mut tree, cell, "one\ntwo\nthree");
        let paragraphs = cell_paragraphs(&tree, cell);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(extract_paragraph_text(&tree, paragraphs[0]), "one");
        assert_eq!(extract_paragraph_text(&tree, paragraphs[1]), "two\nthree");

        set_cell_text(&mut tree, cell, "only");
        assert_eq!(extract_paragraph_text(&tree, paragraphs[0]), "only");
        assert_eq!(extract_paragraph_text(&tree, paragraphs[1]), "");
    }

    #[test]
    fn test_style_and_level_patches() {
        let (mut tree, para) = paragraph(
            r#"<w:pPr><w:outlineLvl w:val="0"/><w:numPr><w:numId w:val="3"/></w:numPr><w:sectPr/></w:pPr>"#,
        );
        set_paragraph_style(&mut tree, para, "Heading3");
        set_outline_level(&mut tree, para, 3);
        set_list_level(&mut tree, para, 2);
        scrub_copied_paragraph(&mut tree, para);

        let xml = tree.to_xml().unwrap();
        assert!(xml.contains(r#"<w:pPr><w:pStyle w:val="Heading3"/><w:outlineLvl w:val="2"/>"#));
        assert!(xml.contains(r#"<w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr>"#));
        assert!(!xml.contains("sectPr"));
    }

    #[test]
    fn test_list_level_ignored_without_numbering() {
        let (mut tree, para) = paragraph(r#"<w:r><w:t>x</w:t></w:r>"#);
        set_list_level(&mut tree, para, 2);
        assert!(!tree.to_xml().unwrap().contains("ilvl"));
    }
}
