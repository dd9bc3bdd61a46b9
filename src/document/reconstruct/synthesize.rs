//! Building nodes for blocks the original document did not have
//!
//! Paragraph-like blocks copy their template's properties and get fresh runs.
//! Tables copy table, row and cell properties from the template table but
//! never its content. Without a template each kind falls back to a minimal
//! node of its own.

use super::super::models::*;
use super::super::parsing::table::{cell_paragraphs, row_cells, table_rows};
use super::super::xml::{NodeId, XmlTree};
use super::ReconstructContext;
use super::rewrite::{
    scrub_copied_paragraph, set_list_level, set_outline_level, set_paragraph_style,
    set_paragraph_text, strip_images,
};

/// Indentation per list level for paragraphs built without a template, in twips
const LIST_INDENT_STEP: u32 = 720;
/// Cell markers that only make sense in the template's own geometry
const MERGE_PROPERTIES: [&str; 3] = ["gridSpan", "vMerge", "hMerge"];
const BORDER_EDGES: [&str; 6] = ["top", "left", "bottom", "right", "insideH", "insideV"];

/// Synthesize the node for a block that has no counterpart in the original
pub(crate) fn synthesize_block(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    block: &Block,
) -> NodeId {
    match block {
        Block::Title { text, .. } => match ctx.templates.title {
            Some(template) => paragraph_from_template(out, ctx, template, text),
            None => styled_paragraph(out, Some("Title"), text),
        },
        Block::Paragraph { text, .. } => match ctx.templates.paragraph {
            Some(template) => paragraph_from_template(out, ctx, template, text),
            None => styled_paragraph(out, None, text),
        },
        Block::Heading { level, text, .. } => synthesize_heading(out, ctx, *level, text),
        Block::ListItem { level, text, .. } => synthesize_list_item(out, ctx, *level, text),
        Block::Table { rows, .. } => match ctx.templates.table {
            Some(template) => table_from_template(out, ctx, template, rows),
            None => default_table(out, ctx.options.default_table_width, rows),
        },
    }
}

/// Copy a template paragraph into the output arena, ready for new text
fn copy_paragraph(out: &mut XmlTree, source: &XmlTree, template: NodeId) -> NodeId {
    let para = out.import_subtree(source, template);
    strip_images(out, para);
    scrub_copied_paragraph(out, para);
    para
}

fn paragraph_from_template(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    template: NodeId,
    text: &str,
) -> NodeId {
    let para = copy_paragraph(out, ctx.source, template);
    set_paragraph_text(out, para, text);
    para
}

fn styled_paragraph(out: &mut XmlTree, style: Option<&str>, text: &str) -> NodeId {
    let para = out.new_element("w:p");
    if let Some(style) = style {
        set_paragraph_style(out, para, style);
    }
    set_paragraph_text(out, para, text);
    para
}

fn heading_style(ctx: ReconstructContext<'_>, level: u32) -> String {
    ctx.styles
        .style_for_level(level)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Heading{level}"))
}

fn synthesize_heading(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    level: u32,
    text: &str,
) -> NodeId {
    let Some((template_level, template)) = ctx.templates.heading(level) else {
        log::debug!("no heading template; building a bare level {level} heading");
        return styled_paragraph(out, Some(heading_style(ctx, level).as_str()), text);
    };

    let para = paragraph_from_template(out, ctx, template, text);
    if template_level != level {
        log::debug!("level {level} heading built from the level {template_level} template");
        set_paragraph_style(out, para, &heading_style(ctx, level));
        set_outline_level(out, para, level);
    }
    para
}

fn synthesize_list_item(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    level: u32,
    text: &str,
) -> NodeId {
    if let Some(template) = ctx.templates.list_item {
        let para = paragraph_from_template(out, ctx, template, text);
        set_list_level(out, para, level);
        return para;
    }

    // No numbering definition to point at: the item comes back as a paragraph
    log::debug!("no list template; building an indented level {level} paragraph");
    let para = styled_paragraph(out, Some("ListParagraph"), text);
    let props = out.ensure_child(para, "w:pPr", 0);
    let indent = out.new_element_with(
        "w:ind",
        &[("w:left", &(LIST_INDENT_STEP * level.max(1)).to_string())],
    );
    out.append_child(props, indent);
    para
}

/// Column count of the widest row, at least one
fn column_count(rows: &TableRows) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0).max(1)
}

/// Row texts padded so every row has at least one cell
fn row_texts(rows: &TableRows) -> Vec<Vec<&str>> {
    if rows.is_empty() {
        return vec![vec![""]];
    }
    rows.iter()
        .map(|row| {
            if row.is_empty() {
                vec![""]
            } else {
                row.iter().map(|cell| cell.text.as_str()).collect()
            }
        })
        .collect()
}

fn even_widths(total: u32, columns: usize) -> Vec<u32> {
    let columns = columns.max(1) as u32;
    vec![total / columns; columns as usize]
}

fn build_grid(out: &mut XmlTree, widths: &[u32]) -> NodeId {
    let grid = out.new_element("w:tblGrid");
    for width in widths {
        let column = out.new_element_with("w:gridCol", &[("w:w", &width.to_string())]);
        out.append_child(grid, column);
    }
    grid
}

fn cell_width(out: &mut XmlTree, width: u32) -> NodeId {
    out.new_element_with("w:tcW", &[("w:w", &width.to_string()), ("w:type", "dxa")])
}

fn dxa_attr(tree: &XmlTree, node: NodeId) -> Option<u32> {
    let unit = tree.attr(node, "type").unwrap_or("dxa");
    if unit != "dxa" {
        return None;
    }
    tree.attr(node, "w")
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|width| *width > 0)
}

/// Total width of a template table: `tblW` in twips, else the grid sum
fn template_width(source: &XmlTree, table: NodeId) -> Option<u32> {
    let declared = source
        .child(table, "tblPr")
        .and_then(|props| source.child(props, "tblW"))
        .and_then(|width| dxa_attr(source, width));
    if declared.is_some() {
        return declared;
    }

    let grid = source.child(table, "tblGrid")?;
    let sum: u32 = source
        .children_named(grid, "gridCol")
        .filter_map(|column| source.attr(column, "w"))
        .filter_map(|value| value.parse::<u32>().ok())
        .sum();
    (sum > 0).then_some(sum)
}

/// Fill a fresh cell with one paragraph per line
fn fill_cell(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    cell: NodeId,
    paragraph: Option<NodeId>,
    text: &str,
) {
    for line in text.split('\n') {
        let para = match paragraph {
            Some(template) => copy_paragraph(out, ctx.source, template),
            None => out.new_element("w:p"),
        };
        set_paragraph_text(out, para, line);
        out.append_child(cell, para);
    }
}

fn table_from_template(
    out: &mut XmlTree,
    ctx: ReconstructContext<'_>,
    template: NodeId,
    rows: &TableRows,
) -> NodeId {
    let source = ctx.source;
    let columns = column_count(rows);
    let table = out.new_element("w:tbl");

    if let Some(props) = source.child(template, "tblPr") {
        let props = out.import_subtree(source, props);
        out.append_child(table, props);
    }

    // Keep the template grid only when it already has the right shape
    let template_grid = source.child(template, "tblGrid").filter(|&grid| {
        source.children_named(grid, "gridCol").count() == columns
    });
    let regenerated_widths = match template_grid {
        Some(grid) => {
            let grid = out.import_subtree(source, grid);
            out.append_child(table, grid);
            None
        }
        None => {
            let total = template_width(source, template).unwrap_or(ctx.options.default_table_width);
            let widths = even_widths(total, columns);
            let grid = build_grid(out, &widths);
            out.append_child(table, grid);
            Some(widths)
        }
    };

    let template_rows = table_rows(source, template);
    for (r, texts) in row_texts(rows).into_iter().enumerate() {
        let template_row = template_rows.get(r).or(template_rows.last()).copied();
        let row = out.new_element("w:tr");
        if let Some(props) = template_row.and_then(|row| source.child(row, "trPr")) {
            let props = out.import_subtree(source, props);
            out.append_child(row, props);
        }

        let template_cells = template_row
            .map(|row| row_cells(source, row))
            .unwrap_or_default();
        for (c, text) in texts.into_iter().enumerate() {
            let template_cell = template_cells.get(c).or(template_cells.last()).copied();
            let cell = out.new_element("w:tc");

            let props = match template_cell.and_then(|cell| source.child(cell, "tcPr")) {
                Some(props) => {
                    let props = out.import_subtree(source, props);
                    for child in out.children(props).to_vec() {
                        if out
                            .local_name(child)
                            .is_some_and(|name| MERGE_PROPERTIES.contains(&name))
                        {
                            out.detach(child);
                        }
                    }
                    props
                }
                None => out.new_element("w:tcPr"),
            };
            if let Some(widths) = &regenerated_widths {
                if let Some(existing) = out.child(props, "tcW") {
                    out.detach(existing);
                }
                let width = cell_width(out, widths.get(c).copied().unwrap_or_default());
                out.insert_child(props, 0, width);
            }
            out.append_child(cell, props);

            let paragraph =
                template_cell.and_then(|cell| cell_paragraphs(source, cell).first().copied());
            fill_cell(out, ctx, cell, paragraph, text);
            out.append_child(row, cell);
        }
        out.append_child(table, row);
    }

    log::debug!("table with {columns} columns built from the table template");
    table
}

/// A bordered table spanning `width` twips, split evenly across columns
fn default_table(out: &mut XmlTree, width: u32, rows: &TableRows) -> NodeId {
    let columns = column_count(rows);
    let widths = even_widths(width, columns);
    let table = out.new_element("w:tbl");

    let props = out.new_element("w:tblPr");
    let table_width =
        out.new_element_with("w:tblW", &[("w:w", &width.to_string()), ("w:type", "dxa")]);
    out.append_child(props, table_width);
    let borders = out.new_element("w:tblBorders");
    for edge in BORDER_EDGES {
        let border = out.new_element_with(
            &format!("w:{edge}"),
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        );
        out.append_child(borders, border);
    }
    out.append_child(props, borders);
    out.append_child(table, props);

    let grid = build_grid(out, &widths);
    out.append_child(table, grid);

    for texts in row_texts(rows) {
        let row = out.new_element("w:tr");
        for (c, text) in texts.into_iter().enumerate() {
            let cell = out.new_element("w:tc");
            let cell_props = out.new_element("w:tcPr");
            let cell_w = cell_width(out, widths.get(c).copied().unwrap_or_default());
            out.append_child(cell_props, cell_w);
            out.append_child(cell, cell_props);
            for line in text.split('\n') {
                let para = out.new_element("w:p");
                set_paragraph_text(out, para, line);
                out.append_child(cell, para);
            }
            out.append_child(row, cell);
        }
        out.append_child(table, row);
    }

    log::debug!("no table template; built a default {columns}-column table");
    table
}
