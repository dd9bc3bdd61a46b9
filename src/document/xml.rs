//! Owned XML arena
//!
//! Markup parts are parsed with quick-xml into an index-addressed arena.
//! Nodes are never freed: detaching a node only unlinks it, so `NodeId`s taken
//! from a tree stay valid for that tree's lifetime. Edits that need pristine
//! source nodes copy them across arenas with [`XmlTree::import_subtree`].

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::error::{Error, Result};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Synthetic document node holding the prolog and the root element
    Root,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    declaration: Option<Declaration>,
}

/// Local part of a qualified name (`w:p` -> `p`)
pub fn local_name(qualified: &str) -> &str {
    qualified
        .rsplit_once(':')
        .map_or(qualified, |(_, local)| local)
}

impl XmlTree {
    const ROOT: NodeId = 0;

    fn empty() -> Self {
        XmlTree {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
        }
    }

    /// Parse a markup part
    pub fn parse(xml: &str) -> Result<Self> {
        let mut tree = XmlTree::empty();
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack = vec![Self::ROOT];

        loop {
            let event = reader.read_event().map_err(Error::xml)?;
            let parent = *stack.last().unwrap_or(&Self::ROOT);
            match event {
                Event::Decl(decl) => {
                    let version = String::from_utf8_lossy(&decl.version().map_err(Error::xml)?)
                        .into_owned();
                    let encoding = decl
                        .encoding()
                        .and_then(|value| value.ok())
                        .map(|value| String::from_utf8_lossy(&value).into_owned());
                    let standalone = decl
                        .standalone()
                        .and_then(|value| value.ok())
                        .map(|value| String::from_utf8_lossy(&value).into_owned());
                    tree.declaration = Some(Declaration {
                        version,
                        encoding,
                        standalone,
                    });
                }
                Event::Start(start) => {
                    let id = tree.push_element(parent, &start)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    tree.push_element(parent, &start)?;
                }
                Event::End(_) => {
                    if stack.len() <= 1 {
                        return Err(Error::xml("unbalanced closing tag"));
                    }
                    stack.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(Error::xml)?.into_owned();
                    let id = tree.push(NodeData::Text(text));
                    tree.append_child(parent, id);
                }
                Event::CData(data) => {
                    let id =
                        tree.push(NodeData::CData(String::from_utf8_lossy(&data).into_owned()));
                    tree.append_child(parent, id);
                }
                Event::Comment(comment) => {
                    let id = tree.push(NodeData::Comment(
                        String::from_utf8_lossy(&comment).into_owned(),
                    ));
                    tree.append_child(parent, id);
                }
                Event::PI(pi) => {
                    let id = tree.push(NodeData::ProcessingInstruction(
                        String::from_utf8_lossy(&pi).into_owned(),
                    ));
                    tree.append_child(parent, id);
                }
                Event::DocType(doctype) => {
                    let id = tree.push(NodeData::DocType(
                        String::from_utf8_lossy(&doctype).into_owned(),
                    ));
                    tree.append_child(parent, id);
                }
                Event::Eof => break,
            }
        }

        if stack.len() != 1 {
            return Err(Error::xml("unexpected end of document"));
        }
        Ok(tree)
    }

    fn push_element(&mut self, parent: NodeId, start: &BytesStart) -> Result<NodeId> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(Error::xml)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(Error::xml)?.into_owned();
            attributes.push((key, value));
        }
        let id = self.push(NodeData::Element { name, attributes });
        self.append_child(parent, id);
        Ok(id)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Serialize the tree back to markup
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(Error::xml)?;
        }
        for &child in &self.nodes[Self::ROOT].children {
            self.write_node(&mut writer, child)?;
        }

        String::from_utf8(writer.into_inner()).map_err(Error::xml)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        let node = &self.nodes[id];
        match &node.data {
            NodeData::Root => {}
            NodeData::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if node.children.is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(Error::xml)?;
                } else {
                    writer.write_event(Event::Start(start)).map_err(Error::xml)?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(name.as_str())))
                        .map_err(Error::xml)?;
                }
            }
            NodeData::Text(text) => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(Error::xml)?;
            }
            NodeData::CData(data) => {
                writer
                    .write_event(Event::CData(BytesCData::new(data.as_str())))
                    .map_err(Error::xml)?;
            }
            NodeData::Comment(comment) => {
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                    .map_err(Error::xml)?;
            }
            NodeData::ProcessingInstruction(content) => {
                writer
                    .write_event(Event::PI(BytesPI::new(content.as_str())))
                    .map_err(Error::xml)?;
            }
            NodeData::DocType(doctype) => {
                writer
                    .write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))
                    .map_err(Error::xml)?;
            }
        }
        Ok(())
    }

    // Navigation

    /// The single top-level element
    pub fn root_element(&self) -> Option<NodeId> {
        self.element_children(Self::ROOT).next()
    }

    /// Qualified element name, `None` for non-element nodes
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].data, NodeData::Element { .. })
    }

    /// Whether `id` is an element with the given local name
    pub fn is(&self, id: NodeId, local: &str) -> bool {
        self.name(id).is_some_and(|name| local_name(name) == local)
    }

    /// Whether `id` is an element with exactly this qualified name
    pub fn has_name(&self, id: NodeId, qualified: &str) -> bool {
        self.name(id) == Some(qualified)
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(local_name)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
    }

    /// First child element with the given local name
    pub fn child(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.element_children(id).find(|&child| self.is(child, local))
    }

    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.element_children(id).filter(move |&child| self.is(child, local))
    }

    /// All descendants in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        result
    }

    /// Attribute value looked up by local name (`val` matches `w:val`)
    pub fn attr(&self, id: NodeId, local: &str) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| local_name(key) == local)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of the direct text children
    pub fn text(&self, id: NodeId) -> String {
        self.nodes[id]
            .children
            .iter()
            .filter_map(|&child| match &self.nodes[child].data {
                NodeData::Text(text) | NodeData::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    // Construction and editing

    /// Create a detached element
    pub fn new_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element {
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached element carrying attributes
    pub fn new_element_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        self.push(NodeData::Element {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        })
    }

    pub fn new_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Set an attribute, replacing one with the same local name
    pub fn set_attr(&mut self, id: NodeId, qualified: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id].data {
            let local = local_name(qualified);
            match attributes.iter_mut().find(|(key, _)| local_name(key) == local) {
                Some(existing) => existing.1 = value.to_string(),
                None => attributes.push((qualified.to_string(), value.to_string())),
            }
        }
    }

    /// Remove an attribute by local name
    pub fn remove_attr(&mut self, id: NodeId, local: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id].data {
            attributes.retain(|(key, _)| local_name(key) != local);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        let index = index.min(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(index, child);
    }

    /// Unlink a node from its parent; the node itself stays in the arena
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }

    /// Unlink all children of `id`, returning them in order
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id].children);
        for &child in &children {
            self.nodes[child].parent = None;
        }
        children
    }

    /// Get or create the first child with the given local name.
    /// New children are inserted at `index` (clamped).
    pub fn ensure_child(&mut self, parent: NodeId, qualified: &str, index: usize) -> NodeId {
        if let Some(existing) = self.child(parent, local_name(qualified)) {
            return existing;
        }
        let child = self.new_element(qualified);
        self.insert_child(parent, index, child);
        child
    }

    /// Deep copy of a subtree within this arena, returned detached
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let data = self.nodes[id].data.clone();
        let children = self.nodes[id].children.clone();
        let copy = self.push(data);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Deep copy of a subtree from another arena, returned detached
    pub fn import_subtree(&mut self, source: &XmlTree, id: NodeId) -> NodeId {
        let copy = self.push(source.nodes[id].data.clone());
        for &child in &source.nodes[id].children {
            let child_copy = self.import_subtree(source, child);
            self.append_child(copy, child_copy);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve">a &amp; b </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_parse_navigation() {
        let tree = XmlTree::parse(SAMPLE).unwrap();
        let document = tree.root_element().unwrap();
        assert!(tree.is(document, "document"));

        let body = tree.child(document, "body").unwrap();
        let children: Vec<_> = tree.element_children(body).collect();
        assert_eq!(children.len(), 2);
        assert!(tree.is(children[1], "sectPr"));

        let t = tree
            .descendants(body)
            .into_iter()
            .find(|&id| tree.is(id, "t"))
            .unwrap();
        assert_eq!(tree.text(t), "a & b ");
        assert_eq!(tree.attr(t, "space"), Some("preserve"));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let tree = XmlTree::parse(SAMPLE).unwrap();
        let xml = tree.to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("a &amp; b "));
        assert!(xml.contains("<w:sectPr/>"));

        let reparsed = XmlTree::parse(&xml).unwrap();
        assert_eq!(reparsed.to_xml().unwrap(), xml);
    }

    #[test]
    fn test_edit_operations() {
        let mut tree = XmlTree::parse(SAMPLE).unwrap();
        let document = tree.root_element().unwrap();
        let body = tree.child(document, "body").unwrap();

        let removed = tree.clear_children(body);
        assert_eq!(removed.len(), 2);
        assert!(tree.children(body).is_empty());

        let copy = tree.clone_subtree(removed[0]);
        tree.append_child(body, copy);
        tree.append_child(body, removed[1]);
        assert_eq!(tree.element_children(body).count(), 2);
        assert_ne!(copy, removed[0]);

        let p_pr = tree.ensure_child(copy, "w:pPr", 0);
        assert_eq!(tree.children(copy)[0], p_pr);
        tree.set_attr(p_pr, "w:val", "1");
        tree.set_attr(p_pr, "w:val", "2");
        assert_eq!(tree.attr(p_pr, "val"), Some("2"));
    }

    #[test]
    fn test_import_subtree_leaves_source_untouched() {
        let source = XmlTree::parse(SAMPLE).unwrap();
        let mut target = source.clone();
        let body = target.child(target.root_element().unwrap(), "body").unwrap();
        let originals = target.clear_children(body);

        let imported = target.import_subtree(&source, originals[0]);
        target.append_child(body, imported);
        target.set_attr(imported, "w:rsidR", "00AB");

        assert_eq!(source.to_xml().unwrap(), XmlTree::parse(SAMPLE).unwrap().to_xml().unwrap());
        assert!(target.to_xml().unwrap().contains("w:rsidR=\"00AB\""));
    }

    #[test]
    fn test_unbalanced_markup_is_rejected() {
        assert!(XmlTree::parse("<a><b></a>").is_err());
    }
}
