//! Body traversal and block identity
//!
//! Every `w:p` and `w:tbl` directly under the body consumes one index, in
//! document order, whether or not it ends up as a block. Extraction and
//! reconstruction both walk the body through [`walk_body`] so an id always
//! maps back to the node it was derived from.

use super::super::xml::{NodeId, XmlTree};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyNode {
    Paragraph { index: usize, node: NodeId },
    Table { index: usize, node: NodeId },
    /// Section properties, bookmarks, content controls and the like
    Other(NodeId),
}

/// Locate `w:document/w:body`
pub(crate) fn find_body(tree: &XmlTree) -> Result<NodeId> {
    tree.root_element()
        .filter(|&root| tree.is(root, "document"))
        .and_then(|root| tree.child(root, "body"))
        .ok_or_else(|| Error::InvalidFormat("document body element not found".to_string()))
}

pub(crate) fn walk_body(tree: &XmlTree, body: NodeId) -> Vec<BodyNode> {
    let mut index = 0;
    tree.element_children(body)
        .map(|node| match tree.local_name(node) {
            Some("p") => {
                index += 1;
                BodyNode::Paragraph {
                    index: index - 1,
                    node,
                }
            }
            Some("tbl") => {
                index += 1;
                BodyNode::Table {
                    index: index - 1,
                    node,
                }
            }
            _ => BodyNode::Other(node),
        })
        .collect()
}
