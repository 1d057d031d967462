//! SVG markup parser
//!
//! Uses html5ever's RcDom and copies the first `<svg>` subtree into our
//! arena. Parsing goes through the HTML tree builder, so foreign-content
//! rules apply: SVG tag and attribute names get their camelCase back and
//! `xlink:href` keeps its prefix.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use sprite_dom::{DomTree, NodeId};

use crate::ParseError;

/// Markup-to-node parser
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgParser;

impl SvgParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `markup` and copy its first `<svg>` element into `tree`.
    ///
    /// The returned node is detached; every call creates a new one.
    pub fn parse_into(&self, tree: &mut DomTree, markup: &str) -> Result<NodeId, ParseError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut markup.as_bytes())?;

        let svg = find_svg(&dom.document).ok_or(ParseError::NoRootElement)?;
        let root = self.convert_element(&svg, tree)?;

        tracing::trace!(bytes = markup.len(), nodes = tree.len(), "parsed svg markup");
        Ok(root)
    }

    /// Copy an element handle (and its subtree) into the tree
    fn convert_element(&self, handle: &Handle, tree: &mut DomTree) -> Result<NodeId, ParseError> {
        let RcNodeData::Element { name, attrs, .. } = &handle.data else {
            return Err(ParseError::NoRootElement);
        };

        let id = tree.create_element(&name.local);
        for attr in attrs.borrow().iter() {
            let qualified = match &attr.name.prefix {
                Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                None => attr.name.local.to_string(),
            };
            tree.set_attribute(id, &qualified, &attr.value)?;
        }

        for child in handle.children.borrow().iter() {
            self.convert_child(child, tree, id)?;
        }
        Ok(id)
    }

    fn convert_child(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<(), ParseError> {
        match &handle.data {
            RcNodeData::Element { .. } => {
                let id = self.convert_element(handle, tree)?;
                tree.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    let id = tree.create_text(&text);
                    tree.append_child(parent, id)?;
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id)?;
            }
            // Doctype, processing instructions and nested documents are dropped
            _ => {}
        }
        Ok(())
    }
}

fn find_svg(handle: &Handle) -> Option<Handle> {
    if let RcNodeData::Element { name, .. } = &handle.data {
        if &*name.local == "svg" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_svg)
}
