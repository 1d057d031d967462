//! Markup serialization (innerHTML/outerHTML)
//!
//! Childless elements are written self-closing, which is what SVG
//! tooling expects for `<path/>`, `<use/>` and friends.

use sprite_dom::{DomTree, NodeData, NodeId};

/// Markup serializer
#[derive(Debug, Clone)]
pub struct MarkupSerializer {
    /// Whether to format output with indentation
    pub pretty_print: bool,
    /// Indentation string
    pub indent: String,
}

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Default for MarkupSerializer {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: "  ".to_string(),
        }
    }
}

impl MarkupSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            pretty_print: true,
            ..Self::default()
        }
    }

    /// Serialize the children of a node
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output, 0);
        output
    }

    /// Serialize a node including itself
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output, 0);
        output
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String, depth: usize) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document => {
                self.serialize_children(tree, node_id, output, depth);
            }
            NodeData::Element(elem) => {
                let tag = tree.resolve(elem.name);

                if self.pretty_print && depth > 0 {
                    self.newline(output, depth);
                }

                output.push('<');
                output.push_str(tag);
                for attr in &elem.attrs {
                    output.push(' ');
                    output.push_str(tree.resolve(attr.name));
                    output.push_str("=\"");
                    escape_attribute(&attr.value, output);
                    output.push('"');
                }

                if !node.first_child.is_valid() {
                    output.push_str("/>");
                    return;
                }
                output.push('>');

                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    for (_, child) in tree.children(node_id) {
                        if let Some(text) = child.as_text() {
                            output.push_str(text);
                        }
                    }
                } else {
                    self.serialize_children(tree, node_id, output, depth + 1);
                    if self.pretty_print {
                        self.newline(output, depth);
                    }
                }

                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => escape_text(text, output),
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String, depth: usize) {
        for (child_id, _) in tree.children(parent_id) {
            self.serialize_node(tree, child_id, output, depth);
        }
    }

    fn newline(&self, output: &mut String, depth: usize) {
        output.push('\n');
        for _ in 0..depth {
            output.push_str(&self.indent);
        }
    }
}

fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_outer() {
        let mut tree = DomTree::new();
        let svg = tree.create_element("svg");
        let usage = tree.create_element("use");
        tree.set_attribute(usage, "xlink:href", "#a\"b").unwrap();
        tree.append_child(svg, usage).unwrap();

        let out = MarkupSerializer::new().serialize_outer(&tree, svg);
        assert_eq!(out, r##"<svg><use xlink:href="#a&quot;b"/></svg>"##);
    }

    #[test]
    fn test_style_is_raw() {
        let mut tree = DomTree::new();
        let style = tree.create_element("style");
        let text = tree.create_text(".a > .b { fill: red }");
        tree.append_child(style, text).unwrap();

        let out = MarkupSerializer::new().serialize_outer(&tree, style);
        assert_eq!(out, "<style>.a > .b { fill: red }</style>");
    }
}
