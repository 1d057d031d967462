//! DOM Tree (arena-based allocation)
//!
//! Detaching a node only unlinks it; its `NodeId` stays valid until the
//! detached subtree is [`discard`](DomTree::discard)ed, after which the
//! slots are recycled by later `create_*` calls.

use crate::{DomError, DomResult, InternedString, Node, NodeData, NodeId, StringInterner};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    /// `vacant[i]` marks a discarded slot
    vacant: Vec<bool>,
    free: Vec<NodeId>,
    interner: StringInterner,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            vacant: vec![false],
            free: Vec::new(),
            interner: StringInterner::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if !self.contains(id) {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !self.contains(id) {
            return None;
        }
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Number of live nodes (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` names a live (not discarded) node
    pub fn contains(&self, id: NodeId) -> bool {
        self.vacant.get(id.index()) == Some(&false)
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut StringInterner {
        &mut self.interner
    }

    /// Resolve an interned name
    #[inline]
    pub fn resolve(&self, id: InternedString) -> &str {
        self.interner.get(id)
    }

    fn push(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            self.vacant[id.index()] = false;
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.vacant.push(false);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(tag);
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.some())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.some())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.some())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id).unwrap_or(NodeId::NONE),
        }
    }

    /// Direct children that are elements
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
            .collect()
    }

    /// All descendants in document (pre-)order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();

        let mut child = self.last_child(id);
        while let Some(c) = child {
            stack.push(c);
            child = self.get(c).and_then(|n| n.prev_sibling.some());
        }

        while let Some(current) = stack.pop() {
            out.push(current);
            let mut child = self.last_child(current);
            while let Some(c) = child {
                stack.push(c);
                child = self.get(c).and_then(|n| n.prev_sibling.some());
            }
        }

        out
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        match self.node(parent)?.data {
            NodeData::Document | NodeData::Element(_) => {}
            _ => return Err(DomError::InvalidNodeType),
        }
        if matches!(self.node(child)?.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        if let Some(reference) = reference {
            if self.node(reference)?.parent != parent {
                return Err(DomError::NotAChild);
            }
            if reference == child {
                return Ok(());
            }
        }

        self.unlink(child);

        let reference = reference.unwrap_or(NodeId::NONE);
        let prev = if reference.is_valid() {
            self.nodes[reference.index()].prev_sibling
        } else {
            self.nodes[parent.index()].last_child
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }

        if reference.is_valid() {
            self.nodes[reference.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }

        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild);
        }
        self.unlink(child);
        Ok(())
    }

    /// Detach a node from whatever parent it has; no-op when detached
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        self.node(id)?;
        self.unlink(id);
        Ok(())
    }

    /// Free a detached node and its whole subtree. Returns how many nodes
    /// were released. Ids into the subtree must not be used afterwards.
    pub fn discard(&mut self, id: NodeId) -> DomResult<usize> {
        if self.node(id)?.parent.is_valid() || id == NodeId::ROOT {
            return Err(DomError::HierarchyRequest);
        }

        let mut doomed = self.descendants(id);
        doomed.push(id);
        for &node in &doomed {
            // Drops attribute and text storage; links are reset to NONE
            self.nodes[node.index()] = Node::comment(String::new());
            self.vacant[node.index()] = true;
            self.free.push(node);
        }
        tracing::trace!(released = doomed.len(), "discarded detached subtree");
        Ok(doomed.len())
    }

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }

        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| self.resolve(e.name))
    }

    /// Get an attribute by qualified name
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = self.interner.lookup(name)?;
        self.get(id)?.as_element()?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<Option<String>> {
        let name = self.interner.intern(name);
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        Ok(elem.set_attr(name, value.to_string()))
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let Some(name) = self.interner.lookup(name) else {
            return Ok(None);
        };
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        Ok(elem.remove_attr(name))
    }

    /// Attributes of an element as `(name, value)` pairs, in source order
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.get(id)
            .and_then(Node::as_element)
            .into_iter()
            .flat_map(move |e| e.attrs.iter().map(move |a| (self.resolve(a.name), a.value.as_str())))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self.get(desc).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.some()?;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tree: &DomTree, parent: NodeId) -> Vec<NodeId> {
        tree.children(parent).map(|(id, _)| id).collect()
    }

    #[test]
    fn test_append_and_prepend() {
        let mut tree = DomTree::new();
        let parent = tree.create_element("div");
        tree.append_child(tree.root(), parent).unwrap();

        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(parent, a).unwrap();
        tree.append_child(parent, b).unwrap();
        tree.insert_before(parent, c, tree.first_child(parent)).unwrap();

        assert_eq!(ids(&tree, parent), vec![c, a, b]);
        assert_eq!(tree.last_child(parent), Some(b));
    }

    #[test]
    fn test_append_moves_attached_node() {
        let mut tree = DomTree::new();
        let left = tree.create_element("div");
        let right = tree.create_element("div");
        let item = tree.create_element("span");
        tree.append_child(left, item).unwrap();
        tree.append_child(right, item).unwrap();

        assert!(ids(&tree, left).is_empty());
        assert_eq!(ids(&tree, right), vec![item]);
        assert_eq!(tree.parent(item), Some(right));
    }

    #[test]
    fn test_remove_middle_child() {
        let mut tree = DomTree::new();
        let parent = tree.create_element("g");
        let kids: Vec<_> = (0..3).map(|_| tree.create_element("path")).collect();
        for &k in &kids {
            tree.append_child(parent, k).unwrap();
        }

        tree.remove_child(parent, kids[1]).unwrap();
        assert_eq!(ids(&tree, parent), vec![kids[0], kids[2]]);
        assert_eq!(tree.parent(kids[1]), None);
        assert_eq!(tree.remove_child(parent, kids[1]), Err(DomError::NotAChild));
    }

    #[test]
    fn test_cannot_insert_ancestor() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("g");
        let inner = tree.create_element("g");
        tree.append_child(outer, inner).unwrap();

        assert_eq!(tree.append_child(inner, outer), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(outer, outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_text_node_cannot_have_children() {
        let mut tree = DomTree::new();
        let text = tree.create_text("hi");
        let el = tree.create_element("span");
        assert_eq!(tree.append_child(text, el), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn test_descendants_preorder() {
        let mut tree = DomTree::new();
        let svg = tree.create_element("svg");
        let sym = tree.create_element("symbol");
        let path = tree.create_element("path");
        let defs = tree.create_element("defs");
        tree.append_child(svg, sym).unwrap();
        tree.append_child(sym, path).unwrap();
        tree.append_child(svg, defs).unwrap();

        assert_eq!(tree.descendants(svg), vec![sym, path, defs]);
    }

    #[test]
    fn test_discard_releases_and_recycles_slots() {
        let mut tree = DomTree::new();
        let svg = tree.create_element("svg");
        let symbol = tree.create_element("symbol");
        let path = tree.create_element("path");
        tree.append_child(svg, symbol).unwrap();
        tree.append_child(symbol, path).unwrap();
        tree.set_attribute(path, "d", "M0 0").unwrap();
        let live = tree.len();

        assert_eq!(tree.discard(svg).unwrap(), 3);
        assert_eq!(tree.len(), live - 3);
        assert!(!tree.contains(path));
        assert!(tree.get(symbol).is_none());
        assert_eq!(tree.get_attribute(path, "d"), None);
        assert_eq!(tree.append_child(svg, path), Err(DomError::NotFound(svg)));

        let fresh = tree.create_element("g");
        assert!([svg, symbol, path].contains(&fresh));
        assert_eq!(tree.tag_name(fresh), Some("g"));
        assert_eq!(tree.parent(fresh), None);
        assert_eq!(tree.first_child(fresh), None);
        assert_eq!(tree.len(), live - 2);
    }

    #[test]
    fn test_discard_refuses_attached_nodes() {
        let mut tree = DomTree::new();
        let parent = tree.create_element("svg");
        let child = tree.create_element("symbol");
        tree.append_child(parent, child).unwrap();

        assert_eq!(tree.discard(child), Err(DomError::HierarchyRequest));
        assert_eq!(tree.discard(tree.root()), Err(DomError::HierarchyRequest));
        assert!(tree.contains(child));
    }

    #[test]
    fn test_attributes_roundtrip() {
        let mut tree = DomTree::new();
        let el = tree.create_element("use");
        assert_eq!(tree.set_attribute(el, "xlink:href", "#a").unwrap(), None);
        assert_eq!(
            tree.set_attribute(el, "xlink:href", "#b").unwrap(),
            Some("#a".to_string())
        );
        assert_eq!(tree.get_attribute(el, "xlink:href"), Some("#b"));
        assert_eq!(tree.attributes(el).collect::<Vec<_>>(), vec![("xlink:href", "#b")]);
        assert_eq!(tree.remove_attribute(el, "xlink:href").unwrap(), Some("#b".to_string()));
        assert!(!tree.has_attribute(el, "xlink:href"));
    }
}
