//! DOM Tree (arena-based allocation)
//!
//! Nodes live in a flat `Vec` and link to each other by `NodeId`. Index 0
//! is always the document node. Every child-list change is appended to the
//! tree's `MutationJournal`.

use crate::{DomError, DomResult, MutationJournal, MutationRecord, Node, NodeData, NodeId};

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Arena-based DOM tree for memory efficiency
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    journal: MutationJournal,
}

impl DomTree {
    /// Create a new tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            journal: MutationJournal::new(),
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Check that `id` refers to a node of this tree
    pub fn contains(&self, id: NodeId) -> bool {
        id.is_valid() && id.index() < self.nodes.len()
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    // --- Navigation ---

    /// Parent of a node, if attached to one
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.valid())
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let first = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, current: first }
    }

    /// Child ids in order
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// All descendants in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for (child, _) in self.children(id) {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node.valid();
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    // --- Structure mutation ---

    /// Append a child node, moving it out of its previous parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.check_insertable(parent, child)?;
        let mut before = NodeId::NONE;
        if let Some(reference) = reference {
            if self.node(reference)?.parent != parent {
                return Err(DomError::NotAChild { parent, child: reference });
            }
            before = if reference == child {
                self.nodes[child.index()].next_sibling
            } else {
                reference
            };
        }

        let old_parent = self.unlink(child);
        if old_parent.is_valid() {
            self.journal.push_record(MutationRecord::child_list(old_parent, vec![], vec![child]));
        }
        self.link(parent, child, before);
        self.journal.push_record(MutationRecord::child_list(parent, vec![child], vec![]));
        Ok(child)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.node(parent)?;
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.unlink(child);
        self.journal.push_record(MutationRecord::child_list(parent, vec![], vec![child]));
        Ok(child)
    }

    /// Remove a node from whatever parent holds it, returning that parent
    pub fn detach(&mut self, child: NodeId) -> DomResult<Option<NodeId>> {
        self.node(child)?;
        let parent = self.unlink(child);
        if parent.is_valid() {
            self.journal.push_record(MutationRecord::child_list(parent, vec![], vec![child]));
        }
        Ok(parent.valid())
    }

    /// Replace every child of `parent` with `children`, in order
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> DomResult<()> {
        for &child in children {
            self.check_insertable(parent, child)?;
        }
        let removed = self.child_ids(parent);
        for &child in &removed {
            self.unlink(child);
        }
        for &child in children {
            let old_parent = self.unlink(child);
            if old_parent.is_valid() {
                self.journal.push_record(MutationRecord::child_list(old_parent, vec![], vec![child]));
            }
            self.link(parent, child, NodeId::NONE);
        }
        self.journal.push_record(MutationRecord::child_list(parent, children.to_vec(), removed));
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        if !(parent_node.is_element() || parent_node.is_document()) {
            return Err(DomError::InvalidNodeType(parent));
        }
        if self.node(child)?.is_document() || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) -> NodeId {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return NodeId::NONE;
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
        parent
    }

    fn link(&mut self, parent: NodeId, child: NodeId, before: NodeId) {
        let prev = if before.is_valid() {
            self.nodes[before.index()].prev_sibling
        } else {
            self.nodes[parent.index()].last_child
        };
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = before;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if before.is_valid() {
            self.nodes[before.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }
    }

    // --- Element data ---

    /// Local name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::local_name)
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(&name.to_ascii_lowercase())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<Option<String>> {
        let elem = self.get_mut(id)
            .ok_or(DomError::NotFound(id))?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        Ok(elem.set_attr(name, value))
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let elem = self.get_mut(id)
            .ok_or(DomError::NotFound(id))?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        Ok(elem.remove_attr(name))
    }

    // --- Text ---

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        match &node.data {
            NodeData::Text(t) => t.content.clone(),
            _ => {
                let mut out = String::new();
                for child in self.descendants(id) {
                    if let Some(text) = self.get(child).and_then(Node::as_text) {
                        out.push_str(text);
                    }
                }
                out
            }
        }
    }

    /// Replace the node's content with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if let NodeData::Text(t) = &mut self.get_mut(id).ok_or(DomError::NotFound(id))?.data {
            t.content = text.to_string();
            return Ok(());
        }
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![self.create_text(text)]
        };
        self.replace_children(id, &children)
    }

    // --- Cloning & serialization ---

    /// Clone a node (and its subtree when `deep`); the clone is detached
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let data = self.node(id)?.data.clone();
        if matches!(data, NodeData::Document) {
            return Err(DomError::InvalidNodeType(id));
        }
        let copy = self.push(Node::with_data(data));
        if deep {
            for child in self.child_ids(id) {
                let child_copy = self.clone_node(child, true)?;
                self.link(copy, child_copy, NodeId::NONE);
            }
        }
        Ok(copy)
    }

    /// Serialize a node and its subtree as markup
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Document => {
                for (child, _) in self.children(id) {
                    self.serialize(child, out);
                }
            }
            NodeData::Element(elem) => {
                out.push('<');
                out.push_str(&elem.name);
                for attr in &elem.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&attr.value.replace('&', "&amp;").replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&elem.name.as_str()) {
                    return;
                }
                for (child, _) in self.children(id) {
                    self.serialize(child, out);
                }
                out.push_str("</");
                out.push_str(&elem.name);
                out.push('>');
            }
            NodeData::Text(t) => {
                out.push_str(&t.content.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;"));
            }
        }
    }

    // --- Journal ---

    /// Drain the change journal
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.journal.take_records()
    }

    pub fn journal_mut(&mut self) -> &mut MutationJournal {
        &mut self.journal
    }

    pub fn has_pending_records(&self) -> bool {
        self.journal.has_pending()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    current: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current.valid()?;
        let node = self.tree.get(id)?;
        self.current = node.next_sibling;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, a).unwrap();
        tree.append_child(div, b).unwrap();
        (tree, div, a, b)
    }

    #[test]
    fn test_append_and_siblings() {
        let (tree, div, a, b) = build();
        assert_eq!(tree.child_ids(div), vec![a, b]);
        assert_eq!(tree.get(a).unwrap().next_sibling, b);
        assert_eq!(tree.get(b).unwrap().prev_sibling, a);
        assert_eq!(tree.parent(a), Some(div));
    }

    #[test]
    fn test_insert_before_and_move() {
        let (mut tree, div, a, b) = build();
        tree.insert_before(div, b, Some(a)).unwrap();
        assert_eq!(tree.child_ids(div), vec![b, a]);

        // inserting before itself keeps the order
        tree.insert_before(div, b, Some(b)).unwrap();
        assert_eq!(tree.child_ids(div), vec![b, a]);
    }

    #[test]
    fn test_remove_child() {
        let (mut tree, div, a, b) = build();
        tree.remove_child(div, a).unwrap();
        assert_eq!(tree.child_ids(div), vec![b]);
        assert_eq!(tree.parent(a), None);
        assert_eq!(
            tree.remove_child(div, a),
            Err(DomError::NotAChild { parent: div, child: a })
        );
    }

    #[test]
    fn test_hierarchy_checks() {
        let (mut tree, div, a, _) = build();
        assert!(matches!(tree.append_child(a, div), Err(DomError::HierarchyRequest { .. })));
        assert!(matches!(tree.append_child(div, div), Err(DomError::HierarchyRequest { .. })));
        let text = tree.create_text("x");
        assert_eq!(tree.append_child(text, a), Err(DomError::InvalidNodeType(text)));
    }

    #[test]
    fn test_replace_children() {
        let (mut tree, div, a, b) = build();
        let c = tree.create_element("i");
        tree.replace_children(div, &[c, a]).unwrap();
        assert_eq!(tree.child_ids(div), vec![c, a]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn test_text_content_round_trip() {
        let (mut tree, div, _, _) = build();
        tree.set_text_content(div, "[x-foo]").unwrap();
        assert_eq!(tree.text_content(div), "[x-foo]");
        assert_eq!(tree.child_ids(div).len(), 1);
    }

    #[test]
    fn test_outer_html() {
        let mut tree = DomTree::new();
        let button = tree.create_element("button");
        tree.set_attribute(button, "is", "x-bar").unwrap();
        let text = tree.create_text("a<b");
        tree.append_child(button, text).unwrap();
        assert_eq!(tree.outer_html(button), "<button is=\"x-bar\">a&lt;b</button>");
    }

    #[test]
    fn test_clone_deep() {
        let (mut tree, div, _, _) = build();
        let copy = tree.clone_node(div, true).unwrap();
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.outer_html(copy), tree.outer_html(div));

        let shallow = tree.clone_node(div, false).unwrap();
        assert!(tree.child_ids(shallow).is_empty());
    }

    #[test]
    fn test_journal_records_moves() {
        let (mut tree, div, a, _) = build();
        tree.take_records();

        let other = tree.create_element("section");
        tree.append_child(tree.root(), other).unwrap();
        tree.append_child(other, a).unwrap();

        let records = tree.take_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].target, div);
        assert_eq!(records[1].removed_nodes, vec![a]);
        assert_eq!(records[2].added_nodes, vec![a]);
    }

    #[test]
    fn test_descendants_document_order() {
        let (mut tree, div, a, b) = build();
        let t = tree.create_text("x");
        tree.append_child(a, t).unwrap();
        assert_eq!(tree.descendants(tree.root()), vec![div, a, t, b]);
    }
}
