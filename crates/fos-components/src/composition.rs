//! Composition tables
//!
//! Side tables linking hosts, shadow roots and insertion points. All
//! relations are `NodeId -> NodeId` lookups; nothing here owns a node.

use std::collections::HashMap;

use fos_dom::{DomTree, NodeId};

use crate::selector::MatchContext;

/// Kind of insertion point element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionKind {
    Content,
    Shadow,
}

pub(crate) fn insertion_kind(tree: &DomTree, node: NodeId) -> Option<InsertionKind> {
    match tree.tag_name(node)? {
        "content" => Some(InsertionKind::Content),
        "shadow" => Some(InsertionKind::Shadow),
        _ => None,
    }
}

pub(crate) fn is_insertion_point(tree: &DomTree, node: NodeId) -> bool {
    insertion_kind(tree, node).is_some()
}

/// Which virtual child list a node owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalList {
    /// Host's light tree
    Light(NodeId),
    /// Shadow root's children
    Root(NodeId),
    /// Captured children of an insertion host
    Insertions(NodeId),
}

#[derive(Debug, Default)]
struct HostData {
    light: Vec<NodeId>,
    /// Newest shadow root
    shadow: Option<NodeId>,
}

#[derive(Debug)]
struct RootData {
    host: NodeId,
    older: Option<NodeId>,
    children: Vec<NodeId>,
    composed: Option<Vec<NodeId>>,
}

#[derive(Debug, Default)]
struct PointData {
    distributed: Vec<NodeId>,
    composed: Option<Vec<NodeId>>,
    light_host: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct Composition {
    hosts: HashMap<NodeId, HostData>,
    roots: HashMap<NodeId, RootData>,
    points: HashMap<NodeId, PointData>,
    /// Logical children of regular insertion hosts
    insertions: HashMap<NodeId, Vec<NodeId>>,
    /// Insertion host -> shadow host whose pass captured it
    owners: HashMap<NodeId, NodeId>,
    /// Distributed node -> insertion point
    assigned: HashMap<NodeId, NodeId>,
    /// Parent of every node held in a virtual list
    logical_parent: HashMap<NodeId, NodeId>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Hosts and roots ---

    pub fn owns_light_tree(&self, node: NodeId) -> bool {
        self.hosts.contains_key(&node)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.hosts.get(&host).and_then(|h| h.shadow)
    }

    pub fn is_shadow_root(&self, node: NodeId) -> bool {
        self.roots.contains_key(&node)
    }

    pub fn host_of(&self, root: NodeId) -> Option<NodeId> {
        self.roots.get(&root).map(|r| r.host)
    }

    pub fn older_shadow_root(&self, root: NodeId) -> Option<NodeId> {
        self.roots.get(&root).and_then(|r| r.older)
    }

    pub fn light_children(&self, host: NodeId) -> &[NodeId] {
        self.hosts.get(&host).map_or(&[], |h| h.light.as_slice())
    }

    pub fn root_children(&self, root: NodeId) -> &[NodeId] {
        self.roots.get(&root).map_or(&[], |r| r.children.as_slice())
    }

    /// Composed children of a root, falling back to its logical children
    pub(crate) fn root_composed(&self, root: NodeId) -> Vec<NodeId> {
        self.roots.get(&root)
            .map(|r| r.composed.clone().unwrap_or_else(|| r.children.clone()))
            .unwrap_or_default()
    }

    /// Move `children` into `host`'s light tree; first call only
    pub(crate) fn install_light_tree(&mut self, tree: &DomTree, host: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.logical_parent.insert(child, host);
            if is_insertion_point(tree, child) {
                self.points.entry(child).or_default().light_host = Some(host);
            }
        }
        self.hosts.insert(host, HostData { light: children, shadow: None });
    }

    /// Push a new newest root onto `host`'s chain
    pub(crate) fn add_shadow_root(&mut self, host: NodeId, root: NodeId) {
        let data = self.hosts.entry(host).or_default();
        let older = data.shadow.replace(root);
        self.roots.insert(root, RootData { host, older, children: Vec::new(), composed: None });
    }

    pub(crate) fn set_root_composed(&mut self, root: NodeId, composed: Option<Vec<NodeId>>) {
        if let Some(data) = self.roots.get_mut(&root) {
            data.composed = composed;
        }
    }

    // --- Insertion points ---

    pub fn distributed_nodes(&self, point: NodeId) -> &[NodeId] {
        self.points.get(&point).map_or(&[], |p| p.distributed.as_slice())
    }

    /// Flattened distribution of a point, or its raw distribution
    pub(crate) fn point_composed(&self, point: NodeId) -> Vec<NodeId> {
        self.points.get(&point)
            .map(|p| p.composed.clone().unwrap_or_else(|| p.distributed.clone()))
            .unwrap_or_default()
    }

    /// Replace a point's distribution wholesale
    pub(crate) fn set_distributed(&mut self, point: NodeId, nodes: Vec<NodeId>) {
        let data = self.points.entry(point).or_default();
        data.distributed = nodes;
        data.composed = None;
    }

    pub(crate) fn set_point_composed(&mut self, point: NodeId, composed: Option<Vec<NodeId>>) {
        if let Some(data) = self.points.get_mut(&point) {
            data.composed = composed;
        }
    }

    pub fn light_host(&self, point: NodeId) -> Option<NodeId> {
        self.points.get(&point).and_then(|p| p.light_host)
    }

    pub fn assigned_point(&self, node: NodeId) -> Option<NodeId> {
        self.assigned.get(&node).copied()
    }

    pub(crate) fn assign(&mut self, node: NodeId, point: NodeId) -> Option<NodeId> {
        self.assigned.insert(node, point)
    }

    pub(crate) fn unassign(&mut self, node: NodeId) {
        self.assigned.remove(&node);
    }

    // --- Insertion hosts ---

    /// Capture a regular node's current children as its logical list
    pub(crate) fn capture_insertions(&mut self, node: NodeId, children: Vec<NodeId>, owner: NodeId) {
        for &child in &children {
            self.logical_parent.insert(child, node);
        }
        self.insertions.insert(node, children);
        self.owners.insert(node, owner);
    }

    /// Stop treating `node` as an insertion host, returning its logical list
    pub(crate) fn release_insertions(&mut self, node: NodeId) -> Option<Vec<NodeId>> {
        self.owners.remove(&node);
        let children = self.insertions.remove(&node)?;
        for child in &children {
            self.logical_parent.remove(child);
        }
        Some(children)
    }

    // --- Logical structure ---

    /// Virtual list owned by `node`, if any
    pub(crate) fn list_kind(&self, node: NodeId) -> Option<LogicalList> {
        if self.hosts.contains_key(&node) {
            Some(LogicalList::Light(node))
        } else if self.roots.contains_key(&node) {
            Some(LogicalList::Root(node))
        } else if self.insertions.contains_key(&node) {
            Some(LogicalList::Insertions(node))
        } else {
            None
        }
    }

    fn list_mut(&mut self, kind: LogicalList) -> Option<&mut Vec<NodeId>> {
        match kind {
            LogicalList::Light(host) => self.hosts.get_mut(&host).map(|h| &mut h.light),
            LogicalList::Root(root) => self.roots.get_mut(&root).map(|r| &mut r.children),
            LogicalList::Insertions(node) => self.insertions.get_mut(&node),
        }
    }

    /// Shadow host to invalidate after `kind` changed
    pub(crate) fn owning_host(&self, kind: LogicalList) -> Option<NodeId> {
        match kind {
            LogicalList::Light(host) => Some(host),
            LogicalList::Root(root) => self.host_of(root),
            LogicalList::Insertions(node) => self.owners.get(&node).copied(),
        }
    }

    /// Insert into a virtual list before `reference` (append when `None`).
    /// Returns false when `reference` is not in the list.
    pub(crate) fn insert_logical(
        &mut self,
        tree: &DomTree,
        kind: LogicalList,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> bool {
        let parent = match kind {
            LogicalList::Light(n) | LogicalList::Root(n) | LogicalList::Insertions(n) => n,
        };
        let Some(list) = self.list_mut(kind) else {
            return false;
        };
        let index = match reference {
            Some(reference) => match list.iter().position(|&n| n == reference) {
                Some(index) => index,
                None => return false,
            },
            None => list.len(),
        };
        list.insert(index, child);
        self.logical_parent.insert(child, parent);
        if let LogicalList::Light(host) = kind {
            if is_insertion_point(tree, child) {
                self.points.entry(child).or_default().light_host = Some(host);
            }
        }
        true
    }

    /// Remove `child` from whichever virtual list holds it
    pub(crate) fn remove_logical(&mut self, child: NodeId) -> Option<LogicalList> {
        let parent = self.logical_parent.remove(&child)?;
        let kind = self.list_kind(parent)?;
        if let Some(list) = self.list_mut(kind) {
            list.retain(|&n| n != child);
        }
        if let Some(point) = self.points.get_mut(&child) {
            point.light_host = None;
        }
        Some(kind)
    }

    /// Parent in the logical tree, never crossing from a shadow root to its host
    pub fn parent_of(&self, tree: &DomTree, node: NodeId) -> Option<NodeId> {
        self.logical_parent.get(&node).copied().or_else(|| {
            if self.roots.contains_key(&node) {
                None
            } else {
                tree.parent(node)
            }
        })
    }

    /// Whether `node` sits in a virtual list
    pub(crate) fn in_logical_list(&self, node: NodeId) -> bool {
        self.logical_parent.contains_key(&node)
    }

    /// Logical children of any node
    pub fn logical_children(&self, tree: &DomTree, node: NodeId) -> Vec<NodeId> {
        if let Some(host) = self.hosts.get(&node) {
            host.light.clone()
        } else if let Some(root) = self.roots.get(&node) {
            root.children.clone()
        } else if let Some(list) = self.insertions.get(&node) {
            list.clone()
        } else {
            tree.child_ids(node)
        }
    }

    /// Logical descendants in document order, excluding `node`
    pub fn logical_descendants(&self, tree: &DomTree, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.logical_children(tree, node).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.logical_children(tree, next).into_iter().rev());
        }
        out
    }

    /// Logical descendants plus the contents of every shadow root chain met
    /// on the way, excluding `node`
    pub fn deep_descendants(&self, tree: &DomTree, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.deep_children(tree, node);
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.deep_children(tree, next).into_iter().rev());
        }
        out
    }

    fn deep_children(&self, tree: &DomTree, node: NodeId) -> Vec<NodeId> {
        let mut children = self.logical_children(tree, node);
        let mut root = self.shadow_root(node);
        while let Some(r) = root {
            children.extend(self.root_children(r));
            root = self.older_shadow_root(r);
        }
        children
    }

    /// Topmost logical ancestor; shadow roots are tree roots
    pub fn tree_root_of(&self, tree: &DomTree, node: NodeId) -> NodeId {
        let mut current = node;
        let mut steps = 0;
        while let Some(parent) = self.parent_of(tree, current) {
            current = parent;
            steps += 1;
            if steps > tree.len() {
                tracing::warn!("Cycle in logical tree above {}", node);
                break;
            }
        }
        current
    }

    /// Whether `node` reaches the document through parent and host links
    pub fn reaches_document(&self, tree: &DomTree, node: NodeId) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == tree.root() {
                return true;
            }
            current = self.parent_of(tree, id).or_else(|| self.host_of(id));
            steps += 1;
            if steps > tree.len() {
                return false;
            }
        }
        false
    }

    /// Logical-tree ancestry test that also crosses shadow root boundaries
    pub(crate) fn is_inclusive_ancestor(&self, tree: &DomTree, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(tree, id).or_else(|| self.host_of(id));
            steps += 1;
            if steps > tree.len() {
                break;
            }
        }
        false
    }

    /// Local query: logical descendants of `root` matching `pred`, never
    /// descending into insertion points
    pub(crate) fn local_query(
        &self,
        tree: &DomTree,
        root: NodeId,
        pred: &dyn Fn(NodeId) -> bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.logical_children(tree, root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if pred(node) {
                out.push(node);
            }
            if !is_insertion_point(tree, node) {
                stack.extend(self.logical_children(tree, node).into_iter().rev());
            }
        }
        out
    }
}

/// Selector evaluation scope over the host tree and composition tables
pub(crate) struct Scope<'a> {
    pub tree: &'a DomTree,
    pub composition: &'a Composition,
}

impl MatchContext for Scope<'_> {
    fn tree(&self) -> &DomTree {
        self.tree
    }

    fn owns_light_tree(&self, node: NodeId) -> bool {
        self.composition.owns_light_tree(node)
    }
}
