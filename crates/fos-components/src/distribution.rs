//! Distribution engine
//!
//! Recomputes a host's composed tree from its light children and shadow
//! root chain:
//!
//! 1. poolify the light children, expanding insertion points into their
//!    distributed nodes
//! 2. distribute the pool over the root's insertion points in document
//!    order, first match wins, `shadow` points recursing into the older root
//! 3. flatten every insertion host so its composed children replace each
//!    point by its distribution
//! 4. project the root's composed children onto the host

use fos_dom::NodeId;

use crate::composition::{insertion_kind, is_insertion_point, InsertionKind, Scope};
use crate::selector::Selector;
use crate::Components;

/// Remove the nodes of `pool` matching `selector`, in pool order
fn extract(pool: &mut Vec<NodeId>, selector: &Selector, scope: &Scope<'_>) -> Vec<NodeId> {
    if selector.is_catch_all() {
        return std::mem::take(pool);
    }
    let mut taken = Vec::new();
    pool.retain(|&node| {
        if selector.matches(scope, node) {
            taken.push(node);
            false
        } else {
            true
        }
    });
    taken
}

impl Components {
    /// Redistribute `host` immediately
    ///
    /// # Panics
    /// When `host` has no shadow root.
    pub fn distribute(&mut self, host: NodeId) {
        let root = self.composition.shadow_root(host)
            .unwrap_or_else(|| panic!("distribute called on {host}, which is not a shadow host"));

        let light = self.composition.light_children(host).to_vec();
        let mut pool = self.poolify(&light);
        tracing::trace!("Distributing {} pooled nodes of {}", pool.len(), host);

        self.distribute_pool(&mut pool, root);
        for node in pool.iter().filter(|n| light.contains(n)) {
            self.composition.unassign(*node);
        }

        self.flatten_insertion_hosts(host, host);
        let composed = self.composition.root_composed(root);
        self.project(host, &composed);

        self.stats.distributions += 1;
        tracing::debug!("Distributed {} ({} composed, {} left over)", host, composed.len(), pool.len());
    }

    /// Light nodes with insertion points replaced by their distributions
    fn poolify(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        let mut pool = Vec::new();
        for &node in nodes {
            if is_insertion_point(&self.document.tree, node) {
                let distributed = self.composition.distributed_nodes(node).to_vec();
                pool.extend(self.poolify(&distributed));
            } else {
                pool.push(node);
            }
        }
        pool
    }

    fn distribute_pool(&mut self, pool: &mut Vec<NodeId>, root: NodeId) {
        let tree = &self.document.tree;
        let points = self.composition.local_query(tree, root, &|n| is_insertion_point(tree, n));

        let mut shadow_point = None;
        for &point in &points {
            match insertion_kind(&self.document.tree, point) {
                Some(InsertionKind::Content) => self.distribute_insertions(pool, point),
                Some(InsertionKind::Shadow) if shadow_point.is_none() => shadow_point = Some(point),
                _ => {}
            }
        }

        let Some(point) = shadow_point else {
            return;
        };
        let layered = match self.composition.older_shadow_root(root) {
            Some(older) => {
                self.distribute_pool(pool, older);
                self.composition.root_children(older).to_vec()
            }
            None => {
                tracing::warn!("Shadow point {} has no older root to draw from", point);
                Vec::new()
            }
        };
        self.composition.set_distributed(point, layered);
        if let Some(light_host) = self.composition.light_host(point) {
            self.invalidate(light_host);
        }
    }

    fn distribute_insertions(&mut self, pool: &mut Vec<NodeId>, point: NodeId) {
        let selector = Selector::compile(self.document.tree.get_attribute(point, "select"));
        let extracted = extract(pool, &selector, &self.scope());
        tracing::trace!("{} claimed {} nodes", point, extracted.len());

        for &node in &extracted {
            self.composition.assign(node, point);
        }
        self.composition.set_distributed(point, extracted);

        if let Some(light_host) = self.composition.light_host(point) {
            self.invalidate(light_host);
        }
    }

    /// Materialize composed children of every insertion host under `node`
    fn flatten_insertion_hosts(&mut self, node: NodeId, owner: NodeId) {
        // insertion hosts inside a nested shadow tree belong to that tree's host
        let (root, owner) = match self.composition.shadow_root(node) {
            Some(root) => (root, node),
            None => (node, owner),
        };
        let children = if is_insertion_point(&self.document.tree, root) {
            self.composition.distributed_nodes(root).to_vec()
        } else {
            self.logical_children(root)
        };

        let mut holds_point = false;
        for &child in &children {
            self.flatten_insertion_hosts(child, owner);
            holds_point |= is_insertion_point(&self.document.tree, child);
        }

        if holds_point {
            self.flatten_insertion_host(root, owner, &children);
        } else {
            self.clear_flattening(root);
        }
    }

    fn flatten_insertion_host(&mut self, node: NodeId, owner: NodeId, logical: &[NodeId]) {
        if self.composition.list_kind(node).is_none() && !is_insertion_point(&self.document.tree, node) {
            self.composition.capture_insertions(node, logical.to_vec(), owner);
        }

        let mut composed = Vec::new();
        for &child in logical {
            if is_insertion_point(&self.document.tree, child) {
                composed.extend(self.composition.point_composed(child));
            } else {
                composed.push(child);
            }
        }

        if is_insertion_point(&self.document.tree, node) {
            self.composition.set_point_composed(node, Some(composed));
        } else if self.composition.is_shadow_root(node) {
            self.composition.set_root_composed(node, Some(composed));
        } else {
            self.project(node, &composed);
        }
    }

    /// Drop flattening state of a node that no longer holds insertion points
    fn clear_flattening(&mut self, node: NodeId) {
        if is_insertion_point(&self.document.tree, node) {
            self.composition.set_point_composed(node, None);
        } else if self.composition.is_shadow_root(node) {
            self.composition.set_root_composed(node, None);
        } else if let Some(children) = self.composition.release_insertions(node) {
            self.project(node, &children);
        }
    }

    /// Write `composed` as the real children of `node`, unjournaled
    fn project(&mut self, node: NodeId, composed: &[NodeId]) {
        let tree = &mut self.document.tree;
        let journal = tree.journal_mut().pause();
        let result = tree.replace_children(node, composed);
        tree.journal_mut().resume(journal);
        if let Err(e) = result {
            tracing::warn!("Could not project composed children onto {}: {}", node, e);
        }
    }
}
