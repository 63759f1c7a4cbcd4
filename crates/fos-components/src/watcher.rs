//! Mutation watcher
//!
//! One observer per tree root. At the end of each turn the tree's change
//! journal is routed to the observer of each record's logical root; added
//! nodes are upgraded and queued for attachment, removed nodes are queued
//! for detachment.

use fos_dom::{MutationRecord, NodeId};

use crate::Components;

/// Upper bound on end-of-turn delivery rounds
const MAX_DELIVERY_ROUNDS: usize = 64;

#[derive(Debug)]
struct Observer {
    root: NodeId,
    records: Vec<MutationRecord>,
}

#[derive(Debug, Default)]
pub struct MutationWatcher {
    observers: Vec<Observer>,
}

impl MutationWatcher {
    /// Start observing `root`; returns false when already observed
    pub fn watch(&mut self, root: NodeId) -> bool {
        if self.is_watching(root) {
            return false;
        }
        self.observers.push(Observer { root, records: Vec::new() });
        true
    }

    pub fn is_watching(&self, root: NodeId) -> bool {
        self.observers.iter().any(|o| o.root == root)
    }

    /// Queue `record` on the observer of `root`
    fn route(&mut self, root: NodeId, record: MutationRecord) -> bool {
        match self.observers.iter_mut().find(|o| o.root == root) {
            Some(observer) => {
                observer.records.push(record);
                true
            }
            None => false,
        }
    }

    fn take(&mut self, root: NodeId) -> Vec<MutationRecord> {
        self.observers.iter_mut()
            .find(|o| o.root == root)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    fn take_all(&mut self) -> Vec<MutationRecord> {
        self.observers.iter_mut().flat_map(|o| std::mem::take(&mut o.records)).collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.observers.iter().map(|o| o.root)
    }
}

impl Components {
    /// Observe structural changes under `root`
    pub fn watch(&mut self, root: NodeId) {
        if self.watcher.watch(root) {
            tracing::debug!("Watching {}", root);
        }
    }

    pub fn is_watching(&self, root: NodeId) -> bool {
        self.watcher.is_watching(root)
    }

    /// Logical tree root of `node`; shadow roots are their own tree roots
    pub fn tree_root_of(&self, node: NodeId) -> NodeId {
        self.composition.tree_root_of(&self.document.tree, node)
    }

    /// Synchronously deliver outstanding records for the tree holding
    /// `node` (default: the document), then run pending attachment work
    pub fn take_records(&mut self, node: Option<NodeId>) {
        let root = node.map_or_else(|| self.document.root(), |n| self.tree_root_of(n));
        for _ in 0..MAX_DELIVERY_ROUNDS {
            self.collect_records();
            let records = self.watcher.take(root);
            if records.is_empty() {
                break;
            }
            self.handle_records(records);
        }
        self.flush_attachment();
    }

    /// Route the tree journal to observers
    fn collect_records(&mut self) {
        for record in self.document.tree.take_records() {
            let root = self.tree_root_of(record.target);
            if self.watcher.route(root, record) {
                tracing::trace!("Routed record to observer of {}", root);
            }
        }
    }

    /// End-of-turn delivery to every observer
    pub(crate) fn end_of_turn(&mut self) {
        for _ in 0..MAX_DELIVERY_ROUNDS {
            self.collect_records();
            let records = self.watcher.take_all();
            if records.is_empty() {
                return;
            }
            self.handle_records(records);
        }
        tracing::warn!("Mutation delivery did not settle after {} rounds", MAX_DELIVERY_ROUNDS);
    }

    fn handle_records(&mut self, records: Vec<MutationRecord>) {
        for record in records {
            for node in record.added_nodes {
                if self.tree().get(node).is_some_and(|n| n.is_element()) {
                    self.added_node(node);
                }
            }
            for node in record.removed_nodes {
                if self.tree().get(node).is_some_and(|n| n.is_element()) {
                    self.removed_node(node);
                }
            }
        }
    }

    /// Upgrade `node` and its subtree (shadow trees included), then queue
    /// attachment
    pub(crate) fn added_node(&mut self, node: NodeId) {
        self.upgrade_element(node);
        self.queue_attachment(node);
        for descendant in self.composition.deep_descendants(&self.document.tree, node) {
            if self.tree().get(descendant).is_some_and(|n| n.is_element()) {
                self.upgrade_element(descendant);
                self.queue_attachment(descendant);
            }
        }
    }

    fn removed_node(&mut self, node: NodeId) {
        self.queue_attachment(node);
        for descendant in self.composition.deep_descendants(&self.document.tree, node) {
            self.queue_attachment(descendant);
        }
    }
}
