//! Bootstrap
//!
//! Initial document upgrade pass and the one-time ready broadcast.

use std::rc::Rc;
use std::time::Duration;

use fos_dom::{DomEvent, DomEventType, NodeId};

use crate::tasks::TaskKey;
use crate::Components;

impl Components {
    /// Schedule the initial upgrade pass. Later calls are no-ops.
    pub fn boot(&mut self) {
        if self.ready || self.tasks.is_armed(TaskKey::Bootstrap) {
            return;
        }
        self.tasks.arm(TaskKey::Bootstrap, Duration::ZERO);
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn run_bootstrap(&mut self) {
        if self.ready {
            return;
        }
        let root = self.document.root();
        self.added_node(root);
        self.watch(root);
        self.ready = true;
        self.resolve_elements();

        let target = self.document.body().unwrap_or(root);
        let mut event = DomEvent::components_ready(target);
        let invoked = self.listeners.dispatch(&self.document.tree, &mut event);
        tracing::debug!("Components ready ({} upgraded, {} listeners)", self.stats.upgrades, invoked);
    }

    /// Switch `unresolved` markers to `resolved`
    fn resolve_elements(&mut self) {
        let root = self.document.root();
        let marked: Vec<NodeId> = self.composition.logical_descendants(&self.document.tree, root)
            .into_iter()
            .filter(|&n| self.document.tree.has_attribute(n, "unresolved"))
            .collect();
        let tree = &mut self.document.tree;
        for node in marked {
            // marked nodes are elements
            let _ = tree.remove_attribute(node, "unresolved");
            let _ = tree.set_attribute(node, "resolved", "");
        }
    }

    /// Subscribe to events dispatched at `node`
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: DomEventType,
        listener: impl Fn(&mut DomEvent) + 'static,
    ) {
        self.listeners.add(node, event_type, Rc::new(listener));
    }
}
