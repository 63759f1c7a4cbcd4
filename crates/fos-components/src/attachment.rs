//! Attachment tracker
//!
//! Fires attached/detached hooks when an upgraded node's reachability from
//! the document changes. Evaluation is queued per node and coalesced.

use std::collections::HashSet;
use std::time::Duration;

use fos_dom::NodeId;

use crate::tasks::TaskKey;
use crate::{AttachmentMode, Components};

#[derive(Debug, Default)]
pub struct AttachmentTracker {
    attached: HashSet<NodeId>,
    pending: Vec<NodeId>,
    queued: HashSet<NodeId>,
}

impl AttachmentTracker {
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.attached.contains(&node)
    }

    /// Queue `node` once until the next flush
    fn enqueue(&mut self, node: NodeId) -> bool {
        if !self.queued.insert(node) {
            return false;
        }
        self.pending.push(node);
        true
    }

    fn take_pending(&mut self) -> Vec<NodeId> {
        self.queued.clear();
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Components {
    /// Whether `node` is marked attached
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.attachment.is_attached(node)
    }

    /// Whether `node` reaches the document through parent and host links
    pub fn is_in_document(&self, node: NodeId) -> bool {
        self.composition.reaches_document(&self.document.tree, node)
    }

    pub(crate) fn queue_attachment(&mut self, node: NodeId) {
        match self.config.attachment_mode {
            AttachmentMode::Immediate => self.evaluate_attachment(node),
            AttachmentMode::Deferred => {
                if self.attachment.enqueue(node) {
                    self.tasks.arm_once(TaskKey::Attachment, Duration::ZERO);
                }
            }
        }
    }

    /// Evaluate every queued node now
    pub(crate) fn flush_attachment(&mut self) {
        self.tasks.cancel(TaskKey::Attachment);
        let pending = self.attachment.take_pending();
        if !pending.is_empty() {
            tracing::trace!("Evaluating attachment of {} nodes", pending.len());
        }
        for node in pending {
            self.evaluate_attachment(node);
        }
    }

    fn evaluate_attachment(&mut self, node: NodeId) {
        let Some(definition) = self.upgrades.definition(node).cloned() else {
            return;
        };
        if !definition.tracks_attachment() {
            return;
        }
        let reachable = self.is_in_document(node);
        let attached = self.attachment.is_attached(node);
        if reachable && !attached {
            self.attachment.attached.insert(node);
            if let Some(hook) = definition.attached_hook() {
                self.stats.attached_hooks += 1;
                tracing::debug!("Attached {} <{}>", node, definition.name);
                hook(self, node);
            }
        } else if !reachable && attached {
            self.attachment.attached.remove(&node);
            if let Some(hook) = definition.detached_hook() {
                self.stats.detached_hooks += 1;
                tracing::debug!("Detached {} <{}>", node, definition.name);
                hook(self, node);
            }
        }
    }
}
