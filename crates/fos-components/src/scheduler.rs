//! Invalidation scheduler
//!
//! Ordered, deduplicated set of hosts awaiting redistribution, drained by
//! one debounced `Validate` task.

use std::collections::VecDeque;

use fos_dom::NodeId;

use crate::tasks::TaskKey;
use crate::Components;

#[derive(Debug, Default)]
pub struct InvalidationScheduler {
    pending: VecDeque<NodeId>,
}

impl InvalidationScheduler {
    /// Add `host`, moving it to the end if already pending. Returns whether
    /// it was newly added.
    pub fn enqueue(&mut self, host: NodeId) -> bool {
        let existed = match self.pending.iter().position(|&h| h == host) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        };
        self.pending.push_back(host);
        !existed
    }

    pub fn pop_front(&mut self) -> Option<NodeId> {
        self.pending.pop_front()
    }

    pub fn is_pending(&self, host: NodeId) -> bool {
        self.pending.contains(&host)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Components {
    /// Request redistribution of `host` after the coalescing window
    ///
    /// # Panics
    /// When `host` has no shadow root.
    pub fn invalidate(&mut self, host: NodeId) {
        assert!(
            self.composition.shadow_root(host).is_some(),
            "invalidate called on {host}, which is not a shadow host"
        );
        if self.scheduler.enqueue(host) {
            tracing::trace!("Invalidated {}", host);
        }
        self.tasks.arm(TaskKey::Validate, self.config.invalidation_delay);
    }

    pub fn is_invalidated(&self, host: NodeId) -> bool {
        self.scheduler.is_pending(host)
    }

    /// Redistribute every pending host, including hosts invalidated along
    /// the way. Returns the number of distributions run.
    pub fn flush_distributions(&mut self) -> usize {
        let mut count = 0;
        while let Some(host) = self.scheduler.pop_front() {
            self.distribute(host);
            count += 1;
        }
        self.tasks.cancel(TaskKey::Validate);
        count
    }
}
