//! DOM Events
//!
//! Listener table and bubbling dispatch along parent links.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{DomTree, NodeId};

/// DOM event types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomEventType {
    /// Broadcast once the initial component upgrade pass has finished
    ComponentsReady,
    /// Application-defined event
    Custom(String),
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    pub current_target: Option<NodeId>,
    pub bubbles: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(event_type: DomEventType, target: NodeId, bubbles: bool) -> Self {
        Self {
            event_type,
            target,
            current_target: None,
            bubbles,
            propagation_stopped: false,
        }
    }

    /// The components-ready broadcast
    pub fn components_ready(target: NodeId) -> Self {
        Self::new(DomEventType::ComponentsReady, target, true)
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Event listener callback
pub type Listener = Rc<dyn Fn(&mut DomEvent)>;

/// Listeners keyed by node and event type
#[derive(Default)]
pub struct EventListeners {
    listeners: HashMap<(NodeId, DomEventType), Vec<Listener>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: NodeId, event_type: DomEventType, listener: Listener) {
        self.listeners.entry((node, event_type)).or_default().push(listener);
    }

    /// Dispatch at the event target, bubbling through ancestors when the
    /// event bubbles. Returns the number of listeners invoked.
    pub fn dispatch(&self, tree: &DomTree, event: &mut DomEvent) -> usize {
        let mut invoked = 0;
        let mut current = event.target.valid();
        while let Some(node) = current {
            event.current_target = Some(node);
            if let Some(list) = self.listeners.get(&(node, event.event_type.clone())) {
                for listener in list {
                    listener(event);
                    invoked += 1;
                }
            }
            if !event.bubbles || event.is_propagation_stopped() {
                break;
            }
            current = tree.parent(node);
        }
        tracing::trace!("Dispatched {:?} at {} to {} listeners", event.event_type, event.target, invoked);
        invoked
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("targets", &self.listeners.len())
            .finish()
    }
}
