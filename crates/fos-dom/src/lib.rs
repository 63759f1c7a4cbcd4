//! fOS DOM - Document Object Model
//!
//! Arena-based DOM tree used as the host environment for component
//! composition: node creation, child insertion/removal, attributes,
//! a structural change journal and bubbling event dispatch.

mod node;
mod tree;
mod document;
mod dom_events;
mod observer;
mod operations;

use std::fmt;

pub use node::{Node, NodeData, ElementData, TextData, Attribute, NATIVE_PROPERTIES};
pub use tree::{DomTree, Children};
pub use document::Document;
pub use dom_events::{DomEvent, DomEventType, EventListeners, Listener};
pub use observer::{MutationRecord, MutationJournal};
pub use operations::{DomError, DomResult};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this id refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert the sentinel into `None`
    #[inline]
    pub fn valid(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}
