//! Capability templates
//!
//! A definition carries a named set of values and methods. An upgraded
//! node gains the merged set of its whole ancestry, either by sharing it
//! or by owning a per-node copy.

use std::fmt;
use std::rc::Rc;

use fos_dom::{DomError, DomResult, Node, NodeId};

use crate::{Components, TemplateStrategy};

/// Callback run against an upgraded node
pub type Hook = Rc<dyn Fn(&mut Components, NodeId)>;

/// Callback run when an upgraded node's attribute changes
pub type AttributeHook = Rc<dyn Fn(&mut Components, NodeId, &AttributeChange)>;

/// Attribute change delivered to `attribute_changed` hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// A single template entry
#[derive(Clone)]
pub enum Capability {
    Value(String),
    Method(Hook),
}

impl Capability {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Capability::Value(v) => Some(v),
            Capability::Method(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&Hook> {
        match self {
            Capability::Method(hook) => Some(hook),
            Capability::Value(_) => None,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Capability::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// Ordered set of named capabilities; later inserts replace in place
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    entries: Vec<(String, Capability)>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, Capability::Value(value.into()));
        self
    }

    pub fn with_method(mut self, name: &str, method: impl Fn(&mut Components, NodeId) + 'static) -> Self {
        self.insert(name, Capability::Method(Rc::new(method)));
        self
    }

    pub fn insert(&mut self, name: &str, capability: Capability) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = capability,
            None => self.entries.push((name.to_string(), capability)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capability)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other` onto this set
    pub fn merge(&mut self, other: &CapabilitySet) {
        for (name, capability) in &other.entries {
            self.insert(name, capability.clone());
        }
    }

    /// Merge a chain of sets, oldest first
    pub fn merged<'a>(chain: impl IntoIterator<Item = &'a CapabilitySet>) -> Self {
        let mut out = Self::new();
        for set in chain {
            out.merge(set);
        }
        out
    }
}

/// Capabilities bound to one upgraded node
#[derive(Debug, Clone)]
pub enum AppliedBehavior {
    Shared(Rc<CapabilitySet>),
    Copied(CapabilitySet),
}

impl AppliedBehavior {
    pub fn get(&self, name: &str) -> Option<&Capability> {
        match self {
            AppliedBehavior::Shared(set) => set.get(name),
            AppliedBehavior::Copied(set) => set.get(name),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, AppliedBehavior::Shared(_))
    }
}

/// Copy one capability onto a node's own set
fn copy_property(target: &mut CapabilitySet, name: &str, capability: &Capability) -> DomResult<()> {
    if Node::is_native_property(name) {
        return Err(DomError::NativeProperty(name.to_string()));
    }
    target.insert(name, capability.clone());
    Ok(())
}

/// Bind `behavior` to `node` using `strategy`
pub(crate) fn apply_template(
    strategy: TemplateStrategy,
    node: NodeId,
    behavior: &Rc<CapabilitySet>,
) -> AppliedBehavior {
    match strategy {
        TemplateStrategy::Reference => AppliedBehavior::Shared(behavior.clone()),
        TemplateStrategy::Copy => {
            let mut own = CapabilitySet::new();
            for (name, capability) in behavior.iter() {
                if let Err(e) = copy_property(&mut own, name, capability) {
                    tracing::trace!("Skipping capability on {}: {}", node, e);
                }
            }
            AppliedBehavior::Copied(own)
        }
    }
}
