//! Upgrade engine
//!
//! Binds a definition's capabilities to a node exactly once and runs its
//! created hooks, oldest ancestor first.

use std::collections::HashMap;
use std::rc::Rc;

use fos_dom::{DomError, Node, NodeId};

use crate::registry::Definition;
use crate::selector::Selector;
use crate::template::{apply_template, AppliedBehavior, Capability};
use crate::{ComponentResult, Components};

#[derive(Debug)]
struct UpgradedNode {
    definition: Rc<Definition>,
    behavior: AppliedBehavior,
}

/// Per-node upgrade flags and instance state
#[derive(Debug, Default)]
pub struct UpgradeState {
    upgraded: HashMap<NodeId, UpgradedNode>,
    properties: HashMap<NodeId, HashMap<String, String>>,
}

impl UpgradeState {
    pub fn is_upgraded(&self, node: NodeId) -> bool {
        self.upgraded.contains_key(&node)
    }

    pub fn definition(&self, node: NodeId) -> Option<&Rc<Definition>> {
        self.upgraded.get(&node).map(|u| &u.definition)
    }

    fn capability(&self, node: NodeId, name: &str) -> Option<&Capability> {
        self.upgraded.get(&node)?.behavior.get(name)
    }

    pub fn len(&self) -> usize {
        self.upgraded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgraded.is_empty()
    }
}

/// Handle returned by registration; instantiates upgraded nodes
#[derive(Debug, Clone)]
pub struct Constructor {
    definition: Rc<Definition>,
}

impl Constructor {
    pub(crate) fn new(definition: Rc<Definition>) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &Rc<Definition> {
        &self.definition
    }

    /// Create and upgrade a new detached instance
    pub fn construct(&self, components: &mut Components) -> NodeId {
        let node = components.document.tree.create_element(&self.definition.tag);
        components.upgrade_with(node, self.definition.clone());
        node
    }
}

impl Components {
    /// Upgrade `node` if it matches a registered definition and was not
    /// upgraded before
    pub fn upgrade_element(&mut self, node: NodeId) -> Option<NodeId> {
        if self.upgrades.is_upgraded(node) {
            return None;
        }
        let definition = self.registry.definition_for(&self.document.tree, node)?;
        Some(self.upgrade_with(node, definition))
    }

    pub(crate) fn upgrade_with(&mut self, node: NodeId, definition: Rc<Definition>) -> NodeId {
        if let Some(is) = &definition.is {
            if self.document.tree.get_attribute(node, "is") != Some(is.as_str()) {
                // element nodes always accept attributes
                let _ = self.document.tree.set_attribute(node, "is", is);
            }
        }
        let behavior = apply_template(self.config.template_strategy, node, &definition.behavior);
        let previous = self.upgrades.upgraded.insert(node, UpgradedNode {
            definition: definition.clone(),
            behavior,
        });
        debug_assert!(previous.is_none(), "{node} upgraded twice");
        self.stats.upgrades += 1;
        tracing::debug!("Upgraded {} as <{}>", node, definition.name);

        for hook in definition.created_hooks() {
            hook(self, node);
        }
        node
    }

    pub fn is_upgraded(&self, node: NodeId) -> bool {
        self.upgrades.is_upgraded(node)
    }

    pub fn definition_of(&self, node: NodeId) -> Option<Rc<Definition>> {
        self.upgrades.definition(node).cloned()
    }

    /// Upgrade every logical descendant of `root` (default: the document)
    /// matching `selector` (default: the registry's combined selector), in
    /// document order. Returns the nodes upgraded by this call.
    pub fn upgrade_all(&mut self, root: Option<NodeId>, selector: Option<&str>) -> Vec<NodeId> {
        let selector = match selector {
            Some(source) => Selector::compile(Some(source)),
            None if self.registry.is_empty() => return Vec::new(),
            None => Selector::compile(Some(self.registry.combined_selector())),
        };
        let root = root.unwrap_or_else(|| self.document.root());
        let candidates: Vec<NodeId> = {
            let scope = self.scope();
            self.composition.logical_descendants(&self.document.tree, root)
                .into_iter()
                .filter(|&n| selector.matches(&scope, n))
                .collect()
        };
        candidates.into_iter().filter_map(|n| self.upgrade_element(n)).collect()
    }

    // --- Capabilities ---

    /// Instance value, else the capability default
    pub fn property(&self, node: NodeId, name: &str) -> Option<String> {
        if let Some(value) = self.upgrades.properties.get(&node).and_then(|p| p.get(name)) {
            return Some(value.clone());
        }
        self.upgrades.capability(node, name)
            .and_then(Capability::as_value)
            .map(str::to_string)
    }

    pub fn set_property(&mut self, node: NodeId, name: &str, value: &str) -> ComponentResult<()> {
        if !self.document.tree.contains(node) {
            return Err(DomError::NotFound(node).into());
        }
        if Node::is_native_property(name) {
            return Err(DomError::NativeProperty(name.to_string()).into());
        }
        self.upgrades.properties.entry(node).or_default().insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn has_capability(&self, node: NodeId, name: &str) -> bool {
        self.upgrades.capability(node, name).is_some()
    }

    /// Invoke a method capability. Returns whether it existed.
    pub fn call(&mut self, node: NodeId, method: &str) -> bool {
        let Some(hook) = self.upgrades.capability(node, method).and_then(Capability::as_method).cloned() else {
            return false;
        };
        hook(self, node);
        true
    }
}
