//! Custom element registry
//!
//! Name → definition store. Definitions are immutable once registered and
//! remember the chain of registered definitions they extend.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use fos_dom::{DomTree, NodeId};

use crate::template::{AttributeChange, AttributeHook, Capability, CapabilitySet, Hook};
use crate::{ComponentError, ComponentResult, Components};

/// Names the platform keeps for itself even though they contain a hyphen
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Lifecycle callbacks of a definition
#[derive(Clone, Default)]
pub struct Lifecycle {
    pub created: Option<Hook>,
    pub attached: Option<Hook>,
    pub detached: Option<Hook>,
    pub attribute_changed: Option<AttributeHook>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_created(mut self, hook: impl Fn(&mut Components, NodeId) + 'static) -> Self {
        self.created = Some(Rc::new(hook));
        self
    }

    pub fn on_attached(mut self, hook: impl Fn(&mut Components, NodeId) + 'static) -> Self {
        self.attached = Some(Rc::new(hook));
        self
    }

    pub fn on_detached(mut self, hook: impl Fn(&mut Components, NodeId) + 'static) -> Self {
        self.detached = Some(Rc::new(hook));
        self
    }

    pub fn on_attribute_changed(
        mut self,
        hook: impl Fn(&mut Components, NodeId, &AttributeChange) + 'static,
    ) -> Self {
        self.attribute_changed = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("created", &self.created.is_some())
            .field("attached", &self.attached.is_some())
            .field("detached", &self.detached.is_some())
            .field("attribute_changed", &self.attribute_changed.is_some())
            .finish()
    }
}

/// Registration options
#[derive(Debug, Clone, Default)]
pub struct DefinitionOptions {
    /// Capability set source; registration fails without one
    pub template: Option<CapabilitySet>,
    /// Native tag or registered name this definition extends
    pub extends: Option<String>,
    pub lifecycle: Lifecycle,
}

impl DefinitionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: CapabilitySet) -> Self {
        self.template = Some(template);
        self
    }

    pub fn extends(mut self, base: &str) -> Self {
        self.extends = Some(base.to_string());
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

/// A registered element definition
#[derive(Debug)]
pub struct Definition {
    pub name: String,
    /// Native tag instances are created with
    pub tag: String,
    /// Alias written to the `is` attribute when `tag != name`
    pub is: Option<String>,
    pub extends: Option<String>,
    /// This definition's own capabilities
    pub template: CapabilitySet,
    /// Capabilities of the whole chain, oldest first
    pub behavior: Rc<CapabilitySet>,
    pub lifecycle: Lifecycle,
    /// Registered definitions this one extends, root-most first
    pub ancestry: Vec<Rc<Definition>>,
}

impl Definition {
    /// Ancestors root-most first, then self
    pub fn chain(&self) -> impl DoubleEndedIterator<Item = &Definition> {
        self.ancestry.iter().map(|d| &**d).chain(std::iter::once(self))
    }

    fn own_hook(&self, explicit: &Option<Hook>, fallback: &str) -> Option<Hook> {
        explicit.clone()
            .or_else(|| self.template.get(fallback).and_then(Capability::as_method).cloned())
    }

    /// Created hooks along the chain, oldest ancestor first
    pub fn created_hooks(&self) -> Vec<Hook> {
        self.chain()
            .filter_map(|d| d.own_hook(&d.lifecycle.created, "createdCallback"))
            .collect()
    }

    /// Nearest attached hook, self first
    pub fn attached_hook(&self) -> Option<Hook> {
        self.chain().rev().find_map(|d| d.own_hook(&d.lifecycle.attached, "attachedCallback"))
    }

    /// Nearest detached hook, self first
    pub fn detached_hook(&self) -> Option<Hook> {
        self.chain().rev().find_map(|d| d.own_hook(&d.lifecycle.detached, "detachedCallback"))
    }

    pub fn attribute_changed_hook(&self) -> Option<AttributeHook> {
        self.chain().rev().find_map(|d| d.lifecycle.attribute_changed.clone())
    }

    /// Whether instances need attachment tracking at all
    pub fn tracks_attachment(&self) -> bool {
        self.attached_hook().is_some() || self.detached_hook().is_some()
    }

    /// Whether this definition is `name` or extends it
    pub fn is_a(&self, name: &str) -> bool {
        self.chain().any(|d| d.name == name) || self.tag == name
    }
}

/// Name → definition store
#[derive(Debug, Default)]
pub struct Registry {
    definitions: HashMap<String, Rc<Definition>>,
    order: Vec<String>,
    selector: String,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` (already lowercased) may be registered
    pub fn is_valid_name(name: &str) -> bool {
        name.contains('-')
            && name.starts_with(|c: char| c.is_ascii_lowercase())
            && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
            && !RESERVED_NAMES.contains(&name)
    }

    /// Register a definition
    pub fn register(&mut self, name: &str, options: DefinitionOptions) -> ComponentResult<Rc<Definition>> {
        let name = name.to_ascii_lowercase();
        if !Self::is_valid_name(&name) {
            return Err(ComponentError::invalid(&name, "name must be a valid custom element name"));
        }
        if self.definitions.contains_key(&name) {
            return Err(ComponentError::DuplicateName(name));
        }
        let Some(template) = options.template else {
            return Err(ComponentError::invalid(&name, "a capability template is required"));
        };

        let extends = options.extends.map(|e| e.to_ascii_lowercase());
        let ancestry = self.ancestry(&name, extends.as_deref())?;

        let mut base_tag = extends.clone();
        for ancestor in &ancestry {
            base_tag = ancestor.is.as_ref().map(|_| ancestor.tag.clone());
        }
        let (tag, is) = match base_tag {
            Some(tag) => (tag, Some(name.clone())),
            None => (name.clone(), None),
        };

        let behavior = Rc::new(CapabilitySet::merged(
            ancestry.iter().map(|a| &a.template).chain(std::iter::once(&template)),
        ));
        let definition = Rc::new(Definition {
            name: name.clone(),
            tag,
            is,
            extends,
            template,
            behavior,
            lifecycle: options.lifecycle,
            ancestry,
        });

        if !self.selector.is_empty() {
            self.selector.push(',');
        }
        if definition.is.is_some() {
            self.selector.push_str(&format!("{}[is={}],", definition.tag, definition.name));
        }
        self.selector.push_str(&definition.name);

        self.order.push(name.clone());
        self.definitions.insert(name, definition.clone());
        Ok(definition)
    }

    /// Registered ancestors of `name`, oldest first. An `extends` chain
    /// that leads back to a name already on it is rejected.
    fn ancestry<'a>(&'a self, name: &'a str, extends: Option<&'a str>) -> ComponentResult<Vec<Rc<Definition>>> {
        let mut seen = HashSet::from([name]);
        let mut chain = Vec::new();
        let mut next = extends;
        while let Some(parent) = next {
            if !seen.insert(parent) {
                return Err(ComponentError::invalid(name, format!("extends chain loops back to '{parent}'")));
            }
            let Some(definition) = self.definitions.get(parent) else {
                break;
            };
            chain.push(definition.clone());
            next = definition.extends.as_deref();
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Definition>> {
        self.definitions.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(&name.to_ascii_lowercase())
    }

    /// Union of every registered name and alias, in registration order
    pub fn combined_selector(&self) -> &str {
        &self.selector
    }

    /// Definitions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Definition>> {
        self.order.iter().filter_map(|name| self.definitions.get(name))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definition a node should be upgraded to: its `is` attribute when set,
    /// otherwise its local name
    pub fn definition_for(&self, tree: &DomTree, node: NodeId) -> Option<Rc<Definition>> {
        let element = tree.get(node)?.as_element()?;
        match element.get_attr("is").filter(|is| !is.is_empty()) {
            Some(is) => self.lookup(is),
            None => self.lookup(&element.name),
        }
    }
}
