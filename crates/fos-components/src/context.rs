//! Component context
//!
//! `Components` owns the document and every engine table. All operations
//! go through it so registry, flags and pending work share one explicit
//! owner.

use std::fmt;
use std::time::Duration;

use fos_dom::{Document, DomError, DomTree, EventListeners, MutationRecord, Node, NodeId};

use crate::attachment::AttachmentTracker;
use crate::composition::{self, Composition, LogicalList, Scope};
use crate::registry::{DefinitionOptions, Registry};
use crate::scheduler::InvalidationScheduler;
use crate::selector::Selector;
use crate::tasks::{TaskKey, TaskQueue};
use crate::template::AttributeChange;
use crate::upgrade::{Constructor, UpgradeState};
use crate::watcher::MutationWatcher;
use crate::{ComponentError, ComponentResult, ComponentsConfig};

/// Upper bound on timer rounds in `run_until_idle`
const MAX_IDLE_ROUNDS: usize = 1024;

/// Counters for observable engine work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentStats {
    pub upgrades: usize,
    pub distributions: usize,
    pub attached_hooks: usize,
    pub detached_hooks: usize,
}

/// Owner of the document and all component state
pub struct Components {
    pub(crate) document: Document,
    pub(crate) config: ComponentsConfig,
    pub(crate) registry: Registry,
    pub(crate) upgrades: UpgradeState,
    pub(crate) attachment: AttachmentTracker,
    pub(crate) watcher: MutationWatcher,
    pub(crate) composition: Composition,
    pub(crate) scheduler: InvalidationScheduler,
    pub(crate) tasks: TaskQueue,
    pub(crate) listeners: EventListeners,
    pub(crate) stats: ComponentStats,
    pub(crate) ready: bool,
}

impl Components {
    pub fn new() -> Self {
        Self::with_config(ComponentsConfig::default())
    }

    pub fn with_config(config: ComponentsConfig) -> Self {
        Self {
            document: Document::new(&config.document_url),
            config,
            registry: Registry::new(),
            upgrades: UpgradeState::default(),
            attachment: AttachmentTracker::default(),
            watcher: MutationWatcher::default(),
            composition: Composition::new(),
            scheduler: InvalidationScheduler::default(),
            tasks: TaskQueue::new(),
            listeners: EventListeners::new(),
            stats: ComponentStats::default(),
            ready: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tree(&self) -> &DomTree {
        &self.document.tree
    }

    /// Raw host tree access. Changes made here bypass the logical tree but
    /// are still journaled for the watcher.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.document.tree
    }

    pub fn config(&self) -> &ComponentsConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn stats(&self) -> ComponentStats {
        self.stats
    }

    pub fn now(&self) -> Duration {
        self.tasks.now()
    }

    pub fn is_armed(&self, key: TaskKey) -> bool {
        self.tasks.is_armed(key)
    }

    pub(crate) fn scope(&self) -> Scope<'_> {
        Scope { tree: &self.document.tree, composition: &self.composition }
    }

    // --- Registration ---

    /// Register `name`. Once the document is ready, matching nodes already
    /// in it are upgraded.
    pub fn register(&mut self, name: &str, options: DefinitionOptions) -> ComponentResult<Constructor> {
        let definition = self.registry.register(name, options)?;
        tracing::debug!(
            "Registered <{}> (tag {}, {} ancestors)",
            definition.name,
            definition.tag,
            definition.ancestry.len()
        );
        if self.ready {
            for node in self.upgrade_all(None, None) {
                self.queue_attachment(node);
            }
        }
        Ok(Constructor::new(definition))
    }

    /// Register from an `<element name extends>` declaration
    pub fn register_declaration(&mut self, element: NodeId) -> ComponentResult<Constructor> {
        let tree = self.tree();
        if tree.tag_name(element) != Some("element") {
            return Err(DomError::InvalidNodeType(element).into());
        }
        let Some(name) = tree.get_attribute(element, "name").map(str::to_string) else {
            return Err(ComponentError::invalid("", "declaration has no name attribute"));
        };
        let mut options = DefinitionOptions::new().template(Default::default());
        if let Some(base) = tree.get_attribute(element, "extends") {
            options = options.extends(base);
        }
        self.register(&name, options)
    }

    pub fn combined_selector(&self) -> &str {
        self.registry.combined_selector()
    }

    // --- Node creation ---

    /// Create an element, upgraded when `tag` names a registered definition
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        match self.registry.lookup(tag) {
            Some(definition) => Constructor::new(definition).construct(self),
            None => self.document.tree.create_element(tag),
        }
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.document.tree.create_text(text)
    }

    /// Clone in the host tree; custom element clones are upgraded
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> ComponentResult<NodeId> {
        let copy = self.document.tree.clone_node(node, deep)?;
        self.upgrade_element(copy);
        if deep {
            for descendant in self.document.tree.descendants(copy) {
                self.upgrade_element(descendant);
            }
        }
        Ok(copy)
    }

    // --- Logical tree mutation ---

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> ComponentResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert into the logical tree before `reference` (append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> ComponentResult<NodeId> {
        let tree = &self.document.tree;
        let parent_node = tree.get(parent).ok_or(DomError::NotFound(parent))?;
        if !(parent_node.is_element() || parent_node.is_document()) {
            return Err(DomError::InvalidNodeType(parent).into());
        }
        let child_node = tree.get(child).ok_or(DomError::NotFound(child))?;
        if child_node.is_document()
            || self.composition.is_shadow_root(child)
            || self.composition.is_inclusive_ancestor(tree, child, parent)
        {
            return Err(DomError::HierarchyRequest { parent, child }.into());
        }

        match self.composition.list_kind(parent) {
            Some(kind) => {
                if reference == Some(child) {
                    return Ok(child);
                }
                if let Some(reference) = reference {
                    if self.logical_parent(reference) != Some(parent) {
                        return Err(DomError::NotAChild { parent, child: reference }.into());
                    }
                }
                self.detach_logical(child)?;
                self.composition.insert_logical(&self.document.tree, kind, child, reference);
                self.document.tree.journal_mut()
                    .push_record(MutationRecord::child_list(parent, vec![child], vec![]));
                self.invalidate_owner(kind);
            }
            None => {
                if self.composition.in_logical_list(child) {
                    self.detach_logical(child)?;
                }
                self.document.tree.insert_before(parent, child, reference)?;
            }
        }
        Ok(child)
    }

    /// Remove `child` from its logical parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> ComponentResult<NodeId> {
        if !self.document.tree.contains(parent) {
            return Err(DomError::NotFound(parent).into());
        }
        if self.logical_parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child }.into());
        }
        self.detach_logical(child)?;
        Ok(child)
    }

    /// Unlink `child` from wherever it logically lives
    fn detach_logical(&mut self, child: NodeId) -> ComponentResult<()> {
        match self.composition.remove_logical(child) {
            Some(kind) => {
                let parent = match kind {
                    LogicalList::Light(n) | LogicalList::Root(n) | LogicalList::Insertions(n) => n,
                };
                self.composition.unassign(child);
                // drop the stale composed placement without journaling it
                let journal = self.document.tree.journal_mut().pause();
                let detached = self.document.tree.detach(child);
                self.document.tree.journal_mut().resume(journal);
                detached?;
                self.document.tree.journal_mut()
                    .push_record(MutationRecord::child_list(parent, vec![], vec![child]));
                self.invalidate_owner(kind);
            }
            None => {
                self.document.tree.detach(child)?;
            }
        }
        Ok(())
    }

    fn invalidate_owner(&mut self, kind: LogicalList) {
        if let Some(host) = self.composition.owning_host(kind) {
            if self.composition.shadow_root(host).is_some() {
                self.invalidate(host);
            }
        }
    }

    pub fn logical_parent(&self, node: NodeId) -> Option<NodeId> {
        self.composition.parent_of(&self.document.tree, node)
    }

    pub fn logical_children(&self, node: NodeId) -> Vec<NodeId> {
        self.composition.logical_children(&self.document.tree, node)
    }

    /// Real (composed) children as currently projected
    pub fn composed_children(&self, node: NodeId) -> Vec<NodeId> {
        self.document.tree.child_ids(node)
    }

    /// Replace the logical children of `node` with one text node
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> ComponentResult<()> {
        if self.composition.list_kind(node).is_none() {
            self.document.tree.set_text_content(node, text)?;
            return Ok(());
        }
        for child in self.logical_children(node) {
            self.detach_logical(child)?;
        }
        if !text.is_empty() {
            let text = self.document.tree.create_text(text);
            self.append_child(node, text)?;
        }
        Ok(())
    }

    /// Text of the logical subtree
    pub fn text_content(&self, node: NodeId) -> String {
        let tree = &self.document.tree;
        if let Some(text) = tree.get(node).and_then(Node::as_text) {
            return text.to_string();
        }
        self.composition.logical_descendants(tree, node)
            .into_iter()
            .filter_map(|n| tree.get(n).and_then(Node::as_text))
            .collect()
    }

    // --- Attributes ---

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.document.tree.get_attribute(node, name)
    }

    /// Set an attribute, notifying `attribute_changed` on upgraded nodes
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> ComponentResult<Option<String>> {
        let old = self.document.tree.set_attribute(node, name, value)?;
        self.attribute_changed(node, name, old.clone(), Some(value.to_string()));
        Ok(old)
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> ComponentResult<Option<String>> {
        let old = self.document.tree.remove_attribute(node, name)?;
        if old.is_some() {
            self.attribute_changed(node, name, old.clone(), None);
        }
        Ok(old)
    }

    fn attribute_changed(&mut self, node: NodeId, name: &str, old_value: Option<String>, new_value: Option<String>) {
        // selectors of the light parent's points may now match differently
        if let Some(parent) = self.logical_parent(node) {
            if self.composition.shadow_root(parent).is_some() {
                self.invalidate(parent);
            }
        }
        // a point's own selector decides what its tree's host distributes
        if name.eq_ignore_ascii_case("select") && self.is_insertion_point(node) {
            let root = self.composition.tree_root_of(&self.document.tree, node);
            if let Some(host) = self.composition.host_of(root) {
                self.invalidate(host);
            }
        }
        let Some(hook) = self.upgrades.definition(node).and_then(|d| d.attribute_changed_hook()) else {
            return;
        };
        let change = AttributeChange { name: name.to_ascii_lowercase(), old_value, new_value };
        hook(self, node, &change);
    }

    // --- Shadow roots ---

    /// Attach a new newest shadow root to `host`
    pub fn create_shadow_root(&mut self, host: NodeId) -> ComponentResult<NodeId> {
        if !self.document.tree.get(host).ok_or(DomError::NotFound(host))?.is_element() {
            return Err(DomError::InvalidNodeType(host).into());
        }
        if !self.composition.owns_light_tree(host) {
            let children = match self.composition.release_insertions(host) {
                Some(list) => list,
                None => self.document.tree.child_ids(host),
            };
            let journal = self.document.tree.journal_mut().pause();
            let cleared = self.document.tree.replace_children(host, &[]);
            self.document.tree.journal_mut().resume(journal);
            cleared?;
            self.composition.install_light_tree(&self.document.tree, host, children);
        }

        let root = self.document.tree.create_element("shadow-root");
        self.composition.add_shadow_root(host, root);
        tracing::debug!("Created shadow root {} on {}", root, host);

        if self.config.watch_shadow_roots {
            let mut next = Some(root);
            while let Some(r) = next {
                self.watch(r);
                next = self.composition.older_shadow_root(r);
            }
        }
        self.invalidate(host);
        Ok(root)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.composition.shadow_root(host)
    }

    pub fn older_shadow_root(&self, root: NodeId) -> Option<NodeId> {
        self.composition.older_shadow_root(root)
    }

    /// Host of a shadow root
    ///
    /// # Panics
    /// When `root` is not a shadow root.
    pub fn host_of(&self, root: NodeId) -> NodeId {
        self.composition.host_of(root)
            .unwrap_or_else(|| panic!("{root} is not a shadow root"))
    }

    pub fn light_children(&self, host: NodeId) -> &[NodeId] {
        self.composition.light_children(host)
    }

    pub fn distributed_nodes(&self, point: NodeId) -> &[NodeId] {
        self.composition.distributed_nodes(point)
    }

    pub fn assigned_point(&self, node: NodeId) -> Option<NodeId> {
        self.composition.assigned_point(node)
    }

    // --- Queries ---

    /// Logical descendants of `root` matching `selector`, document order,
    /// never descending into insertion points
    pub fn query_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let selector = Selector::compile(Some(selector));
        let scope = self.scope();
        self.composition.local_query(&self.document.tree, root, &|n| selector.matches(&scope, n))
    }

    pub fn query(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.query_all(root, selector).into_iter().next()
    }

    pub fn is_insertion_point(&self, node: NodeId) -> bool {
        composition::is_insertion_point(&self.document.tree, node)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        self.document.tree.outer_html(node)
    }

    // --- Task queue ---

    /// Move virtual time forward, firing every task due within `duration`
    pub fn advance(&mut self, duration: Duration) {
        let until = self.tasks.now() + duration;
        self.end_of_turn();
        while let Some(key) = self.tasks.pop_due(until) {
            self.run_task(key);
            self.end_of_turn();
        }
        self.tasks.advance_to(until);
    }

    /// Fire tasks until nothing is armed
    pub fn run_until_idle(&mut self) {
        self.end_of_turn();
        for _ in 0..MAX_IDLE_ROUNDS {
            let Some(due) = self.tasks.next_due() else {
                return;
            };
            self.advance(due.saturating_sub(self.tasks.now()));
        }
        tracing::warn!("Task queue still busy after {} rounds", MAX_IDLE_ROUNDS);
    }

    fn run_task(&mut self, key: TaskKey) {
        tracing::trace!("Running {:?} at {:?}", key, self.tasks.now());
        match key {
            TaskKey::Validate => {
                self.flush_distributions();
            }
            TaskKey::Attachment => self.flush_attachment(),
            TaskKey::Bootstrap => self.run_bootstrap(),
        }
    }
}

impl Default for Components {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Components")
            .field("definitions", &self.registry.len())
            .field("nodes", &self.document.tree.len())
            .field("ready", &self.ready)
            .field("stats", &self.stats)
            .finish()
    }
}
