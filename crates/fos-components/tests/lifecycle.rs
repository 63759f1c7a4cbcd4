//! Attachment lifecycle, mutation watching and bootstrap tests for fos-components

mod common;

use std::time::Duration;

use common::{body, booted, init_tracing, HookLog};
use fos_components::{
    AttachmentMode, CapabilitySet, Components, ComponentsConfig, DefinitionOptions, DomEventType,
    Lifecycle, NodeId,
};

fn register_tracked(c: &mut Components, name: &str, log: &HookLog) {
    c.register(name, DefinitionOptions::new()
        .template(CapabilitySet::new())
        .lifecycle(Lifecycle::new()
            .on_attached(log.hook("attached"))
            .on_detached(log.hook("detached"))))
        .unwrap();
}

// ============================================================================
// ATTACHMENT
// ============================================================================

#[test]
fn test_attach_detach_attach() {
    let log = HookLog::new();
    let mut c = booted();
    register_tracked(&mut c, "x-life", &log);
    let node = c.create_element("x-life");

    c.append_child(body(&c), node).unwrap();
    c.take_records(None);
    assert!(c.is_attached(node));

    c.remove_child(body(&c), node).unwrap();
    c.take_records(None);
    assert!(!c.is_attached(node));

    c.append_child(body(&c), node).unwrap();
    c.take_records(None);

    assert_eq!(log.entries(), vec!["attached", "detached", "attached"]);
    assert_eq!(c.stats().attached_hooks, 2);
    assert_eq!(c.stats().detached_hooks, 1);
}

#[test]
fn test_transient_insert_is_coalesced() {
    let log = HookLog::new();
    let mut c = booted();
    register_tracked(&mut c, "x-blink", &log);
    let node = c.create_element("x-blink");

    c.append_child(body(&c), node).unwrap();
    c.remove_child(body(&c), node).unwrap();
    c.run_until_idle();

    assert!(log.entries().is_empty());
    assert!(!c.is_attached(node));
}

#[test]
fn test_attachment_waits_for_tick() {
    let log = HookLog::new();
    let mut c = booted();
    register_tracked(&mut c, "x-tick", &log);
    let node = c.create_element("x-tick");
    c.append_child(body(&c), node).unwrap();

    assert!(log.entries().is_empty());
    c.advance(Duration::ZERO);
    assert_eq!(log.entries(), vec!["attached"]);
}

#[test]
fn test_immediate_mode() {
    init_tracing();
    let log = HookLog::new();
    let mut c = Components::with_config(ComponentsConfig::new().with_attachment_mode(AttachmentMode::Immediate));
    c.watch(c.document().root());
    register_tracked(&mut c, "x-now", &log);
    let node = c.create_element("x-now");
    c.append_child(body(&c), node).unwrap();

    c.take_records(None);
    assert_eq!(log.entries(), vec!["attached"]);
    assert!(!c.is_armed(fos_components::TaskKey::Attachment));
}

#[test]
fn test_nodes_without_hooks_are_not_tracked() {
    let mut c = booted();
    c.register("x-quiet", DefinitionOptions::new().template(CapabilitySet::new())).unwrap();
    let node = c.create_element("x-quiet");
    c.append_child(body(&c), node).unwrap();
    c.take_records(None);

    assert!(c.is_in_document(node));
    assert!(!c.is_attached(node));
}

#[test]
fn test_removed_subtree_detaches_descendants() {
    let log = HookLog::new();
    let mut c = booted();
    register_tracked(&mut c, "x-deep", &log);
    let wrapper = c.create_element("div");
    let node = c.create_element("x-deep");
    c.append_child(wrapper, node).unwrap();

    c.append_child(body(&c), wrapper).unwrap();
    c.take_records(None);
    c.remove_child(body(&c), wrapper).unwrap();
    c.take_records(None);

    assert_eq!(log.entries(), vec!["attached", "detached"]);
}

#[test]
fn test_inherited_attached_hook() {
    let log = HookLog::new();
    let mut c = booted();
    register_tracked(&mut c, "x-parent", &log);
    c.register("x-kid", DefinitionOptions::new().template(CapabilitySet::new()).extends("x-parent"))
        .unwrap();
    let node = c.create_element("x-kid");
    c.append_child(body(&c), node).unwrap();
    c.take_records(None);

    assert_eq!(log.entries(), vec!["attached"]);
}

// ============================================================================
// SHADOW TREES
// ============================================================================

#[test]
fn test_shadow_content_is_upgraded_and_attached() {
    let log = HookLog::new();
    let mut c = booted();
    register_tracked(&mut c, "x-inner", &log);
    let host = c.create_element("div");
    c.append_child(body(&c), host).unwrap();
    let root = c.create_shadow_root(host).unwrap();
    assert!(c.is_watching(root));

    let inner = c.tree_mut().create_element("x-inner");
    c.append_child(root, inner).unwrap();
    c.take_records(Some(inner));

    assert!(c.is_upgraded(inner));
    assert!(c.is_attached(inner));
    assert_eq!(c.tree_root_of(inner), root);

    c.remove_child(body(&c), host).unwrap();
    c.take_records(None);
    assert_eq!(log.entries(), vec!["attached", "detached"]);
}

#[test]
fn test_component_builds_its_shadow_tree() {
    init_tracing();
    let mut c = Components::new();
    c.register("x-card", DefinitionOptions::new()
        .template(CapabilitySet::new())
        .lifecycle(Lifecycle::new().on_created(|c: &mut Components, node: NodeId| {
            let root = c.create_shadow_root(node).unwrap();
            let header = c.create_element("header");
            let point = c.create_element("content");
            c.append_child(root, header).unwrap();
            c.append_child(root, point).unwrap();
        })))
        .unwrap();

    let card = c.tree_mut().create_element("x-card");
    let label = c.tree_mut().create_text("hi");
    c.tree_mut().append_child(card, label).unwrap();
    let body = body(&c);
    c.tree_mut().append_child(body, card).unwrap();

    c.boot();
    c.run_until_idle();

    let root = c.shadow_root(card).unwrap();
    let header = c.query(root, "header").unwrap();
    assert_eq!(c.light_children(card), &[label]);
    assert_eq!(c.composed_children(card), vec![header, label]);
    assert_eq!(c.outer_html(card), "<x-card><header></header>hi</x-card>");
}

// ============================================================================
// BOOTSTRAP
// ============================================================================

#[test]
fn test_ready_event_bubbles_from_body() {
    init_tracing();
    let log = HookLog::new();
    let mut c = Components::new();
    let body = body(&c);
    let root = c.document().root();
    for (node, label) in [(body, "body"), (root, "document")] {
        let log = log.clone();
        c.add_event_listener(node, DomEventType::ComponentsReady, move |_| log.push(label));
    }

    c.boot();
    assert!(!c.is_ready());
    c.run_until_idle();

    assert!(c.is_ready());
    assert_eq!(log.entries(), vec!["body", "document"]);
}
