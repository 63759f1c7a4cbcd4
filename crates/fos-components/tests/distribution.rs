//! Distribution and composition tests for fos-components

mod common;

use std::time::Duration;

use common::{body, init_tracing};
use fos_components::{Components, NodeId};

fn element_with_class(c: &mut Components, tag: &str, class: &str) -> NodeId {
    let node = c.create_element(tag);
    c.set_attribute(node, "class", class).unwrap();
    node
}

fn content(c: &mut Components, select: Option<&str>) -> NodeId {
    let point = c.create_element("content");
    if let Some(select) = select {
        c.set_attribute(point, "select", select).unwrap();
    }
    point
}

/// Host in the body with `children` as its light tree
fn host_with(c: &mut Components, children: &[NodeId]) -> (NodeId, NodeId) {
    let host = c.create_element("div");
    c.append_child(body(c), host).unwrap();
    for &child in children {
        c.append_child(host, child).unwrap();
    }
    let root = c.create_shadow_root(host).unwrap();
    (host, root)
}

// ============================================================================
// SELECTOR PARTITIONING
// ============================================================================

#[test]
fn test_class_then_catch_all() {
    init_tracing();
    let mut c = Components::new();
    let n1 = element_with_class(&mut c, "span", "a");
    let n2 = c.create_element("span");
    let n3 = element_with_class(&mut c, "span", "a");
    let (host, root) = host_with(&mut c, &[n1, n2, n3]);
    let p1 = content(&mut c, Some(".a"));
    let p2 = content(&mut c, None);
    c.append_child(root, p1).unwrap();
    c.append_child(root, p2).unwrap();

    c.flush_distributions();

    assert_eq!(c.distributed_nodes(p1), &[n1, n3]);
    assert_eq!(c.distributed_nodes(p2), &[n2]);
    assert_eq!(c.composed_children(host), vec![n1, n3, n2]);
    assert_eq!(c.assigned_point(n1), Some(p1));
    assert_eq!(c.assigned_point(n2), Some(p2));
    // the light tree itself is untouched
    assert_eq!(c.light_children(host), &[n1, n2, n3]);
}

#[test]
fn test_first_match_wins() {
    let mut c = Components::new();
    let both = element_with_class(&mut c, "b", "x");
    let tag_only = c.create_element("b");
    let (host, root) = host_with(&mut c, &[both, tag_only]);
    let p1 = content(&mut c, Some(".x"));
    let p2 = content(&mut c, Some("b"));
    c.append_child(root, p1).unwrap();
    c.append_child(root, p2).unwrap();

    c.flush_distributions();

    assert_eq!(c.distributed_nodes(p1), &[both]);
    assert_eq!(c.distributed_nodes(p2), &[tag_only]);
    assert_eq!(c.composed_children(host), vec![both, tag_only]);
}

#[test]
fn test_pool_conservation() {
    let mut c = Components::new();
    let mut light = Vec::new();
    for i in 0..8 {
        let tag = if i % 2 == 0 { "i" } else { "b" };
        let node = element_with_class(&mut c, tag, if i % 3 == 0 { "hot" } else { "cold" });
        light.push(node);
    }
    let text = c.create_text("loose");
    light.push(text);
    let (host, root) = host_with(&mut c, &light);
    let points = [
        content(&mut c, Some(".hot")),
        content(&mut c, Some("i, b")),
        content(&mut c, Some("*")),
    ];
    for point in points {
        c.append_child(root, point).unwrap();
    }

    c.flush_distributions();

    for &node in &light {
        let claims = points.iter().filter(|&&p| c.distributed_nodes(p).contains(&node)).count();
        assert!(claims <= 1, "{node} claimed {claims} times");
    }
    // text matches none of the selectors and is dropped from the composed tree
    assert!(!c.composed_children(host).contains(&text));
    assert_eq!(c.composed_children(host).len(), 8);
    assert_eq!(c.light_children(host).len(), 9);
}

#[test]
fn test_light_host_selector() {
    let mut c = Components::new();
    let inner = c.create_element("div");
    c.create_shadow_root(inner).unwrap();
    let plain = c.create_element("div");
    let (_, root) = host_with(&mut c, &[plain, inner]);
    let point = content(&mut c, Some("~"));
    c.append_child(root, point).unwrap();

    c.flush_distributions();
    assert_eq!(c.distributed_nodes(point), &[inner]);
}

// ============================================================================
// SHADOW ROOT LAYERING
// ============================================================================

#[test]
fn test_shadow_point_reaches_older_root() {
    init_tracing();
    let mut c = Components::new();
    let x = c.create_element("span");
    let (host, r0) = host_with(&mut c, &[x]);
    let older_point = content(&mut c, None);
    c.append_child(r0, older_point).unwrap();

    let r1 = c.create_shadow_root(host).unwrap();
    let header = c.create_element("header");
    let shadow = c.create_element("shadow");
    c.append_child(r1, header).unwrap();
    c.append_child(r1, shadow).unwrap();

    c.flush_distributions();

    assert_eq!(c.older_shadow_root(r1), Some(r0));
    assert_eq!(c.distributed_nodes(older_point), &[x]);
    assert_eq!(c.distributed_nodes(shadow), &[older_point]);
    assert_eq!(c.assigned_point(x), Some(older_point));
    assert_eq!(c.composed_children(host), vec![header, x]);
}

#[test]
fn test_newest_root_without_points_drops_content() {
    let mut c = Components::new();
    let x = c.create_element("span");
    let (host, r0) = host_with(&mut c, &[x]);
    let older_point = content(&mut c, None);
    c.append_child(r0, older_point).unwrap();
    let r1 = c.create_shadow_root(host).unwrap();
    let only = c.create_element("p");
    c.append_child(r1, only).unwrap();

    c.flush_distributions();

    assert!(c.distributed_nodes(older_point).is_empty());
    assert_eq!(c.assigned_point(x), None);
    assert_eq!(c.composed_children(host), vec![only]);
}

#[test]
fn test_shadow_point_without_older_root_is_empty() {
    let mut c = Components::new();
    let x = c.create_element("span");
    let (host, root) = host_with(&mut c, &[x]);
    let shadow = c.create_element("shadow");
    c.append_child(root, shadow).unwrap();

    c.flush_distributions();
    assert!(c.distributed_nodes(shadow).is_empty());
    assert!(c.composed_children(host).is_empty());
}

// ============================================================================
// FLATTENING
// ============================================================================

#[test]
fn test_nested_insertion_host_is_flattened() {
    let mut c = Components::new();
    let a = c.create_element("a");
    let b = c.create_element("b");
    let (host, root) = host_with(&mut c, &[a, b]);
    let wrapper = c.create_element("section");
    let point = content(&mut c, None);
    c.append_child(root, wrapper).unwrap();
    c.append_child(wrapper, point).unwrap();

    c.flush_distributions();
    assert_eq!(c.composed_children(host), vec![wrapper]);
    assert_eq!(c.composed_children(wrapper), vec![a, b]);
    assert_eq!(c.logical_children(wrapper), vec![point]);

    c.remove_child(host, b).unwrap();
    c.flush_distributions();
    assert_eq!(c.composed_children(wrapper), vec![a]);

    // without its point the wrapper shows its own children again
    c.remove_child(wrapper, point).unwrap();
    c.flush_distributions();
    assert!(c.composed_children(wrapper).is_empty());
    assert!(c.logical_children(wrapper).is_empty());
}

#[test]
fn test_cascade_through_light_host() {
    init_tracing();
    let mut c = Components::new();
    let x = c.create_element("span");
    let (outer, outer_root) = host_with(&mut c, &[x]);

    let inner = c.create_element("div");
    c.append_child(outer_root, inner).unwrap();
    let relay = content(&mut c, None);
    c.append_child(inner, relay).unwrap();
    let inner_root = c.create_shadow_root(inner).unwrap();
    let sink = content(&mut c, None);
    c.append_child(inner_root, sink).unwrap();

    let before = c.stats().distributions;
    assert_eq!(c.flush_distributions(), 2);
    assert_eq!(c.stats().distributions, before + 2);

    assert_eq!(c.distributed_nodes(relay), &[x]);
    assert_eq!(c.distributed_nodes(sink), &[x]);
    assert_eq!(c.composed_children(outer), vec![inner]);
    assert_eq!(c.composed_children(inner), vec![x]);
    assert!(c.is_in_document(x));
}

// ============================================================================
// SCHEDULING
// ============================================================================

#[test]
fn test_invalidations_coalesce() {
    let mut c = Components::new();
    let (host, root) = host_with(&mut c, &[]);
    let point = content(&mut c, None);
    c.append_child(root, point).unwrap();
    c.run_until_idle();
    let settled = c.stats().distributions;

    for _ in 0..5 {
        c.invalidate(host);
    }
    c.advance(Duration::from_millis(100));
    assert_eq!(c.stats().distributions, settled + 1);
}

#[test]
fn test_invalidation_is_debounced() {
    let mut c = Components::new();
    let (host, _) = host_with(&mut c, &[]);
    c.run_until_idle();
    let settled = c.stats().distributions;

    c.invalidate(host);
    c.advance(Duration::from_millis(60));
    c.invalidate(host);
    c.advance(Duration::from_millis(60));
    assert_eq!(c.stats().distributions, settled);
    assert!(c.is_invalidated(host));

    c.advance(Duration::from_millis(40));
    assert_eq!(c.stats().distributions, settled + 1);
    assert!(!c.is_invalidated(host));
}

#[test]
fn test_light_mutation_redistributes() {
    let mut c = Components::new();
    let first = c.create_element("i");
    let (host, root) = host_with(&mut c, &[first]);
    let point = content(&mut c, None);
    c.append_child(root, point).unwrap();
    c.run_until_idle();
    assert_eq!(c.composed_children(host), vec![first]);

    let second = c.create_element("b");
    c.insert_before(host, second, Some(first)).unwrap();
    c.run_until_idle();
    assert_eq!(c.composed_children(host), vec![second, first]);

    c.set_attribute(second, "class", "skip").unwrap();
    c.set_attribute(point, "select", "i").unwrap();
    c.run_until_idle();
    assert_eq!(c.composed_children(host), vec![first]);
    assert_eq!(c.assigned_point(second), None);
}

#[test]
fn test_select_change_redistributes() {
    let mut c = Components::new();
    let italic = c.create_element("i");
    let bold = c.create_element("b");
    let (host, root) = host_with(&mut c, &[italic, bold]);
    let point = content(&mut c, None);
    c.append_child(root, point).unwrap();
    c.run_until_idle();
    assert_eq!(c.composed_children(host), vec![italic, bold]);

    c.set_attribute(point, "select", "i").unwrap();
    assert!(c.is_invalidated(host));
    c.run_until_idle();
    assert_eq!(c.composed_children(host), vec![italic]);
    assert_eq!(c.assigned_point(bold), None);

    c.remove_attribute(point, "select").unwrap();
    c.run_until_idle();
    assert_eq!(c.composed_children(host), vec![italic, bold]);
}
