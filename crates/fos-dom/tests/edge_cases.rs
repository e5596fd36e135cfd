//! Edge case tests for fos-dom
//!
//! Edit notifications, reachability across shadow boundaries, and walks over
//! shadow trees and import documents.

use fos_dom::{for_document_tree, for_subtree, Document, DomError, DomTree, FilterResult, NodeId, TreeEdit};

// ============================================================================
// EDIT NOTIFICATIONS
// ============================================================================

#[test]
fn test_reinsert_reports_removal_first() {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let head = doc.head();
    let tree = doc.tree_mut();
    let a = tree.create_element("a");
    tree.append_child(body, a).unwrap();

    let edits = tree.append_child(head, a).unwrap();
    assert_eq!(edits.len(), 2);
    assert!(matches!(edits[0], TreeEdit::Removed { parent, node, .. } if parent == body && node == a));
    assert!(matches!(edits[1], TreeEdit::Inserted { parent, node, .. } if parent == head && node == a));
}

#[test]
fn test_insert_before_self_is_noop_position() {
    let mut tree = DomTree::new();
    let parent = tree.create_element("ul");
    let (a, b) = (tree.create_element("li"), tree.create_element("li"));
    tree.append_child(parent, a).unwrap();
    tree.append_child(parent, b).unwrap();

    tree.insert_before(parent, a, Some(a)).unwrap();
    assert_eq!(tree.children(parent).collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn test_hierarchy_errors() {
    let mut tree = DomTree::new();
    let outer = tree.create_element("div");
    let inner = tree.create_element("div");
    let text = tree.create_text("t");
    tree.append_child(outer, inner).unwrap();

    assert_eq!(tree.append_child(inner, outer), Err(DomError::HierarchyRequest));
    assert_eq!(tree.append_child(text, inner), Err(DomError::HierarchyRequest));
    assert_eq!(tree.append_child(outer, NodeId::ROOT), Err(DomError::HierarchyRequest));
    assert_eq!(tree.remove_child(inner, outer), Err(DomError::NotAChild));
    assert_eq!(tree.remove_attribute(outer, "missing"), Ok(None));
}

#[test]
fn test_attribute_edits_capture_old_value() {
    let mut tree = DomTree::new();
    let el = tree.create_element("div");

    let added = tree.set_attribute(el, "Title", "a").unwrap();
    assert!(matches!(added, TreeEdit::Attribute { ref name, old_value: None, .. } if name == "title"));

    let changed = tree.set_attribute(el, "title", "b").unwrap();
    assert!(matches!(changed, TreeEdit::Attribute { old_value: Some(ref v), .. } if v == "a"));

    let removed = tree.remove_attribute(el, "TITLE").unwrap();
    assert!(matches!(removed, Some(TreeEdit::Attribute { old_value: Some(ref v), .. }) if v == "b"));
}

#[test]
fn test_namespaced_attribute_is_separate() {
    let mut tree = DomTree::new();
    let el = tree.create_element("svg");
    tree.set_attribute_ns(el, Some("http://www.w3.org/1999/xlink"), "href", "#a").unwrap();
    tree.set_attribute(el, "href", "#b").unwrap();

    assert_eq!(tree.get_attribute(el, "HREF"), Some("#b"));
    assert_eq!(tree.get_attribute_ns(el, None, "href"), Some("#b"));
    assert_eq!(
        tree.get_attribute_ns(el, Some("http://www.w3.org/1999/xlink"), "href"),
        Some("#a")
    );
    assert_eq!(tree.get_attribute_ns(el, Some("urn:other"), "href"), None);
}

// ============================================================================
// REACHABILITY
// ============================================================================

#[test]
fn test_connected_through_nested_shadow_roots() {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let tree = doc.tree_mut();
    let outer_host = tree.create_element("div");
    tree.append_child(body, outer_host).unwrap();
    let outer = tree.attach_shadow(outer_host).unwrap();
    let inner_host = tree.create_element("div");
    tree.append_child(outer, inner_host).unwrap();
    let inner = tree.attach_shadow(inner_host).unwrap();
    let leaf = tree.create_element("span");
    tree.append_child(inner, leaf).unwrap();

    assert!(tree.is_connected(leaf));
    tree.remove_child(body, outer_host).unwrap();
    assert!(!tree.is_connected(leaf));
}

// ============================================================================
// WALKS
// ============================================================================

#[test]
fn test_walk_reject_skips_shadow_and_children() {
    let mut tree = DomTree::new();
    let host = tree.create_element("x-host");
    let child = tree.create_element("p");
    tree.append_child(NodeId::ROOT, host).unwrap();
    tree.append_child(host, child).unwrap();
    let shadow = tree.attach_shadow(host).unwrap();
    let in_shadow = tree.create_element("span");
    tree.append_child(shadow, in_shadow).unwrap();

    let mut seen = Vec::new();
    for_subtree(&mut tree, NodeId::ROOT, &mut |_, node| {
        seen.push(node);
        FilterResult::Reject
    });
    assert_eq!(seen, vec![host]);

    let mut seen = Vec::new();
    for_subtree(&mut tree, NodeId::ROOT, &mut |_, node| {
        seen.push(node);
        FilterResult::Accept
    });
    assert_eq!(seen, vec![host, in_shadow, child]);
}

#[test]
fn test_import_cycle_visits_each_document_once() {
    let mut tree = DomTree::new();
    let sub = tree.create_document();

    let to_sub = tree.create_element("link");
    tree.set_attribute(to_sub, "rel", "import").unwrap();
    tree.append_child(NodeId::ROOT, to_sub).unwrap();
    tree.set_import(to_sub, sub).unwrap();

    // the sub-document links back to itself
    let to_self = tree.create_element("link");
    tree.set_attribute(to_self, "rel", "IMPORT").unwrap();
    tree.append_child(sub, to_self).unwrap();
    tree.set_import(to_self, sub).unwrap();

    let mut visited = Vec::new();
    for_document_tree(&mut tree, NodeId::ROOT, &mut |_, doc| visited.push(doc));
    assert_eq!(visited, vec![sub, NodeId::ROOT]);
}
