//! Tests for the `TreeHandler` implementation on `DomTree`: mutation,
//! text coalescing and reference counting.

use lark_dom::{Attribute, DomTree, Namespace, NodeId, Tag, TreeError, TreeHandler};

/// Helper to create an HTML element node and return its `NodeId`.
fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.create_element(&Tag {
        namespace: Namespace::Html,
        name: tag.to_string(),
        ..Tag::default()
    })
    .unwrap()
}

/// Create `tag` and append it to `parent`, releasing the creation reference.
fn append_element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let node = alloc_element(tree, tag);
    let _ = tree.append_child(&parent, &node).unwrap();
    tree.unref_node(&node).unwrap();
    node
}

// ========== append_child / insert_before ==========

#[test]
fn test_append_child_sets_parent() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");
    let p = append_element(&mut tree, div, "p");

    assert_eq!(tree.parent(p), Some(div));
    assert_eq!(tree.children(div), &[p]);
    assert_eq!(tree.document_element(), Some(div));
}

#[test]
fn test_append_text_merges_with_last_text_child() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");

    let first = tree.create_text("hello ").unwrap();
    let placed = tree.append_child(&div, &first).unwrap();
    assert_eq!(placed, first);

    let second = tree.create_text("world").unwrap();
    let placed = tree.append_child(&div, &second).unwrap();
    assert_eq!(placed, first);
    assert_eq!(tree.as_text(first), Some("hello world"));

    tree.unref_node(&first).unwrap();
    tree.unref_node(&second).unwrap();
    assert!(tree.is_destroyed(second));
    assert!(!tree.is_destroyed(first));
    assert_eq!(tree.children(div).len(), 1);
}

#[test]
fn test_insert_before_orders_children() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");
    let c = append_element(&mut tree, parent, "c");

    let b = alloc_element(&mut tree, "b");
    let placed = tree.insert_before(&parent, &b, &c).unwrap();
    assert_eq!(placed, b);
    assert_eq!(tree.children(parent), &[a, b, c]);
    assert_eq!(tree.prev_sibling(c), Some(b));
    assert_eq!(tree.next_sibling(a), Some(b));
}

#[test]
fn test_insert_before_merges_with_previous_text() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let text = tree.create_text("a").unwrap();
    let _ = tree.append_child(&parent, &text).unwrap();
    let table = append_element(&mut tree, parent, "table");

    let more = tree.create_text("b").unwrap();
    let placed = tree.insert_before(&parent, &more, &table).unwrap();
    assert_eq!(placed, text);
    assert_eq!(tree.as_text(text), Some("ab"));
}

#[test]
fn test_insert_before_unknown_reference_fails() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let stranger = alloc_element(&mut tree, "span");
    let child = alloc_element(&mut tree, "p");

    assert_eq!(
        tree.insert_before(&parent, &child, &stranger),
        Err(TreeError::NotAChild)
    );
}

// ========== remove_child / reparent_children ==========

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");
    let b = alloc_element(&mut tree, "b");
    let _ = tree.append_child(&parent, &b).unwrap();
    let c = append_element(&mut tree, parent, "c");

    tree.remove_child(&parent, &b).unwrap();

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.parent(b), None);
    // Still referenced by the test, so not destroyed.
    assert!(!tree.is_destroyed(b));
    tree.unref_node(&b).unwrap();
    assert!(tree.is_destroyed(b));
}

#[test]
fn test_remove_unreferenced_child_destroys_subtree() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let child = append_element(&mut tree, parent, "p");
    let grandchild = append_element(&mut tree, child, "span");

    tree.remove_child(&parent, &child).unwrap();

    assert!(tree.is_destroyed(child));
    assert!(tree.is_destroyed(grandchild));
}

#[test]
fn test_reparent_children_moves_all() {
    let mut tree = DomTree::new();
    let from = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, from, "a");
    let b = append_element(&mut tree, from, "b");

    let to = alloc_element(&mut tree, "section");
    tree.reparent_children(&from, &to).unwrap();

    assert!(tree.children(from).is_empty());
    assert_eq!(tree.children(to), &[a, b]);
    assert_eq!(tree.parent(a), Some(to));
}

// ========== clone / attributes ==========

#[test]
fn test_clone_node_shallow_copies_attributes_only() {
    let mut tree = DomTree::new();
    let original = tree
        .create_element(&Tag {
            namespace: Namespace::Html,
            name: "b".to_string(),
            attributes: vec![Attribute::new("class", "x")],
            self_closing: false,
        })
        .unwrap();
    let _ = append_element(&mut tree, original, "i");

    let copy = tree.clone_node(&original, false).unwrap();
    assert_ne!(copy, original);
    assert_eq!(tree.as_element(copy).unwrap().attribute("class"), Some("x"));
    assert!(!tree.has_children(&copy).unwrap());

    let deep = tree.clone_node(&original, true).unwrap();
    assert_eq!(tree.children(deep).len(), 1);
}

#[test]
fn test_add_attributes_keeps_existing_values() {
    let mut tree = DomTree::new();
    let node = tree
        .create_element(&Tag {
            namespace: Namespace::Html,
            name: "body".to_string(),
            attributes: vec![Attribute::new("id", "first")],
            self_closing: false,
        })
        .unwrap();

    tree.add_attributes(
        &node,
        &[Attribute::new("id", "second"), Attribute::new("class", "c")],
    )
    .unwrap();

    let data = tree.as_element(node).unwrap();
    assert_eq!(data.attribute("id"), Some("first"));
    assert_eq!(data.attribute("class"), Some("c"));
}

// ========== reference counting ==========

#[test]
fn test_unref_below_zero_is_an_error() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");

    assert!(matches!(
        tree.unref_node(&div),
        Err(TreeError::RefcountUnderflow(_))
    ));
}

#[test]
fn test_releasing_document_destroys_everything() {
    let mut tree = DomTree::new();
    let html = append_element(&mut tree, NodeId::ROOT, "html");
    let _ = append_element(&mut tree, html, "body");

    tree.unref_node(&NodeId::ROOT).unwrap();

    assert!(tree.live_nodes().is_empty());
}

#[test]
fn test_destroyed_handle_is_invalid() {
    let mut tree = DomTree::new();
    let node = alloc_element(&mut tree, "p");
    tree.unref_node(&node).unwrap();

    assert!(matches!(
        tree.append_child(&NodeId::ROOT, &node),
        Err(TreeError::InvalidHandle(_))
    ));
}

#[test]
fn test_get_parent_element_only() {
    let mut tree = DomTree::new();
    let html = append_element(&mut tree, NodeId::ROOT, "html");

    assert_eq!(tree.get_parent(&html, false).unwrap(), Some(NodeId::ROOT));
    assert_eq!(tree.get_parent(&html, true).unwrap(), None);
}

// ========== test format ==========

#[test]
fn test_to_test_format_sorts_attributes_and_marks_foreign() {
    let mut tree = DomTree::new();
    let html = append_element(&mut tree, NodeId::ROOT, "html");
    let svg = tree
        .create_element(&Tag {
            namespace: Namespace::Svg,
            name: "svg".to_string(),
            attributes: vec![
                Attribute::new("width", "1"),
                Attribute {
                    namespace: Namespace::XLink,
                    name: "href".to_string(),
                    value: "#a".to_string(),
                },
            ],
            self_closing: false,
        })
        .unwrap();
    let _ = tree.append_child(&html, &svg).unwrap();
    let text = tree.create_text("hi").unwrap();
    let _ = tree.append_child(&svg, &text).unwrap();

    assert_eq!(
        tree.to_test_format(),
        "| <html>\n|   <svg svg>\n|     width=\"1\"\n|     xlink href=\"#a\"\n|     \"hi\"\n"
    );
}
