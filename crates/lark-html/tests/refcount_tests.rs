//! Reference counting between the tree builder and the tree handler.

use lark_dom::{DomTree, NodeId, TreeHandler};
use lark_html::{HTMLParser, ParserOptions, parse_document};

/// Every live node other than the document must be attached to the tree,
/// and once the parser is gone nobody but the owner of the document holds a
/// reference.
fn assert_balanced(tree: &DomTree) {
    for id in tree.live_nodes() {
        if id == NodeId::ROOT {
            assert_eq!(tree.refcount(id), 1, "document");
            continue;
        }
        assert_eq!(tree.refcount(id), 0, "{id:?} still referenced");
        let attached = tree.ancestors(id).any(|a| a == NodeId::ROOT);
        assert!(attached, "{id:?} is alive but detached");
    }
}

#[test]
fn test_simple_document_balanced() {
    let tree = parse_document(b"<!DOCTYPE html><p>Hello <b>world</b>", ParserOptions::default()).unwrap();
    assert_balanced(&tree);
}

#[test]
fn test_adoption_agency_balanced() {
    for html in [
        "<b>1<p>2</b>3</p>",
        "<a><p>X<a>Y</a>Z</p></a>",
        "<b><i><p>x</b>y",
        "<div><b><i><u><s><div>x</b>y",
        "<p><b><b><b><b>x</p>y",
    ] {
        let tree = parse_document(html.as_bytes(), ParserOptions::default()).unwrap();
        assert_balanced(&tree);
    }
}

#[test]
fn test_tables_and_foster_parenting_balanced() {
    for html in [
        "<table>a<tr><td>b</td></tr>c</table>",
        "<table><b>x<tr><td>y</b>z</table>",
        "<table><tr><td><select><option>a<td>b</table>",
        "<table><caption>c<col><tbody><tr><th>h</table>",
    ] {
        let tree = parse_document(html.as_bytes(), ParserOptions::default()).unwrap();
        assert_balanced(&tree);
    }
}

#[test]
fn test_merged_text_nodes_are_released() {
    let tree = parse_document(b"<p>a&amp;b&lt;c", ParserOptions::default()).unwrap();
    assert_balanced(&tree);
    let p = tree
        .live_nodes()
        .into_iter()
        .find(|&id| tree.as_element(id).is_some_and(|e| e.tag_name == "p"))
        .unwrap();
    assert_eq!(tree.children(p).len(), 1);
    assert_eq!(tree.text_content(p), "a&b<c");
}

#[test]
fn test_abandoned_parse_releases_references() {
    let tree = DomTree::new();
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();
    // Stop with elements still open and formatting entries pending.
    let _ = parser.parse_chunk(b"<html><head><title>t</title></head><body><b><i><form><table><tr><td>").unwrap();
    let tree = parser.into_handler().unwrap();
    assert_balanced(&tree);
}

#[test]
fn test_releasing_document_destroys_everything() {
    let mut tree = parse_document(b"<p>x<b>y</b>", ParserOptions::default()).unwrap();
    let root = tree.root();
    tree.unref_node(&root).unwrap();
    assert!(tree.live_nodes().is_empty());
}
