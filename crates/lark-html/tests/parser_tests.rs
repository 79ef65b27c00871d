//! Integration tests for tree construction.

use lark_dom::{DomTree, Namespace, NodeId, NodeType, QuirksMode};
use lark_html::{HTMLParser, InsertionMode, ParseErrorCode, ParserOptions, parse_document};
use std::cell::RefCell;
use std::rc::Rc;

/// Helper to parse HTML and return the DOM tree
fn parse(html: &str) -> DomTree {
    parse_document(html.as_bytes(), ParserOptions::default()).unwrap()
}

/// Helper to parse HTML and return the html5lib-style dump
fn dump(html: &str) -> String {
    parse(html).to_test_format()
}

/// Build the expected dump from lines written without the `| ` prefix.
fn expected(lines: &[&str]) -> String {
    lines.iter().map(|line| format!("| {line}\n")).collect()
}

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &DomTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if let Some(data) = tree.as_element(from)
        && data.tag_name == tag
    {
        return Some(from);
    }
    tree.children(from)
        .iter()
        .find_map(|&child| find_element(tree, child, tag))
}

#[test]
fn test_document_structure() {
    let tree = parse("<!DOCTYPE html><html><head></head><body></body></html>");
    assert!(matches!(
        tree.get(NodeId::ROOT).unwrap().node_type,
        NodeType::Document
    ));
    assert_eq!(
        tree.to_test_format(),
        expected(&["<!DOCTYPE html>", "<html>", "  <head>", "  <body>"])
    );
}

#[test]
fn test_implied_html_head_body() {
    assert_eq!(
        dump("<p>hi"),
        expected(&["<html>", "  <head>", "  <body>", "    <p>", "      \"hi\""])
    );
}

#[test]
fn test_empty_document() {
    assert_eq!(dump(""), expected(&["<html>", "  <head>", "  <body>"]));
}

#[test]
fn test_title_in_head() {
    assert_eq!(
        dump("<!DOCTYPE html><title>a &amp; <b></title>"),
        expected(&[
            "<!DOCTYPE html>",
            "<html>",
            "  <head>",
            "    <title>",
            "      \"a & <b>\"",
            "  <body>",
        ])
    );
}

#[test]
fn test_comment_before_html() {
    assert_eq!(
        dump("<!--c--><html>"),
        expected(&["<!-- c -->", "<html>", "  <head>", "  <body>"])
    );
}

#[test]
fn test_script_in_head_and_content_after_html_end() {
    assert_eq!(
        dump("<head><script>a</p></script></head><body>x</body></html>y<p>z"),
        expected(&[
            "<html>",
            "  <head>",
            "    <script>",
            "      \"a</p>\"",
            "  <body>",
            "    \"xy\"",
            "    <p>",
            "      \"z\"",
        ])
    );
}

#[test]
fn test_comment_after_body() {
    assert_eq!(
        dump("<body></body><!--x-->"),
        expected(&["<html>", "  <head>", "  <body>", "  <!-- x -->"])
    );
}

#[test]
fn test_attributes_dumped_sorted() {
    assert_eq!(
        dump("<div id=b class=a>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <div>",
            "      class=\"a\"",
            "      id=\"b\"",
        ])
    );
}

#[test]
fn test_paragraph_closed_by_block() {
    assert_eq!(
        dump("<p>a<div>b</div>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <p>",
            "      \"a\"",
            "    <div>",
            "      \"b\"",
        ])
    );
}

#[test]
fn test_list_items_close_each_other() {
    assert_eq!(
        dump("<ul><li>a<li>b</ul>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <ul>",
            "      <li>",
            "        \"a\"",
            "      <li>",
            "        \"b\"",
        ])
    );
}

#[test]
fn test_pre_drops_leading_newline() {
    assert_eq!(
        dump("<pre>\nx</pre>"),
        expected(&["<html>", "  <head>", "  <body>", "    <pre>", "      \"x\""])
    );
}

#[test]
fn test_textarea_is_rcdata() {
    assert_eq!(
        dump("<textarea><b>&lt;</textarea>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <textarea>",
            "      \"<b><\"",
        ])
    );
}

#[test]
fn test_end_br_becomes_start_br() {
    assert_eq!(
        dump("a</br>b"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    \"a\"",
            "    <br>",
            "    \"b\"",
        ])
    );
}

#[test]
fn test_stray_end_p_creates_empty_paragraph() {
    assert_eq!(
        dump("x</p>"),
        expected(&["<html>", "  <head>", "  <body>", "    \"x\"", "    <p>"])
    );
    // Before the html element, a stray end tag is dropped
    assert_eq!(dump("</p>"), expected(&["<html>", "  <head>", "  <body>"]));
}

#[test]
fn test_image_becomes_img() {
    assert_eq!(
        dump("<image src=x>"),
        expected(&["<html>", "  <head>", "  <body>", "    <img>", "      src=\"x\""])
    );
}

// =============================================================================
// Active formatting elements
// =============================================================================

#[test]
fn test_formatting_reconstructed_after_paragraph() {
    assert_eq!(
        dump("<p><b>x</p>y"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <p>",
            "      <b>",
            "        \"x\"",
            "    <b>",
            "      \"y\"",
        ])
    );
}

#[test]
fn test_adoption_agency_moves_block() {
    assert_eq!(
        dump("<b>1<p>2</b>3</p>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <b>",
            "      \"1\"",
            "    <p>",
            "      <b>",
            "        \"2\"",
            "      \"3\"",
        ])
    );
}

#[test]
fn test_adoption_agency_empty_clone() {
    assert_eq!(
        dump("<b><p></b>TEST"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <b>",
            "    <p>",
            "      <b>",
            "      \"TEST\"",
        ])
    );
}

#[test]
fn test_adoption_agency_nested_formatting() {
    assert_eq!(
        dump("<b><i><p>x</b>y"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <b>",
            "      <i>",
            "    <i>",
            "      <p>",
            "        <b>",
            "          \"x\"",
            "        \"y\"",
        ])
    );
}

#[test]
fn test_misnested_inline_end_tags() {
    assert_eq!(
        dump("<b><i></b></i>"),
        expected(&["<html>", "  <head>", "  <body>", "    <b>", "      <i>"])
    );
}

#[test]
fn test_nested_anchor_closes_previous() {
    assert_eq!(
        dump("<a href=1>x<a href=2>y"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <a>",
            "      href=\"1\"",
            "      \"x\"",
            "    <a>",
            "      href=\"2\"",
            "      \"y\"",
        ])
    );
}

#[test]
fn test_anchor_inside_paragraph_adoption() {
    assert_eq!(
        dump("<a><p>X<a>Y</a>Z</p></a>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <a>",
            "    <p>",
            "      <a>",
            "        \"X\"",
            "      <a>",
            "        \"Y\"",
            "      \"Z\"",
        ])
    );
}

#[test]
fn test_noahs_ark_limits_identical_entries() {
    let tree = parse("<p><b><b><b><b>x</p>y");
    let dump = tree.to_test_format();
    // Only three identical <b> elements are reopened after the paragraph.
    let after_p = dump.split("\"x\"").nth(1).unwrap();
    assert_eq!(after_p.matches("<b>").count(), 3);
}

// =============================================================================
// Tables
// =============================================================================

#[test]
fn test_table_sections_implied() {
    assert_eq!(
        dump("<table><td>x</table>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <table>",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            \"x\"",
        ])
    );
}

#[test]
fn test_foster_parented_text() {
    assert_eq!(
        dump("<table>a<tr><td>b</td></tr></table>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    \"a\"",
            "    <table>",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            \"b\"",
        ])
    );
}

#[test]
fn test_foster_parented_element() {
    assert_eq!(
        dump("<table><div>x</div></table>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <div>",
            "      \"x\"",
            "    <table>",
        ])
    );
}

#[test]
fn test_table_whitespace_stays_in_table() {
    assert_eq!(
        dump("<table> <tr><td>x</td></tr></table>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <table>",
            "      \" \"",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            \"x\"",
        ])
    );
}

#[test]
fn test_caption_and_colgroup() {
    assert_eq!(
        dump("<table><caption>c<col><tr><td>x"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <table>",
            "      <caption>",
            "        \"c\"",
            "      <colgroup>",
            "        <col>",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            \"x\"",
        ])
    );
}

#[test]
fn test_cell_closed_by_next_cell() {
    assert_eq!(
        dump("<table><tr><td>a<td>b</table>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <table>",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            \"a\"",
            "          <td>",
            "            \"b\"",
        ])
    );
}

#[test]
fn test_select_options() {
    assert_eq!(
        dump("<select><option>a<option>b</select>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <select>",
            "      <option>",
            "        \"a\"",
            "      <option>",
            "        \"b\"",
        ])
    );
}

#[test]
fn test_select_in_table_closed_by_cell() {
    assert_eq!(
        dump("<table><tr><td><select><option>a<td>b"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <table>",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            <select>",
            "              <option>",
            "                \"a\"",
            "          <td>",
            "            \"b\"",
        ])
    );
}

// =============================================================================
// Frameset
// =============================================================================

#[test]
fn test_frameset() {
    assert_eq!(
        dump("<frameset><frame></frameset>"),
        expected(&["<html>", "  <head>", "  <frameset>", "    <frame>"])
    );
}

#[test]
fn test_frameset_after_content_ignored() {
    assert_eq!(
        dump("<p>x<frameset>"),
        expected(&["<html>", "  <head>", "  <body>", "    <p>", "      \"x\""])
    );
}

// =============================================================================
// Foreign content
// =============================================================================

#[test]
fn test_svg_names_adjusted() {
    assert_eq!(
        dump("<svg viewbox=\"0 0 1 1\"><foreignobject><p>x</p></foreignobject></svg>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <svg svg>",
            "      viewBox=\"0 0 1 1\"",
            "      <svg foreignObject>",
            "        <p>",
            "          \"x\"",
        ])
    );
}

#[test]
fn test_mathml_elements() {
    assert_eq!(
        dump("<math><mi>x</mi></math>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <math math>",
            "      <math mi>",
            "        \"x\"",
        ])
    );
}

#[test]
fn test_html_breaks_out_of_svg() {
    assert_eq!(
        dump("<svg><g><p>x"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <svg svg>",
            "      <svg g>",
            "    <p>",
            "      \"x\"",
        ])
    );
}

#[test]
fn test_font_without_attributes_stays_foreign() {
    assert_eq!(
        dump("<svg><font>x</font></svg>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <svg svg>",
            "      <svg font>",
            "        \"x\"",
        ])
    );
}

#[test]
fn test_xlink_attribute_namespace() {
    let tree = parse("<svg><a xlink:href=\"#x\"></a></svg>");
    let a = find_element(&tree, NodeId::ROOT, "a").unwrap();
    let data = tree.as_element(a).unwrap();
    assert_eq!(data.namespace, Namespace::Svg);
    assert_eq!(data.attrs[0].namespace, Namespace::XLink);
    assert_eq!(data.attrs[0].name, "href");
    assert!(tree.to_test_format().contains("xlink href=\"#x\""));
}

#[test]
fn test_self_closing_foreign_element() {
    assert_eq!(
        dump("<svg><circle/><rect/></svg>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <svg svg>",
            "      <svg circle>",
            "      <svg rect>",
        ])
    );
}

#[test]
fn test_cdata_in_foreign_content() {
    assert_eq!(
        dump("<svg><![CDATA[a<b]]></svg>"),
        expected(&["<html>", "  <head>", "  <body>", "    <svg svg>", "      \"a<b\""])
    );
}

#[test]
fn test_cdata_in_html_is_bogus_comment() {
    assert_eq!(
        dump("<div><![CDATA[x]]></div>"),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <div>",
            "      <!-- [CDATA[x]] -->",
        ])
    );
}

// =============================================================================
// Session behavior
// =============================================================================

#[test]
fn test_quirks_mode_reported() {
    let tree = parse("<p>no doctype");
    assert_eq!(tree.quirks_mode(), QuirksMode::Quirks);
    let tree = parse("<!DOCTYPE html><p>");
    assert_eq!(tree.quirks_mode(), QuirksMode::NoQuirks);
}

#[test]
fn test_table_in_quirks_mode_does_not_close_paragraph() {
    assert_eq!(
        dump("<p><table>"),
        expected(&["<html>", "  <head>", "  <body>", "    <p>", "      <table>"])
    );
    assert_eq!(
        dump("<!DOCTYPE html><p><table>"),
        expected(&["<!DOCTYPE html>", "<html>", "  <head>", "  <body>", "    <p>", "    <table>"])
    );
}

#[test]
fn test_parse_errors_reach_handler() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);

    let tree = DomTree::new();
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();
    parser.set_error_handler(Some(Box::new(move |error| sink.borrow_mut().push(error.code))));
    let _ = parser.parse_chunk(b"<p>a\0</div>").unwrap();
    let _ = parser.completed().unwrap();

    let errors = errors.borrow();
    assert!(errors.contains(&ParseErrorCode::MissingDoctype));
    assert!(errors.contains(&ParseErrorCode::UnexpectedNullCharacter));
    assert!(errors.contains(&ParseErrorCode::UnexpectedEndTag));
}

#[test]
fn test_insertion_mode_progress() {
    let tree = DomTree::new();
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();
    assert_eq!(parser.insertion_mode(), InsertionMode::Initial);
    let _ = parser.parse_chunk(b"<!DOCTYPE html><html><head>").unwrap();
    assert_eq!(parser.insertion_mode(), InsertionMode::InHead);
    let _ = parser.parse_chunk(b"</head><body><table>").unwrap();
    assert_eq!(parser.insertion_mode(), InsertionMode::InTable);
    let _ = parser.parse_chunk(b"<svg>").unwrap();
    assert_eq!(parser.insertion_mode(), InsertionMode::InForeignContent);
}

#[test]
fn test_noscript_with_scripting_enabled_is_raw_text() {
    let options = ParserOptions::default().with_scripting(true);
    let tree = parse_document(b"<body><noscript><p>x</p></noscript>", options).unwrap();
    assert_eq!(
        tree.to_test_format(),
        expected(&[
            "<html>",
            "  <head>",
            "  <body>",
            "    <noscript>",
            "      \"<p>x</p>\"",
        ])
    );
}

#[test]
fn test_form_association() {
    let tree = parse("<form><input name=a></form>");
    let form = find_element(&tree, NodeId::ROOT, "form").unwrap();
    let input = find_element(&tree, NodeId::ROOT, "input").unwrap();
    assert_eq!(tree.as_element(input).unwrap().form_owner, Some(form));
}

#[test]
fn test_body_attributes_merged() {
    let tree = parse("<body class=a><body id=b class=c>");
    let body = tree.body().unwrap();
    let data = tree.as_element(body).unwrap();
    assert_eq!(data.attribute("class"), Some("a"));
    assert_eq!(data.attribute("id"), Some("b"));
}
