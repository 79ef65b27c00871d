//! Chunked input, pausing and resuming.

use lark_dom::DomTree;
use lark_html::{HTMLParser, ParserError, ParserOptions, RunStatus, parse_document, parse_with};

const DOCUMENT: &str = "<!DOCTYPE html>\r\n<html><head><title>T&amp;T</title>\
    <script>if (a < b) { x = '</p>'; }</script></head>\r\n<body class=\"main page\">\
    <!-- note --><p>caf\u{e9} &eacute;&#x65E5;&notin; \u{65E5}\u{672C}</p>\
    <table><tr><td>1<td>2</table><svg viewBox=\"0 0 1 1\"><circle r=1 /></svg>\
    <b><i>x</b>y</i><pre>\r\ntext</pre></body></html>";

fn whole(html: &str) -> String {
    parse_document(html.as_bytes(), ParserOptions::default())
        .unwrap()
        .to_test_format()
}

fn in_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> String {
    let tree = DomTree::new();
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();
    for chunk in chunks {
        if chunk.is_empty() {
            continue;
        }
        assert_eq!(parser.parse_chunk(chunk).unwrap(), RunStatus::NeedData);
    }
    assert_eq!(parser.completed().unwrap(), RunStatus::Complete);
    parser.into_handler().unwrap().to_test_format()
}

#[test]
fn test_byte_by_byte_matches_whole() {
    let bytes = DOCUMENT.as_bytes();
    assert_eq!(in_chunks(bytes.chunks(1)), whole(DOCUMENT));
}

#[test]
fn test_fixed_chunk_sizes_match_whole() {
    let bytes = DOCUMENT.as_bytes();
    let expected = whole(DOCUMENT);
    for size in [2, 3, 5, 7, 16, 64] {
        assert_eq!(in_chunks(bytes.chunks(size)), expected, "chunk size {size}");
    }
}

#[test]
fn test_irregular_splits_match_whole() {
    let bytes = DOCUMENT.as_bytes();
    let expected = whole(DOCUMENT);

    // Small linear congruential generator so every run splits the same way.
    let mut seed: u32 = 0x2545_F491;
    for _ in 0..20 {
        let mut pieces = Vec::new();
        let mut start = 0;
        while start < bytes.len() {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let len = 1 + (seed >> 16) as usize % 9;
            let end = (start + len).min(bytes.len());
            pieces.push(&bytes[start..end]);
            start = end;
        }
        assert_eq!(in_chunks(pieces), expected);
    }
}

#[test]
fn test_crlf_is_normalized() {
    let dump = whole("<pre>\r\na\r\nb\rc</pre>");
    assert!(dump.contains("\"a\nb\nc\""), "{dump}");
}

#[test]
fn test_pause_on_every_script() {
    let mut tree = DomTree::new();
    tree.set_pause_on_script(true);
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();

    let mut status = parser
        .parse_chunk(b"<script>one()</script><p>first</p><script>two()</script><p>second")
        .unwrap();
    let mut pauses = 0;
    while status == RunStatus::Paused {
        pauses += 1;
        assert!(parser.is_paused());
        assert_eq!(parser.handler().completed_scripts().len(), pauses);
        if pauses == 1 {
            assert!(!parser.handler().to_test_format().contains("first"));
        }
        status = parser.resume().unwrap();
    }
    assert_eq!(pauses, 2);
    assert_eq!(status, RunStatus::NeedData);
    assert_eq!(parser.completed().unwrap(), RunStatus::Complete);

    let dump = parser.into_handler().unwrap().to_test_format();
    assert!(dump.contains("\"first\""));
    assert!(dump.contains("\"second\""));
}

#[test]
fn test_parse_with_resumes_after_script_pauses() {
    let mut tree = DomTree::new();
    tree.set_pause_on_script(true);
    let root = tree.root();
    let html = b"<script>one()</script><p>first</p><script>two()</script><p>second";

    let tree = parse_with(tree, root, html, ParserOptions::default()).unwrap();
    assert_eq!(tree.completed_scripts().len(), 2);
    let dump = tree.to_test_format();
    assert!(dump.contains("\"first\""), "{dump}");
    assert!(dump.contains("\"second\""), "{dump}");
    assert_eq!(dump, whole(std::str::from_utf8(html).unwrap()));
}

#[test]
fn test_explicit_pause_keeps_input() {
    let tree = DomTree::new();
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();
    parser.pause();
    assert_eq!(parser.parse_chunk(b"<p>x").unwrap(), RunStatus::Paused);
    assert_eq!(parser.completed().unwrap(), RunStatus::Paused);
    assert_eq!(parser.resume().unwrap(), RunStatus::Complete);
    assert!(parser.handler().to_test_format().contains("\"x\""));
}

#[test]
fn test_data_after_end_of_input_is_rejected() {
    let tree = DomTree::new();
    let root = tree.root();
    let mut parser = HTMLParser::new(tree, root, ParserOptions::default()).unwrap();
    let _ = parser.completed().unwrap();
    assert!(matches!(parser.parse_chunk(b"<p>"), Err(ParserError::BadParm(_))));
}
