//! Charset selection, meta declarations and the Windows-1252 fallback.

use encoding_rs::{SHIFT_JIS, UTF_8, WINDOWS_1252};
use lark_dom::DomTree;
use lark_html::input::CharsetSource;
use lark_html::{HTMLParser, ParserError, ParserOptions, parse_document};

fn parser_with(tree: DomTree, options: ParserOptions) -> HTMLParser<DomTree> {
    let root = tree.root();
    HTMLParser::new(tree, root, options).unwrap()
}

#[test]
fn test_default_is_utf8() {
    let parser = parser_with(DomTree::new(), ParserOptions::default());
    assert_eq!(parser.charset(), (UTF_8, CharsetSource::Default));
}

#[test]
fn test_configured_charset() {
    let mut parser = parser_with(DomTree::new(), ParserOptions::default().with_encoding("Shift_JIS"));
    assert_eq!(parser.charset(), (SHIFT_JIS, CharsetSource::Configured));

    // "日本" in Shift_JIS
    let _ = parser.parse_chunk(&[b'<', b'p', b'>', 0x93, 0xFA, 0x96, 0x7B]).unwrap();
    let _ = parser.completed().unwrap();
    let dump = parser.into_handler().unwrap().to_test_format();
    assert!(dump.contains("\"\u{65E5}\u{672C}\""), "{dump}");
}

#[test]
fn test_windows_1252_bytes() {
    let options = ParserOptions::default().with_encoding("windows-1252");
    let tree = parse_document(b"<p>caf\xE9 \x80", options).unwrap();
    assert!(tree.to_test_format().contains("\"caf\u{e9} \u{20AC}\""));
}

#[test]
fn test_invalid_utf8_becomes_replacement() {
    let tree = parse_document(b"<p>a\xFFb", ParserOptions::default()).unwrap();
    assert!(tree.to_test_format().contains("\"a\u{FFFD}b\""));
}

#[test]
fn test_meta_charset_reported_to_handler() {
    let tree = parse_document(
        b"<head><meta charset=\"ISO-8859-2\"><meta charset=utf-8></head>",
        ParserOptions::default(),
    )
    .unwrap();
    assert_eq!(tree.encoding_changes(), ["ISO-8859-2".to_string()]);
}

#[test]
fn test_meta_http_equiv_content_type() {
    let tree = parse_document(
        b"<meta http-equiv=Content-Type content=\"text/html; charset=koi8-r\">",
        ParserOptions::default(),
    )
    .unwrap();
    assert_eq!(tree.encoding_changes(), ["koi8-r".to_string()]);
}

#[test]
fn test_rejected_meta_charset_switches_to_fallback() {
    let mut tree = DomTree::new();
    tree.set_reject_encoding_change(true);
    let mut parser = parser_with(tree, ParserOptions::default());

    let _ = parser.parse_chunk(b"<meta charset=latin1><p>\xE9").unwrap();
    assert_eq!(parser.charset(), (WINDOWS_1252, CharsetSource::Fallback));
    let _ = parser.completed().unwrap();

    let tree = parser.into_handler().unwrap();
    let dump = tree.to_test_format();
    assert!(dump.contains("<meta>"), "{dump}");
    assert!(dump.contains("\"\u{e9}\""), "{dump}");
}

#[test]
fn test_unsupported_charset_falls_back_once() {
    let mut parser = parser_with(DomTree::new(), ParserOptions::default().with_encoding("iso-2022-kr"));
    let _ = parser.parse_chunk(b"<p>ok").unwrap();
    assert_eq!(parser.charset().1, CharsetSource::Fallback);
    let _ = parser.completed().unwrap();
    assert!(parser.handler().to_test_format().contains("\"ok\""));
    assert_eq!(parser.use_fallback_encoding(), Err(ParserError::BadEncoding));
}

#[test]
fn test_unknown_label_starts_in_fallback() {
    let parser = parser_with(DomTree::new(), ParserOptions::default().with_encoding("x-no-such-thing"));
    assert_eq!(parser.charset(), (WINDOWS_1252, CharsetSource::Fallback));
}
