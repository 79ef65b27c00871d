//! Document mode selection from the DOCTYPE.

use lark_dom::{Doctype, QuirksMode};
use lark_html::parser::quirks_mode_for;
use lark_html::{ParserOptions, parse_document};

fn doctype(name: &str, public_id: Option<&str>, system_id: Option<&str>) -> Doctype {
    Doctype {
        name: Some(name.to_string()),
        public_id: public_id.map(str::to_string),
        system_id: system_id.map(str::to_string),
        force_quirks: false,
    }
}

fn mode_of(html: &str) -> QuirksMode {
    parse_document(html.as_bytes(), ParserOptions::default())
        .unwrap()
        .quirks_mode()
}

#[test]
fn test_html5_doctype_is_no_quirks() {
    assert_eq!(quirks_mode_for(&doctype("html", None, None)), QuirksMode::NoQuirks);
    assert_eq!(mode_of("<!DOCTYPE html>"), QuirksMode::NoQuirks);
    assert_eq!(mode_of("<!doctype HTML>"), QuirksMode::NoQuirks);
}

#[test]
fn test_missing_doctype_is_quirks() {
    assert_eq!(mode_of("<html>"), QuirksMode::Quirks);
    assert_eq!(mode_of("text"), QuirksMode::Quirks);
}

#[test]
fn test_force_quirks_flag() {
    let mut token = doctype("html", None, None);
    token.force_quirks = true;
    assert_eq!(quirks_mode_for(&token), QuirksMode::Quirks);
}

#[test]
fn test_other_name_is_quirks() {
    assert_eq!(quirks_mode_for(&doctype("svg", None, None)), QuirksMode::Quirks);
    assert_eq!(mode_of("<!DOCTYPE foo>"), QuirksMode::Quirks);
}

#[test]
fn test_quirky_public_identifiers() {
    for public_id in [
        "-//W3C//DTD HTML 3.2 Final//EN",
        "-//IETF//DTD HTML//EN",
        "HTML",
        "-//w3c//dtd html 4.0 transitional//en",
    ] {
        assert_eq!(
            quirks_mode_for(&doctype("html", Some(public_id), None)),
            QuirksMode::Quirks,
            "{public_id}"
        );
    }
}

#[test]
fn test_quirky_system_identifier() {
    let token = doctype(
        "html",
        None,
        Some("http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"),
    );
    assert_eq!(quirks_mode_for(&token), QuirksMode::Quirks);
}

#[test]
fn test_xhtml_transitional_is_limited_quirks() {
    let token = doctype(
        "html",
        Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),
        Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd"),
    );
    assert_eq!(quirks_mode_for(&token), QuirksMode::LimitedQuirks);
}

#[test]
fn test_html401_transitional_depends_on_system_identifier() {
    let public_id = "-//W3C//DTD HTML 4.01 Transitional//EN";
    assert_eq!(
        quirks_mode_for(&doctype("html", Some(public_id), None)),
        QuirksMode::LimitedQuirks
    );
    assert_eq!(
        quirks_mode_for(&doctype(
            "html",
            Some(public_id),
            Some("http://www.w3.org/TR/html4/loose.dtd")
        )),
        QuirksMode::NoQuirks
    );
}

#[test]
fn test_html401_strict_is_no_quirks() {
    assert_eq!(
        mode_of(
            "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">"
        ),
        QuirksMode::NoQuirks
    );
}

#[test]
fn test_doctype_after_content_does_not_change_mode() {
    assert_eq!(mode_of("<p><!DOCTYPE html>"), QuirksMode::Quirks);
}
