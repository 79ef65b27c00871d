//! Integration tests for named character reference resolution.

use lark_html::entities::{EntityContext, EntityStep, lookup_entity, step};

/// Feed `name` byte by byte and collect every step result.
fn steps(name: &str) -> Vec<EntityStep> {
    let mut context = EntityContext::default();
    name.bytes().map(|b| step(b, &mut context)).collect()
}

#[test]
fn test_lookup_common_entities() {
    assert_eq!(lookup_entity("amp;"), Some("&"));
    assert_eq!(lookup_entity("lt;"), Some("<"));
    assert_eq!(lookup_entity("gt;"), Some(">"));
    assert_eq!(lookup_entity("quot;"), Some("\""));
    assert_eq!(lookup_entity("nbsp;"), Some("\u{00A0}"));
}

#[test]
fn test_lookup_legacy_entities() {
    // Legacy names match without the semicolon
    assert_eq!(lookup_entity("amp"), Some("&"));
    assert_eq!(lookup_entity("lt"), Some("<"));
    assert_eq!(lookup_entity("copy"), Some("\u{00A9}"));
}

#[test]
fn test_lookup_unknown_entity() {
    assert_eq!(lookup_entity("notarealentity;"), None);
    assert_eq!(lookup_entity(""), None);
    assert_eq!(lookup_entity("ampx"), None);
}

#[test]
fn test_step_through_aelig() {
    assert_eq!(
        steps("AElig;"),
        vec![
            EntityStep::NeedMore,
            EntityStep::NeedMore,
            EntityStep::NeedMore,
            EntityStep::NeedMore,
            EntityStep::Match("\u{00C6}"),
            EntityStep::Match("\u{00C6}"),
        ]
    );
}

#[test]
fn test_step_no_match_is_sticky() {
    let mut context = EntityContext::default();
    assert_eq!(step(b'z', &mut context), EntityStep::NoMatch);
    assert_eq!(step(b'z', &mut context), EntityStep::NoMatch);
}

#[test]
fn test_step_longest_prefix() {
    // "not" is a legacy name, "notin;" a longer one
    let results = steps("notin;");
    assert_eq!(results[2], EntityStep::Match("\u{00AC}"));
    assert_eq!(results[5], EntityStep::Match("\u{2209}"));
}

#[test]
fn test_step_after_match_can_fail() {
    let results = steps("AEligz");
    assert_eq!(results[4], EntityStep::Match("\u{00C6}"));
    assert_eq!(results[5], EntityStep::NoMatch);
}
