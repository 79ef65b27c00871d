//! Tag name and attribute states.
//!
//! Every character of a tag stays in the pending run until the tag is
//! emitted. If input ends inside a tag, the tag is abandoned and the run is
//! emitted as text by the data state.

use super::character_reference::EntityMatch;
use super::core::{HTMLTokenizer, Step, TokenizerState};
use super::helpers::{is_whitespace_char, next_char};
use super::token::TokenSink;
use crate::error::{ParseErrorCode, ParserError};
use crate::input::InputStream;

impl HTMLTokenizer {
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    pub(super) fn handle_tag_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                // "U+0009 CHARACTER TABULATION, U+000A LINE FEED, U+000C FORM FEED,
                // U+0020 SPACE - Switch to the before attribute name state."
                Some(c) if is_whitespace_char(c) => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::BeforeAttributeName);
                    return Ok(Step::Continue);
                }
                // "U+002F SOLIDUS (/) - Switch to the self-closing start tag state."
                Some('/') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::SelfClosingStartTag);
                    return Ok(Step::Continue);
                }
                // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit the current token."
                Some('>') => {
                    self.pending += 1;
                    self.emit_tag(input, sink)?;
                    return Ok(Step::Continue);
                }
                // "U+0000 NULL - This is an unexpected-null-character parse error. Append a
                // U+FFFD REPLACEMENT CHARACTER to the current tag token's tag name."
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.tag.name.push('\u{FFFD}');
                    self.pending += 1;
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                // "ASCII upper alpha - Append the lowercase version of the current input
                // character to the current tag token's tag name."
                Some(c) => {
                    self.tag.name.push(c.to_ascii_lowercase());
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    pub(super) fn handle_before_attribute_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                // "Ignore the character."
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                Some('/') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::SelfClosingStartTag);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_tag(input, sink)?;
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.start_attribute('\u{FFFD}');
                    self.pending += 1;
                    self.switch_to(TokenizerState::AttributeName);
                    return Ok(Step::Continue);
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                // "Start a new attribute in the current tag token. Set that attribute
                // name to the current input character, and its value to the empty
                // string."
                Some(c) => {
                    if matches!(c, '"' | '\'' | '<' | '=') {
                        self.parse_error(
                            sink,
                            ParseErrorCode::UnexpectedCharacterInAttributeName,
                        );
                    }
                    self.start_attribute(c.to_ascii_lowercase());
                    self.accept(c);
                    self.switch_to(TokenizerState::AttributeName);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    pub(super) fn handle_attribute_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::AfterAttributeName);
                    return Ok(Step::Continue);
                }
                Some('/') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::SelfClosingStartTag);
                    return Ok(Step::Continue);
                }
                // "U+003D EQUALS SIGN (=) - Switch to the before attribute value state."
                Some('=') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::BeforeAttributeValue);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_tag(input, sink)?;
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.push_attribute_name('\u{FFFD}');
                    self.pending += 1;
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    if matches!(c, '"' | '\'' | '<') {
                        self.parse_error(
                            sink,
                            ParseErrorCode::UnexpectedCharacterInAttributeName,
                        );
                    }
                    self.push_attribute_name(c.to_ascii_lowercase());
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    pub(super) fn handle_after_attribute_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                Some('/') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::SelfClosingStartTag);
                    return Ok(Step::Continue);
                }
                Some('=') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::BeforeAttributeValue);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_tag(input, sink)?;
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.start_attribute('\u{FFFD}');
                    self.pending += 1;
                    self.switch_to(TokenizerState::AttributeName);
                    return Ok(Step::Continue);
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    if matches!(c, '"' | '\'' | '<') {
                        self.parse_error(
                            sink,
                            ParseErrorCode::UnexpectedCharacterInAttributeName,
                        );
                    }
                    self.start_attribute(c.to_ascii_lowercase());
                    self.accept(c);
                    self.switch_to(TokenizerState::AttributeName);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    pub(super) fn handle_before_attribute_value_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                // "U+0022 QUOTATION MARK (\") - Switch to the attribute value
                // (double-quoted) state."
                Some('"') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::AttributeValueDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Some('\'') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::AttributeValueSingleQuoted);
                    return Ok(Step::Continue);
                }
                // Reconsume in the unquoted value state.
                Some('&') => {
                    self.switch_to(TokenizerState::AttributeValueUnquoted);
                    return Ok(Step::Continue);
                }
                // "U+003E GREATER-THAN SIGN (>) - This is a missing-attribute-value parse
                // error. Switch to the data state. Emit the current tag token."
                Some('>') => {
                    self.parse_error(sink, ParseErrorCode::MissingAttributeValue);
                    self.pending += 1;
                    self.emit_tag(input, sink)?;
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.push_attribute_value("\u{FFFD}");
                    self.pending += 1;
                    self.switch_to(TokenizerState::AttributeValueUnquoted);
                    return Ok(Step::Continue);
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    if matches!(c, '<' | '=' | '`') {
                        self.parse_error(
                            sink,
                            ParseErrorCode::UnexpectedCharacterInUnquotedAttributeValue,
                        );
                    }
                    self.push_attribute_value(c.encode_utf8(&mut [0; 4]));
                    self.accept(c);
                    self.switch_to(TokenizerState::AttributeValueUnquoted);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    /// and
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    pub(super) fn handle_attribute_value_quoted_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
        quote: char,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if c == quote => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::AfterAttributeValueQuoted);
                    return Ok(Step::Continue);
                }
                // "U+0026 AMPERSAND (&) - Set the return state to the attribute value
                // state. Switch to the character reference state."
                Some('&') => {
                    self.begin_attribute_reference(quote);
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.push_attribute_value("\u{FFFD}");
                    self.pending += 1;
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    self.push_attribute_value(c.encode_utf8(&mut [0; 4]));
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    pub(super) fn handle_attribute_value_unquoted_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::BeforeAttributeName);
                    return Ok(Step::Continue);
                }
                Some('&') => {
                    self.begin_attribute_reference('>');
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_tag(input, sink)?;
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.push_attribute_value("\u{FFFD}");
                    self.pending += 1;
                }
                None => {
                    self.abandon_tag(sink);
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    if matches!(c, '"' | '\'' | '<' | '=' | '`') {
                        self.parse_error(
                            sink,
                            ParseErrorCode::UnexpectedCharacterInUnquotedAttributeValue,
                        );
                    }
                    self.push_attribute_value(c.encode_utf8(&mut [0; 4]));
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    pub(super) fn handle_after_attribute_value_quoted_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            Some(c) if is_whitespace_char(c) => {
                self.pending += 1;
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('/') => {
                self.pending += 1;
                self.switch_to(TokenizerState::SelfClosingStartTag);
            }
            Some('>') => {
                self.pending += 1;
                self.emit_tag(input, sink)?;
            }
            None => self.abandon_tag(sink),
            // "Anything else - This is a missing-whitespace-between-attributes parse
            // error. Reconsume in the before attribute name state."
            Some(_) => {
                self.parse_error(sink, ParseErrorCode::MissingWhitespaceBetweenAttributes);
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    pub(super) fn handle_self_closing_start_tag_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            // "U+003E GREATER-THAN SIGN (>) - Set the self-closing flag of the current
            // tag token. Switch to the data state. Emit the current tag token."
            Some('>') => {
                self.tag.self_closing = true;
                self.pending += 1;
                self.emit_tag(input, sink)?;
            }
            None => self.abandon_tag(sink),
            // "Anything else - This is an unexpected-solidus-in-tag parse error.
            // Reconsume in the before attribute name state."
            Some(_) => {
                self.parse_error(sink, ParseErrorCode::UnexpectedSolidusInTag);
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
        }
        Ok(Step::Continue)
    }

    /// Start a character reference at the `&` sitting at the end of the
    /// pending run. `allowed` is the character that ends the value.
    fn begin_attribute_reference(&mut self, allowed: char) {
        self.entity = EntityMatch::new(
            self.pending,
            TokenizerState::CharacterReferenceInAttributeValue,
            self.state,
            Some(allowed),
        );
        self.switch_to(TokenizerState::CharacterReferenceInAttributeValue);
    }
}
