//! Character reference states for the HTML tokenizer.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! A reference is matched without consuming anything: [`EntityMatch`]
//! records where the `&` sits relative to the read position and how far the
//! match has got, so the states can stop for more input at any byte. Once
//! the match is complete the calling state either emits the replacement
//! (data) or appends it to the attribute value.

use super::core::{HTMLTokenizer, Step, TokenizerState};
use super::helpers::{dispatch, next_char};
use super::token::{Token, TokenSink};
use crate::entities::{self, EntityContext, EntityStep, numeric};
use crate::error::{ParseErrorCode, ParserError};
use crate::input::InputStream;

/// What a completed reference turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Replacement {
    Named(&'static str),
    Numeric(char),
}

impl Replacement {
    fn as_str<'a>(&'a self, buf: &'a mut [u8; 4]) -> &'a str {
        match self {
            Self::Named(text) => text,
            Self::Numeric(c) => c.encode_utf8(buf),
        }
    }
}

/// Progress of the character reference being matched.
#[derive(Debug, Clone, Default)]
pub(super) struct EntityMatch {
    /// Offset of the `&` from the read position.
    offset: usize,
    /// Bytes of the accepted reference, `&` and `;` included. Zero until
    /// something matched.
    length: usize,
    /// Bytes examined so far, including ones a longer match may still need.
    poss_length: usize,
    /// 10 or 16 once a numeric reference has seen its prefix.
    base: u32,
    codepoint: u32,
    overflow: bool,
    context: EntityContext,
    named: Option<&'static str>,
    result: Option<Replacement>,
    /// State that started the match and finishes it.
    return_state: TokenizerState,
    /// State to go back to afterwards: data, or the attribute value state.
    resume_state: TokenizerState,
    /// Character that ends the attribute value and so cannot start a
    /// reference.
    allowed: Option<char>,
    complete: bool,
}

impl EntityMatch {
    pub(super) fn new(
        offset: usize,
        return_state: TokenizerState,
        resume_state: TokenizerState,
        allowed: Option<char>,
    ) -> Self {
        Self {
            offset,
            return_state,
            resume_state,
            allowed,
            ..Self::default()
        }
    }

    fn in_attribute(&self) -> bool {
        self.return_state == TokenizerState::CharacterReferenceInAttributeValue
    }
}

impl HTMLTokenizer {
    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    ///
    /// In data, the `&` is the only thing in the pending run. A resolved
    /// reference becomes a character token of its own; an unresolved one
    /// leaves the `&` as text.
    pub(super) fn handle_character_reference_data_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        if !self.entity.complete {
            return self.consume_character_reference(input);
        }
        let entity = std::mem::take(&mut self.entity);
        self.switch_to(entity.resume_state);
        match entity.result {
            Some(replacement) => {
                let location = self.location;
                self.consume(input, entity.length);
                let mut buf = [0; 4];
                let feedback = dispatch(
                    sink,
                    Token::Character(replacement.as_str(&mut buf)),
                    location,
                );
                self.apply_feedback(feedback?);
            }
            None => self.pending += 1,
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    ///
    /// "If the character reference was consumed as part of an attribute, then
    /// append each character to the current attribute's value."
    pub(super) fn handle_character_reference_in_attribute_value_state(
        &mut self,
        input: &mut dyn InputStream,
    ) -> Result<Step, ParserError> {
        if !self.entity.complete {
            return self.consume_character_reference(input);
        }
        let entity = std::mem::take(&mut self.entity);
        match entity.result {
            Some(replacement) => {
                let mut buf = [0; 4];
                self.push_attribute_value(replacement.as_str(&mut buf));
                self.pending += entity.length;
            }
            None => {
                self.push_attribute_value("&");
                self.pending += 1;
            }
        }
        self.switch_to(entity.resume_state);
        Ok(Step::Continue)
    }

    /// Look at the character after the `&` and pick the kind of reference.
    fn consume_character_reference(
        &mut self,
        input: &mut dyn InputStream,
    ) -> Result<Step, ParserError> {
        let c = next_char!(input, self.entity.offset + 1);
        match c {
            // "Not a character reference. No characters are consumed, and nothing is
            // returned. (This is not an error, either.)"
            None | Some('\t' | '\n' | '\x0C' | ' ' | '<' | '&') => self.finish_reference(None),
            Some(c) if Some(c) == self.entity.allowed => self.finish_reference(None),
            // "U+0023 NUMBER SIGN (#) - Append the current input character to the
            // temporary buffer. Switch to the numeric character reference state."
            Some('#') => {
                self.entity.poss_length = 2;
                self.switch_to(TokenizerState::NumberedEntity);
            }
            Some(_) => {
                self.entity.poss_length = 1;
                self.entity.context = EntityContext::default();
                self.switch_to(TokenizerState::NamedEntity);
            }
        }
        Ok(Step::Continue)
    }

    fn finish_reference(&mut self, result: Option<Replacement>) {
        self.entity.result = result;
        self.entity.complete = true;
        self.switch_to(self.entity.return_state);
    }

    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state)
    ///
    /// "Consume the maximum number of characters possible, where the consumed
    /// characters are one of the identifiers in the first column of the named
    /// character references table."
    pub(super) fn handle_named_entity_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.entity.offset + self.entity.poss_length);
            let Some(byte) = c.filter(char::is_ascii).and_then(|c| u8::try_from(c).ok()) else {
                break;
            };
            match entities::step(byte, &mut self.entity.context) {
                EntityStep::Match(value) => {
                    self.entity.poss_length += 1;
                    self.entity.length = self.entity.poss_length;
                    self.entity.named = Some(value);
                }
                EntityStep::NeedMore => self.entity.poss_length += 1,
                EntityStep::NoMatch => break,
            }
        }

        let Some(value) = self.entity.named else {
            self.finish_reference(None);
            return Ok(Step::Continue);
        };
        let end = self.entity.offset + self.entity.length;
        if input.slice(end - 1, 1) == ";" {
            self.finish_reference(Some(Replacement::Named(value)));
            return Ok(Step::Continue);
        }

        // "If the character reference was consumed as part of an attribute, and
        // the last character matched is not a U+003B SEMICOLON character (;),
        // and the next input character is an ASCII alphanumeric, then, for
        // historical reasons, flush code points consumed as a character
        // reference and switch to the return state."
        if self.entity.in_attribute() {
            let next = next_char!(input, end);
            if next.is_some_and(|c| c.is_ascii_alphanumeric()) {
                self.finish_reference(None);
                return Ok(Step::Continue);
            }
        }
        self.parse_error(sink, ParseErrorCode::MissingSemicolonAfterCharacterReference);
        self.finish_reference(Some(Replacement::Named(value)));
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    /// through
    /// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
    pub(super) fn handle_numbered_entity_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        let offset = self.entity.offset;
        if self.entity.base == 0 {
            // "U+0078 LATIN SMALL LETTER X, U+0058 LATIN CAPITAL LETTER X - Append
            // the current input character to the temporary buffer. Switch to the
            // hexadecimal character reference start state."
            if matches!(next_char!(input, offset + 2), Some('x' | 'X')) {
                self.entity.base = 16;
                self.entity.poss_length = 3;
            } else {
                self.entity.base = 10;
            }
        }

        loop {
            let c = next_char!(input, offset + self.entity.poss_length);
            let Some(digit) = c.and_then(|c| c.to_digit(self.entity.base)) else {
                break;
            };
            self.entity.codepoint = numeric::accumulate(
                self.entity.codepoint,
                digit,
                self.entity.base,
                &mut self.entity.overflow,
            );
            self.entity.poss_length += 1;
            self.entity.length = self.entity.poss_length;
        }

        // "This is an absence-of-digits-in-numeric-character-reference parse
        // error. Flush code points consumed as a character reference."
        if self.entity.length == 0 {
            self.parse_error(sink, ParseErrorCode::AbsenceOfDigitsInNumericCharacterReference);
            self.finish_reference(None);
            return Ok(Step::Continue);
        }

        if next_char!(input, offset + self.entity.length) == Some(';') {
            self.entity.length += 1;
        } else {
            self.parse_error(sink, ParseErrorCode::MissingSemicolonAfterCharacterReference);
        }

        let value = numeric::resolve_numeric(self.entity.codepoint, self.entity.overflow);
        if value == char::REPLACEMENT_CHARACTER && self.entity.codepoint != 0xFFFD {
            self.parse_error(sink, ParseErrorCode::InvalidNumericCharacterReference);
        }
        self.finish_reference(Some(Replacement::Numeric(value)));
        Ok(Step::Continue)
    }
}
