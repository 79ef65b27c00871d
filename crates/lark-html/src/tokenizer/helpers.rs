//! Helper functions for the HTML tokenizer.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! This module contains utility functions used throughout the tokenizer:
//! - Lookahead ("the next input character") without consuming input
//! - Token emission ("Emit the current token"), which is the only place
//!   input is consumed
//! - Attribute helpers for duplicate detection
//! - The last start tag record used by RCDATA/CDATA end tags

use lark_dom::{Attribute, Namespace};

use super::core::{HTMLTokenizer, TagKind, TokenizerState};
use super::token::{ContentModel, SinkFeedback, Token, TokenSink};
use crate::error::{Location, ParseError, ParseErrorCode, ParserError};
use crate::input::InputStream;

/// Look at the character `$offset` bytes past the read position.
///
/// Evaluates to `Some(char)` or `None` at end of file. When the input is
/// exhausted the enclosing handler returns `Step::NeedData`, leaving every
/// piece of partial state in place for the next run.
macro_rules! next_char {
    ($input:expr, $offset:expr) => {
        match $input.peek($offset)? {
            $crate::input::Peek::Char(c) => Some(c),
            $crate::input::Peek::Eof => None,
            $crate::input::Peek::NeedData => {
                return Ok($crate::tokenizer::core::Step::NeedData);
            }
        }
    };
}
pub(super) use next_char;

/// "The last start tag to have been emitted from this tokenizer". Only the
/// first [`LastStartTag::MAX_LEN`] bytes are kept.
#[derive(Debug, Clone, Default)]
pub(super) struct LastStartTag {
    name: String,
}

impl LastStartTag {
    pub(super) const MAX_LEN: usize = 10;

    pub(super) fn record(&mut self, name: &str) {
        self.name.clear();
        for c in name.chars() {
            if self.name.len() + c.len_utf8() > Self::MAX_LEN {
                break;
            }
            self.name.push(c);
        }
    }

    pub(super) fn as_str(&self) -> &str {
        &self.name
    }
}

/// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
///
/// The tokenizer never sees CR, which the input stream has already
/// normalized away.
pub(super) const fn is_whitespace_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C')
}

/// Hand one token to the sink.
pub(super) fn dispatch(
    sink: &mut dyn TokenSink,
    token: Token<'_>,
    location: Location,
) -> Result<SinkFeedback, ParserError> {
    log::trace!(target: "lark_html::tokenizer", "emit {token} at {location}");
    sink.process_token(token, location)
}

// =============================================================================
// State and input helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Switch to the X state"
    pub(super) fn switch_to(&mut self, new_state: TokenizerState) {
        log::trace!(target: "lark_html::tokenizer", "{} -> {new_state}", self.state);
        self.state = new_state;
    }

    /// Extend the examined-but-unconsumed run by one character.
    pub(super) const fn accept(&mut self, c: char) {
        self.pending += c.len_utf8();
    }

    /// Consume `len` bytes, keeping the location in step.
    pub(super) fn consume(&mut self, input: &mut dyn InputStream, len: usize) {
        self.location.advance(input.slice(0, len));
        input.advance(len);
    }

    /// Report a parse error at the current read position.
    pub(super) fn parse_error(&self, sink: &mut dyn TokenSink, code: ParseErrorCode) {
        sink.report_error(ParseError {
            code,
            location: self.location,
        });
    }

    pub(super) fn apply_feedback(&mut self, feedback: SinkFeedback) {
        match feedback {
            SinkFeedback::Continue => {}
            SinkFeedback::ContentModel(model) => {
                log::trace!(target: "lark_html::tokenizer", "content model {model}");
                self.content_model = model;
                self.escape_flag = false;
            }
            SinkFeedback::Pause => self.paused = true,
        }
    }
}

// =============================================================================
// Token Emission Helpers
// =============================================================================

impl HTMLTokenizer {
    /// Emit the pending run of input as one character token.
    pub(super) fn flush_characters(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<(), ParserError> {
        if self.pending == 0 {
            return Ok(());
        }
        let len = std::mem::take(&mut self.pending);
        let location = self.location;
        let text = input.slice(0, len);
        self.location.advance(text);
        let feedback = dispatch(sink, Token::Character(text), location);
        input.advance(len);
        self.apply_feedback(feedback?);
        Ok(())
    }

    /// Emit `text` as a character token in place of the next `len` bytes of
    /// input.
    pub(super) fn emit_replacement(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
        text: &str,
        len: usize,
    ) -> Result<(), ParserError> {
        let location = self.location;
        self.consume(input, len);
        let feedback = dispatch(sink, Token::Character(text), location);
        self.apply_feedback(feedback?);
        Ok(())
    }

    /// "Emit the current tag token."
    pub(super) fn emit_tag(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<(), ParserError> {
        self.remove_duplicate_attributes(sink);
        if self.tag_kind == TagKind::End {
            if !self.tag.attributes.is_empty() {
                self.parse_error(sink, ParseErrorCode::EndTagWithAttributes);
            }
            if self.tag.self_closing {
                self.parse_error(sink, ParseErrorCode::EndTagWithTrailingSolidus);
            }
        }

        let location = self.location;
        let len = std::mem::take(&mut self.pending);
        self.consume(input, len);
        self.switch_to(TokenizerState::Data);

        let feedback = match self.tag_kind {
            TagKind::Start => {
                self.last_start_tag.record(&self.tag.name);
                dispatch(sink, Token::StartTag(&self.tag), location)
            }
            TagKind::End => {
                // Only the matching end tag leaves RCDATA/CDATA content.
                if self.is_text_only() {
                    self.content_model = ContentModel::Pcdata;
                    self.escape_flag = false;
                }
                dispatch(sink, Token::EndTag(&self.tag), location)
            }
        };
        self.reset_tag();
        self.apply_feedback(feedback?);
        Ok(())
    }

    /// "Emit the comment token."
    pub(super) fn emit_comment(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<(), ParserError> {
        let location = self.location;
        let len = std::mem::take(&mut self.pending);
        self.consume(input, len);
        self.switch_to(TokenizerState::Data);

        let feedback = dispatch(sink, Token::Comment(self.comment.as_str()), location);
        self.comment.discard();
        self.apply_feedback(feedback?);
        Ok(())
    }

    /// "Emit the current DOCTYPE token."
    pub(super) fn emit_doctype(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<(), ParserError> {
        let location = self.location;
        let len = std::mem::take(&mut self.pending);
        self.consume(input, len);
        self.switch_to(TokenizerState::Data);

        let feedback = dispatch(sink, Token::Doctype(&self.doctype), location);
        self.doctype = lark_dom::Doctype::default();
        self.apply_feedback(feedback?);
        Ok(())
    }

    /// "Emit an end-of-file token."
    pub(super) fn emit_eof(&mut self, sink: &mut dyn TokenSink) -> Result<(), ParserError> {
        self.complete = true;
        let feedback = dispatch(sink, Token::Eof, self.location);
        self.apply_feedback(feedback?);
        Ok(())
    }
}

// =============================================================================
// Tag and attribute helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Create a new start tag token" / "Create a new end tag token"
    pub(super) fn start_tag_token(&mut self, kind: TagKind, first: char) {
        self.reset_tag();
        self.tag_kind = kind;
        self.tag.name.push(first);
    }

    pub(super) fn reset_tag(&mut self) {
        self.tag.namespace = Namespace::Html;
        self.tag.name.clear();
        self.tag.attributes.clear();
        self.tag.self_closing = false;
    }

    /// "Start a new attribute in the current tag token."
    pub(super) fn start_attribute(&mut self, first: char) {
        let mut name = String::new();
        name.push(first);
        self.tag.attributes.push(Attribute::new(name, String::new()));
    }

    pub(super) fn current_attribute(&mut self) -> Option<&mut Attribute> {
        self.tag.attributes.last_mut()
    }

    pub(super) fn push_attribute_name(&mut self, c: char) {
        if let Some(attr) = self.current_attribute() {
            attr.name.push(c);
        }
    }

    pub(super) fn push_attribute_value(&mut self, text: &str) {
        if let Some(attr) = self.current_attribute() {
            attr.value.push_str(text);
        }
    }

    /// "When the user agent leaves the attribute name state ... if there is
    /// already an attribute on the token with the exact same name, then this
    /// is a duplicate-attribute parse error and the new attribute must be
    /// removed from the token."
    ///
    /// Performed once when the tag is emitted; the first occurrence wins.
    pub(super) fn remove_duplicate_attributes(&mut self, sink: &mut dyn TokenSink) {
        let mut index = 1;
        while index < self.tag.attributes.len() {
            let name = &self.tag.attributes[index].name;
            if self.tag.attributes[..index].iter().any(|a| &a.name == name) {
                let _ = self.tag.attributes.remove(index);
                self.parse_error(sink, ParseErrorCode::DuplicateAttribute);
            } else {
                index += 1;
            }
        }
    }

    /// An unterminated tag at end of file is not a tag at all: drop it and
    /// let the data state emit the markup as text.
    pub(super) fn abandon_tag(&mut self, sink: &mut dyn TokenSink) {
        self.parse_error(sink, ParseErrorCode::EofInTag);
        self.reset_tag();
        self.switch_to(TokenizerState::Data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_start_tag_is_bounded() {
        let mut last = LastStartTag::default();
        last.record("blockquotes");
        assert_eq!(last.as_str(), "blockquote");
        last.record("textarea");
        assert_eq!(last.as_str(), "textarea");
    }

    #[test]
    fn test_whitespace_excludes_carriage_return() {
        assert!(is_whitespace_char('\x0C'));
        assert!(!is_whitespace_char('\r'));
    }
}
