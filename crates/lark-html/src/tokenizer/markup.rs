//! Markup declarations: comments, DOCTYPEs and CDATA sections.
//!
//! [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
//!
//! Keywords are matched one character per step (`match_count` keeps the
//! progress) so a declaration split across chunks tokenizes exactly like
//! one that arrived whole.

use super::core::{HTMLTokenizer, Step, TokenizerState};
use super::helpers::{is_whitespace_char, next_char};
use super::token::TokenSink;
use crate::error::{ParseErrorCode, ParserError};
use crate::input::InputStream;

const DOCTYPE: &[u8] = b"DOCTYPE";
const PUBLIC: &[u8] = b"PUBLIC";
const SYSTEM: &[u8] = b"SYSTEM";
const CDATA: &[u8] = b"[CDATA[";

/// Outcome of matching one more character of a keyword.
enum KeywordMatch {
    Partial,
    Complete,
    Mismatch,
}

impl HTMLTokenizer {
    /// Match the next character of `keyword`. The first character has already
    /// been accepted by the state that started the match.
    fn match_keyword(&mut self, c: Option<char>, keyword: &[u8], ignore_case: bool) -> KeywordMatch {
        let expected = char::from(keyword[self.match_count]);
        let matched = c.is_some_and(|c| {
            if ignore_case {
                c.eq_ignore_ascii_case(&expected)
            } else {
                c == expected
            }
        });
        if !matched {
            return KeywordMatch::Mismatch;
        }
        self.pending += 1;
        self.match_count += 1;
        if self.match_count == keyword.len() {
            KeywordMatch::Complete
        } else {
            KeywordMatch::Partial
        }
    }

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    pub(super) fn handle_markup_declaration_open_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            // "Two U+002D HYPHEN-MINUS characters (-)"
            Some('-') => {
                self.pending += 1;
                self.switch_to(TokenizerState::MatchComment);
            }
            // "ASCII case-insensitive match for the word "DOCTYPE""
            Some('D' | 'd') => {
                self.pending += 1;
                self.match_count = 1;
                self.switch_to(TokenizerState::MatchDoctype);
            }
            // "The string "[CDATA[" (the five uppercase letters "CDATA" with a U+005B
            // LEFT SQUARE BRACKET character before and after)"
            Some('[') if self.process_cdata || sink.cdata_allowed() => {
                self.pending += 1;
                self.match_count = 1;
                self.switch_to(TokenizerState::MatchCdata);
            }
            // "Anything else - This is an incorrectly-opened-comment parse error.
            // Create a comment token whose data is the empty string. Switch to the
            // bogus comment state (don't consume anything in the current state)."
            _ => self.start_bogus_comment(sink),
        }
        Ok(Step::Continue)
    }

    fn start_bogus_comment(&mut self, sink: &mut dyn TokenSink) {
        self.parse_error(sink, ParseErrorCode::IncorrectlyOpenedComment);
        self.comment.discard();
        self.switch_to(TokenizerState::BogusComment);
    }

    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    pub(super) fn handle_bogus_comment_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit the
                // current comment token."
                Some('>') => {
                    self.pending += 1;
                    self.emit_comment(input, sink)?;
                    return Ok(Step::Continue);
                }
                // "EOF - Emit the comment. Emit an end-of-file token."
                None => {
                    self.emit_comment(input, sink)?;
                    return Ok(Step::Continue);
                }
                // "U+0000 NULL - This is an unexpected-null-character parse error. Append
                // a U+FFFD REPLACEMENT CHARACTER character to the comment token's data."
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.comment.push('\u{FFFD}')?;
                    self.pending += 1;
                }
                Some(c) => {
                    self.comment.push(c)?;
                    self.accept(c);
                }
            }
        }
    }

    /// `<!-` seen; anything but a second `-` makes a bogus comment that
    /// starts with the first one.
    pub(super) fn handle_match_comment_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        if next_char!(input, self.pending) == Some('-') {
            self.pending += 1;
            self.comment.discard();
            self.switch_to(TokenizerState::CommentStart);
        } else {
            self.pending -= 1;
            self.start_bogus_comment(sink);
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    pub(super) fn handle_comment_start_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            // "U+002D HYPHEN-MINUS (-) - Switch to the comment start dash state."
            Some('-') => {
                self.pending += 1;
                self.switch_to(TokenizerState::CommentStartDash);
            }
            // "U+003E GREATER-THAN SIGN (>) - This is an abrupt-closing-of-empty-comment
            // parse error. Switch to the data state. Emit the current comment token."
            Some('>') => {
                self.parse_error(sink, ParseErrorCode::AbruptClosingOfEmptyComment);
                self.pending += 1;
                self.emit_comment(input, sink)?;
            }
            Some('\0') => {
                self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                self.comment.push('\u{FFFD}')?;
                self.pending += 1;
                self.switch_to(TokenizerState::Comment);
            }
            None => {
                self.parse_error(sink, ParseErrorCode::EofInComment);
                self.emit_comment(input, sink)?;
            }
            Some(c) => {
                self.comment.push(c)?;
                self.accept(c);
                self.switch_to(TokenizerState::Comment);
            }
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    pub(super) fn handle_comment_start_dash_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            Some('-') => {
                self.pending += 1;
                self.switch_to(TokenizerState::CommentEnd);
            }
            Some('>') => {
                self.parse_error(sink, ParseErrorCode::AbruptClosingOfEmptyComment);
                self.pending += 1;
                self.emit_comment(input, sink)?;
            }
            Some('\0') => {
                self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                self.comment.append("-\u{FFFD}")?;
                self.pending += 1;
                self.switch_to(TokenizerState::Comment);
            }
            None => {
                self.parse_error(sink, ParseErrorCode::EofInComment);
                self.emit_comment(input, sink)?;
            }
            // "Anything else - Append a U+002D HYPHEN-MINUS character (-) to the
            // comment token's data. Reconsume in the comment state."
            Some(c) => {
                self.comment.push('-')?;
                self.comment.push(c)?;
                self.accept(c);
                self.switch_to(TokenizerState::Comment);
            }
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    pub(super) fn handle_comment_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some('-') => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::CommentEndDash);
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.comment.push('\u{FFFD}')?;
                    self.pending += 1;
                }
                None => {
                    self.parse_error(sink, ParseErrorCode::EofInComment);
                    self.emit_comment(input, sink)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    self.comment.push(c)?;
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    pub(super) fn handle_comment_end_dash_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            Some('-') => {
                self.pending += 1;
                self.switch_to(TokenizerState::CommentEnd);
            }
            Some('\0') => {
                self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                self.comment.append("-\u{FFFD}")?;
                self.pending += 1;
                self.switch_to(TokenizerState::Comment);
            }
            None => {
                self.parse_error(sink, ParseErrorCode::EofInComment);
                self.emit_comment(input, sink)?;
            }
            Some(c) => {
                self.comment.push('-')?;
                self.comment.push(c)?;
                self.accept(c);
                self.switch_to(TokenizerState::Comment);
            }
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    pub(super) fn handle_comment_end_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            // "U+003E GREATER-THAN SIGN (>) - Switch to the data state. Emit the
            // current comment token."
            Some('>') => {
                self.pending += 1;
                self.emit_comment(input, sink)?;
            }
            // A third dash belongs to the comment text.
            Some('-') => {
                self.parse_error(sink, ParseErrorCode::IncorrectlyClosedComment);
                self.comment.push('-')?;
                self.pending += 1;
            }
            Some('\0') => {
                self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                self.comment.append("--\u{FFFD}")?;
                self.pending += 1;
                self.switch_to(TokenizerState::Comment);
            }
            None => {
                self.parse_error(sink, ParseErrorCode::EofInComment);
                self.emit_comment(input, sink)?;
            }
            // "--" followed by anything else is comment text.
            Some(c) => {
                self.parse_error(sink, ParseErrorCode::IncorrectlyClosedComment);
                self.comment.append("--")?;
                self.comment.push(c)?;
                self.accept(c);
                self.switch_to(TokenizerState::Comment);
            }
        }
        Ok(Step::Continue)
    }

    /// Matching the rest of `DOCTYPE`, case-insensitively. A mismatch turns
    /// everything after `<!` into a bogus comment.
    pub(super) fn handle_match_doctype_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match self.match_keyword(c, DOCTYPE, true) {
                KeywordMatch::Partial => {}
                KeywordMatch::Complete => {
                    self.doctype = lark_dom::Doctype::default();
                    self.switch_to(TokenizerState::Doctype);
                    return Ok(Step::Continue);
                }
                KeywordMatch::Mismatch => {
                    self.pending -= self.match_count;
                    self.start_bogus_comment(sink);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    pub(super) fn handle_doctype_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        match next_char!(input, self.pending) {
            Some(c) if is_whitespace_char(c) => self.pending += 1,
            // "EOF - Reconsume in the before DOCTYPE name state."
            None => {}
            // "Anything else - This is a missing-whitespace-before-doctype-name parse
            // error. Reconsume in the before DOCTYPE name state."
            Some(_) => {
                self.parse_error(sink, ParseErrorCode::MissingWhitespaceBeforeDoctypeName);
            }
        }
        self.switch_to(TokenizerState::BeforeDoctypeName);
        Ok(Step::Continue)
    }

    /// Unterminated or broken DOCTYPE: flag force-quirks and emit.
    fn emit_quirky_doctype(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
        code: ParseErrorCode,
    ) -> Result<(), ParserError> {
        self.parse_error(sink, code);
        self.doctype.force_quirks = true;
        self.emit_doctype(input, sink)
    }

    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    pub(super) fn handle_before_doctype_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                // "U+003E GREATER-THAN SIGN (>) - This is a missing-doctype-name parse
                // error. Set the current DOCTYPE token's force-quirks flag to on."
                Some('>') => {
                    self.pending += 1;
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::MissingDoctypeName)?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some('\0') => {
                    self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                    self.doctype.name = Some(String::from('\u{FFFD}'));
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypeName);
                    return Ok(Step::Continue);
                }
                // "Create a new DOCTYPE token. Set the token's name to the lowercase
                // version of the current input character."
                Some(c) => {
                    self.doctype.name = Some(String::from(c.to_ascii_lowercase()));
                    self.accept(c);
                    self.switch_to(TokenizerState::DoctypeName);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    pub(super) fn handle_doctype_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => {
                    self.pending += 1;
                    self.switch_to(TokenizerState::AfterDoctypeName);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_doctype(input, sink)?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    let value = if c == '\0' {
                        self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                        '\u{FFFD}'
                    } else {
                        c.to_ascii_lowercase()
                    };
                    self.doctype.name.get_or_insert_with(String::new).push(value);
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.56 After DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-name-state)
    pub(super) fn handle_after_doctype_name_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                Some('>') => {
                    self.pending += 1;
                    self.emit_doctype(input, sink)?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                // "If the six characters starting from the current input character are
                // an ASCII case-insensitive match for the word "PUBLIC""
                Some('P' | 'p') => {
                    self.pending += 1;
                    self.match_count = 1;
                    self.switch_to(TokenizerState::MatchPublic);
                    return Ok(Step::Continue);
                }
                Some('S' | 's') => {
                    self.pending += 1;
                    self.match_count = 1;
                    self.switch_to(TokenizerState::MatchSystem);
                    return Ok(Step::Continue);
                }
                // "Otherwise, this is an invalid-character-sequence-after-doctype-name
                // parse error. Set the current DOCTYPE token's force-quirks flag to on.
                // Reconsume in the bogus DOCTYPE state."
                Some(_) => {
                    self.become_bogus_doctype(sink);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    fn become_bogus_doctype(&mut self, sink: &mut dyn TokenSink) {
        self.parse_error(sink, ParseErrorCode::InvalidCharacterSequenceAfterDoctypeName);
        self.doctype.force_quirks = true;
        self.switch_to(TokenizerState::BogusDoctype);
    }

    /// Matching the rest of `PUBLIC`.
    pub(super) fn handle_match_public_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match self.match_keyword(c, PUBLIC, true) {
                KeywordMatch::Partial => {}
                KeywordMatch::Complete => {
                    self.switch_to(TokenizerState::BeforeDoctypePublic);
                    return Ok(Step::Continue);
                }
                KeywordMatch::Mismatch => {
                    self.become_bogus_doctype(sink);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// Matching the rest of `SYSTEM`.
    pub(super) fn handle_match_system_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match self.match_keyword(c, SYSTEM, true) {
                KeywordMatch::Partial => {}
                KeywordMatch::Complete => {
                    self.switch_to(TokenizerState::BeforeDoctypeSystem);
                    return Ok(Step::Continue);
                }
                KeywordMatch::Mismatch => {
                    self.become_bogus_doctype(sink);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.58 Before DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-public-identifier-state)
    pub(super) fn handle_before_doctype_public_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                // "Set the current DOCTYPE token's public identifier to the empty
                // string (not missing), then switch to the DOCTYPE public identifier
                // (double-quoted) state."
                Some('"') => {
                    self.doctype.public_id = Some(String::new());
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypePublicDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Some('\'') => {
                    self.doctype.public_id = Some(String::new());
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypePublicSingleQuoted);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_quirky_doctype(
                        input,
                        sink,
                        ParseErrorCode::MissingDoctypePublicIdentifier,
                    )?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    self.parse_error(
                        sink,
                        ParseErrorCode::MissingQuoteBeforeDoctypePublicIdentifier,
                    );
                    self.doctype.force_quirks = true;
                    self.accept(c);
                    self.switch_to(TokenizerState::BogusDoctype);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.59 DOCTYPE public identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(double-quoted)-state)
    /// and the single-quoted variant.
    pub(super) fn handle_doctype_public_quoted_state(
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
                    self.switch_to(TokenizerState::AfterDoctypePublic);
                    return Ok(Step::Continue);
                }
                // "U+003E GREATER-THAN SIGN (>) - This is an abrupt-doctype-public-identifier
                // parse error. Set the current DOCTYPE token's force-quirks flag to on."
                Some('>') => {
                    self.pending += 1;
                    self.emit_quirky_doctype(
                        input,
                        sink,
                        ParseErrorCode::AbruptDoctypePublicIdentifier,
                    )?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    let value = if c == '\0' {
                        self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                        '\u{FFFD}'
                    } else {
                        c
                    };
                    self.doctype
                        .public_id
                        .get_or_insert_with(String::new)
                        .push(value);
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.61 After DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-identifier-state)
    pub(super) fn handle_after_doctype_public_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                Some('"') => {
                    self.doctype.system_id = Some(String::new());
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypeSystemDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Some('\'') => {
                    self.doctype.system_id = Some(String::new());
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypeSystemSingleQuoted);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_doctype(input, sink)?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    self.parse_error(
                        sink,
                        ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                    );
                    self.doctype.force_quirks = true;
                    self.accept(c);
                    self.switch_to(TokenizerState::BogusDoctype);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.64 Before DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-system-identifier-state)
    pub(super) fn handle_before_doctype_system_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                Some('"') => {
                    self.doctype.system_id = Some(String::new());
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypeSystemDoubleQuoted);
                    return Ok(Step::Continue);
                }
                Some('\'') => {
                    self.doctype.system_id = Some(String::new());
                    self.pending += 1;
                    self.switch_to(TokenizerState::DoctypeSystemSingleQuoted);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_quirky_doctype(
                        input,
                        sink,
                        ParseErrorCode::MissingDoctypeSystemIdentifier,
                    )?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    self.parse_error(
                        sink,
                        ParseErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                    );
                    self.doctype.force_quirks = true;
                    self.accept(c);
                    self.switch_to(TokenizerState::BogusDoctype);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.65 DOCTYPE system identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(double-quoted)-state)
    /// and the single-quoted variant.
    pub(super) fn handle_doctype_system_quoted_state(
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
                    self.switch_to(TokenizerState::AfterDoctypeSystem);
                    return Ok(Step::Continue);
                }
                Some('>') => {
                    self.pending += 1;
                    self.emit_quirky_doctype(
                        input,
                        sink,
                        ParseErrorCode::AbruptDoctypeSystemIdentifier,
                    )?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => {
                    let value = if c == '\0' {
                        self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                        '\u{FFFD}'
                    } else {
                        c
                    };
                    self.doctype
                        .system_id
                        .get_or_insert_with(String::new)
                        .push(value);
                    self.accept(c);
                }
            }
        }
    }

    /// [§ 13.2.5.67 After DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-identifier-state)
    pub(super) fn handle_after_doctype_system_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(c) if is_whitespace_char(c) => self.pending += 1,
                Some('>') => {
                    self.pending += 1;
                    self.emit_doctype(input, sink)?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                // "Anything else - This is an
                // unexpected-character-after-doctype-system-identifier parse error.
                // Reconsume in the bogus DOCTYPE state. (This does not set the current
                // DOCTYPE token's force-quirks flag to on.)"
                Some(_) => {
                    self.parse_error(
                        sink,
                        ParseErrorCode::UnexpectedCharacterAfterDoctypeSystemIdentifier,
                    );
                    self.switch_to(TokenizerState::BogusDoctype);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.68 Bogus DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-doctype-state)
    ///
    /// Unlike the standard, a DOCTYPE cut off by end of file is always
    /// flagged force-quirks, whatever came before.
    pub(super) fn handle_bogus_doctype_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some('>') => {
                    self.pending += 1;
                    self.emit_doctype(input, sink)?;
                    return Ok(Step::Continue);
                }
                None => {
                    self.emit_quirky_doctype(input, sink, ParseErrorCode::EofInDoctype)?;
                    return Ok(Step::Continue);
                }
                Some(c) => self.accept(c),
            }
        }
    }

    /// Matching the rest of `[CDATA[`, case-sensitively. The section marker is
    /// consumed without producing a token.
    pub(super) fn handle_match_cdata_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match self.match_keyword(c, CDATA, false) {
                KeywordMatch::Partial => {}
                KeywordMatch::Complete => {
                    let len = std::mem::take(&mut self.pending);
                    self.consume(input, len);
                    self.switch_to(TokenizerState::CdataBlock);
                    return Ok(Step::Continue);
                }
                KeywordMatch::Mismatch => {
                    self.pending -= self.match_count;
                    self.start_bogus_comment(sink);
                    return Ok(Step::Continue);
                }
            }
        }
    }

    /// [§ 13.2.5.69 CDATA section state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-state)
    ///
    /// Section content is character data up to `]]>`.
    pub(super) fn handle_cdata_block_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                Some(']') => {
                    let second = next_char!(input, self.pending + 1);
                    let third = next_char!(input, self.pending + 2);
                    if second == Some(']') && third == Some('>') {
                        if self.pending > 0 {
                            self.flush_characters(input, sink)?;
                        } else {
                            self.consume(input, 3);
                            self.switch_to(TokenizerState::Data);
                        }
                        return Ok(Step::Continue);
                    }
                    self.pending += 1;
                }
                Some('\0') => {
                    if self.pending > 0 {
                        self.flush_characters(input, sink)?;
                    } else {
                        self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                        self.emit_replacement(input, sink, "\u{FFFD}", 1)?;
                    }
                    return Ok(Step::Continue);
                }
                // "EOF - This is an eof-in-cdata parse error. Emit an end-of-file token."
                None => {
                    if self.pending > 0 {
                        self.flush_characters(input, sink)?;
                    } else {
                        self.parse_error(sink, ParseErrorCode::EofInCdata);
                        self.switch_to(TokenizerState::Data);
                    }
                    return Ok(Step::Continue);
                }
                Some(c) => self.accept(c),
            }
        }
    }
}
