use lark_dom::{Doctype, Namespace, Tag};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::character_reference::EntityMatch;
use super::helpers::{LastStartTag, is_whitespace_char, next_char};
use super::token::{ContentModel, TokenSink};
use crate::buffer::TextBuffer;
use crate::error::{Location, ParseErrorCode, ParserError, RunStatus};
use crate::input::{InputStream, Peek};

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The tokenizer state machine. Text-only element content is handled by the
/// data state under a [`ContentModel`] rather than by separate states, and
/// keyword matches (`--`, `DOCTYPE`, `PUBLIC`, `SYSTEM`, `[CDATA[`) get
/// their own states so they can stop mid-word when input runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    #[default]
    Data,
    /// A `&` in data; resolves through [`TokenizerState::NamedEntity`] or
    /// [`TokenizerState::NumberedEntity`].
    CharacterReferenceData,
    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    TagOpen,
    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    CloseTagOpen,
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    TagName,
    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    BeforeAttributeName,
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    AttributeName,
    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    AfterAttributeName,
    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    BeforeAttributeValue,
    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    AttributeValueDoubleQuoted,
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    AttributeValueSingleQuoted,
    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    AttributeValueUnquoted,
    /// A `&` inside an attribute value.
    CharacterReferenceInAttributeValue,
    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    AfterAttributeValueQuoted,
    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    SelfClosingStartTag,
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    BogusComment,
    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    MarkupDeclarationOpen,
    /// Seen `<!-`, expecting the second `-`.
    MatchComment,
    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    CommentStart,
    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    CommentStartDash,
    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    Comment,
    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    CommentEndDash,
    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    CommentEnd,
    /// Matching the rest of `DOCTYPE`.
    MatchDoctype,
    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    Doctype,
    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    BeforeDoctypeName,
    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    DoctypeName,
    /// [§ 13.2.5.56 After DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-name-state)
    AfterDoctypeName,
    /// Matching the rest of `PUBLIC`.
    MatchPublic,
    /// [§ 13.2.5.58 Before DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-public-identifier-state)
    BeforeDoctypePublic,
    /// [§ 13.2.5.59 DOCTYPE public identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(double-quoted)-state)
    DoctypePublicDoubleQuoted,
    /// [§ 13.2.5.60 DOCTYPE public identifier (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(single-quoted)-state)
    DoctypePublicSingleQuoted,
    /// [§ 13.2.5.61 After DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-identifier-state)
    AfterDoctypePublic,
    /// Matching the rest of `SYSTEM`.
    MatchSystem,
    /// [§ 13.2.5.64 Before DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-system-identifier-state)
    BeforeDoctypeSystem,
    /// [§ 13.2.5.65 DOCTYPE system identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(double-quoted)-state)
    DoctypeSystemDoubleQuoted,
    /// [§ 13.2.5.66 DOCTYPE system identifier (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(single-quoted)-state)
    DoctypeSystemSingleQuoted,
    /// [§ 13.2.5.67 After DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-identifier-state)
    AfterDoctypeSystem,
    /// [§ 13.2.5.68 Bogus DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-doctype-state)
    BogusDoctype,
    /// Matching the rest of `[CDATA[`.
    MatchCdata,
    /// [§ 13.2.5.69 CDATA section state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-state)
    CdataBlock,
    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    NumberedEntity,
    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state)
    NamedEntity,
}

/// Whether the tag being built is a start or an end tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum TagKind {
    #[default]
    Start,
    End,
}

/// Outcome of one state handler call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Dispatch again on the (possibly new) state.
    Continue,
    /// The handler needs input that has not arrived yet.
    NeedData,
}

/// Tokenizer settings fixed at creation. Both can also be changed between
/// runs through [`HTMLTokenizer::set_content_model`] and
/// [`HTMLTokenizer::set_process_cdata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    /// Content model to start in, for fragments such as the body of a
    /// `<title>`.
    pub initial_content_model: ContentModel,
    /// Recognise `<![CDATA[` sections everywhere, not only where the sink
    /// allows them.
    pub process_cdata: bool,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "Implementations must act as if they used the following state machine to tokenize HTML."
///
/// The tokenizer owns no input. Each [`HTMLTokenizer::run`] peeks at an
/// [`InputStream`] and feeds a [`TokenSink`] until the input runs out, a
/// pause is requested, or the end-of-file token has been emitted. Nothing is
/// consumed from the stream until a token is emitted, so every partial
/// construct survives a `NeedData` return untouched.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct HTMLTokenizer {
    pub(super) state: TokenizerState,
    pub(super) content_model: ContentModel,
    /// Inside a `<!-- ... -->` run of RCDATA/CDATA text.
    pub(super) escape_flag: bool,
    pub(super) process_cdata: bool,
    pub(super) paused: bool,
    pub(super) complete: bool,
    /// Bytes examined past the read position but not yet consumed.
    pub(super) pending: usize,
    /// Location of the read position.
    pub(super) location: Location,

    pub(super) tag: Tag,
    pub(super) tag_kind: TagKind,
    pub(super) comment: TextBuffer,
    pub(super) doctype: Doctype,
    /// Characters of the current keyword matched so far.
    pub(super) match_count: usize,
    /// Bytes of the last start tag name matched after `</` in RCDATA/CDATA.
    pub(super) close_tag_match: usize,
    pub(super) entity: EntityMatch,

    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    /// "The last start tag token emitted is used as part of the tree construction stage
    /// and in the RCDATA, RAWTEXT, and script data states."
    pub(super) last_start_tag: LastStartTag,
}

impl HTMLTokenizer {
    /// Create a new tokenizer.
    ///
    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
    /// "The initial state is the data state."
    #[must_use]
    pub fn new(options: TokenizerOptions) -> Self {
        Self {
            state: TokenizerState::Data,
            content_model: options.initial_content_model,
            escape_flag: false,
            process_cdata: options.process_cdata,
            paused: false,
            complete: false,
            pending: 0,
            location: Location::default(),
            tag: Tag {
                namespace: Namespace::Html,
                ..Tag::default()
            },
            tag_kind: TagKind::Start,
            comment: TextBuffer::new(),
            doctype: Doctype::default(),
            match_count: 0,
            close_tag_match: 0,
            entity: EntityMatch::default(),
            last_start_tag: LastStartTag::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TokenizerState {
        self.state
    }

    /// Current content model.
    #[must_use]
    pub const fn content_model(&self) -> ContentModel {
        self.content_model
    }

    /// Switch the content model. Clears the escape flag.
    pub fn set_content_model(&mut self, model: ContentModel) {
        self.content_model = model;
        self.escape_flag = false;
    }

    /// Toggle `<![CDATA[` recognition outside of sink-approved contexts.
    pub const fn set_process_cdata(&mut self, process: bool) {
        self.process_cdata = process;
    }

    /// Stop before the next token. Takes effect at the next token boundary
    /// when called from inside a sink.
    pub const fn pause(&mut self) {
        self.paused = true;
    }

    /// Clear a pause. The caller runs the tokenizer again to continue.
    pub const fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether a pause is in effect.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the end-of-file token has been emitted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Location of the first unconsumed character.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Tokenize until the input runs dry, a pause is requested or the
    /// end-of-file token has been emitted.
    ///
    /// # Errors
    ///
    /// Errors from the input stream (including [`ParserError::BadEncoding`])
    /// and from the sink abort the run. Tokens already emitted stay consumed
    /// and the run can be retried after the cause is dealt with.
    pub fn run(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<RunStatus, ParserError> {
        loop {
            if self.complete {
                return Ok(RunStatus::Complete);
            }
            if self.paused {
                return Ok(RunStatus::Paused);
            }
            let step = match self.state {
                TokenizerState::Data => self.handle_data_state(input, sink)?,
                TokenizerState::CharacterReferenceData => {
                    self.handle_character_reference_data_state(input, sink)?
                }
                TokenizerState::TagOpen => self.handle_tag_open_state(input, sink)?,
                TokenizerState::CloseTagOpen => self.handle_close_tag_open_state(input, sink)?,
                TokenizerState::TagName => self.handle_tag_name_state(input, sink)?,
                TokenizerState::BeforeAttributeName => {
                    self.handle_before_attribute_name_state(input, sink)?
                }
                TokenizerState::AttributeName => self.handle_attribute_name_state(input, sink)?,
                TokenizerState::AfterAttributeName => {
                    self.handle_after_attribute_name_state(input, sink)?
                }
                TokenizerState::BeforeAttributeValue => {
                    self.handle_before_attribute_value_state(input, sink)?
                }
                TokenizerState::AttributeValueDoubleQuoted => {
                    self.handle_attribute_value_quoted_state(input, sink, '"')?
                }
                TokenizerState::AttributeValueSingleQuoted => {
                    self.handle_attribute_value_quoted_state(input, sink, '\'')?
                }
                TokenizerState::AttributeValueUnquoted => {
                    self.handle_attribute_value_unquoted_state(input, sink)?
                }
                TokenizerState::CharacterReferenceInAttributeValue => {
                    self.handle_character_reference_in_attribute_value_state(input)?
                }
                TokenizerState::AfterAttributeValueQuoted => {
                    self.handle_after_attribute_value_quoted_state(input, sink)?
                }
                TokenizerState::SelfClosingStartTag => {
                    self.handle_self_closing_start_tag_state(input, sink)?
                }
                TokenizerState::BogusComment => self.handle_bogus_comment_state(input, sink)?,
                TokenizerState::MarkupDeclarationOpen => {
                    self.handle_markup_declaration_open_state(input, sink)?
                }
                TokenizerState::MatchComment => self.handle_match_comment_state(input, sink)?,
                TokenizerState::CommentStart => self.handle_comment_start_state(input, sink)?,
                TokenizerState::CommentStartDash => {
                    self.handle_comment_start_dash_state(input, sink)?
                }
                TokenizerState::Comment => self.handle_comment_state(input, sink)?,
                TokenizerState::CommentEndDash => self.handle_comment_end_dash_state(input, sink)?,
                TokenizerState::CommentEnd => self.handle_comment_end_state(input, sink)?,
                TokenizerState::MatchDoctype => self.handle_match_doctype_state(input, sink)?,
                TokenizerState::Doctype => self.handle_doctype_state(input, sink)?,
                TokenizerState::BeforeDoctypeName => {
                    self.handle_before_doctype_name_state(input, sink)?
                }
                TokenizerState::DoctypeName => self.handle_doctype_name_state(input, sink)?,
                TokenizerState::AfterDoctypeName => {
                    self.handle_after_doctype_name_state(input, sink)?
                }
                TokenizerState::MatchPublic => self.handle_match_public_state(input, sink)?,
                TokenizerState::BeforeDoctypePublic => {
                    self.handle_before_doctype_public_state(input, sink)?
                }
                TokenizerState::DoctypePublicDoubleQuoted => {
                    self.handle_doctype_public_quoted_state(input, sink, '"')?
                }
                TokenizerState::DoctypePublicSingleQuoted => {
                    self.handle_doctype_public_quoted_state(input, sink, '\'')?
                }
                TokenizerState::AfterDoctypePublic => {
                    self.handle_after_doctype_public_state(input, sink)?
                }
                TokenizerState::MatchSystem => self.handle_match_system_state(input, sink)?,
                TokenizerState::BeforeDoctypeSystem => {
                    self.handle_before_doctype_system_state(input, sink)?
                }
                TokenizerState::DoctypeSystemDoubleQuoted => {
                    self.handle_doctype_system_quoted_state(input, sink, '"')?
                }
                TokenizerState::DoctypeSystemSingleQuoted => {
                    self.handle_doctype_system_quoted_state(input, sink, '\'')?
                }
                TokenizerState::AfterDoctypeSystem => {
                    self.handle_after_doctype_system_state(input, sink)?
                }
                TokenizerState::BogusDoctype => self.handle_bogus_doctype_state(input, sink)?,
                TokenizerState::MatchCdata => self.handle_match_cdata_state(input, sink)?,
                TokenizerState::CdataBlock => self.handle_cdata_block_state(input, sink)?,
                TokenizerState::NumberedEntity => self.handle_numbered_entity_state(input, sink)?,
                TokenizerState::NamedEntity => self.handle_named_entity_state(input, sink)?,
            };
            if step == Step::NeedData {
                return Ok(RunStatus::NeedData);
            }
        }
    }

    /// Whether `&` starts a character reference in the data state.
    const fn references_allowed(&self) -> bool {
        matches!(self.content_model, ContentModel::Pcdata | ContentModel::Rcdata)
            && !self.escape_flag
    }

    /// Whether `<` may start markup in the data state.
    const fn tags_allowed(&self) -> bool {
        match self.content_model {
            ContentModel::Pcdata => true,
            ContentModel::Rcdata | ContentModel::Cdata => !self.escape_flag,
            ContentModel::Plaintext => false,
        }
    }

    pub(super) const fn is_text_only(&self) -> bool {
        matches!(self.content_model, ContentModel::Rcdata | ContentModel::Cdata)
    }

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    ///
    /// Also covers RCDATA, CDATA and PLAINTEXT content. Characters collect in
    /// the pending run; a token boundary flushes the run before anything
    /// else is emitted.
    fn handle_data_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        loop {
            let c = next_char!(input, self.pending);
            match c {
                // "U+0026 AMPERSAND (&) - Set the return state to the data state.
                // Switch to the character reference state."
                Some('&') if self.references_allowed() => {
                    if self.pending > 0 {
                        self.flush_characters(input, sink)?;
                    } else {
                        self.entity = EntityMatch::new(
                            0,
                            TokenizerState::CharacterReferenceData,
                            TokenizerState::Data,
                            None,
                        );
                        self.switch_to(TokenizerState::CharacterReferenceData);
                    }
                    return Ok(Step::Continue);
                }
                // "U+003C LESS-THAN SIGN (<) - Switch to the tag open state."
                Some('<') if self.tags_allowed() => {
                    if self.pending > 0 {
                        self.flush_characters(input, sink)?;
                    } else {
                        self.pending = 1;
                        self.switch_to(TokenizerState::TagOpen);
                    }
                    return Ok(Step::Continue);
                }
                // "<!--" in RCDATA/CDATA text: markup is off until "-->".
                Some('-')
                    if self.is_text_only()
                        && !self.escape_flag
                        && self.pending >= 3
                        && input.slice(self.pending - 3, 3) == "<!-" =>
                {
                    self.escape_flag = true;
                    self.pending += 1;
                }
                Some('>')
                    if self.is_text_only()
                        && self.escape_flag
                        && self.pending >= 2
                        && input.slice(self.pending - 2, 2) == "--" =>
                {
                    self.escape_flag = false;
                    self.pending += 1;
                }
                // "U+0000 NULL - This is an unexpected-null-character parse error."
                Some('\0') => {
                    if self.pending > 0 {
                        self.flush_characters(input, sink)?;
                    } else {
                        self.parse_error(sink, ParseErrorCode::UnexpectedNullCharacter);
                        self.emit_replacement(input, sink, "\u{FFFD}", 1)?;
                    }
                    return Ok(Step::Continue);
                }
                // "EOF - Emit an end-of-file token."
                None => {
                    if self.pending > 0 {
                        self.flush_characters(input, sink)?;
                    } else {
                        self.emit_eof(sink)?;
                    }
                    return Ok(Step::Continue);
                }
                // "Anything else - Emit the current input character as a character token."
                Some(c) => self.accept(c),
            }
        }
    }

    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    ///
    /// The `<` is part of the pending run. Whenever the `<` turns out not to
    /// start a tag it simply stays in the run as text.
    fn handle_tag_open_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        let c = next_char!(input, self.pending);

        if self.is_text_only() {
            if c == Some('/') {
                self.pending += 1;
                self.close_tag_match = 0;
                self.switch_to(TokenizerState::CloseTagOpen);
            } else {
                self.switch_to(TokenizerState::Data);
            }
            return Ok(Step::Continue);
        }

        match c {
            // "U+0021 EXCLAMATION MARK (!) - Switch to the markup declaration open state."
            Some('!') => {
                self.pending += 1;
                self.switch_to(TokenizerState::MarkupDeclarationOpen);
            }
            // "U+002F SOLIDUS (/) - Switch to the end tag open state."
            Some('/') => {
                self.pending += 1;
                self.close_tag_match = 0;
                self.switch_to(TokenizerState::CloseTagOpen);
            }
            // "ASCII alpha - Create a new start tag token, set its tag name to the
            // empty string. Reconsume in the tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag_token(TagKind::Start, c.to_ascii_lowercase());
                self.pending += 1;
                self.switch_to(TokenizerState::TagName);
            }
            // "U+003F QUESTION MARK (?) - This is an
            // unexpected-question-mark-instead-of-tag-name parse error. Create a
            // comment token whose data is the empty string. Reconsume in the bogus
            // comment state."
            Some('?') => {
                self.parse_error(sink, ParseErrorCode::UnexpectedQuestionMarkInsteadOfTagName);
                self.comment.discard();
                self.switch_to(TokenizerState::BogusComment);
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a U+003C
            // LESS-THAN SIGN character token and an end-of-file token."
            None => {
                self.parse_error(sink, ParseErrorCode::EofBeforeTagName);
                self.switch_to(TokenizerState::Data);
            }
            // "Anything else - This is an invalid-first-character-of-tag-name parse
            // error. Emit a U+003C LESS-THAN SIGN character token. Reconsume in the
            // data state."
            Some(c) => {
                if c == '>' {
                    self.pending += 1;
                }
                self.parse_error(sink, ParseErrorCode::InvalidFirstCharacterOfTagName);
                self.switch_to(TokenizerState::Data);
            }
        }
        Ok(Step::Continue)
    }

    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    ///
    /// In RCDATA/CDATA only "an appropriate end tag token" is accepted: the
    /// name of the last start tag, followed by whitespace, `/`, `>` or EOF.
    /// Anything else leaves `</` as text.
    fn handle_close_tag_open_state(
        &mut self,
        input: &mut dyn InputStream,
        sink: &mut dyn TokenSink,
    ) -> Result<Step, ParserError> {
        if self.is_text_only() {
            match self.match_last_start_tag(input)? {
                None => return Ok(Step::NeedData),
                Some(matched) => {
                    self.close_tag_match = 0;
                    if !matched {
                        self.switch_to(TokenizerState::Data);
                        return Ok(Step::Continue);
                    }
                }
            }
        }

        match next_char!(input, self.pending) {
            // "ASCII alpha - Create a new end tag token, set its tag name to the empty
            // string. Reconsume in the tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag_token(TagKind::End, c.to_ascii_lowercase());
                self.pending += 1;
                self.switch_to(TokenizerState::TagName);
            }
            // "U+003E GREATER-THAN SIGN (>) - This is a missing-end-tag-name parse
            // error. Switch to the data state."
            Some('>') => {
                self.parse_error(sink, ParseErrorCode::MissingEndTagName);
                self.pending += 1;
                let len = std::mem::take(&mut self.pending);
                self.consume(input, len);
                self.switch_to(TokenizerState::Data);
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a U+003C
            // LESS-THAN SIGN character token, a U+002F SOLIDUS character token and
            // an end-of-file token."
            None => {
                self.parse_error(sink, ParseErrorCode::EofBeforeTagName);
                self.switch_to(TokenizerState::Data);
            }
            // "Anything else - This is an invalid-first-character-of-tag-name parse
            // error. Create a comment token whose data is the empty string.
            // Reconsume in the bogus comment state."
            Some(_) => {
                self.parse_error(sink, ParseErrorCode::InvalidFirstCharacterOfTagName);
                self.comment.discard();
                self.switch_to(TokenizerState::BogusComment);
            }
        }
        Ok(Step::Continue)
    }

    /// Match the last start tag name after `</`, case-insensitively.
    /// `None` means the input ran out part way; progress is kept in
    /// `close_tag_match`.
    fn match_last_start_tag(
        &mut self,
        input: &mut dyn InputStream,
    ) -> Result<Option<bool>, ParserError> {
        let name_len = self.last_start_tag.as_str().len();
        if name_len == 0 {
            return Ok(Some(false));
        }
        while self.close_tag_match < name_len {
            let c = match input.peek(self.pending + self.close_tag_match)? {
                Peek::Char(c) => c,
                Peek::Eof => return Ok(Some(false)),
                Peek::NeedData => return Ok(None),
            };
            let expected = self.last_start_tag.as_str()[self.close_tag_match..]
                .chars()
                .next();
            if !expected.is_some_and(|e| e.eq_ignore_ascii_case(&c)) {
                return Ok(Some(false));
            }
            self.close_tag_match += c.len_utf8();
        }
        let matched = match input.peek(self.pending + name_len)? {
            Peek::Char(c) => is_whitespace_char(c) || c == '/' || c == '>',
            Peek::Eof => true,
            Peek::NeedData => return Ok(None),
        };
        Ok(Some(matched))
    }
}
