//! The modes after the body or frameset has been closed, and the frameset
//! modes themselves.

use lark_dom::TreeHandler;

use super::core::{
    Flow, InsertionMode, ModeResult, TreeBuilder, is_html_whitespace, split_leading_whitespace,
};
use super::element_type::ElementType;
use super::head::rest_of;
use crate::error::{ParseErrorCode, ParserError};
use crate::tokenizer::Token;

impl<H: TreeHandler> TreeBuilder<H> {
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    pub(super) fn handle_after_body_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // Whitespace: "Process the token using the rules for the "in body"
            // insertion mode."
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return Ok(self.reopen_body(token));
                }
                let _ = self.handle_in_body_mode(Token::Character(space))?;
                Ok(rest_of(rest))
            }

            // "A comment token"
            // "Insert a comment as the last child of the first element in the
            // stack of open elements (the html element)."
            Token::Comment(data) => {
                self.insert_comment_in_html(data)?;
                Ok(Flow::Done)
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }

            Token::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),

            // "An end tag whose tag name is "html""
            // "... Otherwise, switch the insertion mode to "after after body"."
            Token::EndTag(tag) if tag.name == "html" => {
                self.switch_mode(InsertionMode::AfterAfterBody);
                Ok(Flow::Done)
            }

            Token::Eof => Ok(Flow::Done),

            _ => Ok(self.reopen_body(token)),
        }
    }

    /// "Parse error. Switch the insertion mode to "in body" and reprocess the
    /// token."
    fn reopen_body<'t>(&mut self, token: Token<'t>) -> Flow<'t> {
        self.parse_error(ParseErrorCode::UnexpectedCharacter);
        self.switch_mode(InsertionMode::InBody);
        Flow::Reprocess(token)
    }

    /// Insert only the whitespace of a character run; the frameset modes
    /// drop everything else as a parse error.
    fn insert_frameset_whitespace(&mut self, text: &str) -> Result<(), ParserError> {
        let space: String = text.chars().filter(|&c| is_html_whitespace(c)).collect();
        if space.len() != text.len() {
            self.parse_error(ParseErrorCode::UnexpectedCharacter);
        }
        self.insert_text(&space)
    }

    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    pub(super) fn handle_in_frameset_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Character(text) => self.insert_frameset_whitespace(text)?,

            Token::Comment(data) => self.insert_comment(data, None)?,

            Token::Doctype(_) => self.parse_error(ParseErrorCode::UnexpectedDoctype),

            Token::StartTag(tag) => match ElementType::from_name(&tag.name) {
                ElementType::Html => return self.handle_in_body_mode(token),
                ElementType::Frameset => {
                    let _ = self.insert_element(tag)?;
                }
                // "Insert an HTML element for the token. Immediately pop the
                // current node off the stack of open elements."
                ElementType::Frame => self.insert_void_element(tag)?,
                ElementType::Noframes => return self.handle_in_head_mode(token),
                _ => self.parse_error(ParseErrorCode::UnexpectedStartTag),
            },

            // "An end tag whose tag name is "frameset""
            // "If the current node is the root html element, then this is a
            // parse error; ignore the token. Otherwise, pop the current node
            // from the stack of open elements. If the parser was not created as
            // part of the HTML fragment parsing algorithm (fragment case), and
            // the current node is no longer a frameset element, then switch the
            // insertion mode to "after frameset"."
            Token::EndTag(tag) if tag.name == "frameset" => {
                if self.stack.len() <= 1 {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                let _ = self.pop_element()?;
                if !self.current_is(ElementType::Frameset) {
                    self.switch_mode(InsertionMode::AfterFrameset);
                }
            }

            Token::EndTag(_) => self.parse_error(ParseErrorCode::UnexpectedEndTag),

            // "If the current node is not the root html element, then this is a
            // parse error. Stop parsing."
            Token::Eof => {
                if self.stack.len() > 1 {
                    self.parse_error(ParseErrorCode::UnexpectedEof);
                }
            }
        }
        Ok(Flow::Done)
    }

    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    pub(super) fn handle_after_frameset_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Character(text) => self.insert_frameset_whitespace(text)?,
            Token::Comment(data) => self.insert_comment(data, None)?,
            Token::Doctype(_) => self.parse_error(ParseErrorCode::UnexpectedDoctype),
            Token::StartTag(tag) if tag.name == "html" => return self.handle_in_body_mode(token),
            Token::StartTag(tag) if tag.name == "noframes" => return self.handle_in_head_mode(token),
            Token::EndTag(tag) if tag.name == "html" => {
                self.switch_mode(InsertionMode::AfterAfterFrameset);
            }
            Token::StartTag(_) => self.parse_error(ParseErrorCode::UnexpectedStartTag),
            Token::EndTag(_) => self.parse_error(ParseErrorCode::UnexpectedEndTag),
            Token::Eof => {}
        }
        Ok(Flow::Done)
    }

    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    pub(super) fn handle_after_after_body_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Comment(data) => {
                self.insert_comment_in_document(data)?;
                Ok(Flow::Done)
            }

            // "A DOCTYPE token, a character token that is ... whitespace, a
            // start tag whose tag name is "html""
            // "Process the token using the rules for the "in body" insertion
            // mode."
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return Ok(self.reopen_body(token));
                }
                let _ = self.handle_in_body_mode(Token::Character(space))?;
                Ok(rest_of(rest))
            }
            Token::Doctype(_) => self.handle_in_body_mode(token),
            Token::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),

            Token::Eof => Ok(Flow::Done),

            _ => Ok(self.reopen_body(token)),
        }
    }

    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    pub(super) fn handle_after_after_frameset_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Comment(data) => self.insert_comment_in_document(data)?,
            Token::Character(text) => {
                let space: String = text.chars().filter(|&c| is_html_whitespace(c)).collect();
                if space.len() != text.len() {
                    self.parse_error(ParseErrorCode::UnexpectedCharacter);
                }
                if !space.is_empty() {
                    let _ = self.handle_in_body_mode(Token::Character(&space))?;
                }
            }
            Token::Doctype(_) => return self.handle_in_body_mode(token),
            Token::StartTag(tag) if tag.name == "html" => return self.handle_in_body_mode(token),
            Token::StartTag(tag) if tag.name == "noframes" => return self.handle_in_head_mode(token),
            Token::StartTag(_) => self.parse_error(ParseErrorCode::UnexpectedStartTag),
            Token::EndTag(_) => self.parse_error(ParseErrorCode::UnexpectedEndTag),
            Token::Eof => {}
        }
        Ok(Flow::Done)
    }
}
