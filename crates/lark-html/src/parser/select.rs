//! [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
//! and [§ 13.2.6.4.17 The "in select in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselectintable)

use lark_dom::TreeHandler;

use super::core::{Flow, ModeResult, TreeBuilder};
use super::element_type::ElementType;
use super::stack::Scope;
use crate::error::{ParseErrorCode, ParserError};
use crate::tokenizer::Token;

const TABLE_PARTS: &[&str] = &["caption", "table", "tbody", "tfoot", "thead", "tr", "td", "th"];

impl<H: TreeHandler> TreeBuilder<H> {
    pub(super) fn handle_in_select_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Character(text) => {
                self.insert_text(text)?;
                Ok(Flow::Done)
            }

            Token::Comment(data) => {
                self.insert_comment(data, None)?;
                Ok(Flow::Done)
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }

            Token::StartTag(tag) => match ElementType::from_name(&tag.name) {
                ElementType::Html => self.handle_in_body_mode(token),

                // "If the current node is an option element, pop that node from
                // the stack of open elements. Insert an HTML element for the
                // token."
                ElementType::Option => {
                    self.pop_if_current(ElementType::Option)?;
                    let _ = self.insert_element(tag)?;
                    Ok(Flow::Done)
                }

                ElementType::Optgroup => {
                    self.pop_if_current(ElementType::Option)?;
                    self.pop_if_current(ElementType::Optgroup)?;
                    let _ = self.insert_element(tag)?;
                    Ok(Flow::Done)
                }

                ElementType::Hr => {
                    self.pop_if_current(ElementType::Option)?;
                    self.pop_if_current(ElementType::Optgroup)?;
                    self.insert_void_element(tag)?;
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is "select""
                // "Parse error. If the stack of open elements does not have a
                // select element in select scope, ignore the token. Otherwise:
                // Pop elements from the stack of open elements until a select
                // element has been popped from the stack. Reset the insertion
                // mode appropriately."
                ElementType::Select => {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    let _ = self.close_select()?;
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is one of: "input", "keygen",
                // "textarea""
                ElementType::Input | ElementType::Keygen | ElementType::Textarea => {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    Ok(if self.close_select()? { Flow::Reprocess(token) } else { Flow::Done })
                }

                ElementType::Script => self.handle_in_head_mode(token),

                _ => {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    Ok(Flow::Done)
                }
            },

            Token::EndTag(tag) => {
                match ElementType::from_name(&tag.name) {
                    // "First, if the current node is an option element, and the
                    // node immediately before it in the stack of open elements
                    // is an optgroup element, then pop the current node from the
                    // stack of open elements."
                    ElementType::Optgroup => {
                        let before_is_optgroup = self
                            .stack
                            .len()
                            .checked_sub(2)
                            .is_some_and(|i| self.stack[i].is_html(ElementType::Optgroup));
                        if self.current_is(ElementType::Option) && before_is_optgroup {
                            let _ = self.pop_element()?;
                        }
                        if self.current_is(ElementType::Optgroup) {
                            let _ = self.pop_element()?;
                        } else {
                            self.parse_error(ParseErrorCode::UnexpectedEndTag);
                        }
                    }
                    ElementType::Option => {
                        if self.current_is(ElementType::Option) {
                            let _ = self.pop_element()?;
                        } else {
                            self.parse_error(ParseErrorCode::UnexpectedEndTag);
                        }
                    }
                    ElementType::Select => {
                        let _ = self.close_select()?;
                    }
                    _ => self.parse_error(ParseErrorCode::UnexpectedEndTag),
                }
                Ok(Flow::Done)
            }

            Token::Eof => self.handle_in_body_mode(token),
        }
    }

    fn pop_if_current(&mut self, kind: ElementType) -> Result<(), ParserError> {
        if self.current_is(kind) {
            let _ = self.pop_element()?;
        }
        Ok(())
    }

    /// Pop up to and including the `select` element in select scope and
    /// reset the insertion mode. Returns `false` when there is none.
    fn close_select(&mut self) -> Result<bool, ParserError> {
        if !self.in_scope(ElementType::Select, Scope::Select) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return Ok(false);
        }
        self.pop_until(ElementType::Select)?;
        self.reset_insertion_mode();
        Ok(true)
    }

    pub(super) fn handle_in_select_in_table_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A start tag whose tag name is one of: "caption", "table",
            // "tbody", "tfoot", "thead", "tr", "td", "th""
            // "Parse error. Pop elements from the stack of open elements until a
            // select element has been popped from the stack. Reset the
            // insertion mode appropriately. Reprocess the token."
            Token::StartTag(tag) if TABLE_PARTS.contains(&tag.name.as_str()) => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                self.pop_until(ElementType::Select)?;
                self.reset_insertion_mode();
                Ok(Flow::Reprocess(token))
            }

            // "If the stack of open elements does not have an element in table
            // scope that is an HTML element with the same tag name as that of
            // the token, then ignore the token."
            Token::EndTag(tag) if TABLE_PARTS.contains(&tag.name.as_str()) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                let kind = ElementType::from_name(&tag.name);
                if !self.in_scope(kind, Scope::Table) {
                    return Ok(Flow::Done);
                }
                self.pop_until(ElementType::Select)?;
                self.reset_insertion_mode();
                Ok(Flow::Reprocess(token))
            }

            _ => self.handle_in_select_mode(token),
        }
    }
}
