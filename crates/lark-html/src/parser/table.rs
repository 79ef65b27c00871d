//! Table insertion modes: "in table", "in table text", "in caption", "in
//! column group", "in table body", "in row" and "in cell".

use lark_dom::{Tag, TreeHandler};

use super::core::{
    Flow, InsertionMode, ModeResult, TreeBuilder, is_html_whitespace, split_leading_whitespace,
};
use super::element_type::ElementType;
use super::head::rest_of;
use super::stack::Scope;
use crate::error::{ParseErrorCode, ParserError};
use crate::tokenizer::Token;

/// "clear the stack back to a table context"
const TABLE_CONTEXT: &[ElementType] = &[ElementType::Table, ElementType::Template];

/// "clear the stack back to a table body context"
const TABLE_BODY_CONTEXT: &[ElementType] = &[
    ElementType::Tbody,
    ElementType::Tfoot,
    ElementType::Thead,
    ElementType::Template,
];

/// "clear the stack back to a table row context"
const TABLE_ROW_CONTEXT: &[ElementType] = &[ElementType::Tr, ElementType::Template];

const TABLE_SECTIONS: &[ElementType] = &[ElementType::Tbody, ElementType::Tfoot, ElementType::Thead];

const CELLS: &[ElementType] = &[ElementType::Td, ElementType::Th];

fn is_one_of(tag: &Tag, names: &[&str]) -> bool {
    names.contains(&tag.name.as_str())
}

impl<H: TreeHandler> TreeBuilder<H> {
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    pub(super) fn handle_in_table_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A character token, if the current node is table, tbody,
            // template, tfoot, thead, or tr element"
            // "Let the pending table character tokens be an empty list of
            // tokens. Let the original insertion mode be the current insertion
            // mode. Switch the insertion mode to "in table text" and reprocess
            // the token."
            Token::Character(_)
                if self.current().is_some_and(|e| {
                    e.is_html_one_of(&[
                        ElementType::Table,
                        ElementType::Tbody,
                        ElementType::Template,
                        ElementType::Tfoot,
                        ElementType::Thead,
                        ElementType::Tr,
                    ])
                }) =>
            {
                self.pending_table_text.discard();
                self.original_mode = self.mode;
                self.switch_mode(InsertionMode::InTableText);
                Ok(Flow::Reprocess(token))
            }

            Token::Comment(data) => {
                self.insert_comment(data, None)?;
                Ok(Flow::Done)
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }

            Token::StartTag(tag) => self.in_table_start_tag(token, tag),

            // "An end tag whose tag name is "table""
            // "If the stack of open elements does not have a table element in
            // table scope, this is a parse error; ignore the token. Otherwise:
            // Pop elements from this stack until a table element has been
            // popped from the stack. Reset the insertion mode appropriately."
            Token::EndTag(tag) if tag.name == "table" => {
                if !self.in_scope(ElementType::Table, Scope::Table) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.pop_until(ElementType::Table)?;
                self.reset_insertion_mode();
                Ok(Flow::Done)
            }

            // "An end tag whose tag name is one of: "body", "caption", "col",
            // "colgroup", "html", "tbody", "td", "tfoot", "th", "thead", "tr""
            // "Parse error. Ignore the token."
            Token::EndTag(tag)
                if is_one_of(
                    tag,
                    &[
                        "body", "caption", "col", "colgroup", "html", "tbody", "td", "tfoot", "th",
                        "thead", "tr",
                    ],
                ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            // "An end-of-file token"
            // "Process the token using the rules for the "in body" insertion
            // mode."
            Token::Eof => self.handle_in_body_mode(token),

            _ => self.in_table_anything_else(token),
        }
    }

    fn in_table_start_tag<'t>(&mut self, token: Token<'t>, tag: &Tag) -> ModeResult<'t> {
        match ElementType::from_name(&tag.name) {
            // "Clear the stack back to a table context. Insert a marker at the
            // end of the list of active formatting elements. Insert an HTML
            // element for the token, then switch the insertion mode to "in
            // caption"."
            ElementType::Caption => {
                self.clear_stack_back_to(TABLE_CONTEXT)?;
                self.push_formatting_marker();
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::InCaption);
                Ok(Flow::Done)
            }

            ElementType::Colgroup => {
                self.clear_stack_back_to(TABLE_CONTEXT)?;
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::InColumnGroup);
                Ok(Flow::Done)
            }

            // "Clear the stack back to a table context. Insert an HTML element
            // for a "colgroup" start tag token with no attributes, then switch
            // the insertion mode to "in column group". Reprocess the current
            // token."
            ElementType::Col => {
                self.clear_stack_back_to(TABLE_CONTEXT)?;
                let _ = self.insert_element_named("colgroup")?;
                self.switch_mode(InsertionMode::InColumnGroup);
                Ok(Flow::Reprocess(token))
            }

            ElementType::Tbody | ElementType::Tfoot | ElementType::Thead => {
                self.clear_stack_back_to(TABLE_CONTEXT)?;
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::InTableBody);
                Ok(Flow::Done)
            }

            ElementType::Td | ElementType::Th | ElementType::Tr => {
                self.clear_stack_back_to(TABLE_CONTEXT)?;
                let _ = self.insert_element_named("tbody")?;
                self.switch_mode(InsertionMode::InTableBody);
                Ok(Flow::Reprocess(token))
            }

            // "A start tag whose tag name is "table""
            // "Parse error. If the stack of open elements does not have a table
            // element in table scope, ignore the token. Otherwise: Pop elements
            // from this stack until a table element has been popped from the
            // stack. Reset the insertion mode appropriately. Reprocess the
            // token."
            ElementType::Table => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if !self.in_scope(ElementType::Table, Scope::Table) {
                    return Ok(Flow::Done);
                }
                self.pop_until(ElementType::Table)?;
                self.reset_insertion_mode();
                Ok(Flow::Reprocess(token))
            }

            ElementType::Style | ElementType::Script => self.handle_in_head_mode(token),

            // "A start tag whose tag name is "input""
            // "If the token does not have an attribute with the name "type", or
            // if it does, but that attribute's value is not an ASCII
            // case-insensitive match for the string "hidden", then: act as
            // described in the "anything else" entry below."
            ElementType::Input => {
                let hidden = tag
                    .attribute("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
                if !hidden {
                    return self.in_table_anything_else(token);
                }
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                self.insert_void_element(tag)?;
                Ok(Flow::Done)
            }

            // "A start tag whose tag name is "form""
            // "Parse error. If ... the form element pointer is not null, ignore
            // the token. Otherwise: Insert an HTML element for the token, and
            // set the form element pointer to point to the element created. Pop
            // that form element off the stack of open elements."
            ElementType::Form => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if self.form_element.is_some() {
                    return Ok(Flow::Done);
                }
                let form = self.insert_element(tag)?;
                self.set_form_element(Some(form))?;
                let _ = self.pop_element()?;
                Ok(Flow::Done)
            }

            _ => self.in_table_anything_else(token),
        }
    }

    /// "Parse error. Enable foster parenting, process the token using the
    /// rules for the "in body" insertion mode, and then disable foster
    /// parenting."
    fn in_table_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        self.parse_error(match token {
            Token::Character(_) => ParseErrorCode::UnexpectedCharacter,
            Token::EndTag(_) => ParseErrorCode::UnexpectedEndTag,
            _ => ParseErrorCode::UnexpectedStartTag,
        });
        self.foster_parenting = true;
        let flow = self.handle_in_body_mode(token);
        self.foster_parenting = false;
        flow
    }

    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    pub(super) fn handle_in_table_text_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        if let Token::Character(text) = token {
            // "Append the character token to the pending table character
            // tokens list."
            self.pending_table_text.append(text)?;
            return Ok(Flow::Done);
        }

        // "If any of the tokens in the pending table character tokens list are
        // character tokens that are not ASCII whitespace, then this is a parse
        // error: reprocess the character tokens in the pending table character
        // tokens list using the rules given in the "anything else" entry in the
        // "in table" insertion mode. Otherwise, insert the characters given by
        // the pending table character tokens list."
        let pending = self.pending_table_text.as_str().to_string();
        self.pending_table_text.discard();
        self.flush_table_text(&pending)?;

        // "Switch the insertion mode to the original insertion mode and
        // reprocess the token."
        self.switch_mode(self.original_mode);
        Ok(Flow::Reprocess(token))
    }

    fn flush_table_text(&mut self, pending: &str) -> Result<(), ParserError> {
        if pending.chars().all(is_html_whitespace) {
            return self.insert_text(pending);
        }
        let _ = self.in_table_anything_else(Token::Character(pending))?;
        Ok(())
    }

    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    pub(super) fn handle_in_caption_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "An end tag whose tag name is "caption""
            Token::EndTag(tag) if tag.name == "caption" => {
                let _ = self.close_caption()?;
                Ok(Flow::Done)
            }

            // "A start tag whose tag name is one of: "caption", "col",
            // "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr"" / "An end
            // tag whose tag name is "table""
            // "If the stack of open elements does not have a caption element in
            // table scope, this is a parse error; ignore the token. Otherwise:
            // ... Reprocess the token."
            Token::StartTag(tag)
                if is_one_of(
                    tag,
                    &["caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr"],
                ) =>
            {
                Ok(if self.close_caption()? { Flow::Reprocess(token) } else { Flow::Done })
            }
            Token::EndTag(tag) if tag.name == "table" => {
                Ok(if self.close_caption()? { Flow::Reprocess(token) } else { Flow::Done })
            }

            Token::EndTag(tag)
                if is_one_of(
                    tag,
                    &[
                        "body", "col", "colgroup", "html", "tbody", "td", "tfoot", "th", "thead",
                        "tr",
                    ],
                ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            _ => self.handle_in_body_mode(token),
        }
    }

    /// "Generate implied end tags. Now, if the current node is not a caption
    /// element, then this is a parse error. Pop elements from this stack until
    /// a caption element has been popped from the stack. Clear the list of
    /// active formatting elements up to the last marker. Switch the insertion
    /// mode to "in table"."
    fn close_caption(&mut self) -> Result<bool, ParserError> {
        if !self.in_scope(ElementType::Caption, Scope::Table) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return Ok(false);
        }
        self.close_implied_end_tags(None)?;
        if !self.current_is(ElementType::Caption) {
            self.parse_error(ParseErrorCode::MisnestedTag);
        }
        self.pop_until(ElementType::Caption)?;
        self.clear_formatting_to_last_marker()?;
        self.switch_mode(InsertionMode::InTable);
        Ok(true)
    }

    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolumngroup)
    pub(super) fn handle_in_column_group_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.in_column_group_anything_else(token);
                }
                self.insert_text(space)?;
                Ok(rest_of(rest))
            }

            Token::Comment(data) => {
                self.insert_comment(data, None)?;
                Ok(Flow::Done)
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }

            Token::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),

            // "A start tag whose tag name is "col""
            // "Insert an HTML element for the token. Immediately pop the current
            // node off the stack of open elements."
            Token::StartTag(tag) if tag.name == "col" => {
                self.insert_void_element(tag)?;
                Ok(Flow::Done)
            }

            // "An end tag whose tag name is "colgroup""
            // "If the current node is not a colgroup element, then this is a
            // parse error; ignore the token. Otherwise, pop the current node
            // from the stack of open elements. Switch the insertion mode to "in
            // table"."
            Token::EndTag(tag) if tag.name == "colgroup" => {
                if !self.current_is(ElementType::Colgroup) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                let _ = self.pop_element()?;
                self.switch_mode(InsertionMode::InTable);
                Ok(Flow::Done)
            }

            Token::EndTag(tag) if tag.name == "col" => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            Token::Eof => self.handle_in_body_mode(token),

            _ => self.in_column_group_anything_else(token),
        }
    }

    fn in_column_group_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        if !self.current_is(ElementType::Colgroup) {
            self.parse_error(ParseErrorCode::UnexpectedStartTag);
            return Ok(Flow::Done);
        }
        let _ = self.pop_element()?;
        self.switch_mode(InsertionMode::InTable);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intbody)
    pub(super) fn handle_in_table_body_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A start tag whose tag name is "tr""
            // "Clear the stack back to a table body context. Insert an HTML
            // element for the token, then switch the insertion mode to "in
            // row"."
            Token::StartTag(tag) if tag.name == "tr" => {
                self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::InRow);
                Ok(Flow::Done)
            }

            Token::StartTag(tag) if tag.name == "th" || tag.name == "td" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
                let _ = self.insert_element_named("tr")?;
                self.switch_mode(InsertionMode::InRow);
                Ok(Flow::Reprocess(token))
            }

            Token::EndTag(tag) if is_one_of(tag, &["tbody", "tfoot", "thead"]) => {
                let kind = ElementType::from_name(&tag.name);
                if !self.in_scope(kind, Scope::Table) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
                let _ = self.pop_element()?;
                self.switch_mode(InsertionMode::InTable);
                Ok(Flow::Done)
            }

            // "If the stack of open elements does not have a tbody, thead, or
            // tfoot element in table scope, this is a parse error; ignore the
            // token. Otherwise: Clear the stack back to a table body context.
            // Pop the current node from the stack of open elements. Switch the
            // insertion mode to "in table". Reprocess the token."
            Token::StartTag(tag)
                if is_one_of(tag, &["caption", "col", "colgroup", "tbody", "tfoot", "thead"]) =>
            {
                self.close_table_section(token)
            }
            Token::EndTag(tag) if tag.name == "table" => self.close_table_section(token),

            Token::EndTag(tag)
                if is_one_of(
                    tag,
                    &["body", "caption", "col", "colgroup", "html", "td", "th", "tr"],
                ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            _ => self.handle_in_table_mode(token),
        }
    }

    fn close_table_section<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        if !self.in_scope_where(Scope::Table, |e| e.is_html_one_of(TABLE_SECTIONS)) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return Ok(Flow::Done);
        }
        self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
        let _ = self.pop_element()?;
        self.switch_mode(InsertionMode::InTable);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intr)
    pub(super) fn handle_in_row_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A start tag whose tag name is one of: "th", "td""
            // "Clear the stack back to a table row context. Insert an HTML
            // element for the token, then switch the insertion mode to "in
            // cell". Insert a marker at the end of the list of active
            // formatting elements."
            Token::StartTag(tag) if tag.name == "th" || tag.name == "td" => {
                self.clear_stack_back_to(TABLE_ROW_CONTEXT)?;
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::InCell);
                self.push_formatting_marker();
                Ok(Flow::Done)
            }

            Token::EndTag(tag) if tag.name == "tr" => {
                let _ = self.close_row()?;
                Ok(Flow::Done)
            }

            Token::StartTag(tag)
                if is_one_of(
                    tag,
                    &["caption", "col", "colgroup", "tbody", "tfoot", "thead", "tr"],
                ) =>
            {
                Ok(if self.close_row()? { Flow::Reprocess(token) } else { Flow::Done })
            }
            Token::EndTag(tag) if tag.name == "table" => {
                Ok(if self.close_row()? { Flow::Reprocess(token) } else { Flow::Done })
            }

            // "An end tag whose tag name is one of: "tbody", "tfoot", "thead""
            // "If the stack of open elements does not have an element in table
            // scope that is an HTML element with the same tag name as the
            // token, this is a parse error; ignore the token. If the stack of
            // open elements does not have a tr element in table scope, ignore
            // the token."
            Token::EndTag(tag) if is_one_of(tag, &["tbody", "tfoot", "thead"]) => {
                let kind = ElementType::from_name(&tag.name);
                if !self.in_scope(kind, Scope::Table) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                Ok(if self.close_row()? { Flow::Reprocess(token) } else { Flow::Done })
            }

            Token::EndTag(tag)
                if is_one_of(
                    tag,
                    &["body", "caption", "col", "colgroup", "html", "td", "th"],
                ) =>
            {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            _ => self.handle_in_table_mode(token),
        }
    }

    /// "If the stack of open elements does not have a tr element in table
    /// scope, this is a parse error; ignore the token. Otherwise: Clear the
    /// stack back to a table row context. Pop the current node (which will be
    /// a tr element) from the stack of open elements. Switch the insertion
    /// mode to "in table body"."
    fn close_row(&mut self) -> Result<bool, ParserError> {
        if !self.in_scope(ElementType::Tr, Scope::Table) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return Ok(false);
        }
        self.clear_stack_back_to(TABLE_ROW_CONTEXT)?;
        let _ = self.pop_element()?;
        self.switch_mode(InsertionMode::InTableBody);
        Ok(true)
    }

    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intd)
    pub(super) fn handle_in_cell_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "An end tag whose tag name is one of: "td", "th""
            Token::EndTag(tag) if tag.name == "td" || tag.name == "th" => {
                let kind = ElementType::from_name(&tag.name);
                if !self.in_scope(kind, Scope::Table) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_implied_end_tags(None)?;
                if !self.current_is(kind) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                }
                self.pop_until(kind)?;
                self.clear_formatting_to_last_marker()?;
                self.switch_mode(InsertionMode::InRow);
                Ok(Flow::Done)
            }

            // "Assert: The stack of open elements has a td or th element in
            // table scope. Close the cell and reprocess the token."
            Token::StartTag(tag)
                if is_one_of(
                    tag,
                    &["caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr"],
                ) =>
            {
                if !self.in_scope_where(Scope::Table, |e| e.is_html_one_of(CELLS)) {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    return Ok(Flow::Done);
                }
                self.close_cell()?;
                Ok(Flow::Reprocess(token))
            }

            Token::EndTag(tag) if is_one_of(tag, &["body", "caption", "col", "colgroup", "html"]) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            Token::EndTag(tag) if is_one_of(tag, &["table", "tbody", "tfoot", "thead", "tr"]) => {
                let kind = ElementType::from_name(&tag.name);
                if !self.in_scope(kind, Scope::Table) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_cell()?;
                Ok(Flow::Reprocess(token))
            }

            _ => self.handle_in_body_mode(token),
        }
    }

    /// [§ 13.2.6.4.15](https://html.spec.whatwg.org/multipage/parsing.html#close-the-cell)
    ///
    /// "Generate implied end tags. If the current node is not now a td element
    /// or a th element, then this is a parse error. Pop elements from the stack
    /// of open elements stack until a td element or a th element has been
    /// popped from the stack. Clear the list of active formatting elements up
    /// to the last marker. Switch the insertion mode to "in row"."
    fn close_cell(&mut self) -> Result<(), ParserError> {
        self.close_implied_end_tags(None)?;
        if !self.current().is_some_and(|e| e.is_html_one_of(CELLS)) {
            self.parse_error(ParseErrorCode::MisnestedTag);
        }
        self.pop_until_one_of(CELLS)?;
        self.clear_formatting_to_last_marker()?;
        self.switch_mode(InsertionMode::InRow);
        Ok(())
    }
}
