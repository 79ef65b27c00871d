//! [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)

use lark_dom::{Namespace, QuirksMode, Tag, TreeHandler};

use super::core::{Flow, InsertionMode, ModeResult, TreeBuilder, is_html_whitespace};
use super::element_type::ElementType;
use super::stack::Scope;
use crate::error::{ParseErrorCode, ParserError};
use crate::tokenizer::{ContentModel, SinkFeedback, Token};

/// Containers whose start tag closes an open `p` and whose end tag closes
/// the matching element in scope.
const BLOCK_CONTAINERS: &[ElementType] = &[
    ElementType::Address,
    ElementType::Article,
    ElementType::Aside,
    ElementType::Blockquote,
    ElementType::Center,
    ElementType::Details,
    ElementType::Dialog,
    ElementType::Dir,
    ElementType::Div,
    ElementType::Dl,
    ElementType::Fieldset,
    ElementType::Figcaption,
    ElementType::Figure,
    ElementType::Footer,
    ElementType::Header,
    ElementType::Hgroup,
    ElementType::Main,
    ElementType::Menu,
    ElementType::Nav,
    ElementType::Ol,
    ElementType::Search,
    ElementType::Section,
    ElementType::Summary,
    ElementType::Ul,
];

const HEADINGS: &[ElementType] = &[
    ElementType::H1,
    ElementType::H2,
    ElementType::H3,
    ElementType::H4,
    ElementType::H5,
    ElementType::H6,
];

impl<H: TreeHandler> TreeBuilder<H> {
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    pub(super) fn handle_in_body_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "Any other character token"
            // "Reconstruct the active formatting elements, if any. Insert the
            // token's character. Set the frameset-ok flag to "not ok"."
            Token::Character(text) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_text(text)?;
                if text.chars().any(|c| !is_html_whitespace(c)) {
                    self.frameset_ok = false;
                }
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

            Token::StartTag(tag) => self.in_body_start_tag(token, tag),
            Token::EndTag(tag) => self.in_body_end_tag(token, tag),

            // "An end-of-file token"
            // "Stop parsing."
            Token::Eof => Ok(Flow::Done),
        }
    }

    fn in_body_start_tag<'t>(&mut self, token: Token<'t>, tag: &Tag) -> ModeResult<'t> {
        let kind = ElementType::from_name(&tag.name);
        match kind {
            // "A start tag whose tag name is "html""
            // "Parse error. ... for each attribute on the token, check to see if
            // the attribute is already present on the top element of the stack
            // of open elements. If it is not, add the attribute and its
            // corresponding value to that element."
            ElementType::Html => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if let Some(html) = self.stack.first().map(|e| e.node.clone()) {
                    self.handler.add_attributes(&html, &tag.attributes)?;
                }
            }

            ElementType::Base
            | ElementType::Basefont
            | ElementType::Bgsound
            | ElementType::Link
            | ElementType::Meta
            | ElementType::Noframes
            | ElementType::Script
            | ElementType::Style
            | ElementType::Title => return self.handle_in_head_mode(token),

            // "A start tag whose tag name is "body""
            // "Parse error. If the second element on the stack of open elements
            // is not a body element, if the stack of open elements has only one
            // node on it ... ignore the token. Otherwise, set the frameset-ok
            // flag to "not ok"; then, for each attribute on the token, ..."
            ElementType::Body => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                if let Some(body) = self.body_element() {
                    self.frameset_ok = false;
                    self.handler.add_attributes(&body, &tag.attributes)?;
                }
            }

            // "A start tag whose tag name is "frameset""
            ElementType::Frameset => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let Some(body) = self.body_element() else {
                    return Ok(Flow::Done);
                };
                // "If the frameset-ok flag is set to "not ok", ignore the token."
                if !self.frameset_ok {
                    return Ok(Flow::Done);
                }
                // "Remove the second element on the stack of open elements from
                // its parent node, if it has one. Pop all the nodes from the
                // bottom of the stack of open elements, from the current node up
                // to, but not including, the root html element."
                if let Some(parent) = self.handler.get_parent(&body, false)? {
                    self.handler.remove_child(&parent, &body)?;
                }
                self.truncate_stack(1)?;
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::InFrameset);
            }

            _ if BLOCK_CONTAINERS.contains(&kind) || kind == ElementType::P => {
                self.close_p_if_in_button_scope()?;
                let _ = self.insert_element(tag)?;
            }

            // "If the current node is an HTML element whose tag name is one of
            // "h1", "h2", "h3", "h4", "h5", or "h6", then this is a parse
            // error; pop the current node off the stack of open elements."
            _ if kind.is_heading() => {
                self.close_p_if_in_button_scope()?;
                if self.current().is_some_and(|e| e.is_html_one_of(HEADINGS)) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                    let _ = self.pop_element()?;
                }
                let _ = self.insert_element(tag)?;
            }

            // "If the next token is a U+000A LINE FEED (LF) character token,
            // then ignore that token and move on to the next one."
            ElementType::Pre | ElementType::Listing => {
                self.close_p_if_in_button_scope()?;
                let _ = self.insert_element(tag)?;
                self.skip_newline = true;
                self.frameset_ok = false;
            }

            // "If the form element pointer is not null ... this is a parse
            // error; ignore the token."
            ElementType::Form => {
                if self.form_element.is_some() {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    return Ok(Flow::Done);
                }
                self.close_p_if_in_button_scope()?;
                let form = self.insert_element(tag)?;
                self.set_form_element(Some(form))?;
            }

            ElementType::Li => {
                self.frameset_ok = false;
                self.close_list_item(&[ElementType::Li])?;
                self.close_p_if_in_button_scope()?;
                let _ = self.insert_element(tag)?;
            }

            ElementType::Dd | ElementType::Dt => {
                self.frameset_ok = false;
                self.close_list_item(&[ElementType::Dd, ElementType::Dt])?;
                self.close_p_if_in_button_scope()?;
                let _ = self.insert_element(tag)?;
            }

            // "Switch the tokenizer to the PLAINTEXT state."
            ElementType::Plaintext => {
                self.close_p_if_in_button_scope()?;
                let _ = self.insert_element(tag)?;
                self.feedback = SinkFeedback::ContentModel(ContentModel::Plaintext);
            }

            ElementType::Button => {
                if self.in_scope(ElementType::Button, Scope::Default) {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    self.close_implied_end_tags(None)?;
                    self.pop_until(ElementType::Button)?;
                }
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_element(tag)?;
                self.frameset_ok = false;
            }

            // "If the list of active formatting elements contains an a element
            // between the end of the list and the last marker on the list (or
            // the start of the list if there is no marker on the list), then
            // this is a parse error; run the adoption agency algorithm for the
            // token, then remove that element from the list of active
            // formatting elements and the stack of open elements if the
            // adoption agency algorithm didn't already remove it"
            ElementType::A => {
                if let Some(index) = self.formatting_element_after_marker(ElementType::A) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                    let stale = self.formatting[index].element().map(|e| e.node.clone());
                    let _ = self.run_adoption_agency(tag)?;
                    if let Some(stale) = stale {
                        if let Some(index) = self.formatting_position(&stale) {
                            self.remove_formatting_entry(index)?;
                        }
                        if let Some(index) = self.stack_position(&stale) {
                            self.remove_from_stack(index)?;
                        }
                    }
                }
                self.insert_formatting_element(tag)?;
            }

            ElementType::Nobr => {
                self.reconstruct_active_formatting_elements()?;
                if self.in_scope(ElementType::Nobr, Scope::Default) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                    let _ = self.run_adoption_agency(tag)?;
                }
                self.insert_formatting_element(tag)?;
            }

            _ if kind.is_formatting() => self.insert_formatting_element(tag)?,

            // "Insert a marker at the end of the list of active formatting
            // elements."
            ElementType::Applet | ElementType::Marquee | ElementType::Object => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_element(tag)?;
                self.push_formatting_marker();
                self.frameset_ok = false;
            }

            // "If the Document is not set to quirks mode, and the stack of open
            // elements has a p element in button scope, then close a p element."
            ElementType::Table => {
                if self.quirks_mode != QuirksMode::Quirks {
                    self.close_p_if_in_button_scope()?;
                }
                let _ = self.insert_element(tag)?;
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InTable);
            }

            ElementType::Area
            | ElementType::Br
            | ElementType::Embed
            | ElementType::Img
            | ElementType::Keygen
            | ElementType::Wbr => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_void_element(tag)?;
                self.frameset_ok = false;
            }

            // "If the token does not have an attribute with the name "type", or
            // if it does, but that attribute's value is not an ASCII
            // case-insensitive match for the string "hidden", then: set the
            // frameset-ok flag to "not ok"."
            ElementType::Input => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_void_element(tag)?;
                let hidden = tag
                    .attribute("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
                if !hidden {
                    self.frameset_ok = false;
                }
            }

            ElementType::Param | ElementType::Source | ElementType::Track => {
                self.insert_void_element(tag)?;
            }

            ElementType::Hr => {
                self.close_p_if_in_button_scope()?;
                self.insert_void_element(tag)?;
                self.frameset_ok = false;
            }

            // "Parse error. Change the token's tag name to "img" and reprocess
            // it. (Don't ask.)"
            ElementType::Image => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                let img = Tag {
                    name: "img".to_string(),
                    ..tag.clone()
                };
                self.reconstruct_active_formatting_elements()?;
                self.insert_void_element(&img)?;
                self.frameset_ok = false;
            }

            ElementType::Textarea => {
                self.parse_generic_rcdata(tag, ContentModel::Rcdata)?;
                self.skip_newline = true;
                self.frameset_ok = false;
            }

            ElementType::Xmp => {
                self.close_p_if_in_button_scope()?;
                self.reconstruct_active_formatting_elements()?;
                self.frameset_ok = false;
                self.parse_generic_rcdata(tag, ContentModel::Cdata)?;
            }

            ElementType::Iframe => {
                self.frameset_ok = false;
                self.parse_generic_rcdata(tag, ContentModel::Cdata)?;
            }

            ElementType::Noembed => self.parse_generic_rcdata(tag, ContentModel::Cdata)?,
            ElementType::Noscript if self.options.scripting_enabled => {
                self.parse_generic_rcdata(tag, ContentModel::Cdata)?;
            }

            // "If the insertion mode is one of "in table", "in caption", "in
            // table body", "in row", or "in cell", then switch the insertion
            // mode to "in select in table". Otherwise, switch the insertion
            // mode to "in select"."
            ElementType::Select => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_element(tag)?;
                self.frameset_ok = false;
                let next = match self.mode {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                };
                self.switch_mode(next);
            }

            ElementType::Optgroup | ElementType::Option => {
                if self.current_is(ElementType::Option) {
                    let _ = self.pop_element()?;
                }
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_element(tag)?;
            }

            ElementType::Rb | ElementType::Rtc => {
                if self.in_scope(ElementType::Ruby, Scope::Default) {
                    self.close_implied_end_tags(None)?;
                    if !self.current_is(ElementType::Ruby) {
                        self.parse_error(ParseErrorCode::MisnestedTag);
                    }
                }
                let _ = self.insert_element(tag)?;
            }

            ElementType::Rp | ElementType::Rt => {
                if self.in_scope(ElementType::Ruby, Scope::Default) {
                    self.close_implied_end_tags(Some(ElementType::Rtc))?;
                    if !self.current_is(ElementType::Ruby) && !self.current_is(ElementType::Rtc) {
                        self.parse_error(ParseErrorCode::MisnestedTag);
                    }
                }
                let _ = self.insert_element(tag)?;
            }

            // "Adjust MathML attributes for the token. Adjust foreign
            // attributes for the token. Insert a foreign element for the token,
            // with MathML namespace and false."
            ElementType::Math => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_foreign_element(tag, Namespace::MathMl)?;
            }

            ElementType::Svg => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_foreign_element(tag, Namespace::Svg)?;
            }

            // "A start tag whose tag name is one of: "caption", "col",
            // "colgroup", "frame", "head", "tbody", "td", "tfoot", "th", "thead",
            // "tr""
            // "Parse error. Ignore the token."
            ElementType::Caption
            | ElementType::Col
            | ElementType::Colgroup
            | ElementType::Frame
            | ElementType::Head
            | ElementType::Tbody
            | ElementType::Td
            | ElementType::Tfoot
            | ElementType::Th
            | ElementType::Thead
            | ElementType::Tr => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
            }

            // "Any other start tag"
            // "Reconstruct the active formatting elements, if any. Insert an
            // HTML element for the token."
            _ => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_element(tag)?;
            }
        }
        Ok(Flow::Done)
    }

    /// The `body` element, if it is the second entry on the stack.
    fn body_element(&self) -> Option<H::Handle> {
        self.stack
            .get(1)
            .filter(|e| e.is_html(ElementType::Body))
            .map(|e| e.node.clone())
    }

    /// Reconstruct, insert and push onto the list of active formatting
    /// elements.
    fn insert_formatting_element(&mut self, tag: &Tag) -> Result<(), ParserError> {
        self.reconstruct_active_formatting_elements()?;
        let node = self.insert_element(tag)?;
        self.push_formatting_element(tag, node)
    }

    /// The `li`, `dd` and `dt` start tag loop: close an open item of one of
    /// `kinds`, stopping at special elements other than `address`, `div`
    /// and `p`.
    fn close_list_item(&mut self, kinds: &[ElementType]) -> Result<(), ParserError> {
        let mut found = None;
        for entry in self.stack.iter().rev() {
            if entry.is_html_one_of(kinds) {
                found = Some(entry.kind);
                break;
            }
            if entry.is_special()
                && !entry.is_html_one_of(&[ElementType::Address, ElementType::Div, ElementType::P])
            {
                break;
            }
        }
        let Some(kind) = found else {
            return Ok(());
        };
        // "Generate implied end tags, except for li elements. If the current
        // node is not an li element, then this is a parse error. Pop elements
        // from the stack of open elements until an li element has been popped
        // from the stack."
        self.close_implied_end_tags(Some(kind))?;
        if !self.current_is(kind) {
            self.parse_error(ParseErrorCode::MisnestedTag);
        }
        self.pop_until(kind)
    }

    fn in_body_end_tag<'t>(&mut self, token: Token<'t>, tag: &Tag) -> ModeResult<'t> {
        let kind = ElementType::from_name(&tag.name);
        match kind {
            // "An end tag whose tag name is "body""
            // "If the stack of open elements does not have a body element in
            // scope, this is a parse error; ignore the token."
            ElementType::Body => {
                if !self.in_scope(ElementType::Body, Scope::Default) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.switch_mode(InsertionMode::AfterBody);
            }

            // "An end tag whose tag name is "html""
            // "... Switch the insertion mode to "after body". Reprocess the
            // token."
            ElementType::Html => {
                if !self.in_scope(ElementType::Body, Scope::Default) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.switch_mode(InsertionMode::AfterBody);
                return Ok(Flow::Reprocess(token));
            }

            _ if BLOCK_CONTAINERS.contains(&kind)
                || matches!(
                    kind,
                    ElementType::Button | ElementType::Listing | ElementType::Pre
                ) =>
            {
                if !self.in_scope(kind, Scope::Default) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_implied_end_tags(None)?;
                if !self.current_is(kind) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                }
                self.pop_until(kind)?;
            }

            // "An end tag whose tag name is "form""
            ElementType::Form => {
                // "Let node be the element that the form element pointer is set
                // to, or null if it is not set to an element. Set the form
                // element pointer to null."
                let node = self.form_element.clone();
                self.set_form_element(None)?;
                let Some(index) = node.and_then(|n| self.stack_position(&n)) else {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                };
                if !self.index_in_scope(index) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_implied_end_tags(None)?;
                if index + 1 != self.stack.len() {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                }
                // "Remove node from the stack of open elements."
                self.remove_from_stack(index)?;
            }

            // "If the stack of open elements does not have a p element in
            // button scope, then this is a parse error; insert an HTML element
            // for a "p" start tag token with no attributes."
            ElementType::P => {
                if !self.in_scope(ElementType::P, Scope::Button) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    let _ = self.insert_element_named("p")?;
                }
                self.close_p_element()?;
            }

            ElementType::Li => self.close_item_end_tag(kind, Scope::ListItem)?,
            ElementType::Dd | ElementType::Dt => self.close_item_end_tag(kind, Scope::Default)?,

            _ if kind.is_heading() => {
                if !self.in_scope_where(Scope::Default, |e| e.is_html_one_of(HEADINGS)) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_implied_end_tags(None)?;
                if !self.current_is(kind) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                }
                self.pop_until_one_of(HEADINGS)?;
            }

            _ if kind.is_formatting() => {
                if !self.run_adoption_agency(tag)? {
                    self.any_other_end_tag(tag)?;
                }
            }

            ElementType::Applet | ElementType::Marquee | ElementType::Object => {
                if !self.in_scope(kind, Scope::Default) {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    return Ok(Flow::Done);
                }
                self.close_implied_end_tags(None)?;
                if !self.current_is(kind) {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                }
                self.pop_until(kind)?;
                self.clear_formatting_to_last_marker()?;
            }

            // "An end tag whose tag name is "br""
            // "Parse error. Drop the attributes from the token, and act as
            // described in the next entry; i.e. act as if this was a "br" start
            // tag token with no attributes, rather than the end tag token that
            // it actually is."
            ElementType::Br => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_element_named("br")?;
                let _ = self.pop_element()?;
                self.frameset_ok = false;
            }

            _ => self.any_other_end_tag(tag)?,
        }
        Ok(Flow::Done)
    }

    /// End tag for `li`, `dd` or `dt`.
    fn close_item_end_tag(&mut self, kind: ElementType, scope: Scope) -> Result<(), ParserError> {
        if !self.in_scope(kind, scope) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
            return Ok(());
        }
        self.close_implied_end_tags(Some(kind))?;
        if !self.current_is(kind) {
            self.parse_error(ParseErrorCode::MisnestedTag);
        }
        self.pop_until(kind)
    }

    /// "Any other end tag"
    ///
    /// "1. Initialize node to be the current node (the bottommost node of the
    /// stack). 2. Loop: If node is an HTML element with the same tag name as
    /// the token, then: Generate implied end tags, except for HTML elements
    /// with the same tag name as the token. If node is not the current node,
    /// then this is a parse error. Pop all the nodes from the current node up
    /// to node, including node, then stop these steps. 3. Otherwise, if node
    /// is in the special category, then this is a parse error; ignore the
    /// token, and return."
    pub(super) fn any_other_end_tag(&mut self, tag: &Tag) -> Result<(), ParserError> {
        let kind = ElementType::from_name(&tag.name);
        for index in (0..self.stack.len()).rev() {
            let entry = &self.stack[index];
            if entry.namespace == Namespace::Html && entry.name == tag.name {
                self.close_implied_end_tags(Some(kind))?;
                if self.stack.len() != index + 1 {
                    self.parse_error(ParseErrorCode::MisnestedTag);
                }
                return self.truncate_stack(index);
            }
            if entry.is_special() {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                return Ok(());
            }
        }
        Ok(())
    }
}
