//! The insertion modes up to the body: "initial", "before html", "before
//! head", "in head", "in head noscript" and "after head", plus the "text"
//! mode used for RCDATA and CDATA elements.

use lark_dom::{Namespace, QuirksMode, TreeHandler};

use super::core::{Flow, InsertionMode, ModeResult, TreeBuilder, split_leading_whitespace};
use super::element_type::ElementType;
use super::quirks::quirks_mode_for;
use super::stack::StackEntry;
use crate::error::{ParseErrorCode, ParserError};
use crate::tokenizer::{ContentModel, Token};

/// Continue with the rest of a character run once its leading whitespace
/// has been dealt with.
pub(super) fn rest_of<'t>(rest: &'t str) -> Flow<'t> {
    if rest.is_empty() {
        Flow::Done
    } else {
        Flow::Reprocess(Token::Character(rest))
    }
}

impl<H: TreeHandler> TreeBuilder<H> {
    fn set_quirks_mode(&mut self, mode: QuirksMode) -> Result<(), ParserError> {
        log::debug!(target: "lark_html::parser", "document mode {mode}");
        self.quirks_mode = mode;
        self.handler.set_quirks_mode(mode)?;
        Ok(())
    }

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    pub(super) fn handle_initial_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A character token that is one of U+0009 CHARACTER TABULATION,
            // U+000A LINE FEED (LF), U+000C FORM FEED (FF), U+000D CARRIAGE
            // RETURN (CR), or U+0020 SPACE"
            // "Ignore the token."
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.initial_anything_else(token);
                }
                Ok(rest_of(rest))
            }

            // "A comment token"
            // "Insert a comment as the last child of the Document object."
            Token::Comment(data) => {
                self.insert_comment_in_document(data)?;
                Ok(Flow::Done)
            }

            // "A DOCTYPE token"
            // "If the DOCTYPE token's name is not "html", or the token's public
            // identifier is not missing, or the token's system identifier is
            // neither missing nor "about:legacy-compat", then there is a parse
            // error."
            Token::Doctype(doctype) => {
                let conforming = doctype.name.as_deref() == Some("html")
                    && doctype.public_id.is_none()
                    && doctype
                        .system_id
                        .as_deref()
                        .is_none_or(|id| id == "about:legacy-compat");
                if !conforming {
                    self.parse_error(ParseErrorCode::NonConformingDoctype);
                }

                // "Append a DocumentType node to the Document node"
                let node = self.handler.create_doctype(doctype)?;
                let _ = self.handler.append_child(&self.document, &node)?;
                self.handler.unref_node(&node)?;

                self.set_quirks_mode(quirks_mode_for(doctype))?;
                self.switch_mode(InsertionMode::BeforeHtml);
                Ok(Flow::Done)
            }

            _ => self.initial_anything_else(token),
        }
    }

    /// "Anything else": "this is a parse error; ... set the Document to
    /// quirks mode. In any case, switch the insertion mode to "before html",
    /// then reprocess the token."
    fn initial_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        self.parse_error(ParseErrorCode::MissingDoctype);
        self.set_quirks_mode(QuirksMode::Quirks)?;
        self.switch_mode(InsertionMode::BeforeHtml);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    pub(super) fn handle_before_html_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A DOCTYPE token"
            // "Parse error. Ignore the token."
            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }

            Token::Comment(data) => {
                self.insert_comment_in_document(data)?;
                Ok(Flow::Done)
            }

            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.before_html_anything_else(token);
                }
                Ok(rest_of(rest))
            }

            // "A start tag whose tag name is "html""
            // "Create an element for the token in the HTML namespace, with the
            // Document as the intended parent. Append it to the Document
            // object. Put this element in the stack of open elements."
            Token::StartTag(tag) if tag.name == "html" => {
                let _ = self.insert_element(tag)?;
                self.switch_mode(InsertionMode::BeforeHead);
                Ok(Flow::Done)
            }

            // "An end tag whose tag name is one of: "head", "body", "html", "br""
            // "Act as described in the "anything else" entry below."
            Token::EndTag(tag) if matches!(tag.name.as_str(), "head" | "body" | "html" | "br") => {
                self.before_html_anything_else(token)
            }

            // "Any other end tag"
            // "Parse error. Ignore the token."
            Token::EndTag(_) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            _ => self.before_html_anything_else(token),
        }
    }

    /// "Create an html element whose node document is the Document object.
    /// Append it to the Document object. Put this element in the stack of open
    /// elements. Switch the insertion mode to "before head", then reprocess
    /// the token."
    fn before_html_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        let _ = self.insert_element_named("html")?;
        self.switch_mode(InsertionMode::BeforeHead);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    pub(super) fn handle_before_head_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.before_head_anything_else(token);
                }
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

            // "A start tag whose tag name is "html""
            // "Process the token using the rules for the "in body" insertion mode."
            Token::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),

            // "A start tag whose tag name is "head""
            // "Insert an HTML element for the token. Set the head element
            // pointer to the newly created head element."
            Token::StartTag(tag) if tag.name == "head" => {
                let head = self.insert_element(tag)?;
                self.set_head_element(head)?;
                self.switch_mode(InsertionMode::InHead);
                Ok(Flow::Done)
            }

            Token::EndTag(tag) if matches!(tag.name.as_str(), "head" | "body" | "html" | "br") => {
                self.before_head_anything_else(token)
            }

            Token::EndTag(_) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            _ => self.before_head_anything_else(token),
        }
    }

    /// "Insert an HTML element for a "head" start tag token with no
    /// attributes. Set the head element pointer to the newly created head
    /// element. Switch the insertion mode to "in head". Reprocess the current
    /// token."
    fn before_head_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        let head = self.insert_element_named("head")?;
        self.set_head_element(head)?;
        self.switch_mode(InsertionMode::InHead);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    pub(super) fn handle_in_head_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // Whitespace: "Insert the character."
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.in_head_anything_else(token);
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

            Token::StartTag(tag) => match ElementType::from_name(&tag.name) {
                ElementType::Html => self.handle_in_body_mode(token),

                // "A start tag whose tag name is one of: "base", "basefont",
                // "bgsound", "link""
                // "Insert an HTML element for the token. Immediately pop the
                // current node off the stack of open elements. Acknowledge the
                // token's self-closing flag, if it is set."
                ElementType::Base
                | ElementType::Basefont
                | ElementType::Bgsound
                | ElementType::Link => {
                    self.insert_void_element(tag)?;
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is "meta""
                // "If the active speculative HTML parser is null, then: If the
                // element has a charset attribute ... change the encoding"
                ElementType::Meta => {
                    self.insert_void_element(tag)?;
                    self.declare_encoding(tag)?;
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is "title""
                // "Follow the generic RCDATA element parsing algorithm."
                ElementType::Title => {
                    self.parse_generic_rcdata(tag, ContentModel::Rcdata)?;
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is "noscript", if the scripting
                // flag is enabled" / "A start tag whose tag name is one of:
                // "noframes", "style""
                // "Follow the generic raw text element parsing algorithm."
                // A "script" start tag switches the tokenizer to the script
                // data state, which is the same CDATA content model here.
                ElementType::Noscript if self.options.scripting_enabled => {
                    self.parse_generic_rcdata(tag, ContentModel::Cdata)?;
                    Ok(Flow::Done)
                }
                ElementType::Noframes | ElementType::Style | ElementType::Script => {
                    self.parse_generic_rcdata(tag, ContentModel::Cdata)?;
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is "noscript", if the scripting
                // flag is disabled"
                ElementType::Noscript => {
                    let _ = self.insert_element(tag)?;
                    self.switch_mode(InsertionMode::InHeadNoscript);
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is "head""
                // "Parse error. Ignore the token."
                ElementType::Head => {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    Ok(Flow::Done)
                }

                _ => self.in_head_anything_else(token),
            },

            Token::EndTag(tag) => match tag.name.as_str() {
                // "An end tag whose tag name is "head""
                // "Pop the current node (which will be the head element) off
                // the stack of open elements. Switch the insertion mode to
                // "after head"."
                "head" => {
                    let _ = self.pop_element()?;
                    self.switch_mode(InsertionMode::AfterHead);
                    Ok(Flow::Done)
                }
                "body" | "html" | "br" => self.in_head_anything_else(token),
                _ => {
                    self.parse_error(ParseErrorCode::UnexpectedEndTag);
                    Ok(Flow::Done)
                }
            },

            Token::Eof => self.in_head_anything_else(token),
        }
    }

    /// "Pop the current node (which will be the head element) off the stack
    /// of open elements. Switch the insertion mode to "after head". Reprocess
    /// the token."
    fn in_head_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        let _ = self.pop_element()?;
        self.switch_mode(InsertionMode::AfterHead);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    pub(super) fn handle_in_head_noscript_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }

            Token::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),

            // "An end tag whose tag name is "noscript""
            // "Pop the current node (which will be a noscript element) from the
            // stack of open elements; the new current node will be a head
            // element. Switch the insertion mode to "in head"."
            Token::EndTag(tag) if tag.name == "noscript" => {
                let _ = self.pop_element()?;
                self.switch_mode(InsertionMode::InHead);
                Ok(Flow::Done)
            }

            // Whitespace and comments: "Process the token using the rules for
            // the "in head" insertion mode."
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.in_head_noscript_anything_else(token);
                }
                let _ = self.handle_in_head_mode(Token::Character(space))?;
                Ok(rest_of(rest))
            }
            Token::Comment(_) => self.handle_in_head_mode(token),

            Token::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style"
                ) =>
            {
                self.handle_in_head_mode(token)
            }

            Token::StartTag(tag) if tag.name == "head" || tag.name == "noscript" => {
                self.parse_error(ParseErrorCode::UnexpectedStartTag);
                Ok(Flow::Done)
            }

            Token::EndTag(tag) if tag.name == "br" => self.in_head_noscript_anything_else(token),

            Token::EndTag(_) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            _ => self.in_head_noscript_anything_else(token),
        }
    }

    /// "Parse error. Pop the current node (which will be a noscript element)
    /// from the stack of open elements; the new current node will be a head
    /// element. Switch the insertion mode to "in head". Reprocess the token."
    fn in_head_noscript_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        self.parse_error(ParseErrorCode::UnexpectedCharacter);
        let _ = self.pop_element()?;
        self.switch_mode(InsertionMode::InHead);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    pub(super) fn handle_after_head_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            Token::Character(text) => {
                let (space, rest) = split_leading_whitespace(text);
                if space.is_empty() {
                    return self.after_head_anything_else(token);
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

            Token::StartTag(tag) => match ElementType::from_name(&tag.name) {
                ElementType::Html => self.handle_in_body_mode(token),

                // "A start tag whose tag name is "body""
                // "Insert an HTML element for the token. Set the frameset-ok
                // flag to "not ok". Switch the insertion mode to "in body"."
                ElementType::Body => {
                    let _ = self.insert_element(tag)?;
                    self.frameset_ok = false;
                    self.switch_mode(InsertionMode::InBody);
                    Ok(Flow::Done)
                }

                ElementType::Frameset => {
                    let _ = self.insert_element(tag)?;
                    self.switch_mode(InsertionMode::InFrameset);
                    Ok(Flow::Done)
                }

                // "A start tag whose tag name is one of: "base", "basefont",
                // "bgsound", "link", "meta", "noframes", "script", "style",
                // "template", "title""
                // "Parse error. Push the node pointed to by the head element
                // pointer onto the stack of open elements. Process the token
                // using the rules for the "in head" insertion mode. Remove the
                // node pointed to by the head element pointer from the stack of
                // open elements."
                ElementType::Base
                | ElementType::Basefont
                | ElementType::Bgsound
                | ElementType::Link
                | ElementType::Meta
                | ElementType::Noframes
                | ElementType::Script
                | ElementType::Style
                | ElementType::Title => {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    self.process_in_reopened_head(token)
                }

                ElementType::Head => {
                    self.parse_error(ParseErrorCode::UnexpectedStartTag);
                    Ok(Flow::Done)
                }

                _ => self.after_head_anything_else(token),
            },

            Token::EndTag(tag) if matches!(tag.name.as_str(), "body" | "html" | "br") => {
                self.after_head_anything_else(token)
            }

            Token::EndTag(_) => {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
                Ok(Flow::Done)
            }

            Token::Eof => self.after_head_anything_else(token),
        }
    }

    fn process_in_reopened_head<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        let Some(head) = self.head_element.clone() else {
            return self.handle_in_head_mode(token);
        };
        self.handler.ref_node(&head)?;
        self.push_element(StackEntry {
            namespace: Namespace::Html,
            kind: ElementType::Head,
            name: "head".to_string(),
            node: head.clone(),
            integration_point: false,
        });
        let flow = self.handle_in_head_mode(token)?;
        if let Some(index) = self.stack_position(&head) {
            self.remove_from_stack(index)?;
        }
        Ok(flow)
    }

    /// "Insert an HTML element for a "body" start tag token with no
    /// attributes. Switch the insertion mode to "in body". Reprocess the
    /// current token."
    fn after_head_anything_else<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        let _ = self.insert_element_named("body")?;
        self.switch_mode(InsertionMode::InBody);
        Ok(Flow::Reprocess(token))
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    pub(super) fn handle_generic_rcdata_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match token {
            // "A character token"
            // "Insert the token's character."
            Token::Character(text) => {
                self.insert_text(text)?;
                Ok(Flow::Done)
            }

            // "An end-of-file token"
            // "Parse error. ... Pop the current node off the stack of open
            // elements. Switch the insertion mode to the original insertion
            // mode and reprocess the token."
            Token::Eof => {
                self.parse_error(ParseErrorCode::UnexpectedEof);
                let _ = self.pop_element()?;
                self.switch_mode(self.original_mode);
                Ok(Flow::Reprocess(token))
            }

            // "An end tag whose tag name is "script"": the handler runs the
            // script once the element is complete.
            Token::EndTag(tag) => {
                if tag.name == "script"
                    && let Some(script) = self.current().map(|e| e.node.clone())
                {
                    self.complete_script(&script)?;
                }
                // "Pop the current node off the stack of open elements. Switch
                // the insertion mode to the original insertion mode."
                let _ = self.pop_element()?;
                self.switch_mode(self.original_mode);
                Ok(Flow::Done)
            }

            Token::StartTag(_) | Token::Comment(_) | Token::Doctype(_) => Ok(Flow::Done),
        }
    }
}
