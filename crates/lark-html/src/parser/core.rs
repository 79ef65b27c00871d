use lark_dom::{Namespace, QuirksMode, ScriptResult, Tag, TreeHandler};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::element_type::ElementType;
use super::stack::{FormattingEntry, StackEntry};
use crate::buffer::TextBuffer;
use crate::error::{ErrorHandler, Location, ParseError, ParseErrorCode, ParserError, report};
use crate::tokenizer::{ContentModel, SinkFeedback, Token, TokenSink};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    InHeadNoscript,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    InTable,
    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    InTableText,
    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    InCaption,
    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolumngroup)
    InColumnGroup,
    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intablebody)
    InTableBody,
    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inrow)
    InRow,
    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incell)
    InCell,
    /// [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    InSelect,
    /// [§ 13.2.6.4.17 The "in select in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselectintable)
    InSelectInTable,
    /// [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)
    ///
    /// Active while SVG or `MathML` elements are open. Tokens that follow HTML
    /// rules go to the secondary mode.
    InForeignContent,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    InFrameset,
    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    AfterFrameset,
    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    AfterAfterBody,
    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    AfterAfterFrameset,
    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    ///
    /// Content of an RCDATA or CDATA element up to its end tag.
    GenericRcdata,
}

/// Tree construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeBuilderOptions {
    /// [§ 13.2.4.5 Other parsing state flags](https://html.spec.whatwg.org/multipage/parsing.html#scripting-flag)
    ///
    /// "The scripting flag is set to "enabled" if scripting was enabled for
    /// the Document with which the parser is associated when the parser was
    /// created, and "disabled" otherwise."
    pub scripting_enabled: bool,
}

/// What a mode handler did with a token.
#[derive(Debug, Clone, Copy)]
pub(super) enum Flow<'t> {
    /// The token is fully processed.
    Done,
    /// "Reprocess the token" in the (possibly new) insertion mode. Character
    /// tokens may come back shortened.
    Reprocess(Token<'t>),
}

pub(super) type ModeResult<'t> = Result<Flow<'t>, ParserError>;

/// Where a node goes: appended to `parent`, or inserted before `before`.
#[derive(Debug)]
pub(super) struct InsertionPlace<N> {
    pub(super) parent: N,
    pub(super) before: Option<N>,
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// Consumes tokens as a [`TokenSink`] and drives a [`TreeHandler`]. The
/// builder keeps one reference on every node it remembers (open elements,
/// active formatting elements, the head and form pointers and the document)
/// and gives them all back in [`TreeBuilder::finish`].
#[allow(clippy::struct_excessive_bools)]
pub struct TreeBuilder<H: TreeHandler> {
    pub(super) handler: H,
    pub(super) document: H::Handle,
    pub(super) options: TreeBuilderOptions,

    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    pub(super) mode: InsertionMode,
    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#original-insertion-mode)
    /// "original insertion mode", for the text and table text modes.
    pub(super) original_mode: InsertionMode,
    /// Mode for HTML-rule tokens while in foreign content.
    pub(super) secondary_mode: InsertionMode,

    /// [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    pub(super) stack: Vec<StackEntry<H::Handle>>,
    /// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
    pub(super) formatting: Vec<FormattingEntry<H::Handle>>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    pub(super) head_element: Option<H::Handle>,
    /// "The form element pointer points to the last form element that was
    /// opened and whose end tag has not yet been seen."
    pub(super) form_element: Option<H::Handle>,

    /// [§ 13.2.6.4.10](https://html.spec.whatwg.org/multipage/parsing.html#concept-pending-table-char-tokens)
    /// "pending table character tokens"
    pub(super) pending_table_text: TextBuffer,
    /// [§ 13.2.4.5](https://html.spec.whatwg.org/multipage/parsing.html#frameset-ok-flag)
    pub(super) frameset_ok: bool,
    /// [§ 13.2.6.1](https://html.spec.whatwg.org/multipage/parsing.html#foster-parent)
    pub(super) foster_parenting: bool,
    /// Drop a newline at the start of the next character token (`pre`,
    /// `listing`, `textarea`).
    pub(super) skip_newline: bool,
    /// A charset declaration has already been passed to the handler.
    pub(super) encoding_declared: bool,
    pub(super) quirks_mode: QuirksMode,

    /// Location of the token being processed.
    pub(super) location: Location,
    /// Feedback for the tokenizer once the current token is done.
    pub(super) feedback: SinkFeedback,
    error_handler: Option<ErrorHandler>,
    finished: bool,
}

impl<H: TreeHandler> TreeBuilder<H> {
    /// Create a tree builder that inserts under `document`.
    ///
    /// # Errors
    ///
    /// Fails if the handler rejects the reference taken on `document`.
    pub fn new(
        mut handler: H,
        document: H::Handle,
        options: TreeBuilderOptions,
    ) -> Result<Self, ParserError> {
        handler.ref_node(&document)?;
        Ok(Self {
            handler,
            document,
            options,
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            secondary_mode: InsertionMode::InBody,
            stack: Vec::new(),
            formatting: Vec::new(),
            head_element: None,
            form_element: None,
            pending_table_text: TextBuffer::new(),
            frameset_ok: true,
            foster_parenting: false,
            skip_newline: false,
            encoding_declared: false,
            quirks_mode: QuirksMode::NoQuirks,
            location: Location::default(),
            feedback: SinkFeedback::Continue,
            error_handler: None,
            finished: false,
        })
    }

    /// Current insertion mode.
    #[must_use]
    pub const fn mode(&self) -> InsertionMode {
        self.mode
    }

    /// Document mode chosen from the DOCTYPE.
    #[must_use]
    pub const fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    /// Number of elements on the stack of open elements.
    #[must_use]
    pub fn open_elements(&self) -> usize {
        self.stack.len()
    }

    /// Borrow the tree handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Borrow the tree handler mutably.
    pub const fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Route parse errors to `handler` instead of the `log` facade.
    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.error_handler = handler;
    }

    /// Release every reference the builder holds. Called once parsing is
    /// over or abandoned; further tokens are ignored.
    ///
    /// # Errors
    ///
    /// Propagates handler failures. Releasing stops at the first one.
    pub fn finish(&mut self) -> Result<(), ParserError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.truncate_stack(0)?;
        for entry in std::mem::take(&mut self.formatting) {
            if let FormattingEntry::Element(element) = entry {
                self.handler.unref_node(&element.node)?;
            }
        }
        if let Some(head) = self.head_element.take() {
            self.handler.unref_node(&head)?;
        }
        if let Some(form) = self.form_element.take() {
            self.handler.unref_node(&form)?;
        }
        self.handler.unref_node(&self.document)?;
        Ok(())
    }

    /// Release all references and hand back the tree handler.
    ///
    /// # Errors
    ///
    /// See [`TreeBuilder::finish`].
    pub fn into_handler(mut self) -> Result<H, ParserError> {
        self.finish()?;
        Ok(self.handler)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn dispatch<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        match self.mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::InHeadNoscript => self.handle_in_head_noscript_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::InTable => self.handle_in_table_mode(token),
            InsertionMode::InTableText => self.handle_in_table_text_mode(token),
            InsertionMode::InCaption => self.handle_in_caption_mode(token),
            InsertionMode::InColumnGroup => self.handle_in_column_group_mode(token),
            InsertionMode::InTableBody => self.handle_in_table_body_mode(token),
            InsertionMode::InRow => self.handle_in_row_mode(token),
            InsertionMode::InCell => self.handle_in_cell_mode(token),
            InsertionMode::InSelect => self.handle_in_select_mode(token),
            InsertionMode::InSelectInTable => self.handle_in_select_in_table_mode(token),
            InsertionMode::InForeignContent => self.handle_in_foreign_content_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
            InsertionMode::InFrameset => self.handle_in_frameset_mode(token),
            InsertionMode::AfterFrameset => self.handle_after_frameset_mode(token),
            InsertionMode::AfterAfterBody => self.handle_after_after_body_mode(token),
            InsertionMode::AfterAfterFrameset => self.handle_after_after_frameset_mode(token),
            InsertionMode::GenericRcdata => self.handle_generic_rcdata_mode(token),
        }
    }

    /// Process `token` under the secondary mode, as HTML content.
    pub(super) fn process_with_secondary<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        self.mode = self.secondary_mode;
        self.dispatch(token)
    }

    /// Enter or leave foreign content as SVG and `MathML` elements come and
    /// go from the stack.
    fn sync_foreign_mode(&mut self) {
        let foreign_open = self.stack.iter().any(|e| e.namespace != Namespace::Html);
        if foreign_open && self.mode != InsertionMode::InForeignContent {
            self.secondary_mode = self.mode;
            self.switch_mode(InsertionMode::InForeignContent);
        } else if !foreign_open && self.mode == InsertionMode::InForeignContent {
            self.switch_mode(self.secondary_mode);
        }
    }

    /// "Switch the insertion mode to X"
    pub(super) fn switch_mode(&mut self, mode: InsertionMode) {
        log::trace!(target: "lark_html::parser", "{} -> {mode}", self.mode);
        self.mode = mode;
    }

    /// Report a tree construction parse error at the current token.
    pub(super) fn parse_error(&mut self, code: ParseErrorCode) {
        report(
            &mut self.error_handler,
            &ParseError {
                code,
                location: self.location,
            },
        );
    }

    /// Ask the tokenizer to stop after the current token.
    pub(super) fn request_pause(&mut self) {
        self.feedback = SinkFeedback::Pause;
    }

    // =========================================================================
    // Creating and inserting nodes
    // =========================================================================

    /// [§ 13.2.6.1 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
    ///
    /// "The appropriate place for inserting a node", with foster parenting
    /// applied when it is enabled and the target is a table context.
    pub(super) fn appropriate_place(&mut self) -> Result<InsertionPlace<H::Handle>, ParserError> {
        let Some(target) = self.current() else {
            return Ok(InsertionPlace {
                parent: self.document.clone(),
                before: None,
            });
        };
        let needs_foster = self.foster_parenting
            && target.namespace == Namespace::Html
            && target.kind.is_table_context();
        if !needs_foster {
            return Ok(InsertionPlace {
                parent: target.node.clone(),
                before: None,
            });
        }
        self.foster_parent_place()
    }

    /// [§ 13.2.6.1](https://html.spec.whatwg.org/multipage/parsing.html#foster-parent)
    pub(super) fn foster_parent_place(&mut self) -> Result<InsertionPlace<H::Handle>, ParserError> {
        // "Let last table be the last table element in the stack of open
        // elements, if any."
        let Some(table_index) = self.stack_position_of(ElementType::Table) else {
            // "If there is no last table, then let adjusted insertion location
            // be inside the first element in the stack of open elements (the
            // html element), after its last child (if any)"
            let parent = self
                .stack
                .first()
                .map_or_else(|| self.document.clone(), |e| e.node.clone());
            return Ok(InsertionPlace {
                parent,
                before: None,
            });
        };
        let table = self.stack[table_index].node.clone();
        // "If last table has a parent node, then let adjusted insertion
        // location be inside last table's parent node, immediately before last
        // table"
        if let Some(parent) = self.handler.get_parent(&table, false)? {
            return Ok(InsertionPlace {
                parent,
                before: Some(table),
            });
        }
        // "Let previous element be the element immediately above last table in
        // the stack of open elements."
        let previous = table_index
            .checked_sub(1)
            .map_or_else(|| self.document.clone(), |i| self.stack[i].node.clone());
        Ok(InsertionPlace {
            parent: previous,
            before: None,
        })
    }

    /// Insert `node` at `place`. Returns the node now in the tree.
    pub(super) fn insert_at(
        &mut self,
        place: &InsertionPlace<H::Handle>,
        node: &H::Handle,
    ) -> Result<H::Handle, ParserError> {
        let inserted = match &place.before {
            Some(before) => self.handler.insert_before(&place.parent, node, before)?,
            None => self.handler.append_child(&place.parent, node)?,
        };
        Ok(inserted)
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    ///
    /// Inserts a whole run of characters as one text node; the handler
    /// merges it with an adjacent text node.
    pub(super) fn insert_text(&mut self, text: &str) -> Result<(), ParserError> {
        if text.is_empty() {
            return Ok(());
        }
        let place = self.appropriate_place()?;
        // "If the adjusted insertion location's parent is a Document node,
        // then return."
        if place.parent == self.document {
            return Ok(());
        }
        let node = self.handler.create_text(text)?;
        let _ = self.insert_at(&place, &node)?;
        self.handler.unref_node(&node)?;
        Ok(())
    }

    /// [§ 13.2.6.1 Insert a comment](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-comment)
    ///
    /// With `parent`, the comment is appended there; otherwise it goes to
    /// the appropriate place.
    pub(super) fn insert_comment(
        &mut self,
        data: &str,
        parent: Option<H::Handle>,
    ) -> Result<(), ParserError> {
        let node = self.handler.create_comment(data)?;
        let place = match parent {
            Some(parent) => InsertionPlace {
                parent,
                before: None,
            },
            None => self.appropriate_place()?,
        };
        let _ = self.insert_at(&place, &node)?;
        self.handler.unref_node(&node)?;
        Ok(())
    }

    /// Append a comment to the document node.
    pub(super) fn insert_comment_in_document(&mut self, data: &str) -> Result<(), ParserError> {
        self.insert_comment(data, Some(self.document.clone()))
    }

    /// Append a comment to the `html` element.
    pub(super) fn insert_comment_in_html(&mut self, data: &str) -> Result<(), ParserError> {
        let parent = self.stack.first().map(|e| e.node.clone());
        self.insert_comment(data, parent)
    }

    /// [§ 13.2.6.1 Insert an HTML element](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    ///
    /// Creates the element, associates it with the form element pointer
    /// when it is form-associated, inserts it at the appropriate place and
    /// pushes it. Returns the (unowned) node.
    pub(super) fn insert_element(&mut self, tag: &Tag) -> Result<H::Handle, ParserError> {
        let kind = ElementType::from_name(&tag.name);
        let node = self.handler.create_element(tag)?;
        if tag.namespace == Namespace::Html
            && kind.is_form_associated()
            && tag.attribute("form").is_none()
            && let Some(form) = &self.form_element
        {
            self.handler.form_associate(form, &node)?;
        }
        let place = self.appropriate_place()?;
        let _ = self.insert_at(&place, &node)?;
        self.push_element(StackEntry {
            namespace: tag.namespace,
            kind,
            name: tag.name.clone(),
            node: node.clone(),
            integration_point: false,
        });
        Ok(node)
    }

    /// Insert an HTML element that is popped straight away: void elements
    /// and the "acknowledge the self-closing flag" cases.
    pub(super) fn insert_void_element(&mut self, tag: &Tag) -> Result<(), ParserError> {
        let _ = self.insert_element(tag)?;
        let _ = self.pop_element()?;
        Ok(())
    }

    /// Insert an HTML element for a start tag with no attributes.
    pub(super) fn insert_element_named(&mut self, name: &str) -> Result<H::Handle, ParserError> {
        self.insert_element(&Tag {
            namespace: Namespace::Html,
            name: name.to_string(),
            ..Tag::default()
        })
    }

    /// [§ 13.2.6.2 Parsing elements that contain only text](https://html.spec.whatwg.org/multipage/parsing.html#generic-raw-text-element-parsing-algorithm)
    ///
    /// The generic raw text and RCDATA element parsing algorithms: insert
    /// the element, switch the tokenizer's content model and remember the
    /// mode to return to.
    pub(super) fn parse_generic_rcdata(
        &mut self,
        tag: &Tag,
        model: ContentModel,
    ) -> Result<(), ParserError> {
        let _ = self.insert_element(tag)?;
        self.feedback = SinkFeedback::ContentModel(model);
        self.original_mode = self.mode;
        self.switch_mode(InsertionMode::GenericRcdata);
        Ok(())
    }

    /// Set the head element pointer, taking a reference.
    pub(super) fn set_head_element(&mut self, node: H::Handle) -> Result<(), ParserError> {
        self.handler.ref_node(&node)?;
        if let Some(old) = self.head_element.replace(node) {
            self.handler.unref_node(&old)?;
        }
        Ok(())
    }

    /// Set or clear the form element pointer, adjusting references.
    pub(super) fn set_form_element(&mut self, node: Option<H::Handle>) -> Result<(), ParserError> {
        if let Some(node) = &node {
            self.handler.ref_node(node)?;
        }
        if let Some(old) = std::mem::replace(&mut self.form_element, node) {
            self.handler.unref_node(&old)?;
        }
        Ok(())
    }

    /// Tell the handler that a script element has been closed, honouring a
    /// pause request.
    pub(super) fn complete_script(&mut self, node: &H::Handle) -> Result<(), ParserError> {
        if self.handler.complete_script(node)? == ScriptResult::Pause {
            self.request_pause();
        }
        Ok(())
    }

    /// Pass a `<meta>` charset declaration on to the handler, once.
    pub(super) fn declare_encoding(&mut self, tag: &Tag) -> Result<(), ParserError> {
        if self.encoding_declared {
            return Ok(());
        }
        let Some(charset) = charset_from_meta(tag) else {
            return Ok(());
        };
        self.encoding_declared = true;
        log::debug!(target: "lark_html::parser", "meta charset {charset}");
        self.handler.encoding_change(&charset)?;
        Ok(())
    }
}

/// "ASCII whitespace": tab, line feed, form feed, carriage return and space.
pub(super) const fn is_html_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

/// Split a character run at the first non-whitespace character.
pub(super) fn split_leading_whitespace(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !is_html_whitespace(c))
        .unwrap_or(text.len());
    text.split_at(end)
}

/// [§ 13.2.6.4.4](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
///
/// "If the element has a charset attribute ... Otherwise, if the element
/// has an http-equiv attribute whose value is an ASCII case-insensitive
/// match for the string "Content-Type", and the element has a content
/// attribute, and applying the algorithm for extracting a character encoding
/// from a meta element to that attribute's value returns an encoding..."
fn charset_from_meta(tag: &Tag) -> Option<String> {
    if let Some(charset) = tag.attribute("charset") {
        let charset = charset.trim();
        return (!charset.is_empty()).then(|| charset.to_string());
    }
    let is_content_type = tag
        .attribute("http-equiv")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"));
    if !is_content_type {
        return None;
    }
    extract_charset(tag.attribute("content")?)
}

/// [§ 2.6.4 Extracting character encodings from meta elements](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#algorithm-for-extracting-a-character-encoding-from-a-meta-element)
fn extract_charset(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let mut search = 0;
    loop {
        // "Loop: Find the first seven characters in s after position that are
        // an ASCII case-insensitive match for the word "charset"."
        let found = lower.get(search..)?.find("charset")? + search;
        let mut position = found + "charset".len();
        let rest = &content[position..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        position += rest.len() - trimmed.len();
        // "If the next character is not a U+003D EQUALS SIGN (=), then move
        // position to point just before that next character, and jump back to
        // the step labeled loop."
        let Some(value) = trimmed.strip_prefix('=') else {
            search = position;
            continue;
        };
        let value = value.trim_start_matches(|c: char| c.is_ascii_whitespace());
        let charset = match value.chars().next()? {
            quote @ ('"' | '\'') => {
                let inner = &value[1..];
                &inner[..inner.find(quote)?]
            }
            _ => {
                let end = value
                    .find(|c: char| c == ';' || c.is_ascii_whitespace())
                    .unwrap_or(value.len());
                &value[..end]
            }
        };
        return (!charset.is_empty()).then(|| charset.to_string());
    }
}

impl<H: TreeHandler> TokenSink for TreeBuilder<H> {
    fn process_token(
        &mut self,
        token: Token<'_>,
        location: Location,
    ) -> Result<SinkFeedback, ParserError> {
        if self.finished {
            return Ok(SinkFeedback::Continue);
        }
        self.location = location;
        self.feedback = SinkFeedback::Continue;

        let mut token = token;
        if std::mem::take(&mut self.skip_newline)
            && let Token::Character(text) = token
        {
            match text.strip_prefix('\n') {
                Some("") => return Ok(SinkFeedback::Continue),
                Some(rest) => token = Token::Character(rest),
                None => {}
            }
        }

        loop {
            let flow = self.dispatch(token)?;
            self.sync_foreign_mode();
            match flow {
                Flow::Done => break,
                Flow::Reprocess(next) => token = next,
            }
        }
        Ok(std::mem::take(&mut self.feedback))
    }

    fn report_error(&mut self, error: ParseError) {
        report(&mut self.error_handler, &error);
    }

    fn cdata_allowed(&self) -> bool {
        self.current().is_some_and(|e| e.namespace != Namespace::Html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_charset_forms() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8").as_deref(),
            Some("utf-8")
        );
        assert_eq!(
            extract_charset("text/html; CHARSET = \"koi8-r\"").as_deref(),
            Some("koi8-r")
        );
        assert_eq!(extract_charset("text/html; charset='unterminated"), None);
        assert_eq!(extract_charset("text/html"), None);
        assert_eq!(
            extract_charset("charsetx; charset=latin1").as_deref(),
            Some("latin1")
        );
    }
}
