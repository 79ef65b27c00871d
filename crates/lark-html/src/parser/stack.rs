//! [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
//! and [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements).
//!
//! Every stack entry and every formatting entry holds one reference on its
//! node. Formatting entries also remember the stack index of their element
//! (zero when it is not open; index zero is always the `html` element),
//! and every stack mutation below keeps those indices in step.

use lark_dom::{Namespace, Tag, TreeHandler};

use super::core::{InsertionMode, TreeBuilder};
use super::element_type::ElementType;
use crate::error::{ParseErrorCode, ParserError};

/// One element on the stack of open elements.
#[derive(Debug, Clone)]
pub(super) struct StackEntry<N> {
    pub(super) namespace: Namespace,
    pub(super) kind: ElementType,
    /// Tag name as inserted (case-adjusted for SVG).
    pub(super) name: String,
    pub(super) node: N,
    /// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#html-integration-point)
    /// "HTML integration point"
    pub(super) integration_point: bool,
}

impl<N> StackEntry<N> {
    pub(super) fn is_html(&self, kind: ElementType) -> bool {
        self.namespace == Namespace::Html && self.kind == kind
    }

    pub(super) fn is_html_one_of(&self, kinds: &[ElementType]) -> bool {
        self.namespace == Namespace::Html && kinds.contains(&self.kind)
    }

    pub(super) const fn is_special(&self) -> bool {
        self.kind.is_special(self.namespace)
    }

    /// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#mathml-text-integration-point)
    /// "A node is a `MathML` text integration point if it is one of the
    /// following elements: A `MathML` mi element, A `MathML` mo element, A `MathML`
    /// mn element, A `MathML` ms element, A `MathML` mtext element"
    pub(super) const fn is_mathml_text_integration_point(&self) -> bool {
        matches!(self.namespace, Namespace::MathMl)
            && matches!(
                self.kind,
                ElementType::Mi
                    | ElementType::Mo
                    | ElementType::Mn
                    | ElementType::Ms
                    | ElementType::Mtext
            )
    }
}

/// An element in the list of active formatting elements.
#[derive(Debug, Clone)]
pub(super) struct FormattingElement<N> {
    pub(super) kind: ElementType,
    /// The token the element was created for; compared by the Noah's Ark
    /// clause.
    pub(super) tag: Tag,
    pub(super) node: N,
    /// Index of the element on the stack of open elements, or zero.
    pub(super) stack_index: usize,
}

/// An entry in the list of active formatting elements.
#[derive(Debug, Clone)]
pub(super) enum FormattingEntry<N> {
    /// "A marker is an entry in the list of active formatting elements that
    /// is distinct from any element."
    Marker,
    Element(FormattingElement<N>),
}

impl<N> FormattingEntry<N> {
    pub(super) const fn element(&self) -> Option<&FormattingElement<N>> {
        match self {
            Self::Marker => None,
            Self::Element(element) => Some(element),
        }
    }
}

/// [§ 13.2.4.2 Has an element in the specific scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    /// "has an element in scope"
    Default,
    /// "has an element in list item scope": adds `ol` and `ul`.
    ListItem,
    /// "has an element in button scope": adds `button`.
    Button,
    /// "has an element in table scope": `html`, `table` and `template` only.
    Table,
    /// "has an element in select scope": everything but `optgroup` and
    /// `option`.
    Select,
}

impl Scope {
    fn is_boundary<N>(self, entry: &StackEntry<N>) -> bool {
        match self {
            Self::Default => entry.kind.is_scope_boundary(entry.namespace),
            Self::ListItem => {
                entry.kind.is_scope_boundary(entry.namespace)
                    || entry.is_html_one_of(&[ElementType::Ol, ElementType::Ul])
            }
            Self::Button => {
                entry.kind.is_scope_boundary(entry.namespace) || entry.is_html(ElementType::Button)
            }
            Self::Table => entry.is_html_one_of(&[
                ElementType::Html,
                ElementType::Table,
                ElementType::Template,
            ]),
            Self::Select => !entry.is_html_one_of(&[ElementType::Optgroup, ElementType::Option]),
        }
    }
}

// =============================================================================
// Stack of open elements
// =============================================================================

impl<H: TreeHandler> TreeBuilder<H> {
    /// "The current node is the bottommost node in this stack of open
    /// elements."
    pub(super) fn current(&self) -> Option<&StackEntry<H::Handle>> {
        self.stack.last()
    }

    /// Whether the current node is an HTML element of type `kind`.
    pub(super) fn current_is(&self, kind: ElementType) -> bool {
        self.current().is_some_and(|e| e.is_html(kind))
    }

    /// Push an element; the stack takes over the caller's reference.
    pub(super) fn push_element(&mut self, entry: StackEntry<H::Handle>) {
        log::trace!(target: "lark_html::parser", "push <{}>", entry.name);
        self.stack.push(entry);
    }

    /// Pop the current node and release the stack's reference on it.
    pub(super) fn pop_element(&mut self) -> Result<Option<StackEntry<H::Handle>>, ParserError> {
        let Some(entry) = self.stack.pop() else {
            return Ok(None);
        };
        log::trace!(target: "lark_html::parser", "pop <{}>", entry.name);
        let index = self.stack.len();
        for element in self.formatting_elements_mut() {
            if element.stack_index == index {
                element.stack_index = 0;
            }
        }
        self.handler.unref_node(&entry.node)?;
        Ok(Some(entry))
    }

    /// Remove the entry at `index`, releasing its reference.
    pub(super) fn remove_from_stack(&mut self, index: usize) -> Result<(), ParserError> {
        let entry = self.stack.remove(index);
        for element in self.formatting_elements_mut() {
            if element.stack_index == index {
                element.stack_index = 0;
            } else if element.stack_index > index {
                element.stack_index -= 1;
            }
        }
        self.handler.unref_node(&entry.node)?;
        Ok(())
    }

    /// Insert an entry at `index`; the stack takes over the caller's
    /// reference.
    pub(super) fn insert_into_stack(&mut self, index: usize, entry: StackEntry<H::Handle>) {
        for element in self.formatting_elements_mut() {
            if element.stack_index >= index && element.stack_index != 0 {
                element.stack_index += 1;
            }
        }
        self.stack.insert(index, entry);
    }

    fn formatting_elements_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut FormattingElement<H::Handle>> {
        self.formatting.iter_mut().filter_map(|entry| match entry {
            FormattingEntry::Marker => None,
            FormattingEntry::Element(element) => Some(element),
        })
    }

    /// Position of `node` on the stack.
    pub(super) fn stack_position(&self, node: &H::Handle) -> Option<usize> {
        self.stack.iter().rposition(|e| &e.node == node)
    }

    /// Position of the topmost HTML element of type `kind`.
    pub(super) fn stack_position_of(&self, kind: ElementType) -> Option<usize> {
        self.stack.iter().rposition(|e| e.is_html(kind))
    }

    /// Pop elements until an element matching `predicate` has been popped.
    pub(super) fn pop_until_where(
        &mut self,
        predicate: impl Fn(&StackEntry<H::Handle>) -> bool,
    ) -> Result<(), ParserError> {
        while let Some(entry) = self.pop_element()? {
            if predicate(&entry) {
                break;
            }
        }
        Ok(())
    }

    /// "Pop elements from the stack of open elements until an X element has
    /// been popped from the stack."
    pub(super) fn pop_until(&mut self, kind: ElementType) -> Result<(), ParserError> {
        self.pop_until_where(|e| e.is_html(kind))
    }

    /// Pop until an HTML element of one of `kinds` has been popped.
    pub(super) fn pop_until_one_of(&mut self, kinds: &[ElementType]) -> Result<(), ParserError> {
        self.pop_until_where(|e| e.is_html_one_of(kinds))
    }

    /// Pop entries until the stack has `len` entries.
    pub(super) fn truncate_stack(&mut self, len: usize) -> Result<(), ParserError> {
        while self.stack.len() > len {
            let _ = self.pop_element()?;
        }
        Ok(())
    }

    /// [§ 13.2.6.4.9](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-stack-back-to-a-table-context)
    ///
    /// "While the current node is not a table, template, or html element, pop
    /// elements from the stack of open elements." The other table contexts
    /// pass their own stop list.
    pub(super) fn clear_stack_back_to(&mut self, kinds: &[ElementType]) -> Result<(), ParserError> {
        while let Some(current) = self.current() {
            if current.is_html_one_of(kinds) || current.is_html(ElementType::Html) {
                break;
            }
            let _ = self.pop_element()?;
        }
        Ok(())
    }

    /// Whether an element matching `predicate` is in `scope`.
    pub(super) fn in_scope_where(
        &self,
        scope: Scope,
        predicate: impl Fn(&StackEntry<H::Handle>) -> bool,
    ) -> bool {
        for entry in self.stack.iter().rev() {
            if predicate(entry) {
                return true;
            }
            if scope.is_boundary(entry) {
                return false;
            }
        }
        false
    }

    /// "has an X element in (specific) scope"
    pub(super) fn in_scope(&self, kind: ElementType, scope: Scope) -> bool {
        self.in_scope_where(scope, |e| e.is_html(kind))
    }

    /// Whether the stack entry at `index` is in the default scope.
    pub(super) fn index_in_scope(&self, index: usize) -> bool {
        for (position, entry) in self.stack.iter().enumerate().rev() {
            if position == index {
                return true;
            }
            if Scope::Default.is_boundary(entry) {
                return false;
            }
        }
        false
    }

    /// [§ 13.2.6.2 Closing elements that have implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#closing-elements-that-have-implied-end-tags)
    ///
    /// "While the current node is a dd element, a dt element, an li element,
    /// an optgroup element, an option element, a p element, an rb element, an
    /// rp element, an rt element, or an rtc element, the UA must pop the
    /// current node off the stack of open elements." With `except`, that
    /// element type is left open.
    pub(super) fn close_implied_end_tags(
        &mut self,
        except: Option<ElementType>,
    ) -> Result<(), ParserError> {
        while let Some(current) = self.current() {
            let implied = current.namespace == Namespace::Html
                && current.kind.has_implied_end_tag()
                && Some(current.kind) != except;
            if !implied {
                break;
            }
            let _ = self.pop_element()?;
        }
        Ok(())
    }

    /// "close a p element"
    pub(super) fn close_p_element(&mut self) -> Result<(), ParserError> {
        self.close_implied_end_tags(Some(ElementType::P))?;
        if !self.current_is(ElementType::P) {
            self.parse_error(ParseErrorCode::UnexpectedEndTag);
        }
        self.pop_until(ElementType::P)
    }

    /// Close a `p` element if one is in button scope.
    pub(super) fn close_p_if_in_button_scope(&mut self) -> Result<(), ParserError> {
        if self.in_scope(ElementType::P, Scope::Button) {
            self.close_p_element()?;
        }
        Ok(())
    }

    /// [§ 13.2.4.1 Reset the insertion mode appropriately](https://html.spec.whatwg.org/multipage/parsing.html#reset-the-insertion-mode-appropriately)
    ///
    /// Walks the stack from the current node down. A foreign element met
    /// before any HTML element that decides the mode puts the builder in
    /// foreign content; the HTML mode found further down becomes the
    /// secondary mode used for tokens that follow HTML rules.
    pub(super) fn reset_insertion_mode(&mut self) {
        let mut foreign = false;
        let mut mode = InsertionMode::InBody;
        for (index, entry) in self.stack.iter().enumerate().rev() {
            if entry.namespace != Namespace::Html {
                foreign = true;
                continue;
            }
            let found = match entry.kind {
                ElementType::Select => Some(self.select_mode_for(index)),
                ElementType::Td | ElementType::Th if index > 0 => Some(InsertionMode::InCell),
                ElementType::Tr => Some(InsertionMode::InRow),
                ElementType::Tbody | ElementType::Thead | ElementType::Tfoot => {
                    Some(InsertionMode::InTableBody)
                }
                ElementType::Caption => Some(InsertionMode::InCaption),
                ElementType::Colgroup => Some(InsertionMode::InColumnGroup),
                ElementType::Table => Some(InsertionMode::InTable),
                ElementType::Head | ElementType::Body => Some(InsertionMode::InBody),
                ElementType::Frameset => Some(InsertionMode::InFrameset),
                ElementType::Html => Some(if self.head_element.is_none() {
                    InsertionMode::BeforeHead
                } else {
                    InsertionMode::AfterHead
                }),
                _ => None,
            };
            if let Some(found) = found {
                mode = found;
                break;
            }
        }
        if foreign {
            self.secondary_mode = mode;
            self.switch_mode(InsertionMode::InForeignContent);
        } else {
            self.switch_mode(mode);
        }
    }

    /// "If ancestor is a table node, switch the insertion mode to 'in select
    /// in table' and return."
    fn select_mode_for(&self, index: usize) -> InsertionMode {
        let in_table = self.stack[..index]
            .iter()
            .rev()
            .take_while(|e| !e.is_html(ElementType::Template))
            .any(|e| e.is_html(ElementType::Table));
        if in_table {
            InsertionMode::InSelectInTable
        } else {
            InsertionMode::InSelect
        }
    }
}
