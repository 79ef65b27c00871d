//! Active formatting elements: reconstruction, the Noah's Ark clause and
//! the adoption agency algorithm.

use lark_dom::{Namespace, Tag, TreeHandler};

use super::core::TreeBuilder;
use super::element_type::ElementType;
use super::stack::{FormattingElement, FormattingEntry, StackEntry};
use crate::error::{ParseErrorCode, ParserError};

/// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
/// "If outer loop counter is greater than or equal to 8, then return."
const OUTER_LOOP_LIMIT: usize = 8;

/// "If inner loop counter is greater than 3 and node is in the list of
/// active formatting elements, then remove node from the list of active
/// formatting elements."
const INNER_LOOP_LIMIT: usize = 3;

/// "have the same tag name, namespace, and attributes ... the attributes
/// must be compared as they were when the elements were created by the
/// parser"
fn same_element(a: &Tag, b: &Tag) -> bool {
    a.name == b.name
        && a.namespace == b.namespace
        && a.attributes.len() == b.attributes.len()
        && a.attributes.iter().all(|attr| b.attributes.contains(attr))
}

impl<H: TreeHandler> TreeBuilder<H> {
    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#push-onto-the-list-of-active-formatting-elements)
    ///
    /// "Push onto the list of active formatting elements", with the Noah's
    /// Ark clause: "If there are already three elements in the list of active
    /// formatting elements after the last marker, if any, or anywhere in the
    /// list if there are no markers, that have the same tag name, namespace,
    /// and attributes as element, then remove the earliest such element from
    /// the list of active formatting elements."
    pub(super) fn push_formatting_element(
        &mut self,
        tag: &Tag,
        node: H::Handle,
    ) -> Result<(), ParserError> {
        let mut count = 0;
        let mut earliest = None;
        for (index, entry) in self.formatting.iter().enumerate().rev() {
            let Some(element) = entry.element() else {
                break;
            };
            if same_element(&element.tag, tag) {
                count += 1;
                earliest = Some(index);
            }
        }
        if count >= 3
            && let Some(index) = earliest
        {
            self.remove_formatting_entry(index)?;
        }

        self.handler.ref_node(&node)?;
        let stack_index = self.stack_position(&node).unwrap_or(0);
        self.formatting.push(FormattingEntry::Element(FormattingElement {
            kind: ElementType::from_name(&tag.name),
            tag: tag.clone(),
            node,
            stack_index,
        }));
        Ok(())
    }

    /// "Insert a marker at the end of the list of active formatting
    /// elements."
    pub(super) fn push_formatting_marker(&mut self) {
        self.formatting.push(FormattingEntry::Marker);
    }

    /// Remove the entry at `index`, releasing its reference.
    pub(super) fn remove_formatting_entry(&mut self, index: usize) -> Result<(), ParserError> {
        if let FormattingEntry::Element(element) = self.formatting.remove(index) {
            self.handler.unref_node(&element.node)?;
        }
        Ok(())
    }

    /// Position of `node` in the list of active formatting elements.
    pub(super) fn formatting_position(&self, node: &H::Handle) -> Option<usize> {
        self.formatting
            .iter()
            .rposition(|entry| entry.element().is_some_and(|e| &e.node == node))
    }

    /// The last formatting element of `kind` after the last marker.
    pub(super) fn formatting_element_after_marker(&self, kind: ElementType) -> Option<usize> {
        for (index, entry) in self.formatting.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => return None,
                FormattingEntry::Element(element) if element.kind == kind => return Some(index),
                FormattingEntry::Element(_) => {}
            }
        }
        None
    }

    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker)
    ///
    /// "1. Let entry be the last (most recently added) entry in the list of
    /// active formatting elements. 2. Remove entry from the list of active
    /// formatting elements. 3. If entry was a marker, then stop the algorithm
    /// at this point."
    pub(super) fn clear_formatting_to_last_marker(&mut self) -> Result<(), ParserError> {
        while let Some(entry) = self.formatting.pop() {
            match entry {
                FormattingEntry::Marker => break,
                FormattingEntry::Element(element) => self.handler.unref_node(&element.node)?,
            }
        }
        Ok(())
    }

    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#reconstruct-the-active-formatting-elements)
    ///
    /// "Reconstruct the active formatting elements, if any." Each entry from
    /// the first closed one onwards is shallow-cloned, inserted at the
    /// appropriate place and pushed; the entry then tracks the clone.
    pub(super) fn reconstruct_active_formatting_elements(&mut self) -> Result<(), ParserError> {
        // "If there are no entries in the list of active formatting elements,
        // then there is nothing to reconstruct; stop this algorithm."
        // "If the last (most recently added) entry in the list of active
        // formatting elements is a marker, or if it is an element that is in
        // the stack of open elements, then there is nothing to reconstruct"
        match self.formatting.last() {
            None | Some(FormattingEntry::Marker) => return Ok(()),
            Some(FormattingEntry::Element(element)) if element.stack_index != 0 => return Ok(()),
            Some(FormattingEntry::Element(_)) => {}
        }

        // "Rewind: If there are no entries before entry in the list of active
        // formatting elements, then jump to the step labeled create."
        let mut first = self.formatting.len() - 1;
        while first > 0 {
            let open_or_marker = match &self.formatting[first - 1] {
                FormattingEntry::Marker => true,
                FormattingEntry::Element(element) => element.stack_index != 0,
            };
            if open_or_marker {
                break;
            }
            first -= 1;
        }

        // "Create: Insert an HTML element for the token for which the element
        // entry was created, to obtain new element."
        for index in first..self.formatting.len() {
            let FormattingEntry::Element(element) = &self.formatting[index] else {
                continue;
            };
            let old = element.node.clone();
            let kind = element.kind;
            let name = element.tag.name.clone();

            let clone = self.handler.clone_node(&old, false)?;
            let place = self.appropriate_place()?;
            let _ = self.insert_at(&place, &clone)?;
            self.handler.ref_node(&clone)?;
            let stack_index = self.stack.len();
            self.push_element(StackEntry {
                namespace: Namespace::Html,
                kind,
                name,
                node: clone.clone(),
                integration_point: false,
            });

            // "Replace the entry for entry in the list with an entry for new
            // element."
            if let FormattingEntry::Element(element) = &mut self.formatting[index] {
                element.node = clone;
                element.stack_index = stack_index;
            }
            self.handler.unref_node(&old)?;
        }
        Ok(())
    }

    /// Detach `node` from its parent, if it has one.
    fn detach(&mut self, node: &H::Handle) -> Result<(), ParserError> {
        if let Some(parent) = self.handler.get_parent(node, false)? {
            self.handler.remove_child(&parent, node)?;
        }
        Ok(())
    }

    /// [§ 13.2.6.4.7 Adoption agency algorithm](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
    ///
    /// Run for an end tag whose name is a formatting element. Returns
    /// `false` when there is no matching formatting element, in which case
    /// the caller acts as described in the "any other end tag" entry.
    pub(super) fn run_adoption_agency(&mut self, tag: &Tag) -> Result<bool, ParserError> {
        let subject = ElementType::from_name(&tag.name);

        // STEP 2: "If the current node is an HTML element whose tag name is
        // subject, and the current node is not in the list of active
        // formatting elements, then pop the current node off the stack of
        // open elements and return."
        if let Some(current) = self.current()
            && current.is_html(subject)
            && current.name == tag.name
        {
            let node = current.node.clone();
            if self.formatting_position(&node).is_none() {
                let _ = self.pop_element()?;
                return Ok(true);
            }
        }

        // STEP 3-4: "Let outer loop counter be 0. Outer loop: If outer loop
        // counter is greater than or equal to 8, then return."
        for outer in 0..OUTER_LOOP_LIMIT {
            log::trace!(
                target: "lark_html::parser",
                "adoption agency </{}> iteration {}",
                tag.name,
                outer + 1
            );

            // STEP 4.3: "Let formatting element be the last element in the list
            // of active formatting elements that: is between the end of the
            // list and the last marker in the list, if any, or the start of
            // the list otherwise, and has the tag name subject."
            let Some(list_index) = self.formatting_element_after_marker(subject) else {
                // "If there is no such element, then return and instead act as
                // described in the "any other end tag" entry above."
                return Ok(outer > 0);
            };
            let FormattingEntry::Element(formatting) = &self.formatting[list_index] else {
                return Ok(true);
            };
            let formatting_node = formatting.node.clone();
            let formatting_tag = formatting.tag.clone();
            let formatting_kind = formatting.kind;

            // STEP 4.4: "If formatting element is not in the stack of open
            // elements, then this is a parse error; remove the element from the
            // list, and return."
            let Some(stack_index) = self.stack_position(&formatting_node) else {
                self.parse_error(ParseErrorCode::MisnestedTag);
                self.remove_formatting_entry(list_index)?;
                return Ok(true);
            };

            // STEP 4.5: "If formatting element is in the stack of open
            // elements, but the element is not in scope, then this is a parse
            // error; return."
            if !self.index_in_scope(stack_index) {
                self.parse_error(ParseErrorCode::MisnestedTag);
                return Ok(true);
            }

            // STEP 4.6: "If formatting element is not the current node, this is
            // a parse error. (But do not return.)"
            if stack_index + 1 != self.stack.len() {
                self.parse_error(ParseErrorCode::MisnestedTag);
            }

            // STEP 4.7: "Let furthest block be the topmost node in the stack of
            // open elements that is lower in the stack than formatting element,
            // and is an element in the special category."
            let furthest = (stack_index + 1..self.stack.len()).find(|&i| self.stack[i].is_special());

            // STEP 4.8: "If there is no furthest block, then the UA must first
            // pop all the nodes from the bottom of the stack of open elements,
            // from the current node up to and including formatting element, then
            // remove formatting element from the list of active formatting
            // elements, and finally return."
            let Some(mut furthest_index) = furthest else {
                self.truncate_stack(stack_index)?;
                self.remove_formatting_entry(list_index)?;
                return Ok(true);
            };
            let furthest_node = self.stack[furthest_index].node.clone();

            // STEP 4.9: "Let common ancestor be the element immediately above
            // formatting element in the stack of open elements."
            let Some(ancestor) = stack_index.checked_sub(1).map(|i| &self.stack[i]) else {
                return Ok(true);
            };
            let ancestor_node = ancestor.node.clone();
            let ancestor_is_table = ancestor.namespace == Namespace::Html && ancestor.kind.is_table_context();

            // STEP 4.10: "Let a bookmark note the position of formatting element
            // in the list of active formatting elements relative to the elements
            // on either side of it in the list."
            let mut bookmark = list_index;

            // STEP 4.11: "Let node and last node be furthest block."
            let mut node_index = furthest_index;
            let mut last_index = furthest_index;

            // STEP 4.12-13: "Let inner loop counter be 0. Inner loop: Increment
            // inner loop counter by 1."
            let mut inner = 0;
            loop {
                inner += 1;

                // "Let node be the element immediately above node in the stack
                // of open elements"
                node_index -= 1;

                // "If node is formatting element, then break."
                if node_index == stack_index {
                    break;
                }

                let node = self.stack[node_index].node.clone();
                let mut node_list_index = self.formatting_position(&node);

                // "If inner loop counter is greater than 3 and node is in the
                // list of active formatting elements, then remove node from the
                // list of active formatting elements."
                if inner > INNER_LOOP_LIMIT
                    && let Some(index) = node_list_index.take()
                {
                    self.remove_formatting_entry(index)?;
                    if index < bookmark {
                        bookmark -= 1;
                    }
                }

                // "If node is not in the list of active formatting elements,
                // then remove node from the stack of open elements and continue."
                let Some(node_list_index) = node_list_index else {
                    self.remove_from_stack(node_index)?;
                    furthest_index -= 1;
                    last_index -= 1;
                    continue;
                };

                // "Create an element for the token for which the element node
                // was created ... Replace the entry for node in the list of
                // active formatting elements with an entry for the new element,
                // replace the entry for node in the stack of open elements with
                // an entry for the new element, and let node be the new
                // element."
                let clone = self.handler.clone_node(&node, false)?;
                self.handler.ref_node(&clone)?;
                let old_stack = std::mem::replace(&mut self.stack[node_index].node, clone.clone());
                self.handler.unref_node(&old_stack)?;
                if let FormattingEntry::Element(element) = &mut self.formatting[node_list_index] {
                    let old_list = std::mem::replace(&mut element.node, clone.clone());
                    self.handler.unref_node(&old_list)?;
                }

                // "If last node is furthest block, then move the aforementioned
                // bookmark to be immediately after the new node in the list of
                // active formatting elements."
                if last_index == furthest_index {
                    bookmark = node_list_index + 1;
                }

                // "Append last node to node."
                let last_node = self.stack[last_index].node.clone();
                self.detach(&last_node)?;
                let _ = self.handler.append_child(&clone, &last_node)?;

                // "Set last node to node."
                last_index = node_index;
            }

            // STEP 4.14: "Insert whatever last node ended up being in the
            // appropriate place for inserting a node, but using common ancestor
            // as the override target."
            let last_node = self.stack[last_index].node.clone();
            self.detach(&last_node)?;
            if ancestor_is_table {
                let place = self.foster_parent_place()?;
                let _ = self.insert_at(&place, &last_node)?;
            } else {
                let _ = self.handler.append_child(&ancestor_node, &last_node)?;
            }

            // STEP 4.15: "Create an element for the token for which formatting
            // element was created, in the HTML namespace, with furthest block as
            // the intended parent."
            let new_element = self.handler.clone_node(&formatting_node, false)?;

            // STEP 4.16: "Take all of the child nodes of furthest block and
            // append them to the element created in the last step."
            self.handler.reparent_children(&furthest_node, &new_element)?;

            // STEP 4.17: "Append that new element to furthest block."
            let _ = self.handler.append_child(&furthest_node, &new_element)?;

            // STEP 4.18: "Remove formatting element from the list of active
            // formatting elements, and insert the new element into the list of
            // active formatting elements at the position of the aforementioned
            // bookmark."
            if let Some(index) = self.formatting_position(&formatting_node) {
                self.remove_formatting_entry(index)?;
                if index < bookmark {
                    bookmark -= 1;
                }
            }
            let bookmark = bookmark.min(self.formatting.len());
            self.formatting.insert(
                bookmark,
                FormattingEntry::Element(FormattingElement {
                    kind: formatting_kind,
                    tag: formatting_tag.clone(),
                    node: new_element.clone(),
                    stack_index: 0,
                }),
            );

            // STEP 4.19: "Remove formatting element from the stack of open
            // elements, and insert the new element into the stack of open
            // elements immediately below the position of furthest block in that
            // stack."
            if let Some(index) = self.stack_position(&formatting_node) {
                self.remove_from_stack(index)?;
            }
            let below_furthest = self
                .stack_position(&furthest_node)
                .map_or(self.stack.len(), |i| i + 1);
            self.handler.ref_node(&new_element)?;
            self.insert_into_stack(
                below_furthest,
                StackEntry {
                    namespace: Namespace::Html,
                    kind: formatting_kind,
                    name: formatting_tag.name,
                    node: new_element,
                    integration_point: false,
                },
            );
            if let Some(FormattingEntry::Element(element)) = self.formatting.get_mut(bookmark) {
                element.stack_index = below_furthest;
            }
        }
        Ok(true)
    }
}
