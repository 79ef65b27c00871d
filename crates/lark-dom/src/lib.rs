//! Tree-handler interface and reference DOM for the Lark parser.
//!
//! This crate provides two things:
//!
//! - The [`TreeHandler`] trait and the value types that cross it
//!   ([`Tag`], [`Attribute`], [`Doctype`], [`Namespace`], [`QuirksMode`]).
//!   The tree builder in `lark-html` drives any implementation of it.
//! - [`DomTree`], an arena-based DOM following the
//!   [DOM Living Standard](https://dom.spec.whatwg.org/) that implements the
//!   trait with real reference counting, so that leaks and double releases
//!   in the builder show up as test failures.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships. Nodes are never removed from the arena; a destroyed node
//! is marked dead and any later use of its id is an
//! [`TreeError::InvalidHandle`].

use std::mem;

/// The tree-handler trait and the types that cross it.
pub mod handler;
/// html5lib tree-construction test format.
pub mod serialize;

pub use handler::{
    Attribute, Doctype, Namespace, QuirksMode, ScriptResult, Tag, TreeError, TreeHandler,
};

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// Outstanding references held through [`TreeHandler::ref_node`].
    pub refcount: usize,

    /// Set once the node has been destroyed.
    pub destroyed: bool,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.6 Interface DocumentType](https://dom.spec.whatwg.org/#interface-documenttype)
    Doctype(Doctype),
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "Elements have an associated namespace, namespace prefix, local name..."
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's namespace"
    pub namespace: Namespace,
    /// "An element's local name"
    pub tag_name: String,
    /// "An element has an associated attribute list", in insertion order.
    pub attrs: Vec<Attribute>,
    /// Form owner set through [`TreeHandler::form_associate`].
    pub form_owner: Option<NodeId>,
}

impl ElementData {
    /// Look up a null-namespace attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.namespace == Namespace::Null && a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Arena-based DOM tree with O(1) node access.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
///
/// The document node starts with one reference owned by whoever holds the
/// tree. Releasing it destroys the whole document.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes ever allocated, indexed by `NodeId`.
    nodes: Vec<Node>,
    quirks_mode: QuirksMode,
    completed_scripts: Vec<NodeId>,
    encoding_changes: Vec<String>,
    reject_encoding_change: bool,
    pause_on_script: bool,
}

impl DomTree {
    /// Create a new DOM tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        let document = Node {
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
            refcount: 1,
            destroyed: false,
        };
        Self {
            nodes: vec![document],
            quirks_mode: QuirksMode::NoQuirks,
            completed_scripts: Vec::new(),
            encoding_changes: Vec::new(),
            reject_encoding_change: false,
            pause_on_script: false,
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a live node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|n| !n.destroyed)
    }

    /// Number of nodes ever allocated, destroyed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the document node exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new unattached node holding one reference.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            refcount: 1,
            destroyed: false,
        });
        id
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&c| c == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(text) = self.as_text(current) {
                out.push_str(text);
            }
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's children
    /// that is either a body element or a frameset element, or null if there is
    /// no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;

        self.children(html)
            .iter()
            .find(|&&id| {
                self.as_element(id)
                    .is_some_and(|e| e.tag_name == "body" || e.tag_name == "frameset")
            })
            .copied()
    }

    /// Quirks mode recorded by the parser.
    #[must_use]
    pub const fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    /// Script elements passed to [`TreeHandler::complete_script`], in order.
    #[must_use]
    pub fn completed_scripts(&self) -> &[NodeId] {
        &self.completed_scripts
    }

    /// Charsets passed to [`TreeHandler::encoding_change`], in order.
    #[must_use]
    pub fn encoding_changes(&self) -> &[String] {
        &self.encoding_changes
    }

    /// Make [`TreeHandler::encoding_change`] fail with
    /// [`TreeError::BadEncoding`].
    pub const fn set_reject_encoding_change(&mut self, reject: bool) {
        self.reject_encoding_change = reject;
    }

    /// Make [`TreeHandler::complete_script`] request a pause.
    pub const fn set_pause_on_script(&mut self, pause: bool) {
        self.pause_on_script = pause;
    }

    /// Current reference count of a node (destroyed nodes report zero).
    #[must_use]
    pub fn refcount(&self, id: NodeId) -> usize {
        self.get(id).map_or(0, |n| n.refcount)
    }

    /// Whether the node has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.destroyed)
    }

    /// Ids of every node that is still alive.
    #[must_use]
    pub fn live_nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|&id| !self.is_destroyed(id))
            .collect()
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id)
            .ok_or_else(|| TreeError::InvalidHandle(format!("{id:?}")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.0)
            .filter(|n| !n.destroyed)
            .ok_or_else(|| TreeError::InvalidHandle(format!("{id:?}")))
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild)
    }

    /// Unlink `child` from its current parent, if any.
    fn detach(&mut self, child: NodeId) -> Result<(), TreeError> {
        if let Some(parent) = self.node(child)?.parent {
            let index = self.child_index(parent, child)?;
            let _ = self.node_mut(parent)?.children.remove(index);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Append `child`'s text to `target` if both are text nodes.
    fn merge_text(&mut self, target: NodeId, child: NodeId) -> Result<bool, TreeError> {
        let NodeType::Text(extra) = &self.node(child)?.node_type else {
            return Ok(false);
        };
        let extra = extra.clone();
        match &mut self.node_mut(target)?.node_type {
            NodeType::Text(existing) => {
                existing.push_str(&extra);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Destroy `id` and any descendants that are unreferenced, once it has
    /// neither references nor a parent.
    fn collect(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.get_mut(current.0) else {
                continue;
            };
            if node.destroyed || node.refcount > 0 || node.parent.is_some() {
                continue;
            }
            node.destroyed = true;
            log::trace!(target: "lark_dom", "destroyed {current:?}");
            for child in mem::take(&mut node.children) {
                if let Some(child_node) = self.nodes.get_mut(child.0) {
                    child_node.parent = None;
                }
                pending.push(child);
            }
        }
    }

    fn clone_subtree(&mut self, id: NodeId, deep: bool) -> Result<NodeId, TreeError> {
        let mut node_type = self.node(id)?.node_type.clone();
        if let NodeType::Element(data) = &mut node_type {
            data.form_owner = None;
        }
        let copy = self.alloc(node_type);
        if deep {
            for child in self.node(id)?.children.clone() {
                let child_copy = self.clone_subtree(child, true)?;
                let node = self.node_mut(child_copy)?;
                node.refcount = 0;
                node.parent = Some(copy);
                self.node_mut(copy)?.children.push(child_copy);
            }
        }
        Ok(copy)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeHandler for DomTree {
    type Handle = NodeId;

    fn create_comment(&mut self, data: &str) -> Result<NodeId, TreeError> {
        Ok(self.alloc(NodeType::Comment(data.to_string())))
    }

    fn create_doctype(&mut self, doctype: &Doctype) -> Result<NodeId, TreeError> {
        Ok(self.alloc(NodeType::Doctype(doctype.clone())))
    }

    fn create_element(&mut self, tag: &Tag) -> Result<NodeId, TreeError> {
        Ok(self.alloc(NodeType::Element(ElementData {
            namespace: tag.namespace,
            tag_name: tag.name.clone(),
            attrs: tag.attributes.clone(),
            form_owner: None,
        })))
    }

    fn create_text(&mut self, data: &str) -> Result<NodeId, TreeError> {
        Ok(self.alloc(NodeType::Text(data.to_string())))
    }

    fn ref_node(&mut self, node: &NodeId) -> Result<(), TreeError> {
        self.node_mut(*node)?.refcount += 1;
        Ok(())
    }

    fn unref_node(&mut self, node: &NodeId) -> Result<(), TreeError> {
        let entry = self.node_mut(*node)?;
        if entry.refcount == 0 {
            return Err(TreeError::RefcountUnderflow(format!("{node:?}")));
        }
        entry.refcount -= 1;
        self.collect(*node);
        Ok(())
    }

    /// [§ 4.2.3 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Adjacent text is coalesced into the parent's last text child.
    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<NodeId, TreeError> {
        let (parent, child) = (*parent, *child);
        if let Some(last) = self.node(parent)?.children.last().copied()
            && self.merge_text(last, child)?
        {
            return Ok(last);
        }
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(child)
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        reference: &NodeId,
    ) -> Result<NodeId, TreeError> {
        let (parent, child) = (*parent, *child);
        let index = self.child_index(parent, *reference)?;
        if let Some(index) = index.checked_sub(1) {
            let previous = self.node(parent)?.children[index];
            if self.merge_text(previous, child)? {
                return Ok(previous);
            }
        }
        self.detach(child)?;
        // Detaching may have shifted the reference node.
        let index = self.child_index(parent, *reference)?;
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(child)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TreeError> {
        let index = self.child_index(*parent, *child)?;
        let _ = self.node_mut(*parent)?.children.remove(index);
        self.node_mut(*child)?.parent = None;
        self.collect(*child);
        Ok(())
    }

    fn clone_node(&mut self, node: &NodeId, deep: bool) -> Result<NodeId, TreeError> {
        self.clone_subtree(*node, deep)
    }

    fn reparent_children(&mut self, node: &NodeId, new_parent: &NodeId) -> Result<(), TreeError> {
        let moved = mem::take(&mut self.node_mut(*node)?.children);
        for child in &moved {
            self.node_mut(*child)?.parent = Some(*new_parent);
        }
        self.node_mut(*new_parent)?.children.extend(moved);
        Ok(())
    }

    fn get_parent(&mut self, node: &NodeId, element_only: bool) -> Result<Option<NodeId>, TreeError> {
        let parent = self.node(*node)?.parent;
        Ok(parent.filter(|&p| !element_only || self.as_element(p).is_some()))
    }

    fn has_children(&mut self, node: &NodeId) -> Result<bool, TreeError> {
        Ok(!self.node(*node)?.children.is_empty())
    }

    fn form_associate(&mut self, form: &NodeId, node: &NodeId) -> Result<(), TreeError> {
        let form = *form;
        let _ = self.node(form)?;
        if let NodeType::Element(data) = &mut self.node_mut(*node)?.node_type {
            data.form_owner = Some(form);
        }
        Ok(())
    }

    fn add_attributes(&mut self, node: &NodeId, attributes: &[Attribute]) -> Result<(), TreeError> {
        let NodeType::Element(data) = &mut self.node_mut(*node)?.node_type else {
            return Err(TreeError::Failed("add_attributes on a non-element".to_string()));
        };
        for attr in attributes {
            let present = data
                .attrs
                .iter()
                .any(|a| a.namespace == attr.namespace && a.name == attr.name);
            if !present {
                data.attrs.push(attr.clone());
            }
        }
        Ok(())
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) -> Result<(), TreeError> {
        self.quirks_mode = mode;
        Ok(())
    }

    fn encoding_change(&mut self, charset: &str) -> Result<(), TreeError> {
        self.encoding_changes.push(charset.to_string());
        if self.reject_encoding_change {
            return Err(TreeError::BadEncoding);
        }
        Ok(())
    }

    fn complete_script(&mut self, script: &NodeId) -> Result<ScriptResult, TreeError> {
        self.completed_scripts.push(*script);
        Ok(if self.pause_on_script {
            ScriptResult::Pause
        } else {
            ScriptResult::Continue
        })
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
