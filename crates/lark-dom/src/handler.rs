//! The tree-handler interface.
//!
//! The tree builder never touches nodes directly. Every structural change
//! goes through a [`TreeHandler`], and node lifetimes follow an explicit
//! reference-counting contract:
//!
//! - `create_*` and [`TreeHandler::clone_node`] return a handle holding one
//!   reference, owned by the caller.
//! - [`TreeHandler::ref_node`] / [`TreeHandler::unref_node`] add and release
//!   references.
//! - A node is destroyed only once its reference count is zero *and* it has
//!   no parent. Attaching a node to the tree therefore keeps it alive even
//!   after the caller releases its reference.
//! - Handles returned by [`TreeHandler::append_child`],
//!   [`TreeHandler::insert_before`] and [`TreeHandler::get_parent`] carry no
//!   reference; they stay valid while the node is in the tree.

use std::fmt;

use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

/// [§ 2.1.8 Namespaces](https://infra.spec.whatwg.org/#namespaces)
///
/// Namespace of an element or attribute. Plain attributes use
/// [`Namespace::Null`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, IntoStaticStr)]
pub enum Namespace {
    /// No namespace.
    #[default]
    #[strum(serialize = "")]
    Null,
    /// "The HTML namespace is `http://www.w3.org/1999/xhtml`."
    #[strum(serialize = "html")]
    Html,
    /// "The `MathML` namespace is `http://www.w3.org/1998/Math/MathML`."
    #[strum(serialize = "math")]
    MathMl,
    /// "The SVG namespace is `http://www.w3.org/2000/svg`."
    #[strum(serialize = "svg")]
    Svg,
    /// "The `XLink` namespace is `http://www.w3.org/1999/xlink`."
    #[strum(serialize = "xlink")]
    XLink,
    /// "The XML namespace is `http://www.w3.org/XML/1998/namespace`."
    #[strum(serialize = "xml")]
    Xml,
    /// "The XMLNS namespace is `http://www.w3.org/2000/xmlns/`."
    #[strum(serialize = "xmlns")]
    Xmlns,
}

impl Namespace {
    /// The namespace URL, or the empty string for [`Namespace::Null`].
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::Null => "",
            Self::Html => "http://www.w3.org/1999/xhtml",
            Self::MathMl => "http://www.w3.org/1998/Math/MathML",
            Self::Svg => "http://www.w3.org/2000/svg",
            Self::XLink => "http://www.w3.org/1999/xlink",
            Self::Xml => "http://www.w3.org/XML/1998/namespace",
            Self::Xmlns => "http://www.w3.org/2000/xmlns/",
        }
    }
}

/// An attribute on a tag token or element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attribute {
    /// Attribute namespace; only foreign attributes such as `xlink:href`
    /// carry one.
    pub namespace: Namespace,
    /// Local name (lowercased by the tokenizer, case-corrected for foreign
    /// content, prefix stripped for namespaced attributes).
    pub name: String,
    /// Attribute value with character references resolved.
    pub value: String,
}

impl Attribute {
    /// Create a plain (null-namespace) attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Null,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A start or end tag as seen by the tree builder and handed to
/// [`TreeHandler::create_element`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    /// Namespace the element will be created in.
    pub namespace: Namespace,
    /// Tag name.
    pub name: String,
    /// Attributes in source order, duplicates already removed.
    pub attributes: Vec<Attribute>,
    /// Whether the tag ended with `/>`.
    pub self_closing: bool,
}

impl Tag {
    /// Look up an attribute value by name (null namespace only).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace == Namespace::Null && a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "DOCTYPE tokens have a name, a public identifier, a system identifier,
/// and a force-quirks flag. When a DOCTYPE token is created, its name,
/// public identifier, and system identifier must be marked as missing
/// (which is a distinct state from the empty string)"
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Doctype {
    /// Doctype name, `None` when missing.
    pub name: Option<String>,
    /// Public identifier, `None` when missing.
    pub public_id: Option<String>,
    /// System identifier, `None` when missing.
    pub system_id: Option<String>,
    /// "force-quirks flag"
    pub force_quirks: bool,
}

/// [§ 3.1 Documents](https://dom.spec.whatwg.org/#concept-document-mode)
///
/// "Each document has an associated mode ("no-quirks", "quirks", or
/// "limited-quirks")."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, IntoStaticStr)]
pub enum QuirksMode {
    /// Standards mode.
    #[default]
    #[strum(serialize = "no-quirks")]
    NoQuirks,
    /// Almost-standards mode.
    #[strum(serialize = "limited-quirks")]
    LimitedQuirks,
    /// Full quirks mode.
    #[strum(serialize = "quirks")]
    Quirks,
}

/// What the parser should do after a script element has been completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptResult {
    /// Keep parsing.
    #[default]
    Continue,
    /// Suspend the tokenizer until the embedder resumes it.
    Pause,
}

/// Errors a [`TreeHandler`] may report. All of them abort the current
/// processing step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle does not name a live node.
    #[error("invalid node handle: {0}")]
    InvalidHandle(String),
    /// A reference was released that was never taken.
    #[error("reference count underflow on {0}")]
    RefcountUnderflow(String),
    /// The node is not a child of the given parent.
    #[error("node is not a child of the given parent")]
    NotAChild,
    /// The handler cannot continue with the charset currently in use.
    #[error("charset change not supported by tree handler")]
    BadEncoding,
    /// Any other handler failure.
    #[error("tree handler failure: {0}")]
    Failed(String),
}

/// The mutation interface the tree builder drives.
///
/// See the module documentation for the reference-counting contract.
pub trait TreeHandler {
    /// Opaque node handle.
    type Handle: Clone + PartialEq + fmt::Debug;

    /// Create a comment node.
    ///
    /// # Errors
    ///
    /// Any handler failure.
    fn create_comment(&mut self, data: &str) -> Result<Self::Handle, TreeError>;

    /// Create a doctype node.
    ///
    /// # Errors
    ///
    /// Any handler failure.
    fn create_doctype(&mut self, doctype: &Doctype) -> Result<Self::Handle, TreeError>;

    /// Create an element from a (namespace-adjusted) tag.
    ///
    /// # Errors
    ///
    /// Any handler failure.
    fn create_element(&mut self, tag: &Tag) -> Result<Self::Handle, TreeError>;

    /// Create a text node.
    ///
    /// # Errors
    ///
    /// Any handler failure.
    fn create_text(&mut self, data: &str) -> Result<Self::Handle, TreeError>;

    /// Take an additional reference on `node`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if `node` is not a live node.
    fn ref_node(&mut self, node: &Self::Handle) -> Result<(), TreeError>;

    /// Release a reference on `node`.
    ///
    /// # Errors
    ///
    /// [`TreeError::RefcountUnderflow`] if no reference is held, or
    /// [`TreeError::InvalidHandle`] for a dead node.
    fn unref_node(&mut self, node: &Self::Handle) -> Result<(), TreeError>;

    /// Append `child` to `parent`. Returns the node now in the tree, which
    /// differs from `child` when text was merged into an existing node.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if either handle is not a live node.
    fn append_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
    ) -> Result<Self::Handle, TreeError>;

    /// Insert `child` into `parent` before `reference`. Returns the node now
    /// in the tree, as for [`TreeHandler::append_child`].
    ///
    /// # Errors
    ///
    /// [`TreeError::NotAChild`] if `reference` is not a child of `parent`.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        reference: &Self::Handle,
    ) -> Result<Self::Handle, TreeError>;

    /// Detach `child` from `parent`.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotAChild`] if `child` is not a child of `parent`.
    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
    -> Result<(), TreeError>;

    /// Clone a node. The clone is unattached and holds one reference owned
    /// by the caller.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if `node` is not a live node.
    fn clone_node(&mut self, node: &Self::Handle, deep: bool) -> Result<Self::Handle, TreeError>;

    /// Move every child of `node` to the end of `new_parent`'s children.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if either handle is not a live node.
    fn reparent_children(
        &mut self,
        node: &Self::Handle,
        new_parent: &Self::Handle,
    ) -> Result<(), TreeError>;

    /// Parent of `node`. With `element_only`, a non-element parent (the
    /// document) is reported as `None`.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if `node` is not a live node.
    fn get_parent(
        &mut self,
        node: &Self::Handle,
        element_only: bool,
    ) -> Result<Option<Self::Handle>, TreeError>;

    /// Whether `node` has any children.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if `node` is not a live node.
    fn has_children(&mut self, node: &Self::Handle) -> Result<bool, TreeError>;

    /// Associate a form-associated element with its form owner.
    ///
    /// # Errors
    ///
    /// Any handler failure.
    fn form_associate(&mut self, form: &Self::Handle, node: &Self::Handle)
    -> Result<(), TreeError>;

    /// Add attributes to `node` that it does not already carry.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidHandle`] if `node` is not a live node.
    fn add_attributes(
        &mut self,
        node: &Self::Handle,
        attributes: &[Attribute],
    ) -> Result<(), TreeError>;

    /// Record the document's quirks mode.
    ///
    /// # Errors
    ///
    /// Any handler failure.
    fn set_quirks_mode(&mut self, mode: QuirksMode) -> Result<(), TreeError>;

    /// A `<meta>` declared a charset. Returning [`TreeError::BadEncoding`]
    /// asks the parser to fall back to its default encoding.
    ///
    /// # Errors
    ///
    /// [`TreeError::BadEncoding`] when the handler cannot accept `charset`.
    fn encoding_change(&mut self, _charset: &str) -> Result<(), TreeError> {
        Ok(())
    }

    /// A script element's end tag was seen.
    ///
    /// # Errors
    ///
    /// Any handler failure; parsing stops.
    fn complete_script(&mut self, _script: &Self::Handle) -> Result<ScriptResult, TreeError> {
        Ok(ScriptResult::Continue)
    }
}
