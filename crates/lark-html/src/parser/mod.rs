//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//!
//! The tree builder consumes tokens and drives a [`lark_dom::TreeHandler`].
//! Each insertion mode lives in its own file; the shared state, node
//! insertion and the dispatch loop live in `core`.

mod after;
mod body;
mod core;
mod element_type;
mod formatting;
mod head;
mod quirks;
mod select;
mod stack;
mod table;

/// SVG and `MathML` adjustments and the foreign content rules.
pub mod foreign_content;

pub use self::core::{InsertionMode, TreeBuilder, TreeBuilderOptions};
pub use element_type::ElementType;
pub use quirks::quirks_mode_for;
