//! HTML tokenizer module.
//!
//! Implements [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! as an incremental state machine over an [`InputStream`](crate::input::InputStream).
//! Tokens are pushed to a [`TokenSink`] one at a time; the sink's
//! [`SinkFeedback`] switches the content model or pauses the run.

/// Character reference states.
mod character_reference;
/// HTML tokenizer state machine implementation.
pub mod core;
/// Helper methods for emission and lookahead.
mod helpers;
/// Comment, DOCTYPE and CDATA states.
mod markup;
/// Tag and attribute states.
mod tag;
/// Token types produced by the tokenizer.
pub mod token;

pub use self::core::{HTMLTokenizer, TokenizerOptions, TokenizerState};
pub use self::token::{ContentModel, SinkFeedback, Token, TokenSink};
