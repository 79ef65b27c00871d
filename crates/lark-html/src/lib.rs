//! Incremental HTML tokenizer and tree builder for the Lark engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **Entity resolution** ([WHATWG § 13.5](https://html.spec.whatwg.org/multipage/named-characters.html#named-character-references)):
//!   an incremental longest-prefix matcher over the named character
//!   reference table.
//! - **Input decoding** ([WHATWG § 13.2.3](https://html.spec.whatwg.org/multipage/parsing.html#the-input-byte-stream)):
//!   chunked bytes decoded on demand with `encoding_rs`, newline
//!   normalization and a Windows-1252 fallback.
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)):
//!   a resumable state machine with PCDATA/RCDATA/CDATA/PLAINTEXT content
//!   models that returns `NeedData` mid-token and picks up where it left
//!   off.
//! - **Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)):
//!   insertion modes, active formatting elements and the adoption agency
//!   algorithm, foster parenting, SVG and `MathML` foreign content and quirks
//!   mode selection, all driven through a [`lark_dom::TreeHandler`].
//!
//! # Not Implemented
//!
//! - `<template>` contents (templates are ordinary elements)
//! - Fragment parsing
//! - Encoding sniffing beyond `<meta>` declarations

/// Growable text buffer for pending token text.
pub mod buffer;
/// Named character reference resolution.
pub mod entities;
/// Errors, run status and parse error reporting.
pub mod error;
/// Byte input decoding.
pub mod input;
/// Tree construction.
pub mod parser;
/// Parser session wiring input, tokenizer and tree builder.
pub mod session;
/// HTML tokenizer.
pub mod tokenizer;

pub use error::{ErrorHandler, Location, ParseError, ParseErrorCode, ParserError, RunStatus};
pub use parser::{InsertionMode, TreeBuilder, TreeBuilderOptions};
pub use session::{HTMLParser, ParserOptions, parse_document, parse_with};
pub use tokenizer::{ContentModel, HTMLTokenizer, Token, TokenSink, TokenizerOptions};
