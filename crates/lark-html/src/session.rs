//! The parser session: input stream, tokenizer and tree builder wired
//! together behind a chunked byte interface.

use encoding_rs::Encoding;
use lark_common::warning::clear_warnings;
use lark_dom::{DomTree, QuirksMode, TreeHandler};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorHandler, ParserError, RunStatus};
use crate::input::{ByteInputStream, CharsetSource, InputStream};
use crate::parser::{InsertionMode, TreeBuilder, TreeBuilderOptions};
use crate::tokenizer::{ContentModel, HTMLTokenizer, TokenizerOptions};

/// Everything a parser session is configured with up front.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Charset label of the input. UTF-8 when absent.
    pub encoding: Option<String>,
    /// Tokenizer settings.
    pub tokenizer: TokenizerOptions,
    /// Tree construction settings.
    pub tree_builder: TreeBuilderOptions,
}

impl ParserOptions {
    /// Decode the input with the charset named by `label`.
    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Parse as if scripting were enabled (`<noscript>` becomes raw text).
    #[must_use]
    pub const fn with_scripting(mut self, enabled: bool) -> Self {
        self.tree_builder.scripting_enabled = enabled;
        self
    }

    /// Start the tokenizer in `model`.
    #[must_use]
    pub const fn with_content_model(mut self, model: ContentModel) -> Self {
        self.tokenizer.initial_content_model = model;
        self
    }

    /// Recognise `<![CDATA[` sections everywhere.
    #[must_use]
    pub const fn with_process_cdata(mut self, process: bool) -> Self {
        self.tokenizer.process_cdata = process;
        self
    }
}

/// An incremental HTML parse into a [`TreeHandler`].
///
/// Feed byte chunks with [`HTMLParser::parse_chunk`] and finish with
/// [`HTMLParser::completed`]. Every call tokenizes as far as the input
/// goes; the tree is built as tokens are emitted.
///
/// ```ignore
/// let mut tree = DomTree::new();
/// let root = tree.root();
/// let mut parser = HTMLParser::new(tree, root, ParserOptions::default())?;
/// parser.parse_chunk(b"<p>hello")?;
/// parser.completed()?;
/// let tree = parser.into_handler()?;
/// ```
pub struct HTMLParser<H: TreeHandler> {
    input: ByteInputStream,
    tokenizer: HTMLTokenizer,
    builder: TreeBuilder<H>,
}

impl<H: TreeHandler> HTMLParser<H> {
    /// Create a session that builds under `document`.
    ///
    /// # Errors
    ///
    /// Fails if the handler rejects the reference taken on `document`.
    pub fn new(handler: H, document: H::Handle, options: ParserOptions) -> Result<Self, ParserError> {
        let ParserOptions {
            encoding,
            tokenizer,
            tree_builder,
        } = options;
        clear_warnings();
        Ok(Self {
            input: ByteInputStream::new(encoding.as_deref()),
            tokenizer: HTMLTokenizer::new(tokenizer),
            builder: TreeBuilder::new(handler, document, tree_builder)?,
        })
    }

    /// Append a chunk of bytes and parse as far as possible. An empty chunk
    /// marks the end of input, like [`HTMLParser::completed`].
    ///
    /// # Errors
    ///
    /// [`ParserError::BadParm`] for data after the end of input, handler
    /// failures, and [`ParserError::BadEncoding`] when the input cannot be
    /// decoded even with the fallback charset.
    pub fn parse_chunk(&mut self, data: &[u8]) -> Result<RunStatus, ParserError> {
        self.input.append(data)?;
        self.run()
    }

    /// Mark the end of input and parse what is left.
    ///
    /// # Errors
    ///
    /// See [`HTMLParser::parse_chunk`].
    pub fn completed(&mut self) -> Result<RunStatus, ParserError> {
        self.parse_chunk(&[])
    }

    /// Stop at the next token boundary.
    pub const fn pause(&mut self) {
        self.tokenizer.pause();
    }

    /// Continue after a pause, parsing whatever input is buffered.
    ///
    /// # Errors
    ///
    /// See [`HTMLParser::parse_chunk`].
    pub fn resume(&mut self) -> Result<RunStatus, ParserError> {
        self.tokenizer.resume();
        self.run()
    }

    /// Whether a pause is in effect.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.tokenizer.is_paused()
    }

    /// Switch the input to Windows-1252, re-decoding everything not yet
    /// tokenized.
    ///
    /// # Errors
    ///
    /// [`ParserError::BadEncoding`] if the fallback is already in use.
    pub fn use_fallback_encoding(&mut self) -> Result<(), ParserError> {
        self.input.use_fallback()
    }

    /// Charset in use and where it came from.
    #[must_use]
    pub fn charset(&self) -> (&'static Encoding, CharsetSource) {
        self.input.charset()
    }

    /// Route parse errors (tokenizer and tree builder) to `handler`.
    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.builder.set_error_handler(handler);
    }

    /// Override the tokenizer's content model.
    pub fn set_content_model(&mut self, model: ContentModel) {
        self.tokenizer.set_content_model(model);
    }

    /// Toggle `<![CDATA[` recognition outside foreign content.
    pub const fn set_process_cdata(&mut self, process: bool) {
        self.tokenizer.set_process_cdata(process);
    }

    /// Current insertion mode.
    #[must_use]
    pub const fn insertion_mode(&self) -> InsertionMode {
        self.builder.mode()
    }

    /// Document mode picked from the DOCTYPE.
    #[must_use]
    pub const fn quirks_mode(&self) -> QuirksMode {
        self.builder.quirks_mode()
    }

    /// Borrow the tree handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        self.builder.handler()
    }

    /// Release every reference the tree builder holds and hand back the
    /// tree handler.
    ///
    /// # Errors
    ///
    /// Handler failures while releasing references.
    pub fn into_handler(self) -> Result<H, ParserError> {
        self.builder.into_handler()
    }

    /// Tokenize until the input runs dry, retrying once with the fallback
    /// charset when decoding fails.
    fn run(&mut self) -> Result<RunStatus, ParserError> {
        loop {
            match self.tokenizer.run(&mut self.input, &mut self.builder) {
                Err(ParserError::BadEncoding) => {
                    log::debug!(target: "lark_html::parser", "retrying with fallback encoding");
                    self.input.use_fallback()?;
                }
                result => return result,
            }
        }
    }
}

/// Parse a complete document into `handler` under `document`, resuming
/// after every pause the handler asks for (a script end tag, say) until
/// the end-of-file token has been processed.
///
/// # Errors
///
/// See [`HTMLParser::parse_chunk`].
pub fn parse_with<H: TreeHandler>(
    handler: H,
    document: H::Handle,
    input: &[u8],
    options: ParserOptions,
) -> Result<H, ParserError> {
    let mut parser = HTMLParser::new(handler, document, options)?;
    let _ = parser.parse_chunk(input)?;
    let mut status = parser.completed()?;
    while status == RunStatus::Paused {
        status = parser.resume()?;
    }
    parser.into_handler()
}

/// Parse a complete document into a fresh [`DomTree`].
///
/// # Errors
///
/// See [`HTMLParser::parse_chunk`].
pub fn parse_document(input: &[u8], options: ParserOptions) -> Result<DomTree, ParserError> {
    let tree = DomTree::new();
    let root = tree.root();
    parse_with(tree, root, input, options)
}
