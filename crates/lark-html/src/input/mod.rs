//! Input streams feeding the tokenizer.
//!
//! [§ 13.2.3 The input byte stream](https://html.spec.whatwg.org/multipage/parsing.html#the-input-byte-stream)
//!
//! The tokenizer only ever looks at decoded text through [`InputStream`]:
//! it peeks ahead of the read position without consuming, and advances once
//! a token has been emitted. Everything between the read position and the
//! furthest peek stays buffered, which is what lets a run stop with
//! `NeedData` in the middle of a tag and resume after the next chunk.

mod byte_stream;

pub use byte_stream::{ByteInputStream, CharsetSource};

use encoding_rs::Encoding;

use crate::error::ParserError;

/// Result of peeking at the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peek {
    /// The character at the requested offset.
    Char(char),
    /// The offset is past the decoded data and more input may still arrive.
    NeedData,
    /// The offset is past the end of the document.
    Eof,
}

/// Decoded, newline-normalized text with a read position.
///
/// Implementations deliver text with every CR and CRLF already turned into
/// a single LF. Offsets are in UTF-8 bytes relative to the read position
/// and always fall on character boundaries.
pub trait InputStream {
    /// Look at the character `offset` bytes past the read position.
    ///
    /// # Errors
    ///
    /// [`ParserError::BadEncoding`] if the current charset cannot be decoded.
    fn peek(&mut self, offset: usize) -> Result<Peek, ParserError>;

    /// Consume `len` bytes.
    fn advance(&mut self, len: usize);

    /// Borrow `len` bytes of already-peeked text starting `offset` bytes past
    /// the read position.
    fn slice(&self, offset: usize, len: usize) -> &str;

    /// Append a chunk of raw bytes. An empty chunk marks the end of input.
    ///
    /// # Errors
    ///
    /// [`ParserError::BadParm`] after the end of input was marked,
    /// [`ParserError::NoMem`] if the buffer cannot grow.
    fn append(&mut self, data: &[u8]) -> Result<(), ParserError>;

    /// The charset in use and where it came from.
    fn charset(&self) -> (&'static Encoding, CharsetSource);
}
