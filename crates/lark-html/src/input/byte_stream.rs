//! Demand-driven decoding of raw byte chunks.

use std::collections::VecDeque;

use encoding_rs::{CoderResult, Decoder, Encoding, REPLACEMENT, UTF_8, WINDOWS_1252};
use lark_common::warning::warn_once;
use strum_macros::Display;

use super::{InputStream, Peek};
use crate::error::ParserError;

/// Consumed text is dropped from the window once the read position passes
/// this many bytes.
const COMPACT_THRESHOLD: usize = 8 * 1024;

/// Scratch space for one decode step; large enough for any single byte's
/// worth of output in every encoding `encoding_rs` supports.
const SCRATCH_LEN: usize = 32;

/// Where the charset in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CharsetSource {
    /// Nothing was configured; UTF-8 is assumed.
    Default,
    /// Supplied by the embedder.
    Configured,
    /// The configured charset was unusable and Windows-1252 replaced it.
    Fallback,
}

/// How far the end of input has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputEnd {
    /// More chunks may arrive.
    Open,
    /// An empty chunk was appended.
    Marked,
    /// The decoder has been flushed after the last byte.
    Flushed,
}

/// Raw position at which a run of decoded output starts.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    text: usize,
    raw: usize,
    after_cr: bool,
}

/// [`InputStream`] over appended byte chunks, decoded with `encoding_rs`.
///
/// Decoding happens one raw byte at a time and only as far as the tokenizer
/// peeks, so switching to the fallback encoding re-decodes everything the
/// tokenizer has not consumed yet.
pub struct ByteInputStream {
    raw: Vec<u8>,
    raw_pos: usize,
    encoding: &'static Encoding,
    source: CharsetSource,
    decoder: Decoder,
    /// Decoded window; `cursor` is the read position within it.
    text: String,
    cursor: usize,
    scratch: String,
    checkpoints: VecDeque<Checkpoint>,
    /// Raw offset and CR state right after the last step that produced text.
    batch_raw: usize,
    batch_after_cr: bool,
    after_cr: bool,
    end: InputEnd,
}

impl ByteInputStream {
    /// Create a stream for the charset named by `label`, or UTF-8 when no
    /// label is given. Unknown labels fall back to Windows-1252 right away.
    #[must_use]
    pub fn new(label: Option<&str>) -> Self {
        let (encoding, source) = match label {
            None => (UTF_8, CharsetSource::Default),
            Some(label) => match Encoding::for_label(label.trim().as_bytes()) {
                Some(encoding) => (encoding, CharsetSource::Configured),
                None => {
                    let _ = warn_once(
                        "Input",
                        &format!("unknown charset label '{label}', using windows-1252"),
                    );
                    (WINDOWS_1252, CharsetSource::Fallback)
                }
            },
        };
        Self::with_encoding(encoding, source)
    }

    /// Create a stream for a known encoding.
    #[must_use]
    pub fn with_encoding(encoding: &'static Encoding, source: CharsetSource) -> Self {
        Self {
            raw: Vec::new(),
            raw_pos: 0,
            encoding,
            source,
            decoder: encoding.new_decoder_with_bom_removal(),
            text: String::new(),
            cursor: 0,
            scratch: "\0".repeat(SCRATCH_LEN),
            checkpoints: VecDeque::new(),
            batch_raw: 0,
            batch_after_cr: false,
            after_cr: false,
            end: InputEnd::Open,
        }
    }

    /// Switch to Windows-1252 and re-decode from the first character the
    /// tokenizer has not consumed.
    ///
    /// # Errors
    ///
    /// [`ParserError::BadEncoding`] if the fallback is already in use.
    pub fn use_fallback(&mut self) -> Result<(), ParserError> {
        if self.source == CharsetSource::Fallback {
            return Err(ParserError::BadEncoding);
        }
        let _ = warn_once(
            "Input",
            &format!("charset {} unsupported, using windows-1252", self.encoding.name()),
        );

        let rewind = self
            .checkpoints
            .iter()
            .find(|c| c.text >= self.cursor)
            .copied()
            .unwrap_or(Checkpoint {
                text: self.text.len(),
                raw: self.batch_raw,
                after_cr: self.batch_after_cr,
            });
        self.text.truncate(rewind.text);
        self.checkpoints.retain(|c| c.text < rewind.text);
        self.raw_pos = rewind.raw;
        self.batch_raw = rewind.raw;
        self.batch_after_cr = rewind.after_cr;
        self.after_cr = rewind.after_cr;

        self.encoding = WINDOWS_1252;
        self.source = CharsetSource::Fallback;
        self.decoder = WINDOWS_1252.new_decoder_without_bom_handling();
        if self.end == InputEnd::Flushed {
            self.end = InputEnd::Marked;
        }
        Ok(())
    }

    /// Decode one more raw byte (or flush the decoder at end of input).
    /// Returns false when nothing can be decoded until more input arrives.
    fn decode_step(&mut self) -> bool {
        let last = if self.raw_pos < self.raw.len() {
            false
        } else if self.end == InputEnd::Marked {
            self.end = InputEnd::Flushed;
            true
        } else {
            return false;
        };
        let end = (self.raw_pos + 1).min(self.raw.len());
        let mut src = &self.raw[self.raw_pos..end];
        let text_before = self.text.len();

        loop {
            let (status, read, written, _) =
                self.decoder
                    .decode_to_str(src, self.scratch.as_mut_str(), last);
            for c in self.scratch[..written].chars() {
                match c {
                    '\r' => {
                        self.text.push('\n');
                        self.after_cr = true;
                    }
                    '\n' if self.after_cr => self.after_cr = false,
                    other => {
                        self.text.push(other);
                        self.after_cr = false;
                    }
                }
            }
            self.raw_pos += read;
            src = &src[read..];
            if status == CoderResult::InputEmpty {
                break;
            }
        }

        if self.text.len() > text_before {
            self.checkpoints.push_back(Checkpoint {
                text: text_before,
                raw: self.batch_raw,
                after_cr: self.batch_after_cr,
            });
            self.batch_raw = self.raw_pos;
            self.batch_after_cr = self.after_cr;
        }
        true
    }

    /// Drop consumed text and raw bytes that no rewind can reach.
    fn compact(&mut self) {
        if self.cursor < COMPACT_THRESHOLD {
            return;
        }
        let raw_floor = self.checkpoints.front().map_or(self.batch_raw, |c| c.raw);
        let _ = self.text.drain(..self.cursor);
        let _ = self.raw.drain(..raw_floor);
        for checkpoint in &mut self.checkpoints {
            checkpoint.text = checkpoint.text.saturating_sub(self.cursor);
            checkpoint.raw -= raw_floor;
        }
        self.raw_pos -= raw_floor;
        self.batch_raw -= raw_floor;
        self.cursor = 0;
    }
}

impl InputStream for ByteInputStream {
    fn peek(&mut self, offset: usize) -> Result<Peek, ParserError> {
        let start = self.cursor + offset;
        loop {
            if let Some(c) = self.text.get(start..).and_then(|rest| rest.chars().next()) {
                return Ok(Peek::Char(c));
            }
            if self.encoding == REPLACEMENT {
                return Err(ParserError::BadEncoding);
            }
            if !self.decode_step() {
                return Ok(if self.end == InputEnd::Open {
                    Peek::NeedData
                } else {
                    Peek::Eof
                });
            }
        }
    }

    fn advance(&mut self, len: usize) {
        self.cursor = (self.cursor + len).min(self.text.len());
        // Keep the checkpoint of the run the cursor sits in.
        while self.checkpoints.len() > 1 && self.checkpoints[1].text <= self.cursor {
            let _ = self.checkpoints.pop_front();
        }
        self.compact();
    }

    fn slice(&self, offset: usize, len: usize) -> &str {
        let start = self.cursor + offset;
        self.text.get(start..start + len).unwrap_or_default()
    }

    fn append(&mut self, data: &[u8]) -> Result<(), ParserError> {
        if self.end != InputEnd::Open {
            return Err(ParserError::BadParm("input appended after end of file"));
        }
        if data.is_empty() {
            self.end = InputEnd::Marked;
            return Ok(());
        }
        self.raw
            .try_reserve(data.len())
            .map_err(|_| ParserError::NoMem)?;
        self.raw.extend_from_slice(data);
        Ok(())
    }

    fn charset(&self) -> (&'static Encoding, CharsetSource) {
        (self.encoding, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(stream: &mut ByteInputStream) -> String {
        let mut out = String::new();
        while let Ok(Peek::Char(c)) = stream.peek(0) {
            out.push(c);
            stream.advance(c.len_utf8());
        }
        out
    }

    #[test]
    fn test_crlf_normalized_across_chunks() {
        let mut stream = ByteInputStream::new(None);
        stream.append(b"a\r").unwrap();
        assert_eq!(drain(&mut stream), "a\n");
        stream.append(b"\nb\rc").unwrap();
        stream.append(b"").unwrap();
        assert_eq!(drain(&mut stream), "b\nc");
        assert_eq!(stream.peek(0), Ok(Peek::Eof));
    }

    #[test]
    fn test_split_multibyte_sequence() {
        let mut stream = ByteInputStream::new(Some("utf-8"));
        stream.append(&[0xC3]).unwrap();
        assert_eq!(stream.peek(0), Ok(Peek::NeedData));
        stream.append(&[0xA9]).unwrap();
        assert_eq!(stream.peek(0), Ok(Peek::Char('é')));
    }

    #[test]
    fn test_truncated_sequence_at_eof_becomes_replacement() {
        let mut stream = ByteInputStream::new(None);
        stream.append(&[b'x', 0xE2, 0x82]).unwrap();
        stream.append(b"").unwrap();
        assert_eq!(drain(&mut stream), "x\u{FFFD}");
    }

    #[test]
    fn test_replacement_encoding_is_unsupported() {
        let mut stream = ByteInputStream::new(Some("iso-2022-kr"));
        stream.append(b"abc").unwrap();
        assert_eq!(stream.peek(0), Err(ParserError::BadEncoding));

        stream.use_fallback().unwrap();
        assert_eq!(stream.charset().1, CharsetSource::Fallback);
        assert_eq!(drain(&mut stream), "abc");
        assert_eq!(stream.use_fallback(), Err(ParserError::BadEncoding));
    }

    #[test]
    fn test_fallback_redecodes_unconsumed_bytes() {
        let mut stream = ByteInputStream::new(Some("utf-8"));
        stream.append(&[b'a', 0xE9, b'b']).unwrap();
        assert_eq!(stream.peek(0), Ok(Peek::Char('a')));
        stream.advance(1);
        // Peek ahead so the bad byte has been decoded once already.
        assert_eq!(stream.peek(0), Ok(Peek::Char('\u{FFFD}')));

        stream.use_fallback().unwrap();
        assert_eq!(drain(&mut stream), "éb");
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let stream = ByteInputStream::new(Some("no-such-charset"));
        assert_eq!(stream.charset(), (WINDOWS_1252, CharsetSource::Fallback));
    }

    #[test]
    fn test_append_after_eof_is_bad_parm() {
        let mut stream = ByteInputStream::new(None);
        stream.append(b"").unwrap();
        assert!(matches!(stream.append(b"x"), Err(ParserError::BadParm(_))));
    }
}
