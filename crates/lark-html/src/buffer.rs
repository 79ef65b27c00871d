//! Growable text buffer used for comment data and pending table text.

use std::fmt;

use crate::error::ParserError;

/// An owned, growable UTF-8 buffer.
///
/// Appends report [`ParserError::NoMem`] instead of aborting when the
/// allocation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    data: String,
}

impl TextBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// Append a string.
    ///
    /// # Errors
    ///
    /// [`ParserError::NoMem`] if the buffer cannot grow.
    pub fn append(&mut self, text: &str) -> Result<(), ParserError> {
        self.data
            .try_reserve(text.len())
            .map_err(|_| ParserError::NoMem)?;
        self.data.push_str(text);
        Ok(())
    }

    /// Append one character.
    ///
    /// # Errors
    ///
    /// [`ParserError::NoMem`] if the buffer cannot grow.
    pub fn push(&mut self, c: char) -> Result<(), ParserError> {
        self.data
            .try_reserve(c.len_utf8())
            .map_err(|_| ParserError::NoMem)?;
        self.data.push(c);
        Ok(())
    }

    /// Drop the contents, keeping the allocation.
    pub fn discard(&mut self) {
        self.data.clear();
    }

    /// Borrow the contents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_discard() {
        let mut buffer = TextBuffer::new();
        buffer.append("ab").unwrap();
        buffer.push('ç').unwrap();
        assert_eq!(buffer.as_str(), "abç");
        assert_eq!(buffer.len(), 4);
        buffer.discard();
        assert!(buffer.is_empty());
    }
}
