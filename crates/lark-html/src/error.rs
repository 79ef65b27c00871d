//! Error, status and diagnostic types shared by the tokenizer and the tree
//! builder.

use std::fmt;

use lark_dom::TreeError;
use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

/// Fatal or recoverable failures of a parser run.
///
/// Malformed markup is never an error; it is reported as a [`ParseError`]
/// and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    /// The caller misused the API.
    #[error("bad parameter: {0}")]
    BadParm(&'static str),
    /// A buffer could not grow.
    #[error("out of memory")]
    NoMem,
    /// The selected charset cannot be decoded. Switch to the fallback
    /// encoding and resume; this is recoverable once per parse.
    #[error("unsupported character encoding")]
    BadEncoding,
    /// The tree handler failed.
    #[error(transparent)]
    Tree(TreeError),
}

impl From<TreeError> for ParserError {
    fn from(error: TreeError) -> Self {
        match error {
            TreeError::BadEncoding => Self::BadEncoding,
            other => Self::Tree(other),
        }
    }
}

/// Why a run of the tokenizer returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunStatus {
    /// All available input is consumed; append more and run again.
    NeedData,
    /// A pause was requested; resume to continue.
    Paused,
    /// The end-of-file token has been emitted.
    Complete,
}

/// Line and column (both 1-based, column counted in characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Line number.
    pub line: usize,
    /// Column number.
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Location {
    /// Advance past `text`.
    pub fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Parse error identifiers. Tokenizer codes follow the WHATWG names; tree
/// construction codes describe the offending token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
#[allow(missing_docs)]
pub enum ParseErrorCode {
    // Tokenizer
    UnexpectedNullCharacter,
    EofBeforeTagName,
    EofInTag,
    InvalidFirstCharacterOfTagName,
    MissingEndTagName,
    UnexpectedQuestionMarkInsteadOfTagName,
    UnexpectedCharacterInAttributeName,
    UnexpectedEqualsSignBeforeAttributeName,
    MissingAttributeValue,
    UnexpectedCharacterInUnquotedAttributeValue,
    MissingWhitespaceBetweenAttributes,
    UnexpectedSolidusInTag,
    DuplicateAttribute,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    IncorrectlyOpenedComment,
    AbruptClosingOfEmptyComment,
    IncorrectlyClosedComment,
    EofInComment,
    EofInDoctype,
    MissingWhitespaceBeforeDoctypeName,
    MissingDoctypeName,
    InvalidCharacterSequenceAfterDoctypeName,
    MissingQuoteBeforeDoctypePublicIdentifier,
    MissingDoctypePublicIdentifier,
    AbruptDoctypePublicIdentifier,
    MissingQuoteBeforeDoctypeSystemIdentifier,
    MissingDoctypeSystemIdentifier,
    AbruptDoctypeSystemIdentifier,
    UnexpectedCharacterAfterDoctypeSystemIdentifier,
    EofInCdata,
    MissingSemicolonAfterCharacterReference,
    AbsenceOfDigitsInNumericCharacterReference,
    InvalidNumericCharacterReference,
    // Tree construction
    UnexpectedDoctype,
    NonConformingDoctype,
    MissingDoctype,
    UnexpectedStartTag,
    UnexpectedEndTag,
    UnexpectedCharacter,
    UnexpectedEof,
    MisnestedTag,
    NonVoidElementSelfClosing,
}

/// A parse error with the location of the input that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub code: ParseErrorCode,
    /// Where it went wrong.
    pub location: Location,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.code)
    }
}

/// Callback receiving parse errors.
pub type ErrorHandler = Box<dyn FnMut(&ParseError)>;

/// Deliver a parse error to `handler`, or to the `log` facade when no
/// handler is configured.
pub(crate) fn report(handler: &mut Option<ErrorHandler>, error: &ParseError) {
    match handler {
        Some(handler) => handler(error),
        None => log::debug!(target: "lark_html::parse_error", "{error}"),
    }
}
