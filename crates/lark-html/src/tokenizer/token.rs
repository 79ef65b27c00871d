use core::fmt;

use lark_dom::{Doctype, Tag};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{Location, ParseError, ParserError};

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "The output of the tokenization step is a series of zero or more of the following
/// tokens: DOCTYPE, start tag, end tag, comment, character, end-of-file."
///
/// Tokens borrow from the tokenizer and the input window, so they are only
/// valid for the duration of one [`TokenSink::process_token`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// "DOCTYPE tokens have a name, a public identifier, a system identifier,
    /// and a force-quirks flag."
    Doctype(&'a Doctype),
    /// "Start and end tag tokens have a tag name, a self-closing flag, and a
    /// list of attributes"
    StartTag(&'a Tag),
    /// End tag token. Same structure as a start tag.
    EndTag(&'a Tag),
    /// "Comment and character tokens have data."
    Comment(&'a str),
    /// A run of character data. Consecutive runs may be split arbitrarily;
    /// only their concatenation is meaningful.
    Character(&'a str),
    /// End of file.
    Eof,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctype(doctype) => {
                write!(f, "DOCTYPE")?;
                if let Some(name) = &doctype.name {
                    write!(f, " {name}")?;
                }
                if let Some(public_id) = &doctype.public_id {
                    write!(f, " PUBLIC \"{public_id}\"")?;
                }
                if let Some(system_id) = &doctype.system_id {
                    write!(f, " SYSTEM \"{system_id}\"")?;
                }
                if doctype.force_quirks {
                    write!(f, " (force-quirks)")?;
                }
                Ok(())
            }
            Self::StartTag(tag) => {
                write!(f, "<{}", tag.name)?;
                for attr in &tag.attributes {
                    write!(f, " {}=\"{}\"", attr.name, attr.value)?;
                }
                if tag.self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag(tag) => write!(f, "</{}>", tag.name),
            Self::Comment(data) => write!(f, "<!--{data}-->"),
            Self::Character(data) => write!(f, "{data:?}"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

/// Content model flag. Decides which of `<` and `&` start markup in the
/// data state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentModel {
    /// Normal markup: tags and character references.
    #[default]
    #[strum(serialize = "PCDATA")]
    Pcdata,
    /// Character references but only the matching end tag (`title`, `textarea`).
    #[strum(serialize = "RCDATA")]
    Rcdata,
    /// Only the matching end tag (`script`, `style` and friends).
    #[strum(serialize = "CDATA")]
    Cdata,
    /// Everything to the end of input is text.
    #[strum(serialize = "PLAINTEXT")]
    Plaintext,
}

/// What the tokenizer should do after a token was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkFeedback {
    /// Carry on.
    #[default]
    Continue,
    /// Switch the content model before reading the next character. Also
    /// clears the escape flag.
    ContentModel(ContentModel),
    /// Stop after this token; the run returns
    /// [`RunStatus::Paused`](crate::error::RunStatus::Paused).
    Pause,
}

/// Receiver of tokens and tokenizer parse errors.
///
/// The tree builder is the usual sink. Tests implement it to record tokens.
pub trait TokenSink {
    /// Handle one token.
    ///
    /// # Errors
    ///
    /// Any error aborts the run and is returned to the caller. The token
    /// counts as consumed either way.
    fn process_token(
        &mut self,
        token: Token<'_>,
        location: Location,
    ) -> Result<SinkFeedback, ParserError>;

    /// Handle a tokenizer parse error.
    fn report_error(&mut self, error: ParseError) {
        log::debug!(target: "lark_html::parse_error", "{error}");
    }

    /// Whether `<![CDATA[` sections are recognised at the current position.
    /// The tree builder allows them inside foreign content.
    fn cdata_allowed(&self) -> bool {
        false
    }
}
