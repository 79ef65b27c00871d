//! Integration tests for the HTML tokenizer.

use lark_html::error::{Location, ParseError, ParseErrorCode, ParserError, RunStatus};
use lark_html::input::{ByteInputStream, InputStream};
use lark_html::tokenizer::{ContentModel, HTMLTokenizer, SinkFeedback, Token, TokenSink, TokenizerOptions};
use serde_json::{Value, json};

/// Owned copy of a token, with adjacent character runs merged.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Recorded {
    Doctype {
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
        force_quirks: bool,
    },
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Character(String),
    Eof,
}

/// Sink that records every token and parse error. Start tags named in
/// `raw_text` switch the tokenizer into the given content model, the way
/// the tree builder does for `<title>` and `<script>`.
#[derive(Default)]
struct RecordingSink {
    tokens: Vec<Recorded>,
    errors: Vec<ParseErrorCode>,
    raw_text: Vec<(&'static str, ContentModel)>,
    pause_after: Option<&'static str>,
    pause_every: bool,
}

impl TokenSink for RecordingSink {
    fn process_token(
        &mut self,
        token: Token<'_>,
        _location: Location,
    ) -> Result<SinkFeedback, ParserError> {
        let mut feedback = SinkFeedback::Continue;
        let recorded = match token {
            Token::Doctype(doctype) => Recorded::Doctype {
                name: doctype.name.clone(),
                public_id: doctype.public_id.clone(),
                system_id: doctype.system_id.clone(),
                force_quirks: doctype.force_quirks,
            },
            Token::StartTag(tag) => {
                if let Some(&(_, model)) = self.raw_text.iter().find(|(n, _)| *n == tag.name) {
                    feedback = SinkFeedback::ContentModel(model);
                }
                if self.pause_after == Some(tag.name.as_str()) {
                    feedback = SinkFeedback::Pause;
                }
                Recorded::StartTag {
                    name: tag.name.clone(),
                    attributes: tag
                        .attributes
                        .iter()
                        .map(|a| (a.name.clone(), a.value.clone()))
                        .collect(),
                    self_closing: tag.self_closing,
                }
            }
            Token::EndTag(tag) => Recorded::EndTag(tag.name.clone()),
            Token::Comment(data) => Recorded::Comment(data.to_string()),
            Token::Character(text) => {
                if let Some(Recorded::Character(previous)) = self.tokens.last_mut() {
                    previous.push_str(text);
                    if self.pause_every {
                        feedback = SinkFeedback::Pause;
                    }
                    return Ok(feedback);
                }
                Recorded::Character(text.to_string())
            }
            Token::Eof => Recorded::Eof,
        };
        self.tokens.push(recorded);
        if self.pause_every {
            feedback = SinkFeedback::Pause;
        }
        Ok(feedback)
    }

    fn report_error(&mut self, error: ParseError) {
        self.errors.push(error.code);
    }
}

/// Helper to tokenize a complete document in one chunk.
fn tokenize_with(input: &str, mut sink: RecordingSink) -> RecordingSink {
    let mut stream = ByteInputStream::new(None);
    let mut tokenizer = HTMLTokenizer::new(TokenizerOptions::default());
    stream.append(input.as_bytes()).unwrap();
    stream.append(&[]).unwrap();
    let status = tokenizer.run(&mut stream, &mut sink).unwrap();
    assert_eq!(status, RunStatus::Complete);
    sink
}

fn tokenize(input: &str) -> Vec<Recorded> {
    tokenize_with(input, RecordingSink::default()).tokens
}

fn chars(text: &str) -> Recorded {
    Recorded::Character(text.to_string())
}

fn start(name: &str) -> Recorded {
    Recorded::StartTag {
        name: name.to_string(),
        attributes: Vec::new(),
        self_closing: false,
    }
}

fn end(name: &str) -> Recorded {
    Recorded::EndTag(name.to_string())
}

#[test]
fn test_plain_text() {
    assert_eq!(tokenize("Hello"), vec![chars("Hello"), Recorded::Eof]);
}

#[test]
fn test_empty_input() {
    assert_eq!(tokenize(""), vec![Recorded::Eof]);
}

#[test]
fn test_paragraph() {
    assert_eq!(
        tokenize("<p>hi</p>"),
        vec![start("p"), chars("hi"), end("p"), Recorded::Eof]
    );
}

#[test]
fn test_tag_names_are_lowercased() {
    assert_eq!(
        tokenize("<DiV></DIV>"),
        vec![start("div"), end("div"), Recorded::Eof]
    );
}

#[test]
fn test_doctype() {
    let tokens = tokenize("<!DOCTYPE html>");
    assert_eq!(
        tokens[0],
        Recorded::Doctype {
            name: Some("html".to_string()),
            public_id: None,
            system_id: None,
            force_quirks: false,
        }
    );
}

#[test]
fn test_doctype_with_identifiers() {
    let tokens = tokenize(
        "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">",
    );
    assert_eq!(
        tokens[0],
        Recorded::Doctype {
            name: Some("html".to_string()),
            public_id: Some("-//W3C//DTD HTML 4.01//EN".to_string()),
            system_id: Some("http://www.w3.org/TR/html4/strict.dtd".to_string()),
            force_quirks: false,
        }
    );
}

#[test]
fn test_doctype_without_name_forces_quirks() {
    let tokens = tokenize("<!DOCTYPE>");
    match &tokens[0] {
        Recorded::Doctype { force_quirks, .. } => assert!(force_quirks),
        other => panic!("Expected DOCTYPE token, got {other:?}"),
    }
}

#[test]
fn test_attributes() {
    let tokens = tokenize("<a href=\"x\" title='y' data-z=w checked>");
    assert_eq!(
        tokens[0],
        Recorded::StartTag {
            name: "a".to_string(),
            attributes: vec![
                ("href".to_string(), "x".to_string()),
                ("title".to_string(), "y".to_string()),
                ("data-z".to_string(), "w".to_string()),
                ("checked".to_string(), String::new()),
            ],
            self_closing: false,
        }
    );
}

#[test]
fn test_duplicate_attribute_first_wins() {
    let sink = tokenize_with("<p id=a id=b>", RecordingSink::default());
    assert_eq!(
        sink.tokens[0],
        Recorded::StartTag {
            name: "p".to_string(),
            attributes: vec![("id".to_string(), "a".to_string())],
            self_closing: false,
        }
    );
    assert!(sink.errors.contains(&ParseErrorCode::DuplicateAttribute));
}

#[test]
fn test_self_closing_tag() {
    let tokens = tokenize("<br/>");
    assert_eq!(
        tokens[0],
        Recorded::StartTag {
            name: "br".to_string(),
            attributes: Vec::new(),
            self_closing: true,
        }
    );
}

#[test]
fn test_comment() {
    assert_eq!(
        tokenize("<!-- hello -->"),
        vec![Recorded::Comment(" hello ".to_string()), Recorded::Eof]
    );
}

#[test]
fn test_bogus_comment_from_question_mark() {
    let sink = tokenize_with("<?xml version?>", RecordingSink::default());
    assert_eq!(sink.tokens[0], Recorded::Comment("?xml version?".to_string()));
    assert!(
        sink.errors
            .contains(&ParseErrorCode::UnexpectedQuestionMarkInsteadOfTagName)
    );
}

#[test]
fn test_character_references_in_text() {
    assert_eq!(
        tokenize("a &amp; b &lt;&#65;&#x42;"),
        vec![chars("a & b <AB"), Recorded::Eof]
    );
}

#[test]
fn test_character_reference_in_attribute() {
    let tokens = tokenize("<a title=\"x&amp;y\">");
    assert_eq!(
        tokens[0],
        Recorded::StartTag {
            name: "a".to_string(),
            attributes: vec![("title".to_string(), "x&y".to_string())],
            self_closing: false,
        }
    );
}

#[test]
fn test_legacy_reference_before_alphanumeric_in_attribute() {
    let sink = tokenize_with("<a href=\"?x=1&notit=2\">", RecordingSink::default());
    assert_eq!(
        sink.tokens[0],
        Recorded::StartTag {
            name: "a".to_string(),
            attributes: vec![("href".to_string(), "?x=1&notit=2".to_string())],
            self_closing: false,
        }
    );
    assert!(sink.errors.is_empty(), "{:?}", sink.errors);
}

#[test]
fn test_legacy_reference_without_semicolon_in_text() {
    let sink = tokenize_with("&notit;", RecordingSink::default());
    assert_eq!(sink.tokens, vec![chars("\u{00AC}it;"), Recorded::Eof]);
    assert_eq!(
        sink.errors,
        vec![ParseErrorCode::MissingSemicolonAfterCharacterReference]
    );
}

#[test]
fn test_null_becomes_replacement_character() {
    let sink = tokenize_with("a\0b", RecordingSink::default());
    assert_eq!(sink.tokens, vec![chars("a\u{FFFD}b"), Recorded::Eof]);
    assert!(sink.errors.contains(&ParseErrorCode::UnexpectedNullCharacter));
}

#[test]
fn test_less_than_without_tag_is_text() {
    assert_eq!(tokenize("a < b"), vec![chars("a < b"), Recorded::Eof]);
    assert_eq!(tokenize("<>"), vec![chars("<>"), Recorded::Eof]);
}

#[test]
fn test_empty_end_tag_is_dropped() {
    let sink = tokenize_with("a</>b", RecordingSink::default());
    assert_eq!(sink.tokens, vec![chars("ab"), Recorded::Eof]);
    assert!(sink.errors.contains(&ParseErrorCode::MissingEndTagName));
}

#[test]
fn test_eof_in_tag_emits_markup_as_text() {
    let sink = tokenize_with("<div class=", RecordingSink::default());
    assert_eq!(sink.tokens, vec![chars("<div class="), Recorded::Eof]);
    assert!(sink.errors.contains(&ParseErrorCode::EofInTag));
}

#[test]
fn test_rcdata_content_model() {
    let sink = RecordingSink {
        raw_text: vec![("title", ContentModel::Rcdata)],
        ..RecordingSink::default()
    };
    let sink = tokenize_with("<title><b>&amp;</title>", sink);
    assert_eq!(
        sink.tokens,
        vec![start("title"), chars("<b>&"), end("title"), Recorded::Eof]
    );
}

#[test]
fn test_cdata_content_model_ignores_references() {
    let sink = RecordingSink {
        raw_text: vec![("script", ContentModel::Cdata)],
        ..RecordingSink::default()
    };
    let sink = tokenize_with("<script>a &amp; </p></script><p>", sink);
    assert_eq!(
        sink.tokens,
        vec![
            start("script"),
            chars("a &amp; </p>"),
            end("script"),
            start("p"),
            Recorded::Eof,
        ]
    );
}

#[test]
fn test_escaped_text_hides_end_tag() {
    let sink = RecordingSink {
        raw_text: vec![("style", ContentModel::Cdata)],
        ..RecordingSink::default()
    };
    let sink = tokenize_with("<style><!--</style>--></style>", sink);
    assert_eq!(
        sink.tokens,
        vec![
            start("style"),
            chars("<!--</style>-->"),
            end("style"),
            Recorded::Eof,
        ]
    );
}

#[test]
fn test_plaintext_swallows_everything() {
    let sink = RecordingSink {
        raw_text: vec![("plaintext", ContentModel::Plaintext)],
        ..RecordingSink::default()
    };
    let sink = tokenize_with("<plaintext></plaintext><b>", sink);
    assert_eq!(
        sink.tokens,
        vec![start("plaintext"), chars("</plaintext><b>"), Recorded::Eof]
    );
}

#[test]
fn test_need_data_keeps_partial_tag() {
    let mut stream = ByteInputStream::new(None);
    let mut tokenizer = HTMLTokenizer::new(TokenizerOptions::default());
    let mut sink = RecordingSink::default();

    stream.append(b"<di").unwrap();
    assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::NeedData);
    assert!(sink.tokens.is_empty());

    stream.append(b"v>x").unwrap();
    stream.append(&[]).unwrap();
    assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::Complete);
    assert_eq!(sink.tokens, vec![start("div"), chars("x"), Recorded::Eof]);
}

#[test]
fn test_pause_and_resume() {
    let mut stream = ByteInputStream::new(None);
    let mut tokenizer = HTMLTokenizer::new(TokenizerOptions::default());
    let mut sink = RecordingSink {
        pause_after: Some("b"),
        ..RecordingSink::default()
    };

    stream.append(b"<a><b><c>").unwrap();
    stream.append(&[]).unwrap();
    assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::Paused);
    assert_eq!(sink.tokens, vec![start("a"), start("b")]);
    assert!(tokenizer.is_paused());

    tokenizer.resume();
    assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::Complete);
    assert_eq!(sink.tokens, vec![start("a"), start("b"), start("c"), Recorded::Eof]);
}

#[test]
fn test_pause_at_every_token_gives_same_stream() {
    let input = "<!DOCTYPE html><p class=a>x &amp; y<!--c--></p>a\0b<br/>";
    let expected = tokenize(input);

    let mut stream = ByteInputStream::new(None);
    let mut tokenizer = HTMLTokenizer::new(TokenizerOptions::default());
    let mut sink = RecordingSink {
        pause_every: true,
        ..RecordingSink::default()
    };
    stream.append(input.as_bytes()).unwrap();
    stream.append(&[]).unwrap();

    let mut pauses = 0;
    while tokenizer.run(&mut stream, &mut sink).unwrap() == RunStatus::Paused {
        pauses += 1;
        tokenizer.resume();
    }
    assert!(pauses >= expected.len() - 1);
    assert_eq!(sink.tokens, expected);
}

#[test]
fn test_byte_feed_with_pause_after_each_byte_matches_one_shot() {
    let input = "<a href=\"&amp;x\">&notin;\u{65E5}\u{672C}</a><!--a-->";
    let expected = tokenize_with(input, RecordingSink::default());

    let mut stream = ByteInputStream::new(None);
    let mut tokenizer = HTMLTokenizer::new(TokenizerOptions::default());
    let mut sink = RecordingSink::default();
    for byte in input.as_bytes() {
        stream.append(std::slice::from_ref(byte)).unwrap();
        tokenizer.pause();
        assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::Paused);
        tokenizer.resume();
        assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::NeedData);
    }
    stream.append(&[]).unwrap();
    tokenizer.pause();
    assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::Paused);
    tokenizer.resume();
    assert_eq!(tokenizer.run(&mut stream, &mut sink).unwrap(), RunStatus::Complete);

    assert_eq!(sink.tokens, expected.tokens);
    assert_eq!(sink.errors, expected.errors);
    assert_eq!(
        sink.tokens,
        vec![
            Recorded::StartTag {
                name: "a".to_string(),
                attributes: vec![("href".to_string(), "&x".to_string())],
                self_closing: false,
            },
            chars("\u{2209}\u{65E5}\u{672C}"),
            end("a"),
            Recorded::Comment("a".to_string()),
            Recorded::Eof,
        ]
    );
}

#[test]
fn test_initial_content_model_option() {
    let mut stream = ByteInputStream::new(None);
    let mut tokenizer = HTMLTokenizer::new(TokenizerOptions {
        initial_content_model: ContentModel::Plaintext,
        process_cdata: false,
    });
    let mut sink = RecordingSink::default();
    stream.append(b"<p>&amp;").unwrap();
    stream.append(&[]).unwrap();
    let _ = tokenizer.run(&mut stream, &mut sink).unwrap();
    assert_eq!(sink.tokens, vec![chars("<p>&amp;"), Recorded::Eof]);
}

#[test]
fn test_options_deserialize_from_json() {
    let options: TokenizerOptions =
        serde_json::from_value(json!({ "initial_content_model": "RCDATA" })).unwrap();
    assert_eq!(options.initial_content_model, ContentModel::Rcdata);
    assert!(!options.process_cdata);
}

/// Render recorded tokens in the html5lib tokenizer test format.
fn to_json(tokens: &[Recorded]) -> Value {
    tokens
        .iter()
        .filter_map(|token| match token {
            Recorded::Doctype {
                name,
                public_id,
                system_id,
                force_quirks,
            } => Some(json!(["DOCTYPE", name, public_id, system_id, !force_quirks])),
            Recorded::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let attrs: serde_json::Map<String, Value> = attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                if *self_closing {
                    Some(json!(["StartTag", name, attrs, true]))
                } else {
                    Some(json!(["StartTag", name, attrs]))
                }
            }
            Recorded::EndTag(name) => Some(json!(["EndTag", name])),
            Recorded::Comment(data) => Some(json!(["Comment", data])),
            Recorded::Character(text) => Some(json!(["Character", text])),
            Recorded::Eof => None,
        })
        .collect()
}

#[test]
fn test_html5lib_style_fixtures() {
    let fixtures = json!([
        {
            "input": "<h1 class=title>Hi</h1>",
            "output": [["StartTag", "h1", {"class": "title"}], ["Character", "Hi"], ["EndTag", "h1"]],
            "errors": []
        },
        {
            "input": "<!doctype html><!--c-->",
            "output": [["DOCTYPE", "html", null, null, true], ["Comment", "c"]],
            "errors": []
        },
        {
            "input": "<img src=a.png />",
            "output": [["StartTag", "img", {"src": "a.png"}, true]],
            "errors": []
        },
        {
            "input": "x&copy y",
            "output": [["Character", "x\u{00A9} y"]],
            "errors": ["missing-semicolon-after-character-reference"]
        },
        {
            "input": "&#x80;",
            "output": [["Character", "\u{20AC}"]],
            "errors": []
        },
        {
            "input": "&#xD800;",
            "output": [["Character", "\u{FFFD}"]],
            "errors": ["invalid-numeric-character-reference"]
        },
        {
            "input": "&#x110000;",
            "output": [["Character", "\u{FFFD}"]],
            "errors": ["invalid-numeric-character-reference"]
        },
        {
            "input": "&#0;",
            "output": [["Character", "\u{FFFD}"]],
            "errors": ["invalid-numeric-character-reference"]
        },
        {
            "input": "&#65 b",
            "output": [["Character", "A b"]],
            "errors": ["missing-semicolon-after-character-reference"]
        }
    ]);

    for fixture in fixtures.as_array().unwrap() {
        let input = fixture["input"].as_str().unwrap();
        let sink = tokenize_with(input, RecordingSink::default());
        assert_eq!(to_json(&sink.tokens), fixture["output"], "input: {input:?}");
        let errors: Vec<&'static str> = sink.errors.iter().map(|&code| code.into()).collect();
        assert_eq!(json!(errors), fixture["errors"], "input: {input:?}");
    }
}
