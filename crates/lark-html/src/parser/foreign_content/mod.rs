//! Foreign content: SVG and `MathML`.
//!
//! [§ 13.2.6.3 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#creating-and-inserting-nodes)
//! [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)

pub mod mathml;
pub mod svg;

pub use mathml::adjust_mathml_attributes;
pub use svg::{adjust_svg_attributes, adjust_svg_tag_name};

use lark_dom::{Attribute, Namespace, Tag, TreeHandler};

use super::core::{Flow, ModeResult, TreeBuilder, is_html_whitespace};
use super::element_type::ElementType;
use super::stack::StackEntry;
use crate::error::{ParseErrorCode, ParserError};
use crate::tokenizer::Token;

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// "if any of the attributes on the token match the strings in the first
/// column of the following table, let the attribute be a namespaced
/// attribute, with the prefix being the string in the second column, the
/// local name being the string in the third column, and the namespace being
/// the namespace in the fourth column."
const FOREIGN_ATTRIBUTES: &[(&str, Namespace, &str)] = &[
    ("xlink:actuate", Namespace::XLink, "actuate"),
    ("xlink:arcrole", Namespace::XLink, "arcrole"),
    ("xlink:href", Namespace::XLink, "href"),
    ("xlink:role", Namespace::XLink, "role"),
    ("xlink:show", Namespace::XLink, "show"),
    ("xlink:title", Namespace::XLink, "title"),
    ("xlink:type", Namespace::XLink, "type"),
    ("xml:lang", Namespace::Xml, "lang"),
    ("xml:space", Namespace::Xml, "space"),
    ("xmlns", Namespace::Xmlns, "xmlns"),
    ("xmlns:xlink", Namespace::Xmlns, "xlink"),
];

/// Rewrite namespaced attribute names into (namespace, local name) pairs.
pub fn adjust_foreign_attributes(attributes: &mut [Attribute]) {
    for attr in attributes.iter_mut() {
        if let Some((_, namespace, local)) = FOREIGN_ATTRIBUTES
            .iter()
            .find(|(name, _, _)| *name == attr.name)
        {
            attr.namespace = *namespace;
            attr.name = (*local).to_string();
        }
    }
}

/// "A start tag whose tag name is one of: ..." that breaks out of foreign
/// content back into HTML.
const BREAKOUT_TAGS: &[&str] = &[
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "div", "dl", "dt", "em",
    "embed", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li", "listing",
    "menu", "meta", "nobr", "ol", "p", "pre", "ruby", "s", "small", "span", "strong", "strike",
    "sub", "sup", "table", "tt", "u", "ul", "var",
];

fn is_breakout(tag: &Tag) -> bool {
    if BREAKOUT_TAGS.contains(&tag.name.as_str()) {
        return true;
    }
    // "A start tag whose tag name is "font", if the token has any attributes
    // named "color", "face", or "size""
    tag.name == "font"
        && ["color", "face", "size"]
            .iter()
            .any(|name| tag.attribute(name).is_some())
}

/// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#html-integration-point)
///
/// "A `MathML` annotation-xml element whose start tag token had an attribute
/// with the name "encoding" whose value was an ASCII case-insensitive match
/// for the string "text/html" ... or "application/xhtml+xml"", and the SVG
/// `foreignObject`, `desc` and `title` elements.
fn is_html_integration_point(namespace: Namespace, kind: ElementType, tag: &Tag) -> bool {
    match namespace {
        Namespace::MathMl => {
            kind == ElementType::AnnotationXml
                && tag.attribute("encoding").is_some_and(|encoding| {
                    encoding.eq_ignore_ascii_case("text/html")
                        || encoding.eq_ignore_ascii_case("application/xhtml+xml")
                })
        }
        Namespace::Svg => matches!(
            kind,
            ElementType::ForeignObject | ElementType::Desc | ElementType::Title
        ),
        _ => false,
    }
}

impl<H: TreeHandler> TreeBuilder<H> {
    /// [§ 13.2.6.1 Insert a foreign element](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-foreign-element)
    ///
    /// Adjusts names and attributes for `namespace`, inserts the element and
    /// pushes it. A self-closing tag is popped straight away.
    pub(super) fn insert_foreign_element(
        &mut self,
        tag: &Tag,
        namespace: Namespace,
    ) -> Result<(), ParserError> {
        let mut tag = tag.clone();
        tag.namespace = namespace;
        match namespace {
            Namespace::Svg => {
                adjust_svg_tag_name(&mut tag.name);
                adjust_svg_attributes(&mut tag.attributes);
            }
            Namespace::MathMl => adjust_mathml_attributes(&mut tag.attributes),
            _ => {}
        }
        adjust_foreign_attributes(&mut tag.attributes);

        let kind = ElementType::from_name(&tag.name);
        let node = self.handler.create_element(&tag)?;
        let place = self.appropriate_place()?;
        let _ = self.insert_at(&place, &node)?;
        self.push_element(StackEntry {
            namespace,
            kind,
            name: tag.name.clone(),
            node,
            integration_point: is_html_integration_point(namespace, kind, &tag),
        });

        // "If the token has its self-closing flag set, pop the current node
        // off the stack of open elements and acknowledge the token's
        // self-closing flag."
        if tag.self_closing {
            let _ = self.pop_element()?;
        }
        Ok(())
    }

    /// Whether a token is handled by the HTML rules of the secondary mode
    /// rather than the foreign content rules.
    fn follows_html_rules(&self, token: &Token<'_>) -> bool {
        let Some(current) = self.current() else {
            return true;
        };
        if current.namespace == Namespace::Html {
            return true;
        }
        match token {
            // "If the adjusted current node is a MathML text integration point
            // and the token is a start tag whose tag name is neither "mglyph"
            // nor "malignmark""
            Token::StartTag(tag)
                if current.is_mathml_text_integration_point()
                    && tag.name != "mglyph"
                    && tag.name != "malignmark" =>
            {
                true
            }
            // "If the adjusted current node is a MathML annotation-xml element
            // and the token is a start tag whose tag name is "svg""
            Token::StartTag(tag)
                if current.namespace == Namespace::MathMl
                    && current.kind == ElementType::AnnotationXml
                    && tag.name == "svg" =>
            {
                true
            }
            // "If the adjusted current node is an HTML integration point and
            // the token is a start tag" or "a character token"
            Token::StartTag(_) => current.integration_point,
            Token::Character(_) => {
                current.integration_point || current.is_mathml_text_integration_point()
            }
            Token::Eof => true,
            _ => false,
        }
    }

    /// [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)
    pub(super) fn handle_in_foreign_content_mode<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        if self.follows_html_rules(&token) {
            return self.process_with_secondary(token);
        }

        match token {
            // "Any other character token": "Insert the token's character. Set
            // the frameset-ok flag to "not ok"" unless it is whitespace.
            Token::Character(text) => {
                if text.chars().any(|c| !is_html_whitespace(c)) {
                    self.frameset_ok = false;
                }
                self.insert_text(text)?;
                Ok(Flow::Done)
            }
            Token::Comment(data) => {
                self.insert_comment(data, None)?;
                Ok(Flow::Done)
            }
            Token::Doctype(_) => {
                self.parse_error(ParseErrorCode::UnexpectedDoctype);
                Ok(Flow::Done)
            }
            Token::StartTag(tag) if is_breakout(tag) => self.break_out(token),
            Token::EndTag(tag) if tag.name == "br" || tag.name == "p" => self.break_out(token),
            Token::StartTag(tag) => {
                // "Any other start tag": insert a foreign element in the same
                // namespace as the adjusted current node.
                let namespace = self.current().map_or(Namespace::Html, |e| e.namespace);
                self.insert_foreign_element(tag, namespace)?;
                Ok(Flow::Done)
            }
            Token::EndTag(tag) => self.foreign_end_tag(token, &tag.name),
            Token::Eof => self.process_with_secondary(token),
        }
    }

    /// Leave foreign content for a tag that only makes sense in HTML.
    fn break_out<'t>(&mut self, token: Token<'t>) -> ModeResult<'t> {
        // "Parse error. While the current node is not a MathML text
        // integration point, an HTML integration point, or an element in the
        // HTML namespace, pop elements from the stack of open elements.
        // Reprocess the token according to the rules given in the section
        // corresponding to the current insertion mode in HTML content."
        self.parse_error(ParseErrorCode::UnexpectedStartTag);
        while let Some(current) = self.current() {
            if current.namespace == Namespace::Html
                || current.integration_point
                || current.is_mathml_text_integration_point()
            {
                break;
            }
            let _ = self.pop_element()?;
        }
        self.process_with_secondary(token)
    }

    /// "Any other end tag" in foreign content, plus `</script>` for an SVG
    /// script element.
    fn foreign_end_tag<'t>(&mut self, token: Token<'t>, name: &str) -> ModeResult<'t> {
        if let Some(current) = self.current() {
            if name == "script" && current.namespace == Namespace::Svg && current.name == "script" {
                let _ = self.pop_element()?;
                return Ok(Flow::Done);
            }
            if !current.name.eq_ignore_ascii_case(name) {
                self.parse_error(ParseErrorCode::UnexpectedEndTag);
            }
        }

        // "Loop: If node is the topmost element in the stack of open elements,
        // then return. (fragment case)"
        let Some(mut index) = self.stack.len().checked_sub(1) else {
            return Ok(Flow::Done);
        };
        while index > 0 {
            // "If node's tag name, converted to ASCII lowercase, is the same as
            // the tag name of the token, pop elements from the stack of open
            // elements until node has been popped from the stack, and then
            // return."
            if self.stack[index].name.eq_ignore_ascii_case(name) {
                self.truncate_stack(index)?;
                return Ok(Flow::Done);
            }
            // "Set node to the previous entry in the stack of open elements. If
            // node is not an element in the HTML namespace, return to the step
            // labeled loop. Otherwise, process the token according to the rules
            // given in the section corresponding to the current insertion mode
            // in HTML content."
            index -= 1;
            if self.stack[index].namespace == Namespace::Html {
                return self.process_with_secondary(token);
            }
        }
        Ok(Flow::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_attributes_get_namespaces() {
        let mut attributes = vec![
            Attribute::new("xlink:href", "#a"),
            Attribute::new("xmlns:xlink", "http://www.w3.org/1999/xlink"),
            Attribute::new("fill", "red"),
        ];
        adjust_foreign_attributes(&mut attributes);
        assert_eq!(attributes[0].namespace, Namespace::XLink);
        assert_eq!(attributes[0].name, "href");
        assert_eq!(attributes[1].namespace, Namespace::Xmlns);
        assert_eq!(attributes[1].name, "xlink");
        assert_eq!(attributes[2].namespace, Namespace::Null);
    }

    #[test]
    fn test_font_breaks_out_only_with_presentational_attributes() {
        let plain = Tag {
            name: "font".to_string(),
            ..Tag::default()
        };
        let colored = Tag {
            name: "font".to_string(),
            attributes: vec![Attribute::new("color", "red")],
            ..Tag::default()
        };
        assert!(!is_breakout(&plain));
        assert!(is_breakout(&colored));
    }
}
