//! Element classification used by the insertion modes.
//!
//! Tag names are looked up once, when an element is pushed or a tag token
//! arrives, so the mode handlers can match on an enum instead of strings.

use lark_dom::Namespace;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every element name the tree construction rules single out. Anything
/// else is [`ElementType::Unknown`] and compared by name where it matters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum ElementType {
    A,
    Address,
    #[strum(serialize = "annotation-xml")]
    AnnotationXml,
    Applet,
    Area,
    Article,
    Aside,
    B,
    Base,
    Basefont,
    Bgsound,
    Big,
    Blockquote,
    Body,
    Br,
    Button,
    Caption,
    Center,
    Code,
    Col,
    Colgroup,
    Dd,
    Desc,
    Details,
    Dialog,
    Dir,
    Div,
    Dl,
    Dt,
    Em,
    Embed,
    Fieldset,
    Figcaption,
    Figure,
    Font,
    Footer,
    ForeignObject,
    Form,
    Frame,
    Frameset,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Head,
    Header,
    Hgroup,
    Hr,
    Html,
    I,
    Iframe,
    Image,
    Img,
    Input,
    Keygen,
    Label,
    Li,
    Link,
    Listing,
    Main,
    Malignmark,
    Marquee,
    Math,
    Menu,
    Meta,
    Mglyph,
    Mi,
    Mn,
    Mo,
    Ms,
    Mtext,
    Nav,
    Nobr,
    Noembed,
    Noframes,
    Noscript,
    Object,
    Ol,
    Optgroup,
    Option,
    Output,
    P,
    Param,
    Plaintext,
    Pre,
    Rb,
    Rp,
    Rt,
    Rtc,
    Ruby,
    S,
    Script,
    Search,
    Section,
    Select,
    Small,
    Source,
    Span,
    Strike,
    Strong,
    Style,
    Sub,
    Summary,
    Sup,
    Svg,
    Table,
    Tbody,
    Td,
    Template,
    Textarea,
    Tfoot,
    Th,
    Thead,
    Title,
    Tr,
    Track,
    Tt,
    U,
    Ul,
    Var,
    Wbr,
    Xmp,
    /// Any element without rules of its own.
    Unknown,
}

impl ElementType {
    /// Classify a tag name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(Self::Unknown)
    }

    /// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#formatting)
    ///
    /// "The following HTML elements are those that end up in the list of
    /// active formatting elements: a, b, big, code, em, font, i, nobr, s,
    /// small, strike, strong, tt, and u."
    #[must_use]
    pub const fn is_formatting(self) -> bool {
        matches!(
            self,
            Self::A
                | Self::B
                | Self::Big
                | Self::Code
                | Self::Em
                | Self::Font
                | Self::I
                | Self::Nobr
                | Self::S
                | Self::Small
                | Self::Strike
                | Self::Strong
                | Self::Tt
                | Self::U
        )
    }

    /// [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#special)
    ///
    /// Membership of the "special" category for an element in `namespace`.
    #[must_use]
    pub const fn is_special(self, namespace: Namespace) -> bool {
        match namespace {
            Namespace::Html => matches!(
                self,
                Self::Address
                    | Self::Applet
                    | Self::Area
                    | Self::Article
                    | Self::Aside
                    | Self::Base
                    | Self::Basefont
                    | Self::Bgsound
                    | Self::Blockquote
                    | Self::Body
                    | Self::Br
                    | Self::Button
                    | Self::Caption
                    | Self::Center
                    | Self::Col
                    | Self::Colgroup
                    | Self::Dd
                    | Self::Details
                    | Self::Dir
                    | Self::Div
                    | Self::Dl
                    | Self::Dt
                    | Self::Embed
                    | Self::Fieldset
                    | Self::Figcaption
                    | Self::Figure
                    | Self::Footer
                    | Self::Form
                    | Self::Frame
                    | Self::Frameset
                    | Self::H1
                    | Self::H2
                    | Self::H3
                    | Self::H4
                    | Self::H5
                    | Self::H6
                    | Self::Head
                    | Self::Header
                    | Self::Hgroup
                    | Self::Hr
                    | Self::Html
                    | Self::Iframe
                    | Self::Img
                    | Self::Input
                    | Self::Keygen
                    | Self::Li
                    | Self::Link
                    | Self::Listing
                    | Self::Main
                    | Self::Marquee
                    | Self::Menu
                    | Self::Meta
                    | Self::Nav
                    | Self::Noembed
                    | Self::Noframes
                    | Self::Noscript
                    | Self::Object
                    | Self::Ol
                    | Self::P
                    | Self::Param
                    | Self::Plaintext
                    | Self::Pre
                    | Self::Script
                    | Self::Search
                    | Self::Section
                    | Self::Select
                    | Self::Source
                    | Self::Style
                    | Self::Summary
                    | Self::Table
                    | Self::Tbody
                    | Self::Td
                    | Self::Template
                    | Self::Textarea
                    | Self::Tfoot
                    | Self::Th
                    | Self::Thead
                    | Self::Title
                    | Self::Tr
                    | Self::Track
                    | Self::Ul
                    | Self::Wbr
                    | Self::Xmp
            ),
            Namespace::MathMl => matches!(
                self,
                Self::Mi | Self::Mo | Self::Mn | Self::Ms | Self::Mtext | Self::AnnotationXml
            ),
            Namespace::Svg => matches!(self, Self::ForeignObject | Self::Desc | Self::Title),
            _ => false,
        }
    }

    /// [§ 13.2.4.2 Has an element in scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-scope)
    ///
    /// The element types that bound the default scope.
    #[must_use]
    pub const fn is_scope_boundary(self, namespace: Namespace) -> bool {
        match namespace {
            Namespace::Html => matches!(
                self,
                Self::Applet
                    | Self::Caption
                    | Self::Html
                    | Self::Table
                    | Self::Td
                    | Self::Th
                    | Self::Marquee
                    | Self::Object
                    | Self::Template
            ),
            Namespace::MathMl | Namespace::Svg => self.is_special(namespace),
            _ => false,
        }
    }

    /// [§ 13.2.6.2 Closing elements that have implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    #[must_use]
    pub const fn has_implied_end_tag(self) -> bool {
        matches!(
            self,
            Self::Dd
                | Self::Dt
                | Self::Li
                | Self::Optgroup
                | Self::Option
                | Self::P
                | Self::Rb
                | Self::Rp
                | Self::Rt
                | Self::Rtc
        )
    }

    /// Heading elements `h1` to `h6`.
    #[must_use]
    pub const fn is_heading(self) -> bool {
        matches!(
            self,
            Self::H1 | Self::H2 | Self::H3 | Self::H4 | Self::H5 | Self::H6
        )
    }

    /// Elements a form element pointer associates with.
    ///
    /// [§ 4.10.2 Categories](https://html.spec.whatwg.org/multipage/forms.html#form-associated-element)
    #[must_use]
    pub const fn is_form_associated(self) -> bool {
        matches!(
            self,
            Self::Button
                | Self::Fieldset
                | Self::Input
                | Self::Keygen
                | Self::Object
                | Self::Output
                | Self::Select
                | Self::Textarea
                | Self::Img
        )
    }

    /// `table`, `tbody`, `tfoot`, `thead` or `tr`: the targets foster
    /// parenting redirects insertions away from.
    #[must_use]
    pub const fn is_table_context(self) -> bool {
        matches!(
            self,
            Self::Table | Self::Tbody | Self::Tfoot | Self::Thead | Self::Tr
        )
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_every_name_round_trips() {
        for kind in ElementType::iter() {
            assert_eq!(ElementType::from_name(&kind.to_string()), kind);
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(ElementType::from_name("foreignObject"), ElementType::ForeignObject);
        assert_eq!(ElementType::from_name("TABLE"), ElementType::Table);
        assert_eq!(ElementType::from_name("annotation-xml"), ElementType::AnnotationXml);
        assert_eq!(ElementType::from_name("blink"), ElementType::Unknown);
    }

    #[test]
    fn test_special_depends_on_namespace() {
        assert!(ElementType::Title.is_special(Namespace::Html));
        assert!(ElementType::Title.is_special(Namespace::Svg));
        assert!(!ElementType::Title.is_special(Namespace::MathMl));
        assert!(!ElementType::B.is_special(Namespace::Html));
    }
}
