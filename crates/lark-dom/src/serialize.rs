//! Dump a [`DomTree`] in the html5lib tree-construction test format.
//!
//! ```text
//! | <!DOCTYPE html>
//! | <html>
//! |   <head>
//! |   <body>
//! |     <p>
//! |       class="x"
//! |       "text"
//! ```

use std::fmt::Write;

use crate::{DomTree, Namespace, NodeId, NodeType};

impl DomTree {
    /// Render the children of the document node, one line per node or
    /// attribute, each line terminated by `\n`.
    #[must_use]
    pub fn to_test_format(&self) -> String {
        let mut out = String::new();
        for &child in self.children(NodeId::ROOT) {
            self.dump_node(child, 0, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match &node.node_type {
            NodeType::Document => {}
            NodeType::Doctype(doctype) => {
                let name = doctype.name.as_deref().unwrap_or("");
                if doctype.public_id.is_some() || doctype.system_id.is_some() {
                    let _ = writeln!(
                        out,
                        "| {indent}<!DOCTYPE {name} \"{}\" \"{}\">",
                        doctype.public_id.as_deref().unwrap_or(""),
                        doctype.system_id.as_deref().unwrap_or("")
                    );
                } else {
                    let _ = writeln!(out, "| {indent}<!DOCTYPE {name}>");
                }
            }
            NodeType::Element(data) => {
                match data.namespace {
                    Namespace::Svg | Namespace::MathMl => {
                        let _ = writeln!(out, "| {indent}<{} {}>", data.namespace, data.tag_name);
                    }
                    _ => {
                        let _ = writeln!(out, "| {indent}<{}>", data.tag_name);
                    }
                }
                let mut attrs: Vec<(String, &str)> = data
                    .attrs
                    .iter()
                    .map(|a| {
                        let name = match a.namespace {
                            Namespace::XLink | Namespace::Xml | Namespace::Xmlns => {
                                format!("{} {}", a.namespace, a.name)
                            }
                            _ => a.name.clone(),
                        };
                        (name, a.value.as_str())
                    })
                    .collect();
                attrs.sort();
                for (name, value) in attrs {
                    let _ = writeln!(out, "| {indent}  {name}=\"{value}\"");
                }
            }
            NodeType::Text(text) => {
                let _ = writeln!(out, "| {indent}\"{text}\"");
            }
            NodeType::Comment(data) => {
                let _ = writeln!(out, "| {indent}<!-- {data} -->");
            }
        }
        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}
