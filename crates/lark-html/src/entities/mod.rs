//! Character reference resolution.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Named references are matched incrementally: the tokenizer feeds one byte
//! at a time to [`step`] and keeps the [`EntityContext`] across calls, so a
//! reference split across input chunks resolves exactly like one that
//! arrived whole. The names live in a ternary search tree built once per
//! process from [`table::NAMED_REFERENCES`].
//!
//! Numeric references are handled by [`numeric`].

/// Numeric character reference resolution.
pub mod numeric;
mod table;

use std::sync::LazyLock;

pub use numeric::resolve_numeric;

const NO_NODE: u32 = u32::MAX;

/// One node of the ternary search tree.
#[derive(Debug)]
struct TrieNode {
    byte: u8,
    lt: u32,
    eq: u32,
    gt: u32,
    value: Option<&'static str>,
}

/// Byte-keyed ternary search tree over every named reference.
#[derive(Debug)]
struct EntityTrie {
    nodes: Vec<TrieNode>,
}

impl EntityTrie {
    fn build(names: &'static [(&'static str, &'static str)]) -> Self {
        let mut trie = Self { nodes: Vec::new() };
        // Median-first insertion keeps the lt/gt chains balanced.
        let mut ranges = vec![(0, names.len())];
        while let Some((lo, hi)) = ranges.pop() {
            if lo >= hi {
                continue;
            }
            let mid = lo + (hi - lo) / 2;
            let (name, value) = names[mid];
            trie.insert(name.as_bytes(), value);
            ranges.push((lo, mid));
            ranges.push((mid + 1, hi));
        }
        trie
    }

    fn new_node(&mut self, byte: u8) -> u32 {
        self.nodes.push(TrieNode {
            byte,
            lt: NO_NODE,
            eq: NO_NODE,
            gt: NO_NODE,
            value: None,
        });
        u32::try_from(self.nodes.len() - 1).unwrap_or(NO_NODE)
    }

    fn insert(&mut self, name: &[u8], value: &'static str) {
        let Some((&first, _)) = name.split_first() else {
            return;
        };
        if self.nodes.is_empty() {
            let _ = self.new_node(first);
        }
        let mut index = 0_u32;
        let mut pos = 0;
        loop {
            let byte = name[pos];
            let node_byte = self.nodes[index as usize].byte;
            let link = if byte < node_byte {
                &mut self.nodes[index as usize].lt
            } else if byte > node_byte {
                &mut self.nodes[index as usize].gt
            } else if pos + 1 == name.len() {
                self.nodes[index as usize].value = Some(value);
                return;
            } else {
                pos += 1;
                &mut self.nodes[index as usize].eq
            };
            if *link == NO_NODE {
                let next_byte = name[pos];
                let next = self.new_node(next_byte);
                // Re-borrow after the push.
                let node = &mut self.nodes[index as usize];
                if byte < node.byte {
                    node.lt = next;
                } else if byte > node.byte {
                    node.gt = next;
                } else {
                    node.eq = next;
                }
                index = next;
            } else {
                index = *link;
            }
        }
    }
}

static TRIE: LazyLock<EntityTrie> = LazyLock::new(|| EntityTrie::build(table::NAMED_REFERENCES));

/// Position of an in-progress named reference match.
///
/// Start every match from [`EntityContext::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityContext {
    node: u32,
}

/// Result of feeding one byte to [`step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStep {
    /// The bytes fed so far spell a complete reference name; this is its
    /// replacement text. Longer names may still match.
    Match(&'static str),
    /// The bytes fed so far are a proper prefix of some name.
    NeedMore,
    /// No name starts with the bytes fed so far.
    NoMatch,
}

/// Advance a named reference match by one byte.
///
/// Once `NoMatch` has been returned the context is exhausted and every
/// further call returns `NoMatch`.
pub fn step(byte: u8, context: &mut EntityContext) -> EntityStep {
    let trie = &*TRIE;
    let mut index = context.node;
    while index != NO_NODE {
        let node = &trie.nodes[index as usize];
        if byte < node.byte {
            index = node.lt;
        } else if byte > node.byte {
            index = node.gt;
        } else {
            context.node = node.eq;
            return match node.value {
                Some(value) => EntityStep::Match(value),
                None if node.eq == NO_NODE => EntityStep::NoMatch,
                None => EntityStep::NeedMore,
            };
        }
    }
    context.node = NO_NODE;
    EntityStep::NoMatch
}

/// Look up a complete reference name (without the leading `&`).
///
/// # Example
/// ```
/// use lark_html::entities::lookup_entity;
///
/// assert_eq!(lookup_entity("amp;"), Some("&"));
/// assert_eq!(lookup_entity("amp"), Some("&"));
/// assert_eq!(lookup_entity("ampx"), None);
/// ```
#[must_use]
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    let mut context = EntityContext::default();
    let mut found = None;
    for &byte in name.as_bytes() {
        match step(byte, &mut context) {
            EntityStep::Match(value) => found = Some(value),
            EntityStep::NeedMore => found = None,
            EntityStep::NoMatch => return None,
        }
    }
    found
}
