//! Concrete syntax tree boundary
//!
//! The converters never depend on a particular parser. They read a concrete tree
//! through [`SyntaxNode`], asking for children by field name, which is the only
//! capability the forward conversion needs. A node is only ever asked for names the
//! schema declares, so parent links and other bookkeeping attributes a parser may
//! expose are never visited.
//!
//! [`CstNode`] is an owned implementation that can be built in code or read from JSON,
//! and [`TreeParser`] is the text → tree entry point the synchronizer drives.

mod cst;
mod parser;

pub use cst::{CstField, CstNode, CstToken};
pub use parser::{JsonTreeParser, TreeParser};

/// Borrowed view of one token of a concrete tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenView<'a> {
    pub tag: &'a str,
    pub text: &'a str,
    /// Inserted by error recovery; carries no source text
    pub missing: bool,
}

impl TokenView<'_> {
    /// Text worth storing: present and non-empty.
    pub fn usable_text(&self) -> Option<&str> {
        (!self.missing && !self.text.is_empty()).then_some(self.text)
    }
}

/// What a named field of a concrete node holds.
#[derive(Debug)]
pub enum FieldSlot<'a, N: ?Sized> {
    Token(TokenView<'a>),
    Tokens(Vec<TokenView<'a>>),
    Node(&'a N),
    Nodes(Vec<&'a N>),
}

impl<'a, N: ?Sized> FieldSlot<'a, N> {
    /// Child nodes held by the slot, in order. Token slots hold none.
    pub fn into_nodes(self) -> Vec<&'a N> {
        match self {
            FieldSlot::Node(node) => vec![node],
            FieldSlot::Nodes(nodes) => nodes,
            FieldSlot::Token(_) | FieldSlot::Tokens(_) => Vec::new(),
        }
    }

    /// Token text of the slot.
    ///
    /// A single token yields its text; a token list joins the usable texts with single
    /// spaces. Missing or empty tokens are skipped, and `None` means nothing usable.
    pub fn token_text(&self) -> Option<String> {
        match self {
            FieldSlot::Token(token) => token.usable_text().map(str::to_string),
            FieldSlot::Tokens(tokens) => {
                let joined = tokens
                    .iter()
                    .filter_map(TokenView::usable_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                (!joined.is_empty()).then_some(joined)
            }
            FieldSlot::Node(_) | FieldSlot::Nodes(_) => None,
        }
    }
}

/// Read access to one node of a concrete syntax tree.
pub trait SyntaxNode {
    /// The node's grammar tag (its "kind").
    fn tag(&self) -> &str;

    /// The child stored under `name`, if the node has such a field.
    fn field(&self, name: &str) -> Option<FieldSlot<'_, Self>>;

    /// Tags of the direct child nodes, in order.
    fn child_node_tags(&self) -> Vec<&str>;

    /// Tags of the direct child tokens, in order.
    fn child_token_tags(&self) -> Vec<&str>;
}
