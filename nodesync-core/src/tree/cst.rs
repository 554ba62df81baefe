//! Owned concrete syntax tree
//!
//! JSON shape:
//!
//! ```text
//! {"tag": "AddExpression",
//!  "fields": {"Left": {"node": {...}},
//!             "OperatorToken": {"token": {"tag": "PlusToken", "text": "+"}},
//!             "Modifiers": {"tokens": [...]},
//!             "Arguments": {"nodes": [...]}}}
//! ```

use super::{FieldSlot, SyntaxNode, TokenView};
use indexmap::IndexMap;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

// Free stack kept below each nested node while serializing, and the segment allocated
// once less than that remains.
const RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CstToken {
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
}

impl CstToken {
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        CstToken {
            tag: tag.into(),
            text: text.into(),
            missing: false,
        }
    }

    /// A token synthesized by parser error recovery.
    pub fn missing(tag: impl Into<String>) -> Self {
        CstToken {
            tag: tag.into(),
            text: String::new(),
            missing: true,
        }
    }

    fn view(&self) -> TokenView<'_> {
        TokenView {
            tag: &self.tag,
            text: &self.text,
            missing: self.missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CstField {
    Token(CstToken),
    Tokens(Vec<CstToken>),
    Node(Box<CstNode>),
    Nodes(Vec<CstNode>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CstNode {
    pub tag: String,
    #[serde(default)]
    pub fields: IndexMap<String, CstField>,
}

// Serialization recurses once per tree level, so each level may move onto a fresh
// stack segment. Reading goes through `JsonTreeParser`, which does the same.
impl Serialize for CstNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || {
            let len = if self.fields.is_empty() { 1 } else { 2 };
            let mut state = serializer.serialize_struct("CstNode", len)?;
            state.serialize_field("tag", &self.tag)?;
            if self.fields.is_empty() {
                state.skip_field("fields")?;
            } else {
                state.serialize_field("fields", &self.fields)?;
            }
            state.end()
        })
    }
}

impl CstNode {
    pub fn new(tag: impl Into<String>) -> Self {
        CstNode {
            tag: tag.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_token(
        mut self,
        name: impl Into<String>,
        tag: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.fields
            .insert(name.into(), CstField::Token(CstToken::new(tag, text)));
        self
    }

    pub fn with_tokens(mut self, name: impl Into<String>, tokens: Vec<CstToken>) -> Self {
        self.fields.insert(name.into(), CstField::Tokens(tokens));
        self
    }

    pub fn with_node(mut self, name: impl Into<String>, node: CstNode) -> Self {
        self.fields
            .insert(name.into(), CstField::Node(Box::new(node)));
        self
    }

    pub fn with_nodes(mut self, name: impl Into<String>, nodes: Vec<CstNode>) -> Self {
        self.fields.insert(name.into(), CstField::Nodes(nodes));
        self
    }
}

impl SyntaxNode for CstNode {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn field(&self, name: &str) -> Option<FieldSlot<'_, Self>> {
        let slot = match self.fields.get(name)? {
            CstField::Token(token) => FieldSlot::Token(token.view()),
            CstField::Tokens(tokens) => FieldSlot::Tokens(tokens.iter().map(CstToken::view).collect()),
            CstField::Node(node) => FieldSlot::Node(node.as_ref()),
            CstField::Nodes(nodes) => FieldSlot::Nodes(nodes.iter().collect()),
        };
        Some(slot)
    }

    fn child_node_tags(&self) -> Vec<&str> {
        let mut tags = Vec::new();
        for field in self.fields.values() {
            match field {
                CstField::Node(node) => tags.push(node.tag.as_str()),
                CstField::Nodes(nodes) => tags.extend(nodes.iter().map(|n| n.tag.as_str())),
                CstField::Token(_) | CstField::Tokens(_) => {}
            }
        }
        tags
    }

    fn child_token_tags(&self) -> Vec<&str> {
        let mut tags = Vec::new();
        for field in self.fields.values() {
            match field {
                CstField::Token(token) => tags.push(token.tag.as_str()),
                CstField::Tokens(tokens) => tags.extend(tokens.iter().map(|t| t.tag.as_str())),
                CstField::Node(_) | CstField::Nodes(_) => {}
            }
        }
        tags
    }
}

// Deep trees would overflow the stack with the derived, recursive drop.
impl Drop for CstNode {
    fn drop(&mut self) {
        let mut pending: Vec<CstNode> = Vec::new();
        collect_children(&mut self.fields, &mut pending);
        while let Some(mut node) = pending.pop() {
            collect_children(&mut node.fields, &mut pending);
        }
    }
}

fn collect_children(fields: &mut IndexMap<String, CstField>, out: &mut Vec<CstNode>) {
    for (_, field) in fields.drain(..) {
        match field {
            CstField::Node(node) => out.push(*node),
            CstField::Nodes(nodes) => out.extend(nodes),
            CstField::Token(_) | CstField::Tokens(_) => {}
        }
    }
}
