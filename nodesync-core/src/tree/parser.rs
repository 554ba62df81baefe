//! Text → concrete tree entry point

use super::{CstNode, SyntaxNode};
use crate::error::TreeError;
use serde::Deserialize;

/// Produces a concrete syntax tree from source text.
///
/// The grammar parser itself lives outside this crate; implementations adapt it.
pub trait TreeParser: Send + Sync {
    type Node: SyntaxNode;

    fn parse(&self, source: &str) -> Result<Self::Node, TreeError>;
}

/// Reads trees that were serialized as [`CstNode`] JSON.
///
/// Nesting depth is bounded by memory only: serde_json's recursion limit is lifted and
/// deserialization grows the stack on demand.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeParser;

impl TreeParser for JsonTreeParser {
    type Node = CstNode;

    fn parse(&self, source: &str) -> Result<CstNode, TreeError> {
        let mut json = serde_json::Deserializer::from_str(source);
        json.disable_recursion_limit();
        let node = CstNode::deserialize(serde_stacker::Deserializer::new(&mut json))?;
        json.end()?;
        if node.tag.is_empty() {
            return Err(TreeError::Parse("root node has an empty tag".to_string()));
        }
        Ok(node)
    }
}
