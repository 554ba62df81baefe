//! Field type classification
//!
//! The schema declares each field with a type string taken verbatim from the grammar
//! (`SyntaxToken`, `SyntaxList<AttributeListSyntax>`, `ExpressionSyntax`, ...). The
//! converters never look at those strings directly: they only care whether a field
//! carries text, a single child node or an ordered run of child nodes.
//!
//! Rules are applied in priority order: exact match, then prefix, then suffix.

use serde::{Deserialize, Serialize};

/// What a schema field holds, derived from its declared type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTypeKind {
    /// A single token (`SyntaxToken`)
    Token,
    /// A token list (`SyntaxList<SyntaxToken>`)
    TokenList,
    /// A single child node (`*Syntax`)
    SingleNode,
    /// A node list (`SyntaxList<T>`)
    NodeList,
    /// A separated node list (`SeparatedSyntaxList<T>`)
    SeparatedNodeList,
    /// Anything else
    Unknown,
}

impl FieldTypeKind {
    /// Classify a declared field type string.
    pub fn classify(field_type: &str) -> FieldTypeKind {
        if field_type.is_empty() {
            return FieldTypeKind::Unknown;
        }

        match field_type {
            "SyntaxToken" => return FieldTypeKind::Token,
            "SyntaxList<SyntaxToken>" => return FieldTypeKind::TokenList,
            _ => {}
        }

        // SeparatedSyntaxList must be tested before SyntaxList.
        if field_type.starts_with("SeparatedSyntaxList") {
            return FieldTypeKind::SeparatedNodeList;
        }
        if field_type.starts_with("SyntaxList") {
            return FieldTypeKind::NodeList;
        }

        if field_type.ends_with("Syntax") {
            return FieldTypeKind::SingleNode;
        }

        FieldTypeKind::Unknown
    }

    /// Token-based kinds carry text values.
    pub fn is_token(self) -> bool {
        matches!(self, FieldTypeKind::Token | FieldTypeKind::TokenList)
    }

    /// Node-based kinds own outgoing graph edges.
    pub fn is_node(self) -> bool {
        matches!(
            self,
            FieldTypeKind::SingleNode | FieldTypeKind::NodeList | FieldTypeKind::SeparatedNodeList
        )
    }

    /// List kinds accept any number of children.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            FieldTypeKind::NodeList | FieldTypeKind::SeparatedNodeList
        )
    }

    /// Only separated lists put a separator between siblings.
    pub fn needs_separator(self) -> bool {
        self == FieldTypeKind::SeparatedNodeList
    }
}
