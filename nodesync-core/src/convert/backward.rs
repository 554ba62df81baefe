//! Backward conversion: instances + edges → source text
//!
//! Emission walks each root depth-first in schema order:
//!
//! | unit                 | output                                                  |
//! |----------------------|---------------------------------------------------------|
//! | Token                | value, then a space                                     |
//! | TokenList            | value with `,` turned into spaces, then a space         |
//! | node field           | children from the edge index, in order                  |
//! | separated node list  | children with `", "` between siblings, never trailing   |
//! | Choice               | only the selected alternative (index clamped)           |
//! | Sequence             | every child in order                                    |
//!
//! Empty values emit nothing. The raw output is whitespace-heavy; a
//! [`Formatter`](crate::format::Formatter) can tidy it afterwards.

use crate::error::FormatError;
use crate::format::Formatter;
use crate::graph::{Edge, EdgeIndex};
use crate::schema::{FieldTypeKind, FieldUnit, Instance, InstanceId};
use std::collections::{HashMap, HashSet};

/// Source of live instance state by id.
pub trait InstanceStore {
    /// The instance behind `id`, or `None` when the node has no live state.
    fn instance(&self, id: InstanceId) -> Option<&Instance>;
}

impl InstanceStore for HashMap<InstanceId, Instance> {
    fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.get(&id)
    }
}

impl InstanceStore for [Instance] {
    fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.iter().find(|instance| instance.id() == id)
    }
}

enum Work<'s> {
    Node(InstanceId),
    Unit(InstanceId, &'s FieldUnit),
    Text(&'static str),
    Exit(InstanceId),
}

const SEPARATOR: &str = ", ";

/// Turns graph instances back into text.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackwardConverter;

impl BackwardConverter {
    pub fn new() -> Self {
        BackwardConverter
    }

    /// Emit `roots` in order, resolving children through `edges`.
    pub fn convert<S>(&self, roots: &[InstanceId], store: &S, edges: &[Edge]) -> String
    where
        S: InstanceStore + ?Sized,
    {
        self.convert_indexed(roots, store, &EdgeIndex::build(edges))
    }

    /// Same as [`convert`](Self::convert) with a prebuilt edge index.
    pub fn convert_indexed<S>(&self, roots: &[InstanceId], store: &S, index: &EdgeIndex) -> String
    where
        S: InstanceStore + ?Sized,
    {
        let mut out = String::new();
        let mut active: HashSet<InstanceId> = HashSet::new();
        let mut stack: Vec<Work<'_>> = roots.iter().rev().map(|&id| Work::Node(id)).collect();

        while let Some(work) = stack.pop() {
            match work {
                Work::Node(id) => {
                    if active.contains(&id) {
                        tracing::warn!(id = %id, "node is its own ancestor; cycle skipped");
                        continue;
                    }
                    let Some(instance) = store.instance(id) else {
                        tracing::debug!(id = %id, "node has no live state; nothing emitted");
                        continue;
                    };
                    active.insert(id);
                    stack.push(Work::Exit(id));
                    stack.extend(instance.fields().iter().rev().map(|unit| Work::Unit(id, unit)));
                }
                Work::Unit(owner, unit) => match unit {
                    FieldUnit::Single { field, value } => match field.kind() {
                        FieldTypeKind::Token => {
                            if let Some(text) = value.as_deref().filter(|v| !v.is_empty()) {
                                out.push_str(text);
                                out.push(' ');
                            }
                        }
                        FieldTypeKind::TokenList => {
                            if let Some(text) = value.as_deref().filter(|v| !v.is_empty()) {
                                out.push_str(&text.replace(',', " "));
                                out.push(' ');
                            }
                        }
                        kind @ (FieldTypeKind::SingleNode
                        | FieldTypeKind::NodeList
                        | FieldTypeKind::SeparatedNodeList) => {
                            let children = index.children(owner, &field.name);
                            for (i, &child) in children.iter().enumerate().rev() {
                                stack.push(Work::Node(child));
                                if i > 0 && kind.needs_separator() {
                                    stack.push(Work::Text(SEPARATOR));
                                }
                            }
                        }
                        FieldTypeKind::Unknown => {}
                    },
                    FieldUnit::Choice {
                        children,
                        choice_index,
                        ..
                    } => {
                        if let Some(last) = children.len().checked_sub(1) {
                            stack.push(Work::Unit(owner, &children[(*choice_index).min(last)]));
                        }
                    }
                    FieldUnit::Sequence { children } => {
                        stack.extend(children.iter().rev().map(|unit| Work::Unit(owner, unit)));
                    }
                },
                Work::Text(text) => out.push_str(text),
                Work::Exit(id) => {
                    active.remove(&id);
                }
            }
        }

        out
    }

    /// Emit, then hand the text to `formatter`.
    pub fn convert_formatted<S>(
        &self,
        roots: &[InstanceId],
        store: &S,
        edges: &[Edge],
        formatter: &dyn Formatter,
    ) -> Result<String, FormatError>
    where
        S: InstanceStore + ?Sized,
    {
        formatter.format(&self.convert(roots, store, edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Template};
    use std::sync::Arc;

    fn template(name: &str, fields: Vec<FieldUnit>) -> Arc<Template> {
        Arc::new(Template::new(name, fields))
    }

    fn token(name: &str) -> FieldUnit {
        FieldUnit::field(FieldSpec::new(name, "SyntaxToken"))
    }

    fn identifier(text: &str) -> Instance {
        Instance::stamp(template("IdentifierNameSyntax", vec![token("Identifier")]))
            .with_value("Identifier", Some(text.to_string()))
    }

    fn store(instances: &[&Instance]) -> HashMap<InstanceId, Instance> {
        instances.iter().map(|i| (i.id(), (*i).clone())).collect()
    }

    #[test]
    fn test_separated_list_puts_separator_between_siblings_only() {
        let list = Instance::stamp(template(
            "ArgumentListSyntax",
            vec![
                token("OpenParenToken"),
                FieldUnit::field(FieldSpec::new("Arguments", "SeparatedSyntaxList<ArgumentSyntax>")),
                token("CloseParenToken"),
            ],
        ))
        .with_value("OpenParenToken", Some("(".to_string()))
        .with_value("CloseParenToken", Some(")".to_string()));
        let (a, b, c) = (identifier("a"), identifier("b"), identifier("c"));
        let edges = vec![
            Edge::new(list.id(), "Arguments", a.id()),
            Edge::new(list.id(), "Arguments", b.id()),
            Edge::new(list.id(), "Arguments", c.id()),
        ];

        let text = BackwardConverter::new().convert(&[list.id()], &store(&[&list, &a, &b, &c]), &edges);
        assert_eq!(text, "( a , b , c ) ");
        assert_eq!(text.matches(',').count(), 2);
    }

    #[test]
    fn test_plain_list_has_no_separators() {
        let block = Instance::stamp(template(
            "BlockSyntax",
            vec![FieldUnit::field(FieldSpec::new("Statements", "SyntaxList<StatementSyntax>"))],
        ));
        let (a, b) = (identifier("a"), identifier("b"));
        let edges = vec![
            Edge::new(block.id(), "Statements", a.id()),
            Edge::new(block.id(), "Statements", b.id()),
        ];
        let text = BackwardConverter::new().convert(&[block.id()], &store(&[&block, &a, &b]), &edges);
        assert_eq!(text, "a b ");
    }

    #[test]
    fn test_token_list_commas_become_spaces() {
        let instance = Instance::stamp(template(
            "FieldDeclarationSyntax",
            vec![FieldUnit::field(FieldSpec::new("Modifiers", "SyntaxList<SyntaxToken>"))],
        ))
        .with_value("Modifiers", Some("public,static".to_string()));
        let text = BackwardConverter::new().convert(&[instance.id()], &store(&[&instance]), &[]);
        assert_eq!(text, "public static ");
    }

    #[test]
    fn test_choice_index_is_clamped() {
        let instance = Instance::stamp(template(
            "T",
            vec![FieldUnit::choice(vec![token("A"), token("B")], false)],
        ))
        .with_value("A", Some("a".to_string()))
        .with_value("B", Some("b".to_string()))
        .with_choice(&[0], 7)
        .unwrap();
        let text = BackwardConverter::new().convert(&[instance.id()], &store(&[&instance]), &[]);
        assert_eq!(text, "b ");
    }

    #[test]
    fn test_empty_choice_emits_nothing() {
        let instance = Instance::stamp(template("T", vec![FieldUnit::choice(Vec::new(), true)]));
        let text = BackwardConverter::new().convert(&[instance.id()], &store(&[&instance]), &[]);
        assert_eq!(text, "");
    }

    #[test]
    fn test_nodes_without_state_emit_nothing() {
        let parent = Instance::stamp(template(
            "ParenthesizedExpressionSyntax",
            vec![
                token("OpenParenToken"),
                FieldUnit::field(FieldSpec::new("Expression", "ExpressionSyntax")),
                token("CloseParenToken"),
            ],
        ))
        .with_value("OpenParenToken", Some("(".to_string()))
        .with_value("CloseParenToken", Some(")".to_string()));
        let ghost = InstanceId::fresh();
        let edges = vec![Edge::new(parent.id(), "Expression", ghost)];
        let text = BackwardConverter::new().convert(&[parent.id()], &store(&[&parent]), &edges);
        assert_eq!(text, "( ) ");
    }

    #[test]
    fn test_cycles_are_cut() {
        let node = Instance::stamp(template(
            "ParenthesizedExpressionSyntax",
            vec![
                token("OpenParenToken"),
                FieldUnit::field(FieldSpec::new("Expression", "ExpressionSyntax")),
            ],
        ))
        .with_value("OpenParenToken", Some("(".to_string()));
        let edges = vec![Edge::new(node.id(), "Expression", node.id())];
        let text = BackwardConverter::new().convert(&[node.id()], &store(&[&node]), &edges);
        assert_eq!(text, "( ");
    }

    #[test]
    fn test_shared_child_is_emitted_per_parent() {
        let pair = Instance::stamp(template(
            "BinaryExpressionSyntax",
            vec![
                FieldUnit::field(FieldSpec::new("Left", "ExpressionSyntax")),
                token("OperatorToken"),
                FieldUnit::field(FieldSpec::new("Right", "ExpressionSyntax")),
            ],
        ))
        .with_value("OperatorToken", Some("*".to_string()));
        let x = identifier("x");
        let edges = vec![
            Edge::new(pair.id(), "Left", x.id()),
            Edge::new(pair.id(), "Right", x.id()),
        ];
        let text = BackwardConverter::new().convert(&[pair.id()], &store(&[&pair, &x]), &edges);
        assert_eq!(text, "x * x ");
    }
}
