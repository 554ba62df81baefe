//! Treeviz: text rendering of converted trees and graphs
//!
//! One line per node, children indented under their parent with box-drawing
//! connectors. Each child line starts with the field it hangs from:
//!
//! ```text
//! BinaryExpressionSyntax [OperatorToken="+"]
//! ├─ Left: LiteralExpressionSyntax [Token="1"]
//! └─ Right: LiteralExpressionSyntax [Token="2"]
//! ```
//!
//! Parameters:
//!
//! - `"show-ids"`: when `"true"`, every label carries its instance id (`#12`)
//!
//! Labels list the token values set on the instance, following only the selected
//! alternative of each Choice.
//!
//! A graph node reachable along more than one path is expanded the first time only;
//! later occurrences are marked `(shown above)`.

use crate::convert::ConvertedNode;
use crate::graph::{EdgeIndex, NodeGraph};
use crate::schema::{FieldUnit, Instance, InstanceId};
use std::collections::{HashMap, HashSet};

pub fn converted_to_treeviz_str(root: &ConvertedNode) -> String {
    converted_to_treeviz_str_with_params(root, &HashMap::new())
}

pub fn converted_to_treeviz_str_with_params(
    root: &ConvertedNode,
    params: &HashMap<String, String>,
) -> String {
    let show_ids = flag(params, "show-ids");
    render(
        &[root],
        |node| node.id(),
        |node| instance_label(&node.instance, show_ids),
        |node| {
            node.field_children
                .iter()
                .flat_map(|(field, children)| children.iter().map(move |c| (field.clone(), c)))
                .collect()
        },
    )
}

pub fn graph_to_treeviz_str(graph: &NodeGraph) -> String {
    graph_to_treeviz_str_with_params(graph, &HashMap::new())
}

pub fn graph_to_treeviz_str_with_params(
    graph: &NodeGraph,
    params: &HashMap<String, String>,
) -> String {
    let show_ids = flag(params, "show-ids");
    let index = EdgeIndex::build(graph.edges());
    let roots = graph.roots();

    render(
        &roots,
        |id| id,
        |id| match graph.node(id).and_then(|n| n.instance.as_ref()) {
            Some(instance) => instance_label(instance, show_ids),
            None if show_ids => format!("∅ placeholder {id}"),
            None => "∅ placeholder".to_string(),
        },
        |id| {
            let Some(instance) = graph.node(id).and_then(|n| n.instance.as_ref()) else {
                return Vec::new();
            };
            let mut seen = HashSet::new();
            let mut kids = Vec::new();
            for spec in instance.node_fields() {
                if !seen.insert(spec.name.as_str()) {
                    continue;
                }
                for &child in index.children(id, &spec.name) {
                    kids.push((spec.name.clone(), child));
                }
            }
            kids
        },
    )
}

fn flag(params: &HashMap<String, String>, key: &str) -> bool {
    params
        .get(key)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn instance_label(instance: &Instance, show_ids: bool) -> String {
    let mut label = instance.name().to_string();
    if show_ids {
        label.push_str(&format!(" {}", instance.id()));
    }

    let mut values = Vec::new();
    let mut stack: Vec<&FieldUnit> = instance.fields().iter().rev().collect();
    while let Some(unit) = stack.pop() {
        match unit {
            FieldUnit::Single {
                field,
                value: Some(value),
            } => values.push(format!("{}={:?}", field.name, value)),
            FieldUnit::Single { .. } => {}
            FieldUnit::Choice {
                children,
                choice_index,
                ..
            } => {
                if let Some(last) = children.len().checked_sub(1) {
                    stack.push(&children[(*choice_index).min(last)]);
                }
            }
            FieldUnit::Sequence { children } => stack.extend(children.iter().rev()),
        }
    }
    if !values.is_empty() {
        label.push_str(&format!(" [{}]", values.join(", ")));
    }
    label
}

struct Line<T> {
    node: T,
    field: Option<String>,
    prefix: String,
    /// `None` for roots, otherwise whether this is the parent's last child
    last: Option<bool>,
}

fn render<T, K, L, C>(roots: &[T], key: K, label: L, children: C) -> String
where
    T: Copy,
    K: Fn(T) -> InstanceId,
    L: Fn(T) -> String,
    C: Fn(T) -> Vec<(String, T)>,
{
    let mut output = String::new();
    let mut shown = HashSet::new();
    let mut stack: Vec<Line<T>> = roots
        .iter()
        .rev()
        .map(|&node| Line {
            node,
            field: None,
            prefix: String::new(),
            last: None,
        })
        .collect();

    while let Some(line) = stack.pop() {
        let child_prefix = match line.last {
            None => String::new(),
            Some(is_last) => {
                let connector = if is_last { "└─" } else { "├─" };
                output.push_str(&format!("{}{} ", line.prefix, connector));
                format!("{}{}", line.prefix, if is_last { "  " } else { "│ " })
            }
        };
        if let Some(field) = &line.field {
            output.push_str(&format!("{field}: "));
        }
        output.push_str(&label(line.node));

        if !shown.insert(key(line.node)) {
            output.push_str(" (shown above)\n");
            continue;
        }
        output.push('\n');

        let kids = children(line.node);
        let count = kids.len();
        for (i, (field, node)) in kids.into_iter().enumerate().rev() {
            stack.push(Line {
                node,
                field: Some(field),
                prefix: child_prefix.clone(),
                last: Some(i + 1 == count),
            });
        }
    }

    output
}
