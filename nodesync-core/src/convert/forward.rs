//! Forward conversion: concrete syntax tree → template instances
//!
//! For every tree node whose tag the catalog knows:
//!
//! 1. stamp a fresh instance of the matching template
//! 2. copy token text into the token fields ([`ForwardConverter::fill_values`])
//! 3. guess every Choice from the tags of the node's direct children (pass 1)
//! 4. convert the node-like fields' children
//! 5. re-resolve every Choice from the fields that actually produced children (pass 2)
//!
//! Pass 2 only looks at node-like fields. A Choice whose alternatives are all tokens,
//! such as `;` versus `=> expr;` terminators, or a Choice none of whose node fields
//! converted, keeps the pass 1 guess.
//!
//! Nodes whose tag has no template are dropped together with their subtree. That is a
//! coverage gap in the schema, not an error: it is logged and reported, and conversion
//! carries on with the siblings.

use super::ConvertedNode;
use crate::schema::{collect_singles, FieldUnit, Instance, SchemaCatalog};
use crate::tree::SyntaxNode;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Summary of one conversion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ForwardReport {
    /// Instances created
    pub converted: usize,
    /// Tags that had no template, once per skipped subtree, in visit order
    pub skipped: Vec<String>,
}

impl ForwardReport {
    /// True when every visited node had a template.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Converts concrete trees into [`ConvertedNode`]s using a schema catalog.
#[derive(Debug, Clone, Copy)]
pub struct ForwardConverter<'c> {
    catalog: &'c SchemaCatalog,
}

/// A node whose children are still being converted.
struct Frame<'t, N: ?Sized> {
    /// Field of the parent this node hangs from; `None` for the root
    field: Option<String>,
    instance: Instance,
    /// Children left to convert, last one first
    pending: Vec<(String, &'t N)>,
    children: IndexMap<String, Vec<ConvertedNode>>,
}

impl<'c> ForwardConverter<'c> {
    pub fn new(catalog: &'c SchemaCatalog) -> Self {
        ForwardConverter { catalog }
    }

    /// Convert `root` and everything below it.
    ///
    /// Returns `None` when the root's own tag has no template.
    pub fn convert<N: SyntaxNode + ?Sized>(&self, root: &N) -> Option<ConvertedNode> {
        self.convert_with_report(root).0
    }

    /// Like [`convert`](Self::convert), also reporting what was converted and skipped.
    pub fn convert_with_report<N: SyntaxNode + ?Sized>(
        &self,
        root: &N,
    ) -> (Option<ConvertedNode>, ForwardReport) {
        let mut report = ForwardReport::default();

        let Some(frame) = self.open(root, None, &mut report) else {
            return (None, report);
        };
        let mut stack = vec![frame];

        while let Some(top) = stack.last_mut() {
            if let Some((field, child)) = top.pending.pop() {
                if let Some(frame) = self.open(child, Some(field), &mut report) {
                    stack.push(frame);
                }
                continue;
            }

            let Some(frame) = stack.pop() else { break };
            let (field, node) = close(frame);
            match stack.last_mut() {
                Some(parent) => parent
                    .children
                    .entry(field.unwrap_or_default())
                    .or_default()
                    .push(node),
                None => {
                    tracing::info!(
                        converted = report.converted,
                        skipped = report.skipped.len(),
                        "forward conversion finished"
                    );
                    return (Some(node), report);
                }
            }
        }

        (None, report)
    }

    /// Fill token values and the pass 1 choice guesses of `instance` from `node`.
    ///
    /// Returns the updated instance; `instance` itself is untouched. Applying it again
    /// to its own output changes nothing.
    pub fn fill_values<N: SyntaxNode + ?Sized>(&self, instance: &Instance, node: &N) -> Instance {
        let mut token_fields: Vec<&str> = Vec::new();
        collect_singles(instance.fields(), &mut |spec| {
            if spec.kind().is_token() && !token_fields.contains(&spec.name.as_str()) {
                token_fields.push(&spec.name);
            }
        });

        let mut filled = instance.clone();
        for name in token_fields {
            if let Some(text) = node.field(name).and_then(|slot| slot.token_text()) {
                filled = filled.with_value(name, Some(text));
            }
        }

        let present = ChildTags {
            nodes: node.child_node_tags().into_iter().collect(),
            tokens: node.child_token_tags().into_iter().collect(),
        };
        let decisions = choice_decisions(filled.fields(), &|alternative| {
            present.matches(alternative)
        });
        apply_decisions(filled, decisions)
    }

    fn open<'t, N: SyntaxNode + ?Sized>(
        &self,
        node: &'t N,
        field: Option<String>,
        report: &mut ForwardReport,
    ) -> Option<Frame<'t, N>> {
        let Some(template) = self.catalog.template_for_tag(node.tag()) else {
            tracing::warn!(tag = node.tag(), "no template for tag; subtree skipped");
            report.skipped.push(node.tag().to_string());
            return None;
        };

        let instance = self.fill_values(&Instance::stamp(Arc::clone(template)), node);

        let mut pending = Vec::new();
        {
            let mut seen = HashSet::new();
            for spec in instance.node_fields() {
                if !seen.insert(spec.name.as_str()) {
                    continue;
                }
                if let Some(slot) = node.field(&spec.name) {
                    for child in slot.into_nodes() {
                        pending.push((spec.name.clone(), child));
                    }
                }
            }
        }
        pending.reverse();

        report.converted += 1;
        Some(Frame {
            field,
            instance,
            pending,
            children: IndexMap::new(),
        })
    }
}

fn close<N: ?Sized>(frame: Frame<'_, N>) -> (Option<String>, ConvertedNode) {
    let Frame {
        field,
        instance,
        children,
        ..
    } = frame;

    let decisions = choice_decisions(instance.fields(), &|alternative| {
        is_realized(alternative, &children)
    });
    let instance = apply_decisions(instance, decisions);

    tracing::debug!(
        template = instance.name(),
        id = %instance.id(),
        fields = children.len(),
        "converted node"
    );

    (
        field,
        ConvertedNode {
            instance,
            field_children: children,
        },
    )
}

struct ChildTags<'a> {
    nodes: HashSet<&'a str>,
    tokens: HashSet<&'a str>,
}

impl ChildTags<'_> {
    /// Pass 1: whether the node's direct children look like `alternative`.
    fn matches(&self, alternative: &FieldUnit) -> bool {
        self.evidence(alternative) == Some(true)
    }

    /// `None` when the direct children say nothing either way about `unit`.
    fn evidence(&self, unit: &FieldUnit) -> Option<bool> {
        match unit {
            FieldUnit::Single { field, .. } => {
                let kind = field.kind();
                let seen = if kind.is_token() {
                    if field.kinds.is_empty() {
                        return None;
                    }
                    field.kinds.iter().any(|k| self.tokens.contains(k.as_str()))
                } else if kind.is_node() {
                    if field.kinds.is_empty() {
                        !self.nodes.is_empty()
                    } else {
                        field.kinds.iter().any(|k| self.nodes.contains(k.as_str()))
                    }
                } else {
                    return None;
                };
                // An optional field may legitimately be absent.
                (seen || !field.optional).then_some(seen)
            }
            FieldUnit::Sequence { children } => {
                let mut decided = children.iter().filter_map(|u| self.evidence(u)).peekable();
                decided.peek()?;
                Some(decided.all(|seen| seen))
            }
            FieldUnit::Choice { children, .. } => {
                let decided: Vec<bool> = children.iter().filter_map(|u| self.evidence(u)).collect();
                if decided.is_empty() {
                    None
                } else {
                    Some(decided.contains(&true))
                }
            }
        }
    }
}

/// Pass 2: whether `alternative` owns a node-like field that produced children.
fn is_realized(alternative: &FieldUnit, children: &IndexMap<String, Vec<ConvertedNode>>) -> bool {
    match alternative {
        FieldUnit::Single { field, .. } => {
            field.kind().is_node() && children.contains_key(&field.name)
        }
        FieldUnit::Sequence { children: units } | FieldUnit::Choice { children: units, .. } => {
            units.iter().any(|unit| is_realized(unit, children))
        }
    }
}

/// For every Choice in `units`, the path to it and its first alternative accepted by
/// `accept`. Choices with no accepted alternative are left out.
fn choice_decisions<F>(units: &[FieldUnit], accept: &F) -> Vec<(Vec<usize>, usize)>
where
    F: Fn(&FieldUnit) -> bool,
{
    fn walk<F: Fn(&FieldUnit) -> bool>(
        units: &[FieldUnit],
        accept: &F,
        path: &mut Vec<usize>,
        out: &mut Vec<(Vec<usize>, usize)>,
    ) {
        for (i, unit) in units.iter().enumerate() {
            path.push(i);
            if let FieldUnit::Choice { children, .. } = unit {
                if let Some(index) = children.iter().position(accept) {
                    out.push((path.clone(), index));
                }
            }
            walk(unit.children(), accept, path, out);
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(units, accept, &mut Vec::new(), &mut out);
    out
}

fn apply_decisions(instance: Instance, decisions: Vec<(Vec<usize>, usize)>) -> Instance {
    decisions
        .into_iter()
        .fold(instance, |current, (path, index)| {
            current.with_choice(&path, index).unwrap_or(current)
        })
}
