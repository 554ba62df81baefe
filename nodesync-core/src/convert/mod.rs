//! Tree ↔ graph conversion
//!
//! - [`forward`]: concrete syntax tree → [`ConvertedNode`] tree of template instances
//! - [`backward`]: instances + edges → source text
//!
//! Both directions walk with an explicit stack, so input depth is bounded by memory
//! and not by the call stack.

pub mod backward;
pub mod forward;

pub use backward::{BackwardConverter, InstanceStore};
pub use forward::{ForwardConverter, ForwardReport};

use crate::schema::{Instance, InstanceId};
use indexmap::IndexMap;

/// Result of forward conversion: an instance and its converted children per field.
///
/// Field keys follow schema declaration order. A key is only present when at least one
/// child under that field converted.
#[derive(Debug, Clone)]
pub struct ConvertedNode {
    pub instance: Instance,
    pub field_children: IndexMap<String, Vec<ConvertedNode>>,
}

impl ConvertedNode {
    pub fn new(instance: Instance) -> Self {
        ConvertedNode {
            instance,
            field_children: IndexMap::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.instance.id()
    }

    /// Converted children under `field`; empty when the field produced none.
    pub fn children(&self, field: &str) -> &[ConvertedNode] {
        self.field_children
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every instance of the tree in pre-order.
    pub fn instances(&self) -> Vec<&Instance> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(&node.instance);
            for children in node.field_children.values().rev() {
                stack.extend(children.iter().rev());
            }
        }
        out
    }

    /// Number of instances in the tree.
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.field_children.values().flatten());
        }
        count
    }
}

impl Drop for ConvertedNode {
    fn drop(&mut self) {
        let mut pending: Vec<ConvertedNode> = self
            .field_children
            .drain(..)
            .flat_map(|(_, children)| children)
            .collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.field_children.drain(..).flat_map(|(_, children)| children));
        }
    }
}
