//! (source, field) → ordered targets

use super::Edge;
use crate::schema::InstanceId;
use std::collections::HashMap;

/// Lookup of a node's children per field, built once per backward conversion.
#[derive(Debug, Default, Clone)]
pub struct EdgeIndex {
    targets: HashMap<InstanceId, HashMap<String, Vec<InstanceId>>>,
}

impl EdgeIndex {
    /// Index `edges` in a single pass. Target order follows edge order.
    ///
    /// Edges with an empty field name belong to no field and are ignored.
    pub fn build<'e, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = &'e Edge>,
    {
        let mut targets: HashMap<InstanceId, HashMap<String, Vec<InstanceId>>> = HashMap::new();
        for edge in edges {
            if edge.field.is_empty() {
                continue;
            }
            targets
                .entry(edge.source)
                .or_default()
                .entry(edge.field.clone())
                .or_default()
                .push(edge.target);
        }
        EdgeIndex { targets }
    }

    /// Children of `source` under `field`, in order; empty when there are none.
    pub fn children(&self, source: InstanceId, field: &str) -> &[InstanceId] {
        self.targets
            .get(&source)
            .and_then(|fields| fields.get(field))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
