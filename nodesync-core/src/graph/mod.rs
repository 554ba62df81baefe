//! Node graph: the editable side of the synchronization
//!
//! A [`NodeGraph`] holds one [`GraphNode`] per template instance and an ordered list of
//! field-scoped [`Edge`]s. Edge order matters: the children of a list field are emitted
//! in the order their edges were added.
//!
//! Graphs come from forward conversion ([`NodeGraph::from_converted`]) or from JSON,
//! and are then edited: nodes added and removed, values set, choices switched, edges
//! connected. A node may exist without template state (a placeholder created by the
//! editor); backward conversion emits nothing for it.
//!
//! Connection rules follow the editor's ports:
//!
//! - every node has one input, so connecting into a target replaces its previous parent
//! - a single-node field holds one child, so connecting replaces its previous child
//! - list fields accept any number of children, appended in order

mod edge_index;

pub use edge_index::EdgeIndex;

use crate::convert::{ConvertedNode, InstanceStore};
use crate::error::GraphError;
use crate::schema::{
    unit_at, FieldTypeKind, FieldUnit, Instance, InstanceId, SchemaCatalog, Template,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Directed connection from a field of `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: InstanceId,
    pub field: String,
    pub target: InstanceId,
}

impl Edge {
    pub fn new(source: InstanceId, field: impl Into<String>, target: InstanceId) -> Self {
        Edge {
            source,
            field: field.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: InstanceId,
    /// `None` for nodes without template state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<Instance>,
}

/// Serialized form of a [`NodeGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphDocument {
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct NodeGraph {
    nodes: IndexMap<InstanceId, GraphNode>,
    edges: Vec<Edge>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a converted tree: one node per instance, one edge per child.
    pub fn from_converted(root: &ConvertedNode) -> Self {
        let mut graph = NodeGraph::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            graph.insert(node.instance.clone());
            for (field, children) in &node.field_children {
                for child in children {
                    graph.edges.push(Edge::new(node.id(), field.as_str(), child.id()));
                }
            }
            for children in node.field_children.values().rev() {
                stack.extend(children.iter().rev());
            }
        }
        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "graph materialized"
        );
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: InstanceId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Children of `source` under `field`, in edge order.
    pub fn children(&self, source: InstanceId, field: &str) -> Vec<InstanceId> {
        self.edges
            .iter()
            .filter(|e| e.source == source && e.field == field)
            .map(|e| e.target)
            .collect()
    }

    /// Nodes without an incoming edge, in insertion order.
    pub fn roots(&self) -> Vec<InstanceId> {
        let targets: HashSet<InstanceId> = self.edges.iter().map(|e| e.target).collect();
        self.nodes
            .keys()
            .filter(|id| !targets.contains(id))
            .copied()
            .collect()
    }

    /// Add a fresh instance of `template`.
    pub fn add_node(&mut self, template: Arc<Template>) -> InstanceId {
        self.insert(Instance::stamp(template))
    }

    /// Add a fresh instance of the template called `name`.
    pub fn add_named(&mut self, catalog: &SchemaCatalog, name: &str) -> Result<InstanceId, GraphError> {
        let template = catalog
            .template(name)
            .ok_or_else(|| GraphError::UnknownTemplate(name.to_string()))?;
        Ok(self.add_node(Arc::clone(template)))
    }

    /// Add an existing instance, replacing any node with the same id.
    pub fn insert(&mut self, instance: Instance) -> InstanceId {
        let id = instance.id();
        self.nodes.insert(
            id,
            GraphNode {
                id,
                instance: Some(instance),
            },
        );
        id
    }

    /// Add a node without template state.
    pub fn add_placeholder(&mut self) -> InstanceId {
        let id = InstanceId::fresh();
        self.nodes.insert(id, GraphNode { id, instance: None });
        id
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: InstanceId) -> Result<GraphNode, GraphError> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::UnknownNode(id))?;
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(node)
    }

    /// Set (or clear) the value of field `field` on node `id`.
    pub fn set_value(
        &mut self,
        id: InstanceId,
        field: &str,
        value: Option<String>,
    ) -> Result<(), GraphError> {
        let slot = self.live_slot(id)?;
        *slot = slot.with_value(field, value);
        Ok(())
    }

    /// Select alternative `index` of the Choice at `path` on node `id`.
    pub fn select_choice(
        &mut self,
        id: InstanceId,
        path: &[usize],
        index: usize,
    ) -> Result<(), GraphError> {
        let slot = self.live_slot(id)?;
        let invalid = || GraphError::InvalidChoice {
            id,
            path: path.to_vec(),
            index,
        };
        match unit_at(slot.fields(), path) {
            Some(FieldUnit::Choice { children, .. }) if index < children.len() => {}
            _ => return Err(invalid()),
        }
        *slot = slot.with_choice(path, index).ok_or_else(invalid)?;
        Ok(())
    }

    /// Connect node field `field` of `source` to `target`.
    pub fn connect(
        &mut self,
        source: InstanceId,
        field: &str,
        target: InstanceId,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&target) {
            return Err(GraphError::UnknownNode(target));
        }
        let kind = self.node_field_kind(source, field)?;

        self.edges.retain(|e| {
            let replaces_input = e.target == target;
            let replaces_output =
                kind == FieldTypeKind::SingleNode && e.source == source && e.field == field;
            !(replaces_input || replaces_output)
        });
        self.edges.push(Edge::new(source, field, target));
        Ok(())
    }

    /// Remove the edge `source.field → target`. Returns whether it existed.
    pub fn disconnect(&mut self, source: InstanceId, field: &str, target: InstanceId) -> bool {
        let before = self.edges.len();
        self.edges
            .retain(|e| !(e.source == source && e.field == field && e.target == target));
        self.edges.len() != before
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Json(e.to_string()))
    }

    /// Load a graph and reserve its ids so new nodes never collide with them.
    pub fn from_json(source: &str) -> Result<Self, GraphError> {
        let document: GraphDocument =
            serde_json::from_str(source).map_err(|e| GraphError::Json(e.to_string()))?;
        NodeGraph::try_from(document)
    }

    fn live_slot(&mut self, id: InstanceId) -> Result<&mut Instance, GraphError> {
        self.nodes
            .get_mut(&id)
            .ok_or(GraphError::UnknownNode(id))?
            .instance
            .as_mut()
            .ok_or(GraphError::NoLiveState(id))
    }

    fn node_field_kind(&self, id: InstanceId, field: &str) -> Result<FieldTypeKind, GraphError> {
        let instance = self
            .nodes
            .get(&id)
            .ok_or(GraphError::UnknownNode(id))?
            .instance
            .as_ref()
            .ok_or(GraphError::NoLiveState(id))?;
        instance
            .node_fields()
            .into_iter()
            .find(|spec| spec.name == field)
            .map(|spec| spec.kind())
            .ok_or_else(|| GraphError::NotANodeField {
                template: instance.name().to_string(),
                field: field.to_string(),
            })
    }
}

impl InstanceStore for NodeGraph {
    fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.nodes.get(&id).and_then(|node| node.instance.as_ref())
    }
}

impl TryFrom<GraphDocument> for NodeGraph {
    type Error = GraphError;

    fn try_from(document: GraphDocument) -> Result<Self, GraphError> {
        let mut nodes = IndexMap::with_capacity(document.nodes.len());
        for node in document.nodes {
            if let Some(instance) = &node.instance {
                if instance.id() != node.id {
                    return Err(GraphError::Json(format!(
                        "node {} carries the state of {}",
                        node.id,
                        instance.id()
                    )));
                }
            }
            if !InstanceId::reserve_through(node.id) {
                return Err(GraphError::IdOutOfRange(node.id));
            }
            if nodes.insert(node.id, node).is_some() {
                return Err(GraphError::Json("duplicate node id".to_string()));
            }
        }

        for edge in &document.edges {
            for id in [edge.source, edge.target] {
                if !nodes.contains_key(&id) {
                    return Err(GraphError::UnknownNode(id));
                }
            }
        }

        Ok(NodeGraph {
            nodes,
            edges: document.edges,
        })
    }
}

impl From<NodeGraph> for GraphDocument {
    fn from(graph: NodeGraph) -> Self {
        GraphDocument {
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges,
        }
    }
}
