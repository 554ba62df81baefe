//! Error types for schema loading, tree/graph I/O and formatting
//!
//! None of these are raised by the converters themselves: coverage gaps, undeclared
//! attributes and nodes without live state are logged and skipped. Errors only exist at
//! the edges, where documents are parsed or the graph is edited.

use crate::schema::InstanceId;
use thiserror::Error;

/// Errors produced while reading a schema document
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Root element is <{0}>, expected <Tree>")]
    UnexpectedRoot(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },

    #[error("Schema loader failed: {0}")]
    Load(String),
}

/// Errors produced at the concrete-tree boundary
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Tree JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors produced by graph edits and graph (de)serialization
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} is not part of the graph")]
    UnknownNode(InstanceId),

    #[error("Node {0} has no template state")]
    NoLiveState(InstanceId),

    #[error("Template '{template}' has no node field named '{field}'")]
    NotANodeField { template: String, field: String },

    #[error("Template '{0}' not found in schema")]
    UnknownTemplate(String),

    #[error("Node {id} has no choice at {path:?} accepting index {index}")]
    InvalidChoice {
        id: InstanceId,
        path: Vec<usize>,
        index: usize,
    },

    #[error("Node id {0} is out of range")]
    IdOutOfRange(InstanceId),

    #[error("Graph JSON error: {0}")]
    Json(String),
}

/// Errors from the optional formatter hand-off
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Formatter '{0}' not found")]
    FormatterNotFound(String),

    #[error("Formatting error: {0}")]
    Format(String),
}

/// Errors surfaced by the end-to-end synchronizer
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Format(#[from] FormatError),
}
