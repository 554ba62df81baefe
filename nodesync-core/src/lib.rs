//! Schema-driven synchronization between syntax trees and node graphs
//!
//!     This crate converts a concrete syntax tree into an editable graph of typed nodes, and
//!     that graph back into source text. Nothing in it is written per node kind: a schema
//!     document declares every node kind of the grammar, and the converters are driven by it.
//!
//!     TLDR:
//!         - The grammar parser is not ours. Trees come in through the SyntaxNode trait.
//!         - Templates come from the schema document, instances are stamped from templates.
//!         - Forward: tree → instances (ConvertedNode) → NodeGraph.
//!         - Backward: NodeGraph → text, optionally tidied by a Formatter.
//!
//! Architecture
//!
//!     The schema layer (./schema) is the core. A Template's field list is a tree of
//!     FieldUnits (Single / Choice / Sequence) that serves both as the static shape and as the
//!     per-instance state (token values, selected alternatives). Instances share the template's
//!     tree and copy only the path to what they change, so templates are never written to.
//!
//!     This is a pure lib, that is, it powers nodesync-cli but is shell agnostic: no code
//!     here prints, reads env vars or touches the filesystem.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── schema
//!     │   ├── classify.rs         # field type string → FieldTypeKind
//!     │   ├── model.rs            # Template, FieldUnit, Instance, copy-on-write updates
//!     │   ├── document.rs         # schema XML → SchemaDocument
//!     │   └── catalog.rs          # lookup indices, SharedCatalog
//!     ├── tree                    # SyntaxNode boundary, CstNode, TreeParser
//!     ├── convert
//!     │   ├── forward.rs          # tree → ConvertedNode
//!     │   └── backward.rs         # instances + edges → text
//!     ├── graph                   # NodeGraph, edges, EdgeIndex
//!     ├── format.rs               # Formatter trait definition
//!     ├── registry.rs             # FormatterRegistry for discovery and selection
//!     ├── sync.rs                 # the full text → graph → text pipeline
//!     ├── treeviz.rs              # debugging view of trees and graphs
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     ├── <area>
//!     │   └── mod.rs
//!     └── fixtures
//!         ├── expressions.xml
//!         └── <tree>.json
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.
//!
//! Core Algorithms
//!
//!     Forward conversion picks the template by tag, fills token values, then resolves every
//!     Choice twice: first from the tags of the node's direct children, then, once the children
//!     are converted, from which node fields actually produced something. See ./convert/forward.rs.
//!
//!     Backward conversion indexes edges by (source, field) once, then emits depth-first in
//!     schema order. See ./convert/backward.rs.
//!
//!     Both walks use an explicit stack; tree depth is bounded by memory only.
//!
//! Library Choices
//!
//!     XML is read with roxmltree, trees and graphs are (de)serialized with serde, and field
//!     maps that must keep declaration order use indexmap.

pub mod convert;
pub mod error;
pub mod format;
pub mod graph;
pub mod registry;
pub mod schema;
pub mod sync;
pub mod tree;
pub mod treeviz;

pub use convert::{BackwardConverter, ConvertedNode, ForwardConverter, ForwardReport, InstanceStore};
pub use error::{FormatError, GraphError, SchemaError, SyncError, TreeError};
pub use format::Formatter;
pub use graph::{Edge, EdgeIndex, GraphNode, NodeGraph};
pub use registry::FormatterRegistry;
pub use schema::{FieldTypeKind, Instance, InstanceId, SchemaCatalog, SharedCatalog, Template};
pub use sync::{GraphSync, SyncOptions, Synchronizer};
pub use tree::{CstNode, JsonTreeParser, SyntaxNode, TreeParser};
