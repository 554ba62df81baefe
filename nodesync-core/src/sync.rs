//! End-to-end synchronization: text → tree → graph → text
//!
//! Every call is a full recomputation. [`Synchronizer::code_to_graph`] parses and
//! converts from scratch and hands back a graph with fresh ids; nothing is diffed
//! against an earlier graph.

use crate::convert::{BackwardConverter, ForwardConverter, ForwardReport};
use crate::error::SyncError;
use crate::graph::NodeGraph;
use crate::registry::FormatterRegistry;
use crate::schema::SharedCatalog;
use crate::tree::TreeParser;

/// Options for the graph → text direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Formatter applied to emitted text; `None` returns the raw emission
    pub formatter: Option<String>,
}

impl SyncOptions {
    pub fn with_formatter(formatter: impl Into<String>) -> Self {
        SyncOptions {
            formatter: Some(formatter.into()),
        }
    }
}

/// Graph produced from source text, with what the forward pass had to skip.
#[derive(Debug, Clone)]
pub struct GraphSync {
    pub graph: NodeGraph,
    pub report: ForwardReport,
}

pub struct Synchronizer<P: TreeParser> {
    catalog: SharedCatalog,
    parser: P,
    options: SyncOptions,
    formatters: FormatterRegistry,
}

impl<P: TreeParser> Synchronizer<P> {
    pub fn new(catalog: SharedCatalog, parser: P) -> Self {
        Synchronizer {
            catalog,
            parser,
            options: SyncOptions::default(),
            formatters: FormatterRegistry::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Parse `source` and convert it into a fresh graph.
    ///
    /// A root whose tag has no template yields an empty graph; the report says why.
    pub fn code_to_graph(&self, source: &str) -> Result<GraphSync, SyncError> {
        let catalog = self.catalog.get()?;
        let tree = self.parser.parse(source)?;

        let (converted, report) = ForwardConverter::new(&catalog).convert_with_report(&tree);
        let graph = converted
            .as_ref()
            .map(NodeGraph::from_converted)
            .unwrap_or_default();

        Ok(GraphSync { graph, report })
    }

    /// Emit the graph's roots as text, formatted per the options.
    pub fn graph_to_code(&self, graph: &NodeGraph) -> Result<String, SyncError> {
        let raw = BackwardConverter::new().convert(&graph.roots(), graph, graph.edges());
        match &self.options.formatter {
            Some(name) => Ok(self.formatters.format(&raw, name)?),
            None => Ok(raw),
        }
    }

    /// Text → graph → text.
    pub fn round_trip(&self, source: &str) -> Result<String, SyncError> {
        let synced = self.code_to_graph(source)?;
        self.graph_to_code(&synced.graph)
    }
}
