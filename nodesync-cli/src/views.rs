//! CLI-specific inspection views
//!
//! Each view is a stage + format combination (e.g., "graph-treeviz", "tree-json").
//!
//! ## Stages
//!
//! 1. **Tree** - the concrete syntax tree as read from JSON
//!    - `tree-json`: the tree, re-serialized
//! 2. **Converted** - the tree after forward conversion (instances nested by field)
//!    - `converted-treeviz`: tree visualization
//! 3. **Graph** - the node graph materialized from the converted tree
//!    - `graph-treeviz`: tree visualization walked from the graph roots
//!    - `graph-json`: graph JSON, as written by `nodesync forward`
//!
//! ## Extra Parameters
//!
//! - `show-ids`: when set to "true", treeviz labels carry instance ids
//!
//! Example: `nodesync inspect tree.json graph-treeviz --extra-show-ids`

use nodesync_core::convert::{ConvertedNode, ForwardConverter, ForwardReport};
use nodesync_core::graph::NodeGraph;
use nodesync_core::schema::SchemaCatalog;
use nodesync_core::tree::{JsonTreeParser, TreeParser};
use nodesync_core::treeviz::{converted_to_treeviz_str_with_params, graph_to_treeviz_str_with_params};
use std::collections::HashMap;

/// All available inspection views (stage + format combinations)
pub const AVAILABLE_VIEWS: &[&str] = &[
    "tree-json",
    "converted-treeviz",
    "graph-treeviz",
    "graph-json",
];

pub const DEFAULT_VIEW: &str = "converted-treeviz";

/// Rendered view plus what forward conversion could not cover.
pub struct ViewOutput {
    pub text: String,
    pub report: Option<ForwardReport>,
}

/// Render `source` (tree JSON) through the named view.
pub fn execute_view(
    source: &str,
    catalog: &SchemaCatalog,
    view: &str,
    extra_params: &HashMap<String, String>,
) -> Result<ViewOutput, String> {
    let tree = JsonTreeParser
        .parse(source)
        .map_err(|e| format!("Tree error: {e}"))?;

    if view == "tree-json" {
        let text = serde_json::to_string_pretty(&tree)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        return Ok(ViewOutput { text, report: None });
    }

    let (converted, report) = ForwardConverter::new(catalog).convert_with_report(&tree);
    let text = match view {
        "converted-treeviz" => converted
            .as_ref()
            .map(|root| converted_to_treeviz_str_with_params(root, extra_params))
            .unwrap_or_default(),
        "graph-treeviz" => graph_to_treeviz_str_with_params(&to_graph(converted.as_ref()), extra_params),
        "graph-json" => to_graph(converted.as_ref())
            .to_json()
            .map_err(|e| e.to_string())?,
        other => return Err(format!("Unknown view: {other}")),
    };

    Ok(ViewOutput {
        text,
        report: Some(report),
    })
}

fn to_graph(converted: Option<&ConvertedNode>) -> NodeGraph {
    converted.map(NodeGraph::from_converted).unwrap_or_default()
}
