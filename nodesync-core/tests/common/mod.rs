//! Fixture loading shared by the integration tests.

use nodesync_core::convert::{BackwardConverter, ConvertedNode};
use nodesync_core::format::{Formatter, WhitespaceFormatter};
use nodesync_core::graph::NodeGraph;
use nodesync_core::schema::SchemaCatalog;
use nodesync_core::tree::{CstField, CstNode, CstToken, JsonTreeParser, TreeParser};
use std::path::PathBuf;

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}

/// The expression/statement schema used across the suite.
pub fn catalog() -> SchemaCatalog {
    SchemaCatalog::from_xml(&fixture("expressions.xml")).expect("fixture schema should parse")
}

pub fn tree(name: &str) -> CstNode {
    JsonTreeParser
        .parse(&fixture(name))
        .unwrap_or_else(|e| panic!("Failed to parse tree fixture {name}: {e}"))
}

/// Raw backward emission of a converted tree.
pub fn emit(converted: &ConvertedNode) -> String {
    let graph = NodeGraph::from_converted(converted);
    emit_graph(&graph)
}

pub fn emit_graph(graph: &NodeGraph) -> String {
    BackwardConverter::new().convert(&graph.roots(), graph, graph.edges())
}

pub fn tidy(text: &str) -> String {
    WhitespaceFormatter.format(text).expect("whitespace formatting never fails")
}

/// Token texts of a concrete tree in field order, skipping missing and empty tokens.
pub fn token_texts(root: &CstNode) -> Vec<String> {
    enum Item<'a> {
        Text(&'a str),
        Node(&'a CstNode),
    }

    let mut out = Vec::new();
    let mut stack = vec![Item::Node(root)];
    while let Some(item) = stack.pop() {
        let node = match item {
            Item::Text(text) => {
                out.push(text.to_string());
                continue;
            }
            Item::Node(node) => node,
        };
        let mut expanded = Vec::new();
        for field in node.fields.values() {
            match field {
                CstField::Token(t) => expanded.push(Item::Text(usable(t))),
                CstField::Tokens(ts) => expanded.extend(ts.iter().map(|t| Item::Text(usable(t)))),
                CstField::Node(n) => expanded.push(Item::Node(n)),
                CstField::Nodes(ns) => expanded.extend(ns.iter().map(Item::Node)),
            }
        }
        stack.extend(expanded.into_iter().rev());
    }
    out.retain(|text| !text.is_empty());
    out
}

fn usable(token: &CstToken) -> &str {
    if token.missing {
        ""
    } else {
        &token.text
    }
}
