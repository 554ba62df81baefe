//! Text → graph → text through the Synchronizer

use crate::common::{emit_graph, fixture, token_texts, tree};
use nodesync_core::convert::ForwardConverter;
use nodesync_core::graph::NodeGraph;
use nodesync_core::schema::{SchemaCatalog, SharedCatalog};
use nodesync_core::sync::{SyncOptions, Synchronizer};
use nodesync_core::tree::{CstNode, JsonTreeParser};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const FIXTURES: [&str; 4] = [
    "one_plus_two.json",
    "invocation.json",
    "expression_bodied_method.json",
    "block_method.json",
];

fn synchronizer() -> Synchronizer<JsonTreeParser> {
    Synchronizer::new(
        SharedCatalog::new(|| SchemaCatalog::from_xml(&fixture("expressions.xml"))),
        JsonTreeParser,
    )
}

/// Emitted tokens, minus the separators backward conversion adds itself.
fn emitted_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|token| *token != ",")
        .map(str::to_string)
        .collect()
}

#[test]
fn test_token_sequence_survives_round_trip() {
    let sync = synchronizer();
    for name in FIXTURES {
        let text = sync.round_trip(&fixture(name)).unwrap();
        assert_eq!(
            emitted_tokens(&text),
            token_texts(&tree(name)),
            "token sequence of {name}"
        );
    }
}

#[test]
fn test_fully_covered_fixtures_report_no_gaps() {
    let sync = synchronizer();
    for name in FIXTURES {
        let synced = sync.code_to_graph(&fixture(name)).unwrap();
        assert!(synced.report.is_complete(), "{name}: {:?}", synced.report.skipped);
    }
}

#[test]
fn test_formatted_round_trip() {
    let sync = synchronizer().with_options(SyncOptions::with_formatter("whitespace"));
    assert_eq!(
        sync.round_trip(&fixture("invocation.json")).unwrap(),
        r#"Log ( level, "ready", 3 )"#
    );
}

#[test]
fn test_graph_json_between_directions() {
    let sync = synchronizer();
    let synced = sync.code_to_graph(&fixture("expression_bodied_method.json")).unwrap();
    let reloaded = NodeGraph::from_json(&synced.graph.to_json().unwrap()).unwrap();

    assert_eq!(
        sync.graph_to_code(&reloaded).unwrap(),
        sync.graph_to_code(&synced.graph).unwrap()
    );
}

#[test]
fn test_deeply_nested_parentheses() {
    const DEPTH: usize = 10_000;

    let mut node = CstNode::new("NumericLiteralExpression").with_token(
        "Token",
        "NumericLiteralToken",
        "0",
    );
    for _ in 0..DEPTH {
        node = CstNode::new("ParenthesizedExpression")
            .with_token("OpenParenToken", "OpenParenToken", "(")
            .with_node("Expression", node)
            .with_token("CloseParenToken", "CloseParenToken", ")");
    }

    let catalog = SchemaCatalog::from_xml(&fixture("expressions.xml")).unwrap();
    let converted = ForwardConverter::new(&catalog).convert(&node).unwrap();
    assert_eq!(converted.count(), DEPTH + 1);

    let graph = NodeGraph::from_converted(&converted);
    let text = emit_graph(&graph);
    assert_eq!(text.matches('(').count(), DEPTH);
    assert_eq!(text.matches(')').count(), DEPTH);
    assert_eq!(text.split_whitespace().nth(DEPTH), Some("0"));
}

#[test]
fn test_long_sum_round_trips_through_tree_json() {
    const TERMS: usize = 1_500;

    let literal = |n: usize| {
        CstNode::new("NumericLiteralExpression").with_token("Token", "NumericLiteralToken", n.to_string())
    };
    let mut sum = literal(0);
    for n in 1..TERMS {
        sum = CstNode::new("AddExpression")
            .with_node("Left", sum)
            .with_token("OperatorToken", "PlusToken", "+")
            .with_node("Right", literal(n));
    }
    let source = serde_json::to_string(&sum).unwrap();

    let sync = synchronizer();
    let synced = sync.code_to_graph(&source).unwrap();
    assert!(synced.report.is_complete());
    assert_eq!(synced.graph.len(), 2 * TERMS - 1);

    let text = sync.graph_to_code(&synced.graph).unwrap();
    assert_eq!(emitted_tokens(&text), token_texts(&sum));
    assert_eq!(text.matches('+').count(), TERMS - 1);
    assert_eq!(sync.round_trip(&source).unwrap(), text);
}

#[test]
fn test_rebuild_picks_up_schema_changes() {
    const BASE: &str = r#"<Tree Root="SyntaxNode">
  <Node Name="IdentifierNameSyntax" Base="TypeSyntax">
    <Kind Name="IdentifierName"/>
    <Field Name="Identifier" Type="SyntaxToken"/>
  </Node>
</Tree>"#;

    let extended = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&extended);
    let sync = Synchronizer::new(
        SharedCatalog::new(move || {
            if flag.load(Ordering::SeqCst) {
                SchemaCatalog::from_xml(&fixture("expressions.xml"))
            } else {
                SchemaCatalog::from_xml(BASE)
            }
        }),
        JsonTreeParser,
    );

    let source = fixture("one_plus_two.json");
    let before = sync.code_to_graph(&source).unwrap();
    assert!(before.graph.is_empty());
    assert_eq!(before.report.skipped, vec!["AddExpression"]);

    extended.store(true, Ordering::SeqCst);
    // Nothing changes until the catalog is rebuilt.
    assert!(sync.code_to_graph(&source).unwrap().graph.is_empty());

    sync.catalog().rebuild().unwrap();
    assert_eq!(sync.round_trip(&source).unwrap(), "1 + 2 ");
}
