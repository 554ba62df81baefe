//! Backward conversion tests (graph → text)

use crate::common::{catalog, emit, emit_graph, tidy, tree};
use insta::assert_snapshot;
use nodesync_core::convert::{BackwardConverter, ConvertedNode, ForwardConverter};
use nodesync_core::format::WhitespaceFormatter;
use nodesync_core::graph::NodeGraph;

fn convert(name: &str) -> ConvertedNode {
    let catalog = catalog();
    ForwardConverter::new(&catalog)
        .convert(&tree(name))
        .unwrap_or_else(|| panic!("{name} should convert"))
}

#[test]
fn test_one_plus_two_raw() {
    assert_eq!(emit(&convert("one_plus_two.json")), "1 + 2 ");
}

#[test]
fn test_one_plus_two_formatted() {
    assert_snapshot!(tidy(&emit(&convert("one_plus_two.json"))), @"1 + 2");
}

#[test]
fn test_invocation_separators() {
    let raw = emit(&convert("invocation.json"));
    assert_eq!(raw.matches(", ").count(), 2);
    assert_snapshot!(tidy(&raw), @r###"Log ( level, "ready", 3 )"###);
}

#[test]
fn test_expression_bodied_method() {
    assert_snapshot!(
        tidy(&emit(&convert("expression_bodied_method.json"))),
        @"public static int Twice ( int x ) => x * 2;"
    );
}

#[test]
fn test_block_method() {
    assert_snapshot!(
        tidy(&emit(&convert("block_method.json"))),
        @"void Run ( ) { return; }"
    );
}

#[test]
fn test_formatter_hand_off() {
    let graph = NodeGraph::from_converted(&convert("one_plus_two.json"));
    let text = BackwardConverter::new()
        .convert_formatted(&graph.roots(), &graph, graph.edges(), &WhitespaceFormatter)
        .unwrap();
    assert_eq!(text, "1 + 2");
}

#[test]
fn test_switching_choice_changes_emission() {
    let mut graph = NodeGraph::from_converted(&convert("block_method.json"));
    let method = graph.roots()[0];

    graph
        .set_value(method, "SemicolonToken", Some(";".to_string()))
        .unwrap();
    graph.select_choice(method, &[4], 2).unwrap();

    assert_eq!(tidy(&emit_graph(&graph)), "void Run ( );");
}

#[test]
fn test_multiple_roots_emit_in_insertion_order() {
    let mut graph = NodeGraph::from_converted(&convert("one_plus_two.json"));
    let second = NodeGraph::from_converted(&convert("invocation.json"));
    for node in second.nodes() {
        graph.insert(node.instance.clone().expect("converted nodes have state"));
    }
    for edge in second.edges() {
        graph.connect(edge.source, &edge.field, edge.target).unwrap();
    }

    assert_eq!(
        tidy(&emit_graph(&graph)),
        r#"1 + 2 Log ( level, "ready", 3 )"#
    );
}
