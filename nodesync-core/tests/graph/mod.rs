//! Graph materialization and editing tests

use crate::common::{catalog, emit_graph, tidy, tree};
use nodesync_core::convert::ForwardConverter;
use nodesync_core::graph::NodeGraph;
use nodesync_core::schema::InstanceId;
use nodesync_core::GraphError;

fn invocation_graph() -> NodeGraph {
    let catalog = catalog();
    let converted = ForwardConverter::new(&catalog)
        .convert(&tree("invocation.json"))
        .expect("invocation should convert");
    NodeGraph::from_converted(&converted)
}

/// The single child of `source` under `field`.
fn only_child(graph: &NodeGraph, source: InstanceId, field: &str) -> InstanceId {
    let children = graph.children(source, field);
    assert_eq!(children.len(), 1, "{field} should hold exactly one child");
    children[0]
}

#[test]
fn test_invocation_shape() {
    let graph = invocation_graph();

    assert_eq!(graph.len(), 9);
    assert_eq!(graph.edges().len(), 8);
    assert_eq!(graph.roots().len(), 1);

    let root = graph.roots()[0];
    let list = only_child(&graph, root, "ArgumentList");
    let texts: Vec<String> = graph
        .children(list, "Arguments")
        .into_iter()
        .map(|argument| {
            let expression = only_child(&graph, argument, "Expression");
            let instance = graph.node(expression).unwrap().instance.as_ref().unwrap();
            instance
                .value("Identifier")
                .or(instance.value("Token"))
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    assert_eq!(texts, vec!["level", "\"ready\"", "3"]);
}

#[test]
fn test_edit_then_emit() {
    let mut graph = invocation_graph();
    let catalog = catalog();
    let root = graph.roots()[0];
    let list = only_child(&graph, root, "ArgumentList");
    let arguments = graph.children(list, "Arguments");

    let literal = only_child(&graph, arguments[2], "Expression");
    graph
        .set_value(literal, "Token", Some("4".to_string()))
        .unwrap();

    let argument = graph.add_named(&catalog, "ArgumentSyntax").unwrap();
    let name = graph.add_named(&catalog, "IdentifierNameSyntax").unwrap();
    graph
        .set_value(name, "Identifier", Some("extra".to_string()))
        .unwrap();
    graph.connect(argument, "Expression", name).unwrap();
    graph.connect(list, "Arguments", argument).unwrap();

    assert_eq!(graph.roots(), vec![root]);
    assert_eq!(
        tidy(&emit_graph(&graph)),
        r#"Log ( level, "ready", 4, extra )"#
    );
}

#[test]
fn test_removing_an_argument_keeps_separators_consistent() {
    let mut graph = invocation_graph();
    let root = graph.roots()[0];
    let list = only_child(&graph, root, "ArgumentList");
    let middle = graph.children(list, "Arguments")[1];
    let expression = only_child(&graph, middle, "Expression");

    graph.remove_node(middle).unwrap();
    // The orphaned expression becomes a root of its own.
    assert_eq!(graph.roots(), vec![root, expression]);

    graph.remove_node(expression).unwrap();
    assert_eq!(tidy(&emit_graph(&graph)), "Log ( level, 3 )");
}

#[test]
fn test_connect_to_token_field_is_rejected() {
    let mut graph = invocation_graph();
    let root = graph.roots()[0];
    let list = only_child(&graph, root, "ArgumentList");
    let placeholder = graph.add_placeholder();

    assert_eq!(
        graph.connect(list, "OpenParenToken", placeholder),
        Err(GraphError::NotANodeField {
            template: "ArgumentListSyntax".to_string(),
            field: "OpenParenToken".to_string(),
        })
    );
}

#[test]
fn test_placeholder_child_emits_nothing() {
    let mut graph = invocation_graph();
    let root = graph.roots()[0];
    let list = only_child(&graph, root, "ArgumentList");
    let placeholder = graph.add_placeholder();
    graph.connect(list, "Arguments", placeholder).unwrap();

    // The separator is still written; the placeholder itself is silent.
    assert_eq!(
        tidy(&emit_graph(&graph)),
        r#"Log ( level, "ready", 3, )"#
    );
}

#[test]
fn test_add_named_rejects_unknown_templates() {
    let mut graph = NodeGraph::new();
    assert_eq!(
        graph.add_named(&catalog(), "LambdaExpressionSyntax"),
        Err(GraphError::UnknownTemplate("LambdaExpressionSyntax".to_string()))
    );
    assert!(graph.is_empty());
}

#[test]
fn test_json_round_trip_emits_same_text() {
    let graph = invocation_graph();
    let json = graph.to_json().unwrap();
    let loaded = NodeGraph::from_json(&json).unwrap();

    assert_eq!(loaded, graph);
    assert_eq!(emit_graph(&loaded), emit_graph(&graph));
}

#[test]
fn test_loaded_ids_are_never_handed_out_again() {
    let loaded = InstanceId::fresh().get() + 10_000;
    let json = format!(r#"{{"nodes": [{{"id": {loaded}}}]}}"#);
    let mut graph = NodeGraph::from_json(&json).unwrap();

    let first = graph.add_placeholder();
    let second = graph.add_placeholder();

    assert!(first.get() > loaded);
    assert!(second.get() > loaded);
    assert_ne!(first, second);
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_ids_beyond_the_counter_range_are_rejected() {
    let json = format!(r#"{{"nodes": [{{"id": {}}}]}}"#, u64::MAX);
    assert!(matches!(
        NodeGraph::from_json(&json),
        Err(GraphError::IdOutOfRange(id)) if id.get() == u64::MAX
    ));

    let json = format!(r#"{{"nodes": [{{"id": {}}}]}}"#, InstanceId::MAX.get() + 1);
    assert!(matches!(
        NodeGraph::from_json(&json),
        Err(GraphError::IdOutOfRange(_))
    ));

    let mut graph = invocation_graph();
    assert!(graph.add_placeholder() < InstanceId::MAX);
}
