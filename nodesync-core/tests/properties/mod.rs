//! Property tests over generated argument lists

use crate::common::{catalog, emit_graph};
use nodesync_core::convert::ForwardConverter;
use nodesync_core::graph::NodeGraph;
use nodesync_core::tree::CstNode;
use proptest::prelude::*;
use std::collections::HashSet;

fn invocation(arguments: &[u32]) -> CstNode {
    let arguments = arguments
        .iter()
        .map(|n| {
            CstNode::new("Argument").with_node(
                "Expression",
                CstNode::new("NumericLiteralExpression").with_token(
                    "Token",
                    "NumericLiteralToken",
                    n.to_string(),
                ),
            )
        })
        .collect();

    CstNode::new("InvocationExpression")
        .with_node(
            "Expression",
            CstNode::new("IdentifierName").with_token("Identifier", "IdentifierToken", "f"),
        )
        .with_node(
            "ArgumentList",
            CstNode::new("ArgumentList")
                .with_token("OpenParenToken", "OpenParenToken", "(")
                .with_nodes("Arguments", arguments)
                .with_token("CloseParenToken", "CloseParenToken", ")"),
        )
}

proptest! {
    #[test]
    fn test_argument_lists(arguments in prop::collection::vec(0u32..1000, 0..40)) {
        let catalog = catalog();
        let converted = ForwardConverter::new(&catalog)
            .convert(&invocation(&arguments))
            .unwrap();
        let graph = NodeGraph::from_converted(&converted);

        let ids: HashSet<_> = converted.instances().iter().map(|i| i.id()).collect();
        prop_assert_eq!(ids.len(), converted.count());
        prop_assert_eq!(graph.len(), 3 + 2 * arguments.len());

        let text = emit_graph(&graph);
        prop_assert_eq!(text.matches(',').count(), arguments.len().saturating_sub(1));
        prop_assert!(!text.contains(", )"));
        prop_assert!(!text.contains("( ,"));
    }

    #[test]
    fn test_fill_values_is_idempotent(value in "[a-z_][a-z0-9_]{0,12}") {
        let catalog = catalog();
        let node = CstNode::new("IdentifierName").with_token("Identifier", "IdentifierToken", value.clone());
        let converter = ForwardConverter::new(&catalog);

        let stamped = catalog.stamp("IdentifierNameSyntax").unwrap();
        let once = converter.fill_values(&stamped, &node);
        let twice = converter.fill_values(&once, &node);

        prop_assert_eq!(once.value("Identifier"), Some(value.as_str()));
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(stamped.value("Identifier"), None);
    }
}
