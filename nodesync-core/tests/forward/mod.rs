//! Forward conversion tests (tree → instances)

use crate::common::{catalog, tree};
use insta::assert_snapshot;
use nodesync_core::convert::{ConvertedNode, ForwardConverter};
use nodesync_core::schema::FieldUnit;
use nodesync_core::tree::CstNode;
use nodesync_core::treeviz::converted_to_treeviz_str;

fn convert(name: &str) -> ConvertedNode {
    let catalog = catalog();
    ForwardConverter::new(&catalog)
        .convert(&tree(name))
        .unwrap_or_else(|| panic!("{name} should convert"))
}

#[test]
fn test_one_plus_two() {
    let converted = convert("one_plus_two.json");

    assert_eq!(converted.count(), 3);
    assert_eq!(converted.instance.name(), "BinaryExpressionSyntax");
    assert_eq!(converted.instance.value("OperatorToken"), Some("+"));

    let keys: Vec<&str> = converted.field_children.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Left", "Right"]);
    assert_eq!(converted.children("Left")[0].instance.value("Token"), Some("1"));
    assert_eq!(converted.children("Right")[0].instance.value("Token"), Some("2"));
}

#[test]
fn test_separated_list_keeps_order() {
    let converted = convert("invocation.json");
    let arguments = converted.children("ArgumentList")[0].children("Arguments");

    let texts: Vec<Option<&str>> = arguments
        .iter()
        .map(|arg| {
            let expression = &arg.children("Expression")[0].instance;
            expression.value("Identifier").or(expression.value("Token"))
        })
        .collect();
    assert_eq!(texts, vec![Some("level"), Some("\"ready\""), Some("3")]);
}

#[test]
fn test_expression_bodied_method_selects_sequence() {
    let converted = convert("expression_bodied_method.json");

    assert_eq!(converted.instance.choice_index(&[4]), Some(1));
    assert_eq!(converted.instance.value("Modifiers"), Some("public static"));
    assert!(converted.field_children.contains_key("ExpressionBody"));
    assert!(!converted.field_children.contains_key("Body"));
}

#[test]
fn test_block_method_selects_body() {
    let converted = convert("block_method.json");

    assert_eq!(converted.instance.choice_index(&[4]), Some(0));
    // Empty parameter list: no key at all.
    let parameters = &converted.children("ParameterList")[0];
    assert!(!parameters.field_children.contains_key("Parameters"));
    // Optional expression absent from the return statement.
    let statement = &converted.children("Body")[0].children("Statements")[0];
    assert_eq!(statement.instance.name(), "ReturnStatementSyntax");
    assert!(statement.field_children.is_empty());
}

#[test]
fn test_coverage_gap_drops_only_the_subtree() {
    let catalog = catalog();
    let node = CstNode::new("ArgumentList")
        .with_token("OpenParenToken", "OpenParenToken", "(")
        .with_nodes(
            "Arguments",
            vec![
                CstNode::new("Argument").with_node(
                    "Expression",
                    CstNode::new("InterpolatedStringExpression"),
                ),
                CstNode::new("Argument").with_node(
                    "Expression",
                    CstNode::new("IdentifierName").with_token("Identifier", "IdentifierToken", "x"),
                ),
            ],
        )
        .with_token("CloseParenToken", "CloseParenToken", ")");

    let (converted, report) = ForwardConverter::new(&catalog).convert_with_report(&node);
    let converted = converted.unwrap();

    let arguments = converted.children("Arguments");
    assert_eq!(arguments.len(), 2);
    assert!(arguments[0].field_children.is_empty());
    assert_eq!(arguments[1].children("Expression").len(), 1);
    assert_eq!(report.skipped, vec!["InterpolatedStringExpression"]);
    assert_eq!(report.converted, 4);
}

/// Every Choice with a node alternative that produced children must point at the first
/// such alternative.
fn assert_choices_agree(node: &ConvertedNode) {
    fn realized(unit: &FieldUnit, node: &ConvertedNode) -> bool {
        match unit {
            FieldUnit::Single { field, .. } => {
                field.kind().is_node() && node.field_children.contains_key(&field.name)
            }
            _ => unit.children().iter().any(|u| realized(u, node)),
        }
    }

    fn walk(units: &[FieldUnit], node: &ConvertedNode) {
        for unit in units {
            if let FieldUnit::Choice {
                children,
                choice_index,
                ..
            } = unit
            {
                if let Some(first) = children.iter().position(|alt| realized(alt, node)) {
                    assert_eq!(*choice_index, first, "choice in {}", node.instance.name());
                }
            }
            walk(unit.children(), node);
        }
    }

    walk(node.instance.fields(), node);
    for children in node.field_children.values() {
        children.iter().for_each(assert_choices_agree);
    }
}

#[test]
fn test_choices_agree_with_realized_children() {
    for name in [
        "one_plus_two.json",
        "invocation.json",
        "expression_bodied_method.json",
        "block_method.json",
    ] {
        assert_choices_agree(&convert(name));
    }
}

#[test]
fn test_expression_bodied_method_treeviz() {
    assert_snapshot!(converted_to_treeviz_str(&convert("expression_bodied_method.json")), @r###"
    MethodDeclarationSyntax [Modifiers="public static", Identifier="Twice", SemicolonToken=";"]
    ├─ ReturnType: PredefinedTypeSyntax [Keyword="int"]
    ├─ ParameterList: ParameterListSyntax [OpenParenToken="(", CloseParenToken=")"]
    │ └─ Parameters: ParameterSyntax [Identifier="x"]
    │   └─ Type: PredefinedTypeSyntax [Keyword="int"]
    └─ ExpressionBody: ArrowExpressionClauseSyntax [ArrowToken="=>"]
      └─ Expression: BinaryExpressionSyntax [OperatorToken="*"]
        ├─ Left: IdentifierNameSyntax [Identifier="x"]
        └─ Right: LiteralExpressionSyntax [Token="2"]
    "###);
}
