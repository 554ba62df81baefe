//! Schema document parsing
//!
//! The grammar is described by an XML document shaped like Roslyn's `Syntax.xml`:
//!
//! ```text
//! <Tree Root="SyntaxNode">
//!   <PredefinedNode Name="SyntaxToken" Base="SyntaxNode"/>
//!   <AbstractNode Name="ExpressionSyntax" Base="SyntaxNode"> ...fields... </AbstractNode>
//!   <Node Name="BinaryExpressionSyntax" Base="ExpressionSyntax">
//!     <Kind Name="AddExpression"/>
//!     <Field Name="Left" Type="ExpressionSyntax"/>
//!     <Field Name="OperatorToken" Type="SyntaxToken"><Kind Name="PlusToken"/></Field>
//!     <Field Name="Right" Type="ExpressionSyntax"/>
//!   </Node>
//! </Tree>
//! ```
//!
//! Field lists are made of `Field`, `Choice` and `Sequence` elements, nested freely.
//! Anything else inside a node (comments, documentation elements) is skipped.
//!
//! Reading the file is the caller's business; this module only parses text, and fails
//! fast on anything it cannot interpret so that a catalog is never built from a
//! half-understood document.

use super::model::{FieldSpec, FieldUnit, Template};
use crate::error::SchemaError;
use roxmltree::Node;

/// Primitive pass-through type (e.g. `SyntaxToken`).
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedNode {
    pub name: String,
    pub base: Option<String>,
}

/// Field set shared by concrete nodes; never instantiated directly.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractNode {
    pub name: String,
    pub base: Option<String>,
    pub fields: Vec<FieldUnit>,
    pub type_comment: Option<String>,
}

/// The parsed grammar: everything the catalog is built from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDocument {
    pub root: Option<String>,
    pub predefined: Vec<PredefinedNode>,
    pub abstract_nodes: Vec<AbstractNode>,
    pub nodes: Vec<Template>,
}

impl SchemaDocument {
    /// Parse schema XML text.
    pub fn parse(source: &str) -> Result<SchemaDocument, SchemaError> {
        let doc = roxmltree::Document::parse(source)?;
        let root = doc.root_element();

        if root.tag_name().name() != "Tree" {
            return Err(SchemaError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let mut schema = SchemaDocument {
            root: root.attribute("Root").map(str::to_string),
            ..SchemaDocument::default()
        };

        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "PredefinedNode" => schema.predefined.push(PredefinedNode {
                    name: required_attr(child, "PredefinedNode", "Name")?,
                    base: child.attribute("Base").map(str::to_string),
                }),
                "AbstractNode" => schema.abstract_nodes.push(AbstractNode {
                    name: required_attr(child, "AbstractNode", "Name")?,
                    base: child.attribute("Base").map(str::to_string),
                    fields: parse_field_units(child)?,
                    type_comment: summary(child, "TypeComment"),
                }),
                "Node" => schema.nodes.push(parse_node(child)?),
                _ => {}
            }
        }

        Ok(schema)
    }

    pub fn abstract_node(&self, name: &str) -> Option<&AbstractNode> {
        self.abstract_nodes.iter().find(|n| n.name == name)
    }

    /// Walk the `Base` chain of `name` (exclusive) through abstract and predefined nodes.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.base_of(name);
        while let Some(base) = current {
            if chain.contains(&base) {
                break;
            }
            current = self.base_of(&base);
            chain.push(base);
        }
        chain
    }

    fn base_of(&self, name: &str) -> Option<String> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .and_then(|n| n.base.clone())
            .or_else(|| {
                self.abstract_nodes
                    .iter()
                    .find(|n| n.name == name)
                    .and_then(|n| n.base.clone())
            })
            .or_else(|| {
                self.predefined
                    .iter()
                    .find(|n| n.name == name)
                    .and_then(|n| n.base.clone())
            })
    }
}

fn parse_node(elem: Node) -> Result<Template, SchemaError> {
    Ok(Template {
        name: required_attr(elem, "Node", "Name")?,
        base: elem.attribute("Base").map(str::to_string),
        kinds: kind_names(elem),
        fields: parse_field_units(elem)?.into(),
        type_comment: summary(elem, "TypeComment"),
        factory_comment: summary(elem, "FactoryComment"),
        skip_convenience_factories: bool_attr(elem, "SkipConvenienceFactories")?,
    })
}

fn parse_field_units(parent: Node) -> Result<Vec<FieldUnit>, SchemaError> {
    let mut units = Vec::new();
    for child in parent.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "Field" => units.push(parse_field(child)?),
            "Choice" => {
                let children = parse_field_units(child)?;
                let optional = bool_attr(child, "Optional")?;
                units.push(match child.attribute("Name") {
                    Some(name) => FieldUnit::named_choice(name, children, optional),
                    None => FieldUnit::choice(children, optional),
                });
            }
            "Sequence" => units.push(FieldUnit::sequence(parse_field_units(child)?)),
            _ => {}
        }
    }
    Ok(units)
}

fn parse_field(elem: Node) -> Result<FieldUnit, SchemaError> {
    let min_count = match elem.attribute("MinCount") {
        None => 0,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid(elem, "MinCount", raw))?,
    };

    Ok(FieldUnit::field(FieldSpec {
        name: required_attr(elem, "Field", "Name")?,
        field_type: elem.attribute("Type").unwrap_or_default().to_string(),
        optional: bool_attr(elem, "Optional")?,
        is_override: bool_attr(elem, "Override")?,
        min_count,
        allow_trailing_separator: bool_attr(elem, "AllowTrailingSeparator")?,
        kinds: kind_names(elem),
        comment: summary(elem, "PropertyComment"),
    }))
}

fn kind_names(elem: Node) -> Vec<String> {
    elem.children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Kind")
        .filter_map(|n| n.attribute("Name"))
        .map(str::to_string)
        .collect()
}

/// Text of `<{container}><summary>...</summary></{container}>`, whitespace-trimmed.
fn summary(elem: Node, container: &str) -> Option<String> {
    let summary = elem
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == container)?
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "summary")?;

    let text: String = summary
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn required_attr(
    elem: Node,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, SchemaError> {
    elem.attribute(attribute)
        .map(str::to_string)
        .ok_or(SchemaError::MissingAttribute { element, attribute })
}

fn bool_attr(elem: Node, attribute: &'static str) -> Result<bool, SchemaError> {
    match elem.attribute(attribute) {
        None => Ok(false),
        Some(raw) if raw.trim().eq_ignore_ascii_case("true") => Ok(true),
        Some(raw) if raw.trim().eq_ignore_ascii_case("false") => Ok(false),
        Some(raw) => Err(invalid(elem, attribute, raw)),
    }
}

fn invalid(elem: Node, attribute: &'static str, value: &str) -> SchemaError {
    SchemaError::InvalidAttribute {
        element: elem.tag_name().name().to_string(),
        attribute,
        value: value.to_string(),
    }
}
