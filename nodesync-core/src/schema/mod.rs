//! Schema layer
//!
//! Everything the converters know about the grammar comes from here: the parsed schema
//! document, the templates it declares, the catalog indexing them and the rules that
//! classify a field's declared type.

pub mod catalog;
pub mod classify;
pub mod document;
pub mod model;

pub use catalog::{SchemaCatalog, SharedCatalog};
pub use classify::FieldTypeKind;
pub use document::{AbstractNode, PredefinedNode, SchemaDocument};
pub use model::{
    collect_singles, unit_at, with_choice, with_named_choice, with_value, FieldSpec, FieldUnit,
    Instance, InstanceId, Template,
};
