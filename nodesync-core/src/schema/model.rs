//! Schema model: templates, field units and instances
//!
//! A [`Template`] is the immutable, schema-derived shape of one node kind. Its field
//! list is a tree of [`FieldUnit`]s which doubles as per-occurrence state: a Single
//! unit can carry a `value`, a Choice unit a `choice_index`. An [`Instance`] is a
//! template plus its own copy of that tree.
//!
//! The copy is structural. Field lists live behind `Arc<[FieldUnit]>`, and every update
//! ([`with_value`], [`with_choice`]) rebuilds only the units on the path to the changed
//! one. Untouched subtrees stay shared with the template, and the template itself is
//! never written to, so it can keep stamping fresh instances.

use super::classify::FieldTypeKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`Instance`].
///
/// Ids come from a global counter and are never handed out twice in the same process.
/// Ids loaded from outside must not exceed [`InstanceId::MAX`]; the counter then stays
/// at most `2^63` after any reservation and cannot wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Largest id accepted from a serialized graph or instance.
    pub const MAX: InstanceId = InstanceId(i64::MAX as u64);

    /// Allocate a new identity.
    pub fn fresh() -> Self {
        InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure the counter never hands out `id` (or anything below it) again.
    ///
    /// Needed when ids enter the process from outside, e.g. a deserialized graph.
    /// Returns `false` and reserves nothing when `id` is above [`InstanceId::MAX`].
    pub fn reserve_through(id: InstanceId) -> bool {
        if id > Self::MAX {
            return false;
        }
        NEXT_INSTANCE_ID.fetch_max(id.0 + 1, Ordering::Relaxed);
        true
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static metadata of a Single field, shared by the template and all its instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, rename = "override")]
    pub is_override: bool,
    #[serde(default)]
    pub min_count: u32,
    #[serde(default)]
    pub allow_trailing_separator: bool,
    /// Token or node tags this field recognizes
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FieldSpec {
    /// A bare field with only a name and a declared type.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        FieldSpec {
            name: name.into(),
            field_type: field_type.into(),
            optional: false,
            is_override: false,
            min_count: 0,
            allow_trailing_separator: false,
            kinds: Vec::new(),
            comment: None,
        }
    }

    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn kind(&self) -> FieldTypeKind {
        FieldTypeKind::classify(&self.field_type)
    }
}

/// One structural unit of a template's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum FieldUnit {
    /// A named field. `value` is only ever set on instances.
    Single {
        field: Arc<FieldSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Exactly one of `children` is realized; `choice_index` selects it.
    Choice {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        optional: bool,
        children: Arc<[FieldUnit]>,
        #[serde(default)]
        choice_index: usize,
    },
    /// All children are realized, in order.
    Sequence { children: Arc<[FieldUnit]> },
}

impl FieldUnit {
    pub fn field(spec: FieldSpec) -> Self {
        FieldUnit::Single {
            field: Arc::new(spec),
            value: None,
        }
    }

    pub fn choice(children: Vec<FieldUnit>, optional: bool) -> Self {
        FieldUnit::Choice {
            name: None,
            optional,
            children: children.into(),
            choice_index: 0,
        }
    }

    pub fn named_choice(name: impl Into<String>, children: Vec<FieldUnit>, optional: bool) -> Self {
        FieldUnit::Choice {
            name: Some(name.into()),
            optional,
            children: children.into(),
            choice_index: 0,
        }
    }

    pub fn sequence(children: Vec<FieldUnit>) -> Self {
        FieldUnit::Sequence {
            children: children.into(),
        }
    }

    /// Nested units of a Choice or Sequence; empty for a Single.
    pub fn children(&self) -> &[FieldUnit] {
        match self {
            FieldUnit::Single { .. } => &[],
            FieldUnit::Choice { children, .. } | FieldUnit::Sequence { children } => children,
        }
    }

    fn with_children(&self, new_children: Arc<[FieldUnit]>) -> FieldUnit {
        match self {
            FieldUnit::Single { .. } => self.clone(),
            FieldUnit::Choice {
                name,
                optional,
                choice_index,
                ..
            } => FieldUnit::Choice {
                name: name.clone(),
                optional: *optional,
                children: new_children,
                choice_index: *choice_index,
            },
            FieldUnit::Sequence { .. } => FieldUnit::Sequence {
                children: new_children,
            },
        }
    }
}

/// Immutable definition of one node kind, loaded from the schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Concrete tree tags this template matches
    #[serde(default)]
    pub kinds: Vec<String>,
    pub fields: Arc<[FieldUnit]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_comment: Option<String>,
    #[serde(default)]
    pub skip_convenience_factories: bool,
}

impl Template {
    pub fn new(name: impl Into<String>, fields: Vec<FieldUnit>) -> Self {
        Template {
            name: name.into(),
            base: None,
            kinds: Vec::new(),
            fields: fields.into(),
            type_comment: None,
            factory_comment: None,
            skip_convenience_factories: false,
        }
    }

    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }
}

/// A template plus per-occurrence values, choice selections and an identity.
///
/// Deserializing an instance reserves its id, so later [`Instance::stamp`] calls never
/// reuse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstanceRecord")]
pub struct Instance {
    id: InstanceId,
    template: Arc<Template>,
    fields: Arc<[FieldUnit]>,
}

#[derive(Deserialize)]
struct InstanceRecord {
    id: InstanceId,
    template: Arc<Template>,
    fields: Arc<[FieldUnit]>,
}

impl TryFrom<InstanceRecord> for Instance {
    type Error = String;

    fn try_from(record: InstanceRecord) -> Result<Self, String> {
        if !InstanceId::reserve_through(record.id) {
            return Err(format!("instance id {} is out of range", record.id));
        }
        Ok(Instance {
            id: record.id,
            template: record.template,
            fields: record.fields,
        })
    }
}

impl Instance {
    /// Stamp a fresh instance. The field tree is shared with the template until the
    /// first update.
    pub fn stamp(template: Arc<Template>) -> Self {
        Instance {
            id: InstanceId::fresh(),
            fields: Arc::clone(&template.fields),
            template,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn fields(&self) -> &Arc<[FieldUnit]> {
        &self.fields
    }

    /// Set the value of every Single field called `name`.
    pub fn with_value(&self, name: &str, value: Option<String>) -> Instance {
        Instance {
            id: self.id,
            template: Arc::clone(&self.template),
            fields: with_value(&self.fields, name, value),
        }
    }

    /// Select alternative `index` of the Choice at `path`.
    ///
    /// Returns `None` when `path` does not lead to a Choice.
    pub fn with_choice(&self, path: &[usize], index: usize) -> Option<Instance> {
        let fields = with_choice(&self.fields, path, index)?;
        Some(Instance {
            id: self.id,
            template: Arc::clone(&self.template),
            fields,
        })
    }

    /// Select alternative `index` of every Choice named `name`.
    pub fn with_named_choice(&self, name: &str, index: usize) -> Instance {
        Instance {
            id: self.id,
            template: Arc::clone(&self.template),
            fields: with_named_choice(&self.fields, name, index),
        }
    }

    /// Value of the first Single field called `name`, in schema order.
    pub fn value(&self, name: &str) -> Option<&str> {
        find_value(&self.fields, name)
    }

    /// Selected alternative of the Choice at `path`.
    pub fn choice_index(&self, path: &[usize]) -> Option<usize> {
        match unit_at(&self.fields, path)? {
            FieldUnit::Choice { choice_index, .. } => Some(*choice_index),
            _ => None,
        }
    }

    /// Specs of every node-like Single field, wherever it sits in the tree.
    pub fn node_fields(&self) -> Vec<&FieldSpec> {
        let mut out = Vec::new();
        collect_singles(&self.fields, &mut |spec| {
            if spec.kind().is_node() {
                out.push(spec);
            }
        });
        out
    }

    /// Whether `name` is a node-like field of this instance.
    pub fn has_node_field(&self, name: &str) -> bool {
        self.node_fields().iter().any(|spec| spec.name == name)
    }
}

/// Return `units` with every Single named `name` carrying `value`.
///
/// Only the paths leading to matches are rebuilt; with no match the same `Arc` comes back.
pub fn with_value(units: &Arc<[FieldUnit]>, name: &str, value: Option<String>) -> Arc<[FieldUnit]> {
    rebuild(units, &mut |unit| match unit {
        FieldUnit::Single { field, .. } if field.name == name => Some(FieldUnit::Single {
            field: Arc::clone(field),
            value: value.clone(),
        }),
        _ => None,
    })
    .unwrap_or_else(|| Arc::clone(units))
}

/// Return `units` with every Choice named `name` selecting `index`.
pub fn with_named_choice(units: &Arc<[FieldUnit]>, name: &str, index: usize) -> Arc<[FieldUnit]> {
    rebuild(units, &mut |unit| match unit {
        FieldUnit::Choice {
            name: Some(choice_name),
            optional,
            children,
            ..
        } if choice_name == name => Some(FieldUnit::Choice {
            name: Some(choice_name.clone()),
            optional: *optional,
            children: Arc::clone(children),
            choice_index: index,
        }),
        _ => None,
    })
    .unwrap_or_else(|| Arc::clone(units))
}

/// Return `units` with the Choice at `path` selecting `index`.
///
/// `path` holds one index per level, starting in the top-level list and descending
/// through Choice/Sequence children. `None` if the path does not end on a Choice.
pub fn with_choice(units: &Arc<[FieldUnit]>, path: &[usize], index: usize) -> Option<Arc<[FieldUnit]>> {
    let (&head, rest) = path.split_first()?;
    let target = units.get(head)?;

    let replacement = if rest.is_empty() {
        match target {
            FieldUnit::Choice {
                name,
                optional,
                children,
                choice_index,
            } => {
                if *choice_index == index {
                    return Some(Arc::clone(units));
                }
                FieldUnit::Choice {
                    name: name.clone(),
                    optional: *optional,
                    children: Arc::clone(children),
                    choice_index: index,
                }
            }
            _ => return None,
        }
    } else {
        let children = match target {
            FieldUnit::Single { .. } => return None,
            FieldUnit::Choice { children, .. } | FieldUnit::Sequence { children } => children,
        };
        let new_children = with_choice(children, rest, index)?;
        if Arc::ptr_eq(&new_children, children) {
            return Some(Arc::clone(units));
        }
        target.with_children(new_children)
    };

    let mut rebuilt = units.to_vec();
    rebuilt[head] = replacement;
    Some(rebuilt.into())
}

/// The unit addressed by `path`, if any.
pub fn unit_at<'a>(units: &'a [FieldUnit], path: &[usize]) -> Option<&'a FieldUnit> {
    let (&head, rest) = path.split_first()?;
    let unit = units.get(head)?;
    if rest.is_empty() {
        Some(unit)
    } else {
        unit_at(unit.children(), rest)
    }
}

/// Visit every Single spec in declaration order, descending into all alternatives.
pub fn collect_singles<'a, F>(units: &'a [FieldUnit], visit: &mut F)
where
    F: FnMut(&'a FieldSpec),
{
    for unit in units {
        match unit {
            FieldUnit::Single { field, .. } => visit(field),
            FieldUnit::Choice { children, .. } | FieldUnit::Sequence { children } => {
                collect_singles(children, visit)
            }
        }
    }
}

fn find_value<'a>(units: &'a [FieldUnit], name: &str) -> Option<&'a str> {
    for unit in units {
        match unit {
            FieldUnit::Single { field, value } if field.name == name => {
                return value.as_deref();
            }
            FieldUnit::Single { .. } => {}
            FieldUnit::Choice { children, .. } | FieldUnit::Sequence { children } => {
                if let Some(found) = find_value(children, name) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Copy-on-write rebuild driver.
///
/// `replace` is asked about every unit; returning `Some` swaps the unit and stops the
/// descent there. Units that neither match nor contain a match are shared, not copied.
/// Returns `None` when nothing changed.
fn rebuild<F>(units: &Arc<[FieldUnit]>, replace: &mut F) -> Option<Arc<[FieldUnit]>>
where
    F: FnMut(&FieldUnit) -> Option<FieldUnit>,
{
    let mut changed: Option<Vec<FieldUnit>> = None;

    for (i, unit) in units.iter().enumerate() {
        let replacement = match replace(unit) {
            Some(new_unit) => Some(new_unit),
            None => match unit {
                FieldUnit::Single { .. } => None,
                FieldUnit::Choice { children, .. } | FieldUnit::Sequence { children } => {
                    rebuild(children, replace).map(|c| unit.with_children(c))
                }
            },
        };

        if let Some(new_unit) = replacement {
            changed.get_or_insert_with(|| units.to_vec())[i] = new_unit;
        }
    }

    changed.map(Into::into)
}
