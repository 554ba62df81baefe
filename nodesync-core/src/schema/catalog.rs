//! Schema catalog: template lookup indices
//!
//! The catalog is built once from a [`SchemaDocument`] and then only read. It answers
//! the three questions the converters and the editor keep asking:
//!
//! - which template has this name (node picker, graph loading)
//! - which template handles this concrete-tree tag (forward conversion)
//! - which token field of a template recognizes a given token tag
//!
//! [`SharedCatalog`] wraps a catalog for process-wide sharing: it builds lazily on first
//! use and supports an explicit rebuild that swaps in a complete new catalog, so readers
//! holding a snapshot are never exposed to a half-built one.

use super::document::SchemaDocument;
use super::model::{collect_singles, Instance, Template};
use crate::error::SchemaError;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Read-only indices over a schema document.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    document: SchemaDocument,
    by_name: HashMap<String, Arc<Template>>,
    by_tag: HashMap<String, Arc<Template>>,
    /// template name → (token tag → field name)
    token_fields: HashMap<String, HashMap<String, String>>,
    sorted_names: Vec<String>,
}

impl SchemaCatalog {
    /// Build all indices from a parsed document.
    pub fn new(document: SchemaDocument) -> Self {
        let mut by_name = HashMap::new();
        let mut by_tag = HashMap::new();
        let mut token_fields = HashMap::new();

        for node in &document.nodes {
            let template = Arc::new(node.clone());

            for tag in &template.kinds {
                if let Some(previous) = by_tag.insert(tag.clone(), Arc::clone(&template)) {
                    tracing::warn!(
                        tag = %tag,
                        previous = %previous.name,
                        template = %template.name,
                        "tag claimed by more than one template; keeping the later one"
                    );
                }
            }

            let mut fields = HashMap::new();
            collect_singles(&template.fields, &mut |spec| {
                if spec.kind().is_token() {
                    for kind in &spec.kinds {
                        fields.insert(kind.clone(), spec.name.clone());
                    }
                }
            });
            if !fields.is_empty() {
                token_fields.insert(template.name.clone(), fields);
            }

            by_name.insert(template.name.clone(), template);
        }

        let mut sorted_names: Vec<String> = by_name.keys().cloned().collect();
        sorted_names.sort();

        tracing::debug!(
            templates = by_name.len(),
            tags = by_tag.len(),
            "schema catalog built"
        );

        SchemaCatalog {
            document,
            by_name,
            by_tag,
            token_fields,
            sorted_names,
        }
    }

    /// Parse schema XML and build the catalog.
    pub fn from_xml(source: &str) -> Result<Self, SchemaError> {
        Ok(Self::new(SchemaDocument::parse(source)?))
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn template(&self, name: &str) -> Option<&Arc<Template>> {
        self.by_name.get(name)
    }

    pub fn template_for_tag(&self, tag: &str) -> Option<&Arc<Template>> {
        self.by_tag.get(tag)
    }

    /// Token tag → field name map of a template (only templates with tagged token fields).
    pub fn token_fields(&self, template: &str) -> Option<&HashMap<String, String>> {
        self.token_fields.get(template)
    }

    /// The token field of `template` that recognizes `token_tag`.
    pub fn token_field_for(&self, template: &str, token_tag: &str) -> Option<&str> {
        self.token_fields
            .get(template)
            .and_then(|fields| fields.get(token_tag))
            .map(String::as_str)
    }

    /// All template names, sorted.
    pub fn names(&self) -> &[String] {
        &self.sorted_names
    }

    /// Template names containing `filter`, case-insensitively. An empty filter keeps all.
    pub fn filter_names(&self, filter: &str) -> Vec<&str> {
        let needle = filter.to_lowercase();
        self.sorted_names
            .iter()
            .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// A fresh instance of the named template.
    pub fn stamp(&self, name: &str) -> Option<Instance> {
        self.template(name).map(|t| Instance::stamp(Arc::clone(t)))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

type CatalogLoader = Box<dyn Fn() -> Result<SchemaCatalog, SchemaError> + Send + Sync>;

/// Lazily built, atomically rebuildable catalog handle.
///
/// The loader runs on first [`get`](SharedCatalog::get) and again on every
/// [`rebuild`](SharedCatalog::rebuild). Readers receive `Arc` snapshots.
pub struct SharedCatalog {
    loader: CatalogLoader,
    current: OnceCell<RwLock<Arc<SchemaCatalog>>>,
    rebuild_lock: Mutex<()>,
}

impl SharedCatalog {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<SchemaCatalog, SchemaError> + Send + Sync + 'static,
    {
        SharedCatalog {
            loader: Box::new(loader),
            current: OnceCell::new(),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// A handle that is ready immediately; rebuilds re-index the same document.
    pub fn from_catalog(catalog: SchemaCatalog) -> Self {
        let document = catalog.document().clone();
        let shared = Self::new(move || Ok(SchemaCatalog::new(document.clone())));
        let _ = shared.current.set(RwLock::new(Arc::new(catalog)));
        shared
    }

    /// Current catalog, building it on first use.
    pub fn get(&self) -> Result<Arc<SchemaCatalog>, SchemaError> {
        let cell = self
            .current
            .get_or_try_init(|| (self.loader)().map(|catalog| RwLock::new(Arc::new(catalog))))?;
        let guard = cell.read().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(&guard))
    }

    pub fn is_ready(&self) -> bool {
        self.current.get().is_some()
    }

    /// Discard and rebuild all indices.
    ///
    /// The new catalog is fully built before it replaces the old one. On loader failure
    /// the previous catalog (if any) stays in place.
    pub fn rebuild(&self) -> Result<Arc<SchemaCatalog>, SchemaError> {
        let _serialized = self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let fresh = Arc::new((self.loader)()?);
        let cell = self
            .current
            .get_or_init(|| RwLock::new(Arc::clone(&fresh)));
        *cell.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&fresh);

        tracing::info!(templates = fresh.len(), "schema catalog rebuilt");
        Ok(fresh)
    }
}
