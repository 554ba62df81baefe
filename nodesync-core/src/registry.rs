//! Formatter registry for formatter discovery and selection
//!
//! Backward conversion hands its text to a formatter picked by name (from the
//! command line or configuration). This registry maps those names to implementations.

use crate::error::FormatError;
use crate::format::{Formatter, NoneFormatter, WhitespaceFormatter};
use std::collections::HashMap;

/// Registry of text formatters
///
/// # Examples
///
/// ```ignore
/// let registry = FormatterRegistry::default();
/// let tidy = registry.format("1 + 2 ", "whitespace")?;
/// ```
pub struct FormatterRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatterRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter
    ///
    /// If a formatter with the same name already exists, it will be replaced.
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    /// Get a formatter by name
    pub fn get(&self, name: &str) -> Result<&dyn Formatter, FormatError> {
        self.formatters
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatterNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// List all available formatter names (sorted)
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Format `source` with the named formatter
    pub fn format(&self, source: &str, formatter: &str) -> Result<String, FormatError> {
        self.get(formatter)?.format(source)
    }

    /// Create a registry with the built-in formatters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(NoneFormatter);
        registry.register(WhitespaceFormatter);
        registry
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
