//! Shared configuration loader for the nodesync toolchain.
//!
//! `defaults/nodesync.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`NodeSyncConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use nodesync_core::sync::SyncOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/nodesync.default.toml");

/// Top-level configuration consumed by nodesync applications.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSyncConfig {
    #[serde(default)]
    pub schema: SchemaConfig,
    pub convert: ConvertConfig,
    pub log: LogConfig,
}

/// Where the schema document comes from when a command does not name one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub forward: ForwardConfig,
    pub backward: BackwardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    pub report_gaps: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackwardConfig {
    /// Registered formatter name; "none" keeps the raw emission.
    pub formatter: String,
}

impl From<&BackwardConfig> for SyncOptions {
    fn from(config: &BackwardConfig) -> Self {
        match config.formatter.as_str() {
            "" | "none" => SyncOptions::default(),
            name => SyncOptions::with_formatter(name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (e.g. `schema.path` from the command line).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<NodeSyncConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<NodeSyncConfig, ConfigError> {
    Loader::new().build()
}
