use crate::{lookup::parse_bool, ConfigError, ConfigLookup, Result};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

fn bool_or_default(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw {
        None => default,
        Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
            warn!(key = key, value = %raw, "Unrecognised boolean setting, using default {}", default);
            default
        }),
    }
}

/// In-memory settings store
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    values: Arc<DashMap<String, String>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.values.remove(key);
    }

    pub fn with(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }
}

impl ConfigLookup for MemoryConfig {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let raw = self.values.get(key).map(|entry| entry.value().clone());
        bool_or_default(key, raw, default)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| default.to_string())
    }
}

/// Settings read from configuration files and environment variables.
///
/// Later sources override earlier ones; environment variables win over files.
pub struct LayeredConfig {
    inner: config::Config,
}

#[derive(Debug, Default)]
pub struct LayeredConfigBuilder {
    files: Vec<(PathBuf, bool)>,
    env_prefix: Option<String>,
}

impl LayeredConfigBuilder {
    /// Add a file whose format is taken from its extension (toml, yaml, json).
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), true));
        self
    }

    /// Add a file that is skipped when absent.
    pub fn optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), false));
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Result<LayeredConfig> {
        let mut builder = config::Config::builder();

        for (path, required) in &self.files {
            if *required && !path.exists() {
                return Err(ConfigError::SourceNotFound(path.display().to_string()));
            }
            debug!(path = %path.display(), required = *required, "Adding configuration file");
            builder = builder.add_source(config::File::from(path.as_path()).required(*required));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        Ok(LayeredConfig {
            inner: builder.build()?,
        })
    }
}

impl LayeredConfig {
    pub fn builder() -> LayeredConfigBuilder {
        LayeredConfigBuilder::default()
    }

    fn raw(&self, key: &str) -> Option<String> {
        let path = key.replace(':', ".");
        // Environment sources store lowercased paths.
        self.inner
            .get_string(&path)
            .or_else(|_| self.inner.get_string(&path.to_lowercase()))
            .ok()
    }
}

impl ConfigLookup for LayeredConfig {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        bool_or_default(key, self.raw(key), default)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }
}
