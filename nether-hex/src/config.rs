//! Configuration values for offset expressions
//!
//! Offsets in a layout may reference configuration keys (`${offsets.table}`)
//! so that one layout serves several regional builds of a ROM. Values come
//! from a [`ConfigProvider`]; [`TomlConfig`] loads them from a TOML file:
//!
//! ```toml
//! [offsets]
//! monster_table = 0x3203CC   # TOML hex integer, rendered as decimal
//! item_table = "0x3DB028"    # strings are used verbatim
//! ```

use std::path::Path;

use hashbrown::HashMap;
use serde::Deserialize;

/// Source of configuration values, looked up by dotted key.
pub trait ConfigProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Provider with no values; every lookup misses.
impl ConfigProvider for () {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for &P {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// In-memory key/value provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapConfig {
    values: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigProvider for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Error loading a TOML configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Provider backed by a TOML document, nested tables flattened to dotted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TomlConfig {
    values: MapConfig,
}

#[derive(Deserialize)]
#[serde(transparent)]
struct Document {
    root: toml::Table,
}

impl TomlConfig {
    /// Load and flatten a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse and flatten TOML text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let document: Document = toml::from_str(text)?;
        let mut values = MapConfig::new();
        flatten("", &document.root, &mut values);
        tracing::debug!(keys = values.len(), "loaded offset configuration");
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigProvider for TomlConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key)
    }
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut MapConfig) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten(&path, inner, out),
            toml::Value::String(s) => out.insert(path, s.clone()),
            toml::Value::Integer(i) => out.insert(path, i.to_string()),
            toml::Value::Boolean(b) => out.insert(path, b.to_string()),
            toml::Value::Float(f) => out.insert(path, f.to_string()),
            toml::Value::Datetime(d) => out.insert(path, d.to_string()),
            toml::Value::Array(_) => {
                tracing::warn!(key = %path, "ignoring array value in offset configuration");
            }
        }
    }
}
