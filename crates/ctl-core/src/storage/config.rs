use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::kernel::error::Result;
use crate::storage::StorageProvider;
use crate::storage::error::StorageSystemError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Extensions probed when locating a configuration source, in order.
    pub fn search_order() -> Vec<&'static str> {
        let mut extensions = Vec::new();
        #[cfg(feature = "toml-config")]
        extensions.push("toml");
        extensions.push("json");
        #[cfg(feature = "yaml-config")]
        extensions.extend(["yaml", "yml"]);
        extensions
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    /// Parse a configuration source into a JSON value tree.
    pub fn parse(&self, data: &str, path: &Path) -> Result<Value> {
        let parsed: std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>> = match self {
            ConfigFormat::Json => serde_json::from_str(data).map_err(Into::into),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(Into::into),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(Into::into),
        };
        parsed.map_err(|source| {
            StorageSystemError::DeserializationError {
                format: self.extension().to_string(),
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }
}

/// Dot-notation configuration store shared through the container as `config`.
///
/// Each configuration source is stored under its own top-level key, so the
/// `env` entry of `config/app.toml` is read back with `get("app.env")`.
#[derive(Debug, Default)]
pub struct ConfigRepository {
    items: RwLock<Map<String, Value>>,
}

impl ConfigRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a (possibly nested) key exists
    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Get the raw value stored at `key`
    pub fn value(&self, key: &str) -> Option<Value> {
        let items = self.items.read();
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = items.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.value(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a configuration value, creating intermediate tables as needed.
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| crate::kernel::error::Error::Configuration(format!(
                "failed to serialize value for '{}': {}",
                key, e
            )))?;
        self.set_value(key, value);
        Ok(())
    }

    /// Set a raw value, creating intermediate tables as needed.
    pub fn set_value(&self, key: &str, value: Value) {
        let mut items = self.items.write();
        let segments: Vec<&str> = key.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return,
        };

        let mut table = &mut *items;
        for segment in parents {
            let slot = table
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            table = match slot.as_object_mut() {
                Some(next) => next,
                None => return,
            };
        }
        table.insert(last.to_string(), value);
    }

    /// Merge a loaded configuration table into the entry stored under `name`.
    ///
    /// Keys of `table` replace existing keys one level deep; keys only present
    /// in the existing entry are kept.
    pub fn merge(&self, name: &str, table: Value) -> Result<()> {
        let incoming = match table {
            Value::Object(map) => map,
            other => {
                return Err(StorageSystemError::NotATable {
                    name: name.to_string(),
                    found: type_label(&other).to_string(),
                }
                .into());
            }
        };

        let mut items = self.items.write();
        match items.get_mut(name) {
            Some(Value::Object(existing)) => existing.extend(incoming),
            _ => {
                items.insert(name.to_string(), Value::Object(incoming));
            }
        }
        Ok(())
    }

    /// Remove a top-level or nested key, returning the old value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut items = self.items.write();
        let segments: Vec<&str> = key.split('.').collect();
        let (last, parents) = segments.split_last()?;
        let mut table = &mut *items;
        for segment in parents {
            table = table.get_mut(*segment)?.as_object_mut()?;
        }
        table.remove(*last)
    }

    /// Top-level keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    /// Snapshot of the whole repository.
    pub fn all(&self) -> Value {
        Value::Object(self.items.read().clone())
    }
}

/// Locates and parses per-name configuration sources under a config directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    provider: Arc<dyn StorageProvider>,
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new(provider: Arc<dyn StorageProvider>, config_path: PathBuf) -> Self {
        Self { provider, config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Find the file backing configuration `name`, if any.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        ConfigFormat::search_order()
            .into_iter()
            .map(|ext| self.config_path.join(format!("{}.{}", name, ext)))
            .find(|path| self.provider.is_file(path))
    }

    /// Load configuration `name`.
    ///
    /// Returns the parsed file when one exists, otherwise the built-in
    /// defaults for that name, otherwise `None`.
    pub fn load(&self, name: &str) -> Result<Option<Value>> {
        let path = match self.locate(name) {
            Some(path) => path,
            None => {
                log::debug!("No configuration file for '{}', using built-in defaults", name);
                return Ok(builtin_defaults(name));
            }
        };

        let format = ConfigFormat::from_path(&path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))?;
        let content = self.provider.read_to_string(&path)?;
        let value = format.parse(&content, &path)?;

        match value {
            Value::Object(_) => {
                log::debug!("Loaded configuration '{}' from {}", name, path.display());
                Ok(Some(value))
            }
            other => Err(StorageSystemError::NotATable {
                name: name.to_string(),
                found: type_label(&other).to_string(),
            }
            .into()),
        }
    }

    /// List the configuration names available on disk.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.provider.is_dir(&self.config_path) {
            return Ok(vec![]);
        }

        let mut names: Vec<String> = self
            .provider
            .read_dir(&self.config_path)?
            .into_iter()
            .filter(|path| self.provider.is_file(path) && ConfigFormat::from_path(path).is_some())
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str().map(String::from)))
            .collect();
        names.dedup();
        Ok(names)
    }
}

/// Defaults shipped with the framework for well-known configuration names.
pub fn builtin_defaults(name: &str) -> Option<Value> {
    match name {
        "app" => Some(json!({
            "name": crate::kernel::constants::APP_NAME,
            "env": crate::kernel::constants::DEFAULT_ENVIRONMENT,
            "locale": "en",
            "timezone": "UTC",
            "debug": false,
        })),
        "logging" => Some(json!({
            "channel": crate::kernel::constants::APP_NAME,
            "level": "info",
            "format": "text",
        })),
        _ => None,
    }
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
