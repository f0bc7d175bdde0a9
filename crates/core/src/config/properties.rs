//! String-keyed property overrides.
//!
//! Properties feed two consumers: the descriptor parser (placeholder
//! substitution) and the session pipeline, which reads the flags listed in
//! [`crate::config::keys`].

use crate::config::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix for property overrides read from the process environment
pub const ENV_PREFIX: &str = "MAPFORGE_";

/// Ordered string map of property overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        self.entries.insert(key.into(), value.to_string())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a boolean flag. Accepts `true/false`, `yes/no`, `on/off`, `1/0`.
    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::invalid_value(key, raw, "boolean (true/false)")),
        }
    }

    /// Merge `other` into `self`; entries from `other` win on key collision.
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Parse a YAML document. Nested mappings are flattened into dotted keys.
    pub fn from_yaml_str(source_name: &str, content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mut properties = Self::new();
        match value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(map) => {
                for (key, value) in map {
                    let key = yaml_scalar(source_name, &key)?;
                    flatten_yaml(source_name, &key, value, &mut properties)?;
                }
            }
            _ => {
                return Err(ConfigError::parsing(
                    source_name,
                    "top level of a property document must be a mapping",
                ))
            }
        }
        Ok(properties)
    }

    /// Parse a flat JSON object
    pub fn from_json_str(source_name: &str, content: &str) -> ConfigResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let serde_json::Value::Object(map) = value else {
            return Err(ConfigError::parsing(
                source_name,
                "top level of a property document must be an object",
            ));
        };

        let mut properties = Self::new();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ConfigError::parsing(
                        source_name,
                        format!("property '{}' has a non-scalar value: {}", key, other),
                    ))
                }
            };
            properties.insert(key, value);
        }
        Ok(properties)
    }

    /// Load a `.yaml`/`.yml` or `.json` property file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let name = path.display().to_string();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&name, &content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&name, &content),
            _ => Err(ConfigError::parsing(name, "unsupported property file extension")),
        }
    }

    /// Collect `MAPFORGE_*` environment variables.
    ///
    /// `MAPFORGE_ENABLE_LOGGER` becomes `enableLogger`.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut properties = Self::new();
        for (name, value) in vars {
            if let Some(rest) = name.strip_prefix(ENV_PREFIX) {
                if !rest.is_empty() {
                    properties.insert(env_to_key(rest), value);
                }
            }
        }
        properties
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// `ENABLE_MAPPER_SCAN_LOG` -> `enableMapperScanLog`
pub fn env_to_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for (i, part) in name.split('_').filter(|p| !p.is_empty()).enumerate() {
        let lower = part.to_ascii_lowercase();
        if i == 0 {
            key.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                key.push(first.to_ascii_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    key
}

fn yaml_scalar(source_name: &str, value: &serde_yaml::Value) -> ConfigResult<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(ConfigError::parsing(
            source_name,
            format!("expected a scalar, found {:?}", other),
        )),
    }
}

fn flatten_yaml(
    source_name: &str,
    prefix: &str,
    value: serde_yaml::Value,
    out: &mut Properties,
) -> ConfigResult<()> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, nested) in map {
                let key = yaml_scalar(source_name, &key)?;
                flatten_yaml(source_name, &format!("{}.{}", prefix, key), nested, out)?;
            }
            Ok(())
        }
        scalar => {
            out.insert(prefix, yaml_scalar(source_name, &scalar)?);
            Ok(())
        }
    }
}
