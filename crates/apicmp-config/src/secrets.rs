//! Secrets referenced by `!secret` tags
//!
//! Secrets live in a `secrets.yaml` file next to the suite file.

use crate::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the suite directory
pub const SECRETS_FILE: &str = "secrets.yaml";

/// Secrets store loaded from secrets.yaml
#[derive(Debug, Clone)]
pub struct Secrets {
    values: IndexMap<String, String>,
    path: PathBuf,
}

/// Text substituted for a secret value
///
/// Scalars use their plain text and null is empty; sequences and mappings
/// are re-emitted as YAML.
fn secret_text(value: serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(&other)
            .map(|yaml| yaml.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl Secrets {
    /// Load secrets from the directory's secrets file, if there is one
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let path = dir.join(SECRETS_FILE);
        if !path.is_file() {
            debug!("No {} in {:?}", SECRETS_FILE, dir);
            return Ok(Self {
                values: IndexMap::new(),
                path,
            });
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parse secrets from YAML text attributed to `path`
    pub fn parse(content: &str, path: PathBuf) -> ConfigResult<Self> {
        let raw: Option<IndexMap<String, serde_yaml::Value>> = serde_yaml::from_str(content)
            .map_err(|source| ConfigError::ParseYaml {
                path: path.clone(),
                source,
            })?;
        let values: IndexMap<String, String> = raw
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, secret_text(value)))
            .collect();

        debug!("{} secrets available from {:?}", values.len(), path);
        Ok(Self { values, path })
    }

    /// Get a secret by key
    pub fn get(&self, key: &str) -> ConfigResult<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::SecretNotFound {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Path the secrets were (or would have been) loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self {
            values: IndexMap::new(),
            path: PathBuf::from(SECRETS_FILE),
        }
    }
}
