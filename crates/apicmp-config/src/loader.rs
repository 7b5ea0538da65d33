//! YAML loader with custom tag support
//!
//! Supported tags:
//! - `!include path` - Include another YAML file
//! - `!include_dir_merge_list dir` - Concatenate the lists of every YAML file in a directory
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution
//!
//! Relative paths resolve against the directory of the file that names them.

use crate::error::{ConfigError, ConfigResult};
use crate::secrets::Secrets;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// YAML loader that expands custom tags
pub struct YamlLoader {
    /// Base directory for resolving relative paths
    base_dir: PathBuf,
    secrets: Secrets,
    /// Files currently being loaded, for circular include detection
    include_stack: HashSet<PathBuf>,
}

impl YamlLoader {
    /// Create a loader for a directory, reading its secrets file if present
    pub fn new(base_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let base_dir = base_dir.into();
        let secrets = Secrets::load(&base_dir)?;
        Ok(Self::with_secrets(base_dir, secrets))
    }

    /// Create a loader with pre-loaded secrets
    pub fn with_secrets(base_dir: impl Into<PathBuf>, secrets: Secrets) -> Self {
        Self {
            base_dir: base_dir.into(),
            secrets,
            include_stack: HashSet::new(),
        }
    }

    /// Load and process a YAML file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.resolve_path(path.as_ref());
        debug!("Loading YAML file: {:?}", path);

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        // Cycles are detected on canonical paths, so `dir/../dir/a.yaml` is `dir/a.yaml`
        let canonical = fs::canonicalize(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        if self.include_stack.contains(&canonical) {
            return Err(ConfigError::CircularInclude { path: canonical });
        }

        self.include_stack.insert(canonical.clone());
        let result = self.load_string(&content, &path);
        self.include_stack.remove(&canonical);

        result
    }

    /// Load and process YAML from a string
    ///
    /// `source_path` names the document in errors and anchors relative
    /// include paths.
    pub fn load_string(&mut self, content: &str, source_path: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        self.process_value(value, source_path)
    }

    fn process_value(&mut self, value: Value, source_path: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.process_tagged(*tagged, source_path),
            Value::Mapping(map) => {
                let mut result = Mapping::new();
                for (k, v) in map {
                    let key = self.process_value(k, source_path)?;
                    let value = self.process_value(v, source_path)?;
                    result.insert(key, value);
                }
                Ok(Value::Mapping(result))
            }
            Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| self.process_value(v, source_path))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            other => Ok(other),
        }
    }

    fn process_tagged(&mut self, tagged: TaggedValue, source_path: &Path) -> ConfigResult<Value> {
        let tag = tagged.tag.to_string();
        trace!("Processing tag '{}' with value {:?}", tag, tagged.value);

        match tag.as_str() {
            "!include" => {
                let path = self.value_to_path(&tagged.value, source_path)?;
                debug!("Including file: {:?}", path);
                self.load_file(&path)
            }
            "!include_dir_merge_list" => self.include_dir_merge_list(&tagged.value, source_path),
            "!secret" => {
                let key = expect_string(tagged.value, "!secret", "secret key must be a string")?;
                let secret = self.secrets.get(&key)?;
                debug!("Substituted secret: {}", key);
                Ok(Value::String(secret.to_string()))
            }
            "!env_var" => {
                let var = expect_string(
                    tagged.value,
                    "!env_var",
                    "environment variable name must be a string",
                )?;
                let value = std::env::var(&var)
                    .map_err(|_| ConfigError::EnvVarNotFound { var: var.clone() })?;
                debug!("Substituted env var: {}", var);
                Ok(Value::String(value))
            }
            _ => {
                // Unknown tags are kept; their contents are still processed
                let value = self.process_value(tagged.value, source_path)?;
                Ok(Value::Tagged(Box::new(TaggedValue {
                    tag: tagged.tag,
                    value,
                })))
            }
        }
    }

    fn include_dir_merge_list(&mut self, value: &Value, source_path: &Path) -> ConfigResult<Value> {
        let dir = self.value_to_path(value, source_path)?;
        debug!("Including directory as merged list: {:?}", dir);

        let mut result = Vec::new();
        for file in yaml_files(&dir)? {
            match self.load_file(&file)? {
                Value::Sequence(seq) => result.extend(seq),
                Value::Null => {}
                other => result.push(other),
            }
        }
        Ok(Value::Sequence(result))
    }

    fn value_to_path(&self, value: &Value, source_path: &Path) -> ConfigResult<PathBuf> {
        let Value::String(text) = value else {
            return Err(ConfigError::InvalidIncludePath {
                path: format!("{:?}", value),
                reason: "path must be a string".to_string(),
            });
        };

        let path = Path::new(text);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base = source_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(&self.base_dir);
        Ok(base.join(path))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn expect_string(value: Value, tag: &str, reason: &str) -> ConfigResult<String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ConfigError::InvalidValue {
            key: tag.to_string(),
            reason: reason.to_string(),
        }),
    }
}

/// All `.yaml`/`.yml` files in a directory, sorted by name
fn yaml_files(dir: &Path) -> ConfigResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ConfigError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ConfigError::ReadFile {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Load a YAML file with full tag processing
///
/// Secrets are read from the file's own directory.
pub fn load_yaml(path: impl AsRef<Path>) -> ConfigResult<Value> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut loader = YamlLoader::new(dir)?;
    loader.load_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn get<'a>(value: &'a Value, key: &str) -> &'a Value {
        value
            .as_mapping()
            .and_then(|m| m.get(Value::String(key.to_string())))
            .unwrap()
    }

    #[test]
    fn test_include_is_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "suites/shared/headers.yaml", "Accept: application/json\n");
        write_file(
            dir.path(),
            "suites/main.yaml",
            "config:\n  headers: !include shared/headers.yaml\n",
        );

        let value = load_yaml(dir.path().join("suites/main.yaml")).unwrap();
        let headers = get(get(&value, "config"), "headers");
        assert_eq!(get(headers, "Accept"), &Value::String("application/json".into()));
    }

    #[test]
    fn test_include_dir_merge_list() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "tests/a.yaml", "- name: one\n- name: two\n");
        write_file(dir.path(), "tests/b.yml", "- name: three\n");
        write_file(dir.path(), "tests/notes.txt", "ignored");
        write_file(dir.path(), "suite.yaml", "tests: !include_dir_merge_list tests\n");

        let value = load_yaml(dir.path().join("suite.yaml")).unwrap();
        let tests = get(&value, "tests").as_sequence().unwrap();
        assert_eq!(tests.len(), 3);
        assert_eq!(get(&tests[2], "name"), &Value::String("three".into()));
    }

    #[test]
    fn test_missing_include_dir() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "suite.yaml", "tests: !include_dir_merge_list nope\n");
        let result = load_yaml(dir.path().join("suite.yaml"));
        assert!(matches!(result, Err(ConfigError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_secret() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "secrets.yaml", "token: abc123\n");
        write_file(dir.path(), "suite.yaml", "auth: !secret token\n");

        let value = load_yaml(dir.path().join("suite.yaml")).unwrap();
        assert_eq!(get(&value, "auth"), &Value::String("abc123".into()));
    }

    #[test]
    fn test_missing_secret() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "suite.yaml", "auth: !secret token\n");
        let result = load_yaml(dir.path().join("suite.yaml"));
        assert!(matches!(result, Err(ConfigError::SecretNotFound { .. })));
    }

    #[test]
    fn test_env_var() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("APICMP_LOADER_TEST_HOST", "staging.local");
        write_file(dir.path(), "suite.yaml", "host: !env_var APICMP_LOADER_TEST_HOST\n");

        let value = load_yaml(dir.path().join("suite.yaml")).unwrap();
        assert_eq!(get(&value, "host"), &Value::String("staging.local".into()));
        std::env::remove_var("APICMP_LOADER_TEST_HOST");
    }

    #[test]
    fn test_missing_env_var() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "suite.yaml", "host: !env_var APICMP_LOADER_TEST_UNSET\n");
        let result = load_yaml(dir.path().join("suite.yaml"));
        assert!(matches!(result, Err(ConfigError::EnvVarNotFound { .. })));
    }

    #[test]
    fn test_circular_include_detection() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.yaml", "b: !include b.yaml\n");
        write_file(dir.path(), "b.yaml", "a: !include a.yaml\n");

        let result = load_yaml(dir.path().join("a.yaml"));
        assert!(matches!(result, Err(ConfigError::CircularInclude { .. })));
    }

    #[test]
    fn test_circular_include_through_parent_dir() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "suites/a.yaml", "x: !include ../suites/a.yaml\n");

        let result = load_yaml(dir.path().join("suites/a.yaml"));
        match result {
            Err(ConfigError::CircularInclude { path }) => {
                assert_eq!(path, fs::canonicalize(dir.path().join("suites/a.yaml")).unwrap());
            }
            other => panic!("expected a circular include error, got {:?}", other),
        }
    }

    #[test]
    fn test_same_file_included_twice_is_not_a_cycle() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "common/headers.yaml", "Accept: application/json\n");
        write_file(
            dir.path(),
            "suite.yaml",
            "a: !include common/headers.yaml\nb: !include ./common/../common/headers.yaml\n",
        );

        let value = load_yaml(dir.path().join("suite.yaml")).unwrap();
        assert_eq!(get(get(&value, "a"), "Accept"), get(get(&value, "b"), "Accept"));
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let dir = TempDir::new().unwrap();
        let mut loader = YamlLoader::with_secrets(dir.path(), Secrets::default());
        let value = loader
            .load_string("x: !custom value\n", Path::new("inline.yaml"))
            .unwrap();
        assert!(matches!(get(&value, "x"), Value::Tagged(_)));
    }

    #[test]
    fn test_parse_error() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "suite.yaml", "key: [unclosed\n");
        let result = load_yaml(dir.path().join("suite.yaml"));
        assert!(matches!(result, Err(ConfigError::ParseYaml { .. })));
    }
}
