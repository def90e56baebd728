//! Configuration types and parsing for quarry.yml

use crate::error::{CoreError, CoreResult};
use crate::model::{Materialization, MaterializationConfig};
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Config file names searched for in a project directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["quarry.yml", "quarry.yaml"];

/// Main project configuration from quarry.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directories containing model SQL templates
    #[serde(default = "default_model_paths")]
    pub model_paths: Vec<String>,

    /// Default schema used by `ref()` and `this()`
    #[serde(default)]
    pub schema: Option<String>,

    /// Default materialization for models without an override
    #[serde(default)]
    pub materialization: Materialization,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Variables available through `var()`
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,

    /// Values available through `config()`, nested keys allowed
    #[serde(default)]
    pub config: BTreeMap<String, Value>,

    /// External sources available through `source()`
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,

    /// Seed tables available through `seed()`, name -> qualified table
    #[serde(default)]
    pub seeds: BTreeMap<String, String>,

    /// Per-model overrides keyed by model name
    #[serde(default)]
    pub models: BTreeMap<String, ModelOverride>,

    /// Abort the run on the first model failure
    #[serde(default)]
    pub fail_fast: bool,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// An external source and the tables it exposes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Schema holding the source tables; defaults to the source name
    #[serde(default)]
    pub schema: Option<String>,

    /// Table names within the source
    #[serde(default)]
    pub tables: Vec<String>,
}

/// Per-model settings from the `models:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelOverride {
    /// Materialization override
    #[serde(default)]
    pub materialized: Option<Materialization>,

    /// Unique key column(s), either a list or a comma-separated string
    #[serde(default, deserialize_with = "string_or_seq")]
    pub unique_key: Vec<String>,

    /// Always rebuild this model from scratch
    #[serde(default)]
    pub full_refresh: bool,

    /// SQL statements to execute before the model runs
    #[serde(default)]
    pub pre_hook: Vec<String>,

    /// SQL statements to execute after the model runs
    #[serde(default)]
    pub post_hook: Vec<String>,

    /// Values layered over the project `config:` for this model
    #[serde(default)]
    pub config: BTreeMap<String, Value>,

    /// Free-form metadata copied onto the model
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

fn default_model_paths() -> Vec<String> {
    vec!["models".to_string()]
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

/// Accept `unique_key: id`, `unique_key: "id, day"` or `unique_key: [id, day]`
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let columns = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => s.split(',').map(str::to_string).collect(),
        OneOrMany::Many(v) => v,
    };
    Ok(columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect())
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for quarry.yml, then quarry.yaml.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map(|path| Self::load(&path))
            .unwrap_or_else(|| {
                Err(CoreError::ConfigNotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.model_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one model_paths entry must be specified".to_string(),
            });
        }

        for (name, model) in &self.models {
            if model.materialized == Some(Materialization::Incremental)
                && model.unique_key.is_empty()
            {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Incremental model '{}' needs a unique_key", name),
                });
            }
        }

        Ok(())
    }

    /// Get absolute model paths relative to a project root
    pub fn model_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.model_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Materialization settings for a model, applying its override.
    ///
    /// `force_full_refresh` comes from the command line and wins over the
    /// per-model setting.
    pub fn materialization_for(&self, model: &str, force_full_refresh: bool) -> MaterializationConfig {
        let Some(over) = self.models.get(model) else {
            return MaterializationConfig::with_kind(self.materialization)
                .with_full_refresh(force_full_refresh);
        };
        MaterializationConfig {
            materialized: over.materialized.unwrap_or(self.materialization),
            unique_key: over.unique_key.clone(),
            full_refresh: over.full_refresh || force_full_refresh,
            pre_hooks: over.pre_hook.clone(),
            post_hooks: over.post_hook.clone(),
        }
    }

    /// The `config()` mapping seen by a model: project values with the
    /// model's own `config:` layered on top.
    pub fn config_for(&self, model: &str) -> Value {
        let mut merged: Value = self
            .config
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(over) = self.models.get(model) {
            merged.merge(Value::Mapping(over.config.clone()));
        }
        merged
    }

    /// Sources as `source name -> table name -> qualified name`
    pub fn source_tables(&self) -> HashMap<String, HashMap<String, String>> {
        self.sources
            .iter()
            .map(|(source, cfg)| {
                let schema = cfg.schema.as_deref().unwrap_or(source);
                let tables = cfg
                    .tables
                    .iter()
                    .map(|t| (t.clone(), format!("{}.{}", schema, t)))
                    .collect();
                (source.clone(), tables)
            })
            .collect()
    }

    /// Merge variables from the command line over the configured ones
    pub fn override_vars(&mut self, vars: BTreeMap<String, Value>) {
        self.vars.extend(vars);
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
