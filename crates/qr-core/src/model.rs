//! Model representation and materialization settings

use crate::error::{CoreError, CoreResult};
use crate::model_name::ModelName;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Persistence strategy for a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Materialization {
    /// Drop and recreate a view
    View,
    /// Drop and recreate a table
    #[default]
    Table,
    /// Merge new rows into an existing table by unique key
    Incremental,
}

impl Materialization {
    /// Lowercase tag used in configuration files and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Materialization::View => "view",
            Materialization::Table => "table",
            Materialization::Incremental => "incremental",
        }
    }
}

impl fmt::Display for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Materialization {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Materialization::View),
            "table" => Ok(Materialization::Table),
            "incremental" => Ok(Materialization::Incremental),
            _ => Err(CoreError::UnknownMaterialization {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Materialization {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// How a model is persisted in the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MaterializationConfig {
    /// Strategy tag; defaults to `table`
    #[serde(default)]
    pub materialized: Materialization,

    /// Columns identifying a row for incremental merges
    #[serde(default)]
    pub unique_key: Vec<String>,

    /// Rebuild an incremental model from scratch
    #[serde(default)]
    pub full_refresh: bool,

    /// SQL executed before the model's statements
    #[serde(default)]
    pub pre_hooks: Vec<String>,

    /// SQL executed after the model's statements
    #[serde(default)]
    pub post_hooks: Vec<String>,
}

impl MaterializationConfig {
    /// Config for a view
    pub fn view() -> Self {
        Self::with_kind(Materialization::View)
    }

    /// Config for a full-refresh table
    pub fn table() -> Self {
        Self::with_kind(Materialization::Table)
    }

    /// Config for an incremental table keyed on `unique_key`
    pub fn incremental<I, S>(unique_key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unique_key: unique_key.into_iter().map(Into::into).collect(),
            ..Self::with_kind(Materialization::Incremental)
        }
    }

    /// Config for an arbitrary materialization kind
    pub fn with_kind(materialized: Materialization) -> Self {
        Self {
            materialized,
            ..Self::default()
        }
    }

    /// Set the full-refresh override
    pub fn with_full_refresh(mut self, full_refresh: bool) -> Self {
        self.full_refresh = full_refresh;
        self
    }

    /// Append a pre-hook statement
    pub fn with_pre_hook(mut self, sql: impl Into<String>) -> Self {
        self.pre_hooks.push(sql.into());
        self
    }

    /// Append a post-hook statement
    pub fn with_post_hook(mut self, sql: impl Into<String>) -> Self {
        self.post_hooks.push(sql.into());
        self
    }

    /// Whether templates should see `is_incremental() == true`.
    ///
    /// True only for incremental models that are not being fully refreshed.
    pub fn is_incremental_run(&self) -> bool {
        self.materialized == Materialization::Incremental && !self.full_refresh
    }
}

/// A named, dependency-aware SQL transformation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Unique model identifier
    pub name: ModelName,

    /// Path to the template file the model was loaded from
    pub path: PathBuf,

    /// Template source before rendering
    #[serde(default)]
    pub raw_sql: String,

    /// SQL after rendering; empty until compiled
    #[serde(default)]
    pub compiled_sql: String,

    /// Materialization settings
    #[serde(default)]
    pub config: MaterializationConfig,

    /// Models this model depends on
    #[serde(default)]
    pub dependencies: BTreeSet<ModelName>,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Model {
    /// Create a model with an identifier and source path.
    ///
    /// Fails when either is empty.
    pub fn new(name: &str, path: impl AsRef<Path>) -> CoreResult<Self> {
        let model_name = ModelName::try_new(name).ok_or_else(|| CoreError::EmptyName {
            context: "model identifier".into(),
        })?;
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CoreError::EmptyPath {
                name: model_name.into_inner(),
            });
        }
        Ok(Self {
            name: model_name,
            path: path.to_path_buf(),
            raw_sql: String::new(),
            compiled_sql: String::new(),
            config: MaterializationConfig::default(),
            dependencies: BTreeSet::new(),
            metadata: BTreeMap::new(),
        })
    }

    /// Attach the template source
    pub fn set_raw_sql(&mut self, sql: impl Into<String>) {
        self.raw_sql = sql.into();
    }

    /// Attach the rendered SQL
    pub fn set_compiled_sql(&mut self, sql: impl Into<String>) {
        self.compiled_sql = sql.into();
    }

    /// Replace the materialization settings
    pub fn set_config(&mut self, config: MaterializationConfig) {
        self.config = config;
    }

    /// Record a dependency on another model.
    ///
    /// Re-adding an existing dependency is a no-op. Returns whether the
    /// dependency was newly added.
    pub fn add_dependency(&mut self, name: &str) -> CoreResult<bool> {
        let dep = ModelName::try_new(name).ok_or_else(|| CoreError::EmptyName {
            context: format!("dependency of model '{}'", self.name),
        })?;
        Ok(self.dependencies.insert(dep))
    }

    /// Set one metadata entry, replacing any previous value
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Shorthand for the materialization tag
    pub fn materialization(&self) -> Materialization {
        self.config.materialized
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
