//! Per-render context for template functions.
//!
//! A [`RenderContext`] is built fresh for every render with builder-style
//! setters; template functions only ever read from it.

use qr_core::{MaterializationConfig, Value};
use std::collections::{BTreeMap, HashMap};

/// Everything the template functions can see while rendering one model.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Model being rendered; `ref()` only records dependencies when set
    pub model_name: Option<String>,
    /// Default schema prefixed onto `ref()` and `this()` results
    pub schema: Option<String>,
    /// Value returned by `is_incremental()`
    pub incremental: bool,
    /// Table name returned by `this()`
    pub this_table: Option<String>,
    /// `var()` lookups
    pub vars: BTreeMap<String, Value>,
    /// `config()` lookups; a mapping, searched by dot path
    pub config: Value,
    /// `source()` lookups: source name -> table name -> qualified name
    pub sources: HashMap<String, HashMap<String, String>>,
    /// `seed()` lookups: seed name -> qualified name
    pub seeds: HashMap<String, String>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            model_name: None,
            schema: None,
            incremental: false,
            this_table: None,
            vars: BTreeMap::new(),
            config: Value::mapping(),
            sources: HashMap::new(),
            seeds: HashMap::new(),
        }
    }
}

impl RenderContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for rendering `model`: sets the current model, `this()`
    /// table, and the incremental flag from its materialization settings.
    pub fn for_model(model: &str, config: &MaterializationConfig) -> Self {
        Self::new()
            .with_model(model)
            .with_this(model)
            .with_incremental(config.is_incremental_run())
    }

    /// Set the current model name
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    /// Set the default schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the incremental-mode flag
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Set the current model's table name
    pub fn with_this(mut self, table: impl Into<String>) -> Self {
        self.this_table = Some(table.into());
        self
    }

    /// Replace all variables
    pub fn with_vars(mut self, vars: BTreeMap<String, Value>) -> Self {
        self.vars = vars;
        self
    }

    /// Add one variable
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Replace the configuration mapping
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Add one top-level configuration entry
    pub fn with_config_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !matches!(self.config, Value::Mapping(_)) {
            self.config = Value::mapping();
        }
        self.config.insert(key, value.into());
        self
    }

    /// Replace all sources
    pub fn with_sources(mut self, sources: HashMap<String, HashMap<String, String>>) -> Self {
        self.sources = sources;
        self
    }

    /// Add one source table
    pub fn with_source(
        mut self,
        source: impl Into<String>,
        table: impl Into<String>,
        qualified: impl Into<String>,
    ) -> Self {
        self.sources
            .entry(source.into())
            .or_default()
            .insert(table.into(), qualified.into());
        self
    }

    /// Replace all seeds
    pub fn with_seeds(mut self, seeds: HashMap<String, String>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Add one seed
    pub fn with_seed(mut self, name: impl Into<String>, qualified: impl Into<String>) -> Self {
        self.seeds.insert(name.into(), qualified.into());
        self
    }

    /// Prefix `name` with the default schema, if one is set
    pub fn qualify(&self, name: &str) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, name),
            _ => name.to_string(),
        }
    }
}
