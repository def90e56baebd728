//! Template functions: ref(), source(), seed(), var(), config(), env_var(),
//! is_incremental(), and this().
//!
//! Every function is a plain `fn` over a [`FunctionScope`] and the raw
//! positional arguments. The renderer registers the whole [`FUNCTIONS`]
//! table on each fresh environment, so adding a function means adding one
//! row here.

use crate::context::RenderContext;
use crate::error::{JinjaError, JinjaResult};
use crate::tracker::DependencyCollector;
use minijinja::{ErrorKind, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What a template function can see during one render
#[derive(Clone)]
pub(crate) struct FunctionScope {
    pub(crate) ctx: Arc<RenderContext>,
    pub(crate) collector: Option<Arc<dyn DependencyCollector>>,
}

impl FunctionScope {
    pub(crate) fn new(
        ctx: Arc<RenderContext>,
        collector: Option<Arc<dyn DependencyCollector>>,
    ) -> Self {
        Self { ctx, collector }
    }
}

/// Signature shared by every template function
pub(crate) type TemplateFn = fn(&FunctionScope, &[Value]) -> JinjaResult<Value>;

/// Dispatch table registered on every render environment
pub(crate) const FUNCTIONS: &[(&str, TemplateFn)] = &[
    ("ref", ref_fn),
    ("source", source_fn),
    ("seed", seed_fn),
    ("var", var_fn),
    ("config", config_fn),
    ("env_var", env_var_fn),
    ("is_incremental", is_incremental_fn),
    ("this", this_fn),
];

/// Names of all functions available to templates
pub const FUNCTION_NAMES: &[&str] = &[
    "ref",
    "source",
    "seed",
    "var",
    "config",
    "env_var",
    "is_incremental",
    "this",
];

/// `ref(name)`: qualified reference to another model.
///
/// Records `(current model, name)` with the collector when both are known.
fn ref_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("ref", args, 1, 1)?;
    let name = string_arg("ref", args, 0)?;

    if let (Some(collector), Some(model)) = (&scope.collector, &scope.ctx.model_name) {
        collector.record(model, name);
    }

    Ok(Value::from(scope.ctx.qualify(name)))
}

/// `source(source_name, table)`: qualified name of a raw table.
///
/// An unconfigured source passes through as `source_name.table`; a configured
/// source must list the table.
fn source_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("source", args, 2, 2)?;
    let source_name = string_arg("source", args, 0)?;
    let table = string_arg("source", args, 1)?;

    match scope.ctx.sources.get(source_name) {
        None => Ok(Value::from(format!("{}.{}", source_name, table))),
        Some(tables) => tables
            .get(table)
            .map(|qualified| Value::from(qualified.as_str()))
            .ok_or_else(|| JinjaError::SourceTableNotFound {
                source_name: source_name.to_string(),
                table: table.to_string(),
            }),
    }
}

/// `seed(name)`: qualified name of a loaded seed table.
fn seed_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("seed", args, 1, 1)?;
    let name = string_arg("seed", args, 0)?;
    if name.trim().is_empty() {
        return Err(JinjaError::EmptySeedName);
    }

    scope
        .ctx
        .seeds
        .get(name)
        .map(|qualified| Value::from(qualified.as_str()))
        .ok_or_else(|| JinjaError::SeedNotFound {
            name: name.to_string(),
        })
}

/// `var(name)`: a project or command-line variable.
fn var_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("var", args, 1, 1)?;
    let name = string_arg("var", args, 0)?;

    scope
        .ctx
        .vars
        .get(name)
        .map(to_template_value)
        .ok_or_else(|| JinjaError::VariableNotFound {
            name: name.to_string(),
        })
}

/// `config(key)`: a configuration value addressed by dot path.
fn config_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("config", args, 1, 1)?;
    let key = string_arg("config", args, 0)?;

    scope
        .ctx
        .config
        .lookup_path(key)
        .map(to_template_value)
        .map_err(|e| JinjaError::ConfigKeyNotFound {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// `env_var(key, default?)`: a process environment variable.
///
/// Empty values count as unset.
fn env_var_fn(_scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("env_var", args, 1, 2)?;
    let key = string_arg("env_var", args, 0)?;

    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(Value::from(value)),
        _ => match args.get(1) {
            Some(default) => Ok(Value::from(display_string(default))),
            None => Err(JinjaError::EnvVarNotSet {
                key: key.to_string(),
            }),
        },
    }
}

/// `is_incremental()`: whether this render is an incremental run
fn is_incremental_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("is_incremental", args, 0, 0)?;
    Ok(Value::from(scope.ctx.incremental))
}

/// `this()`: the current model's table, schema-qualified when unqualified.
fn this_fn(scope: &FunctionScope, args: &[Value]) -> JinjaResult<Value> {
    expect_arity("this", args, 0, 0)?;
    let table = scope
        .ctx
        .this_table
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(JinjaError::ThisNotSet)?;

    if table.contains('.') {
        Ok(Value::from(table))
    } else {
        Ok(Value::from(scope.ctx.qualify(table)))
    }
}

fn expect_arity(function: &str, args: &[Value], min: usize, max: usize) -> JinjaResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(JinjaError::InvalidArguments {
            function: function.to_string(),
            message: format!("expected {} argument(s), got {}", expected, args.len()),
        });
    }
    Ok(())
}

fn string_arg<'a>(function: &str, args: &'a [Value], index: usize) -> JinjaResult<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| JinjaError::InvalidArguments {
            function: function.to_string(),
            message: format!("argument {} must be a string", index + 1),
        })
}

fn display_string(value: &Value) -> String {
    if value.is_none() || value.is_undefined() {
        return String::new();
    }
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Convert a core [`qr_core::Value`] into a template value
pub(crate) fn to_template_value(value: &qr_core::Value) -> Value {
    match value {
        qr_core::Value::Null => Value::from(()),
        qr_core::Value::Bool(b) => Value::from(*b),
        qr_core::Value::Integer(i) => Value::from(*i),
        qr_core::Value::Float(f) => Value::from(*f),
        qr_core::Value::String(s) => Value::from(s.as_str()),
        qr_core::Value::Sequence(seq) => {
            Value::from(seq.iter().map(to_template_value).collect::<Vec<_>>())
        }
        qr_core::Value::Mapping(map) => {
            let entries: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), to_template_value(v)))
                .collect();
            Value::from_iter(entries)
        }
    }
}

/// Wrap a function error so it survives the trip through minijinja
pub(crate) fn into_template_error(err: JinjaError) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

#[cfg(test)]
#[path = "functions_test.rs"]
mod tests;
