//! Model execution: single-model materialization and ordered batch runs.

use crate::error::{RunError, RunResult};
use crate::materialize::Strategy;
use crate::result::{ExecutionResult, ModelResult};
use qr_core::sql_utils::{leading_keyword, quote_qualified, split_statements};
use qr_core::{DependencyGraph, GraphNode, Model};
use qr_db::StorageAdapter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Leading keywords that mark a model as hand-written DDL/DML
const RAW_SQL_KEYWORDS: [&str; 6] = ["CREATE", "INSERT", "UPDATE", "DELETE", "DROP", "ALTER"];

/// A failed model together with the result recorded up to the failure
#[derive(Debug)]
pub struct ModelFailure {
    pub result: ModelResult,
    pub error: RunError,
}

impl fmt::Display for ModelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ModelFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Runs compiled models against a storage adapter, one at a time.
pub struct Executor {
    adapter: Arc<dyn StorageAdapter>,
    schema: Option<String>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("db_type", &self.adapter.db_type())
            .field("schema", &self.schema)
            .finish()
    }
}

impl Executor {
    /// Create an executor over `adapter`
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self {
            adapter,
            schema: None,
        }
    }

    /// Materialize unqualified model names into `schema`
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// The adapter statements are sent to
    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    /// Relation name a model is materialized as
    pub fn target_name(&self, model: &str) -> String {
        match &self.schema {
            Some(schema) if !model.contains('.') => format!("{}.{}", schema, model),
            _ => model.to_string(),
        }
    }

    /// Execute one model.
    ///
    /// SQL starting with CREATE, INSERT, UPDATE, DELETE, DROP or ALTER is
    /// split on `;` and run verbatim. Anything else goes through the
    /// model's materialization strategy, wrapped in its pre- and post-hooks.
    /// Statements already executed are not rolled back on failure.
    pub async fn execute_model(&self, model: &Model) -> Result<ModelResult, ModelFailure> {
        let name = model.name.as_str();
        let mut result = ModelResult::started(name);
        log::info!("Running model '{}'", name);

        match self.run_model(model, &mut result).await {
            Ok(()) => {
                result.succeed();
                log::info!(
                    "Model '{}' finished in {}ms",
                    name,
                    result.duration().num_milliseconds()
                );
                Ok(result)
            }
            Err(error) => {
                result.fail(&error);
                log::info!("Model '{}' failed: {}", name, error);
                Err(ModelFailure { result, error })
            }
        }
    }

    /// Execute `models` in dependency order.
    ///
    /// Graph errors abort before anything runs. With `fail_fast` the first
    /// model failure stops the run and is returned as
    /// [`RunError::FailFast`] carrying the results so far; otherwise every
    /// model is attempted and the returned result is marked failed if any
    /// model failed.
    pub async fn execute_models(
        &self,
        models: &[Model],
        fail_fast: bool,
    ) -> RunResult<ExecutionResult> {
        let order = execution_order(models)?;
        let mut run = ExecutionResult::new();
        run.start();
        log::info!(
            "Starting run {} with {} model(s) on {}",
            run.run_id,
            order.len(),
            self.adapter.db_type()
        );

        for model in order {
            match self.execute_model(model).await {
                Ok(result) => run.push(result),
                Err(ModelFailure { result, error }) => {
                    run.push(result);
                    if fail_fast {
                        run.finish();
                        log::warn!("Fail-fast: stopping after '{}'", model.name);
                        return Err(RunError::FailFast {
                            model: model.name.to_string(),
                            message: error.to_string(),
                            result: Box::new(run),
                        });
                    }
                }
            }
        }

        run.finish();
        log::info!(
            "Run {} finished: {} succeeded, {} failed",
            run.run_id,
            run.success_count(),
            run.failure_count()
        );
        Ok(run)
    }

    async fn run_model(&self, model: &Model, result: &mut ModelResult) -> RunResult<()> {
        let name = model.name.as_str();
        let sql = model.compiled_sql.trim();
        if sql.is_empty() {
            return Err(RunError::BlankSql {
                model: name.to_string(),
            });
        }

        if is_raw_sql(sql) {
            log::debug!("Model '{}' is raw SQL, bypassing materialization", name);
            let statements = split_statements(sql);
            return self.run_statements(name, "raw-sql", &statements, result).await;
        }

        let target = self.target_name(name);
        let statements = Strategy::for_config(&model.config).statements(&target, sql, &model.config)?;

        let this = quote_qualified(&target);
        let pre_hooks = render_hooks(&model.config.pre_hooks, &this);
        let post_hooks = render_hooks(&model.config.post_hooks, &this);

        self.run_statements(name, "pre-hook", &pre_hooks, result)
            .await?;
        self.run_statements(name, "materialize", &statements, result)
            .await?;
        self.run_statements(name, "post-hook", &post_hooks, result)
            .await
    }

    async fn run_statements(
        &self,
        model: &str,
        phase: &'static str,
        statements: &[String],
        result: &mut ModelResult,
    ) -> RunResult<()> {
        for sql in statements {
            log::debug!("[{}] {}: {}", model, phase, sql);
            let rows = self
                .adapter
                .execute_ddl(sql)
                .await
                .map_err(|source| RunError::Storage {
                    model: model.to_string(),
                    phase,
                    source,
                })?;
            result.record(sql, rows);
        }
        Ok(())
    }
}

/// Whether compiled SQL should bypass materialization
pub fn is_raw_sql(sql: &str) -> bool {
    leading_keyword(sql).is_some_and(|kw| RAW_SQL_KEYWORDS.contains(&kw.as_str()))
}

/// Substitute `{{ this }}` in hook SQL with the model's quoted relation
fn render_hooks(hooks: &[String], this: &str) -> Vec<String> {
    hooks
        .iter()
        .map(|hook| hook.replace("{{ this }}", this).replace("{{this}}", this))
        .filter(|hook| !hook.trim().is_empty())
        .collect()
}

/// Order `models` so every dependency runs before its dependents
fn execution_order(models: &[Model]) -> RunResult<Vec<&Model>> {
    let mut graph = DependencyGraph::new();
    for model in models {
        graph
            .add_node(GraphNode::model(model.name.as_str()))
            .map_err(RunError::Graph)?;
    }
    for model in models {
        for dep in &model.dependencies {
            graph
                .add_edge(model.name.as_str(), dep.as_str())
                .map_err(RunError::Graph)?;
        }
    }

    let by_name: HashMap<&str, &Model> = models.iter().map(|m| (m.name.as_str(), m)).collect();
    let order = graph.topological_order().map_err(RunError::Graph)?;
    Ok(order
        .into_iter()
        .filter_map(|node| by_name.get(node.id.as_str()).copied())
        .collect())
}

#[cfg(test)]
#[path = "execute_test.rs"]
mod tests;
