//! Materialization strategies: turning a compiled model into ordered SQL.
//!
//! Statement generation is pure. Nothing here touches the storage adapter,
//! so every strategy can be checked by comparing statement lists.

use crate::error::{RunError, RunResult};
use qr_core::sql_utils::{quote_ident, quote_qualified, split_qualified_name};
use qr_core::{Materialization, MaterializationConfig};
use std::fmt;

/// Suffix appended to the staging table of an incremental merge
const INCREMENTAL_TMP_SUFFIX: &str = "__incremental_tmp";

/// How a model's compiled body is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Drop and recreate a view
    View,
    /// Drop and recreate a table
    Table,
    /// Merge rows into the target by unique key
    Incremental,
}

impl Strategy {
    /// Pick the strategy for a materialization setting
    pub fn for_config(config: &MaterializationConfig) -> Self {
        match config.materialized {
            Materialization::View => Strategy::View,
            Materialization::Table => Strategy::Table,
            Materialization::Incremental => Strategy::Incremental,
        }
    }

    /// Statements that materialize `body` as `name`, in execution order.
    ///
    /// Fails before generating anything if either input is blank, or if an
    /// incremental model has no unique key columns.
    pub fn statements(
        &self,
        name: &str,
        body: &str,
        config: &MaterializationConfig,
    ) -> RunResult<Vec<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RunError::BlankModelName);
        }
        let body = normalize_body(body);
        if body.is_empty() {
            return Err(RunError::BlankSql {
                model: name.to_string(),
            });
        }

        match self {
            Strategy::View => Ok(view_statements(name, body)),
            Strategy::Table => Ok(table_statements(name, body)),
            Strategy::Incremental => {
                if config.unique_key.iter().all(|k| k.trim().is_empty()) {
                    return Err(RunError::MissingUniqueKey {
                        model: name.to_string(),
                    });
                }
                if config.full_refresh {
                    log::debug!("Full refresh of incremental model '{}'", name);
                    Ok(table_statements(name, body))
                } else {
                    Ok(incremental_statements(name, body, &config.unique_key))
                }
            }
        }
    }

    /// Lowercase tag matching the configuration value
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::View => "view",
            Strategy::Table => "table",
            Strategy::Incremental => "incremental",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a materialization tag such as `"view"` to its strategy
pub fn strategy_for_tag(tag: &str) -> RunResult<Strategy> {
    tag.parse::<Materialization>()
        .map(|materialized| Strategy::for_config(&MaterializationConfig::with_kind(materialized)))
        .map_err(|_| RunError::UnknownMaterialization {
            value: tag.to_string(),
        })
}

/// Generate the statements for a model's own configuration
pub fn statements_for(
    name: &str,
    body: &str,
    config: &MaterializationConfig,
) -> RunResult<Vec<String>> {
    Strategy::for_config(config).statements(name, body, config)
}

/// Trim whitespace and trailing semicolons so the body can be embedded
fn normalize_body(body: &str) -> &str {
    body.trim().trim_end_matches(';').trim_end()
}

fn view_statements(name: &str, body: &str) -> Vec<String> {
    let target = quote_qualified(name);
    vec![
        format!("DROP VIEW IF EXISTS {}", target),
        format!("CREATE VIEW {} AS {}", target, body),
    ]
}

fn table_statements(name: &str, body: &str) -> Vec<String> {
    let target = quote_qualified(name);
    vec![
        format!("DROP TABLE IF EXISTS {}", target),
        format!("CREATE TABLE {} AS {}", target, body),
    ]
}

/// Five-step upsert-by-replacement through a temporary staging table.
///
/// Temporary tables cannot live in a named schema, so the staging table is
/// named after the last segment of `name` only.
fn incremental_statements(name: &str, body: &str, unique_key: &[String]) -> Vec<String> {
    let target = quote_qualified(name);
    let (_, table) = split_qualified_name(name);
    let tmp = quote_ident(&format!("{}{}", table, INCREMENTAL_TMP_SUFFIX));

    let key_match = unique_key
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| {
            let col = quote_ident(k);
            format!("src.{col} = {target}.{col}")
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    vec![
        format!("CREATE OR REPLACE TEMPORARY TABLE {} AS {}", tmp, body),
        format!(
            "CREATE TABLE IF NOT EXISTS {} AS SELECT * FROM {} WHERE 1 = 0",
            target, tmp
        ),
        format!(
            "DELETE FROM {} WHERE EXISTS (SELECT 1 FROM {} AS src WHERE {})",
            target, tmp, key_match
        ),
        format!("INSERT INTO {} SELECT * FROM {}", target, tmp),
        format!("DROP TABLE IF EXISTS {}", tmp),
    ]
}

#[cfg(test)]
#[path = "materialize_test.rs"]
mod tests;
