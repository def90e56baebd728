//! Run command implementation

use anyhow::{Context, Result};
use qr_core::{Model, Project};
use qr_db::{DuckDbBackend, StorageAdapter};
use qr_run::{ExecutionResult, Executor, ModelCompiler, RunError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::commands::common::{load_project, ExitCode};

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global, args.vars.as_deref())?;
    let json_mode = args.output == OutputFormat::Json;

    let compiled = ModelCompiler::new(&project.config)
        .with_full_refresh(args.full_refresh)
        .compile_all(project.models.values())
        .context("Compilation failed")?;

    let db = create_database_connection(&project)?;
    create_schema(&db, &project).await?;

    let mut executor = Executor::new(db.clone());
    if let Some(schema) = &project.config.schema {
        executor = executor.with_schema(schema.clone());
    }

    let fail_fast = args.fail_fast || project.config.fail_fast;
    if !json_mode {
        println!("Running {} models...\n", compiled.len());
    }

    let (result, stopped) = match executor.execute_models(&compiled, fail_fast).await {
        Ok(result) => (result, None),
        Err(RunError::FailFast { model, result, .. }) => (*result, Some(model)),
        Err(err) => return Err(err).context("Run failed"),
    };

    if let Err(e) = db.close().await {
        log::warn!("Failed to close database: {}", e);
    }

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_results(&result, &compiled, stopped.as_deref());
    }

    if result.is_success() {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}

fn create_database_connection(project: &Project) -> Result<Arc<dyn StorageAdapter>> {
    let configured = project.config.database.path.as_str();
    // Relative database files live under the project root
    let path = if configured == qr_db::duckdb::IN_MEMORY || Path::new(configured).is_absolute() {
        configured.to_string()
    } else {
        project.root.join(configured).display().to_string()
    };
    log::debug!("Using database: {}", path);
    let backend = DuckDbBackend::new(&path)
        .with_context(|| format!("Failed to open database: {}", path))?;
    Ok(Arc::new(backend))
}

async fn create_schema(db: &Arc<dyn StorageAdapter>, project: &Project) -> Result<()> {
    let Some(schema) = project.config.schema.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    log::debug!("Creating schema if not exists: {}", schema);
    db.execute_ddl(&format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        qr_core::sql_utils::quote_ident(schema)
    ))
    .await
    .with_context(|| format!("Failed to create schema: {}", schema))?;
    Ok(())
}

fn print_results(result: &ExecutionResult, compiled: &[Model], stopped: Option<&str>) {
    let materializations: HashMap<&str, String> = compiled
        .iter()
        .map(|m| (m.name.as_str(), m.materialization().to_string()))
        .collect();

    for model in &result.models {
        let millis = model.duration().num_milliseconds();
        if model.is_success() {
            let materialized = materializations
                .get(model.name.as_str())
                .map(String::as_str)
                .unwrap_or("unknown");
            println!("  \u{2713} {} ({}) [{}ms]", model.name, materialized, millis);
        } else {
            println!("  \u{2717} {} - {} [{}ms]", model.name, model.error, millis);
        }
    }

    if let Some(model) = stopped {
        println!("\n  Stopping due to --fail-fast (after '{}')", model);
    }

    let skipped = compiled.len().saturating_sub(result.models.len());
    println!(
        "\nCompleted: {} succeeded, {} failed, {} skipped [{}ms]",
        result.success_count(),
        result.failure_count(),
        skipped,
        result.duration().num_milliseconds()
    );
}
