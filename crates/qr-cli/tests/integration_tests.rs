//! Integration tests for Quarry

use qr_core::{Materialization, Project};
use qr_db::{DuckDbBackend, StorageAdapter};
use qr_run::{ExecutionStatus, Executor, ModelCompiler, RunError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;
use tempfile::TempDir;

fn sample_project_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_project")
}

fn qr(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qr"))
        .args(args)
        .output()
        .expect("failed to run qr")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Write a project with the given config and `models/<name>.sql` files
fn write_project(config: &str, models: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("quarry.yml"), config).unwrap();
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    for (name, sql) in models {
        std::fs::write(dir.path().join(format!("models/{}.sql", name)), sql).unwrap();
    }
    dir
}

#[test]
fn test_load_sample_project() {
    let project = Project::load(&sample_project_path()).unwrap();

    assert_eq!(project.config.name, "sample_project");
    assert_eq!(
        project.model_names(),
        vec!["customer_totals", "stg_customers", "stg_orders"]
    );
    let totals = project.get_model("customer_totals").unwrap();
    assert_eq!(totals.materialization(), Materialization::Table);
    assert_eq!(totals.config.post_hooks.len(), 1);
    assert_eq!(
        project.get_model("stg_orders").unwrap().materialization(),
        Materialization::View
    );
}

#[test]
fn test_compile_sample_project() {
    let project = Project::load(&sample_project_path()).unwrap();
    let compiled = ModelCompiler::new(&project.config)
        .compile_all(project.models.values())
        .unwrap();

    let totals = compiled
        .iter()
        .find(|m| m.name.as_str() == "customer_totals")
        .unwrap();
    assert!(totals.compiled_sql.contains("FROM analytics.stg_customers AS c"));
    assert!(totals.compiled_sql.contains("JOIN analytics.stg_orders AS o"));
    assert!(totals.compiled_sql.contains("o.amount >= 10"));
    assert!(totals.compiled_sql.contains("'USD' AS currency"));

    let deps: Vec<&str> = totals.dependencies.iter().map(|d| d.as_str()).collect();
    assert_eq!(deps, vec!["stg_customers", "stg_orders"]);
}

#[tokio::test]
async fn test_execute_sample_project_in_memory() {
    let project = Project::load(&sample_project_path()).unwrap();
    let compiled = ModelCompiler::new(&project.config)
        .compile_all(project.models.values())
        .unwrap();

    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    db.execute_ddl("CREATE SCHEMA IF NOT EXISTS analytics")
        .await
        .unwrap();
    let executor = Executor::new(db.clone()).with_schema("analytics");

    let result = executor.execute_models(&compiled, true).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Success);
    let order: Vec<&str> = result.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(order, vec!["stg_customers", "stg_orders", "customer_totals"]);

    let rows = db
        .execute_query(
            "SELECT name, total_amount FROM analytics.customer_totals ORDER BY name",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.get(0, "name"), Some("alice"));
    assert_eq!(rows.get(0, "total_amount"), Some("40"));
    assert_eq!(rows.get(1, "name"), Some("bob"));

    let audit = db
        .execute_query("SELECT row_count FROM analytics.customer_totals_audit", &[])
        .await
        .unwrap();
    assert_eq!(audit.get(0, "row_count"), Some("2"));
}

#[tokio::test]
async fn test_fail_fast_reports_partial_run() {
    let dir = write_project(
        "name: broken\nmaterialization: table\n",
        &[
            ("a_ok", "SELECT 1 AS id"),
            ("b_bad", "SELECT * FROM {{ ref('a_ok') }} JOIN missing_table USING (id)"),
            ("c_after", "SELECT * FROM {{ ref('b_bad') }}"),
        ],
    );
    let project = Project::load(dir.path()).unwrap();
    let compiled = ModelCompiler::new(&project.config)
        .compile_all(project.models.values())
        .unwrap();

    let db = Arc::new(DuckDbBackend::in_memory().unwrap());
    let err = Executor::new(db)
        .execute_models(&compiled, true)
        .await
        .unwrap_err();

    match err {
        RunError::FailFast { model, result, .. } => {
            assert_eq!(model, "b_bad");
            assert_eq!(result.models.len(), 2);
            assert_eq!(result.success_count(), 1);
            assert!(result.model("c_after").is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cli_ls_prints_execution_order() {
    let project = sample_project_path();
    let output = qr(&["--project-dir", project.to_str().unwrap(), "ls"]);
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "stg_customers (view)");
    assert_eq!(lines[1], "stg_orders (view)");
    assert_eq!(lines[2], "customer_totals (table) <- stg_customers, stg_orders");
    assert!(text.contains("3 model(s)"));
}

#[test]
fn test_cli_compile_with_vars_and_filter() {
    let project = sample_project_path();
    let output = qr(&[
        "-p",
        project.to_str().unwrap(),
        "compile",
        "--models",
        "customer_totals",
        "--vars",
        r#"{"min_amount": 20}"#,
    ]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("-- customer_totals (table)"));
    assert!(text.contains("o.amount >= 20"));
    assert!(!text.contains("-- stg_orders"));
}

#[test]
fn test_cli_compile_unknown_model_fails() {
    let project = sample_project_path();
    let output = qr(&[
        "-p",
        project.to_str().unwrap(),
        "compile",
        "--models",
        "nope",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown model(s): nope"));
}

#[test]
fn test_cli_run_json_success() {
    let project = sample_project_path();
    let output = qr(&["-p", project.to_str().unwrap(), "run", "--output", "json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["models"].as_array().unwrap().len(), 3);
    assert_eq!(json["models"][2]["name"], "customer_totals");
}

#[test]
fn test_cli_run_failure_exits_non_zero() {
    let dir = write_project(
        "name: broken\n",
        &[
            ("good", "SELECT 1 AS id"),
            ("bad", "SELECT * FROM nowhere"),
        ],
    );
    let output = qr(&["-p", dir.path().to_str().unwrap(), "run"]);
    assert_eq!(output.status.code(), Some(1));

    let text = stdout(&output);
    assert!(text.contains("\u{2713} good (table)"));
    assert!(text.contains("\u{2717} bad"));
    assert!(text.contains("1 succeeded, 1 failed, 0 skipped"));
}

#[test]
fn test_cli_incremental_run_merges_into_file_database() {
    let dir = write_project(
        r#"
name: events
database:
  path: warehouse.duckdb
models:
  events:
    materialized: incremental
    unique_key: id
"#,
        &[(
            "events",
            "SELECT * FROM (VALUES (1, '{{ var('label') }}'), ({{ var('next_id') }}, 'new')) AS t(id, label)",
        )],
    );
    let project = dir.path().to_str().unwrap();

    let first = qr(&["-p", project, "run", "--vars", r#"{"label": "v1", "next_id": 2}"#]);
    assert!(first.status.success(), "{}", stdout(&first));
    let second = qr(&["-p", project, "run", "--vars", r#"{"label": "v2", "next_id": 3}"#]);
    assert!(second.status.success(), "{}", stdout(&second));

    let db = DuckDbBackend::from_path(&dir.path().join("warehouse.duckdb")).unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let rows = runtime
        .block_on(db.execute_query("SELECT id, label FROM events ORDER BY id", &[]))
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows.get(0, "label"), Some("v2"));
    assert_eq!(rows.get(1, "id"), Some("2"));
    assert_eq!(rows.get(2, "label"), Some("new"));
}
