//! List command implementation

use anyhow::{Context, Result};
use qr_core::{topological_sort, DependencyGraph, GraphNode, Model};
use qr_run::ModelCompiler;
use serde::Serialize;
use std::collections::HashMap;

use crate::cli::{GlobalArgs, LsArgs, OutputFormat};
use crate::commands::common::load_project;

/// One row of `qr ls` output
#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    materialized: String,
    depends_on: Vec<String>,
    used_by: Vec<String>,
    path: String,
}

impl ModelInfo {
    fn from_model(model: &Model, used_by: Vec<&str>) -> Self {
        Self {
            name: model.name.to_string(),
            materialized: model.materialization().to_string(),
            depends_on: model.dependencies.iter().map(|d| d.to_string()).collect(),
            used_by: used_by.into_iter().map(str::to_string).collect(),
            path: model.path.display().to_string(),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global, None)?;
    let compiled = ModelCompiler::new(&project.config)
        .compile_all(project.models.values())
        .context("Compilation failed")?;

    let mut graph = DependencyGraph::new();
    for model in &compiled {
        graph.add_node(GraphNode::model(model.name.as_str()))?;
    }
    for model in &compiled {
        for dep in &model.dependencies {
            graph.add_edge(model.name.as_str(), dep.as_str())?;
        }
    }
    let order = topological_sort(&graph).context("Failed to order models")?;

    let by_name: HashMap<&str, &Model> = compiled.iter().map(|m| (m.name.as_str(), m)).collect();
    let models: Vec<ModelInfo> = order
        .iter()
        .filter_map(|node| by_name.get(node.id.as_str()))
        .map(|m| ModelInfo::from_model(m, graph.dependents(m.name.as_str())))
        .collect();

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&models)?);
        }
        OutputFormat::Text => {
            for model in &models {
                if model.depends_on.is_empty() {
                    println!("{} ({})", model.name, model.materialized);
                } else {
                    println!(
                        "{} ({}) <- {}",
                        model.name,
                        model.materialized,
                        model.depends_on.join(", ")
                    );
                }
            }
            println!("\n{} model(s)", models.len());
        }
    }

    Ok(())
}
