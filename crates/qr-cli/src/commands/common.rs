//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use qr_core::{Project, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Return `Err(ExitCode(N).into())` instead of calling `std::process::exit`
/// so destructors (open database handles) still run.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the project at `--project-dir`, applying `--vars` overrides
pub(crate) fn load_project(global: &GlobalArgs, vars: Option<&str>) -> Result<Project> {
    let mut project =
        Project::load(Path::new(&global.project_dir)).context("Failed to load project")?;

    if let Some(json) = vars {
        project.config.override_vars(parse_vars(json)?);
    }

    log::debug!(
        "Loaded project '{}' with {} model(s) from {}",
        project.config.name,
        project.models.len(),
        project.root.display()
    );
    Ok(project)
}

/// Parse a `--vars` argument: a JSON object of variable overrides
pub(crate) fn parse_vars(json: &str) -> Result<BTreeMap<String, Value>> {
    let value: Value = serde_json::from_str(json).context("Invalid --vars JSON")?;
    match value {
        Value::Mapping(vars) => Ok(vars),
        other => bail!("--vars must be a JSON object, got: {}", other),
    }
}

/// Split a comma-separated `--models` list; `None` selects everything
pub(crate) fn parse_model_filter(filter: Option<&str>) -> Option<Vec<String>> {
    filter.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Fail when a requested model does not exist in the project
pub(crate) fn check_selected(project: &Project, selected: &[String]) -> Result<()> {
    let missing: Vec<&str> = selected
        .iter()
        .map(String::as_str)
        .filter(|name| project.get_model(name).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("Unknown model(s): {}", missing.join(", "));
    }
    Ok(())
}
