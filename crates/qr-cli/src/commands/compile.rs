//! Compile command implementation

use anyhow::{Context, Result};
use qr_run::ModelCompiler;
use std::path::Path;

use crate::cli::{CompileArgs, GlobalArgs};
use crate::commands::common::{check_selected, load_project, parse_model_filter};

/// Execute the compile command
pub async fn execute(args: &CompileArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global, args.vars.as_deref())?;
    let selected = parse_model_filter(args.models.as_deref());
    if let Some(names) = &selected {
        check_selected(&project, names)?;
    }

    // Every model takes part so ref() targets resolve as dependencies
    let compiled = ModelCompiler::new(&project.config)
        .compile_all(project.models.values())
        .context("Compilation failed")?;

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir))?;
    }

    for model in &compiled {
        let name = model.name.as_str();
        if selected
            .as_ref()
            .is_some_and(|names| !names.iter().any(|n| n == name))
        {
            continue;
        }

        println!("-- {} ({})", name, model.materialization());
        println!("{}", model.compiled_sql.trim_end());
        println!();

        if let Some(dir) = &args.output_dir {
            let path = Path::new(dir).join(format!("{}.sql", name));
            std::fs::write(&path, &model.compiled_sql)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::debug!("Wrote {}", path.display());
        }
    }

    Ok(())
}
