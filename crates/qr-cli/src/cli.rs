//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Quarry - compile and run dependency-ordered SQL models
#[derive(Parser, Debug)]
#[command(name = "qr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".", env = "QUARRY_PROJECT_DIR")]
    pub project_dir: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render model templates to SQL
    Compile(CompileArgs),

    /// Compile and execute models in dependency order
    Run(RunArgs),

    /// List models in execution order with their dependencies
    Ls(LsArgs),
}

/// Arguments for the compile command
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Model names to print (comma-separated, default: all)
    #[arg(short, long)]
    pub models: Option<String>,

    /// Also write each compiled model to `<dir>/<model>.sql`
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Override/add variables as JSON
    #[arg(long)]
    pub vars: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Stop at the first failed model
    #[arg(long)]
    pub fail_fast: bool,

    /// Rebuild incremental models from scratch
    #[arg(long)]
    pub full_refresh: bool,

    /// Override/add variables as JSON
    #[arg(long)]
    pub vars: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// JSON document
    Json,
}
