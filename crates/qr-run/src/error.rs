//! Error types for qr-run

use crate::result::ExecutionResult;
use qr_core::CoreError;
use qr_db::DbError;
use qr_jinja::JinjaError;
use thiserror::Error;

/// Compilation, materialization and execution errors
#[derive(Error, Debug)]
pub enum RunError {
    /// Graph construction or ordering failed (R001)
    #[error("[R001] Dependency graph error: {0}")]
    Graph(#[source] CoreError),

    /// A model template failed to render (R002)
    #[error("[R002] Failed to compile model '{model}': {source}")]
    Compile {
        model: String,
        #[source]
        source: JinjaError,
    },

    /// Model name is empty or whitespace (R003)
    #[error("[R003] Model name cannot be blank")]
    BlankModelName,

    /// Compiled SQL is empty or whitespace (R004)
    #[error("[R004] Model '{model}' has no compiled SQL")]
    BlankSql { model: String },

    /// Incremental model without unique key columns (R005)
    #[error("[R005] Incremental model '{model}' requires a non-empty unique_key")]
    MissingUniqueKey { model: String },

    /// Materialization tag not recognized (R006)
    #[error("[R006] Unknown materialization type: '{value}'")]
    UnknownMaterialization { value: String },

    /// The storage adapter rejected a statement (R007)
    #[error("[R007] Model '{model}' failed during {phase}: {source}")]
    Storage {
        model: String,
        phase: &'static str,
        #[source]
        source: DbError,
    },

    /// A fail-fast run stopped at its first failed model (R008)
    #[error("[R008] Run aborted after model '{model}' failed: {message}")]
    FailFast {
        model: String,
        message: String,
        result: Box<ExecutionResult>,
    },
}

/// Result type alias for RunError
pub type RunResult<T> = Result<T, RunError>;

impl RunError {
    /// The partial result carried by a fail-fast abort
    pub fn partial_result(&self) -> Option<&ExecutionResult> {
        match self {
            RunError::FailFast { result, .. } => Some(result),
            _ => None,
        }
    }
}
