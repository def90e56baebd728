//! Per-model and per-run execution results

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// State of a single model within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Running,
    Success,
    Failed,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Running => write!(f, "running"),
            ModelStatus::Success => write!(f, "success"),
            ModelStatus::Failed => write!(f, "failed"),
        }
    }
}

/// State of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Pending => write!(f, "pending"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of executing one model
#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    /// Model identifier
    pub name: String,
    pub status: ModelStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Error text; empty on success
    pub error: String,
    /// Statements sent to the adapter, in execution order
    pub statements: Vec<String>,
    /// Best-effort sum of affected rows
    pub rows_affected: Option<u64>,
}

impl ModelResult {
    /// Start tracking a model now
    pub fn started(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ModelStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            error: String::new(),
            statements: Vec::new(),
            rows_affected: None,
        }
    }

    /// Record a successfully executed statement
    pub(crate) fn record(&mut self, sql: &str, rows: usize) {
        self.statements.push(sql.to_string());
        let rows = u64::try_from(rows).unwrap_or(u64::MAX);
        self.rows_affected = Some(self.rows_affected.unwrap_or(0).saturating_add(rows));
    }

    /// Mark the model as succeeded
    pub(crate) fn succeed(&mut self) {
        self.status = ModelStatus::Success;
        self.ended_at = Some(Utc::now());
    }

    /// Mark the model as failed with `error`
    pub(crate) fn fail(&mut self, error: impl fmt::Display) {
        self.status = ModelStatus::Failed;
        self.error = error.to_string();
        self.ended_at = Some(Utc::now());
    }

    /// Whether the model finished successfully
    pub fn is_success(&self) -> bool {
        self.status == ModelStatus::Success
    }

    /// Time from start to finish, or to now while still running
    pub fn duration(&self) -> Duration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Unique identifier for this run
    pub run_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Model results in execution order
    pub models: Vec<ModelResult>,
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionResult {
    /// Create a pending result with a fresh run id
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            ended_at: None,
            models: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Utc::now();
    }

    pub(crate) fn push(&mut self, result: ModelResult) {
        self.models.push(result);
    }

    /// Close the run: Failed if any model failed, otherwise Success
    pub(crate) fn finish(&mut self) {
        self.status = if self.failure_count() > 0 {
            ExecutionStatus::Failed
        } else {
            ExecutionStatus::Success
        };
        self.ended_at = Some(Utc::now());
    }

    /// Number of models that succeeded
    pub fn success_count(&self) -> usize {
        self.models.iter().filter(|m| m.is_success()).count()
    }

    /// Number of models that failed
    pub fn failure_count(&self) -> usize {
        self.models
            .iter()
            .filter(|m| m.status == ModelStatus::Failed)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Time from start to finish, or to now while still running
    pub fn duration(&self) -> Duration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// Result for the model named `name`
    pub fn model(&self, name: &str) -> Option<&ModelResult> {
        self.models.iter().find(|m| m.name == name)
    }
}
