//! Error types for qr-core

use thiserror::Error;

/// Core error type for Quarry
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: An identifier that must be non-empty was empty
    #[error("[E003] Empty name: {context}")]
    EmptyName { context: String },

    /// E004: A model was constructed without a source path
    #[error("[E004] Model '{name}' has an empty path")]
    EmptyPath { name: String },

    /// E005: Node added twice to the dependency graph
    #[error("[E005] Duplicate node in dependency graph: {id}")]
    DuplicateNode { id: String },

    /// E006: Edge references a node that was never added
    #[error("[E006] Unknown node '{missing}' in dependency '{dependent}' -> '{dependency}'")]
    UnknownNode {
        dependent: String,
        dependency: String,
        missing: String,
    },

    /// E007: Circular dependency detected
    #[error("[E007] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E008: Unrecognized materialization tag
    #[error("[E008] Unknown materialization type '{value}'. Valid types: view, table, incremental")]
    UnknownMaterialization { value: String },

    /// E009: Dot-path lookup hit a missing key
    #[error("[E009] Key '{segment}' not found while resolving '{path}'")]
    KeyNotFound { path: String, segment: String },

    /// E010: Dot-path lookup tried to descend into a non-mapping value
    #[error("[E010] '{segment}' is not a mapping while resolving '{path}'")]
    NotAMapping { path: String, segment: String },

    /// E011: IO error
    #[error("[E011] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E012: IO error with file path context
    #[error("[E012] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E013: YAML parse error
    #[error("[E013] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E014: Project directory missing
    #[error("[E014] Project not found at '{path}'")]
    ProjectNotFound { path: String },

    /// E015: Two model files share a name
    #[error("[E015] Duplicate model name '{name}': {first} and {second}")]
    DuplicateModel {
        name: String,
        first: String,
        second: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
