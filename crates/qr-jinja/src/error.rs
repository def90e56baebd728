//! Error types for qr-jinja

use thiserror::Error;

/// Jinja templating errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JinjaError {
    /// Template failed to parse (J001)
    #[error("[J001] Template syntax error in '{name}': {message}")]
    TemplateSyntax { name: String, message: String },

    /// Template render error (J002)
    #[error("[J002] Jinja render error: {0}")]
    RenderError(String),

    /// var() lookup failed (J003)
    #[error("[J003] Variable '{name}' not found. Define it in the vars: section of quarry.yml")]
    VariableNotFound { name: String },

    /// config() lookup failed (J004)
    #[error("[J004] Config key '{key}' not found: {reason}")]
    ConfigKeyNotFound { key: String, reason: String },

    /// source() named a configured source without that table (J005)
    #[error("[J005] Table '{table}' not found in source '{source_name}'")]
    SourceTableNotFound { source_name: String, table: String },

    /// seed() named an unknown seed (J006)
    #[error("[J006] Seed '{name}' not found")]
    SeedNotFound { name: String },

    /// seed() called with an empty name (J007)
    #[error("[J007] Seed name cannot be empty")]
    EmptySeedName,

    /// env_var() found neither a value nor a default (J008)
    #[error("[J008] Environment variable '{key}' not set and no default provided")]
    EnvVarNotSet { key: String },

    /// this() used without a current table name (J009)
    #[error("[J009] this() is not available: the current model's table name is not set")]
    ThisNotSet,

    /// A template function was called with the wrong arguments (J010)
    #[error("[J010] Invalid arguments to {function}(): {message}")]
    InvalidArguments { function: String, message: String },

    /// Custom delimiters were rejected (J011)
    #[error("[J011] Invalid template delimiters: {0}")]
    InvalidDelimiters(String),
}

/// Result type alias for JinjaError
pub type JinjaResult<T> = Result<T, JinjaError>;

impl From<minijinja::Error> for JinjaError {
    /// Recover the typed error raised by one of our template functions, or
    /// fall back to the rendered minijinja message.
    fn from(err: minijinja::Error) -> Self {
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            if let Some(ours) = cause.downcast_ref::<JinjaError>() {
                return ours.clone();
            }
            source = cause.source();
        }
        JinjaError::RenderError(err.to_string())
    }
}
