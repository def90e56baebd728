//! qr-jinja - Jinja templating layer for Quarry
//!
//! Model templates are rendered with a fixed set of functions: `ref()`,
//! `source()`, `seed()`, `var()`, `config()`, `env_var()`,
//! `is_incremental()` and `this()`. Each render binds those functions to a
//! fresh [`RenderContext`]; `ref()` can additionally report cross-model
//! references to a [`DependencyCollector`].

pub mod context;
pub mod environment;
pub mod error;
pub mod functions;
pub mod tracker;

pub use context::RenderContext;
pub use environment::{Delimiters, ParsedTemplate, TemplateRenderer};
pub use error::{JinjaError, JinjaResult};
pub use functions::FUNCTION_NAMES;
pub use tracker::{DependencyCollector, DependencyTracker};
