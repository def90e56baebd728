//! qr-core - Core library for Quarry
//!
//! This crate provides the shared types used across all Quarry components:
//! models and their materialization settings, the tagged [`Value`] used for
//! variables and configuration, project configuration parsing, and the
//! dependency graph with its deterministic topological sort.

pub mod config;
pub mod dag;
pub mod error;
pub mod model;
pub mod model_name;
pub mod node;
pub mod project;
pub mod sql_utils;
pub mod value;

pub use config::{Config, ModelOverride, SourceConfig};
pub use dag::{topological_sort, DependencyGraph, GraphNode};
pub use error::{CoreError, CoreResult};
pub use model::{Materialization, MaterializationConfig, Model};
pub use model_name::ModelName;
pub use node::NodeKind;
pub use project::Project;
pub use value::Value;
