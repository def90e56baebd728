//! qr-run - Compilation and execution engine for Quarry
//!
//! Models flow through three stages: [`compile`] renders their templates
//! and discovers `ref()` dependencies, [`materialize`] turns each model into
//! an ordered list of SQL statements, and [`execute`] runs the batch in
//! dependency order through a [`qr_db::StorageAdapter`].

pub mod compile;
pub mod error;
pub mod execute;
pub mod materialize;
pub mod result;

pub use compile::ModelCompiler;
pub use error::{RunError, RunResult};
pub use execute::{Executor, ModelFailure};
pub use materialize::{strategy_for_tag, Strategy};
pub use result::{ExecutionResult, ExecutionStatus, ModelResult, ModelStatus};
