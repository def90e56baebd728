//! qr-db - Storage adapter layer for Quarry
//!
//! This crate provides the `StorageAdapter` and `Transaction` traits the
//! execution engine runs statements through, and a DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use crate::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{ColumnInfo, QueryParam, QueryResult, StorageAdapter, Transaction};
