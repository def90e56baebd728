//! Storage adapter trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use std::fmt;

/// A positional query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for QueryParam {
    fn from(b: bool) -> Self {
        QueryParam::Bool(b)
    }
}

impl From<i64> for QueryParam {
    fn from(i: i64) -> Self {
        QueryParam::Integer(i)
    }
}

impl From<f64> for QueryParam {
    fn from(f: f64) -> Self {
        QueryParam::Float(f)
    }
}

impl From<&str> for QueryParam {
    fn from(s: &str) -> Self {
        QueryParam::Text(s.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(s: String) -> Self {
        QueryParam::Text(s)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryParam::Null, Into::into)
    }
}

/// Rows returned by [`StorageAdapter::execute_query`], rendered as strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names in select order
    pub columns: Vec<String>,
    /// One entry per row, one string per column
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    /// Number of rows returned
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// A column as reported by [`StorageAdapter::get_table_schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if !self.nullable {
            f.write_str(" NOT NULL")?;
        }
        Ok(())
    }
}

/// Backing-store capability consumed by the execution engine.
///
/// Implementations must be Send + Sync for async operation. Any
/// transactional behaviour beyond a single statement belongs to the
/// implementation.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Open the connection if it is not already open
    async fn connect(&self) -> DbResult<()>;

    /// Close the connection; later calls fail until `connect` is called
    async fn close(&self) -> DbResult<()>;

    /// Run a query with positional parameters and collect its rows
    async fn execute_query(&self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult>;

    /// Execute one DDL/DML statement, returning affected rows
    async fn execute_ddl(&self, sql: &str) -> DbResult<usize>;

    /// Check if a table or view exists
    async fn table_exists(&self, name: &str) -> DbResult<bool>;

    /// Columns of a table or view, in ordinal order
    async fn get_table_schema(&self, name: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Create table from SELECT statement
    async fn create_table_as(&self, name: &str, select: &str) -> DbResult<()>;

    /// Create view from SELECT statement
    async fn create_view(&self, name: &str, select: &str) -> DbResult<()>;

    /// Start a transaction scoped to the returned handle
    async fn begin_transaction<'a>(&'a self) -> DbResult<Box<dyn Transaction + 'a>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// An open transaction.
///
/// Implementations roll back on drop unless `commit` or `rollback` was
/// called.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Execute a statement inside the transaction
    async fn exec(&self, sql: &str) -> DbResult<usize>;

    /// Commit the transaction
    async fn commit(&mut self) -> DbResult<()>;

    /// Roll the transaction back
    async fn rollback(&mut self) -> DbResult<()>;
}
