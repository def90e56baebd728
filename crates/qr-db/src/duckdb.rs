//! DuckDB storage adapter implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ColumnInfo, QueryParam, QueryResult, StorageAdapter, Transaction};
use async_trait::async_trait;
use duckdb::types::{ToSqlOutput, Value as DuckValue};
use duckdb::{Connection, ToSql};
use qr_core::sql_utils::{quote_qualified, split_qualified_name};
use std::path::Path;
use std::sync::Mutex;

/// Path that selects an in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// DuckDB storage backend.
///
/// The connection is opened on construction. `close` drops it and
/// `connect` reopens the same path; an in-memory database starts empty
/// again after a reopen.
pub struct DuckDbBackend {
    path: String,
    conn: Mutex<Option<Connection>>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        Self::new(IN_MEMORY)
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        let conn = Self::open(path)?;
        Ok(Self {
            path: path.to_string(),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        Self::new(&path.to_string_lossy())
    }

    /// Database path this backend opens
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn open(path: &str) -> DbResult<Connection> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(Path::new(path))
        };
        conn.map_err(|e| DbError::ConnectionError(e.to_string()))
    }

    /// Run `f` against the open connection
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        let conn = guard.as_ref().ok_or(DbError::ConnectionClosed)?;
        f(conn)
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        log::debug!("Executing SQL: {}", sql);
        self.with_conn(|conn| Ok(conn.execute(sql, [])?))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch(sql)
                .map_err(|e| DbError::TransactionError(e.to_string()))
        })
    }

    /// Execute a prepared query and collect all results as strings.
    ///
    /// DuckDB panics on `stmt.column_count()` before execution, so rows are
    /// collected first and column metadata read afterwards.
    fn query_sync(&self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows: Vec<Vec<String>> = stmt
                .query_map(duckdb::params_from_iter(params.iter()), |row| {
                    let col_count = row.as_ref().column_count();
                    Ok((0..col_count)
                        .map(|i| get_column_as_string(row, i))
                        .collect())
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let columns = (0..stmt.column_count())
                .map(|i| {
                    stmt.column_name(i)
                        .map_or("?".to_string(), |v| v.to_string())
                })
                .collect();

            Ok(QueryResult { columns, rows })
        })
    }

    fn table_exists_sync(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(name);
        let schema = schema.unwrap_or("main");

        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
                duckdb::params![schema, table],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    fn table_schema_sync(&self, name: &str) -> DbResult<Vec<ColumnInfo>> {
        let (schema, table) = split_qualified_name(name);
        let result = self.query_sync(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
            &[
                QueryParam::from(schema.unwrap_or("main")),
                QueryParam::from(table),
            ],
        )?;

        if result.is_empty() {
            return Err(DbError::TableNotFound(name.to_string()));
        }

        Ok(result
            .rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                let name = cells.next().unwrap_or_default();
                let data_type = cells.next().unwrap_or_default();
                let nullable = cells.next().is_some_and(|v| v.eq_ignore_ascii_case("YES"));
                ColumnInfo {
                    name,
                    data_type,
                    nullable,
                }
            })
            .collect())
    }
}

/// Read a column as a string, trying the common DuckDB types in turn
fn get_column_as_string(row: &duckdb::Row<'_>, idx: usize) -> String {
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return s;
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return n.to_string();
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return f.to_string();
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return b.to_string();
    }
    "null".to_string()
}

impl ToSql for QueryParam {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(match self {
            QueryParam::Null => DuckValue::Null,
            QueryParam::Bool(b) => DuckValue::Boolean(*b),
            QueryParam::Integer(i) => DuckValue::BigInt(*i),
            QueryParam::Float(f) => DuckValue::Double(*f),
            QueryParam::Text(s) => DuckValue::Text(s.clone()),
        }))
    }
}

#[async_trait]
impl StorageAdapter for DuckDbBackend {
    async fn connect(&self) -> DbResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if guard.is_none() {
            log::debug!("Reopening DuckDB connection to {}", self.path);
            *guard = Some(Self::open(&self.path)?);
        }
        Ok(())
    }

    async fn close(&self) -> DbResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        if let Some(conn) = guard.take() {
            conn.close()
                .map_err(|(_, e)| DbError::ConnectionError(e.to_string()))?;
        }
        Ok(())
    }

    async fn execute_query(&self, sql: &str, params: &[QueryParam]) -> DbResult<QueryResult> {
        self.query_sync(sql, params)
    }

    async fn execute_ddl(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn table_exists(&self, name: &str) -> DbResult<bool> {
        self.table_exists_sync(name)
    }

    async fn get_table_schema(&self, name: &str) -> DbResult<Vec<ColumnInfo>> {
        self.table_schema_sync(name)
    }

    async fn create_table_as(&self, name: &str, select: &str) -> DbResult<()> {
        let sql = format!("CREATE TABLE {} AS {}", quote_qualified(name), select);
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn create_view(&self, name: &str, select: &str) -> DbResult<()> {
        let sql = format!("CREATE VIEW {} AS {}", quote_qualified(name), select);
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn begin_transaction<'a>(&'a self) -> DbResult<Box<dyn Transaction + 'a>> {
        self.execute_batch_sync("BEGIN TRANSACTION")?;
        Ok(Box::new(DuckDbTransaction {
            backend: self,
            finished: false,
        }))
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Transaction on a [`DuckDbBackend`] connection
struct DuckDbTransaction<'a> {
    backend: &'a DuckDbBackend,
    finished: bool,
}

impl DuckDbTransaction<'_> {
    fn finish(&mut self, statement: &str) -> DbResult<()> {
        if self.finished {
            return Err(DbError::TransactionError(
                "transaction already finished".to_string(),
            ));
        }
        self.finished = true;
        self.backend.execute_batch_sync(statement)
    }
}

#[async_trait]
impl<'a> Transaction for DuckDbTransaction<'a> {
    async fn exec(&self, sql: &str) -> DbResult<usize> {
        if self.finished {
            return Err(DbError::TransactionError(
                "transaction already finished".to_string(),
            ));
        }
        self.backend.execute_sync(sql)
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.finish("COMMIT")
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for DuckDbTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("Transaction dropped without commit, rolling back");
            if let Err(e) = self.backend.execute_batch_sync("ROLLBACK") {
                log::warn!("Rollback on drop failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
