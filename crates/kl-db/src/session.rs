//! The explicit connection handle the engine operates through.

use crate::dialect::Dialect;
use crate::duckdb::DuckDbSession;
use crate::error::{DbError, DbResult};
use crate::sqlite::SqliteSession;

/// A single live database connection supplied by the caller.
///
/// The engine borrows it mutably for the duration of a run and only changes
/// its transaction state. It never pools, clones, or closes it.
pub trait Session {
    /// Connection URL, used to classify the dialect.
    fn url(&self) -> &str;

    /// Backends that cannot be classified by URL identify themselves here.
    fn backend(&self) -> Option<Dialect> {
        None
    }

    /// Execute one statement (or a statement batch the driver accepts),
    /// discarding any result rows.
    fn execute(&mut self, sql: &str) -> DbResult<()>;

    /// Run a query whose first column is an integer and return it.
    fn query_count(&mut self, sql: &str) -> DbResult<i64>;

    /// Run a query and return the first `columns` columns of every row as
    /// text. Callers cast non-text columns in SQL.
    fn query_text(&mut self, sql: &str, columns: usize) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Open a transaction.
    fn begin(&mut self) -> DbResult<()> {
        self.execute("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    /// Commit the open transaction.
    fn commit(&mut self) -> DbResult<()> {
        self.execute("COMMIT")
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    /// Roll back the open transaction.
    fn rollback(&mut self) -> DbResult<()> {
        self.execute("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }
}

/// Open a session with one of the built-in drivers.
///
/// DuckDB (`duckdb:<path>`, `duckdb::memory:`) and SQLite (`sqlite:<path>`,
/// `sqlite::memory:`) are bundled. Other dialects need a caller-provided
/// [`Session`] implementation.
pub fn open_session(url: &str) -> DbResult<Box<dyn Session>> {
    let dialect = Dialect::from_url(url)?;
    match dialect {
        Dialect::DuckDb => Ok(Box::new(DuckDbSession::open_url(url)?)),
        Dialect::Sqlite => Ok(Box::new(SqliteSession::open_url(url)?)),
        other => Err(DbError::NotImplemented {
            backend: other.to_string(),
            feature: "built-in driver (supply a Session implementation)".to_string(),
        }),
    }
}
