//! DuckDB session

use crate::dialect::{url_remainder, Dialect};
use crate::error::{DbError, DbResult};
use crate::session::Session;
use duckdb::Connection;
use std::path::Path;

/// Session over a bundled DuckDB connection
pub struct DuckDbSession {
    conn: Connection,
    url: String,
}

impl DuckDbSession {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn,
            url: "duckdb::memory:".to_string(),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn,
            url: format!("duckdb:{}", path.display()),
        })
    }

    /// Open from a `duckdb:<path>` URL (`duckdb::memory:` for in-memory)
    pub fn open_url(url: &str) -> DbResult<Self> {
        let target = url_remainder(url);
        let mut session = match target {
            "" | ":memory:" => Self::in_memory()?,
            path => Self::from_path(Path::new(path))?,
        };
        session.url = url.to_string();
        Ok(session)
    }
}

impl Session for DuckDbSession {
    fn url(&self) -> &str {
        &self.url
    }

    fn backend(&self) -> Option<Dialect> {
        Some(Dialect::DuckDb)
    }

    fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn query_count(&mut self, sql: &str) -> DbResult<i64> {
        let count: i64 = self
            .conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        Ok(count)
    }

    fn query_text(&mut self, sql: &str, columns: usize) -> DbResult<Vec<Vec<Option<String>>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            (0..columns)
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<Result<Vec<_>, _>>()
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
