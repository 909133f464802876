//! SQLite session

use crate::dialect::{url_remainder, Dialect};
use crate::error::{DbError, DbResult};
use crate::session::Session;
use rusqlite::Connection;
use std::path::Path;

/// Session over a bundled SQLite connection
pub struct SqliteSession {
    conn: Connection,
    url: String,
}

impl SqliteSession {
    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DbError::ConnectionError(format!("failed to open in-memory database: {e}")))?;
        Ok(Self {
            conn,
            url: "sqlite::memory:".to_string(),
        })
    }

    pub fn from_path(path: &Path) -> DbResult<Self> {
        log::debug!("Opening SQLite database at {}", path.display());
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {e}", path.display())))?;
        Ok(Self {
            conn,
            url: format!("sqlite:{}", path.display()),
        })
    }

    /// Open from a `sqlite:<path>` URL (`sqlite::memory:` for in-memory)
    pub fn open_url(url: &str) -> DbResult<Self> {
        let mut session = match url_remainder(url) {
            "" | ":memory:" => Self::in_memory()?,
            path => Self::from_path(Path::new(path))?,
        };
        session.url = url.to_string();
        Ok(session)
    }
}

impl Session for SqliteSession {
    fn url(&self) -> &str {
        &self.url
    }

    fn backend(&self) -> Option<Dialect> {
        Some(Dialect::Sqlite)
    }

    fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn query_count(&mut self, sql: &str) -> DbResult<i64> {
        self.conn
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn query_text(&mut self, sql: &str, columns: usize) -> DbResult<Vec<Vec<Option<String>>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                (0..columns)
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
