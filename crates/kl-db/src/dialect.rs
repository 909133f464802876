//! Database dialects and the per-dialect SQL used for the ledger table.
//!
//! [`Dialect`] is resolved once per run from a [`Session`] and threaded
//! through the engine. Everything dialect-specific about the ledger lives in
//! the static [`DialectSpec`] table below.

use crate::error::{DbError, DbResult};
use crate::session::Session;
use crate::sql_utils::{escape_sql_string, split_schema};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;

/// Supported database families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    DuckDb,
    Sqlite,
    Postgres,
    MySql,
    H2,
    SqlServer,
    Oracle,
    Cassandra,
}

/// Dialect-specific text and capabilities.
///
/// `{table}` and `{expr}` in the templates are replaced at render time.
#[derive(Debug)]
pub struct DialectSpec {
    /// Identifier used in logs and URLs
    pub name: &'static str,
    /// `CREATE TABLE` for the ledger
    pub ledger_ddl: &'static str,
    /// Expression casting a column to text
    pub text_cast: &'static str,
    /// Literal form of a timestamp value (`{expr}` is the formatted time)
    pub timestamp_literal: &'static str,
    /// Multi-statement transactions are available
    pub supports_transactions: bool,
    /// DDL participates in transactions instead of committing implicitly
    pub transactional_ddl: bool,
}

const DUCKDB: DialectSpec = DialectSpec {
    name: "duckdb",
    ledger_ddl: "CREATE TABLE {table} (version VARCHAR PRIMARY KEY, applied_at TIMESTAMP NOT NULL, duration BIGINT NOT NULL)",
    text_cast: "CAST({expr} AS VARCHAR)",
    timestamp_literal: "TIMESTAMP '{expr}'",
    supports_transactions: true,
    transactional_ddl: true,
};

const SQLITE: DialectSpec = DialectSpec {
    name: "sqlite",
    ledger_ddl: "CREATE TABLE {table} (version TEXT PRIMARY KEY, applied_at TEXT NOT NULL, duration INTEGER NOT NULL)",
    text_cast: "CAST({expr} AS TEXT)",
    timestamp_literal: "'{expr}'",
    supports_transactions: true,
    transactional_ddl: true,
};

const POSTGRES: DialectSpec = DialectSpec {
    name: "postgres",
    ledger_ddl: "CREATE TABLE {table} (version VARCHAR(255) PRIMARY KEY, applied_at TIMESTAMP NOT NULL, duration BIGINT NOT NULL)",
    text_cast: "CAST({expr} AS VARCHAR)",
    timestamp_literal: "TIMESTAMP '{expr}'",
    supports_transactions: true,
    transactional_ddl: true,
};

const MYSQL: DialectSpec = DialectSpec {
    name: "mysql",
    ledger_ddl: "CREATE TABLE {table} (version VARCHAR(255) NOT NULL PRIMARY KEY, applied_at DATETIME(3) NOT NULL, duration BIGINT NOT NULL)",
    text_cast: "CAST({expr} AS CHAR)",
    timestamp_literal: "'{expr}'",
    supports_transactions: true,
    transactional_ddl: false,
};

const H2: DialectSpec = DialectSpec {
    name: "h2",
    ledger_ddl: "CREATE TABLE {table} (version VARCHAR(255) PRIMARY KEY, applied_at TIMESTAMP NOT NULL, duration BIGINT NOT NULL)",
    text_cast: "CAST({expr} AS VARCHAR)",
    timestamp_literal: "TIMESTAMP '{expr}'",
    supports_transactions: true,
    transactional_ddl: true,
};

const SQLSERVER: DialectSpec = DialectSpec {
    name: "sqlserver",
    ledger_ddl: "CREATE TABLE {table} (version VARCHAR(255) NOT NULL PRIMARY KEY, applied_at DATETIME2 NOT NULL, duration BIGINT NOT NULL)",
    text_cast: "CAST({expr} AS VARCHAR(64))",
    timestamp_literal: "'{expr}'",
    supports_transactions: true,
    transactional_ddl: true,
};

const ORACLE: DialectSpec = DialectSpec {
    name: "oracle",
    ledger_ddl: "CREATE TABLE {table} (version VARCHAR2(255) PRIMARY KEY, applied_at TIMESTAMP NOT NULL, duration NUMBER(19) NOT NULL)",
    text_cast: "TO_CHAR({expr})",
    timestamp_literal: "TIMESTAMP '{expr}'",
    supports_transactions: true,
    transactional_ddl: false,
};

const CASSANDRA: DialectSpec = DialectSpec {
    name: "cassandra",
    ledger_ddl: "CREATE TABLE {table} (version text PRIMARY KEY, applied_at timestamp, duration bigint)",
    text_cast: "{expr}",
    timestamp_literal: "'{expr}+0000'",
    supports_transactions: false,
    transactional_ddl: false,
};

/// Timestamp format used in ledger literals (millisecond precision).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

impl Dialect {
    /// All dialects, in declaration order.
    pub const ALL: [Dialect; 8] = [
        Dialect::DuckDb,
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::H2,
        Dialect::SqlServer,
        Dialect::Oracle,
        Dialect::Cassandra,
    ];

    /// Static description of this dialect.
    pub fn spec(&self) -> &'static DialectSpec {
        match self {
            Dialect::DuckDb => &DUCKDB,
            Dialect::Sqlite => &SQLITE,
            Dialect::Postgres => &POSTGRES,
            Dialect::MySql => &MYSQL,
            Dialect::H2 => &H2,
            Dialect::SqlServer => &SQLSERVER,
            Dialect::Oracle => &ORACLE,
            Dialect::Cassandra => &CASSANDRA,
        }
    }

    /// Classify a connection URL. A leading `jdbc:` is ignored.
    pub fn from_url(url: &str) -> DbResult<Self> {
        let scheme = url_scheme(url).to_ascii_lowercase();
        let dialect = match scheme.as_str() {
            "duckdb" => Dialect::DuckDb,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::MySql,
            "h2" => Dialect::H2,
            "sqlserver" | "mssql" => Dialect::SqlServer,
            "oracle" => Dialect::Oracle,
            "cassandra" => Dialect::Cassandra,
            _ => {
                return Err(DbError::UnknownDialect {
                    url: url.to_string(),
                })
            }
        };
        Ok(dialect)
    }

    /// Classify an active session: its own backend hook first, then its URL.
    pub fn resolve(session: &dyn Session) -> DbResult<Self> {
        match session.backend() {
            Some(dialect) => Ok(dialect),
            None => Self::from_url(session.url()),
        }
    }

    pub fn supports_transactions(&self) -> bool {
        self.spec().supports_transactions
    }

    pub fn transactional_ddl(&self) -> bool {
        self.spec().transactional_ddl
    }

    /// `CREATE TABLE` statement for the ledger.
    pub fn ledger_ddl(&self, table: &str) -> String {
        self.spec().ledger_ddl.replace("{table}", table)
    }

    /// Cast `expr` to a text value.
    pub fn text_cast(&self, expr: &str) -> String {
        self.spec().text_cast.replace("{expr}", expr)
    }

    /// Render a timestamp literal.
    pub fn timestamp_literal(&self, ts: &NaiveDateTime) -> String {
        self.spec()
            .timestamp_literal
            .replace("{expr}", &ts.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Query returning a single count that is non-zero when `table` exists.
    ///
    /// `database` is the database (or keyspace) name taken from the URL; it
    /// scopes the probe on backends whose catalogs span databases.
    pub fn ledger_exists_sql(&self, table: &str, database: Option<&str>) -> String {
        let (schema, name) = split_schema(table);
        let name_lit = escape_sql_string(name);
        let schema_lit = schema.map(escape_sql_string);
        match self {
            Dialect::DuckDb => format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
                schema_lit.as_deref().unwrap_or("main"),
                name_lit
            ),
            Dialect::Sqlite => match schema {
                Some(schema) => format!(
                    "SELECT COUNT(*) FROM {schema}.sqlite_master WHERE type = 'table' AND name = '{name_lit}'"
                ),
                None => format!(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{name_lit}'"
                ),
            },
            Dialect::Postgres => format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = {} AND table_name = '{}'",
                schema_lit
                    .map(|s| format!("'{}'", s.to_lowercase()))
                    .unwrap_or_else(|| "current_schema()".to_string()),
                name_lit.to_lowercase()
            ),
            Dialect::MySql => format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = {} AND table_name = '{}'",
                schema_lit
                    .or_else(|| database.map(escape_sql_string))
                    .map(|s| format!("'{s}'"))
                    .unwrap_or_else(|| "DATABASE()".to_string()),
                name_lit
            ),
            Dialect::H2 => match schema_lit {
                Some(schema) => format!(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE UPPER(table_schema) = UPPER('{schema}') AND UPPER(table_name) = UPPER('{name_lit}')"
                ),
                None => format!(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE UPPER(table_name) = UPPER('{name_lit}')"
                ),
            },
            Dialect::SqlServer => match schema_lit {
                Some(schema) => format!(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{schema}' AND table_name = '{name_lit}'"
                ),
                None => format!(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = '{name_lit}'"
                ),
            },
            Dialect::Oracle => match schema_lit {
                Some(owner) => format!(
                    "SELECT COUNT(*) FROM all_tables WHERE owner = UPPER('{owner}') AND table_name = UPPER('{name_lit}')"
                ),
                None => format!(
                    "SELECT COUNT(*) FROM user_tables WHERE table_name = UPPER('{name_lit}')"
                ),
            },
            Dialect::Cassandra => format!(
                "SELECT COUNT(*) FROM system_schema.tables WHERE keyspace_name = '{}' AND table_name = '{}'",
                schema_lit
                    .or_else(|| database.map(escape_sql_string))
                    .unwrap_or_default(),
                name_lit.to_lowercase()
            ),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

/// Scheme of a URL with any `jdbc:` prefix removed (`postgres` for
/// `jdbc:postgres://host/db`).
fn url_scheme(url: &str) -> &str {
    strip_jdbc(url).split(':').next().unwrap_or("")
}

fn strip_jdbc(url: &str) -> &str {
    let trimmed = url.trim();
    match trimmed.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("jdbc:") => &trimmed[5..],
        _ => trimmed,
    }
}

/// Part of the URL after `<scheme>:`.
pub(crate) fn url_remainder(url: &str) -> &str {
    let stripped = strip_jdbc(url);
    match stripped.split_once(':') {
        Some((_, rest)) => rest,
        None => "",
    }
}

/// Database name encoded in a connection URL.
///
/// Network URLs yield the last path segment without query (`?`) or property
/// (`;`) suffixes, e.g. `mydb` for `mysql://host:3306/mydb?ssl=true`.
/// File URLs yield the file stem. In-memory URLs yield `None`.
pub fn extract_database_name(url: &str) -> Option<String> {
    let rest = url_remainder(url);
    let rest = rest.split(['?', ';']).next().unwrap_or("");

    if let Some(authority_and_path) = rest.strip_prefix("//") {
        let (_, path) = authority_and_path.split_once('/')?;
        let name = path.rsplit('/').next().unwrap_or("");
        return (!name.is_empty()).then(|| name.to_string());
    }

    let segment = rest.rsplit('/').next().unwrap_or("");
    let segment = segment.rsplit(':').next().unwrap_or("");
    if segment.is_empty() || segment.eq_ignore_ascii_case("memory") {
        return None;
    }
    let name = Path::new(segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(segment);
    Some(name.to_string())
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
