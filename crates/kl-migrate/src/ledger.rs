//! The ledger table recording which versions have been applied.
//!
//! One row per applied migration: `version` (primary key, the raw token),
//! `applied_at`, and `duration` in milliseconds. Rows are only ever appended.

use chrono::NaiveDateTime;
use kl_core::Version;
use kl_db::sql_utils::{escape_sql_string, is_valid_table_name, split_schema};
use kl_db::{extract_database_name, DbError, DbResult, Dialect, Session};
use std::collections::HashSet;

/// Default ledger table name.
pub const DEFAULT_LEDGER_TABLE: &str = "schema_version";

/// Formats accepted when reading `applied_at` back as text.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    /// Version token exactly as written
    pub version: String,
    /// `None` when the stored value is not in a recognised format
    pub applied_at: Option<NaiveDateTime>,
    /// Milliseconds; `None` when unreadable
    pub duration_ms: Option<i64>,
}

/// Versions present in the ledger.
#[derive(Debug, Clone, Default)]
pub struct AppliedVersions {
    ordered: Vec<String>,
    set: HashSet<Version>,
}

impl AppliedVersions {
    /// Whether `version` has been applied (`001` matches a stored `1`).
    pub fn contains(&self, version: &Version) -> bool {
        self.set.contains(version)
    }

    /// Every stored token, in version order; unparseable values last.
    pub fn raw(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Ledger access for one run, bound to a dialect and table.
#[derive(Debug, Clone)]
pub struct VersionStrategy {
    dialect: Dialect,
    table: String,
    database: Option<String>,
}

impl VersionStrategy {
    pub fn new(dialect: Dialect, table: impl Into<String>) -> DbResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(DbError::InvalidLedgerTable {
                table,
                reason: "expected `name` or `schema.name` made of letters, digits and `_`"
                    .to_string(),
            });
        }
        if dialect == Dialect::Sqlite && split_schema(&table).0.is_some() {
            return Err(DbError::InvalidLedgerTable {
                table,
                reason: "SQLite ledger tables cannot be schema-qualified".to_string(),
            });
        }
        Ok(Self {
            dialect,
            table,
            database: None,
        })
    }

    /// Scope catalog probes to the database named in `session`'s URL.
    pub fn for_session(
        dialect: Dialect,
        table: impl Into<String>,
        session: &dyn Session,
    ) -> DbResult<Self> {
        let mut strategy = Self::new(dialect, table)?;
        strategy.database = extract_database_name(session.url());
        Ok(strategy)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Whether the ledger table exists. Only probe failures are errors.
    pub fn ledger_exists(&self, session: &mut dyn Session) -> DbResult<bool> {
        let sql = self
            .dialect
            .ledger_exists_sql(&self.table, self.database.as_deref());
        Ok(session.query_count(&sql)? > 0)
    }

    /// Create the ledger table if absent. Returns `true` when it was created.
    pub fn ensure_ledger(&self, session: &mut dyn Session) -> DbResult<bool> {
        if self.ledger_exists(session)? {
            log::debug!("Ledger table {} exists", self.table);
            return Ok(false);
        }

        if let (Some(schema), _) = split_schema(&self.table) {
            if matches!(self.dialect, Dialect::DuckDb | Dialect::Postgres | Dialect::H2) {
                session.execute(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))?;
            }
        }

        log::info!("Creating ledger table {} ({})", self.table, self.dialect);
        session.execute(&self.dialect.ledger_ddl(&self.table))?;
        Ok(true)
    }

    /// Versions recorded in the ledger.
    ///
    /// Values that are not valid version tokens are kept in the raw list and
    /// logged, but never match a migration.
    pub fn applied_versions(&self, session: &mut dyn Session) -> DbResult<AppliedVersions> {
        let sql = format!(
            "SELECT {} FROM {}",
            self.dialect.text_cast("version"),
            self.table
        );
        let rows = session.query_text(&sql, 1)?;

        let mut parsed = Vec::with_capacity(rows.len());
        let mut unparsed = Vec::new();
        for raw in rows.into_iter().filter_map(|row| row.into_iter().next().flatten()) {
            match Version::parse(raw.trim()) {
                Some(version) => parsed.push((version, raw)),
                None => {
                    log::warn!(
                        "Ignoring unrecognised version '{}' in ledger table {}",
                        raw,
                        self.table
                    );
                    unparsed.push(raw);
                }
            }
        }
        parsed.sort_by(|a, b| a.0.cmp(&b.0));

        let set = parsed.iter().map(|(v, _)| v.clone()).collect();
        let ordered = parsed.into_iter().map(|(_, raw)| raw).chain(unparsed).collect();
        Ok(AppliedVersions { ordered, set })
    }

    /// All ledger rows, ordered by version.
    pub fn records(&self, session: &mut dyn Session) -> DbResult<Vec<LedgerRecord>> {
        let sql = format!(
            "SELECT {}, {}, {} FROM {}",
            self.dialect.text_cast("version"),
            self.dialect.text_cast("applied_at"),
            self.dialect.text_cast("duration"),
            self.table
        );
        let mut records: Vec<LedgerRecord> = session
            .query_text(&sql, 3)?
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let version = cols.next().flatten()?;
                let applied_at = cols.next().flatten().and_then(|s| parse_timestamp(&s));
                let duration_ms = cols.next().flatten().and_then(|s| s.trim().parse().ok());
                Some(LedgerRecord {
                    version,
                    applied_at,
                    duration_ms,
                })
            })
            .collect();

        records.sort_by(|a, b| {
            match (Version::parse(&a.version), Version::parse(&b.version)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.version.cmp(&b.version),
            }
        });
        Ok(records)
    }

    /// Append one row. Runs inside the migration's transaction.
    pub fn record_applied(
        &self,
        session: &mut dyn Session,
        version: &Version,
        applied_at: NaiveDateTime,
        duration_ms: i64,
    ) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (version, applied_at, duration) VALUES ('{}', {}, {})",
            self.table,
            escape_sql_string(version.as_str()),
            self.dialect.timestamp_literal(&applied_at),
            duration_ms
        );
        session.execute(&sql)
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let value = value
        .strip_suffix("+0000")
        .or_else(|| value.strip_suffix('Z'))
        .unwrap_or(value);
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
