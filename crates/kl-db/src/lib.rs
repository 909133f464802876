//! kl-db - Database layer for Keel
//!
//! This crate provides the `Session` trait the migration engine runs
//! through, dialect classification and ledger DDL for every supported
//! backend, bundled DuckDB and SQLite sessions, and the statement splitter
//! used to execute migration scripts.

pub mod dialect;
pub mod duckdb;
pub mod error;
pub mod script;
pub mod session;
pub mod sql_utils;
pub mod sqlite;

pub use dialect::{extract_database_name, Dialect, DialectSpec};
pub use duckdb::DuckDbSession;
pub use error::{DbError, DbResult};
pub use script::split_statements;
pub use session::{open_session, Session};
pub use sqlite::SqliteSession;
