//! Error types for kl-migrate

use kl_core::CoreError;
use kl_db::DbError;
use thiserror::Error;

/// Migration engine errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Script discovery failed; raised before any database access (M001)
    #[error("[M001] Migration resolution failed: {0}")]
    Resolution(#[from] CoreError),

    /// Session could not be classified into a dialect (M002)
    #[error("[M002] Cannot determine database dialect: {0}")]
    Dialect(#[source] DbError),

    /// Backend has no transactions and the run did not opt in (M003)
    #[error(
        "[M003] {dialect} does not support transactions; set allow_non_transactional to migrate it without rollback protection"
    )]
    NonTransactional { dialect: String },

    /// Ledger table probe, creation, or read failed (M004)
    #[error("[M004] Ledger table '{table}' failed: {source}")]
    Ledger {
        table: String,
        #[source]
        source: DbError,
    },

    /// A migration's statements, ledger insert, or commit failed (M005)
    #[error("[M005] Migration {version} ({name}) failed: {source}")]
    Apply {
        version: String,
        name: String,
        #[source]
        source: DbError,
    },

    /// A migration's script could not be read or decoded (M006)
    #[error("[M006] Migration {version} ({name}) could not be loaded: {source}")]
    Script {
        version: String,
        name: String,
        #[source]
        source: CoreError,
    },
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
