//! kl-migrate - Migration engine for Keel
//!
//! Given resolved migrations and a live [`kl_db::Session`], the
//! [`MigrationManager`] ensures the ledger table, computes the pending set,
//! and applies each pending migration in its own transaction, aborting at
//! the first failure.

pub mod apply;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod observer;
pub mod report;

pub use apply::ApplyMigration;
pub use error::{MigrateError, MigrateResult};
pub use ledger::{AppliedVersions, LedgerRecord, VersionStrategy, DEFAULT_LEDGER_TABLE};
pub use manager::{MigrationManager, MigrationStatus, MigratorOptions, RunState};
pub use observer::{LogObserver, MigrationObserver};
pub use report::{AppliedMigration, RunOutcome, RunReport};
