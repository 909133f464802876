//! Progress notifications emitted during a run.

use crate::error::MigrateError;
use kl_core::Migration;
use std::time::Duration;

/// Receives run events. Every method defaults to doing nothing.
pub trait MigrationObserver {
    fn on_ledger_created(&mut self, _table: &str) {}

    fn on_pending(&mut self, _count: usize) {}

    fn on_no_pending(&mut self) {}

    fn on_migration_start(&mut self, _migration: &Migration) {}

    fn on_migration_complete(&mut self, _migration: &Migration, _duration: Duration) {}

    fn on_migration_failed(&mut self, _migration: &Migration, _error: &MigrateError) {}
}

/// Default observer: reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl MigrationObserver for LogObserver {
    fn on_ledger_created(&mut self, table: &str) {
        log::info!("Created ledger table {table}");
    }

    fn on_pending(&mut self, count: usize) {
        log::info!("{count} pending migration(s)");
    }

    fn on_no_pending(&mut self) {
        log::info!("No pending migrations");
    }

    fn on_migration_start(&mut self, migration: &Migration) {
        log::info!("Migrating {} from {}", migration, migration.source().location());
    }

    fn on_migration_complete(&mut self, migration: &Migration, duration: Duration) {
        log::info!("Applied {} in {}ms", migration, duration.as_millis());
    }

    fn on_migration_failed(&mut self, migration: &Migration, error: &MigrateError) {
        log::error!("Migration {} failed: {}", migration, error);
    }
}
