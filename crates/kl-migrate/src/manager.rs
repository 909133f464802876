//! Orchestrates a migration run.
//!
//! Resolution happens first and touches nothing. Only then is the session
//! classified, the ledger ensured, and the pending set applied one migration
//! per transaction, stopping at the first failure.

use crate::apply::ApplyMigration;
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{LedgerRecord, VersionStrategy, DEFAULT_LEDGER_TABLE};
use crate::observer::{LogObserver, MigrationObserver};
use crate::report::{AppliedMigration, RunOutcome, RunReport};
use chrono::Utc;
use kl_core::{Migration, MigrationResolver, ScriptEncoding, Version};
use kl_db::{DbError, Dialect, Session};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Settings for a run.
#[derive(Debug, Clone)]
pub struct MigratorOptions {
    /// Encoding migration scripts are decoded with
    pub encoding: ScriptEncoding,
    /// Ledger table name, optionally schema-qualified
    pub ledger_table: String,
    /// Migrate backends without transactions, accepting partial effects
    pub allow_non_transactional: bool,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            encoding: ScriptEncoding::default(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            allow_non_transactional: false,
        }
    }
}

/// Where the last run got to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    LedgerEnsured,
    Pending { applied: usize, total: usize },
    Completed,
    Aborted { version: Version },
    NoOp,
}

/// Applied ledger rows and migrations still to run.
#[derive(Debug)]
pub struct MigrationStatus {
    pub applied: Vec<LedgerRecord>,
    pub pending: Vec<Migration>,
    /// Name of every resolved migration, by version
    pub names: HashMap<Version, String>,
}

/// Applies resolved migrations to a session and records them in the ledger.
pub struct MigrationManager {
    resolver: MigrationResolver,
    options: MigratorOptions,
    observer: Box<dyn MigrationObserver>,
    state: RunState,
}

impl MigrationManager {
    pub fn new(resolver: MigrationResolver, options: MigratorOptions) -> Self {
        Self {
            resolver,
            options,
            observer: Box::new(LogObserver),
            state: RunState::NotStarted,
        }
    }

    /// Replace the default [`LogObserver`].
    pub fn with_observer(mut self, observer: Box<dyn MigrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &MigratorOptions {
        &self.options
    }

    pub fn resolver(&self) -> &MigrationResolver {
        &self.resolver
    }

    /// State reached by the most recent `migrate` call.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Apply every pending migration in version order.
    ///
    /// Errors before the first migration starts (resolution, dialect,
    /// transaction policy, ledger access) are returned as `Err`. A failing
    /// migration is reported through [`RunOutcome::Aborted`]; migrations
    /// committed before it stay applied.
    pub fn migrate(&mut self, session: &mut dyn Session) -> MigrateResult<RunReport> {
        self.state = RunState::NotStarted;

        let migrations = self.resolver.resolve()?;

        let dialect = resolve_dialect(session)?;
        let transactional = self.check_transaction_policy(dialect)?;

        let strategy = self.strategy(dialect, session)?;
        self.ensure_ledger(&strategy, session)?;
        self.state = RunState::LedgerEnsured;

        let applied = strategy
            .applied_versions(session)
            .map_err(|source| ledger_error(&strategy, source))?;
        let pending: Vec<Migration> = migrations
            .into_iter()
            .filter(|m| !applied.contains(m.version()))
            .collect();

        if pending.is_empty() {
            self.observer.on_no_pending();
            self.state = RunState::NoOp;
            return Ok(RunReport::no_op());
        }

        let total = pending.len();
        self.observer.on_pending(total);
        self.state = RunState::Pending { applied: 0, total };

        let mut report = RunReport {
            outcome: RunOutcome::Completed,
            applied: Vec::with_capacity(total),
        };

        for migration in pending {
            self.observer.on_migration_start(&migration);
            match self.apply_one(&migration, &strategy, session, transactional) {
                Ok(duration) => {
                    self.observer.on_migration_complete(&migration, duration);
                    report.applied.push(AppliedMigration {
                        version: migration.version().clone(),
                        name: migration.name().to_string(),
                        duration,
                    });
                    self.state = RunState::Pending {
                        applied: report.applied.len(),
                        total,
                    };
                }
                Err(error) => {
                    self.observer.on_migration_failed(&migration, &error);
                    self.state = RunState::Aborted {
                        version: migration.version().clone(),
                    };
                    report.outcome = RunOutcome::Aborted {
                        version: migration.version().clone(),
                        name: migration.name().to_string(),
                        error,
                    };
                    return Ok(report);
                }
            }
        }

        self.state = RunState::Completed;
        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Ledger rows and pending migrations, without applying anything or
    /// creating the ledger.
    pub fn status(&self, session: &mut dyn Session) -> MigrateResult<MigrationStatus> {
        let migrations = self.resolver.resolve()?;
        let names = migrations
            .iter()
            .map(|m| (m.version().clone(), m.name().to_string()))
            .collect();
        let dialect = resolve_dialect(session)?;
        let strategy = self.strategy(dialect, session)?;

        let exists = strategy
            .ledger_exists(session)
            .map_err(|source| ledger_error(&strategy, source))?;
        if !exists {
            return Ok(MigrationStatus {
                applied: Vec::new(),
                pending: migrations,
                names,
            });
        }

        let records = strategy
            .records(session)
            .map_err(|source| ledger_error(&strategy, source))?;
        let applied: HashSet<Version> = records
            .iter()
            .filter_map(|r| Version::parse(r.version.trim()))
            .collect();
        let pending = migrations
            .into_iter()
            .filter(|m| !applied.contains(m.version()))
            .collect();

        Ok(MigrationStatus {
            applied: records,
            pending,
            names,
        })
    }

    /// Migrations that `migrate` would apply.
    pub fn pending_migrations(&self, session: &mut dyn Session) -> MigrateResult<Vec<Migration>> {
        Ok(self.status(session)?.pending)
    }

    /// Ensure the ledger table exists. Returns `true` when it was created.
    pub fn create_ledger(&mut self, session: &mut dyn Session) -> MigrateResult<bool> {
        let dialect = resolve_dialect(session)?;
        let strategy = self.strategy(dialect, session)?;
        self.ensure_ledger(&strategy, session)
    }

    fn strategy(&self, dialect: Dialect, session: &dyn Session) -> MigrateResult<VersionStrategy> {
        VersionStrategy::for_session(dialect, self.options.ledger_table.as_str(), session).map_err(
            |source| MigrateError::Ledger {
                table: self.options.ledger_table.clone(),
                source,
            },
        )
    }

    fn ensure_ledger(
        &mut self,
        strategy: &VersionStrategy,
        session: &mut dyn Session,
    ) -> MigrateResult<bool> {
        let created = strategy
            .ensure_ledger(session)
            .map_err(|source| ledger_error(strategy, source))?;
        if created {
            self.observer.on_ledger_created(strategy.table());
        }
        Ok(created)
    }

    /// Returns whether migrations run inside transactions.
    fn check_transaction_policy(&self, dialect: Dialect) -> MigrateResult<bool> {
        if !dialect.supports_transactions() {
            if !self.options.allow_non_transactional {
                return Err(MigrateError::NonTransactional {
                    dialect: dialect.to_string(),
                });
            }
            log::warn!(
                "{dialect} does not support transactions; a failing migration may leave partial changes behind"
            );
            return Ok(false);
        }
        if !dialect.transactional_ddl() {
            log::warn!("{dialect} commits DDL implicitly; a failing migration may leave partial schema changes behind");
        }
        Ok(true)
    }

    fn apply_one(
        &self,
        migration: &Migration,
        strategy: &VersionStrategy,
        session: &mut dyn Session,
        transactional: bool,
    ) -> MigrateResult<Duration> {
        let apply_error = |source: DbError| MigrateError::Apply {
            version: migration.version().to_string(),
            name: migration.name().to_string(),
            source,
        };

        if transactional {
            session.begin().map_err(apply_error)?;
        }

        let result = self.apply_and_record(migration, strategy, session, transactional);

        if result.is_err() && transactional {
            if let Err(rollback_err) = session.rollback() {
                log::error!("Rollback of {} failed: {}", migration, rollback_err);
            }
        }
        result
    }

    fn apply_and_record(
        &self,
        migration: &Migration,
        strategy: &VersionStrategy,
        session: &mut dyn Session,
        transactional: bool,
    ) -> MigrateResult<Duration> {
        let apply_error = |source: DbError| MigrateError::Apply {
            version: migration.version().to_string(),
            name: migration.name().to_string(),
            source,
        };

        let applied_at = Utc::now().naive_utc();
        let started = Instant::now();
        migration.apply(session, strategy.dialect(), self.options.encoding)?;
        let duration = started.elapsed();

        let duration_ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        strategy
            .record_applied(session, migration.version(), applied_at, duration_ms)
            .map_err(apply_error)?;

        if transactional {
            session.commit().map_err(apply_error)?;
        }
        Ok(duration)
    }
}

fn resolve_dialect(session: &dyn Session) -> MigrateResult<Dialect> {
    let dialect = Dialect::resolve(session).map_err(MigrateError::Dialect)?;
    log::debug!("Session {} resolved to dialect {}", session.url(), dialect);
    Ok(dialect)
}

fn ledger_error(strategy: &VersionStrategy, source: DbError) -> MigrateError {
    MigrateError::Ledger {
        table: strategy.table().to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
