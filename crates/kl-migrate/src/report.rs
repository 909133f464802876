//! The outcome of one `migrate` run.

use crate::error::{MigrateError, MigrateResult};
use kl_core::Version;
use std::time::Duration;

/// A migration committed during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: Version,
    pub name: String,
    pub duration: Duration,
}

/// How the run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing was pending
    NoOp,
    /// Every pending migration was applied
    Completed,
    /// A migration failed; it and everything after it were left unapplied
    Aborted {
        version: Version,
        name: String,
        error: MigrateError,
    },
}

/// Aggregated per-migration results.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Committed migrations, in application order
    pub applied: Vec<AppliedMigration>,
}

impl RunReport {
    pub(crate) fn no_op() -> Self {
        Self {
            outcome: RunOutcome::NoOp,
            applied: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, RunOutcome::Aborted { .. })
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Failure cause, when aborted.
    pub fn error(&self) -> Option<&MigrateError> {
        match &self.outcome {
            RunOutcome::Aborted { error, .. } => Some(error),
            _ => None,
        }
    }

    /// One-line description for console output.
    pub fn summary(&self) -> String {
        let applied = match self.applied.len() {
            1 => "1 migration applied".to_string(),
            n => format!("{n} migrations applied"),
        };
        match &self.outcome {
            RunOutcome::NoOp => "No pending migrations".to_string(),
            RunOutcome::Completed => applied,
            RunOutcome::Aborted { version, name, .. } => {
                format!("Aborted at {version} ({name}); {applied}")
            }
        }
    }

    /// The applied list, or the failing migration's error.
    pub fn into_result(self) -> MigrateResult<Vec<AppliedMigration>> {
        match self.outcome {
            RunOutcome::Aborted { error, .. } => Err(error),
            RunOutcome::NoOp | RunOutcome::Completed => Ok(self.applied),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kl_db::DbError;

    fn applied(token: &str, name: &str) -> AppliedMigration {
        AppliedMigration {
            version: Version::parse(token).unwrap(),
            name: name.to_string(),
            duration: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(RunReport::no_op().summary(), "No pending migrations");

        let report = RunReport {
            outcome: RunOutcome::Completed,
            applied: vec![applied("001", "create_books"), applied("002", "seed_books")],
        };
        assert_eq!(report.summary(), "2 migrations applied");
        assert!(report.is_success());
        assert!(report.error().is_none());
    }

    #[test]
    fn test_aborted_into_result() {
        let report = RunReport {
            outcome: RunOutcome::Aborted {
                version: Version::parse("002").unwrap(),
                name: "bad".to_string(),
                error: MigrateError::Apply {
                    version: "002".to_string(),
                    name: "bad".to_string(),
                    source: DbError::ExecutionError("syntax error".to_string()),
                },
            },
            applied: vec![applied("001", "ok")],
        };
        assert!(!report.is_success());
        assert_eq!(report.summary(), "Aborted at 002 (bad); 1 migration applied");

        let err = report.into_result().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("[M005]"));
        assert!(message.contains("002 (bad)"));
        assert!(message.contains("syntax error"));
    }

    #[test]
    fn test_no_op_into_result_is_empty() {
        assert!(RunReport::no_op().into_result().unwrap().is_empty());
    }
}
