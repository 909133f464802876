//! Executing a migration's script against a session.

use crate::error::{MigrateError, MigrateResult};
use kl_core::{Migration, ScriptEncoding};
use kl_db::{split_statements, Dialect, Session};

/// Run a migration's statements, split by `dialect`'s lexical rules.
/// Transaction handling belongs to the caller.
pub trait ApplyMigration {
    fn apply(
        &self,
        session: &mut dyn Session,
        dialect: Dialect,
        encoding: ScriptEncoding,
    ) -> MigrateResult<()>;
}

impl ApplyMigration for Migration {
    fn apply(
        &self,
        session: &mut dyn Session,
        dialect: Dialect,
        encoding: ScriptEncoding,
    ) -> MigrateResult<()> {
        let script = self
            .load_script(encoding)
            .map_err(|source| MigrateError::Script {
                version: self.version().to_string(),
                name: self.name().to_string(),
                source,
            })?;

        let statements = split_statements(&script, dialect);
        if statements.is_empty() {
            log::warn!("Migration {} ({}) contains no statements", self, self.file_name());
        }

        let total = statements.len();
        for (index, statement) in statements.iter().enumerate() {
            log::debug!("{}: statement {}/{}", self, index + 1, total);
            session
                .execute(statement)
                .map_err(|source| MigrateError::Apply {
                    version: self.version().to_string(),
                    name: self.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
