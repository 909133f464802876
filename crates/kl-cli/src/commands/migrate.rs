//! Migrate command implementation

use crate::cli::GlobalArgs;
use crate::commands::common::{
    build_manager, load_project, open_environment_session, selected_environments,
};
use anyhow::{Context, Result};

/// Apply pending migrations to every selected environment in turn, stopping
/// at the first environment whose run fails.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;

    for env in selected_environments(&project, global)? {
        println!("Migrating environment '{}'", env.label());

        let mut session = open_environment_session(&project, &env)?;
        let mut manager = build_manager(&project, &env)?;
        let report = manager
            .migrate(session.as_mut())
            .with_context(|| format!("Migration of environment '{}' failed", env.label()))?;

        println!("{}\n", report.summary());
        report
            .into_result()
            .with_context(|| format!("Migration of environment '{}' aborted", env.label()))?;
    }

    Ok(())
}
