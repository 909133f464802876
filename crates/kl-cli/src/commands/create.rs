//! Create command implementation

use crate::cli::GlobalArgs;
use crate::commands::common::{
    build_manager, load_project, open_environment_session, selected_environments,
};
use anyhow::{Context, Result};

/// Create each selected environment's database (file-backed backends create
/// it on open) and its ledger table.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;

    for env in selected_environments(&project, global)? {
        let mut session = open_environment_session(&project, &env)?;
        let mut manager = build_manager(&project, &env)?;
        let created = manager
            .create_ledger(session.as_mut())
            .with_context(|| format!("Failed to create ledger for environment '{}'", env.label()))?;

        if !created {
            println!(
                "{}: ledger table {} already exists",
                env.label(),
                project.config.ledger_table
            );
        }
    }

    Ok(())
}
