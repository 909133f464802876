//! Check command implementation

use crate::cli::GlobalArgs;
use crate::commands::common::{
    build_manager, load_project, open_environment_session, selected_environments, ExitCode,
};
use anyhow::{Context, Result};

/// Report pending migrations; exit with status 1 when any environment has
/// some.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let mut any_pending = false;

    for env in selected_environments(&project, global)? {
        let mut session = open_environment_session(&project, &env)?;
        let manager = build_manager(&project, &env)?;
        let pending = manager
            .pending_migrations(session.as_mut())
            .with_context(|| format!("Failed to read status of environment '{}'", env.label()))?;

        if pending.is_empty() {
            println!("{}: up to date", env.label());
            continue;
        }

        any_pending = true;
        println!("{}: {} pending migration(s)", env.label(), pending.len());
        for migration in &pending {
            println!("  {}", migration.file_name());
        }
    }

    if any_pending {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
