//! Validate command implementation

use crate::cli::GlobalArgs;
use crate::commands::common::{build_resolver, load_project, print_table, selected_environments};
use anyhow::{Context, Result};
use kl_db::{split_statements, Dialect};

/// Resolve every migration and load its script (decoding and substitution)
/// without opening a database connection.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let encoding = project
        .config
        .script_encoding()
        .context("Invalid script encoding")?;

    for env in selected_environments(&project, global)? {
        let dialect = Dialect::from_url(&env.url)
            .with_context(|| format!("Validation of environment '{}' failed", env.label()))?;
        let migrations = build_resolver(&project, &env)
            .resolve()
            .with_context(|| format!("Validation of environment '{}' failed", env.label()))?;

        let mut rows = Vec::with_capacity(migrations.len());
        for migration in &migrations {
            let script = migration
                .load_script(encoding)
                .with_context(|| format!("Failed to load migration {migration}"))?;
            rows.push(vec![
                migration.version().to_string(),
                migration.name().to_string(),
                split_statements(&script, dialect).len().to_string(),
                migration.source().location(),
            ]);
        }

        println!("Environment: {}", env.label());
        if rows.is_empty() {
            println!("No migrations found\n");
            continue;
        }
        print_table(&["VERSION", "NAME", "STATEMENTS", "SOURCE"], &rows);
        println!("\n{} migration(s) valid\n", rows.len());
    }

    Ok(())
}
