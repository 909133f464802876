//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use kl_core::{Config, Environment, Migration, MigrationResolver, ScriptRoot};
use kl_db::{open_session, Session};
use kl_migrate::{MigrateError, MigrationManager, MigrationObserver, MigratorOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main maps it to the process status silently.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its root directory and parsed configuration.
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

/// Load the project from the directory (and optional config file) given in
/// the global CLI arguments.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project configuration")?;
    Ok(Project { root, config })
}

/// Environments selected by `--env` (or `KEEL_ENV`).
pub(crate) fn selected_environments(
    project: &Project,
    global: &GlobalArgs,
) -> Result<Vec<Environment>> {
    project
        .config
        .resolve_environments(global.env.as_deref())
        .context("Failed to resolve environments")
}

/// Resolver over the project's script roots, with the environment's
/// substitution map attached.
pub(crate) fn build_resolver(project: &Project, env: &Environment) -> MigrationResolver {
    let roots = project
        .config
        .script_roots_absolute(&project.root)
        .into_iter()
        .map(ScriptRoot::Directory)
        .collect();
    MigrationResolver::new(roots, project.config.migrations_path.clone())
        .with_substitutions(env.substitutions.clone())
}

/// Migration manager for one environment, reporting progress to stdout.
pub(crate) fn build_manager(project: &Project, env: &Environment) -> Result<MigrationManager> {
    let options = MigratorOptions {
        encoding: project
            .config
            .script_encoding()
            .context("Invalid script encoding")?,
        ledger_table: project.config.ledger_table.clone(),
        allow_non_transactional: env.allow_non_transactional,
    };
    Ok(MigrationManager::new(build_resolver(project, env), options)
        .with_observer(Box::new(PrintingObserver)))
}

/// Open a session for `env`, resolving relative database file paths
/// against the project root. Missing parent directories of a database file
/// are created.
pub(crate) fn open_environment_session(
    project: &Project,
    env: &Environment,
) -> Result<Box<dyn Session>> {
    let url = resolve_url(&project.root, &env.url);
    if let Some(parent) = database_file(&url).and_then(|path| Path::new(path).parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }
    log::debug!("Opening session for environment '{}': {}", env.label(), url);
    open_session(&url).with_context(|| format!("Failed to connect to environment '{}'", env.label()))
}

/// Schemes whose URL remainder is a local database file.
const FILE_SCHEMES: &[&str] = &["duckdb", "sqlite", "sqlite3"];

/// Database file named by a file-backed URL, as written.
/// `None` for in-memory and network URLs.
pub(crate) fn database_file(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once(':')?;
    if !FILE_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return None;
    }
    match rest {
        "" | ":memory:" => None,
        path => Some(path),
    }
}

/// Rewrite a relative database file path to sit under `root`.
pub(crate) fn resolve_url(root: &Path, url: &str) -> String {
    match database_file(url) {
        Some(path) if Path::new(path).is_relative() => {
            let scheme = url.split_once(':').map(|(s, _)| s).unwrap_or_default();
            format!("{}:{}", scheme, root.join(path).display())
        }
        _ => url.to_string(),
    }
}

/// Observer printing progress the way the CLI reports it.
pub(crate) struct PrintingObserver;

impl MigrationObserver for PrintingObserver {
    fn on_ledger_created(&mut self, table: &str) {
        println!("Created ledger table {table}");
    }

    fn on_pending(&mut self, count: usize) {
        println!("{count} pending migration(s)");
    }

    fn on_no_pending(&mut self) {
        println!("No pending migrations");
    }

    fn on_migration_start(&mut self, migration: &Migration) {
        println!("  Migrating {} ...", migration.file_name());
    }

    fn on_migration_complete(&mut self, migration: &Migration, duration: Duration) {
        println!("  ✓ {} ({}ms)", migration, duration.as_millis());
    }

    fn on_migration_failed(&mut self, migration: &Migration, error: &MigrateError) {
        println!("  ✗ {} - {}", migration, error);
    }
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Calculate column widths for a table given headers and row data.
///
/// For each column, returns the maximum width across the header and all
/// row values so that data aligns when printed with left-padding.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Columns are left-aligned and separated by two spaces, with a dashed line
/// under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
