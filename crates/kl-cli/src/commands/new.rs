//! New command implementation

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_project;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Version format for generated scripts.
const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Write an empty migration script under the first script root's
/// migrations directory.
pub fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dir = project.config.migrations_dir(&project.root);

    let path = new_migration_path(
        &dir,
        &args.name,
        args.extension.as_str(),
        Local::now().naive_local(),
    )?;

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    std::fs::write(&path, format!("-- {}\n", args.name.trim()))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

/// Path of a new `<timestamp>_<name>.<ext>` script in `dir`.
///
/// Whitespace in `name` becomes `_`; other characters must be ASCII
/// alphanumerics, `_` or `-`. Fails if the file already exists.
pub(crate) fn new_migration_path(
    dir: &Path,
    name: &str,
    extension: &str,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let name = name.split_whitespace().collect::<Vec<_>>().join("_");
    if name.is_empty() {
        bail!("Migration name cannot be empty");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        bail!("Migration name '{name}' contains invalid character '{c}'");
    }

    let path = dir.join(format!(
        "{}_{}.{}",
        now.format(VERSION_FORMAT),
        name,
        extension
    ));
    if path.exists() {
        bail!("Migration {} already exists", path.display());
    }
    Ok(path)
}
