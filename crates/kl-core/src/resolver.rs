//! Migration discovery and ordering.
//!
//! [`MigrationResolver`] scans one or more [`ScriptRoot`]s for artifacts named
//! `<version>_<name>.<ext>` and returns them sorted by [`Version`]. Directory
//! enumeration order never influences the result.

use crate::error::{CoreError, CoreResult};
use crate::migration::{Migration, MigrationSource};
use crate::substitution::Substitutions;
use crate::version::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extensions recognised as migration scripts.
pub const MIGRATION_EXTENSIONS: &[&str] = &["sql", "cql"];

/// A migration script compiled into the binary with `include_str!`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedScript {
    /// Logical path using `/` separators, e.g. `migrations/001_init.sql`.
    pub path: &'static str,
    /// Script text.
    pub content: &'static str,
}

/// A place migrations are discovered from.
#[derive(Debug, Clone)]
pub enum ScriptRoot {
    /// A filesystem directory.
    Directory(PathBuf),
    /// Scripts packaged into the binary.
    Embedded(&'static [EmbeddedScript]),
}

impl ScriptRoot {
    fn describe(&self) -> String {
        match self {
            ScriptRoot::Directory(path) => path.display().to_string(),
            ScriptRoot::Embedded(scripts) => format!("<embedded: {} script(s)>", scripts.len()),
        }
    }
}

/// Outcome of matching an artifact name against the naming convention.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParsedName {
    /// Not a migration artifact; skipped.
    Ignored,
    /// A valid `<version>_<name>.<ext>` artifact.
    Migration { version: Version, name: String },
}

/// Match a file name against `<version>_<name>.<ext>`.
///
/// Names whose stem does not start with a digit, that lack `_`, or that have
/// another extension are ignored. A digit-led prefix that is not a valid
/// version token, or an empty name part, is an error.
pub(crate) fn parse_file_name(file_name: &str, location: &str) -> CoreResult<ParsedName> {
    let Some((stem, ext)) = file_name.rsplit_once('.') else {
        return Ok(ParsedName::Ignored);
    };
    if !MIGRATION_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
        return Ok(ParsedName::Ignored);
    }
    if !stem.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(ParsedName::Ignored);
    }
    let Some((token, name)) = stem.split_once('_') else {
        return Ok(ParsedName::Ignored);
    };

    let version = Version::parse(token).ok_or_else(|| CoreError::MalformedMigration {
        path: location.to_string(),
        reason: format!("'{token}' is not a valid version token (expected digits, optionally dot-separated)"),
    })?;
    if name.trim().is_empty() {
        return Err(CoreError::MalformedMigration {
            path: location.to_string(),
            reason: "missing migration name after the version token".to_string(),
        });
    }
    Ok(ParsedName::Migration {
        version,
        name: name.to_string(),
    })
}

/// Discovers migrations under a set of script roots.
#[derive(Debug, Clone)]
pub struct MigrationResolver {
    roots: Vec<ScriptRoot>,
    location: String,
    substitutions: Option<Arc<Substitutions>>,
}

impl MigrationResolver {
    /// Create a resolver over `roots`, looking for scripts in the
    /// `location` sub-path of each root (`""` means the root itself).
    pub fn new(roots: Vec<ScriptRoot>, location: impl Into<String>) -> Self {
        Self {
            roots,
            location: normalize_location(&location.into()),
            substitutions: None,
        }
    }

    /// Attach a substitution map applied when scripts are loaded.
    pub fn with_substitutions(mut self, substitutions: Substitutions) -> Self {
        self.substitutions = if substitutions.is_empty() {
            None
        } else {
            Some(Arc::new(substitutions))
        };
        self
    }

    pub fn roots(&self) -> &[ScriptRoot] {
        &self.roots
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Resolve every discoverable migration, ascending by version.
    ///
    /// Fails on the first malformed artifact or duplicate version. Performs
    /// no writes and is deterministic for a fixed set of files.
    pub fn resolve(&self) -> CoreResult<Vec<Migration>> {
        let mut by_version: BTreeMap<Version, Migration> = BTreeMap::new();

        for root in &self.roots {
            log::debug!(
                "Scanning {} for migrations under '{}'",
                root.describe(),
                self.location
            );
            let found = match root {
                ScriptRoot::Directory(dir) => self.scan_directory(dir)?,
                ScriptRoot::Embedded(scripts) => self.scan_embedded(scripts)?,
            };
            for migration in found {
                if let Some(existing) = by_version.get(migration.version()) {
                    return Err(CoreError::DuplicateVersion {
                        version: migration.version().to_string(),
                        first: existing.source().location(),
                        second: migration.source().location(),
                    });
                }
                by_version.insert(migration.version().clone(), migration);
            }
        }

        log::debug!("Resolved {} migration(s)", by_version.len());
        Ok(by_version.into_values().collect())
    }

    fn scan_directory(&self, root: &Path) -> CoreResult<Vec<Migration>> {
        let dir = if self.location.is_empty() {
            root.to_path_buf()
        } else {
            root.join(&self.location)
        };
        if !dir.is_dir() {
            log::warn!("Migrations directory not found, skipping: {}", dir.display());
            return Ok(Vec::new());
        }

        let mut migrations = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })? {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("Skipping non UTF-8 file name: {}", path.display());
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }

            match parse_file_name(&file_name, &path.display().to_string())? {
                ParsedName::Ignored => {
                    log::debug!("Ignoring non-migration file: {}", path.display());
                }
                ParsedName::Migration { version, name } => {
                    let migration = Migration::new(
                        version,
                        name,
                        file_name,
                        MigrationSource::File(path),
                        self.substitutions.clone(),
                    );
                    push_unique(&mut migrations, migration)?;
                }
            }
        }
        Ok(migrations)
    }

    fn scan_embedded(&self, scripts: &[EmbeddedScript]) -> CoreResult<Vec<Migration>> {
        let mut migrations = Vec::new();
        for script in scripts {
            let (parent, file_name) = match script.path.rsplit_once('/') {
                Some((parent, file_name)) => (parent, file_name),
                None => ("", script.path),
            };
            if normalize_location(parent) != self.location || file_name.starts_with('.') {
                continue;
            }
            match parse_file_name(file_name, &format!("embedded:{}", script.path))? {
                ParsedName::Ignored => {
                    log::debug!("Ignoring non-migration script: {}", script.path);
                }
                ParsedName::Migration { version, name } => {
                    let migration = Migration::new(
                        version,
                        name,
                        file_name,
                        MigrationSource::Inline {
                            path: script.path.to_string(),
                            content: script.content,
                        },
                        self.substitutions.clone(),
                    );
                    push_unique(&mut migrations, migration)?;
                }
            }
        }
        Ok(migrations)
    }
}

/// Append `migration`, failing if a migration with the same version is
/// already present in this root.
fn push_unique(migrations: &mut Vec<Migration>, migration: Migration) -> CoreResult<()> {
    if let Some(existing) = migrations
        .iter()
        .find(|m| m.version() == migration.version())
    {
        // Report in name order so the message does not depend on read_dir order.
        let mut pair = [existing.source().location(), migration.source().location()];
        pair.sort();
        let [first, second] = pair;
        return Err(CoreError::DuplicateVersion {
            version: migration.version().to_string(),
            first,
            second,
        });
    }
    migrations.push(migration);
    Ok(())
}

/// Normalise a location to `/`-separated form without leading `./` or
/// surrounding slashes.
fn normalize_location(location: &str) -> String {
    location
        .replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
