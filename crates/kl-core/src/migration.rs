//! The migration entity produced by resolution.

use crate::encoding::ScriptEncoding;
use crate::error::{CoreError, CoreResult};
use crate::substitution::Substitutions;
use crate::version::Version;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a migration's script text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSource {
    /// A file on disk, read when the script is loaded.
    File(PathBuf),
    /// Script text compiled into the binary (see [`crate::EmbeddedScript`]).
    Inline {
        /// Logical path, e.g. `migrations/001_init.sql`.
        path: String,
        /// Raw script text.
        content: &'static str,
    },
}

impl MigrationSource {
    /// Human-readable location for logs and errors.
    pub fn location(&self) -> String {
        match self {
            MigrationSource::File(path) => path.display().to_string(),
            MigrationSource::Inline { path, .. } => format!("embedded:{path}"),
        }
    }
}

/// One versioned, named, executable database change.
///
/// Immutable once resolved. Whether it is pending is derived from the ledger,
/// never stored here.
#[derive(Debug, Clone)]
pub struct Migration {
    version: Version,
    name: String,
    file_name: String,
    source: MigrationSource,
    substitutions: Option<Arc<Substitutions>>,
}

impl Migration {
    pub fn new(
        version: Version,
        name: impl Into<String>,
        file_name: impl Into<String>,
        source: MigrationSource,
        substitutions: Option<Arc<Substitutions>>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            file_name: file_name.into(),
            source,
            substitutions,
        }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Display name: the file stem after the version token, e.g. `create_books`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Original artifact name, e.g. `001_create_books.sql`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }

    /// Load the script text, decoded with `encoding` and with placeholders
    /// substituted.
    pub fn load_script(&self, encoding: ScriptEncoding) -> CoreResult<String> {
        let raw = match &self.source {
            MigrationSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                })?;
                encoding.decode(&bytes).map_err(|reason| CoreError::Decode {
                    path: path.display().to_string(),
                    encoding: encoding.label().to_string(),
                    reason,
                })?
            }
            // Embedded scripts are Rust string literals and already UTF-8.
            MigrationSource::Inline { content, .. } => (*content).to_string(),
        };

        match &self.substitutions {
            Some(subs) if !subs.is_empty() => Ok(subs.apply(&raw, &self.file_name).into_owned()),
            _ => Ok(raw),
        }
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.name)
    }
}
