//! kl-core - Core library for Keel
//!
//! This crate provides configuration parsing, version tokens, script
//! encodings, placeholder substitution, and migration discovery shared by the
//! Keel engine and CLI.

pub mod config;
pub mod encoding;
pub mod error;
pub mod migration;
pub mod resolver;
pub mod substitution;
pub mod version;

pub use config::{Config, Environment, EnvironmentConfig};
pub use encoding::ScriptEncoding;
pub use error::{CoreError, CoreResult};
pub use migration::{Migration, MigrationSource};
pub use resolver::{EmbeddedScript, MigrationResolver, ScriptRoot, MIGRATION_EXTENSIONS};
pub use substitution::Substitutions;
pub use version::Version;
