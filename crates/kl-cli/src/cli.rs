//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Keel - versioned SQL schema migrations
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Environments to operate on (comma-separated, falls back to KEEL_ENV)
    #[arg(short, long, global = true)]
    pub env: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Migrate,

    /// Show applied and pending migrations
    Status(StatusArgs),

    /// Exit with status 1 when migrations are pending
    Check,

    /// Resolve and load migration scripts without touching the database
    Validate,

    /// Create the database (file-backed backends) and the ledger table
    Create,

    /// Write an empty, timestamp-versioned migration script
    New(NewArgs),
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Descriptive name, e.g. `create_books`
    pub name: String,

    /// Script extension
    #[arg(short = 'x', long, value_enum, default_value = "sql")]
    pub extension: ScriptExtension,
}

/// Extensions recognised for migration scripts
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptExtension {
    /// SQL script
    Sql,
    /// CQL (Cassandra) script
    Cql,
}

impl ScriptExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptExtension::Sql => "sql",
            ScriptExtension::Cql => "cql",
        }
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
