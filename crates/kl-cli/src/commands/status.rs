//! Status command implementation

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{
    build_manager, load_project, open_environment_session, print_table, selected_environments,
};
use anyhow::{Context, Result};
use kl_core::Version;
use kl_migrate::MigrationStatus;
use serde::Serialize;

/// One row of status output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct StatusEntry {
    pub(crate) version: String,
    /// `None` when the ledger holds a version with no script on disk
    pub(crate) name: Option<String>,
    pub(crate) state: EntryState,
    pub(crate) applied_at: Option<String>,
    pub(crate) duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EntryState {
    Applied,
    Pending,
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryState::Applied => write!(f, "applied"),
            EntryState::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Serialize)]
struct EnvironmentStatus {
    environment: String,
    migrations: Vec<StatusEntry>,
}

/// Show applied and pending migrations for every selected environment.
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let mut statuses = Vec::new();

    for env in selected_environments(&project, global)? {
        let mut session = open_environment_session(&project, &env)?;
        let manager = build_manager(&project, &env)?;
        let status = manager
            .status(session.as_mut())
            .with_context(|| format!("Failed to read status of environment '{}'", env.label()))?;

        statuses.push(EnvironmentStatus {
            environment: env.label().to_string(),
            migrations: build_entries(status),
        });
    }

    match args.output {
        StatusOutput::Json => {
            let json = serde_json::to_string_pretty(&statuses)
                .context("Failed to serialize status")?;
            println!("{json}");
        }
        StatusOutput::Table => {
            for status in &statuses {
                print_status_table(status);
            }
        }
    }
    Ok(())
}

/// Merge ledger records and pending migrations into one list ordered by
/// version, naming applied versions from the resolved scripts.
pub(crate) fn build_entries(status: MigrationStatus) -> Vec<StatusEntry> {
    let names = status.names;
    let mut entries: Vec<(Option<Version>, StatusEntry)> = status
        .applied
        .into_iter()
        .map(|record| {
            let version = Version::parse(record.version.trim());
            let name = version
                .as_ref()
                .and_then(|v| names.get(v))
                .cloned();
            let entry = StatusEntry {
                version: record.version,
                name,
                state: EntryState::Applied,
                applied_at: record
                    .applied_at
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
                duration_ms: record.duration_ms,
            };
            (version, entry)
        })
        .collect();

    entries.extend(status.pending.into_iter().map(|m| {
        let entry = StatusEntry {
            version: m.version().to_string(),
            name: Some(m.name().to_string()),
            state: EntryState::Pending,
            applied_at: None,
            duration_ms: None,
        };
        (Some(m.version().clone()), entry)
    }));

    // Unparseable ledger versions sort last.
    entries.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    entries.into_iter().map(|(_, entry)| entry).collect()
}

fn print_status_table(status: &EnvironmentStatus) {
    println!("Environment: {}", status.environment);
    if status.migrations.is_empty() {
        println!("No migrations found\n");
        return;
    }

    let rows: Vec<Vec<String>> = status
        .migrations
        .iter()
        .map(|e| {
            vec![
                e.version.clone(),
                e.name.clone().unwrap_or_else(|| "-".to_string()),
                e.state.to_string(),
                e.applied_at.clone().unwrap_or_else(|| "-".to_string()),
                e.duration_ms
                    .map(|d| format!("{d}ms"))
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["VERSION", "NAME", "STATE", "APPLIED AT", "DURATION"], &rows);

    let pending = status
        .migrations
        .iter()
        .filter(|e| e.state == EntryState::Pending)
        .count();
    println!(
        "\n{} applied, {} pending\n",
        status.migrations.len() - pending,
        pending
    );
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
