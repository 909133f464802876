//! Configuration types and parsing for keel.yml

use crate::encoding::ScriptEncoding;
use crate::error::{CoreError, CoreResult};
use crate::substitution::Substitutions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--env` flag is given.
pub const ENV_VAR: &str = "KEEL_ENV";

/// Main project configuration from keel.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database URL, e.g. `duckdb:warehouse.duckdb` or `postgres://host/db`
    pub url: String,

    /// Directories searched for migrations, relative to the project root
    #[serde(default = "default_script_roots")]
    pub script_roots: Vec<String>,

    /// Migrations directory inside each script root
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// Text encoding of migration scripts
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Name of the table recording applied migrations
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Apply migrations without transactions on backends that lack them
    #[serde(default)]
    pub allow_non_transactional: bool,

    /// Values substituted for `${key}` placeholders in scripts
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,

    /// Named environment overrides (e.g. development, test, production)
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

/// Environment-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Database URL override
    #[serde(default)]
    pub url: Option<String>,

    /// Non-transactional policy override
    #[serde(default)]
    pub allow_non_transactional: Option<bool>,

    /// Variable overrides (merged with base vars)
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,
}

/// Connection and substitution settings for one environment, with overrides
/// applied.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Environment name, `None` for the base configuration
    pub name: Option<String>,
    /// Database URL
    pub url: String,
    /// Merged substitution map
    pub substitutions: Substitutions,
    /// Whether non-transactional backends may be migrated
    pub allow_non_transactional: bool,
}

impl Environment {
    /// Label for log and console output.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }
}

fn default_script_roots() -> Vec<String> {
    vec![".".to_string()]
}

fn default_migrations_path() -> String {
    "migrations".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_ledger_table() -> String {
    "schema_version".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for keel.yml or keel.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("keel.yml");
        let yaml_path = dir.join("keel.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.url.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "'url' cannot be empty".to_string(),
            });
        }

        if self.script_roots.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one script_roots entry must be specified".to_string(),
            });
        }

        if self.ledger_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "'ledger_table' cannot be empty".to_string(),
            });
        }

        self.script_encoding()?;
        vars_to_strings(&self.vars)?;

        for (name, env) in &self.environments {
            if name.trim().is_empty() || name.contains(',') {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Invalid environment name '{name}'"),
                });
            }
            if env.url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Environment '{name}' has an empty 'url'"),
                });
            }
            vars_to_strings(&env.vars)?;
        }

        Ok(())
    }

    /// Parsed script encoding
    pub fn script_encoding(&self) -> CoreResult<ScriptEncoding> {
        self.encoding.parse()
    }

    /// Get absolute script roots relative to a project root
    pub fn script_roots_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.script_roots.iter().map(|p| root.join(p)).collect()
    }

    /// Directory new migrations are written to: the migrations path under the
    /// first script root.
    pub fn migrations_dir(&self, root: &Path) -> PathBuf {
        let first = self
            .script_roots
            .first()
            .map(String::as_str)
            .unwrap_or(".");
        root.join(first).join(&self.migrations_path)
    }

    /// Get the list of available environment names, sorted
    pub fn available_environments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve settings for an environment, or the base settings for `None`.
    pub fn environment(&self, name: Option<&str>) -> CoreResult<Environment> {
        let Some(name) = name else {
            return Ok(Environment {
                name: None,
                url: self.url.clone(),
                substitutions: Substitutions::new(vars_to_strings(&self.vars)?),
                allow_non_transactional: self.allow_non_transactional,
            });
        };

        let env = self
            .environments
            .get(name)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!(
                    "Environment '{}' not found. Available environments: {}",
                    name,
                    self.available_environments().join(", ")
                ),
            })?;

        let mut vars = vars_to_strings(&self.vars)?;
        vars.extend(vars_to_strings(&env.vars)?);

        Ok(Environment {
            name: Some(name.to_string()),
            url: env.url.clone().unwrap_or_else(|| self.url.clone()),
            substitutions: Substitutions::new(vars),
            allow_non_transactional: env
                .allow_non_transactional
                .unwrap_or(self.allow_non_transactional),
        })
    }

    /// Resolve every environment selected by a comma-separated list.
    ///
    /// Priority: CLI flag > KEEL_ENV env var > base configuration.
    pub fn resolve_environments(&self, cli_env: Option<&str>) -> CoreResult<Vec<Environment>> {
        let selection = cli_env
            .map(String::from)
            .or_else(|| std::env::var(ENV_VAR).ok())
            .filter(|s| !s.trim().is_empty());

        match selection {
            None => Ok(vec![self.environment(None)?]),
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| self.environment(Some(name)))
                .collect(),
        }
    }
}

/// Convert YAML scalar vars to strings for substitution.
fn vars_to_strings(
    vars: &HashMap<String, serde_yaml::Value>,
) -> CoreResult<HashMap<String, String>> {
    vars.iter()
        .map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(CoreError::ConfigInvalid {
                        message: format!("Variable '{key}' must be a string, number, or boolean"),
                    })
                }
            };
            Ok((key.clone(), text))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
