//! Project Configuration (verity.toml)
//!
//! Handles project-level configuration stored in `verity.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project configuration from verity.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Test run settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,
}

/// The `[run]` table, shared by project and global configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Stop the whole process on the first failure or error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,

    /// Name of the registered report to run tests through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,

    /// Disable colored operator output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_color: Option<bool>,
}

impl RunConfig {
    /// Validate the run table
    pub fn validate(&self, prefix: &str) -> ConfigResult<()> {
        if let Some(report) = &self.report {
            if report.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.report", prefix),
                    reason: "report name cannot be empty".to_string(),
                });
            }
            if !report
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.report", prefix),
                    reason: format!("invalid report name '{}'", report),
                });
            }
        }
        Ok(())
    }

    /// Merge another run table into this one.
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &RunConfig) {
        if other.fail_fast.is_some() {
            self.fail_fast = other.fail_fast;
        }
        if other.report.is_some() {
            self.report = other.report.clone();
        }
        if other.no_color.is_some() {
            self.no_color = other.no_color;
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            run.validate("run")?;
        }
        Ok(())
    }

    /// Mutable access to the `[run]` table, creating it when absent
    pub fn run_mut(&mut self) -> &mut RunConfig {
        self.run.get_or_insert_with(RunConfig::default)
    }
}
