//! Global Configuration (~/.verity/config.toml)
//!
//! Handles user-level configuration stored in `~/.verity/config.toml`.

use crate::project::RunConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.verity/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default run settings for every project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
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

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            run.validate("run")?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.verity/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".verity").join("config.toml"))
    }

    /// Merge another global config into this one
    pub fn merge(&mut self, other: &GlobalConfig) {
        if let Some(run) = &other.run {
            self.run.get_or_insert_with(RunConfig::default).merge(run);
        }
    }
}
