//! Verity Configuration System
//!
//! Resolves the settings a test run needs before the runner starts:
//! - Global user configuration (~/.verity/config.toml)
//! - Project configuration (verity.toml)
//! - Environment variable overrides (VERITY_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.verity/config.toml)
//! 2. Project config (./verity.toml, searched upwards)
//! 3. Environment variables (VERITY_FAIL_FAST, VERITY_REPORT, VERITY_NO_COLOR, NO_COLOR)
//! 4. Explicit overrides by the hosting process
//!
//! # Example
//!
//! ```no_run
//! use verity_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let settings = config.settings();
//! assert!(!settings.report.is_empty());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader, RunSettings};
pub use project::{ProjectConfig, RunConfig};

/// Name of the report used when nothing else is configured
pub const DEFAULT_REPORT: &str = "summary";

/// Parse a boolean flag the way environment variables spell them.
///
/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitively.
pub fn parse_flag(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
