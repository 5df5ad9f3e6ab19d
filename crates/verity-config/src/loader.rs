//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{ProjectConfig, RunConfig};
use crate::{parse_flag, ConfigError, ConfigResult, DEFAULT_REPORT};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "verity.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.verity/config.toml) - lowest priority
/// 2. Project config (./verity.toml) - overrides global
/// 3. Environment variables (VERITY_*) - overrides project
/// 4. Explicit overrides - highest priority (handled by caller via [`RunSettings`])
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration, with environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where verity.toml was found)
    pub project_root: Option<PathBuf>,
}

/// Fully resolved settings for one test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Terminate the process on the first failure or error
    pub fail_fast: bool,
    /// Name of the report to run tests through
    pub report: String,
    /// Disable colored operator output
    pub no_color: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            fail_fast: false,
            report: DEFAULT_REPORT.to_string(),
            no_color: false,
        }
    }
}

impl RunSettings {
    /// Override the fail-fast flag
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Override the report name
    pub fn with_report(mut self, report: impl Into<String>) -> Self {
        self.report = report.into();
        self
    }

    /// Override colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.verity/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find verity.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // A missing home directory only means there is no global layer
        let global_config = match self.load_global_config() {
            Ok(config) => config,
            Err(ConfigError::HomeNotFound) => GlobalConfig::default(),
            Err(e) => return Err(e),
        };

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = match self.load_global_config() {
            Ok(config) => config,
            Err(ConfigError::HomeNotFound) => GlobalConfig::default(),
            Err(e) => return Err(e),
        };
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); no file found yields the default config
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.verity/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognised: VERITY_FAIL_FAST, VERITY_REPORT, VERITY_NO_COLOR and the
    /// standard NO_COLOR (presence alone disables color).
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(value) = env::var("VERITY_FAIL_FAST") {
            config.run_mut().fail_fast = Some(parse_flag("VERITY_FAIL_FAST", &value)?);
        }

        if let Ok(report) = env::var("VERITY_REPORT") {
            config.run_mut().report = Some(report);
        }

        if let Ok(value) = env::var("VERITY_NO_COLOR") {
            config.run_mut().no_color = Some(parse_flag("VERITY_NO_COLOR", &value)?);
        } else if env::var_os("NO_COLOR").is_some() {
            config.run_mut().no_color = Some(true);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Resolve the effective run settings (project > global > default)
    pub fn settings(&self) -> RunSettings {
        let mut run = RunConfig::default();
        if let Some(global) = &self.global.run {
            run.merge(global);
        }
        if let Some(project) = &self.project.run {
            run.merge(project);
        }

        let defaults = RunSettings::default();
        RunSettings {
            fail_fast: run.fail_fast.unwrap_or(defaults.fail_fast),
            report: run.report.unwrap_or(defaults.report),
            no_color: run.no_color.unwrap_or(defaults.no_color),
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has verity.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
