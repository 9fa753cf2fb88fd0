//! Layered TOML configuration.
//!
//! Files are applied from least to most specific: the user config
//! (`<config_dir>/formstep/config.toml`), then the project config
//! (`./.formstep/config.toml`). Command-line flags, which also read
//! `FORMSTEP_API_URL`, are applied last.

use anyhow::{Context, Result};
use clap::ValueEnum;
use formstep::{CheckboxRule, ValidationRules};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";
pub const PROJECT_DIR: &str = ".formstep";

/// Which terminal frontend runs the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FrontendKind {
    #[default]
    Ratatui,
    Dialoguer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the forms backend
    pub api_base_url: String,

    /// Timeout for every backend request
    pub request_timeout_secs: u64,

    /// Directory holding one JSON file per draft
    pub draft_dir: PathBuf,

    /// Total bytes the draft directory may hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_quota_bytes: Option<u64>,

    /// Whether a required checkbox needs a selection
    pub checkbox_rule: CheckboxRule,

    pub frontend: FrontendKind,

    /// Directory for JSON log files
    pub log_dir: PathBuf,
}

/// One config file. Every key is optional and only set keys override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub draft_dir: Option<PathBuf>,
    pub draft_quota_bytes: Option<u64>,
    pub checkbox_rule: Option<CheckboxRule>,
    pub frontend: Option<FrontendKind>,
    pub log_dir: Option<PathBuf>,
}

/// Values taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub draft_dir: Option<PathBuf>,
    pub frontend: Option<FrontendKind>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("formstep"))
            .unwrap_or_else(|| PathBuf::from(PROJECT_DIR));
        Self {
            api_base_url: formstep::client::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: formstep::client::DEFAULT_TIMEOUT.as_secs(),
            draft_dir: data_dir.join("drafts"),
            draft_quota_bytes: None,
            checkbox_rule: CheckboxRule::default(),
            frontend: FrontendKind::default(),
            log_dir: data_dir.join("logs"),
        }
    }
}

impl Config {
    /// Load from the default locations and apply `overrides`.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let mut config = Self::load_from(&Self::config_paths())?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Start from defaults and merge each existing file in order.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self> {
        let mut config = Self::default();
        for path in paths.iter().filter(|p| p.exists()) {
            let file = ConfigFile::read(path)?;
            tracing::debug!(path = %path.display(), "applying config file");
            config.merge(file);
        }
        Ok(config)
    }

    /// Config files from least to most specific.
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];
        if let Some(user) = Self::user_config_path() {
            paths.push(user);
        }
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(PROJECT_DIR).join(CONFIG_FILE));
        }
        paths
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("formstep").join(CONFIG_FILE))
    }

    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(dir) = file.draft_dir {
            self.draft_dir = dir;
        }
        if file.draft_quota_bytes.is_some() {
            self.draft_quota_bytes = file.draft_quota_bytes;
        }
        if let Some(rule) = file.checkbox_rule {
            self.checkbox_rule = rule;
        }
        if let Some(frontend) = file.frontend {
            self.frontend = frontend;
        }
        if let Some(dir) = file.log_dir {
            self.log_dir = dir;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.api_base_url {
            self.api_base_url = url.clone();
        }
        if let Some(dir) = &overrides.draft_dir {
            self.draft_dir = dir.clone();
        }
        if let Some(frontend) = overrides.frontend {
            self.frontend = frontend;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::with_checkbox(self.checkbox_rule)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write this config to `path`, creating parent directories.
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub fn write_to(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}
