//! Configuration management for the resource.
//!
//! Loads configuration from an optional TOML file, then applies environment
//! variable overrides. Every key has a default so an empty file is valid.

use crate::models::timezone::parse_utc_offset;
use crate::utils::{ResourceError, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Env var naming a config file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "CLOUDSQL_RESOURCE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub check: CheckConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Cloud SQL Admin API root, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth scope requested for the access token
    #[serde(default = "default_scope")]
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Sleep between two polls of a transient backup run
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on total wait; unset polls forever
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    /// Upper bound on the number of polls; unset polls forever
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub mode: CheckMode,
}

/// How `check` answers when it is given the last seen version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Every known version; the given one is fetched but does not filter the list.
    #[default]
    All,
    /// The given version and everything newer; only the newest when it is gone.
    Since,
}

impl std::str::FromStr for CheckMode {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "since" => Ok(CheckMode::Since),
            "all" => Ok(CheckMode::All),
            other => Err(ResourceError::Config(format!(
                "unknown check mode '{}' (expected 'since' or 'all')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Offset used for reported timestamps, e.g. "+08:00"
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_base_url() -> String {
    "https://sqladmin.googleapis.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_scope() -> String {
    "https://www.googleapis.com/auth/cloud-platform".to_string()
}

fn default_interval_secs() -> u64 {
    30
}

fn default_utc_offset() -> String {
    "+08:00".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_wait_secs: None,
            max_attempts: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ResourceError::Config(e.to_string()))
    }

    /// File (explicit path, else `CLOUDSQL_RESOURCE_CONFIG`, else defaults) plus env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_PATH_ENV).ok();
        let mut config = match path.map(Path::to_path_buf).or(from_env.map(Into::into)) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup; `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CLOUDSQL_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = parse_var(&lookup, "CLOUDSQL_API_TIMEOUT_SECS")? {
            self.api.request_timeout_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, "CLOUDSQL_POLL_INTERVAL_SECS")? {
            self.poll.interval_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, "CLOUDSQL_POLL_MAX_WAIT_SECS")? {
            self.poll.max_wait_secs = Some(secs);
        }
        if let Some(attempts) = parse_var(&lookup, "CLOUDSQL_POLL_MAX_ATTEMPTS")? {
            self.poll.max_attempts = Some(attempts);
        }
        if let Some(mode) = lookup("CLOUDSQL_CHECK_MODE") {
            self.check.mode = mode.parse()?;
        }
        if let Some(offset) = lookup("CLOUDSQL_REPORT_UTC_OFFSET") {
            self.report.utc_offset = offset;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ResourceError::Config("api.base_url must not be empty".into()));
        }
        if self.poll.max_attempts == Some(0) {
            return Err(ResourceError::Config("poll.max_attempts must be at least 1".into()));
        }
        self.report_offset()?;
        Ok(())
    }

    pub fn report_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.report.utc_offset)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.poll.max_wait_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ResourceError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}
