//! Board client configuration.
//!
//! Read from `.workboard/config.toml` in the project directory, falling back
//! to `<config dir>/workboard/config.toml`, then overridden by environment
//! variables and finally by CLI flags.
//!
//! ```toml
//! api_url = "https://ledger.example.com/api"
//! api_token = "..."
//! timeout_secs = 15
//!
//! [log]
//! level = "info"
//! format = "compact"   # or "json"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" | "jsonl" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: compact, json", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base `tracing` level; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Base URL of the workflow/job REST API.
    pub api_url: String,
    pub api_token: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub log: LogConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log: LogConfig::default(),
        }
    }
}

impl BoardConfig {
    pub fn project_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".workboard").join("config.toml")
    }

    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("workboard").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse workboard config")
    }

    /// Resolve the config file and apply environment overrides.
    ///
    /// An explicit path must exist; the implicit locations are optional.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidates = std::iter::once(Self::project_path(project_dir))
                    .chain(Self::user_path());
                match candidates.into_iter().find(|p| p.exists()) {
                    Some(path) => Self::from_file(&path)?,
                    None => Self::default(),
                }
            }
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `WORKBOARD_*` overrides read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WORKBOARD_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = lookup("WORKBOARD_API_TOKEN") {
            self.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(secs) = lookup("WORKBOARD_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .parse()
                .with_context(|| format!("Invalid WORKBOARD_TIMEOUT_SECS '{}'", secs))?;
        }
        if let Some(format) = lookup("WORKBOARD_LOG_FORMAT") {
            self.log.format = format.parse()?;
        }
        Ok(())
    }
}
