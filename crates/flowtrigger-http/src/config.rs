//! Workspace connection settings.
//!
//! Settings come from explicit overrides (command-line flags or the
//! environment) first, then from an optional TOML file:
//!
//! ```toml
//! [workspace]
//! host = "https://example.cloud.databricks.com"
//! token = "dapi..."
//! timeout_secs = 30
//! ```

use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const HOST_ENV: &str = "DATABRICKS_HOST";
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error(
        "workspace host is not configured; pass --host, set DATABRICKS_HOST, \
         or add [workspace] host to the config file"
    )]
    MissingHost,

    #[error("timeout_secs must be positive")]
    InvalidTimeout,
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub workspace: WorkspaceSection,
}

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Debug for WorkspaceSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceSection")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Values that take precedence over the config file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Debug for ConfigOverrides {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Resolved connection settings for one workspace.
#[derive(Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Base URL with scheme and without a trailing slash.
    pub host: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Debug for WorkspaceConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceConfig")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WorkspaceConfig {
    pub fn new(host: &str) -> Result<Self, ConfigError> {
        Self::resolve(
            None,
            ConfigOverrides {
                host: Some(host.to_string()),
                ..ConfigOverrides::default()
            },
        )
    }

    /// Load the optional file at `path` and merge `overrides` over it.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let file = path.map(ConfigFile::load).transpose()?;
        Self::resolve(file.as_ref(), overrides)
    }

    pub fn resolve(
        file: Option<&ConfigFile>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let section = file.map(|f| f.workspace.clone()).unwrap_or_default();

        let host = overrides
            .host
            .as_deref()
            .and_then(normalize_host)
            .or_else(|| section.host.as_deref().and_then(normalize_host))
            .ok_or(ConfigError::MissingHost)?;

        let token = overrides
            .token
            .or(section.token)
            .filter(|token| !token.trim().is_empty());

        let timeout = match overrides.timeout_secs.or(section.timeout_secs) {
            Some(0) => return Err(ConfigError::InvalidTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            host,
            token,
            timeout,
        })
    }

    /// Absolute URL for an API path such as `/api/2.1/jobs/run-now`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.host)
    }
}

fn normalize_host(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains("://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}
