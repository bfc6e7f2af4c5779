//! Module for client configuration.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

static CONFIG_DIR: Lazy<Option<PathBuf>> = Lazy::new(dirs::config_dir);
static CONFIG_FILE_NAME: &str = "nuget-config.json";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 100;

fn find_nuget_config(cwd: &Path) -> Option<PathBuf> {
    let mut current = Some(cwd);

    while let Some(dir) = current {
        let config = dir.join(CONFIG_FILE_NAME);
        if config.is_file() {
            return Some(config);
        }

        current = dir.parent();
    }

    None
}

/// Represents a package source entry in the configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// The display name of the source.
    pub name: String,

    /// The location of the source: an HTTP(S) URL or a local directory.
    ///
    /// Relative directories are relative to the configuration file.
    pub location: String,

    /// Whether the source is used when installing.
    #[serde(default = "enabled_default")]
    pub enabled: bool,

    /// A bearer token sent with every request to an HTTP source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn enabled_default() -> bool {
    true
}

/// Represents the client configuration.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// The configured package sources, in priority order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// The timeout, in seconds, of a single HTTP request.
    ///
    /// If `None`, a default of 100 seconds is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// The proxy URL used for HTTP sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Config {
    /// Reads the client configuration from the given file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = fs::read_to_string(path).with_context(|| {
            format!(
                "failed to read configuration file `{path}`",
                path = path.display()
            )
        })?;

        let mut config: Self = serde_json::from_str(&config).with_context(|| {
            format!("failed to deserialize file `{path}`", path = path.display())
        })?;

        if let Some(parent) = path.parent() {
            for source in &mut config.sources {
                if !source.location.contains("://") && Path::new(&source.location).is_relative()
                {
                    source.location = parent.join(&source.location).display().to_string();
                }
            }
        }

        Ok(config)
    }

    /// Loads a client configuration from a default file path.
    ///
    /// The following paths are checked in order:
    ///
    /// * `nuget-config.json` at the current directory and its parents
    /// * `$CONFIG_DIR/nuget-cli/config.json`
    ///
    /// Where `$CONFIG_DIR` is the platform-specific configuration directory.
    ///
    /// Returns `Ok(None)` if no configuration file was found.
    pub fn from_default_file(cwd: &Path) -> Result<Option<Self>> {
        if let Some(path) = find_nuget_config(cwd) {
            return Ok(Some(Self::from_file(path)?));
        }

        match Self::default_config_path() {
            Ok(path) if path.is_file() => Ok(Some(Self::from_file(path)?)),
            _ => Ok(None),
        }
    }

    /// Gets the path to the default configuration file.
    ///
    /// The default configuration file is `$CONFIG_DIR/nuget-cli/config.json`.
    pub fn default_config_path() -> Result<PathBuf> {
        CONFIG_DIR
            .as_ref()
            .map(|p| p.join("nuget-cli/config.json"))
            .ok_or_else(|| anyhow!("failed to determine operating system configuration directory"))
    }

    /// Gets the locations of the enabled sources, in order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.location.as_str())
    }

    /// Finds the configured source with the given location.
    pub fn source(&self, location: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.location == location)
    }

    /// Gets the timeout of a single HTTP request.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}
