//! Commands for the `nuget-cli` tool.

use anyhow::{Context, Result};
use clap::Args;
use nuget_client::Config;
use std::path::{Path, PathBuf};

mod install;

pub use self::install::*;

/// Common options for commands.
#[derive(Args)]
pub struct CommonOptions {
    /// The path to the client configuration file to use.
    ///
    /// If not specified, `nuget-config.json` is searched for in the current
    /// directory and its parents, then in the user's configuration directory.
    #[clap(long, value_name = "CONFIG", env = "NUGET_CLI_CONFIG")]
    pub config: Option<PathBuf>,
}

impl CommonOptions {
    /// Reads the client configuration.
    ///
    /// If no configuration file is found, the default configuration is used.
    pub fn read_config(&self, current_dir: &Path) -> Result<Config> {
        match &self.config {
            Some(path) => Config::from_file(current_dir.join(path)),
            None => Ok(Config::from_default_file(current_dir)
                .context("failed to load the default configuration")?
                .unwrap_or_default()),
        }
    }
}
