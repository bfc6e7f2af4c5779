use super::CommonOptions;
use crate::{
    install::{InstallOptions, InstallOrchestrator},
    reporter::ConsoleReporter,
};
use anyhow::{Context, Result};
use clap::Args;
use nuget_client::FeedRestoreEngine;
use std::path::PathBuf;

/// Install a package and its dependencies from NuGet feeds.
#[derive(Args)]
#[clap(disable_version_flag = true)]
pub struct InstallCommand {
    /// The common command options.
    #[clap(flatten)]
    pub common: CommonOptions,
    /// The id of the package to install.
    #[clap(value_name = "PACKAGE_ID")]
    pub package_id: String,
    /// The version range of the package to install; defaults to the latest version.
    #[clap(long, value_name = "RANGE")]
    pub version: Option<String>,
    /// Select the latest prerelease version when no version is given.
    #[clap(long)]
    pub prerelease: bool,
    /// The directory to install packages into; defaults to `./packages`.
    #[clap(long, short, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// An additional package source to install from; may be repeated.
    #[clap(long = "source", short, value_name = "SOURCE")]
    pub sources: Vec<String>,
    /// Show detailed output.
    #[clap(long, short)]
    pub verbose: bool,
}

impl InstallCommand {
    /// Executes the command, returning the process exit code.
    pub async fn exec(self) -> Result<i32> {
        let current_dir =
            std::env::current_dir().context("failed to determine the current directory")?;
        let config = self.common.read_config(&current_dir)?;

        let reporter = ConsoleReporter::new(self.verbose);
        let engine = FeedRestoreEngine::new();
        let orchestrator = InstallOrchestrator::new(&engine, &reporter, config, current_dir);

        let result = orchestrator
            .install(&InstallOptions {
                package_id: self.package_id,
                version: self.version,
                prerelease: self.prerelease,
                output: self.output,
                sources: self.sources,
            })
            .await;

        Ok(result.exit_code)
    }
}
