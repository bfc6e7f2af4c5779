//! The install workflow: from user input to an installed package.

use crate::{log_bridge::LogBridge, reporter::Reporter};
use indexmap::IndexSet;
use nuget_client::{
    Config, LockFileLibrary, RangeError, RestoreEngine, RestoreRequest, VersionRange,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The exit code of a successful installation.
pub const EXIT_SUCCESS: i32 = 0;
/// The exit code of a failed installation.
pub const EXIT_FAILURE: i32 = 1;
/// The exit code when the version range could not be parsed.
///
/// This is also the code clap exits with for malformed arguments, so both
/// kinds of usage error share it. No other install path returns it.
pub const EXIT_INVALID_VERSION: i32 = 2;
/// The exit code when no command was given and help was printed instead.
pub const EXIT_HELP: i32 = 3;

const DEFAULT_OUTPUT_DIR: &str = "packages";

/// The version text given by the user is not a valid version range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{text}` is not a valid version range")]
pub struct InvalidConstraintSyntax {
    /// The text that failed to parse.
    pub text: String,
    /// The parse error.
    #[source]
    pub source: RangeError,
}

/// Turns the user's version text into a version range.
///
/// Without text, the latest stable version is selected, or the latest
/// version of any kind when `prerelease` is set.
pub fn resolve_version_range(
    text: Option<&str>,
    prerelease: bool,
) -> Result<VersionRange, InvalidConstraintSyntax> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => {
            VersionRange::parse(text).map_err(|source| InvalidConstraintSyntax {
                text: text.to_string(),
                source,
            })
        }
        _ if prerelease => Ok(VersionRange::all_floating()),
        _ => Ok(VersionRange::all_stable_floating()),
    }
}

/// The user's options for one installation.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// The id of the package to install.
    pub package_id: String,
    /// The version range text, if given.
    pub version: Option<String>,
    /// Whether prerelease versions are selected when no version is given.
    pub prerelease: bool,
    /// The output directory, relative to the current directory.
    pub output: Option<PathBuf>,
    /// Feed locations used in addition to the configured sources.
    pub sources: Vec<String>,
}

/// The result of one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    /// Whether the requested package was installed.
    pub success: bool,
    /// The installed package, if found.
    pub library: Option<LockFileLibrary>,
    /// The process exit code.
    pub exit_code: i32,
}

impl InstallResult {
    fn failed(exit_code: i32) -> Self {
        Self {
            success: false,
            library: None,
            exit_code,
        }
    }
}

/// Builds the request submitted to the restore engine.
///
/// Sources are the enabled configured sources followed by the additional
/// ones, with duplicates removed.
pub fn build_request(
    options: &InstallOptions,
    range: VersionRange,
    config: &Config,
    current_dir: &Path,
) -> RestoreRequest {
    let sources: IndexSet<String> = config
        .enabled_sources()
        .map(str::to_string)
        .chain(options.sources.iter().cloned())
        .collect();

    RestoreRequest {
        package_id: options.package_id.clone(),
        range,
        output_dir: current_dir.join(
            options
                .output
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_OUTPUT_DIR)),
        ),
        sources: sources.into_iter().collect(),
        config: config.clone(),
    }
}

/// Drives a restore engine to install a single package.
pub struct InstallOrchestrator<'a> {
    engine: &'a dyn RestoreEngine,
    reporter: &'a dyn Reporter,
    config: Config,
    current_dir: PathBuf,
}

impl<'a> InstallOrchestrator<'a> {
    /// Creates a new orchestrator.
    pub fn new(
        engine: &'a dyn RestoreEngine,
        reporter: &'a dyn Reporter,
        config: Config,
        current_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            reporter,
            config,
            current_dir: current_dir.into(),
        }
    }

    /// Installs the package described by the options.
    ///
    /// Every outcome is reported; the returned exit code reflects the result.
    pub async fn install(&self, options: &InstallOptions) -> InstallResult {
        let range = match resolve_version_range(options.version.as_deref(), options.prerelease) {
            Ok(range) => range,
            Err(e) => {
                tracing::debug!("{e}: {source}", source = e.source);
                self.reporter
                    .error(&format!("Invalid nuget version '{text}'", text = e.text));
                return InstallResult::failed(EXIT_INVALID_VERSION);
            }
        };

        let request = build_request(options, range, &self.config, &self.current_dir);
        tracing::debug!(
            "installing `{id}` {range} into `{dir}` from {sources:?}",
            id = request.package_id,
            range = request.range,
            dir = request.output_dir.display(),
            sources = request.sources
        );

        let bridge = LogBridge::new(self.reporter);
        let outcomes = match self.engine.restore(&request, &bridge).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.reporter.error(&e.to_string());
                self.reporter.error("Installation failed");
                return InstallResult::failed(EXIT_FAILURE);
            }
        };

        let id = request.package_id.to_lowercase();
        let mut installed = None;
        for outcome in outcomes {
            if !outcome.success {
                for unresolved in &outcome.unresolved {
                    self.reporter.warn(&format!(
                        "Could not find a package {name} in the version range {range}",
                        name = unresolved.name,
                        range = unresolved.range
                    ));
                }
                continue;
            }

            let Some(library) = outcome
                .libraries
                .into_iter()
                .find(|l| l.name.to_lowercase() == id)
            else {
                continue;
            };

            self.reporter.output(&format!(
                "Installed {name} {version}",
                name = library.name,
                version = library.version
            ));
            let install_dir = request.output_dir.join(&library.path);
            for file in &library.files {
                self.reporter.verbose(&format!(
                    "Package file: {path}",
                    path = install_dir.join(file).display()
                ));
            }
            installed = Some(library);
            break;
        }

        match installed {
            Some(library) => {
                self.reporter.output("Installation succeeded");
                InstallResult {
                    success: true,
                    library: Some(library),
                    exit_code: EXIT_SUCCESS,
                }
            }
            None => {
                self.reporter.error("Installation failed");
                InstallResult::failed(EXIT_FAILURE)
            }
        }
    }
}
