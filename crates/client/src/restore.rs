//! Resolution and installation of a package and its dependencies.

use crate::{
    config::Config,
    feed::{open_feed, Feed, FeedError, FetchedManifest},
    log::{LogCode, RestoreLogger, RestoreLoggerExt},
    manifest::{id_segment, is_valid_id, version_segment},
    range::VersionRange,
    version::NuGetVersion,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::{
    collections::{HashSet, VecDeque},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// A request to restore one top-level package.
#[derive(Debug, Clone)]
pub struct RestoreRequest {
    /// The id of the top-level package.
    pub package_id: String,
    /// The acceptable versions of the top-level package.
    pub range: VersionRange,
    /// The directory packages are installed into.
    pub output_dir: PathBuf,
    /// The feed locations to query, in priority order.
    pub sources: Vec<String>,
    /// The client configuration.
    pub config: Config,
}

/// A package installed by a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockFileLibrary {
    /// The package id, as published.
    pub name: String,
    /// The resolved version.
    pub version: NuGetVersion,
    /// The install path, relative to the output directory.
    pub path: String,
    /// The installed files, relative to the install path.
    pub files: Vec<String>,
}

/// A dependency request that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRequest {
    /// The requested package id.
    pub name: String,
    /// The requested versions.
    pub range: VersionRange,
}

/// The result of restoring one dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Whether every package in the graph was resolved and installed.
    pub success: bool,
    /// The installed packages.
    pub libraries: Vec<LockFileLibrary>,
    /// The requests that could not be resolved.
    pub unresolved: Vec<UnresolvedRequest>,
}

/// Represents an error that prevented a restore from completing.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// No feed locations were given.
    #[error("no package sources were specified")]
    NoSources,
    /// A feed location could not be opened.
    #[error("invalid package source `{location}`: {error:#}")]
    InvalidSource {
        /// The feed location.
        location: String,
        /// The reason the location is invalid.
        #[source]
        error: anyhow::Error,
    },
    /// The requested package id is malformed.
    #[error("`{0}` is not a valid package id")]
    InvalidPackageId(String),
    /// Every feed failed while looking up a package.
    #[error("unable to load package information for `{0}` from any source")]
    SourcesUnavailable(String),
    /// A downloaded file does not match its published digest.
    #[error("file `{path}` of package `{id}` {version} failed its integrity check: expected sha256 `{expected}` but found `{actual}`")]
    Integrity {
        /// The package id.
        id: String,
        /// The package version.
        version: NuGetVersion,
        /// The file path within the package.
        path: String,
        /// The published digest.
        expected: String,
        /// The digest of the downloaded contents.
        actual: String,
    },
    /// A feed failed while downloading a resolved package.
    #[error(transparent)]
    Feed(#[from] FeedError),
    /// Writing to the output directory failed.
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

/// Trait for restore engines.
#[async_trait]
pub trait RestoreEngine: Send + Sync {
    /// Resolves the requested package and its dependencies and installs
    /// them into the output directory.
    ///
    /// Progress and diagnostics are delivered to the logger in order.
    async fn restore(
        &self,
        request: &RestoreRequest,
        logger: &dyn RestoreLogger,
    ) -> Result<Vec<RestoreOutcome>, RestoreError>;
}

/// A restore engine that resolves packages from feeds.
///
/// Dependencies are walked breadth first, so the request nearest to the
/// top-level package decides the version of an id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedRestoreEngine;

struct ResolvedPackage {
    feed: usize,
    fetched: FetchedManifest,
}

impl FeedRestoreEngine {
    /// Creates a new feed restore engine.
    pub fn new() -> Self {
        Self
    }

    fn open_feeds(request: &RestoreRequest) -> Result<Vec<Box<dyn Feed>>, RestoreError> {
        if request.sources.is_empty() {
            return Err(RestoreError::NoSources);
        }

        request
            .sources
            .iter()
            .map(|location| {
                open_feed(location, &request.config).map_err(|error| {
                    RestoreError::InvalidSource {
                        location: location.clone(),
                        error,
                    }
                })
            })
            .collect()
    }

    /// Gets every version of a package across the feeds, along with the
    /// index of the first feed that publishes it.
    async fn find_versions(
        feeds: &[Box<dyn Feed>],
        id: &str,
        logger: &dyn RestoreLogger,
    ) -> Result<Vec<(NuGetVersion, usize)>, RestoreError> {
        let mut candidates: Vec<(NuGetVersion, usize)> = Vec::new();
        let mut failures = 0;
        for (index, feed) in feeds.iter().enumerate() {
            match feed.versions(id).await {
                Ok(versions) => {
                    for version in versions {
                        if !candidates.iter().any(|(v, _)| *v == version) {
                            candidates.push((version, index));
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    logger.warning(
                        LogCode::NU1301,
                        format!(
                            "Failed to retrieve information about '{id}' from source '{name}': {e}",
                            name = feed.name()
                        ),
                    );
                }
            }
        }

        if failures == feeds.len() {
            return Err(RestoreError::SourcesUnavailable(id.to_string()));
        }

        Ok(candidates)
    }

    async fn install(
        feed: &dyn Feed,
        fetched: &FetchedManifest,
        output_dir: &Path,
        logger: &dyn RestoreLogger,
    ) -> Result<LockFileLibrary, RestoreError> {
        let manifest = &fetched.manifest;
        let id = id_segment(&manifest.id);
        let relative = format!("{id}/{version}", version = version_segment(&manifest.version));
        let install_dir = output_dir.join(&id).join(version_segment(&manifest.version));
        let marker = install_dir.join(format!("{id}.json"));

        let installed = tokio::fs::metadata(&marker).await;
        if installed.is_ok_and(|m| m.is_file()) {
            logger.verbose(format!(
                "Package {id} {version} is already installed at {dir}",
                id = manifest.id,
                version = manifest.version,
                dir = install_dir.display()
            ));
        } else {
            for file in &manifest.files {
                let contents = feed.file(&manifest.id, &manifest.version, &file.path).await?;
                if let Some(expected) = &file.sha256 {
                    let actual = hex::encode(Sha256::digest(&contents));
                    if !actual.eq_ignore_ascii_case(expected) {
                        return Err(RestoreError::Integrity {
                            id: manifest.id.clone(),
                            version: manifest.version.clone(),
                            path: file.path.clone(),
                            expected: expected.clone(),
                            actual,
                        });
                    }
                }

                let path = file
                    .path
                    .split('/')
                    .fold(install_dir.clone(), |path, segment| path.join(segment));
                write(&path, &contents).await?;
            }

            write(&marker, &fetched.bytes).await?;
            logger.information(format!(
                "Installed {id} {version} from {feed}",
                id = manifest.id,
                version = manifest.version,
                feed = feed.name()
            ));
        }

        Ok(LockFileLibrary {
            name: manifest.id.clone(),
            version: manifest.version.clone(),
            path: relative,
            files: manifest.files.iter().map(|f| f.path.clone()).collect(),
        })
    }
}

#[async_trait]
impl RestoreEngine for FeedRestoreEngine {
    async fn restore(
        &self,
        request: &RestoreRequest,
        logger: &dyn RestoreLogger,
    ) -> Result<Vec<RestoreOutcome>, RestoreError> {
        if !is_valid_id(&request.package_id) {
            return Err(RestoreError::InvalidPackageId(request.package_id.clone()));
        }

        let feeds = Self::open_feeds(request)?;
        let names = feeds
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ");

        tracing::info!(
            "restoring `{id}` {range} from {count} source(s)",
            id = request.package_id,
            range = request.range,
            count = feeds.len()
        );
        logger.information(format!(
            "Restoring packages for {id} {range}",
            id = request.package_id,
            range = request.range
        ));

        let mut queue: VecDeque<(String, VersionRange, Option<String>)> =
            VecDeque::from([(request.package_id.clone(), request.range.clone(), None)]);
        let mut resolved: IndexMap<String, ResolvedPackage> = IndexMap::new();
        let mut unresolved = Vec::new();
        let mut failed = HashSet::new();

        while let Some((id, range, parent)) = queue.pop_front() {
            let key = id_segment(&id);
            if let Some(package) = resolved.get(&key) {
                let manifest = &package.fetched.manifest;
                if !range.satisfies(&manifest.version) {
                    logger.warning(
                        LogCode::NU1608,
                        format!(
                            "Detected package version outside of dependency constraint: {parent} requires {id} ({range}) but version {resolved_id} {version} was resolved.",
                            parent = parent.as_deref().unwrap_or(&request.package_id),
                            resolved_id = manifest.id,
                            version = manifest.version
                        ),
                    );
                }
                continue;
            }
            if failed.contains(&key) {
                continue;
            }

            let candidates = Self::find_versions(&feeds, &id, logger).await?;
            let best = range
                .find_best_match(candidates.iter().map(|(v, _)| v))
                .and_then(|best| candidates.iter().find(|(v, _)| v == best));

            let Some((version, feed)) = best else {
                if candidates.is_empty() {
                    logger.error(
                        LogCode::NU1101,
                        format!(
                            "Unable to find package {id}. No packages exist with this id in source(s): {names}"
                        ),
                    );
                } else {
                    logger.error(
                        LogCode::NU1102,
                        format!(
                            "Unable to find package {id} with version ({range}). Found {count} version(s) in source(s): {names}",
                            count = candidates.len()
                        ),
                    );
                }
                failed.insert(key);
                unresolved.push(UnresolvedRequest { name: id, range });
                continue;
            };

            let fetched = feeds[*feed].manifest(&id, version).await?;
            logger.verbose(format!(
                "Resolved {id} {range} to {version} from {name}",
                name = feeds[*feed].name()
            ));

            for dependency in &fetched.manifest.dependencies {
                queue.push_back((
                    dependency.id.clone(),
                    dependency.range.clone(),
                    Some(fetched.manifest.id.clone()),
                ));
            }

            resolved.insert(
                key,
                ResolvedPackage {
                    feed: *feed,
                    fetched,
                },
            );
        }

        if !unresolved.is_empty() {
            tracing::info!(
                "restore failed with {count} unresolved request(s)",
                count = unresolved.len()
            );
            return Ok(vec![RestoreOutcome {
                success: false,
                libraries: Vec::new(),
                unresolved,
            }]);
        }

        let mut libraries = Vec::with_capacity(resolved.len());
        for package in resolved.values() {
            libraries.push(
                Self::install(
                    feeds[package.feed].as_ref(),
                    &package.fetched,
                    &request.output_dir,
                    logger,
                )
                .await?,
            );
        }

        tracing::info!("restored {count} package(s)", count = libraries.len());
        logger.minimal(format!(
            "Restored {count} package(s) to {dir}",
            count = libraries.len(),
            dir = request.output_dir.display()
        ));

        Ok(vec![RestoreOutcome {
            success: true,
            libraries,
            unresolved: Vec::new(),
        }])
    }
}

async fn write(path: &Path, contents: &Bytes) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!(
                "failed to create parent directory for `{path}`",
                path = path.display()
            )
        })?;
    }

    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write `{path}`", path = path.display()))
}
