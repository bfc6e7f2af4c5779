//! Package manifests served by feeds.

use crate::{range::VersionRange, version::NuGetVersion};
use anyhow::{bail, Context, Result};
use serde::Deserialize;

const MAX_ID_LEN: usize = 100;

/// A dependency declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageDependency {
    /// The id of the dependency.
    pub id: String,
    /// The acceptable versions of the dependency.
    pub range: VersionRange,
}

/// A file shipped in a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageFile {
    /// The path of the file, relative to the package root, using `/` separators.
    pub path: String,
    /// The hex-encoded SHA-256 digest of the file contents, if published.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// The manifest of one version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    /// The package id, as published.
    pub id: String,
    /// The package version.
    pub version: NuGetVersion,
    /// A human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// The direct dependencies of the package.
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
    /// The files of the package.
    #[serde(default)]
    pub files: Vec<PackageFile>,
}

impl PackageManifest {
    /// Parses and validates a manifest from its JSON representation.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: Self =
            serde_json::from_slice(bytes).context("failed to deserialize package manifest")?;

        if !is_valid_id(&manifest.id) {
            bail!("`{id}` is not a valid package id", id = manifest.id);
        }

        for dependency in &manifest.dependencies {
            if !is_valid_id(&dependency.id) {
                bail!(
                    "package `{id}` {version} depends on `{dependency}`, which is not a valid package id",
                    id = manifest.id,
                    version = manifest.version,
                    dependency = dependency.id
                );
            }
        }

        for file in &manifest.files {
            validate_file_path(&file.path).with_context(|| {
                format!(
                    "package `{id}` {version} lists an invalid file",
                    id = manifest.id,
                    version = manifest.version
                )
            })?;
        }

        Ok(manifest)
    }
}

/// Determines if a string is a valid package id.
///
/// An id is at most 100 characters: runs of ASCII letters, digits and `_`
/// separated by single `.` or `-` characters.
pub fn is_valid_id(id: &str) -> bool {
    id.len() <= MAX_ID_LEN
        && id.split(['.', '-']).all(|part| {
            !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        })
}

/// Ensures a package file path stays inside the package directory.
fn validate_file_path(path: &str) -> Result<()> {
    if path.contains('\\') {
        bail!("`{path}` is not a `/`-separated path");
    }

    for segment in path.split('/') {
        if matches!(segment, "" | "." | "..") || segment.contains(':') {
            bail!("`{path}` must be a relative path inside the package");
        }
    }

    Ok(())
}

/// Gets the lowercased path segment used for a package id.
pub fn id_segment(id: &str) -> String {
    id.to_lowercase()
}

/// Gets the lowercased path segment used for a package version.
pub fn version_segment(version: &NuGetVersion) -> String {
    version.to_string().to_lowercase()
}
