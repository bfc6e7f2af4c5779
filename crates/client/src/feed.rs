//! A module for package feed implementations.
//!
//! Every feed uses the same layout, relative to its root:
//!
//! * `<id>/index.json` lists the published versions of a package
//! * `<id>/<version>/<id>.json` is the manifest of one version
//! * `<id>/<version>/<path>` holds the files of that version
//!
//! Ids and versions are lowercased in paths.

use crate::{
    config::Config,
    feed_url::{is_http_location, FeedUrl},
    manifest::{id_segment, version_segment, PackageManifest},
    version::NuGetVersion,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

mod http;
mod local;
pub use http::*;
pub use local::*;

/// Represents an error from a package feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Failed to send a request to an HTTP feed.
    #[error("failed to send request to `{url}`: {source}")]
    Request {
        /// The requested URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// An HTTP feed responded with an unexpected status code.
    #[error("`{url}` responded with status code {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The status code of the response.
        status: StatusCode,
    },
    /// A local feed directory does not exist.
    #[error("feed directory `{path}` does not exist", path = .0.display())]
    MissingDirectory(PathBuf),
    /// A document the feed index refers to is missing.
    #[error("`{0}` was not found on feed `{1}`")]
    NotFound(String, String),
    /// A document served by the feed could not be parsed.
    #[error("`{location}` on feed `{feed}` is invalid: {source:#}")]
    Invalid {
        /// The feed name.
        feed: String,
        /// The path of the document within the feed.
        location: String,
        /// The parse error.
        #[source]
        source: anyhow::Error,
    },
    /// An error was encountered in the client.
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

/// A manifest along with the bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    /// The parsed manifest.
    pub manifest: PackageManifest,
    /// The raw manifest document.
    pub bytes: Bytes,
}

#[derive(Deserialize)]
struct PackageIndex {
    versions: Vec<String>,
}

/// Trait for package feeds.
///
/// Implementations only provide raw document access; the provided methods
/// interpret the feed layout.
#[async_trait]
pub trait Feed: Send + Sync {
    /// Gets the name of the feed used in messages.
    fn name(&self) -> &str;

    /// Fetches the document at the given `/`-separated path relative to the feed root.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    async fn fetch(&self, path: &str) -> Result<Option<Bytes>, FeedError>;

    /// Lists the published versions of a package.
    ///
    /// Returns an empty list if the feed does not know the package.
    async fn versions(&self, id: &str) -> Result<Vec<NuGetVersion>, FeedError> {
        let location = format!("{id}/index.json", id = id_segment(id));
        let Some(bytes) = self.fetch(&location).await? else {
            return Ok(Vec::new());
        };

        let index: PackageIndex =
            serde_json::from_slice(&bytes).map_err(|e| FeedError::Invalid {
                feed: self.name().to_string(),
                location: location.clone(),
                source: anyhow!(e),
            })?;

        Ok(index
            .versions
            .iter()
            .filter_map(|v| match NuGetVersion::parse(v) {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::warn!(
                        "ignoring entry in `{location}` of feed `{name}`: {e}",
                        name = self.name()
                    );
                    None
                }
            })
            .collect())
    }

    /// Fetches the manifest of a package version.
    async fn manifest(
        &self,
        id: &str,
        version: &NuGetVersion,
    ) -> Result<FetchedManifest, FeedError> {
        let id = id_segment(id);
        let location = format!("{id}/{version}/{id}.json", version = version_segment(version));
        let bytes = self
            .fetch(&location)
            .await?
            .ok_or_else(|| FeedError::NotFound(location.clone(), self.name().to_string()))?;

        let invalid = |source| FeedError::Invalid {
            feed: self.name().to_string(),
            location: location.clone(),
            source,
        };
        let manifest = PackageManifest::from_slice(&bytes).map_err(invalid)?;
        if id_segment(&manifest.id) != id || &manifest.version != version {
            return Err(invalid(anyhow!(
                "manifest describes `{manifest_id}` {manifest_version}",
                manifest_id = manifest.id,
                manifest_version = manifest.version
            )));
        }

        Ok(FetchedManifest { manifest, bytes })
    }

    /// Fetches a file of a package version.
    async fn file(&self, id: &str, version: &NuGetVersion, path: &str) -> Result<Bytes, FeedError> {
        let location = format!(
            "{id}/{version}/{path}",
            id = id_segment(id),
            version = version_segment(version)
        );
        self.fetch(&location)
            .await?
            .ok_or_else(|| FeedError::NotFound(location, self.name().to_string()))
    }
}

/// Opens the feed at the given location.
///
/// `http://` and `https://` locations are HTTP feeds; anything else, including
/// `file://` URLs, is a local directory.
pub fn open_feed(location: &str, config: &Config) -> Result<Box<dyn Feed>> {
    let name = config
        .source(location)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| location.to_string());

    if is_http_location(location) {
        let url = FeedUrl::new(location)?;
        let token = config.source(location).and_then(|s| s.token.clone());
        return Ok(Box::new(HttpFeed::new(name, url, config, token)?));
    }

    let root = if location.starts_with("file://") {
        Url::parse(location)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .with_context(|| format!("`{location}` is not a valid file URL"))?
    } else {
        PathBuf::from(location)
    };

    Ok(Box::new(LocalFeed::new(name, root)))
}
