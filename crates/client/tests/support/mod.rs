#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::Router;
use nuget_client::{
    log::{LogCode, LogEvent, LogLevel, RestoreLogger},
    Config, NuGetVersion, RestoreRequest, VersionRange,
};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tokio::task::JoinHandle;
use tower_http::{services::ServeDir, validate_request::ValidateRequestHeaderLayer};

/// Writes packages into a feed directory using the flat feed layout.
pub struct FeedBuilder {
    root: PathBuf,
}

impl FeedBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn location(&self) -> String {
        self.root.display().to_string()
    }

    /// Publishes a package with correct digests for its files.
    pub fn publish(
        &self,
        id: &str,
        version: &str,
        dependencies: &[(&str, &str)],
        files: &[(&str, &str)],
    ) -> Result<()> {
        let digests: Vec<_> = files
            .iter()
            .map(|(_, contents)| Some(hex::encode(Sha256::digest(contents.as_bytes()))))
            .collect();
        self.publish_with_digests(id, version, dependencies, files, &digests)
    }

    /// Publishes a package, listing the given digests for its files.
    pub fn publish_with_digests(
        &self,
        id: &str,
        version: &str,
        dependencies: &[(&str, &str)],
        files: &[(&str, &str)],
        digests: &[Option<String>],
    ) -> Result<()> {
        let id_dir = self.root.join(id.to_lowercase());
        let version_dir = id_dir.join(version.to_lowercase());
        fs::create_dir_all(&version_dir)?;

        let index_path = id_dir.join("index.json");
        let mut versions: Vec<String> = if index_path.is_file() {
            let index: serde_json::Value = serde_json::from_str(&fs::read_to_string(&index_path)?)?;
            serde_json::from_value(index["versions"].clone())?
        } else {
            Vec::new()
        };
        versions.push(version.to_string());
        fs::write(&index_path, json!({ "versions": versions }).to_string())?;

        for (path, contents) in files {
            let path = version_dir.join(path);
            fs::create_dir_all(path.parent().context("file has no parent")?)?;
            fs::write(path, contents)?;
        }

        let manifest = json!({
            "id": id,
            "version": version,
            "dependencies": dependencies
                .iter()
                .map(|(id, range)| json!({ "id": id, "range": range }))
                .collect::<Vec<_>>(),
            "files": files
                .iter()
                .zip(digests)
                .map(|((path, _), sha256)| json!({ "path": path, "sha256": sha256 }))
                .collect::<Vec<_>>(),
        });
        fs::write(
            version_dir.join(format!("{id}.json", id = id.to_lowercase())),
            manifest.to_string(),
        )?;

        Ok(())
    }
}

/// A logger that records every event it receives.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingLogger {
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn codes(&self) -> Vec<LogCode> {
        self.events().iter().filter_map(|e| e.code).collect()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }
}

impl RestoreLogger for RecordingLogger {
    fn log(&self, event: LogEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn request(id: &str, range: &str, output_dir: &Path, sources: &[String]) -> RestoreRequest {
    RestoreRequest {
        package_id: id.to_string(),
        range: range.parse::<VersionRange>().unwrap(),
        output_dir: output_dir.to_path_buf(),
        sources: sources.to_vec(),
        config: Config::default(),
    }
}

pub fn version(s: &str) -> NuGetVersion {
    s.parse().unwrap()
}

/// A feed server running as a background task.
pub struct ServerInstance {
    task: JoinHandle<()>,
}

impl Drop for ServerInstance {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serves a feed directory over HTTP, optionally requiring a bearer token.
///
/// Returns the running server and the feed's base URL.
pub async fn serve_feed(root: &Path, token: Option<&str>) -> Result<(ServerInstance, String)> {
    let mut router = Router::new().nest_service("/v3/flat", ServeDir::new(root));
    if let Some(token) = token {
        router = router.layer(ValidateRequestHeaderLayer::bearer(token));
    }

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok((ServerInstance { task }, format!("http://{addr}/v3/flat")))
}
