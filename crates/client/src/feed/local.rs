use super::{Feed, FeedError};
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// A feed backed by a directory on the local file system.
pub struct LocalFeed {
    name: String,
    root: PathBuf,
}

impl LocalFeed {
    /// Creates a new local feed rooted at the given directory.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

#[async_trait]
impl Feed for LocalFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &str) -> Result<Option<Bytes>, FeedError> {
        let root = tokio::fs::metadata(&self.root).await;
        if !root.is_ok_and(|m| m.is_dir()) {
            return Err(FeedError::MissingDirectory(self.root.clone()));
        }

        let path = path
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment));
        let metadata = tokio::fs::metadata(&path).await;
        if !metadata.is_ok_and(|m| m.is_file()) {
            return Ok(None);
        }

        tracing::debug!("reading `{path}`", path = path.display());
        let contents = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read `{path}`", path = path.display()))?;

        Ok(Some(Bytes::from(contents)))
    }
}
