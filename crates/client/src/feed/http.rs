use super::{Feed, FeedError};
use crate::{config::Config, feed_url::FeedUrl};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

/// A feed served over HTTP(S).
pub struct HttpFeed {
    name: String,
    url: FeedUrl,
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpFeed {
    /// Creates a new HTTP feed.
    ///
    /// The request timeout and proxy are taken from the configuration; the
    /// token, if any, is sent as a bearer token with every request.
    pub fn new(
        name: impl Into<String>,
        url: FeedUrl,
        config: &Config,
        token: Option<String>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("nuget-cli/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy)
                    .with_context(|| format!("invalid proxy URL `{proxy}`"))?,
            );
        }

        Ok(Self {
            name: name.into(),
            url,
            client: builder.build().context("failed to create HTTP client")?,
            token,
        })
    }
}

#[async_trait]
impl Feed for HttpFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, path: &str) -> Result<Option<Bytes>, FeedError> {
        let url = self.url.join(path)?;
        tracing::debug!("fetching `{url}`");

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let request_error = |source| FeedError::Request {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                Ok(Some(response.bytes().await.map_err(request_error)?))
            }
            status => Err(FeedError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}
