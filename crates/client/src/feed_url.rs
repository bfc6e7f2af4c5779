use anyhow::{anyhow, bail, Context, Result};
use url::{Host, Url};

/// The base URL of an HTTP package feed.
// Note: The inner Url always has a scheme and host.
#[derive(Clone, PartialEq, Eq)]
pub struct FeedUrl(Url);

impl FeedUrl {
    /// Parses and validates the given URL into a [`FeedUrl`].
    ///
    /// Plain HTTP is only accepted for loopback hosts.
    pub fn new(url: &str) -> Result<Self> {
        let mut url = Url::parse(url).context("failed to parse feed URL")?;

        match url.scheme() {
            "https" => {}
            "http" => {
                match url
                    .host()
                    .ok_or_else(|| anyhow!("expected a host for feed URL `{url}`"))?
                {
                    Host::Domain(d) => {
                        if d != "localhost" {
                            bail!("an unsecured connection is not permitted to feed `{d}`");
                        }
                    }
                    Host::Ipv4(ip) => {
                        if !ip.is_loopback() {
                            bail!("an unsecured connection is not permitted to address `{ip}`");
                        }
                    }
                    Host::Ipv6(ip) => {
                        if !ip.is_loopback() {
                            bail!("an unsecured connection is not permitted to address `{ip}`");
                        }
                    }
                }
            }
            _ => bail!("expected a HTTPS scheme for feed URL `{url}`"),
        }

        if url.cannot_be_a_base() {
            bail!("feed URL `{url}` cannot be used as a base URL");
        }

        // Normalize by appending a '/' so relative joins stay under the feed
        if !url.path().ends_with('/') {
            url.set_path(&(url.path().to_string() + "/"));
        }

        Ok(Self(url))
    }

    /// Joins a relative path onto the feed's base URL.
    pub(crate) fn join(&self, path: &str) -> Result<Url> {
        self.0
            .join(path)
            .with_context(|| format!("failed to join `{path}` onto feed URL `{url}`", url = self.0))
    }
}

/// Determines if a source location names an HTTP feed rather than a directory.
pub fn is_http_location(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl std::str::FromStr for FeedUrl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for FeedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for FeedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FeedUrl").field(&self.0.as_str()).finish()
    }
}
