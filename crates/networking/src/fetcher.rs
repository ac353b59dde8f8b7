//! Script body fetching.

use crate::loader::{LoadError, LoaderConfig};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches the body of a script resource.
#[async_trait]
pub trait ScriptFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, LoadError>;
}

/// HTTP fetcher backed by `reqwest`.
pub struct HttpScriptFetcher {
    inner: reqwest::Client,
}

impl HttpScriptFetcher {
    pub fn new() -> Result<Self, LoadError> {
        Self::with_config(&LoaderConfig::default())
    }

    pub fn with_config(config: &LoaderConfig) -> Result<Self, LoadError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout.min(config.timeout))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| LoadError::Network(e.to_string()))?;

        Ok(Self { inner })
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LoadError::Timeout
        } else if err.is_builder() {
            LoadError::InvalidUrl(err.to_string())
        } else {
            LoadError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ScriptFetcher for HttpScriptFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, LoadError> {
        debug!(url = %url, "Fetching script");

        let response = self.inner.get(url.clone()).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(LoadError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("HTTP error").to_string(),
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Default connect timeout, shorter than the request timeout.
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
