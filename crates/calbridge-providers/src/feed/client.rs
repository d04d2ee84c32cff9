//! Fetching the feed resource.

use reqwest::Client;
use tracing::debug;
use url::Url;

use super::config::FeedConfig;
use crate::error::{ClientError, ProviderError, ProviderResult};
use crate::provider::BoxFuture;

/// Status and body of a feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: u16,
    pub body: String,
}

impl FeedResponse {
    /// A `200 OK` response with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Retrieves the raw feed text.
///
/// Only transport failures are errors; status handling is left to the
/// provider.
pub trait FeedFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FeedResponse, ClientError>>;
}

/// [`FeedFetcher`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    /// Builds an HTTP client with the configured timeout and user agent.
    pub fn new(config: &FeedConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to create HTTP client: {e}"))
                    .with_source(e)
            })?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FeedResponse, ClientError>> {
        Box::pin(async move {
            debug!(url = %url, "Fetching feed");
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| ClientError::new("request failed").with_source(e))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| ClientError::new("failed to read response body").with_source(e))?;
            Ok(FeedResponse { status, body })
        })
    }
}
