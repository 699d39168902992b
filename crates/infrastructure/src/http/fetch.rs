//! Bearer-authenticated JSON fetches using reqwest.
//!
//! Every provider adapter reads its userinfo endpoint through
//! [`AuthenticatedFetcher`]. One fetcher (and therefore one connection
//! pool) is shared by all adapters.

use std::time::Duration;

use reqwest::{Client, Response};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use idlink_application::{ContextDone, RequestContext};
use idlink_domain::{ConfigError, FetchError, OAuthToken};

/// Longest response body excerpt, in bytes, kept in a [`FetchError::Status`].
const MAX_BODY_EXCERPT: usize = 512;

/// Redirects followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// GETs JSON with a bearer token, honoring the caller's context.
#[derive(Debug, Clone)]
pub struct AuthenticatedFetcher {
    client: Client,
}

impl AuthenticatedFetcher {
    /// Creates a fetcher with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Creates a fetcher whose requests give up after `timeout`, whatever
    /// the caller's context allows.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let mut builder = Client::builder()
            .user_agent(concat!("idlink/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a fetcher around a preconfigured reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// GETs `url` with `token` as bearer credential and decodes the JSON body.
    ///
    /// The request is dropped as soon as `ctx` is cancelled or its
    /// deadline passes.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Transport`] when the request cannot be completed
    /// - [`FetchError::Status`] for a non-2xx response
    /// - [`FetchError::Decode`] when the body is not the expected JSON
    /// - [`FetchError::Cancelled`] / [`FetchError::DeadlineExceeded`] when
    ///   `ctx` finishes first
    #[tracing::instrument(level = "debug", skip_all, fields(url = %url))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        token: &OAuthToken,
        url: &str,
    ) -> Result<T, FetchError> {
        if let Some(done) = ctx.check() {
            return Err(Self::context_error(done, url));
        }

        let result = tokio::select! {
            biased;
            done = ctx.done() => Err(Self::context_error(done, url)),
            result = self.get_json(token, url) => result,
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, "authenticated fetch failed");
        }
        result
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &OAuthToken,
        url: &str,
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&token.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Self::map_error(&e, url))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "provider responded");

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: Self::body_excerpt(response).await,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, url))?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Reads at most [`MAX_BODY_EXCERPT`] bytes of an error response.
    ///
    /// The rest of the body is never buffered. A body that fails midway
    /// keeps whatever arrived before the failure.
    async fn body_excerpt(mut response: Response) -> String {
        let mut excerpt = Vec::with_capacity(MAX_BODY_EXCERPT);
        while excerpt.len() < MAX_BODY_EXCERPT {
            match response.chunk().await {
                Ok(Some(chunk)) => excerpt.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "error response body unreadable");
                    break;
                }
            }
        }
        excerpt.truncate(MAX_BODY_EXCERPT);
        String::from_utf8_lossy(&excerpt).into_owned()
    }

    fn context_error(done: ContextDone, url: &str) -> FetchError {
        match done {
            ContextDone::Cancelled => FetchError::Cancelled {
                url: url.to_string(),
            },
            ContextDone::DeadlineExceeded => FetchError::DeadlineExceeded {
                url: url.to_string(),
            },
        }
    }

    /// Maps reqwest errors to `FetchError::Transport`.
    fn map_error(error: &reqwest::Error, url: &str) -> FetchError {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else if error.is_redirect() {
            format!("too many redirects (max {MAX_REDIRECTS})")
        } else {
            error.to_string()
        };

        FetchError::Transport {
            url: url.to_string(),
            message,
        }
    }
}
