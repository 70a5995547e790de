// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Network fetch collaborator used by the icon cache.
///
/// The cache only needs "URL in, status and body text out", so the seam is a
/// small object-safe trait. [`HttpFetcher`] is the production implementation
/// backed by `reqwest`; tests substitute counting doubles.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::{
    error::Error,
    retry::{Classify, ErrorClass},
};

/// Default deadline for a single HTTP request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10,);

/// Status code and body text returned by a [`Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct FetchResponse
{
    /// HTTP status code of the response.
    pub status: u16,
    /// Response body decoded as text.
    pub body:   String,
}

impl FetchResponse
{
    /// Builds a `200 OK` response carrying `body`.
    pub fn ok<B: Into<String,>,>(body: B,) -> Self
    {
        Self {
            status: 200, body: body.into(),
        }
    }

    /// Builds a bodiless response with the provided status.
    pub fn status(status: u16,) -> Self
    {
        Self {
            status, body: String::new(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_ok(&self,) -> bool
    {
        (200..300).contains(&self.status,)
    }
}

/// Failure of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, masterror::Error,)]
pub enum FetchError
{
    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status}")]
    Status
    {
        /// Status code returned by the server.
        status: u16,
    },
    /// The attempt exceeded its deadline.
    #[error("request timed out")]
    Timeout,
    /// The connection failed or was interrupted.
    #[error("transport failure: {message}")]
    Transport
    {
        /// Description reported by the HTTP stack.
        message: String,
    },
    /// The URL was unusable or the body could not be decoded.
    #[error("invalid request or payload: {message}")]
    Invalid
    {
        /// Description of the parsing failure.
        message: String,
    },
}

impl Classify for FetchError
{
    fn class(&self,) -> ErrorClass
    {
        match self {
            Self::Status {
                status,
            } => ErrorClass::from_status(*status,),
            Self::Timeout => ErrorClass::Timeout,
            Self::Transport {
                ..
            } => ErrorClass::Transport,
            Self::Invalid {
                ..
            } => ErrorClass::Parse,
        }
    }
}

/// Asynchronous capability that retrieves the text behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync
{
    /// Fetches `url`, returning the status and body of the response.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// failures that produced no response at all are reported as
    /// [`FetchError`].
    async fn fetch(&self, url: &str,) -> Result<FetchResponse, FetchError,>;
}

/// HTTP fetcher backed by a shared `reqwest` client.
///
/// Relative icon paths (for example `/dist/pds-icons/svg/archive.svg`) are
/// joined onto an optional base URL before the request is sent.
#[derive(Debug, Clone,)]
pub struct HttpFetcher
{
    client:   Client,
    base_url: Option<Url,>,
}

impl HttpFetcher
{
    /// Creates a fetcher using [`DEFAULT_FETCH_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, Error,>
    {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT,)
    }

    /// Creates a fetcher whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the HTTP client cannot be constructed.
    pub fn with_timeout(timeout: Duration,) -> Result<Self, Error,>
    {
        let client = Client::builder()
            .timeout(timeout,)
            .build()
            .map_err(|e| Error::service(format!("failed to build HTTP client: {e}"),),)?;

        Ok(Self {
            client, base_url: None,
        },)
    }

    /// Resolves relative icon URLs against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `base` is not an absolute URL.
    pub fn with_base_url(mut self, base: &str,) -> Result<Self, Error,>
    {
        let parsed = Url::parse(base,)
            .map_err(|e| Error::validation(format!("invalid base URL '{base}': {e}"),),)?;
        self.base_url = Some(parsed,);
        Ok(self,)
    }

    fn absolute_url(&self, url: &str,) -> Result<Url, FetchError,>
    {
        match Url::parse(url,) {
            Ok(parsed,) => Ok(parsed,),
            Err(error,) => match &self.base_url {
                Some(base,) => base.join(url,).map_err(|e| FetchError::Invalid {
                    message: format!("cannot join '{url}' onto '{base}': {e}"),
                },),
                None => Err(FetchError::Invalid {
                    message: format!("'{url}' is not an absolute URL: {error}"),
                },),
            },
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher
{
    async fn fetch(&self, url: &str,) -> Result<FetchResponse, FetchError,>
    {
        let target = self.absolute_url(url,)?;
        debug!("GET {}", target);

        let response = self.client.get(target,).send().await.map_err(map_reqwest_error,)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error,)?;

        Ok(FetchResponse {
            status, body,
        },)
    }
}

fn map_reqwest_error(error: reqwest::Error,) -> FetchError
{
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_builder() || error.is_decode() {
        FetchError::Invalid {
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            message: error.to_string(),
        }
    }
}
