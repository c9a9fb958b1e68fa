//! GitHub REST API notification source.
//!
//! Issues `GET /notifications` (optionally `?participating=1`) with basic
//! authentication and maps the response to a [`FetchOutcome`].
//!
//! ## Conditional requests
//!
//! The `Last-Modified` value of the previous fresh response is sent back as
//! `If-Modified-Since`.  GitHub currently does not bump that header when a
//! notification is marked read, so a 304 is rare in practice; the header is
//! still sent, and nothing downstream depends on ever seeing a 304.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use url::Url;

use super::{decode_notifications, FetchOutcome, NotificationSource};
use crate::config::PollConfig;
use crate::error::PollError;

/// GitHub rejects API requests without a user agent.
const USER_AGENT: &str = concat!("gh-notify-tui/", env!("CARGO_PKG_VERSION"));

/// Response header carrying the server's minimum polling interval.
const POLL_INTERVAL_HEADER: &str = "x-poll-interval";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Polls `https://api.{domain}/notifications`.
pub struct GithubSource {
    client: reqwest::Client,
}

impl GithubSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Build the endpoint URL for `config`.
    pub fn endpoint(config: &PollConfig) -> Result<Url, PollError> {
        let base = match &config.api_url {
            Some(api_url) => api_url.trim_end_matches('/').to_string(),
            None => format!("https://api.{}", config.domain),
        };
        let mut url = Url::parse(&format!("{base}/notifications"))
            .map_err(|e| PollError::Config(format!("cannot build API url from `{base}`: {e}")))?;
        url.set_query(config.path_variant.api_query());
        Ok(url)
    }

    /// Map a complete response to an outcome.
    ///
    /// This is a pure function (no I/O) so the status/header/body rules can
    /// be tested without a server.
    pub fn classify(
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<FetchOutcome, PollError> {
        match status {
            StatusCode::OK => {
                let notifications =
                    decode_notifications(body).ok_or_else(|| PollError::Protocol {
                        status: status.as_u16(),
                        detail: "response body is not a JSON array".into(),
                    })?;
                Ok(FetchOutcome::Fresh {
                    notifications,
                    last_modified: header_str(headers, LAST_MODIFIED.as_str()),
                    min_interval: poll_interval(headers),
                })
            }
            StatusCode::NOT_MODIFIED => Ok(FetchOutcome::NotModified {
                min_interval: poll_interval(headers),
            }),
            StatusCode::UNAUTHORIZED => Err(PollError::Auth),
            other => Err(PollError::Protocol {
                status: other.as_u16(),
                detail: other
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            }),
        }
    }

    async fn try_fetch(
        &self,
        config: &PollConfig,
        revalidation: Option<&str>,
    ) -> Result<FetchOutcome, PollError> {
        config.validate()?;
        let url = Self::endpoint(config)?;

        let mut request = self
            .client
            .get(url)
            .basic_auth(&config.handle, Some(config.token.expose()));
        if let Some(token) = revalidation {
            request = request.header(IF_MODIFIED_SINCE, token);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Self::classify(status, &headers, &body)
    }
}

#[async_trait]
impl NotificationSource for GithubSource {
    fn name(&self) -> &str {
        "github"
    }

    async fn fetch(&self, config: &PollConfig, revalidation: Option<&str>) -> FetchOutcome {
        match self.try_fetch(config, revalidation).await {
            Ok(outcome) => {
                tracing::debug!(
                    event = "source.github.fetched",
                    domain = %config.domain,
                    outcome = %outcome.summary(),
                    min_interval = ?outcome.min_interval(),
                );
                outcome
            }
            Err(err) => {
                match &err {
                    PollError::Auth => tracing::warn!(
                        event = "source.github.unauthorized",
                        domain = %config.domain,
                        handle = %config.handle,
                        "{err}"
                    ),
                    PollError::Config(_) => tracing::warn!(
                        event = "source.github.invalid_config",
                        "{err}"
                    ),
                    _ => tracing::warn!(
                        event = "source.github.failed",
                        domain = %config.domain,
                        error = %err,
                    ),
                }
                err.into()
            }
        }
    }
}

/// Header lookup.  `HeaderMap` keys are case-insensitive.
fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// `X-Poll-Interval` in seconds; unparsable values are ignored.
fn poll_interval(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, POLL_INTERVAL_HEADER).and_then(|v| v.parse().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
