//! GitHub REST client with retries and pagination.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::FetchError;
use crate::retry::RetryStrategy;

/// Public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitHub REST API version header value.
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Media type for GitHub REST responses.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// User agent for API requests.
const USER_AGENT: &str = concat!("ghameter/", env!("CARGO_PKG_VERSION"));

/// Most pages followed for a single listing.
const MAX_PAGES: usize = 1000;

/// Authenticated GitHub client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    inner: Client,
    base_url: Url,
    retry_strategy: RetryStrategy,
}

impl GitHubClient {
    /// Creates a client for the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    /// Creates a client for a custom API root (GitHub Enterprise, tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or token is invalid, or the HTTP client
    /// cannot be built.
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self, FetchError> {
        Self::build(base_url, token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    fn build(base_url: &str, token: &str, timeout: Duration) -> Result<Self, FetchError> {
        // Url::join drops the last segment unless the base ends in '/'.
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| FetchError::AuthenticationFailed(format!("Invalid token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(header::AUTHORIZATION, auth);

        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner,
            base_url,
            retry_strategy: RetryStrategy::default(),
        })
    }

    /// Sets the retry strategy for this client.
    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an API path (without leading slash) against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Fetches one JSON document.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decoding error.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.endpoint(path)?;
        let response = self.send(url).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches every page of a paginated endpoint, following `rel="next"`.
    ///
    /// `items` extracts the entries from each decoded page.
    ///
    /// # Errors
    ///
    /// Returns the first transport, status, or decoding error; nothing
    /// collected before the failure is returned. A `next` link that points
    /// at an already fetched page, or more than `MAX_PAGES` pages, is
    /// `FetchError::InvalidResponse`.
    pub async fn get_all_pages<P, T, F>(&self, path: &str, items: F) -> Result<Vec<T>, FetchError>
    where
        P: DeserializeOwned,
        F: Fn(P) -> Vec<T>,
    {
        let mut next = Some(self.endpoint(path)?);
        let mut visited = HashSet::new();
        let mut collected = Vec::new();

        while let Some(url) = next.take() {
            if visited.len() >= MAX_PAGES {
                return Err(FetchError::InvalidResponse(format!(
                    "{path} has more than {MAX_PAGES} pages"
                )));
            }
            if !visited.insert(url.clone()) {
                return Err(FetchError::InvalidResponse(format!(
                    "pagination of {path} loops back to {url}"
                )));
            }

            let response = self.send(url).await?;
            next = next_link(response.headers()).map(|l| Url::parse(&l)).transpose()?;
            let body = response.text().await?;
            let page: P = serde_json::from_str(&body)?;
            collected.extend(items(page));
        }

        debug!(path = %path, pages = visited.len(), items = collected.len(), "Fetched all pages");
        Ok(collected)
    }

    /// Sends a GET request, retrying transient failures.
    #[instrument(skip(self), fields(url = %url))]
    async fn send(&self, url: Url) -> Result<Response, FetchError> {
        let mut attempts = 0;
        let max_attempts = self.retry_strategy.max_attempts.max(1);

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Making GET request");

            let response = match self.inner.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    if attempts < max_attempts && self.retry_strategy.should_retry(&e) {
                        let delay = self.retry_strategy.delay_for_attempt(attempts);
                        warn!(
                            error = %e,
                            delay_secs = delay.as_secs(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.into());
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if is_rate_limited(&response) {
                let retry_after = retry_after_secs(response.headers());
                if attempts < max_attempts {
                    let delay = self
                        .retry_strategy
                        .delay_for_retry_after(retry_after, attempts);
                    warn!(delay_secs = delay.as_secs(), "Rate limited, waiting before retry");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(FetchError::RateLimited { retry_after });
            }

            if self.retry_strategy.should_retry_status(status) && attempts < max_attempts {
                let delay = self.retry_strategy.delay_for_attempt(attempts);
                warn!(status = %status, delay_secs = delay.as_secs(), "Server error, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, url.path(), &body));
        }
    }
}

/// Maps a non-success status to an error.
fn status_error(status: StatusCode, path: &str, body: &str) -> FetchError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED => {
            FetchError::AuthenticationFailed(format!("Invalid or expired token: {message}"))
        }
        StatusCode::FORBIDDEN => {
            FetchError::AuthenticationFailed(format!("Access denied to {path}: {message}"))
        }
        StatusCode::NOT_FOUND => FetchError::NotFound(path.to_string()),
        _ => FetchError::InvalidResponse(format!("HTTP {status} from {path}: {message}")),
    }
}

/// 429, or a 403 that GitHub marks as a rate limit.
fn is_rate_limited(response: &Response) -> bool {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    if status != StatusCode::FORBIDDEN {
        return false;
    }
    let headers = response.headers();
    headers.contains_key(header::RETRY_AFTER)
        || headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0")
}

/// Reads `Retry-After` in seconds.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Extracts the `rel="next"` target from a `Link` header.
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(header::LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == r#"rel="next""# || p == "rel=next"
        });
        if is_next {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        } else {
            None
        }
    })
}
