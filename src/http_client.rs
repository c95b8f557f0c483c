//! A retrying HTTP client for outbound upstream calls.
//!
//! Used by the OAuth2 exchange (§4.4) and, prospectively, any other
//! upstream call that wants bounded retries. Backoff doubles the wait on
//! each attempt starting at `min_wait`, capped at `max_wait` — the same
//! shape as the Go source's `retryablehttp.Client` (`RetryMax`,
//! `RetryWaitMin`, `RetryWaitMax`), generalized here behind a trait so
//! tests can substitute a canned mock instead of hitting the network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::error::OAuthError;

/// Retry/backoff configuration, sourced from a provider's
/// `http_retry_attempts` / `http_retry_min_wait` / `http_retry_max_wait`
/// config fields (§6).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_millis(500),
            max_wait: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    fn backoff(&self, attempt: u32) -> Duration {
        let doubled = self.min_wait.as_millis().saturating_mul(1u128 << attempt.min(16));
        Duration::from_millis(doubled.min(self.max_wait.as_millis()) as u64)
    }
}

/// A plain HTTP result: status code and a bounded-read body.
#[derive(Debug, Clone)]
pub struct HttpResult {
    pub status: u16,
    pub body: String,
}

/// Maximum response body read, mirroring the bounded-read requirement on
/// OAuth error bodies (§4.4).
const MAX_RESPONSE_BYTES: usize = 1_048_576;

#[async_trait]
pub trait RetryingHttpClient: Send + Sync {
    async fn post_form(
        &self,
        url: Url,
        form: &HashMap<&str, &str>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResult, OAuthError>;
}

/// Default `reqwest`-backed implementation.
pub struct ReqwestRetryingClient {
    client: reqwest::Client,
    config: RetryConfig,
}

impl ReqwestRetryingClient {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RetryingHttpClient for ReqwestRetryingClient {
    async fn post_form(
        &self,
        url: Url,
        form: &HashMap<&str, &str>,
        headers: &[(&str, &str)],
    ) -> Result<HttpResult, OAuthError> {
        let mut last_err = None;
        for attempt in 0..self.config.max_attempts.max(1) {
            let mut request = self.client.post(url.clone()).form(form);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let bytes = response.bytes().await.unwrap_or_default();
                    let truncated = &bytes[..bytes.len().min(MAX_RESPONSE_BYTES)];
                    let body = String::from_utf8_lossy(truncated).into_owned();
                    return Ok(HttpResult { status, body });
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect();
                    last_err = Some(e);
                    if !retryable || attempt + 1 == self.config.max_attempts {
                        break;
                    }
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
            }
        }
        Err(OAuthError::Transport(last_err.expect("at least one attempt was made")))
    }
}

/// Canned-response mock for tests; counts how many times it was called
/// so tests can assert single-flight behavior (§8 property 9 / S2).
pub struct MockRetryingHttpClient {
    response: HttpResult,
    calls: AtomicUsize,
}

impl MockRetryingHttpClient {
    pub fn with_form_response(response: HttpResult) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetryingHttpClient for MockRetryingHttpClient {
    async fn post_form(
        &self,
        _url: Url,
        _form: &HashMap<&str, &str>,
        _headers: &[(&str, &str)],
    ) -> Result<HttpResult, OAuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            min_wait: Duration::from_millis(100),
            max_wait: Duration::from_millis(500),
        };
        assert_eq!(config.backoff(0), Duration::from_millis(100));
        assert_eq!(config.backoff(1), Duration::from_millis(200));
        assert_eq!(config.backoff(2), Duration::from_millis(400));
        assert_eq!(config.backoff(3), Duration::from_millis(500));
    }
}
