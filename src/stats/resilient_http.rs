//! HTTP GET with bounded retries for the controller API.
//!
//! Requests run through [`seatbelt`] retry and timeout middleware. Every attempt takes a
//! slot from the shared [`Throttler`], so retries never exceed the configured request
//! concurrency. Rate-limit responses also pause the throttler, holding back every other
//! fetch until the controller is ready again.

use super::{Throttler, TrendError};
use core::time::Duration;
use layered::{Execute, Service, Stack};
use reqwest::{Response, StatusCode};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use std::sync::Arc;
use tick::Clock;
use url::Url;

const LOG_TARGET: &str = "      http";

/// Default timeout for a single API request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of retries on top of the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff between retries.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay applied to a rate-limit response that carries no `Retry-After` header.
const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

/// Longest error body excerpt kept in a transport error.
const MAX_ERROR_BODY_CHARS: usize = 200;

type Attempt = Result<Response, TrendError>;

/// How failed attempts are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: DEFAULT_BASE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let s = headers.get(reqwest::header::RETRY_AFTER).and_then(|h| h.to_str().ok())?;
    s.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Delay requested by a rate-limit response, or `None` for any other outcome.
fn rate_limit_delay(attempt: &Attempt) -> Option<Duration> {
    match attempt {
        Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
            Some(parse_retry_after(resp.headers()).unwrap_or(DEFAULT_RATE_LIMIT_DELAY))
        }
        _ => None,
    }
}

/// Classify an attempt for retry purposes, pausing the throttler on rate limits.
fn recovery_for(attempt: &Attempt, throttler: &Throttler) -> RecoveryInfo {
    if let Some(delay) = rate_limit_delay(attempt) {
        if throttler.pause_for(delay) {
            log::info!(target: LOG_TARGET, "rate limited by the controller, pausing requests for {}s", delay.as_secs());
        }
        return RecoveryInfo::retry().delay(delay);
    }

    match attempt {
        // network errors and timeouts
        Err(_) => RecoveryInfo::retry(),
        Ok(resp) if resp.status().is_server_error() => RecoveryInfo::retry(),
        _ => RecoveryInfo::never(),
    }
}

/// Send a GET request, retrying transient failures.
///
/// Network errors, timeouts and 5xx responses back off exponentially; 429 responses wait
/// for the `Retry-After` delay. Any non-success status that remains after the last
/// attempt, or that is not retryable, becomes [`TrendError::Transport`].
pub async fn resilient_get(client: &reqwest::Client, url: &Url, throttler: &Arc<Throttler>, policy: &RetryPolicy) -> Result<Response, TrendError> {
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name("stats_get");
    let redacted = redact(url);

    let recovery_throttler = Arc::clone(throttler);
    let attempt_throttler = Arc::clone(throttler);
    let client = client.clone();
    let timeout_url = redacted.clone();
    let retry_url = redacted;

    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(move |attempt: &Attempt, _| recovery_for(attempt, &recovery_throttler))
            .max_retry_attempts(policy.max_retries)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Exponential)
            .on_retry(move |_output, args| {
                log::debug!(
                    target: LOG_TARGET,
                    "retrying GET {retry_url} (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Timeout::layer("timeout", &context)
            .timeout_error(move |_| TrendError::Transport {
                url: timeout_url.clone(),
                detail: "request timed out".to_string(),
            })
            .timeout(policy.request_timeout),
        Execute::new(move |url: Url| {
            let client = client.clone();
            let throttler = Arc::clone(&attempt_throttler);
            async move {
                let _permit = throttler.acquire().await;
                client.get(url.clone()).send().await.map_err(|e| TrendError::Transport {
                    url: redact(&url),
                    detail: e.to_string(),
                })
            }
        }),
    )
        .into_service();

    let resp = service.execute(url.clone()).await?;
    into_outcome(url, resp).await
}

/// Turn a final response into an error unless it succeeded.
async fn into_outcome(url: &Url, resp: Response) -> Result<Response, TrendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    Err(TrendError::Transport {
        url: redact(url),
        detail: if excerpt.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {excerpt}")
        },
    })
}

/// URL without its query string, for messages.
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_parse_retry_after_missing_or_invalid() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        let _ = headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_redact_drops_query() {
        let url = Url::parse("https://api.example.com/api/v1/networks/N_1/wireless/latencyStats?t0=a&ssid=2").unwrap();
        assert_eq!(redact(&url), "https://api.example.com/api/v1/networks/N_1/wireless/latencyStats");
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.base_delay, DEFAULT_BASE_DELAY);
    }
}
