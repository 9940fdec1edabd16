//! Controller API client
//!
//! Minimal client for the three wireless statistics endpoints the trend pipeline reads.

use super::filter_set::{Band, FilterSet};
use super::resilient_http::{RetryPolicy, resilient_get};
use super::{Throttler, TimeWindow, TrendError};
use core::time::Duration;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Public endpoint of the controller's v1 API.
pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Read access to the controller's wireless statistics.
///
/// Each operation issues one remote call and yields the decoded JSON body; an empty
/// body is reported as JSON `null`. Implementations must not retry on their own beyond
/// what their transport does.
pub trait StatsSource: Sync {
    /// Per-traffic-class latency statistics for one window.
    fn latency_stats(
        &self,
        network_id: &str,
        window: TimeWindow,
        filters: &FilterSet,
    ) -> impl Future<Output = Result<Value, TrendError>> + Send;

    /// Connection success and failure counts for one window.
    fn connection_stats(
        &self,
        network_id: &str,
        window: TimeWindow,
        filters: &FilterSet,
    ) -> impl Future<Output = Result<Value, TrendError>> + Send;

    /// Client counts over `range` sampled every `resolution`, optionally for one band.
    fn client_count_history(
        &self,
        network_id: &str,
        range: TimeWindow,
        resolution: Duration,
        filters: &FilterSet,
        band: Option<Band>,
    ) -> impl Future<Output = Result<Value, TrendError>> + Send;
}

/// HTTP client for the controller API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    throttler: Arc<Throttler>,
    retry_policy: RetryPolicy,
}

impl Client {
    /// Create a client authenticating with `api_key` against `base_url`.
    pub fn new(api_key: &str, base_url: &str, throttler: Arc<Throttler>, retry_policy: RetryPolicy) -> Result<Self, TrendError> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let base_url = Url::parse(base_url).map_err(|e| TrendError::invalid_config(format!("invalid API base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TrendError::invalid_config(format!("API base URL '{base_url}' cannot hold a path")));
        }

        let mut auth_val = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| TrendError::invalid_config("API key contains characters that are not allowed in a header"))?;
        auth_val.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth_val);

        let http = reqwest::Client::builder()
            .user_agent(concat!("wlan-trends/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| TrendError::invalid_config(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            throttler,
            retry_policy,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/networks/{network_id}/wireless/{leaf}` with the given query.
    fn endpoint(&self, network_id: &str, leaf: &str, query: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        {
            // checked in `new` that the base URL can hold a path
            if let Ok(mut segments) = url.path_segments_mut() {
                let _ = segments.pop_if_empty().extend(["networks", network_id, "wireless", leaf]);
            }
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                let _ = pairs.append_pair(key, value);
            }
        }

        url
    }

    async fn get_json(&self, url: &Url, context: &str, window: TimeWindow) -> Result<Value, TrendError> {
        let resp = resilient_get(&self.http, url, &self.throttler, &self.retry_policy).await?;
        let body = resp.bytes().await.map_err(|e| TrendError::Transport {
            url: url.path().to_string(),
            detail: format!("reading response body: {e}"),
        })?;

        decode_body(&body).map_err(|e| TrendError::data_shape(context, window.start(), e))
    }
}

impl StatsSource for Client {
    async fn latency_stats(&self, network_id: &str, window: TimeWindow, filters: &FilterSet) -> Result<Value, TrendError> {
        let url = self.endpoint(network_id, "latencyStats", &window_query(window, None, filters.query_pairs()));
        self.get_json(&url, "latency", window).await
    }

    async fn connection_stats(&self, network_id: &str, window: TimeWindow, filters: &FilterSet) -> Result<Value, TrendError> {
        let url = self.endpoint(network_id, "connectionStats", &window_query(window, None, filters.query_pairs()));
        self.get_json(&url, "connection", window).await
    }

    async fn client_count_history(
        &self,
        network_id: &str,
        range: TimeWindow,
        resolution: Duration,
        filters: &FilterSet,
        band: Option<Band>,
    ) -> Result<Value, TrendError> {
        let mut extra = filters.client_count_pairs();
        if let Some(band) = band {
            extra.push(("band", band.as_query_value().to_string()));
        }

        let url = self.endpoint(network_id, "clientCountHistory", &window_query(range, Some(resolution), extra));
        self.get_json(&url, "client count", range).await
    }
}

fn window_query(window: TimeWindow, resolution: Option<Duration>, extra: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
    let mut query = vec![("t0", window.api_start()), ("t1", window.api_end())];
    if let Some(resolution) = resolution {
        query.push(("resolution", resolution.as_secs().to_string()));
    }
    query.extend(extra);
    query
}

/// Decode a response body, treating an empty body as `null`.
fn decode_body(body: &[u8]) -> serde_json::Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body)
}
