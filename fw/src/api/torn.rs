//! Torn API client implementation
//!
//! Implements the TornApi trait over HTTP with reqwest. Requests are plain
//! GETs of `{base}/{type}/{id}?selections=..&key=..`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ApiError, ApiRequest, TornApi, reject_on_error_field};
use crate::config::ApiConfig;

/// HTTP client for the Torn API
pub struct TornClient {
    base_url: String,
    http: Client,
}

impl TornClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, request: &ApiRequest) -> String {
        format!("{}/{}", self.base_url, request.path())
    }
}

/// The request URL carries the key in its query string
fn strip_url(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.without_url())
}

#[async_trait]
impl TornApi for TornClient {
    async fn fetch(&self, request: &ApiRequest, api_key: &str) -> Result<Value, ApiError> {
        // Never log the key
        let url = self.url(request);
        debug!(%url, selections = %request.selections, "fetch: called");

        if api_key.trim().is_empty() {
            debug!("fetch: empty key, refusing to send");
            return Err(ApiError::MissingKey);
        }

        let response = self
            .http
            .get(&url)
            .query(&[("selections", request.selections.as_str()), ("key", api_key)])
            .send()
            .await
            .map_err(strip_url)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "fetch: HTTP error");
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        let text = response.text().await.map_err(strip_url)?;
        let body: Value = serde_json::from_str(&text)?;
        if !body.is_object() {
            debug!("fetch: body is not a JSON object");
            return Err(ApiError::InvalidResponse(format!("expected JSON object, got: {}", body)));
        }

        debug!("fetch: success");
        reject_on_error_field(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerId;

    #[test]
    fn test_url_strips_trailing_slash() {
        let client = TornClient::from_config(&ApiConfig {
            base_url: "http://localhost:9999/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url(&ApiRequest::user(PlayerId(7))), "http://localhost:9999/user/7");
        assert_eq!(client.url(&ApiRequest::faction(None)), "http://localhost:9999/faction/");
    }

    #[tokio::test]
    async fn test_empty_key_never_sends() {
        // Unroutable base; an attempted request would fail with a network error instead
        let client = TornClient::from_config(&ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();
        let result = client.fetch(&ApiRequest::user(PlayerId(7)), "").await;
        assert!(matches!(result, Err(ApiError::MissingKey)));
    }

    #[tokio::test]
    async fn test_network_error_hides_key() {
        let client = TornClient::from_config(&ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();
        let err = client
            .fetch(&ApiRequest::user(PlayerId(7)), "SECRETKEY123")
            .await
            .expect_err("nothing listens on port 1");

        assert!(matches!(err, ApiError::Network(_)));
        let shown = err.to_string();
        assert!(!shown.contains("SECRETKEY123"), "key leaked: {}", shown);
        assert!(!format!("{:?}", err).contains("SECRETKEY123"));
    }
}
