//! HTTP transport for the board GraphQL API

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::request::{GraphqlRequest, build_request};
use crate::config::ApiSettings;

/// Raw HTTP outcome of a GraphQL call
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as received
    pub body: String,
}

impl GraphqlResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the HTTP status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).with_context(|| {
            format!(
                "Response body is not valid JSON (HTTP {}): {}",
                self.status,
                truncate(&self.body, 200)
            )
        })
    }
}

/// Anything able to deliver a GraphQL request and hand back the raw response.
///
/// Implementations must not fail on non-2xx statuses; only transport-level
/// problems (connection, TLS, timeout, unreadable body) are errors.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn send(&self, request: &GraphqlRequest) -> Result<GraphqlResponse>;
}

/// reqwest-backed transport bound to one endpoint and API key
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl BoardClient {
    /// Build a client from API settings
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("board-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphqlTransport for BoardClient {
    async fn send(&self, request: &GraphqlRequest) -> Result<GraphqlResponse> {
        let descriptor = build_request(&self.api_key, request);

        log::debug!(
            "POST {} ({}) body={}",
            self.endpoint,
            request.operation_kind(),
            descriptor.body
        );

        let method = Method::from_bytes(descriptor.method.as_bytes())
            .with_context(|| format!("Invalid HTTP method: {}", descriptor.method))?;

        let mut builder = self.http.request(method, &self.endpoint);
        for (name, value) in &descriptor.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .json(&descriptor.body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?;

        if descriptor.error_on_status {
            response
                .error_for_status_ref()
                .with_context(|| format!("Request to {} returned an error status", self.endpoint))?;
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        log::debug!("HTTP {} response: {}", status, body);

        Ok(GraphqlResponse::new(status, body))
    }
}

/// Shorten long bodies for error messages
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status_classification() {
        assert!(GraphqlResponse::new(200, "{}").is_success());
        assert!(GraphqlResponse::new(204, "").is_success());
        assert!(!GraphqlResponse::new(401, "{}").is_success());
        assert!(!GraphqlResponse::new(500, "{}").is_success());
    }

    #[test]
    fn test_response_json_rejects_html() {
        let response = GraphqlResponse::new(502, "<html>Bad Gateway</html>");
        let err = response.json().unwrap_err();
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_board_client_keeps_endpoint() {
        let settings = ApiSettings {
            api_key: "key".to_string(),
            endpoint: "https://example.test/v2".to_string(),
            timeout_secs: 5,
        };
        let client = BoardClient::new(&settings).unwrap();
        assert_eq!(client.endpoint(), "https://example.test/v2");
    }
}
