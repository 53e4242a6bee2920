//! GraphQL request model and HTTP request descriptors

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A GraphQL document plus its variables, serialized as the request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    /// Query or mutation document
    pub query: String,
    /// Variables referenced by the document (e.g. `$boardId`)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,
}

impl GraphqlRequest {
    /// Create a request without variables
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
        }
    }

    /// Bind a variable
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Name of the first operation keyword in the document, used for logging
    pub fn operation_kind(&self) -> &'static str {
        if self.query.trim_start().starts_with("mutation") {
            "mutation"
        } else {
            "query"
        }
    }
}

/// Everything needed to issue one HTTP call against the GraphQL endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Value,
    /// When false, non-2xx responses are handed back to the caller instead of
    /// being turned into errors
    pub error_on_status: bool,
}

impl RequestDescriptor {
    /// Look up a header value by case-insensitive name
    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Build the POST descriptor for a GraphQL request
pub fn build_request(api_key: &str, request: &GraphqlRequest) -> RequestDescriptor {
    let mut body = json!({ "query": request.query });
    if !request.variables.is_empty() {
        body["variables"] = Value::Object(request.variables.clone());
    }

    RequestDescriptor {
        method: "POST",
        headers: vec![
            ("Authorization".to_string(), format!("Bearer {}", api_key)),
            ("Content-Type".to_string(), "application/json".to_string()),
        ],
        body,
        error_on_status: false,
    }
}
