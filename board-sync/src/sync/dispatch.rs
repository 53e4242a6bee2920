//! Create and update mutations for a single row

use anyhow::Result;
use serde_json::Value;

use super::fetch::graphql_errors;
use super::row::ColumnValuesPayload;
use crate::api::client::truncate;
use crate::api::{GraphqlResponse, GraphqlTransport, queries};

/// Outcome of one mutation as seen on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResponse {
    pub status: u16,
    pub body: String,
    /// Id of the created or updated item, when the API returned one
    pub item_id: Option<String>,
    /// GraphQL error messages, plus a note when the body was not JSON
    pub errors: Vec<String>,
}

impl MutationResponse {
    fn from_response(response: GraphqlResponse, field: &str) -> Self {
        let (item_id, errors) = match serde_json::from_str::<Value>(&response.body) {
            Ok(json) => {
                let item_id = json
                    .pointer(&format!("/data/{}/id", field))
                    .and_then(|id| match id {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    });
                (item_id, graphql_errors(&json))
            }
            Err(e) => (None, vec![format!("Response body is not JSON: {}", e)]),
        };

        Self {
            status: response.status,
            body: response.body,
            item_id,
            errors,
        }
    }

    /// Why the mutation counts as failed, or `None` on success
    pub fn failure_reason(&self) -> Option<String> {
        if !self.errors.is_empty() {
            Some(self.errors.join("; "))
        } else if !(200..300).contains(&self.status) {
            Some(format!("HTTP {}: {}", self.status, truncate(&self.body, 200)))
        } else if self.item_id.is_none() {
            Some("Response did not include an item id".to_string())
        } else {
            None
        }
    }
}

/// Issues mutations against one board
pub struct MutationDispatcher<'a> {
    transport: &'a dyn GraphqlTransport,
    board_id: &'a str,
}

impl<'a> MutationDispatcher<'a> {
    pub fn new(transport: &'a dyn GraphqlTransport, board_id: &'a str) -> Self {
        Self {
            transport,
            board_id,
        }
    }

    /// Overwrite the column values of an existing item
    pub async fn update(
        &self,
        item_id: &str,
        payload: &ColumnValuesPayload,
    ) -> Result<MutationResponse> {
        let column_values = payload.to_json()?;
        let request = queries::change_column_values(item_id, self.board_id, &column_values);

        let response = self.transport.send(&request).await?;
        log::info!("Updated: {} | Response: {}", item_id, response.body);

        Ok(MutationResponse::from_response(
            response,
            queries::CHANGE_COLUMN_VALUES_FIELD,
        ))
    }

    /// Create a new item with a name and column values
    pub async fn create(
        &self,
        item_name: &str,
        payload: &ColumnValuesPayload,
    ) -> Result<MutationResponse> {
        let column_values = payload.to_json()?;
        let request = queries::create_item(self.board_id, item_name, &column_values);

        let response = self.transport.send(&request).await?;
        log::info!("Created: {} | Response: {}", item_name, response.body);

        Ok(MutationResponse::from_response(
            response,
            queries::CREATE_ITEM_FIELD,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::RecordingTransport;
    use crate::config::ColumnLayout;
    use crate::sync::row::{RowFields, SpreadsheetRow};
    use serde_json::json;

    fn payload() -> ColumnValuesPayload {
        let row = SpreadsheetRow::new(2, ["", "Alice@Example.com ", "Manager", "", "Active"]);
        ColumnValuesPayload::from_fields(&RowFields::from_row(&row), &ColumnLayout::default())
    }

    #[tokio::test]
    async fn test_update_sends_variables() {
        let transport = RecordingTransport::new().reply_json(
            200,
            json!({ "data": { "change_multiple_column_values": { "id": "999" } } }),
        );
        let dispatcher = MutationDispatcher::new(&transport, "42");

        let response = dispatcher.update("999", &payload()).await.unwrap();
        assert!(response.failure_reason().is_none());
        assert_eq!(response.item_id.as_deref(), Some("999"));

        let request = &transport.requests()[0];
        assert!(request.query.contains("change_multiple_column_values"));
        assert_eq!(request.variables["itemId"], json!("999"));
        assert_eq!(request.variables["boardId"], json!("42"));

        let sent: Value =
            serde_json::from_str(request.variables["columnValues"].as_str().unwrap()).unwrap();
        assert_eq!(sent["column_04"], " ");
    }

    #[tokio::test]
    async fn test_create_sends_name() {
        let transport = RecordingTransport::new()
            .reply_json(200, json!({ "data": { "create_item": { "id": 12345 } } }));
        let dispatcher = MutationDispatcher::new(&transport, "42");

        let response = dispatcher.create("N/A", &payload()).await.unwrap();
        assert_eq!(response.item_id.as_deref(), Some("12345"));

        let request = &transport.requests()[0];
        assert!(request.query.contains("create_item"));
        assert_eq!(request.variables["itemName"], json!("N/A"));
    }

    #[tokio::test]
    async fn test_graphql_error_is_failure() {
        let transport = RecordingTransport::new().reply_json(
            200,
            json!({ "errors": [{ "message": "ColumnValueException" }], "data": { "create_item": null } }),
        );
        let dispatcher = MutationDispatcher::new(&transport, "42");

        let response = dispatcher.create("x", &payload()).await.unwrap();
                assert_eq!(response.failure_reason().as_deref(), Some("ColumnValueException"));
    }

    #[tokio::test]
    async fn test_http_error_is_failure() {
        let transport = RecordingTransport::new().reply_raw(401, r#"{"error_message":"Not Authenticated"}"#);
        let dispatcher = MutationDispatcher::new(&transport, "42");

        let response = dispatcher.update("1", &payload()).await.unwrap();
                assert!(response.failure_reason().unwrap().starts_with("HTTP 401"));
    }

    #[test]
    fn test_missing_id_is_failure() {
        let response = MutationResponse::from_response(
            GraphqlResponse::new(200, r#"{"data":{}}"#),
            queries::CREATE_ITEM_FIELD,
        );
        assert_eq!(
            response.failure_reason().as_deref(),
            Some("Response did not include an item id")
        );
    }
}
