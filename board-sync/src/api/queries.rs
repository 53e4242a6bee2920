//! GraphQL documents for the board API
//!
//! All user data travels through variables; documents are static.

use serde_json::Value;

use super::request::GraphqlRequest;

/// First page of items for one board
pub const ITEMS_FIRST_PAGE: &str = r#"query ($boardId: [ID!], $limit: Int!, $columnIds: [String!]) {
  boards(ids: $boardId) {
    id
    name
    items_page(limit: $limit) {
      cursor
      items {
        id
        name
        column_values(ids: $columnIds) {
          id
          text
        }
      }
    }
  }
}"#;

/// Follow-up page addressed by cursor
pub const ITEMS_NEXT_PAGE: &str = r#"query ($cursor: String!, $limit: Int!, $columnIds: [String!]) {
  next_items_page(cursor: $cursor, limit: $limit) {
    cursor
    items {
      id
      name
      column_values(ids: $columnIds) {
        id
        text
      }
    }
  }
}"#;

/// Overwrite several column values of an existing item
pub const CHANGE_COLUMN_VALUES: &str = r#"mutation ($itemId: ID!, $boardId: ID!, $columnValues: JSON!) {
  change_multiple_column_values(item_id: $itemId, board_id: $boardId, column_values: $columnValues) {
    id
  }
}"#;

/// Create an item with a name and initial column values
pub const CREATE_ITEM: &str = r#"mutation ($boardId: ID!, $itemName: String!, $columnValues: JSON) {
  create_item(board_id: $boardId, item_name: $itemName, column_values: $columnValues) {
    id
  }
}"#;

/// Response field carrying the mutated item for each mutation document
pub const CHANGE_COLUMN_VALUES_FIELD: &str = "change_multiple_column_values";
pub const CREATE_ITEM_FIELD: &str = "create_item";

fn column_ids_value(column_ids: &[String]) -> Value {
    Value::Array(column_ids.iter().cloned().map(Value::String).collect())
}

pub fn items_first_page(board_id: &str, limit: u32, column_ids: &[String]) -> GraphqlRequest {
    GraphqlRequest::new(ITEMS_FIRST_PAGE)
        .variable("boardId", Value::Array(vec![Value::String(board_id.to_string())]))
        .variable("limit", limit)
        .variable("columnIds", column_ids_value(column_ids))
}

pub fn items_next_page(cursor: &str, limit: u32, column_ids: &[String]) -> GraphqlRequest {
    GraphqlRequest::new(ITEMS_NEXT_PAGE)
        .variable("cursor", cursor)
        .variable("limit", limit)
        .variable("columnIds", column_ids_value(column_ids))
}

/// `column_values` is the JSON scalar: a string holding encoded JSON
pub fn change_column_values(item_id: &str, board_id: &str, column_values: &str) -> GraphqlRequest {
    GraphqlRequest::new(CHANGE_COLUMN_VALUES)
        .variable("itemId", item_id)
        .variable("boardId", board_id)
        .variable("columnValues", column_values)
}

pub fn create_item(board_id: &str, item_name: &str, column_values: &str) -> GraphqlRequest {
    GraphqlRequest::new(CREATE_ITEM)
        .variable("boardId", board_id)
        .variable("itemName", item_name)
        .variable("columnValues", column_values)
}
