//! Decide and dispatch create/update per spreadsheet row

use serde::Serialize;

use super::dispatch::{MutationDispatcher, MutationResponse};
use super::index::ItemIndex;
use super::report::{RowAction, RowOutcome};
use super::row::{ColumnValuesPayload, RowFields, SpreadsheetRow};
use crate::config::{ColumnLayout, SyncOptions};

/// The decision for one row, before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowPlan {
    pub row_number: usize,
    pub fields: RowFields,
    pub payload: ColumnValuesPayload,
    pub action: RowAction,
}

/// Normalize a row and pick update (key indexed) or create (key unknown)
pub fn plan_row(row: &SpreadsheetRow, index: &ItemIndex, columns: &ColumnLayout) -> RowPlan {
    let fields = RowFields::from_row(row);
    let payload = ColumnValuesPayload::from_fields(&fields, columns);

    let action = match index.get(&fields.key) {
        Some(item_id) => RowAction::Update {
            item_id: item_id.to_string(),
        },
        None => RowAction::Create {
            item_name: fields.display_name.clone(),
        },
    };

    RowPlan {
        row_number: row.number,
        fields,
        payload,
        action,
    }
}

/// Processes rows one at a time against a read-only index
pub struct RowProcessor<'a> {
    dispatcher: MutationDispatcher<'a>,
    index: &'a ItemIndex,
    columns: &'a ColumnLayout,
    options: &'a SyncOptions,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        dispatcher: MutationDispatcher<'a>,
        index: &'a ItemIndex,
        columns: &'a ColumnLayout,
        options: &'a SyncOptions,
    ) -> Self {
        Self {
            dispatcher,
            index,
            columns,
            options,
        }
    }

    /// Process every row in order. A failed row never stops the batch.
    pub async fn process(&self, rows: &[SpreadsheetRow]) -> Vec<RowOutcome> {
        let mut outcomes = Vec::with_capacity(rows.len());
        for row in rows {
            outcomes.push(self.process_row(row).await);
        }
        outcomes
    }

    pub async fn process_row(&self, row: &SpreadsheetRow) -> RowOutcome {
        if self.options.skip_blank_rows && row.is_blank() {
            log::debug!("Row {}: blank, skipped", row.number);
            return RowOutcome::skipped(row.number);
        }

        let plan = plan_row(row, self.index, self.columns);
        let fields = &plan.fields;

        log::info!(
            "Row {}: name={}, key={}, field3={}, field4={}, field5={}",
            plan.row_number,
            fields.display_name,
            fields.key,
            fields.field3,
            fields.field4,
            fields.field5
        );
        log::debug!(
            "Row {} column values: {}",
            plan.row_number,
            plan.payload.to_json().unwrap_or_default()
        );

        if self.options.dry_run {
            match &plan.action {
                RowAction::Update { item_id } => {
                    log::info!("[dry run] Row {} would update item {}", plan.row_number, item_id)
                }
                RowAction::Create { item_name } => {
                    log::info!("[dry run] Row {} would create '{}'", plan.row_number, item_name)
                }
            }
            return RowOutcome::planned(plan.row_number, plan.fields.key, plan.action);
        }

        let result = match &plan.action {
            RowAction::Update { item_id } => self.dispatcher.update(item_id, &plan.payload).await,
            RowAction::Create { item_name } => {
                self.dispatcher.create(item_name, &plan.payload).await
            }
        };

        let RowPlan {
            row_number,
            fields,
            action,
            ..
        } = plan;

        match result {
            Ok(response) => outcome_from_response(row_number, fields.key, action, response),
            Err(e) => {
                log::warn!("Row {}: {} failed: {:#}", row_number, action.kind(), e);
                RowOutcome::failed(row_number, fields.key, action, None, format!("{:#}", e))
            }
        }
    }
}

fn outcome_from_response(
    row_number: usize,
    key: String,
    action: RowAction,
    response: MutationResponse,
) -> RowOutcome {
    match response.failure_reason() {
        Some(reason) => {
            log::warn!("Row {}: {} failed: {}", row_number, action.kind(), reason);
            RowOutcome::failed(row_number, key, action, Some(response.status), reason)
        }
        None => RowOutcome::succeeded(row_number, key, action, response.item_id, response.status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::RecordingTransport;
    use crate::sync::report::RowStatus;
    use serde_json::{Value, json};

    fn alice_row() -> SpreadsheetRow {
        SpreadsheetRow::new(2, ["", "Alice@Example.com ", "Manager", "", "Active"])
    }

    fn sent_values(transport: &RecordingTransport, idx: usize) -> Value {
        let request = &transport.requests()[idx];
        serde_json::from_str(request.variables["columnValues"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_plan_create_when_unmatched() {
        let plan = plan_row(&alice_row(), &ItemIndex::default(), &ColumnLayout::default());

        assert_eq!(
            plan.action,
            RowAction::Create {
                item_name: "N/A".to_string()
            }
        );
        assert_eq!(plan.fields.key, "alice@example.com");
        assert_eq!(plan.payload.get("column_03"), Some("Manager"));
        assert_eq!(plan.payload.get("column_04"), Some(" "));
        assert_eq!(plan.payload.get("column_05"), Some("Active"));
    }

    #[test]
    fn test_plan_update_when_matched() {
        let index = ItemIndex::from_pairs([("alice@example.com", "999")]);
        let plan = plan_row(&alice_row(), &index, &ColumnLayout::default());

        assert_eq!(
            plan.action,
            RowAction::Update {
                item_id: "999".to_string()
            }
        );
        let unmatched = plan_row(&alice_row(), &ItemIndex::default(), &ColumnLayout::default());
        assert_eq!(plan.payload, unmatched.payload);
    }

    #[test]
    fn test_plan_matches_regardless_of_case_and_spacing() {
        let index = ItemIndex::from_pairs([
            ("alice@example.com", "1"),
            ("bob@example.com", "2"),
        ]);
        let cases = [
            ("ALICE@example.com", Some("1")),
            ("  bob@EXAMPLE.com\t", Some("2")),
            ("carol@example.com", None),
            ("", None),
        ];

        for (raw, expected) in cases {
            let row = SpreadsheetRow::new(2, ["Name", raw]);
            let plan = plan_row(&row, &index, &ColumnLayout::default());
            match (expected, &plan.action) {
                (Some(id), RowAction::Update { item_id }) => assert_eq!(item_id, id),
                (None, RowAction::Create { item_name }) => assert_eq!(item_name, "Name"),
                (expected, action) => panic!("{:?}: expected {:?}, got {:?}", raw, expected, action),
            }
        }
    }

    #[tokio::test]
    async fn test_process_creates_unmatched_row() {
        let transport = RecordingTransport::new()
            .reply_json(200, json!({ "data": { "create_item": { "id": "321" } } }));
        let index = ItemIndex::default();
        let columns = ColumnLayout::default();
        let options = SyncOptions::default();
        let processor = RowProcessor::new(
            MutationDispatcher::new(&transport, "42"),
            &index,
            &columns,
            &options,
        );

        let outcomes = processor.process(&[alice_row()]).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, RowStatus::Succeeded);
        assert_eq!(outcomes[0].item_id.as_deref(), Some("321"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].query.contains("create_item"));
        assert_eq!(requests[0].variables["itemName"], json!("N/A"));

        let values = sent_values(&transport, 0);
        assert_eq!(values["column_01"], "N/A");
        assert_eq!(values["column_02"], "alice@example.com");
        assert_eq!(values["column_03"], "Manager");
        assert_eq!(values["column_04"], " ");
        assert_eq!(values["column_05"], "Active");
    }

    #[tokio::test]
    async fn test_process_updates_matched_row() {
        let transport = RecordingTransport::new().reply_json(
            200,
            json!({ "data": { "change_multiple_column_values": { "id": "999" } } }),
        );
        let index = ItemIndex::from_pairs([("alice@example.com", "999")]);
        let columns = ColumnLayout::default();
        let options = SyncOptions::default();
        let processor = RowProcessor::new(
            MutationDispatcher::new(&transport, "42"),
            &index,
            &columns,
            &options,
        );

        let outcomes = processor.process(&[alice_row()]).await;
        assert_eq!(outcomes[0].status, RowStatus::Succeeded);

        let requests = transport.requests();
        assert!(requests[0].query.contains("change_multiple_column_values"));
        assert!(!requests[0].query.contains("create_item"));
        assert_eq!(requests[0].variables["itemId"], json!("999"));
        assert_eq!(sent_values(&transport, 0)["column_04"], " ");
    }

    #[tokio::test]
    async fn test_failed_row_does_not_stop_batch() {
        let transport = RecordingTransport::new()
            .reply_error("connection reset")
            .reply_raw(500, "oops")
            .reply_json(200, json!({ "data": { "create_item": { "id": "3" } } }));
        let index = ItemIndex::default();
        let columns = ColumnLayout::default();
        let options = SyncOptions::default();
        let processor = RowProcessor::new(
            MutationDispatcher::new(&transport, "42"),
            &index,
            &columns,
            &options,
        );

        let rows = [
            SpreadsheetRow::new(2, ["A", "a"]),
            SpreadsheetRow::new(3, ["B", "b"]),
            SpreadsheetRow::new(4, ["C", "c"]),
        ];
        let outcomes = processor.process(&rows).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_failure());
        assert!(outcomes[0].error.as_deref().unwrap().contains("connection reset"));
        assert!(outcomes[1].is_failure());
        assert_eq!(outcomes[1].http_status, Some(500));
        assert!(!outcomes[2].is_failure());
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let transport = RecordingTransport::new();
        let index = ItemIndex::from_pairs([("a", "1")]);
        let columns = ColumnLayout::default();
        let options = SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        };
        let processor = RowProcessor::new(
            MutationDispatcher::new(&transport, "42"),
            &index,
            &columns,
            &options,
        );

        let outcomes = processor
            .process(&[SpreadsheetRow::new(2, ["A", "a"]), SpreadsheetRow::new(3, ["B", "b"])])
            .await;

        assert!(transport.requests().is_empty());
        assert_eq!(outcomes[0].status, RowStatus::Planned);
        assert_eq!(outcomes[0].action.as_ref().unwrap().kind(), "update");
        assert_eq!(outcomes[1].action.as_ref().unwrap().kind(), "create");
    }

    #[tokio::test]
    async fn test_blank_rows_skipped_only_when_enabled() {
        let index = ItemIndex::default();
        let columns = ColumnLayout::default();
        let blank = [SpreadsheetRow::new(2, Vec::<String>::new())];

        let transport = RecordingTransport::new();
        let options = SyncOptions {
            skip_blank_rows: true,
            ..SyncOptions::default()
        };
        let processor = RowProcessor::new(
            MutationDispatcher::new(&transport, "42"),
            &index,
            &columns,
            &options,
        );
        let outcomes = processor.process(&blank).await;
        assert_eq!(outcomes[0].status, RowStatus::Skipped);
        assert!(transport.requests().is_empty());

        let transport = RecordingTransport::new();
        let options = SyncOptions::default();
        let processor = RowProcessor::new(
            MutationDispatcher::new(&transport, "42"),
            &index,
            &columns,
            &options,
        );
        processor.process(&blank).await;
        assert_eq!(transport.requests()[0].variables["itemName"], json!("N/A"));
    }
}
