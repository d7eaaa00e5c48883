//! Routed-row message processor
//!
//! The processor behind `sluice replay`. Each message names its own
//! destination:
//!
//! ```json
//! {"storage": "errors", "row": {"event_id": "a1", "project_id": 1}}
//! {"rows": [{"storage": "errors", "row": {..}}, {"storage": "search", "row": {..}}]}
//! {"replace": "project:1", "values": [{"type": "end_delete_groups"}]}
//! ```
//!
//! Any other object is skipped.

use serde::Deserialize;
use serde_json::Value;
use sluice_protocol::{
    InsertBatch, MessageMetadata, MessageProcessor, ProcessedMessage, ProcessorError,
    ReplacementBatch, StorageKey,
};

#[derive(Debug, Deserialize)]
struct RoutedRow {
    storage: StorageKey,
    row: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoutedMessage {
    Single(RoutedRow),
    Many { rows: Vec<RoutedRow> },
    Replace { replace: String, values: Vec<Value> },
    Other(Value),
}

/// Processor for self-routing JSON messages
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutedRowProcessor;

impl MessageProcessor for RoutedRowProcessor {
    fn process(
        &self,
        value: Value,
        _metadata: &MessageMetadata,
    ) -> Result<Option<ProcessedMessage>, ProcessorError> {
        if !value.is_object() {
            return Err(ProcessorError::new("message is not a JSON object"));
        }

        let message: RoutedMessage = serde_json::from_value(value)
            .map_err(|e| ProcessorError::new(format!("unrecognized message: {e}")))?;

        let processed = match message {
            RoutedMessage::Single(row) => Some(ProcessedMessage::Insert(InsertBatch::new(vec![(
                row.storage,
                row.row,
            )]))),
            RoutedMessage::Many { rows } if rows.is_empty() => None,
            RoutedMessage::Many { rows } => Some(ProcessedMessage::Insert(InsertBatch::new(
                rows.into_iter().map(|r| (r.storage, r.row)).collect(),
            ))),
            RoutedMessage::Replace { replace, values } => Some(ProcessedMessage::Replacement(
                ReplacementBatch::new(replace, values),
            )),
            RoutedMessage::Other(_) => None,
        };
        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn process(value: Value) -> Result<Option<ProcessedMessage>, ProcessorError> {
        let metadata = MessageMetadata {
            partition: 0,
            offset: 0,
            timestamp: Utc::now(),
        };
        RoutedRowProcessor.process(value, &metadata)
    }

    #[test]
    fn test_single_row() {
        let processed = process(json!({"storage": "errors", "row": {"id": 1}})).unwrap();
        assert_eq!(
            processed,
            Some(ProcessedMessage::Insert(InsertBatch::new(vec![(
                StorageKey::new("errors"),
                json!({"id": 1})
            )])))
        );
    }

    #[test]
    fn test_many_rows_keep_order() {
        let processed = process(json!({"rows": [
            {"storage": "errors", "row": {"id": 1}},
            {"storage": "search", "row": {"id": 2}},
        ]}))
        .unwrap();

        let Some(ProcessedMessage::Insert(batch)) = processed else {
            panic!("expected insert");
        };
        let keys: Vec<&str> = batch.rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["errors", "search"]);
    }

    #[test]
    fn test_empty_rows_skipped() {
        assert_eq!(process(json!({"rows": []})).unwrap(), None);
    }

    #[test]
    fn test_replacement() {
        let processed = process(json!({"replace": "project:1", "values": [{"a": 1}]})).unwrap();
        assert_eq!(
            processed,
            Some(ProcessedMessage::Replacement(ReplacementBatch::new(
                "project:1",
                vec![json!({"a": 1})]
            )))
        );
    }

    #[test]
    fn test_unrouted_object_skipped() {
        assert_eq!(process(json!({"heartbeat": true})).unwrap(), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(process(json!([1, 2, 3])).is_err());
        assert!(process(json!("text")).is_err());
    }
}
