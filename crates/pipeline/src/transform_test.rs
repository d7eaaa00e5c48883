//! Tests for the transform stage

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use sluice_protocol::{
    Envelope, LogPayload, MessageMetadata, ProcessedMessage, ProcessingStep, ProcessorError,
    StepError, StorageKey, TransformedMessage,
};

use super::{ProcessMessage, TransformStep};
use crate::PipelineMetrics;
use crate::testing::{Event, Recorder, json_processor, raw};

fn process() -> (ProcessMessage, Arc<PipelineMetrics>) {
    let metrics = Arc::new(PipelineMetrics::new());
    (
        ProcessMessage::new(Arc::new(json_processor), Arc::clone(&metrics)),
        metrics,
    )
}

#[test]
fn test_insert_rows_are_encoded() {
    let (process, metrics) = process();
    let envelope = raw(0, 7, r#"{"storage": "errors", "row": {"id": 1}}"#);

    let Some(TransformedMessage::Insert(batch)) = process.apply(&envelope).unwrap() else {
        panic!("expected insert");
    };
    assert_eq!(
        batch.rows,
        vec![(StorageKey::new("errors"), Bytes::from_static(br#"{"id":1}"#))]
    );
    assert_eq!(metrics.snapshot().inserts_processed, 1);
}

#[test]
fn test_replacement_passes_through() {
    let (process, metrics) = process();
    let envelope = raw(0, 0, r#"{"replace": "k1", "values": [1, 2]}"#);

    let Some(TransformedMessage::Replacement(batch)) = process.apply(&envelope).unwrap() else {
        panic!("expected replacement");
    };
    assert_eq!(batch.key, "k1");
    assert_eq!(batch.values, vec![json!(1), json!(2)]);
    assert_eq!(metrics.snapshot().replacements_processed, 1);
}

#[test]
fn test_skipped_message() {
    let (process, metrics) = process();
    assert!(process.apply(&raw(0, 0, r#"{"skip": true}"#)).unwrap().is_none());
    assert_eq!(metrics.snapshot().messages_skipped, 1);
}

#[test]
fn test_invalid_json_is_a_processing_error() {
    let (process, _) = process();
    let err = process.apply(&raw(0, 42, "not json")).unwrap_err();
    assert!(matches!(err, StepError::Processing { offset: 42, .. }));
}

#[test]
fn test_processor_error_carries_offset() {
    let (process, _) = process();
    let err = process.apply(&raw(0, 9, r#"{"row": {}}"#)).unwrap_err();
    match err {
        StepError::Processing { offset, message } => {
            assert_eq!(offset, 9);
            assert!(message.contains("missing storage"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_processor_sees_coordinates() {
    let metrics = Arc::new(PipelineMetrics::new());
    let processor = |_: serde_json::Value,
                     metadata: &MessageMetadata|
     -> Result<Option<ProcessedMessage>, ProcessorError> {
        assert_eq!(metadata.partition, 3);
        assert_eq!(metadata.offset, 11);
        Ok(None)
    };
    let process = ProcessMessage::new(Arc::new(processor), metrics);
    assert!(process.apply(&raw(3, 11, "{}")).unwrap().is_none());
}

#[tokio::test]
async fn test_step_forwards_results_and_drops_none() {
    let recorder = Recorder::default();
    let mut step = TransformStep::new(
        |envelope: &Envelope<LogPayload>| {
            Ok((envelope.offset() != 1).then(|| envelope.payload().value.len()))
        },
        recorder.step::<usize>(),
    );

    for offset in 0..3 {
        step.submit(raw(0, offset, "{}")).await.unwrap();
    }
    assert_eq!(recorder.submitted(), vec![0, 2]);
}

#[tokio::test]
async fn test_step_error_halts_without_forwarding() {
    let recorder = Recorder::default();
    let mut step = TransformStep::new(
        |envelope: &Envelope<LogPayload>| -> sluice_protocol::Result<Option<()>> {
            Err(StepError::processing(envelope.offset(), "boom"))
        },
        recorder.step::<()>(),
    );

    assert!(step.submit(raw(0, 5, "{}")).await.is_err());
    assert!(recorder.submitted().is_empty());
}

#[tokio::test]
async fn test_step_lifecycle_and_closed_state() {
    let recorder = Recorder::default();
    let mut step = TransformStep::new(
        |_: &Envelope<LogPayload>| Ok(Some(())),
        recorder.step::<()>(),
    );

    step.poll().await.unwrap();
    step.close().await.unwrap();
    step.join(None).await.unwrap();
    assert_eq!(recorder.events(), vec![Event::Poll, Event::Close, Event::Join]);

    let err = step.submit(raw(0, 0, "{}")).await.unwrap_err();
    assert!(matches!(err, StepError::InvalidState(_)));
}
