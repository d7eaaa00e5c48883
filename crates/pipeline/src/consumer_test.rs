//! Tests for the stream consumer

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sluice_protocol::{StepError, StorageKey};
use sluice_sinks::BatchWriter;
use sluice_sinks::memory::MemoryWriter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::StreamConsumer;
use crate::StreamingStrategyFactory;
use crate::testing::{CommitLog, json_processor, partition, raw};

fn factory(size: usize, time: Duration) -> (StreamingStrategyFactory, Arc<MemoryWriter>) {
    let writer = Arc::new(MemoryWriter::new("errors"));
    let mut writers: BTreeMap<StorageKey, Arc<dyn BatchWriter>> = BTreeMap::new();
    writers.insert(StorageKey::new("errors"), Arc::clone(&writer) as Arc<dyn BatchWriter>);
    let factory =
        StreamingStrategyFactory::new(Arc::new(json_processor), writers, size, time, None)
            .unwrap();
    (factory, writer)
}

fn row(id: u64) -> String {
    json!({ "storage": "errors", "row": { "id": id } }).to_string()
}

#[tokio::test]
async fn test_closed_channel_flushes_remaining_window() {
    let (factory, writer) = factory(2, Duration::from_secs(60));
    let commits = CommitLog::default();
    let consumer = StreamConsumer::new(&factory, commits.callback());

    let (tx, rx) = mpsc::channel(16);
    for offset in 0..3 {
        tx.send(raw(0, offset, &row(offset))).await.unwrap();
    }
    drop(tx);

    let snapshot = consumer.run(rx).await.unwrap();

    assert_eq!(writer.write_count(), 2);
    assert_eq!(writer.rows().len(), 3);
    assert_eq!(
        commits
            .commits()
            .iter()
            .map(|o| o[&partition(0)])
            .collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(snapshot.messages_received, 3);
    assert_eq!(snapshot.commits, 2);
}

#[tokio::test]
async fn test_cancel_flushes_and_stops() {
    let (factory, writer) = factory(100, Duration::from_secs(60));
    let commits = CommitLog::default();
    let consumer = StreamConsumer::new(&factory, commits.callback())
        .with_shutdown_timeout(Some(Duration::from_secs(5)));

    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(consumer.run_until(rx, cancel.clone()));

    tx.send(raw(0, 0, &row(0))).await.unwrap();
    tx.send(raw(0, 1, &row(1))).await.unwrap();
    while factory.metrics().snapshot().messages_received < 2 {
        tokio::task::yield_now().await;
    }
    cancel.cancel();

    let snapshot = handle.await.unwrap().unwrap();
    assert_eq!(writer.rows().len(), 2);
    assert_eq!(commits.len(), 1);
    assert_eq!(snapshot.flushes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_idle_window_flushes_on_poll_tick() {
    let (factory, writer) = factory(1000, Duration::from_millis(100));
    let commits = CommitLog::default();
    let consumer = StreamConsumer::new(&factory, commits.callback())
        .with_poll_interval(Duration::from_millis(10));

    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(consumer.run(rx));

    tx.send(raw(0, 0, &row(0))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(commits.len(), 0);

    tokio::time::sleep(Duration::from_millis(70)).await;
    assert_eq!(writer.write_count(), 1);
    assert_eq!(commits.len(), 1);

    drop(tx);
    let snapshot = handle.await.unwrap().unwrap();
    assert_eq!(snapshot.commits, 1);
}

#[tokio::test]
async fn test_processing_error_stops_consumer() {
    let (factory, writer) = factory(10, Duration::from_secs(60));
    let commits = CommitLog::default();
    let consumer = StreamConsumer::new(&factory, commits.callback());

    let (tx, rx) = mpsc::channel(16);
    tx.send(raw(0, 0, &row(0))).await.unwrap();
    tx.send(raw(0, 1, "{broken")).await.unwrap();
    tx.send(raw(0, 2, &row(2))).await.unwrap();
    drop(tx);

    let err = consumer.run(rx).await.unwrap_err();
    assert!(matches!(err, StepError::Processing { offset: 1, .. }));
    assert_eq!(writer.write_count(), 0);
    assert_eq!(commits.len(), 0);
}

#[tokio::test]
async fn test_final_flush_failure_is_returned() {
    let (factory, writer) = factory(10, Duration::from_secs(60));
    writer.fail_with("connection refused");
    let commits = CommitLog::default();
    let consumer = StreamConsumer::new(&factory, commits.callback());

    let (tx, rx) = mpsc::channel(16);
    tx.send(raw(0, 0, &row(0))).await.unwrap();
    drop(tx);

    let err = consumer.run(rx).await.unwrap_err();
    assert!(err.is_downstream());
    assert_eq!(commits.len(), 0);
}
