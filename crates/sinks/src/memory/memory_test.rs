//! Tests for the in-memory destinations

use super::*;

#[tokio::test]
async fn test_writer_records_writes() {
    let writer = MemoryWriter::new("errors");
    writer
        .write(vec![Bytes::from_static(b"{\"a\":1}")])
        .await
        .unwrap();
    writer
        .write(vec![Bytes::from_static(b"{\"a\":2}"), Bytes::from_static(b"{\"a\":3}")])
        .await
        .unwrap();

    assert_eq!(writer.name(), "errors");
    assert_eq!(writer.write_count(), 2);
    assert_eq!(writer.rows().len(), 3);
}

#[tokio::test]
async fn test_writer_failure_and_recovery() {
    let writer = MemoryWriter::new("errors");
    writer.fail_with("disk on fire");

    let err = writer.write(vec![Bytes::from_static(b"{}")]).await.unwrap_err();
    assert!(err.to_string().contains("disk on fire"));
    assert_eq!(writer.write_count(), 0);

    writer.recover();
    writer.write(vec![Bytes::from_static(b"{}")]).await.unwrap();
    assert_eq!(writer.write_count(), 1);
}

#[tokio::test]
async fn test_producer_immediate_delivery() {
    let producer = MemoryProducer::new();
    let topic = Topic::new("replacements");

    let delivery = producer
        .produce(&topic, Bytes::from_static(b"1"), Bytes::from_static(b"{}"))
        .unwrap();
    delivery.await.unwrap();

    let messages = producer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].topic, topic);
    assert_eq!(messages[0].key, Bytes::from_static(b"1"));
}

#[tokio::test]
async fn test_producer_failed_delivery() {
    let producer = MemoryProducer::with_mode(DeliveryMode::Fail("broker down".into()));
    let delivery = producer
        .produce(&Topic::new("r"), Bytes::new(), Bytes::new())
        .unwrap();

    let err = delivery.await.unwrap_err();
    assert!(matches!(err, StepError::Delivery(ref m) if m == "broker down"));
}

#[tokio::test]
async fn test_producer_held_until_release() {
    let producer = MemoryProducer::with_mode(DeliveryMode::Held);
    let mut delivery = producer
        .produce(&Topic::new("r"), Bytes::new(), Bytes::new())
        .unwrap();

    let pending = tokio::time::timeout(Duration::from_millis(10), &mut delivery).await;
    assert!(pending.is_err());

    producer.release();
    delivery.await.unwrap();
}

#[test]
fn test_producer_rejects_when_full() {
    let producer = MemoryProducer::new();
    producer.reject_produce(true);

    let err = producer
        .produce(&Topic::new("r"), Bytes::new(), Bytes::new())
        .unwrap_err();
    assert!(matches!(err, StepError::Delivery(_)));
    assert!(producer.messages().is_empty());
}
