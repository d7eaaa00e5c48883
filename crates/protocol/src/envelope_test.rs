//! Tests for envelope types

use bytes::Bytes;
use chrono::{TimeZone, Utc};

use crate::envelope::{Envelope, LogPayload, Partition, Topic};

fn partition(index: u16) -> Partition {
    Partition::new(Topic::new("events"), index)
}

#[test]
fn test_envelope_coordinates() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let env = Envelope::new(partition(3), 42, ts, "payload");

    assert_eq!(env.partition().index(), 3);
    assert_eq!(env.partition().topic().name(), "events");
    assert_eq!(env.offset(), 42);
    assert_eq!(env.next_offset(), 43);
    assert_eq!(env.timestamp(), ts);
    assert_eq!(*env.payload(), "payload");
}

#[test]
fn test_replace_payload_keeps_coordinates() {
    let ts = Utc::now();
    let env = Envelope::new(partition(1), 7, ts, 10u32);

    let replaced = env.replace_payload("encoded");

    assert_eq!(replaced.partition(), env.partition());
    assert_eq!(replaced.offset(), 7);
    assert_eq!(replaced.timestamp(), ts);
    assert_eq!(*replaced.payload(), "encoded");
}

#[test]
fn test_map_payload() {
    let env = Envelope::new(partition(0), 1, Utc::now(), 2u32);
    let mapped = env.map(|v| v * 10);

    assert_eq!(mapped.offset(), 1);
    assert_eq!(mapped.into_payload(), 20);
}

#[test]
fn test_metadata() {
    let ts = Utc::now();
    let env = Envelope::new(partition(5), 100, ts, ());
    let meta = env.metadata();

    assert_eq!(meta.partition, 5);
    assert_eq!(meta.offset, 100);
    assert_eq!(meta.timestamp, ts);
}

#[test]
fn test_partition_display_and_ordering() {
    let a = partition(0);
    let b = partition(1);
    assert!(a < b);
    assert_eq!(b.to_string(), "events/1");
}

#[test]
fn test_log_payload_headers() {
    let payload = LogPayload::new(Bytes::from_static(b"{}"))
        .with_key(Bytes::from_static(b"k"))
        .with_header("operation", Bytes::from_static(b"insert"))
        .with_header("operation", Bytes::from_static(b"ignored"));

    assert_eq!(payload.key.as_deref(), Some(&b"k"[..]));
    assert_eq!(
        payload.header("operation").map(|v| v.as_ref()),
        Some(&b"insert"[..])
    );
    assert!(payload.header("missing").is_none());
}
