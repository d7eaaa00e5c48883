//! Shared test fixtures

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sluice_protocol::{
    Envelope, InsertBatch, LogPayload, MessageMetadata, Offsets, Partition, ProcessedMessage,
    ProcessingStep, ProcessorError, ReplacementBatch, Result, StepError, StorageKey, Topic,
};

pub fn partition(index: u16) -> Partition {
    Partition::new(Topic::new("events"), index)
}

pub fn raw(index: u16, offset: u64, value: &str) -> Envelope<LogPayload> {
    Envelope::new(
        partition(index),
        offset,
        Utc::now(),
        LogPayload::new(value.to_owned()),
    )
}

pub fn envelope<T>(index: u16, offset: u64, payload: T) -> Envelope<T> {
    Envelope::new(partition(index), offset, Utc::now(), payload)
}

/// Processor for `{"storage": .., "row": ..}`, `{"replace": .., "values": [..]}`
/// and `{"skip": true}` payloads
pub fn json_processor(
    value: serde_json::Value,
    _metadata: &MessageMetadata,
) -> std::result::Result<Option<ProcessedMessage>, ProcessorError> {
    if value.get("skip").is_some() {
        return Ok(None);
    }

    if let Some(key) = value.get("replace").and_then(|k| k.as_str()) {
        let values = value
            .get("values")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        return Ok(Some(ProcessedMessage::Replacement(ReplacementBatch::new(
            key, values,
        ))));
    }

    let storage = value
        .get("storage")
        .and_then(|s| s.as_str())
        .ok_or_else(|| ProcessorError::new("missing storage"))?;
    let row = value.get("row").cloned().unwrap_or(serde_json::Value::Null);
    Ok(Some(ProcessedMessage::Insert(InsertBatch::new(vec![(
        StorageKey::new(storage),
        row,
    )]))))
}

/// Lifecycle events seen by a `RecordingStep`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Submit(u64),
    Poll,
    Close,
    Join,
}

/// Downstream step that records its lifecycle
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
    fail_join: Arc<Mutex<Option<String>>>,
}

impl Recorder {
    pub fn step<T>(&self) -> Box<dyn ProcessingStep<T>>
    where
        T: Send + 'static,
    {
        Box::new(RecordingStep {
            recorder: self.clone(),
            received: Vec::new(),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn submitted(&self) -> Vec<u64> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Submit(offset) => Some(*offset),
                _ => None,
            })
            .collect()
    }

    pub fn fail_join(&self, message: &str) {
        *self.fail_join.lock() = Some(message.to_owned());
    }
}

struct RecordingStep<T> {
    recorder: Recorder,
    received: Vec<Envelope<T>>,
}

#[async_trait]
impl<T: Send + 'static> ProcessingStep<T> for RecordingStep<T> {
    async fn poll(&mut self) -> Result<()> {
        self.recorder.events.lock().push(Event::Poll);
        Ok(())
    }

    async fn submit(&mut self, envelope: Envelope<T>) -> Result<()> {
        self.recorder
            .events
            .lock()
            .push(Event::Submit(envelope.offset()));
        self.received.push(envelope);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.recorder.events.lock().push(Event::Close);
        Ok(())
    }

    async fn join(&mut self, _timeout: Option<Duration>) -> Result<()> {
        self.recorder.events.lock().push(Event::Join);
        match self.recorder.fail_join.lock().clone() {
            Some(message) => Err(StepError::write("recorder", message)),
            None => Ok(()),
        }
    }
}

/// Commit callback that records every call
#[derive(Debug, Clone, Default)]
pub struct CommitLog {
    commits: Arc<Mutex<Vec<Offsets>>>,
}

impl CommitLog {
    pub fn callback(&self) -> impl FnMut(Offsets) -> Result<()> + Send + 'static {
        let commits = Arc::clone(&self.commits);
        move |offsets| {
            commits.lock().push(offsets);
            Ok(())
        }
    }

    pub fn commits(&self) -> Vec<Offsets> {
        self.commits.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.commits.lock().len()
    }

    pub fn last(&self) -> Option<Offsets> {
        self.commits.lock().last().cloned()
    }
}
