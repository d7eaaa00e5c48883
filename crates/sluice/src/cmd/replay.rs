//! Replay command
//!
//! Feeds a JSON-lines file (or stdin) through a full pipeline, one line
//! per message on a single partition. With `--dry-run` rows land in
//! memory writers and are counted instead of being sent to ClickHouse.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use parking_lot::Mutex;
use sluice_config::Config;
use sluice_pipeline::{
    Envelope, LogPayload, Offsets, StreamConsumer, StreamingStrategyFactory,
};
use sluice_protocol::{Partition, StorageKey, Topic};
use sluice_sinks::clickhouse::writers_from_registry;
use sluice_sinks::memory::{MemoryProducer, MemoryWriter};
use sluice_sinks::{BatchWriter, Producer, ReplacementTarget};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::processor::RoutedRowProcessor;

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines input (`-` for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write to in-memory destinations instead of ClickHouse
    #[arg(long)]
    dry_run: bool,

    /// Topic name recorded on replayed envelopes
    #[arg(long, default_value = "replay")]
    topic: String,

    /// Capacity of the channel between reader and consumer
    #[arg(long, default_value = "1024")]
    buffer: usize,
}

/// Run the replay command
pub async fn run(args: ReplayArgs, config: &Config) -> Result<()> {
    let registry = config
        .to_registry()
        .context("cluster layout is inconsistent")?;

    let mut memory: Vec<(StorageKey, Arc<MemoryWriter>)> = Vec::new();
    let writers: BTreeMap<StorageKey, Arc<dyn BatchWriter>> = if args.dry_run {
        registry
            .storages()
            .map(|(storage, _)| {
                let writer = Arc::new(MemoryWriter::new(storage.key.as_str()));
                memory.push((storage.key.clone(), Arc::clone(&writer)));
                (storage.key.clone(), writer as Arc<dyn BatchWriter>)
            })
            .collect()
    } else {
        writers_from_registry(&registry, |c| c).context("failed to configure storage writers")?
    };

    let producer = Arc::new(MemoryProducer::new());
    let replacements = match config.replacements_topic() {
        Some(_) if !args.dry_run => {
            bail!("replacements are enabled but no outbound producer is available; use --dry-run")
        }
        Some(topic) => Some(ReplacementTarget::new(
            Arc::clone(&producer) as Arc<dyn Producer>,
            Topic::new(topic),
        )),
        None => None,
    };

    let factory = StreamingStrategyFactory::new(
        Arc::new(RoutedRowProcessor),
        writers,
        config.consumer.max_batch_size,
        config.consumer.max_batch_time(),
        replacements,
    )?
    .with_flush_timeout(config.consumer.join_timeout());

    let committed: Arc<Mutex<Offsets>> = Arc::new(Mutex::new(Offsets::new()));
    let last = Arc::clone(&committed);
    let commit = move |offsets: Offsets| -> sluice_pipeline::Result<()> {
        tracing::debug!(?offsets, "committed");
        last.lock().extend(offsets);
        Ok(())
    };
    let consumer = StreamConsumer::new(&factory, commit)
        .with_poll_interval(config.consumer.poll_interval())
        .with_shutdown_timeout(config.consumer.join_timeout());

    let (tx, rx) = mpsc::channel(args.buffer.max(1));
    let cancel = CancellationToken::new();
    let partition = Partition::new(Topic::new(args.topic.as_str()), 0);
    let reader = tokio::spawn(read_lines(args.input.clone(), partition, tx, cancel.clone()));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing the current window");
            shutdown.cancel();
        }
    });

    let snapshot = consumer.run_until(rx, cancel.clone()).await?;
    cancel.cancel();
    let lines = reader.await.context("reader task panicked")??;

    let sinks = factory.sink_metrics().snapshot();
    println!("Lines read:        {lines}");
    println!("Messages received: {}", snapshot.messages_received);
    println!("Skipped:           {}", snapshot.messages_skipped);
    println!("Windows flushed:   {}", snapshot.flushes);
    println!("Rows written:      {}", sinks.rows_written);
    println!("Replacements:      {}", sinks.replacements_produced);
    for (partition, offset) in committed.lock().iter() {
        println!("Committed:         {partition} @ {offset}");
    }
    if args.dry_run {
        for (key, writer) in &memory {
            println!("  {:<16} {} rows", key.as_str(), writer.rows().len());
        }
    }

    Ok(())
}

/// Send every non-empty line as one envelope, returning the count sent
async fn read_lines(
    input: PathBuf,
    partition: Partition,
    tx: mpsc::Sender<Envelope<LogPayload>>,
    cancel: CancellationToken,
) -> Result<u64> {
    let reader: Box<dyn tokio::io::AsyncRead + Unpin + Send> = if input.as_os_str() == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(&input)
            .await
            .with_context(|| format!("failed to open {}", input.display()))?;
        Box::new(file)
    };

    let mut lines = BufReader::new(reader).lines();
    let mut offset = 0u64;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let envelope = Envelope::new(partition.clone(), offset, Utc::now(), LogPayload::new(line));
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = tx.send(envelope) => {
                if sent.is_err() {
                    break;
                }
            }
        }
        offset += 1;
    }
    Ok(offset)
}
