//! Check command
//!
//! Loads the configuration, builds the cluster registry and one ClickHouse
//! writer per storage, and prints the resulting layout. Nothing is sent to
//! any cluster.

use anyhow::{Context, Result};
use clap::Args;
use sluice_config::Config;
use sluice_sinks::clickhouse::writers_from_registry;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

/// Run the check command
pub fn run(args: CheckArgs, config: &Config) -> Result<()> {
    let registry = config
        .to_registry()
        .context("cluster layout is inconsistent")?;
    let writers =
        writers_from_registry(&registry, |c| c).context("failed to configure storage writers")?;

    tracing::info!(
        clusters = registry.cluster_count(),
        storages = writers.len(),
        "configuration is valid"
    );

    if args.quiet {
        return Ok(());
    }

    println!("Clusters:");
    for cluster in registry.clusters() {
        let sets: Vec<&str> = cluster.storage_sets.iter().map(|s| s.as_str()).collect();
        println!(
            "  {:<16} {:<32} sets: {}",
            cluster.name,
            cluster.http_url(),
            sets.join(", ")
        );
    }

    println!();
    println!("Storages:");
    let mut storages: Vec<_> = registry.storages().collect();
    storages.sort_by(|(a, _), (b, _)| a.key.cmp(&b.key));
    for (storage, cluster) in storages {
        println!(
            "  {:<16} {:<24} -> {}.{} on {}",
            storage.key.as_str(),
            storage.storage_set.as_str(),
            cluster.database,
            storage.table,
            cluster.name
        );
    }

    println!();
    println!(
        "Batching: {} messages / {} ms, poll every {} ms",
        config.consumer.max_batch_size,
        config.consumer.max_batch_time_ms,
        config.consumer.poll_interval_ms
    );
    match config.replacements_topic() {
        Some(topic) => println!("Replacements: enabled -> {topic}"),
        None => println!("Replacements: disabled"),
    }

    Ok(())
}
