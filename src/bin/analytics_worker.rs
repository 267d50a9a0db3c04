//! Click analytics worker.
//!
//! Consumes click events from every shard of the click stream and folds
//! them into per-code counters.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin analytics-worker -- --consumer worker-2 --shards 4
//! ```
//!
//! Exits non-zero when a shard cannot reach the stream within its retry
//! budget (`STREAM_CONNECT_ATTEMPTS` × `STREAM_CONNECT_BACKOFF_MS`).

use anyhow::Result;
use clap::Parser;
use nanolink::{config, logging, server};

/// Aggregates click events into counters.
#[derive(Parser)]
#[command(name = "analytics-worker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Consumer name within the group (overrides CLICK_CONSUMER_NAME)
    #[arg(short, long)]
    consumer: Option<String>,

    /// Number of stream shards to consume (overrides CLICK_STREAM_SHARDS)
    #[arg(short, long)]
    shards: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = config::Config::from_env()?;
    if let Some(shards) = cli.shards {
        config.click_stream_shards = shards;
    }
    if let Some(consumer) = cli.consumer {
        config.click_consumer_name = consumer;
    }
    config.validate()?;

    logging::init(&config.log_level, &config.log_format)?;
    config.print_summary();

    server::run_worker(config).await
}
