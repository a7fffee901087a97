// crates/node/src/main.rs
//! Index node binary.
//!
//! Starts the task registry, then waits for Ctrl-C and runs the graceful
//! stop: drain in-progress jobs (bounded), remove every record, cancel them.

use anyhow::Result;
use clap::Parser;
use indexnode_node::{init_logging, IndexNode, NodeConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::parse();
    config.validate()?;
    init_logging(config.log_format)?;

    let node = IndexNode::new(&config);
    info!(
        graceful_stop_timeout_secs = config.graceful_stop_timeout,
        drain_poll_interval_ms = config.drain_poll_interval_ms,
        "index node started"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    let report = node.stop().await;
    info!(outcome = ?report.outcome, "shutdown complete");

    Ok(())
}
