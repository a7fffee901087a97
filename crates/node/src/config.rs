// crates/node/src/config.rs
//! Node configuration from command-line flags and environment variables.

use std::ffi::OsString;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indexnode_task_registry::DrainController;

use crate::error::ConfigError;

/// Default graceful-stop timeout in seconds.
pub const DEFAULT_GRACEFUL_STOP_TIMEOUT_SECS: u64 = 900;

/// Default drain poll interval in milliseconds.
pub const DEFAULT_DRAIN_POLL_INTERVAL_MS: u64 = 1000;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Settings for one index node process.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "indexnode", version, about = "Index node task-state service")]
pub struct NodeConfig {
    /// Seconds to wait for in-progress jobs before shutting down anyway.
    #[arg(
        long,
        env = "INDEXNODE_GRACEFUL_STOP_TIMEOUT",
        default_value_t = DEFAULT_GRACEFUL_STOP_TIMEOUT_SECS
    )]
    pub graceful_stop_timeout: u64,

    /// Milliseconds between in-progress checks while draining.
    #[arg(
        long,
        env = "INDEXNODE_DRAIN_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_DRAIN_POLL_INTERVAL_MS
    )]
    pub drain_poll_interval_ms: u64,

    #[arg(long, env = "INDEXNODE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl NodeConfig {
    /// Parse and validate from an explicit argument list (first item is the
    /// program name).
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drain_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn graceful_stop_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_stop_timeout)
    }

    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms)
    }

    /// Drain controller for the shutdown path.
    pub fn drain_controller(&self) -> DrainController {
        DrainController::new(self.graceful_stop_timeout())
            .with_poll_interval(self.drain_poll_interval())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            graceful_stop_timeout: DEFAULT_GRACEFUL_STOP_TIMEOUT_SECS,
            drain_poll_interval_ms: DEFAULT_DRAIN_POLL_INTERVAL_MS,
            log_format: LogFormat::Compact,
        }
    }
}
