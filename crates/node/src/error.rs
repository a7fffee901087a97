// crates/node/src/error.rs
use thiserror::Error;

/// Errors raised while loading node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid command line: {0}")]
    Cli(#[from] clap::Error),

    #[error("Drain poll interval must be greater than zero")]
    ZeroPollInterval,
}
