// crates/node/src/lib.rs
//! Index node process wiring.
//!
//! Configuration, logging setup, and the [`IndexNode`] lifecycle wrapper
//! around the task registry. Job execution and the coordinator RPC surface
//! live elsewhere and only talk to the registry handed out by
//! [`IndexNode::registry`].

pub mod config;
pub mod error;
pub mod logging;
pub mod node;

pub use config::{LogFormat, NodeConfig};
pub use error::ConfigError;
pub use logging::init_logging;
pub use node::{IndexNode, StopReport};
