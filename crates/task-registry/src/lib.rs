// crates/task-registry/src/lib.rs
//! Task-state bookkeeping for an index node.
//!
//! Provides:
//! - `TaskRegistry` — one lock over the build-job and analysis-job maps
//! - `IndexTaskInfo` / `AnalysisTaskInfo` — per-job records
//! - `DrainController` — bounded shutdown wait for `InProgress` jobs
//!
//! The registry only records what job runners and RPC handlers tell it. It
//! does not schedule, retry, or cancel work.

pub mod drain;
pub mod info;
pub mod registry;
pub mod types;

pub use drain::{DrainController, DrainOutcome, DEFAULT_POLL_INTERVAL};
pub use info::{AnalysisTaskInfo, IndexBuildResult, IndexTaskInfo, JobInfo};
pub use registry::{JobStats, TaskRegistry};
pub use types::{IndexState, PendingTask, TaskKey, TaskKind};
