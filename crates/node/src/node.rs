// crates/node/src/node.rs
//! Lifecycle wrapper that owns the registry and runs the shutdown drain.

use std::sync::Arc;

use indexnode_task_registry::{DrainController, DrainOutcome, TaskRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::NodeConfig;

/// What happened during [`IndexNode::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReport {
    pub outcome: DrainOutcome,
    pub cancelled_index_tasks: usize,
    pub cancelled_analysis_tasks: usize,
}

/// One index node: the shared task registry plus the node's lifecycle token.
pub struct IndexNode {
    registry: Arc<TaskRegistry>,
    loop_token: CancellationToken,
    drain: DrainController,
}

impl IndexNode {
    pub fn new(config: &NodeConfig) -> Self {
        Self::with_drain(config.drain_controller())
    }

    pub fn with_drain(drain: DrainController) -> Self {
        Self {
            registry: Arc::new(TaskRegistry::new()),
            loop_token: CancellationToken::new(),
            drain,
        }
    }

    /// The registry shared with job runners and RPC handlers.
    pub fn registry(&self) -> Arc<TaskRegistry> {
        Arc::clone(&self.registry)
    }

    /// A cancellation token for a new job, cancelled at the latest when the
    /// node stops.
    pub fn job_token(&self) -> CancellationToken {
        self.loop_token.child_token()
    }

    pub fn is_stopped(&self) -> bool {
        self.loop_token.is_cancelled()
    }

    /// Stop the node.
    ///
    /// Waits (bounded) for in-progress jobs, then removes every record and
    /// cancels its token outside the registry lock. Calling it again is
    /// harmless: the registry is already empty.
    pub async fn stop(&self) -> StopReport {
        info!(
            graceful_stop_timeout_secs = self.drain.timeout().as_secs(),
            "index node stopping"
        );

        let outcome = self
            .drain
            .wait_task_finish(&self.registry, &self.loop_token)
            .await;
        if let DrainOutcome::TimedOut { pending } = &outcome {
            warn!(
                pending = pending.len(),
                "stopping with tasks still in progress"
            );
        }

        let index_tasks = self.registry.delete_all_index_tasks();
        for info in &index_tasks {
            info.cancel.cancel();
        }
        let analysis_tasks = self.registry.delete_all_analysis_tasks();
        for info in &analysis_tasks {
            info.cancel.cancel();
        }
        self.loop_token.cancel();

        info!(
            cancelled_index_tasks = index_tasks.len(),
            cancelled_analysis_tasks = analysis_tasks.len(),
            "index node stopped"
        );

        StopReport {
            outcome,
            cancelled_index_tasks: index_tasks.len(),
            cancelled_analysis_tasks: analysis_tasks.len(),
        }
    }
}

impl Default for IndexNode {
    fn default() -> Self {
        Self::new(&NodeConfig::default())
    }
}
