// crates/task-registry/src/drain.rs
//! Bounded wait for in-flight jobs during node shutdown.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::registry::TaskRegistry;
use crate::types::PendingTask;

/// How often the registry is re-checked while draining.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a drain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was in progress when the drain started.
    Idle,
    /// Every in-progress job left `InProgress` before the deadline.
    Drained,
    /// The deadline passed (or the node's lifecycle token fired) with jobs
    /// still running. They are left untouched.
    TimedOut { pending: Vec<PendingTask> },
}

/// Polls [`TaskRegistry::has_in_progress_task`] until it reports false or a
/// timeout elapses.
///
/// The registry lock is only taken for each poll; between polls the drain
/// sleeps on a timer.
#[derive(Debug, Clone)]
pub struct DrainController {
    timeout: Duration,
    poll_interval: Duration,
}

impl DrainController {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval. Zero is raised to one millisecond.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait for every job in `registry` to leave `InProgress`.
    ///
    /// Returns within one poll interval of the last job finishing, or once
    /// the timeout elapses, whichever is first. Cancelling `lifecycle` ends
    /// the wait early through the timeout path. Running jobs are never
    /// cancelled here; on timeout each one is logged at warn level.
    pub async fn wait_task_finish(
        &self,
        registry: &TaskRegistry,
        lifecycle: &CancellationToken,
    ) -> DrainOutcome {
        if !registry.has_in_progress_task() {
            return DrainOutcome::Idle;
        }

        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = ticker.tick() => {
                    // Runners woken on the same tick publish their state first.
                    tokio::task::yield_now().await;
                    if !registry.has_in_progress_task() {
                        debug!(
                            elapsed_secs = start.elapsed().as_secs_f64(),
                            "all in-progress tasks finished"
                        );
                        return DrainOutcome::Drained;
                    }
                }
                _ = lifecycle.cancelled() => break,
                _ = &mut deadline => break,
            }
        }

        warn!(
            timeout_secs = self.timeout.as_secs_f64(),
            "timeout, the index node has some progress task"
        );
        let pending = registry.in_progress_tasks();
        for task in &pending {
            warn!(
                kind = task.kind.as_str(),
                task = %task.key,
                cluster_id = %task.key.cluster_id,
                build_id = task.key.build_id,
                "progress task"
            );
        }
        DrainOutcome::TimedOut { pending }
    }
}
