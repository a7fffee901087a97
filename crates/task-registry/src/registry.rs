// crates/task-registry/src/registry.rs
//! Lock-guarded store of every build and analysis job known to this node.
//!
//! Both maps sit behind a single [`Mutex`] so aggregate queries such as
//! [`TaskRegistry::has_in_progress_task`] see the two job kinds at the same
//! instant. Every operation holds the lock for its whole body and nothing
//! longer; cancellation tokens are never fired under it.
//!
//! Missing keys are not errors. A job whose record was already deleted by the
//! coordinator may still report a late state change, and that update is
//! dropped silently.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::info::{AnalysisTaskInfo, IndexBuildResult, IndexTaskInfo};
use crate::types::{IndexState, PendingTask, TaskKey, TaskKind};

#[derive(Default)]
struct Tasks {
    index: HashMap<TaskKey, IndexTaskInfo>,
    analysis: HashMap<TaskKey, AnalysisTaskInfo>,
}

/// Per-state counts across both job kinds, taken under one lock acquisition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub index_tasks: usize,
    pub analysis_tasks: usize,
    pub in_progress: usize,
    pub finished: usize,
    pub failed: usize,
}

impl JobStats {
    fn count(&mut self, state: IndexState) {
        match state {
            IndexState::InProgress => self.in_progress += 1,
            IndexState::Finished => self.finished += 1,
            IndexState::Failed => self.failed += 1,
            _ => {}
        }
    }
}

/// Node-wide registry of job records.
///
/// Share it behind an `Arc`. Lookups return owned snapshots; deletions move
/// the record out to the caller, who then owns its cancellation token.
pub struct TaskRegistry {
    tasks: Mutex<Tasks>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Tasks::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tasks> {
        match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("task registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    // -- Index build tasks ----------------------------------------------------

    /// Register a build job unless one already exists for `key`.
    ///
    /// Returns a snapshot of the existing record when the key was taken (the
    /// new `info` is dropped), or `None` when `info` was inserted.
    pub fn load_or_store_index_task(
        &self,
        key: TaskKey,
        info: IndexTaskInfo,
    ) -> Option<IndexTaskInfo> {
        let mut tasks = self.lock();
        match tasks.index.entry(key) {
            Entry::Occupied(existing) => Some(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(info);
                None
            }
        }
    }

    /// State of a build job, or [`IndexState::None`] if it is not registered.
    pub fn load_index_task_state(&self, key: &TaskKey) -> IndexState {
        self.lock()
            .index
            .get(key)
            .map_or(IndexState::None, |task| task.state)
    }

    /// Overwrite state and fail reason of a build job. No-op if absent.
    pub fn store_index_task_state(
        &self,
        key: &TaskKey,
        state: IndexState,
        fail_reason: impl Into<String>,
    ) {
        let mut tasks = self.lock();
        if let Some(task) = tasks.index.get_mut(key) {
            let fail_reason = fail_reason.into();
            debug!(
                cluster_id = %key.cluster_id,
                build_id = key.build_id,
                state = %state,
                fail_reason = %fail_reason,
                "store index task state"
            );
            task.state = state;
            task.fail_reason = fail_reason;
        }
    }

    /// Visit every build job while holding the registry lock.
    ///
    /// `f` must not call back into the registry; the lock is not reentrant.
    pub fn for_each_index_task(&self, mut f: impl FnMut(&TaskKey, &IndexTaskInfo)) {
        let tasks = self.lock();
        for (key, info) in tasks.index.iter() {
            f(key, info);
        }
    }

    /// Snapshot of a build job's record.
    pub fn get_index_task_info(&self, key: &TaskKey) -> Option<IndexTaskInfo> {
        self.lock().index.get(key).cloned()
    }

    /// Attach the outputs of a finished build. No-op if absent.
    ///
    /// `file_keys` and `statistic` are copied. The stored
    /// `index_store_version` only changes when the result carries one.
    pub fn store_index_files_and_statistic(&self, key: &TaskKey, result: IndexBuildResult<'_>) {
        let mut tasks = self.lock();
        if let Some(info) = tasks.index.get_mut(key) {
            info.file_keys = result.file_keys.to_vec();
            info.serialized_size = result.serialized_size;
            info.statistic = Some(result.statistic.clone());
            info.current_index_version = result.current_index_version;
            if let Some(version) = result.index_store_version {
                info.index_store_version = version;
            }
        }
    }

    /// Remove the given build jobs and hand their records back.
    ///
    /// Absent keys are skipped; the result follows input order.
    pub fn delete_index_task_infos(&self, keys: &[TaskKey]) -> Vec<IndexTaskInfo> {
        let mut tasks = self.lock();
        let mut deleted = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(info) = tasks.index.remove(key) {
                info!(
                    cluster_id = %key.cluster_id,
                    build_id = key.build_id,
                    "delete task infos"
                );
                deleted.push(info);
            }
        }
        deleted
    }

    /// Empty the build map, returning everything it held.
    pub fn delete_all_index_tasks(&self) -> Vec<IndexTaskInfo> {
        let deleted = std::mem::take(&mut self.lock().index);
        deleted.into_values().collect()
    }

    pub fn len_index_tasks(&self) -> usize {
        self.lock().index.len()
    }

    // -- Analysis tasks -------------------------------------------------------

    /// Register an analysis job unless one already exists for `key`.
    pub fn load_or_store_analysis_task(
        &self,
        key: TaskKey,
        info: AnalysisTaskInfo,
    ) -> Option<AnalysisTaskInfo> {
        let mut tasks = self.lock();
        match tasks.analysis.entry(key) {
            Entry::Occupied(existing) => Some(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(info);
                None
            }
        }
    }

    pub fn load_analysis_task_state(&self, key: &TaskKey) -> IndexState {
        self.lock()
            .analysis
            .get(key)
            .map_or(IndexState::None, |task| task.state)
    }

    /// Overwrite state and fail reason of an analysis job. No-op if absent.
    pub fn store_analysis_task_state(
        &self,
        key: &TaskKey,
        state: IndexState,
        fail_reason: impl Into<String>,
    ) {
        let mut tasks = self.lock();
        if let Some(task) = tasks.analysis.get_mut(key) {
            let fail_reason = fail_reason.into();
            info!(
                cluster_id = %key.cluster_id,
                task_id = key.build_id,
                state = %state,
                fail_reason = %fail_reason,
                "store analysis task state"
            );
            task.state = state;
            task.fail_reason = fail_reason;
        }
    }

    /// Visit every analysis job while holding the registry lock.
    pub fn for_each_analysis_task(&self, mut f: impl FnMut(&TaskKey, &AnalysisTaskInfo)) {
        let tasks = self.lock();
        for (key, info) in tasks.analysis.iter() {
            f(key, info);
        }
    }

    pub fn get_analysis_task_info(&self, key: &TaskKey) -> Option<AnalysisTaskInfo> {
        self.lock().analysis.get(key).cloned()
    }

    /// Attach the outputs of a finished analysis. No-op if absent.
    ///
    /// The mapping is moved in and replaces the stored one wholesale.
    pub fn store_analysis_statistic(
        &self,
        key: &TaskKey,
        centroids_file: impl Into<String>,
        segments_offset_mapping: HashMap<i64, String>,
    ) {
        let mut tasks = self.lock();
        if let Some(info) = tasks.analysis.get_mut(key) {
            info.centroids_file = centroids_file.into();
            info.segments_offset_mapping = segments_offset_mapping;
        }
    }

    pub fn delete_analysis_task_infos(&self, keys: &[TaskKey]) -> Vec<AnalysisTaskInfo> {
        let mut tasks = self.lock();
        let mut deleted = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(info) = tasks.analysis.remove(key) {
                info!(
                    cluster_id = %key.cluster_id,
                    task_id = key.build_id,
                    "delete analysis task infos"
                );
                deleted.push(info);
            }
        }
        deleted
    }

    pub fn delete_all_analysis_tasks(&self) -> Vec<AnalysisTaskInfo> {
        let deleted = std::mem::take(&mut self.lock().analysis);
        deleted.into_values().collect()
    }

    pub fn len_analysis_tasks(&self) -> usize {
        self.lock().analysis.len()
    }

    // -- Aggregates -----------------------------------------------------------

    /// True if any job of either kind is currently `InProgress`.
    pub fn has_in_progress_task(&self) -> bool {
        let tasks = self.lock();
        tasks
            .index
            .values()
            .any(|info| info.state == IndexState::InProgress)
            || tasks
                .analysis
                .values()
                .any(|info| info.state == IndexState::InProgress)
    }

    /// Every job of either kind that is currently `InProgress`, build jobs
    /// first, each group ordered by key.
    pub fn in_progress_tasks(&self) -> Vec<PendingTask> {
        let tasks = self.lock();
        let mut index: Vec<PendingTask> = tasks
            .index
            .iter()
            .filter(|(_, info)| info.state == IndexState::InProgress)
            .map(|(key, _)| PendingTask {
                kind: TaskKind::Index,
                key: key.clone(),
            })
            .collect();
        let mut analysis: Vec<PendingTask> = tasks
            .analysis
            .iter()
            .filter(|(_, info)| info.state == IndexState::InProgress)
            .map(|(key, _)| PendingTask {
                kind: TaskKind::Analysis,
                key: key.clone(),
            })
            .collect();
        drop(tasks);

        index.sort_by(|a, b| a.key.cmp(&b.key));
        analysis.sort_by(|a, b| a.key.cmp(&b.key));
        index.extend(analysis);
        index
    }

    /// Counts by state across both maps.
    pub fn job_stats(&self) -> JobStats {
        let tasks = self.lock();
        let mut stats = JobStats {
            index_tasks: tasks.index.len(),
            analysis_tasks: tasks.analysis.len(),
            ..JobStats::default()
        };
        for info in tasks.index.values() {
            stats.count(info.state);
        }
        for info in tasks.analysis.values() {
            stats.count(info.state);
        }
        stats
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
