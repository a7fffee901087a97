// crates/task-registry/src/info.rs
//! Per-job records held by [`TaskRegistry`](crate::TaskRegistry).

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::types::IndexState;

/// Statistics reported by an index build.
///
/// Treated as an opaque blob by the registry: stored by deep copy and handed
/// back to the RPC layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub num_rows: i64,
    pub dim: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub index_params: BTreeMap<String, String>,
    pub pod_id: i64,
}

/// Mutable state of an index-build job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexTaskInfo {
    /// Cancels the job runner's work. Invoked by whoever deletes the record,
    /// never by the registry.
    #[serde(skip)]
    pub cancel: CancellationToken,
    pub state: IndexState,
    pub file_keys: Vec<String>,
    pub serialized_size: u64,
    pub fail_reason: String,
    pub current_index_version: i32,
    pub index_store_version: i64,
    pub statistic: Option<JobInfo>,
}

impl IndexTaskInfo {
    /// A fresh record with no results attached yet.
    pub fn new(cancel: CancellationToken, state: IndexState) -> Self {
        Self {
            cancel,
            state,
            file_keys: Vec::new(),
            serialized_size: 0,
            fail_reason: String::new(),
            current_index_version: 0,
            index_store_version: 0,
            statistic: None,
        }
    }
}

/// Mutable state of a data-analysis job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTaskInfo {
    #[serde(skip)]
    pub cancel: CancellationToken,
    pub state: IndexState,
    pub fail_reason: String,
    pub centroids_file: String,
    pub segments_offset_mapping: HashMap<i64, String>,
    pub index_store_version: i64,
}

impl AnalysisTaskInfo {
    pub fn new(cancel: CancellationToken, state: IndexState) -> Self {
        Self {
            cancel,
            state,
            fail_reason: String::new(),
            centroids_file: String::new(),
            segments_offset_mapping: HashMap::new(),
            index_store_version: 0,
        }
    }
}

/// Results of a successful index build, borrowed from the job runner.
///
/// The registry copies `file_keys` and `statistic` on store, so the runner is
/// free to reuse its buffers afterwards. `index_store_version` is `None` for
/// coordinators that predate storage versioning; the stored value is then left
/// as it was.
#[derive(Debug, Clone, Copy)]
pub struct IndexBuildResult<'a> {
    pub file_keys: &'a [String],
    pub serialized_size: u64,
    pub statistic: &'a JobInfo,
    pub current_index_version: i32,
    pub index_store_version: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_index_task_info_is_empty() {
        let info = IndexTaskInfo::new(CancellationToken::new(), IndexState::InProgress);
        assert_eq!(info.state, IndexState::InProgress);
        assert!(info.file_keys.is_empty());
        assert!(info.statistic.is_none());
        assert!(info.fail_reason.is_empty());
        assert!(!info.cancel.is_cancelled());
    }

    #[test]
    fn test_cloned_record_shares_cancellation() {
        let info = AnalysisTaskInfo::new(CancellationToken::new(), IndexState::InProgress);
        let snapshot = info.clone();
        info.cancel.cancel();
        assert!(snapshot.cancel.is_cancelled());
    }

    #[test]
    fn test_index_task_info_serialize_skips_cancel() {
        let mut info = IndexTaskInfo::new(CancellationToken::new(), IndexState::Finished);
        info.file_keys = vec!["files/1".to_string()];
        info.serialized_size = 42;

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("cancel").is_none());
        assert_eq!(json["state"], "Finished");
        assert_eq!(json["fileKeys"][0], "files/1");
        assert_eq!(json["serializedSize"], 42);
    }
}
