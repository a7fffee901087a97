// crates/task-registry/src/types.rs
//! Identity and lifecycle types shared by both job kinds.

use std::fmt;

use serde::Serialize;

/// Unique identity of a job on this node: the coordinator cluster it came
/// from plus the coordinator-assigned numeric id.
///
/// Build jobs and analysis jobs use the same key shape but live in separate
/// maps, so the same `(cluster_id, build_id)` may exist once per kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskKey {
    pub cluster_id: String,
    pub build_id: i64,
}

impl TaskKey {
    pub fn new(cluster_id: impl Into<String>, build_id: i64) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            build_id,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cluster_id, self.build_id)
    }
}

/// Lifecycle state of a job, as defined by the coordinator protocol.
///
/// `None` is what lookups report for a key with no record; the registry
/// itself never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[repr(i32)]
pub enum IndexState {
    #[default]
    None = 0,
    Unissued = 1,
    InProgress = 2,
    Finished = 3,
    Failed = 4,
    Retry = 5,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "IndexStateNone",
            Self::Unissued => "Unissued",
            Self::InProgress => "InProgress",
            Self::Finished => "Finished",
            Self::Failed => "Failed",
            Self::Retry => "Retry",
        }
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two registry maps a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Index,
    Analysis,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Analysis => "analysis",
        }
    }
}

/// A record that was still `InProgress` when inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTask {
    pub kind: TaskKind,
    pub key: TaskKey,
}
