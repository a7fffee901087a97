//! Graceful stop of an index node with jobs in various states.

use std::collections::HashMap;
use std::time::Duration;

use indexnode_node::IndexNode;
use indexnode_task_registry::{
    AnalysisTaskInfo, DrainController, DrainOutcome, IndexBuildResult, IndexState, IndexTaskInfo,
    JobInfo, TaskKey,
};
use tokio_util::sync::CancellationToken;

fn node(timeout_secs: u64) -> IndexNode {
    IndexNode::with_drain(
        DrainController::new(Duration::from_secs(timeout_secs))
            .with_poll_interval(Duration::from_secs(1)),
    )
}

#[tokio::test(start_paused = true)]
async fn stop_with_no_tasks_is_idle() {
    let node = node(30);
    let report = node.stop().await;

    assert_eq!(report.outcome, DrainOutcome::Idle);
    assert_eq!(report.cancelled_index_tasks, 0);
    assert_eq!(report.cancelled_analysis_tasks, 0);
    assert!(node.is_stopped());
}

#[tokio::test(start_paused = true)]
async fn stop_waits_for_build_then_cancels_everything() {
    let node = node(30);
    let registry = node.registry();

    let build_key = TaskKey::new("C1", 100);
    let build_token = node.job_token();
    registry.load_or_store_index_task(
        build_key.clone(),
        IndexTaskInfo::new(build_token.clone(), IndexState::InProgress),
    );

    let finished_key = TaskKey::new("C1", 200);
    let finished_token = node.job_token();
    registry.load_or_store_analysis_task(
        finished_key.clone(),
        AnalysisTaskInfo::new(finished_token.clone(), IndexState::Finished),
    );

    let runner = node.registry();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let stats = JobInfo {
            num_rows: 10,
            dim: 8,
            ..JobInfo::default()
        };
        runner.store_index_files_and_statistic(
            &build_key,
            IndexBuildResult {
                file_keys: &["files/100/0".to_string()],
                serialized_size: 512,
                statistic: &stats,
                current_index_version: 4,
                index_store_version: Some(2),
            },
        );
        runner.store_index_task_state(&build_key, IndexState::Finished, "");
    });

    let report = node.stop().await;

    assert_eq!(report.outcome, DrainOutcome::Drained);
    assert_eq!(report.cancelled_index_tasks, 1);
    assert_eq!(report.cancelled_analysis_tasks, 1);
    assert!(build_token.is_cancelled());
    assert!(finished_token.is_cancelled());
    assert_eq!(registry.len_index_tasks(), 0);
    assert_eq!(registry.len_analysis_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_proceeds_after_timeout() {
    let node = node(3);
    let registry = node.registry();
    let token = node.job_token();
    registry.load_or_store_analysis_task(
        TaskKey::new("C1", 200),
        AnalysisTaskInfo::new(token.clone(), IndexState::InProgress),
    );
    registry.store_analysis_statistic(
        &TaskKey::new("C1", 200),
        "centroids",
        HashMap::from([(1, "offsets/1".to_string())]),
    );

    let start = tokio::time::Instant::now();
    let report = node.stop().await;

    assert!(start.elapsed() >= Duration::from_secs(3));
    assert!(matches!(report.outcome, DrainOutcome::TimedOut { ref pending } if pending.len() == 1));
    assert_eq!(report.cancelled_analysis_tasks, 1);
    assert!(token.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn second_stop_is_a_noop() {
    let node = node(3);
    node.registry().load_or_store_index_task(
        TaskKey::new("C1", 1),
        IndexTaskInfo::new(CancellationToken::new(), IndexState::Failed),
    );

    let first = node.stop().await;
    assert_eq!(first.cancelled_index_tasks, 1);

    let second = node.stop().await;
    assert_eq!(second.outcome, DrainOutcome::Idle);
    assert_eq!(second.cancelled_index_tasks, 0);
}

#[test]
fn job_tokens_follow_node_lifecycle() {
    let node = IndexNode::default();
    let token = node.job_token();
    token.cancel();
    assert!(!node.is_stopped(), "cancelling a job must not stop the node");
}
