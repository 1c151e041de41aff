use super::*;
use crate::queue::TwoLaneQueue;
use orc_broker::{FakeBroker, HealthTracker};
use orc_core::{ApprovalMode, CandidateStatus, FailureKind, OpId, RunId, TenantId};
use orc_storage::{FakeCandidateStore, FakeDeadLetterStore, FakeFallbackQueueStore, FakeOpStore, FakeRunStore};

const CATALOG: &str = r#"
[[rule]]
name = "rate-limited-default"
kind = "RateLimited"
action = { type = "retry_as_is" }
retryable = true
priority = 0
"#;

type TestQueue = TwoLaneQueue<FakeBroker, FakeFallbackQueueStore, FakeOpStore>;

fn pipeline() -> RecoveryPipeline<FakeCandidateStore, FakeDeadLetterStore, FakeRunStore, FakeOpStore, TestQueue> {
    let ops = Arc::new(FakeOpStore::new());
    let queue = Arc::new(TwoLaneQueue::new(
        Arc::new(FakeBroker::new()),
        Arc::new(FakeFallbackQueueStore::new()),
        ops.clone(),
        Arc::new(HealthTracker::new(20, 0.5)),
        "workers",
    ));
    RecoveryPipeline::new(
        Arc::new(FakeCandidateStore::new()),
        Arc::new(FakeDeadLetterStore::new()),
        Arc::new(FakeRunStore::new()),
        ops,
        queue,
        FailureCatalog::from_toml_str(CATALOG).unwrap(),
        LearnedModel::default(),
    )
}

fn entry() -> DeadLetterEntry {
    DeadLetterEntry::new(OpId::new(RunId::new(), 0), "skill", Vec::new(), FailureKind::RateLimited, "429", 1, 0, true)
}

#[tokio::test]
async fn propose_tags_catalog_match_and_stores_heuristic_candidate() {
    let p = pipeline();
    let dl = entry();
    p.dead_letters.archive(&dl).await.unwrap();

    let candidates = p.propose(&dl, 0.5).await.unwrap();
    assert_eq!(candidates.len(), 1);

    let stored = p.dead_letters.get(dl.id).await.unwrap();
    assert_eq!(stored.catalog_match.as_deref(), Some("rate-limited-default"));
}

#[tokio::test]
async fn auto_policy_above_threshold_reinjects_immediately() {
    let p = pipeline();
    let dl = entry();
    p.dead_letters.archive(&dl).await.unwrap();
    let mut candidates = p.propose(&dl, 0.5).await.unwrap();

    let parent = Run::new(TenantId::new(), "agent-1", vec![StepDescriptor { skill: "echo".into(), params: serde_json::json!({}) }], 0);
    p.runs.insert(&parent).await.unwrap();

    let policy = orc_core::TenantPolicy { tenant_id: parent.tenant_id, approval_mode: ApprovalMode::Auto, auto_threshold: 0.5 };
    let reinjected = p.gate(&mut candidates[0], &policy, &parent, 100).await.unwrap();
    assert!(reinjected.is_some());
    assert_eq!(reinjected.unwrap().parent_run_id, Some(parent.id));
    assert_eq!(candidates[0].status, CandidateStatus::Executed);

    let dl_after = p.dead_letters.get(dl.id).await.unwrap();
    assert!(dl_after.recovered);
}

#[tokio::test]
async fn manual_policy_leaves_candidate_pending_for_approval() {
    let p = pipeline();
    let dl = entry();
    p.dead_letters.archive(&dl).await.unwrap();
    let mut candidates = p.propose(&dl, 0.5).await.unwrap();

    let parent = Run::new(TenantId::new(), "agent-1", vec![], 0);
    let policy = orc_core::TenantPolicy::manual(parent.tenant_id);
    let reinjected = p.gate(&mut candidates[0], &policy, &parent, 100).await.unwrap();
    assert!(reinjected.is_none());
    assert_eq!(candidates[0].status, CandidateStatus::Proposed);
}

#[tokio::test]
async fn human_approval_reinjects_a_manually_queued_candidate() {
    let p = pipeline();
    let dl = entry();
    p.dead_letters.archive(&dl).await.unwrap();
    let mut candidates = p.propose(&dl, 0.5).await.unwrap();

    let parent = Run::new(TenantId::new(), "agent-1", vec![StepDescriptor { skill: "echo".into(), params: serde_json::json!({}) }], 0);
    p.runs.insert(&parent).await.unwrap();

    let reinjected = p.approve(&mut candidates[0], "on-call", &parent, 100).await.unwrap();
    assert_eq!(reinjected.parent_run_id, Some(parent.id));
    assert_eq!(candidates[0].approver.as_deref(), Some("on-call"));
}

#[tokio::test]
async fn rejecting_a_candidate_never_touches_runs_or_dead_letters() {
    let p = pipeline();
    let dl = entry();
    p.dead_letters.archive(&dl).await.unwrap();
    let mut candidates = p.propose(&dl, 0.5).await.unwrap();

    p.reject(&mut candidates[0], "on-call", 100).await.unwrap();
    assert_eq!(candidates[0].status, CandidateStatus::Rejected);
    assert!(!p.dead_letters.get(dl.id).await.unwrap().recovered);
}
