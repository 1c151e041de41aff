use super::*;
use crate::queue::{LaneToken, QueuedOp};
use orc_broker::FakeBroker;
use orc_core::TenantId;
use orc_storage::{FakeFallbackQueueStore, FakeIdempotencyStore, FakeOpStore, FakeRunStore};
use std::sync::Arc;

fn fixture(max_active: Option<u32>) -> RunAdmission<FakeRunStore, FakeOpStore, crate::queue::TwoLaneQueue<FakeBroker, FakeFallbackQueueStore, FakeOpStore>, FakeIdempotencyStore> {
    let runs = Arc::new(FakeRunStore::new());
    let ops = Arc::new(FakeOpStore::new());
    let queue = Arc::new(crate::queue::TwoLaneQueue::new(
        Arc::new(FakeBroker::new()),
        Arc::new(FakeFallbackQueueStore::new()),
        ops.clone(),
        Arc::new(orc_broker::HealthTracker::new(20, 0.5)),
        "workers",
    ));
    let idempotency = Arc::new(FakeIdempotencyStore::new());
    RunAdmission::new(runs, ops, queue, idempotency, max_active)
}

fn plan() -> Vec<StepDescriptor> {
    vec![StepDescriptor { skill: "echo".to_string(), params: serde_json::json!({}) }]
}

#[tokio::test]
async fn submit_without_key_always_creates_a_new_run() {
    let admission = fixture(None);
    let tenant = TenantId::new();
    let a = admission.submit(tenant, "agent", plan(), None, 0).await.unwrap();
    let b = admission.submit(tenant, "agent", plan(), None, 0).await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn submit_with_same_key_and_plan_returns_the_same_run() {
    let admission = fixture(None);
    let tenant = TenantId::new();
    let a = admission.submit(tenant, "agent", plan(), Some("k1".to_string()), 0).await.unwrap();
    let b = admission.submit(tenant, "agent", plan(), Some("k1".to_string()), 0).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn submit_with_same_key_and_different_plan_is_rejected() {
    let admission = fixture(None);
    let tenant = TenantId::new();
    admission.submit(tenant, "agent", plan(), Some("k1".to_string()), 0).await.unwrap();

    let other_plan = vec![StepDescriptor { skill: "noop".to_string(), params: serde_json::json!({}) }];
    let err = admission.submit(tenant, "agent", other_plan, Some("k1".to_string()), 0).await.unwrap_err();
    assert_eq!(err, orc_wire::SubmissionError::ParamMismatch);
}

#[tokio::test]
async fn submit_rejects_once_tenant_hits_its_active_run_cap() {
    let admission = fixture(Some(1));
    let tenant = TenantId::new();
    admission.submit(tenant, "agent", plan(), None, 0).await.unwrap();

    let err = admission.submit(tenant, "agent", plan(), None, 0).await.unwrap_err();
    assert_eq!(err, orc_wire::SubmissionError::BudgetExceeded);
}

#[tokio::test]
async fn submit_enqueues_one_op_per_plan_step() {
    let admission = fixture(None);
    let tenant = TenantId::new();
    let run_id = admission.submit(tenant, "agent", plan(), None, 0).await.unwrap();

    let claimed: Vec<QueuedOp> = admission.queue.claim("consumer-1", 10, 0).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].op_id.run_id, run_id);
    assert!(matches!(claimed[0].lane_token, LaneToken::Primary { .. }));
}
