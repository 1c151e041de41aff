use super::*;
use crate::budget::BudgetTracker;
use crate::circuit_breaker::CircuitBreakerRegistry;
use crate::queue::TwoLaneQueue;
use orc_adapters::{EchoSkill, SkillRegistry, WebhookSkill};
use orc_broker::{FakeBroker, HealthTracker};
use orc_core::{OpId, Operation, RunId};
use orc_storage::{
    FakeAuditStore, FakeDeadLetterStore, FakeFallbackQueueStore, FakeIdempotencyStore, FakeLockStore, FakeOpStore, FakeOutboxStore,
    FakeReplayStore, FakeRunStore, OpStore, RunStore,
};

type TestQueue = TwoLaneQueue<FakeBroker, FakeFallbackQueueStore, FakeOpStore>;
type TestExecutor = OpExecutor<TestQueue, FakeOpStore, FakeIdempotencyStore, FakeLockStore>;

fn fixture(max_attempts: u32) -> (Arc<TestQueue>, Arc<FakeOpStore>, Arc<FakeDeadLetterStore>, Arc<FakeOutboxStore>, Arc<FakeRunStore>, TestExecutor) {
    let ops = Arc::new(FakeOpStore::new());
    let runs = Arc::new(FakeRunStore::new());
    let queue = Arc::new(TwoLaneQueue::new(
        Arc::new(FakeBroker::new()),
        Arc::new(FakeFallbackQueueStore::new()),
        ops.clone(),
        Arc::new(HealthTracker::new(20, 0.5)),
        "workers",
    ));
    let locks = Arc::new(FakeLockStore::new());
    let idempotency = Arc::new(FakeIdempotencyStore::new());
    let dead_letters = Arc::new(FakeDeadLetterStore::new());
    let outbox = Arc::new(FakeOutboxStore::new());
    let replay = Arc::new(FakeReplayStore::new());
    let audit = Arc::new(FakeAuditStore::new());

    let mut registry = SkillRegistry::new();
    registry.register("echo", Arc::new(EchoSkill));
    registry.register("webhook", Arc::new(WebhookSkill));

    let runtime = Arc::new(SkillRuntime::new(idempotency.clone(), Arc::new(CircuitBreakerRegistry::default()), Arc::new(BudgetTracker::new())));

    let config = OpExecutorConfig { worker_id: WorkerId::from_string("w-test"), lease_ms: 30_000, deadline_ms: 5_000, budget_max: 100.0, max_attempts };

    let executor = OpExecutor::new(
        queue.clone(),
        ops.clone(),
        runs.clone(),
        locks,
        Arc::new(registry),
        runtime,
        dead_letters.clone(),
        outbox.clone(),
        replay,
        audit,
        config,
    );

    (queue, ops, dead_letters, outbox, runs, executor)
}

async fn seed_run(runs: &FakeRunStore, run_id: RunId) {
    let run = orc_core::Run::builder().id(run_id).build();
    runs.insert(&run).await.unwrap();
}

#[tokio::test]
async fn successful_op_is_acked_and_marked_succeeded() {
    let (queue, ops, _dead_letters, _outbox, runs, executor) = fixture(3);
    let run_id = RunId::new();
    seed_run(&runs, run_id).await;
    let op = Operation::new(run_id, 0, "echo", serde_json::json!({"x": 1}));
    ops.insert_many(&[op.clone()]).await.unwrap();
    queue.enqueue(op.id, serde_json::json!({"run_id": run_id.as_str(), "op_index": 0}), 0).await.unwrap();

    let processed = executor.run_once("w1", 10, 0).await.unwrap();
    assert_eq!(processed, 1);

    let saved = ops.get(op.id).await.unwrap();
    assert_eq!(saved.status, orc_core::OpStatus::Succeeded);

    let run = runs.get(run_id).await.unwrap();
    assert_eq!(run.status, orc_core::RunStatus::Succeeded);
}

#[tokio::test]
async fn webhook_success_writes_an_outbox_entry() {
    let (queue, ops, _dead_letters, outbox, runs, executor) = fixture(3);
    let run_id = RunId::new();
    seed_run(&runs, run_id).await;
    let op = Operation::new(run_id, 0, "webhook", serde_json::json!({"url": "https://example.test/hook"}));
    ops.insert_many(&[op.clone()]).await.unwrap();
    queue.enqueue(op.id, serde_json::json!({"run_id": run_id.as_str(), "op_index": 0}), 0).await.unwrap();

    executor.run_once("w1", 10, 0).await.unwrap();

    assert_eq!(outbox.pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn non_retryable_failure_dead_letters_the_op() {
    let (queue, ops, dead_letters, _outbox, runs, executor) = fixture(3);
    let run_id = RunId::new();
    seed_run(&runs, run_id).await;
    let op = Operation::new(run_id, 0, "webhook", serde_json::json!({}));
    ops.insert_many(&[op.clone()]).await.unwrap();
    queue.enqueue(op.id, serde_json::json!({"run_id": run_id.as_str(), "op_index": 0}), 0).await.unwrap();

    executor.run_once("w1", 10, 0).await.unwrap();

    let saved = ops.get(op.id).await.unwrap();
    assert_eq!(saved.status, orc_core::OpStatus::Dead);
    let archived = dead_letters.list_unmatched().await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].op_id, op.id);

    let run = runs.get(run_id).await.unwrap();
    assert_eq!(run.status, orc_core::RunStatus::Failed);
}

#[tokio::test]
async fn an_op_behind_an_earlier_unfinished_sibling_is_not_executed() {
    let (queue, ops, _dead_letters, _outbox, runs, executor) = fixture(3);
    let run_id = RunId::new();
    seed_run(&runs, run_id).await;
    let earlier = Operation::new(run_id, 0, "echo", serde_json::json!({}));
    let later = Operation::new(run_id, 1, "echo", serde_json::json!({}));
    ops.insert_many(&[earlier.clone(), later.clone()]).await.unwrap();
    queue.enqueue(later.id, serde_json::json!({"run_id": run_id.as_str(), "op_index": 1}), 0).await.unwrap();

    executor.run_once("w1", 10, 0).await.unwrap();

    let saved = ops.get(later.id).await.unwrap();
    assert_eq!(saved.status, orc_core::OpStatus::Pending);
    assert_eq!(saved.attempt, 0);
}
