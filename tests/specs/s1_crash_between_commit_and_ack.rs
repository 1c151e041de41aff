// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S1: a worker commits an op's result (idempotency commit + outbox
//! insert) and crashes before the queue message is acked. A second
//! worker reclaims the op; `claim-or-return` must return `Cached` so the
//! skill body never runs twice, and the externally visible effect stays
//! exactly one outbox entry.

use std::sync::Arc;

use orc_adapters::{FakeSkillAdapter, SkillOutcome};
use orc_core::{canonical_json, OpStatus, Operation, OutboxEntry, Owner, RunId, WorkerId};
use orc_engine::skill_runtime::{SkillInvocation, SkillRuntime};
use orc_engine::{BudgetTracker, CircuitBreakerRegistry};
use orc_storage::{FakeIdempotencyStore, FakeOutboxStore, OutboxStore};
use serde_json::json;

fn invocation(op: &Operation, run_id: RunId, owner: Owner) -> SkillInvocation {
    SkillInvocation {
        run_id,
        op_index: op.id.index,
        skill_name: op.skill.clone(),
        params: op.params.clone(),
        owner,
        idempotency_key: op.fingerprint().to_hex(),
        budget_max: 10.0,
        deadline_ms: 5_000,
        attempt: op.attempt,
    }
}

#[tokio::test]
async fn crash_between_commit_and_ack_delivers_exactly_once() {
    let idempotency = Arc::new(FakeIdempotencyStore::new());
    let outbox = Arc::new(FakeOutboxStore::new());
    let runtime = SkillRuntime::new(idempotency.clone(), Arc::new(CircuitBreakerRegistry::default()), Arc::new(BudgetTracker::new()));

    let adapter = FakeSkillAdapter::new().with_outbox();
    adapter.push(SkillOutcome::ok(json!({"k": "x", "v": 1}), 1.0, 5));

    let run_id = RunId::new();
    let mut op = Operation::new(run_id, 0, "kv.set", json!({"k": "x", "v": 1}));

    let worker_a = WorkerId::from_string("worker-a");
    op.claim(worker_a, 0).unwrap();
    assert_eq!(op.attempt, 1);

    let outcome = runtime.execute(Arc::new(adapter.clone()), invocation(&op, run_id, Owner { worker_id: worker_a, attempt_id: 1 }), 0).await;
    let result = match outcome {
        SkillOutcome::Ok { result, .. } => result,
        SkillOutcome::Failed { message, .. } => panic!("expected Ok, got Failed: {message}"),
    };

    // Commit the durable side-effect. The op row never reaches `succeeded`
    // and the queue message never gets acked here: that's the crash.
    let canonical_result = canonical_json(&result);
    let entry = OutboxEntry::new(op.id, op.skill.clone(), canonical_result, op.fingerprint().to_hex(), 0);
    outbox.insert(&entry).await.unwrap();
    assert_eq!(adapter.calls().len(), 1);

    // Another worker reclaims the op: its lease expired so it was
    // released back to pending (the same transition `release_orphaned`
    // performs), then re-claimed with a bumped attempt count.
    op.release();
    let worker_b = WorkerId::from_string("worker-b");
    op.claim(worker_b, 5_000).unwrap();
    assert_eq!(op.attempt, 2);

    let second = runtime.execute(Arc::new(adapter.clone()), invocation(&op, run_id, Owner { worker_id: worker_b, attempt_id: 2 }), 5_000).await;
    match second {
        SkillOutcome::Ok { cache_hit, .. } => assert!(cache_hit, "reclaim must be served from the idempotency cache"),
        SkillOutcome::Failed { message, .. } => panic!("expected cached Ok, got Failed: {message}"),
    }

    // The skill body itself was invoked exactly once across both attempts.
    assert_eq!(adapter.calls().len(), 1);

    op.succeed(format!("op:{}", op.id));
    assert_eq!(op.status, OpStatus::Succeeded);
    assert_eq!(op.attempt, 2);
    assert_eq!(outbox.pending_count().await.unwrap(), 1);
}
