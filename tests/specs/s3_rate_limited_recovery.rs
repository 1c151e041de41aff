// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S3: a rate-limited op (retryable, non-terminal) must come back off the
//! backoff delay and succeed without ever reaching the dead-letter
//! archive, delivering its side effect exactly once.

use orc_adapters::SkillOutcome;
use orc_core::{FailureKind, OpId, OpStatus, TenantId};
use orc_engine::backoff::compute_backoff_ms;
use orc_storage::OpStore;
use orc_wire::{OrchestratorService, SubmitRunRequest};
use serde_json::json;

use crate::support::{self, plan_with};

#[tokio::test]
async fn rate_limited_op_recovers_after_its_backoff_window() {
    let s = support::build();
    s.adapter.clone().with_outbox();
    s.adapter.push(SkillOutcome::failed(FailureKind::RateLimited, "429 too many requests", 1));
    s.adapter.push(SkillOutcome::ok(json!({"sent": true}), 1.0, 5));

    let tenant = TenantId::new();
    let run_id = s
        .engine
        .submit_run(SubmitRunRequest {
            tenant_id: tenant,
            agent_id: "agent".to_string(),
            plan: plan_with(support::PROBE_SKILL, json!({"channel": "#ops"})),
            idempotency_key: None,
        })
        .await
        .unwrap();

    let op_id = OpId::new(run_id, 0);

    let processed = s.executor.run_once("w1", 10, 0).await.unwrap();
    assert_eq!(processed, 1);
    let op = s.ops.get(op_id).await.unwrap();
    assert_eq!(op.status, OpStatus::Pending, "retryable failure must return the op to pending, not dead-letter it");
    assert!(s.dead_letters.list_unmatched().await.unwrap().is_empty());

    let delay = compute_backoff_ms(run_id, 1);

    let too_early = s.executor.run_once("w1", 10, delay.saturating_sub(1)).await.unwrap();
    assert_eq!(too_early, 0, "op must not be visible before its backoff delay elapses");

    let recovered = s.executor.run_once("w1", 10, delay).await.unwrap();
    assert_eq!(recovered, 1);

    let op = s.ops.get(op_id).await.unwrap();
    assert_eq!(op.status, OpStatus::Succeeded);
    assert_eq!(s.outbox.pending_count().await.unwrap(), 1, "exactly one delivered side effect");
    assert!(s.dead_letters.list_unmatched().await.unwrap().is_empty(), "a retried-and-succeeded op leaves no dead letter");
}
