// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S6: replaying a run whose skill reads a mutable external value must
//! surface the divergence as a mismatch without touching the originally
//! committed result row.

use orc_adapters::SkillOutcome;
use orc_core::{OpId, TenantId};
use orc_storage::ReplayStore;
use orc_wire::{OrchestratorService, SubmitRunRequest};
use serde_json::json;

use crate::support::{self, plan_with};

#[tokio::test]
async fn replay_after_an_external_value_changes_reports_a_mismatch() {
    let s = support::build();
    let tenant = TenantId::new();

    s.adapter.push(SkillOutcome::ok(json!({"balance": 100}), 1.0, 5));

    let run_id = s
        .engine
        .submit_run(SubmitRunRequest {
            tenant_id: tenant,
            agent_id: "agent".to_string(),
            plan: plan_with(support::PROBE_SKILL, json!({"account": "acct-1"})),
            idempotency_key: None,
        })
        .await
        .unwrap();

    let processed = s.executor.run_once("w1", 10, 0).await.unwrap();
    assert_eq!(processed, 1);

    let op_id = OpId::new(run_id, 0);
    let committed = s.replay.get(op_id).await.unwrap().expect("a succeeded op must have a replay log entry");

    // The external account balance changes between the original execution
    // and the replay: the skill reads fresh state and returns a different
    // result for the same canonical params.
    s.adapter.push(SkillOutcome::ok(json!({"balance": 85}), 1.0, 5));

    let report = s.engine.replay(run_id).await.unwrap();
    assert_eq!(report.run_id, run_id);
    assert_eq!(report.per_op.len(), 1);
    assert_eq!(report.per_op[0].op_index, 0);
    assert_eq!(report.per_op[0].verdict, "mismatch");

    // The committed row is append-only: replay never rewrites it.
    let after = s.replay.get(op_id).await.unwrap().expect("the original replay log entry must still exist");
    assert_eq!(after.canonical_result, committed.canonical_result);
    assert_eq!(after.result_hash, committed.result_hash);
    assert_eq!(after.committed_at_ms, committed.committed_at_ms);
}
