// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S5: while the primary broker is unhealthy, submissions enqueue onto the
//! fallback lane. Once the broker recovers, the reconciler migrates the
//! backlog to primary exactly once each, and workers consume normally with
//! nothing lost or duplicated.

use orc_core::{OpId, OpStatus, TenantId};
use orc_engine::Queue;
use orc_storage::{FallbackQueueStore, OpStore};
use orc_wire::{OrchestratorService, SubmitRunRequest};
use serde_json::json;

use crate::support::{self, plan_with};

#[tokio::test]
async fn three_runs_submitted_during_an_outage_migrate_exactly_once() {
    let s = support::build();
    let tenant = TenantId::new();

    // Degrade the primary lane below its health threshold (10+ samples,
    // >=50% failures out of a 20-sample window).
    for _ in 0..10 {
        s.health.record(false);
    }
    assert!(s.health.is_unhealthy());

    let mut run_ids = Vec::new();
    for i in 0..3 {
        for _ in 0..5 {
            s.adapter.push(orc_adapters::SkillOutcome::ok(json!({"n": i}), 1.0, 1));
        }
        let run_id = s
            .engine
            .submit_run(SubmitRunRequest {
                tenant_id: tenant,
                agent_id: "agent".to_string(),
                plan: plan_with(support::PROBE_SKILL, json!({"n": i})),
                idempotency_key: None,
            })
            .await
            .unwrap();
        run_ids.push(run_id);
    }

    assert_eq!(s.fallback.depth().await.unwrap(), 3, "all three ops must land on the fallback lane during the outage");

    // The broker recovers: enough healthy samples push the failure ratio
    // back under threshold.
    for _ in 0..20 {
        s.health.record(true);
    }
    assert!(!s.health.is_unhealthy());

    let migrated = s.queue.reconcile_fallback(10, 30_000).await.unwrap();
    assert_eq!(migrated, 3, "the reconciler must migrate every backlog item in one pass");
    assert_eq!(s.fallback.depth().await.unwrap(), 0, "a migrated item must not remain in the fallback lane");

    let processed = s.executor.run_once("w1", 10, 30_000).await.unwrap();
    assert_eq!(processed, 3, "workers must consume the migrated ops normally, with nothing lost or duplicated");

    for run_id in run_ids {
        let op = s.ops.get(OpId::new(run_id, 0)).await.unwrap();
        assert_eq!(op.status, OpStatus::Succeeded);
    }
}
