// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S4: a non-retryable failure dead-letters its op; the catalog's
//! route-to-alt-skill rule proposes a recovery candidate that auto-executes
//! under a permissive tenant policy, reinjecting a child run on the alt
//! skill while the original run stays terminal `failed`.

use orc_core::{ApprovalMode, FailureKind, OpId, OpStatus, Run, RunStatus, TenantId, TenantPolicy};
use orc_engine::FailureCatalog;
use orc_adapters::SkillOutcome;
use orc_storage::{OpStore, RunStore};
use orc_wire::{OrchestratorService, SubmitRunRequest};
use serde_json::json;

use crate::support::{self, plan_with};

const ROUTE_TO_ALT_CATALOG: &str = r#"
[[rule]]
name = "schema-mismatch-reroute"
kind = "SchemaMismatch"
action = { type = "route_to_alt_skill", skill = "probe.invoke.v2" }
retryable = false
priority = 0
"#;

#[tokio::test]
async fn dead_lettered_op_auto_recovers_onto_the_alt_skill() {
    let s = support::build_with_catalog(FailureCatalog::from_toml_str(ROUTE_TO_ALT_CATALOG).unwrap());
    let tenant = TenantId::new();
    s.tenant_policies.upsert(&TenantPolicy { tenant_id: tenant, approval_mode: ApprovalMode::Auto, auto_threshold: 0.8 }).await.unwrap();

    s.adapter.push(SkillOutcome::failed(FailureKind::SchemaMismatch, "unexpected field `foo`", 1));

    let params = json!({"to": "user@example.com"});
    let run_id = s
        .engine
        .submit_run(SubmitRunRequest {
            tenant_id: tenant,
            agent_id: "agent".to_string(),
            plan: plan_with(support::PROBE_SKILL, params.clone()),
            idempotency_key: None,
        })
        .await
        .unwrap();

    let processed = s.executor.run_once("w1", 10, 0).await.unwrap();
    assert_eq!(processed, 1);

    let op = s.ops.get(OpId::new(run_id, 0)).await.unwrap();
    assert_eq!(op.status, OpStatus::Dead, "a non-retryable failure must dead-letter the op directly");

    let entries = s.dead_letters.list_unmatched().await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = entries.into_iter().next().unwrap();
    assert_eq!(entry.op_id, op.id);
    assert!(!entry.recovered);

    // The worker marks the run terminal itself once every sibling op is
    // terminal; the recovery pipeline only ever reads and reinjects, never
    // mutates the terminal row it recovers from (S9).
    let parent = s.runs.get(run_id).await.unwrap();
    assert_eq!(parent.status, RunStatus::Failed, "a dead-lettered, plan-exhausted run must already be terminal failed");

    let summaries = s.engine.propose_recovery(entry.id).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, "executed");

    let recovered_entry = s.dead_letters.get(entry.id).await.unwrap();
    assert!(recovered_entry.recovered, "dead-letter must be marked recovered once its candidate executes");
    assert_eq!(recovered_entry.catalog_match.as_deref(), Some("schema-mismatch-reroute"));

    let children: Vec<Run> = s.runs.list_by_tenant(tenant, None).await.unwrap().into_iter().filter(|r| r.parent_run_id == Some(run_id)).collect();
    assert_eq!(children.len(), 1);
    let child = &children[0];
    assert_eq!(child.plan.len(), 1);
    assert_eq!(child.plan[0].skill, support::ALT_SKILL);
    assert_eq!(child.plan[0].params, params, "reinjection must carry the same canonical params");

    // The original run is untouched by recovery and stays terminal failed.
    let original = s.runs.get(run_id).await.unwrap();
    assert_eq!(original.status, RunStatus::Failed);

    // The recovery pipeline already enqueued the child's op through the same
    // queue/idempotency path admission uses; drive it to completion.
    s.alt_adapter.push(SkillOutcome::ok(json!({"sent": true}), 1.0, 5));

    let child_processed = s.executor.run_once("w1", 10, 0).await.unwrap();
    assert_eq!(child_processed, 1);
    let child_op_after = s.ops.get(OpId::new(child.id, 0)).await.unwrap();
    assert_eq!(child_op_after.status, OpStatus::Succeeded);
    assert_eq!(s.runs.get(child.id).await.unwrap().status, RunStatus::Succeeded);
}
