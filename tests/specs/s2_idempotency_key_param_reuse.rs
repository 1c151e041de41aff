// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S2: submitting the same idempotency key twice with two different plans
//! must reject the second submission and never create a second run.

use orc_core::TenantId;
use orc_storage::RunStore;
use orc_wire::{OrchestratorService, SubmissionError, SubmitRunRequest};
use serde_json::json;

use crate::support::{self, plan_with};

#[tokio::test]
async fn second_submission_with_mismatched_plan_is_rejected() {
    let s = support::build();
    let tenant = TenantId::new();

    let run_a = s
        .engine
        .submit_run(SubmitRunRequest {
            tenant_id: tenant,
            agent_id: "agent".to_string(),
            plan: plan_with(support::PROBE_SKILL, json!({"v": 1})),
            idempotency_key: Some("K".to_string()),
        })
        .await
        .unwrap();

    let err = s
        .engine
        .submit_run(SubmitRunRequest {
            tenant_id: tenant,
            agent_id: "agent".to_string(),
            plan: plan_with(support::PROBE_SKILL, json!({"v": 2})),
            idempotency_key: Some("K".to_string()),
        })
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::ParamMismatch);

    let runs = s.runs.list_by_tenant(tenant, None).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, run_a);
}

#[tokio::test]
async fn second_submission_with_identical_plan_returns_the_same_run() {
    let s = support::build();
    let tenant = TenantId::new();
    let plan = plan_with(support::PROBE_SKILL, json!({"v": 1}));

    let run_a = s
        .engine
        .submit_run(SubmitRunRequest { tenant_id: tenant, agent_id: "agent".to_string(), plan: plan.clone(), idempotency_key: Some("K".to_string()) })
        .await
        .unwrap();

    let run_b = s
        .engine
        .submit_run(SubmitRunRequest { tenant_id: tenant, agent_id: "agent".to_string(), plan, idempotency_key: Some("K".to_string()) })
        .await
        .unwrap();

    assert_eq!(run_a, run_b);
    let runs = s.runs.list_by_tenant(tenant, None).await.unwrap();
    assert_eq!(runs.len(), 1);
}
