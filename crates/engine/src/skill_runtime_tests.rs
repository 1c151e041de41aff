use super::*;
use orc_adapters::{EchoSkill, FakeSkillAdapter, WebhookSkill};
use orc_core::WorkerId;
use orc_storage::FakeIdempotencyStore;
use serde_json::json;

fn owner() -> Owner {
    Owner { worker_id: WorkerId::new(), attempt_id: 1 }
}

fn invocation(params: Value) -> SkillInvocation {
    SkillInvocation {
        run_id: RunId::new(),
        op_index: 0,
        skill_name: "echo".to_string(),
        params,
        owner: owner(),
        idempotency_key: "key-1".to_string(),
        budget_max: 10.0,
        deadline_ms: 1_000,
        attempt: 1,
    }
}

fn runtime() -> SkillRuntime<FakeIdempotencyStore> {
    SkillRuntime::new(
        Arc::new(FakeIdempotencyStore::new()),
        Arc::new(CircuitBreakerRegistry::new(20, 0.5, 1_000)),
        Arc::new(BudgetTracker::new()),
    )
}

#[tokio::test]
async fn successful_invocation_returns_ok_and_commits() {
    let rt = runtime();
    let outcome = rt.execute(Arc::new(EchoSkill), invocation(json!({"a": 1})), 0).await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn second_call_with_same_key_and_params_returns_cached_result() {
    let rt = runtime();
    let inv = invocation(json!({"a": 1}));
    let key = inv.idempotency_key.clone();
    let run_id = inv.run_id;
    rt.execute(Arc::new(EchoSkill), inv, 0).await;

    let second = SkillInvocation {
        run_id,
        op_index: 0,
        skill_name: "echo".to_string(),
        params: json!({"a": 1}),
        owner: owner(),
        idempotency_key: key,
        budget_max: 10.0,
        deadline_ms: 1_000,
        attempt: 2,
    };
    let outcome = rt.execute(Arc::new(EchoSkill), second, 1).await;
    match outcome {
        SkillOutcome::Ok { cache_hit, .. } => assert!(cache_hit),
        _ => panic!("expected cached Ok"),
    }
}

#[tokio::test]
async fn budget_exceeded_short_circuits_before_invoking_skill() {
    let rt = runtime();
    let mut inv = invocation(json!({}));
    inv.budget_max = 0.0;
    let outcome = rt.execute(Arc::new(EchoSkill), inv, 0).await;
    match outcome {
        SkillOutcome::Failed { kind, retryable, .. } => {
            assert_eq!(kind, FailureKind::BudgetExceeded);
            assert!(!retryable);
        }
        _ => panic!("expected Failed"),
    }
}

#[tokio::test]
async fn failing_webhook_without_url_param_reports_param_mismatch() {
    let rt = runtime();
    let mut inv = invocation(json!({}));
    inv.skill_name = "webhook".to_string();
    let outcome = rt.execute(Arc::new(WebhookSkill), inv, 0).await;
    match outcome {
        SkillOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::ParamMismatch),
        _ => panic!("expected Failed"),
    }
}

#[tokio::test]
async fn slow_skill_times_out_as_deadline_failure() {
    let rt = runtime();
    let adapter = FakeSkillAdapter::new();
    // No outcome queued; invoke will hang forever waiting on the panic path
    // is avoided here by using a deadline short enough that timeout wins
    // before the adapter is even polled meaningfully.
    let mut inv = invocation(json!({}));
    inv.deadline_ms = 0;
    let outcome = rt.execute(Arc::new(adapter), inv, 0).await;
    match outcome {
        SkillOutcome::Failed { kind, .. } => assert!(matches!(kind, FailureKind::Deadline | FailureKind::InternalInvariant)),
        _ => panic!("expected Failed"),
    }
}
