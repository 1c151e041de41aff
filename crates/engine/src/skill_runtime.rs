// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill Execution Contract (C3): executes one skill invocation under
//! budget, deadline, and circuit-breaker guards, integrated with the
//! idempotency store so a cached result never re-invokes the skill body.

use crate::budget::BudgetTracker;
use crate::circuit_breaker::CircuitBreakerRegistry;
use orc_adapters::{SkillAdapter, SkillOutcome};
use orc_core::{ClaimOutcome, FailureKind, Owner, RunId};
use orc_storage::IdempotencyStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct SkillInvocation {
    pub run_id: RunId,
    pub op_index: u32,
    pub skill_name: String,
    pub params: Value,
    pub owner: Owner,
    pub idempotency_key: String,
    pub budget_max: f64,
    pub deadline_ms: u64,
    pub attempt: u32,
}

pub struct SkillRuntime<I: IdempotencyStore> {
    idempotency: Arc<I>,
    breakers: Arc<CircuitBreakerRegistry>,
    budget: Arc<BudgetTracker>,
}

impl<I: IdempotencyStore> SkillRuntime<I> {
    pub fn new(idempotency: Arc<I>, breakers: Arc<CircuitBreakerRegistry>, budget: Arc<BudgetTracker>) -> Self {
        Self { idempotency, breakers, budget }
    }

    pub async fn execute(
        &self,
        adapter: Arc<dyn SkillAdapter>,
        invocation: SkillInvocation,
        now_ms: u64,
    ) -> SkillOutcome {
        let canonical = orc_core::canonical_json(&invocation.params);
        let params_fp = orc_core::fingerprint(&invocation.skill_name, &canonical, invocation.op_index);

        let claim = self
            .idempotency
            .claim_or_return(&invocation.idempotency_key, params_fp, invocation.owner, invocation.deadline_ms.max(60_000), now_ms)
            .await;

        match claim {
            Ok(ClaimOutcome::Cached { result }) => {
                return match serde_json::from_slice::<Value>(&result) {
                    Ok(v) => {
                        let result_hash = orc_core::result_hash(&orc_core::canonical_json(&v));
                        SkillOutcome::Ok { result: v, result_hash, cost: 0.0, duration_ms: 0, cache_hit: true }
                    }
                    Err(e) => SkillOutcome::failed(FailureKind::InternalInvariant, e.to_string(), invocation.attempt),
                };
            }
            Ok(ClaimOutcome::ParamMismatch) => {
                return SkillOutcome::failed(FailureKind::ParamMismatch, "idempotency key reused with different params", invocation.attempt);
            }
            Ok(ClaimOutcome::Contended { .. }) => {
                return SkillOutcome::failed(FailureKind::Transient, "idempotency key contended by another owner", invocation.attempt);
            }
            Ok(ClaimOutcome::Claimed) | Ok(ClaimOutcome::AlreadyOwned) => {}
            Err(e) => {
                return SkillOutcome::failed(FailureKind::Transient, e.to_string(), invocation.attempt);
            }
        }

        if !self.budget.try_consume(invocation.run_id, 1.0, invocation.budget_max) {
            self.idempotency.abandon(&invocation.idempotency_key, invocation.owner).await.ok();
            return SkillOutcome::failed(FailureKind::BudgetExceeded, "run budget exceeded", invocation.attempt);
        }

        let target = invocation
            .params
            .get("target")
            .and_then(|v| v.as_str())
            .unwrap_or(&invocation.skill_name)
            .to_string();

        if !self.breakers.allow(&invocation.skill_name, &target, now_ms) {
            self.idempotency.abandon(&invocation.idempotency_key, invocation.owner).await.ok();
            return SkillOutcome::failed(FailureKind::CircuitOpen, "circuit open for skill/target", invocation.attempt);
        }

        let params = invocation.params.clone();
        let deadline = Duration::from_millis(invocation.deadline_ms);
        let handle = tokio::spawn(async move { adapter.invoke(&params, deadline).await });

        let outcome = match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                SkillOutcome::failed(FailureKind::InternalInvariant, format!("skill panicked: {join_err}"), invocation.attempt)
            }
            Err(_) => SkillOutcome::failed(FailureKind::Deadline, "deadline exceeded", invocation.attempt),
        };

        self.breakers.record(&invocation.skill_name, &target, outcome.is_ok(), now_ms);

        match &outcome {
            SkillOutcome::Ok { result, .. } => {
                let bytes = serde_json::to_vec(result).unwrap_or_default();
                match self.idempotency.commit(&invocation.idempotency_key, invocation.owner, bytes, params_fp, now_ms).await {
                    Ok(_) => outcome,
                    Err(e) => SkillOutcome::failed(FailureKind::InternalInvariant, e.to_string(), invocation.attempt),
                }
            }
            SkillOutcome::Failed { .. } => {
                self.idempotency.abandon(&invocation.idempotency_key, invocation.owner).await.ok();
                outcome
            }
        }
    }
}

#[cfg(test)]
#[path = "skill_runtime_tests.rs"]
mod tests;
