// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run admission: submission-level idempotency dedup layered on top of C2's
//! claim/commit primitive, followed by op fan-out onto the durable queue.
//! Submitting the same `idempotency_key` twice with the same plan returns
//! the original run id; with a different plan it's rejected.

use crate::queue::Queue;
use orc_core::{canonical_json, fingerprint, Operation, Owner, Run, RunId, StepDescriptor, TenantId, WorkerId};
use orc_core::ClaimOutcome;
use orc_storage::{IdempotencyStore, OpStore, RunStore};
use orc_wire::SubmissionError;
use std::sync::Arc;

/// Submission claims live much longer than an op's in-flight claim: a
/// caller might legitimately retry `submit-run` hours later with the same
/// key and still expects the original run back.
const SUBMISSION_CLAIM_TTL_MS: u64 = 86_400_000;
const SUBMISSION_OWNER_WORKER: &str = "submission";

pub struct RunAdmission<R: RunStore, O: OpStore, Q: Queue, I: IdempotencyStore> {
    runs: Arc<R>,
    ops: Arc<O>,
    queue: Arc<Q>,
    idempotency: Arc<I>,
    max_active_runs_per_tenant: Option<u32>,
}

impl<R: RunStore, O: OpStore, Q: Queue, I: IdempotencyStore> RunAdmission<R, O, Q, I> {
    pub fn new(runs: Arc<R>, ops: Arc<O>, queue: Arc<Q>, idempotency: Arc<I>, max_active_runs_per_tenant: Option<u32>) -> Self {
        Self { runs, ops, queue, idempotency, max_active_runs_per_tenant }
    }

    pub async fn submit(
        &self,
        tenant_id: TenantId,
        agent_id: impl Into<String>,
        plan: Vec<StepDescriptor>,
        idempotency_key: Option<String>,
        now_ms: u64,
    ) -> Result<RunId, SubmissionError> {
        self.check_tenant_budget(tenant_id).await?;

        match idempotency_key {
            Some(key) => self.submit_deduped(tenant_id, agent_id.into(), plan, key, now_ms).await,
            None => {
                let run = Run::new(tenant_id, agent_id, plan.clone(), now_ms);
                self.persist_and_enqueue(&run, &plan, now_ms).await?;
                Ok(run.id)
            }
        }
    }

    async fn submit_deduped(
        &self,
        tenant_id: TenantId,
        agent_id: String,
        plan: Vec<StepDescriptor>,
        key: String,
        now_ms: u64,
    ) -> Result<RunId, SubmissionError> {
        let canonical_plan = serde_json::to_value(&plan).map_err(|_| SubmissionError::ParamMismatch)?;
        let canonical = canonical_json(&canonical_plan);
        let params_fp = fingerprint("submit-run", &canonical, 0);
        let owner = Owner { worker_id: WorkerId::from_string(SUBMISSION_OWNER_WORKER), attempt_id: 0 };

        let claim = self
            .idempotency
            .claim_or_return(&key, params_fp, owner, SUBMISSION_CLAIM_TTL_MS, now_ms)
            .await
            .map_err(|_| SubmissionError::QueueUnavailable)?;

        match claim {
            ClaimOutcome::Cached { result } => {
                serde_json::from_slice::<RunId>(&result).map_err(|_| SubmissionError::QueueUnavailable)
            }
            ClaimOutcome::ParamMismatch => Err(SubmissionError::ParamMismatch),
            ClaimOutcome::Contended { .. } => Err(SubmissionError::QueueUnavailable),
            ClaimOutcome::Claimed | ClaimOutcome::AlreadyOwned => {
                let mut run = Run::new(tenant_id, agent_id, plan.clone(), now_ms);
                run.submission_idempotency_key = Some(key.clone());

                match self.persist_and_enqueue(&run, &plan, now_ms).await {
                    Ok(()) => {
                        let bytes = serde_json::to_vec(&run.id).unwrap_or_default();
                        self.idempotency
                            .commit(&key, owner, bytes, params_fp, now_ms)
                            .await
                            .map_err(|_| SubmissionError::QueueUnavailable)?;
                        Ok(run.id)
                    }
                    Err(e) => {
                        self.idempotency.abandon(&key, owner).await.ok();
                        Err(e)
                    }
                }
            }
        }
    }

    async fn check_tenant_budget(&self, tenant_id: TenantId) -> Result<(), SubmissionError> {
        let Some(max) = self.max_active_runs_per_tenant else {
            return Ok(());
        };
        let active = self
            .runs
            .list_by_tenant(tenant_id, None)
            .await
            .map_err(|_| SubmissionError::QueueUnavailable)?
            .into_iter()
            .filter(|r| !r.is_terminal())
            .count();
        if active as u32 >= max {
            return Err(SubmissionError::BudgetExceeded);
        }
        Ok(())
    }

    async fn persist_and_enqueue(&self, run: &Run, plan: &[StepDescriptor], now_ms: u64) -> Result<(), SubmissionError> {
        self.runs.insert(run).await.map_err(|_| SubmissionError::QueueUnavailable)?;

        let ops: Vec<Operation> = plan
            .iter()
            .enumerate()
            .map(|(index, step)| Operation::new(run.id, index as u32, step.skill.clone(), step.params.clone()))
            .collect();
        self.ops.insert_many(&ops).await.map_err(|_| SubmissionError::QueueUnavailable)?;

        for op in &ops {
            let payload = serde_json::json!({ "run_id": op.id.run_id.as_str(), "op_index": op.id.index });
            self.queue.enqueue(op.id, payload, now_ms).await.map_err(|_| SubmissionError::QueueUnavailable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
