// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `OrchestratorService` wiring: the seam between the wire-level request
//! shapes and the durable primitives (admission, recovery pipeline, replay).
//! Concrete generics cover the hot-path, frequently-swapped-in-tests ports;
//! the rest are trait objects, following the registry's own
//! `Arc<dyn SkillAdapter>` precedent.

use crate::admission::RunAdmission;
use crate::queue::Queue;
use crate::recovery::RecoveryPipeline;
use async_trait::async_trait;
use orc_adapters::{SkillOutcome, SkillRegistry};
use orc_core::{CandidateId, CandidateStatus, Clock, DeadLetterId, OpStatus, ReplayOutcome, RunId, RunStatus};
use orc_storage::{AuditRecord, AuditStore, CandidateStore, DeadLetterStore, IdempotencyStore, LockStore, OpStore, ReplayStore, RunStore, TenantPolicyStore};
use orc_wire::{
    CancelAck, CandidateSummary, DeadLetterFilter, DeadLetterSummary, OrchestratorService, ReplayOpResult, ReplayReportDto, RunSnapshot,
    SubmissionError, SubmitRunRequest,
};
use std::sync::Arc;
use std::time::Duration;

const REPLAY_DEADLINE_MS: u64 = 60_000;
const LOCK_HOLDER: &str = "orchestrator-engine";
const LOCK_LEASE_MS: u64 = 30_000;

#[allow(clippy::too_many_arguments)]
pub struct OrchestratorEngine<R: RunStore, O: OpStore, Q: Queue, I: IdempotencyStore, D: DeadLetterStore, C: CandidateStore, Ck: Clock> {
    admission: RunAdmission<R, O, Q, I>,
    runs: Arc<R>,
    ops: Arc<O>,
    dead_letters: Arc<D>,
    candidates: Arc<C>,
    recovery: RecoveryPipeline<C, D, R, O, Q>,
    skills: Arc<SkillRegistry>,
    clock: Ck,
    locks: Arc<dyn LockStore>,
    audit: Arc<dyn AuditStore>,
    replay: Arc<dyn ReplayStore>,
    tenant_policies: Arc<dyn TenantPolicyStore>,
}

impl<R: RunStore, O: OpStore, Q: Queue, I: IdempotencyStore, D: DeadLetterStore, C: CandidateStore, Ck: Clock>
    OrchestratorEngine<R, O, Q, I, D, C, Ck>
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        admission: RunAdmission<R, O, Q, I>,
        runs: Arc<R>,
        ops: Arc<O>,
        dead_letters: Arc<D>,
        candidates: Arc<C>,
        recovery: RecoveryPipeline<C, D, R, O, Q>,
        skills: Arc<SkillRegistry>,
        clock: Ck,
        locks: Arc<dyn LockStore>,
        audit: Arc<dyn AuditStore>,
        replay: Arc<dyn ReplayStore>,
        tenant_policies: Arc<dyn TenantPolicyStore>,
    ) -> Self {
        Self { admission, runs, ops, dead_letters, candidates, recovery, skills, clock, locks, audit, replay, tenant_policies }
    }
}

fn candidate_status_str(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::Proposed => "proposed",
        CandidateStatus::Approved => "approved",
        CandidateStatus::Rejected => "rejected",
        CandidateStatus::Executed => "executed",
    }
}

#[async_trait]
impl<R: RunStore, O: OpStore, Q: Queue, I: IdempotencyStore, D: DeadLetterStore, C: CandidateStore, Ck: Clock> OrchestratorService
    for OrchestratorEngine<R, O, Q, I, D, C, Ck>
{
    async fn submit_run(&self, request: SubmitRunRequest) -> Result<RunId, SubmissionError> {
        let now = self.clock.epoch_ms();
        self.admission.submit(request.tenant_id, request.agent_id, request.plan, request.idempotency_key, now).await
    }

    async fn get_run(&self, run_id: RunId) -> Result<RunSnapshot, SubmissionError> {
        let run = self.runs.get(run_id).await.map_err(|_| SubmissionError::RunNotFound(run_id.to_string()))?;
        Ok(RunSnapshot {
            run_id: run.id,
            status: run.status,
            created_at_ms: run.created_at_ms,
            started_at_ms: run.started_at_ms,
            completed_at_ms: run.completed_at_ms,
            parent_run_id: run.parent_run_id,
        })
    }

    async fn cancel_run(&self, run_id: RunId) -> Result<CancelAck, SubmissionError> {
        let now = self.clock.epoch_ms();
        let resource = format!("run:{}", run_id.as_str());
        self.locks
            .acquire(&resource, LOCK_HOLDER, LOCK_LEASE_MS, now)
            .await
            .map_err(|_| SubmissionError::QueueUnavailable)?;

        let outcome = async {
            let mut run = self.runs.get(run_id).await.map_err(|_| SubmissionError::RunNotFound(run_id.to_string()))?;
            if run.is_terminal() {
                return Err(SubmissionError::AlreadyTerminal);
            }
            run.transition_terminal(RunStatus::Cancelled, now).map_err(|_| SubmissionError::AlreadyTerminal)?;
            self.runs.update(&run).await.map_err(|_| SubmissionError::QueueUnavailable)?;
            Ok(())
        }
        .await;

        self.locks.release(&resource, LOCK_HOLDER).await.ok();
        outcome?;

        self.audit
            .append(AuditRecord { run_id: Some(run_id), event: "run.cancelled".to_string(), detail: serde_json::json!({}), recorded_at_ms: now })
            .await
            .ok();
        Ok(CancelAck { run_id, accepted: true })
    }

    async fn list_dead_letters(&self, filter: DeadLetterFilter) -> Result<Vec<DeadLetterSummary>, SubmissionError> {
        let entries = self.dead_letters.list_unmatched().await.map_err(|_| SubmissionError::QueueUnavailable)?;
        let mut out = Vec::new();
        for entry in entries {
            if let Some(skill) = &filter.skill {
                if &entry.skill != skill {
                    continue;
                }
            }
            if let Some(tenant_id) = filter.tenant_id {
                match self.runs.get(entry.op_id.run_id).await {
                    Ok(run) if run.tenant_id == tenant_id => {}
                    _ => continue,
                }
            }
            out.push(DeadLetterSummary {
                id: entry.id,
                run_id: entry.op_id.run_id,
                skill: entry.skill.clone(),
                failure_kind: entry.failure_kind.to_string(),
                catalog_match: entry.catalog_match.clone(),
                recovered: entry.recovered,
            });
        }
        Ok(out)
    }

    async fn propose_recovery(&self, dead_letter_id: DeadLetterId) -> Result<Vec<CandidateSummary>, SubmissionError> {
        let now = self.clock.epoch_ms();
        let entry = self
            .dead_letters
            .get(dead_letter_id)
            .await
            .map_err(|_| SubmissionError::RunNotFound(dead_letter_id.to_string()))?;
        let parent = self
            .runs
            .get(entry.op_id.run_id)
            .await
            .map_err(|_| SubmissionError::RunNotFound(entry.op_id.run_id.to_string()))?;
        let policy = self.tenant_policies.get(parent.tenant_id).await.map_err(|_| SubmissionError::QueueUnavailable)?;

        // No trained-offline model is wired up here (the trainer is out of
        // scope); a tenant with more unreconciled dead letters gets a lower
        // prior so the learned source stays conservative for it.
        let unreconciled = self.dead_letters.unreconciled_count(parent.tenant_id).await.map_err(|_| SubmissionError::QueueUnavailable)?;
        let historical_success_rate = 1.0 / (1.0 + unreconciled as f32);

        let mut candidates = self
            .recovery
            .propose(&entry, historical_success_rate)
            .await
            .map_err(|_| SubmissionError::QueueUnavailable)?;

        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates.iter_mut() {
            self.recovery.gate(candidate, &policy, &parent, now).await.map_err(|_| SubmissionError::QueueUnavailable)?;
            out.push(CandidateSummary {
                id: candidate.id,
                dead_letter_id: candidate.dead_letter_id,
                confidence: candidate.confidence,
                status: candidate_status_str(candidate.status).to_string(),
            });
        }
        Ok(out)
    }

    async fn approve_candidate(&self, candidate_id: CandidateId) -> Result<(), SubmissionError> {
        let now = self.clock.epoch_ms();
        let mut candidate = self
            .candidates
            .get(candidate_id)
            .await
            .map_err(|_| SubmissionError::RunNotFound(candidate_id.to_string()))?;
        let entry = self.dead_letters.get(candidate.dead_letter_id).await.map_err(|_| SubmissionError::QueueUnavailable)?;
        let parent = self.runs.get(entry.op_id.run_id).await.map_err(|_| SubmissionError::QueueUnavailable)?;
        self.recovery
            .approve(&mut candidate, "operator", &parent, now)
            .await
            .map_err(|_| SubmissionError::QueueUnavailable)?;
        Ok(())
    }

    async fn reject_candidate(&self, candidate_id: CandidateId) -> Result<(), SubmissionError> {
        let now = self.clock.epoch_ms();
        let mut candidate = self
            .candidates
            .get(candidate_id)
            .await
            .map_err(|_| SubmissionError::RunNotFound(candidate_id.to_string()))?;
        self.recovery.reject(&mut candidate, "operator", now).await.map_err(|_| SubmissionError::QueueUnavailable)?;
        Ok(())
    }

    /// Re-executes each succeeded op against its registered skill and
    /// compares the recomputed hash to the replay log. Never touches the
    /// committed result row; a divergence is recorded as a mismatch by
    /// `ReplayStore::verify`, not healed.
    async fn replay(&self, run_id: RunId) -> Result<ReplayReportDto, SubmissionError> {
        let ops = self.ops.list_for_run(run_id).await.map_err(|_| SubmissionError::RunNotFound(run_id.to_string()))?;
        let mut per_op = Vec::new();

        for op in ops {
            if op.status != OpStatus::Succeeded {
                continue;
            }
            let Ok(registration) = self.skills.get(&op.skill) else {
                continue;
            };

            let outcome = registration.adapter.invoke(&op.params, Duration::from_millis(REPLAY_DEADLINE_MS)).await;
            let verdict = match outcome {
                SkillOutcome::Ok { result, .. } => {
                    let recomputed = orc_core::result_hash(&orc_core::canonical_json(&result));
                    match self.replay.verify(op.id, recomputed).await {
                        Ok(ReplayOutcome::Match) => "match",
                        Ok(ReplayOutcome::Mismatch) => "mismatch",
                        Err(_) => "error",
                    }
                }
                SkillOutcome::Failed { .. } => "error",
            };
            per_op.push(ReplayOpResult { op_index: op.id.index, verdict: verdict.to_string() });
        }

        Ok(ReplayReportDto { run_id, per_op })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
