// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The op execution loop (C2/C3): claims ops off the queue, enforces
//! within-run ordering, and drives each through the skill runtime under the
//! run's distributed lock. A failed op either goes back to pending (still
//! retryable) or is archived to the dead-letter store (terminal).

use crate::error::EngineError;
use crate::locks::{with_lock_order_tracking, LockOrderGuard};
use crate::queue::{Queue, QueuedOp};
use crate::skill_runtime::{SkillInvocation, SkillRuntime};
use orc_adapters::{SkillOutcome, SkillRegistry};
use orc_core::{canonical_json, DeadLetterEntry, LockClass, OpStatus, Owner, OutboxEntry, ReplayLogEntry, RunId, RunStatus, WorkerId};
use orc_storage::{AuditRecord, AuditStore, DeadLetterStore, IdempotencyStore, LockStore, OpStore, OutboxStore, ReplayStore, RunStore};
use std::sync::Arc;

pub struct OpExecutorConfig {
    pub worker_id: WorkerId,
    pub lease_ms: u64,
    pub deadline_ms: u64,
    pub budget_max: f64,
    /// Exceeding this attempt count on a retryable failure still dead-letters
    /// the op (§4.2: max attempts and max visible-age are policy-configurable).
    pub max_attempts: u32,
}

/// Drives one worker's claim loop. `Q`/`O`/`I` are swapped per test and `L`
/// stays concrete because every op execution acquires the run lock; the
/// less frequently varied ports are trait objects to keep the generic count
/// down.
pub struct OpExecutor<Q: Queue, O: OpStore, I: IdempotencyStore, L: LockStore> {
    queue: Arc<Q>,
    ops: Arc<O>,
    runs: Arc<dyn RunStore>,
    locks: Arc<L>,
    skills: Arc<SkillRegistry>,
    runtime: Arc<SkillRuntime<I>>,
    dead_letters: Arc<dyn DeadLetterStore>,
    outbox: Arc<dyn OutboxStore>,
    replay: Arc<dyn ReplayStore>,
    audit: Arc<dyn AuditStore>,
    config: OpExecutorConfig,
}

impl<Q: Queue, O: OpStore, I: IdempotencyStore, L: LockStore> OpExecutor<Q, O, I, L> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<Q>,
        ops: Arc<O>,
        runs: Arc<dyn RunStore>,
        locks: Arc<L>,
        skills: Arc<SkillRegistry>,
        runtime: Arc<SkillRuntime<I>>,
        dead_letters: Arc<dyn DeadLetterStore>,
        outbox: Arc<dyn OutboxStore>,
        replay: Arc<dyn ReplayStore>,
        audit: Arc<dyn AuditStore>,
        config: OpExecutorConfig,
    ) -> Self {
        Self { queue, ops, runs, locks, skills, runtime, dead_letters, outbox, replay, audit, config }
    }

    /// Claims up to `max` ops for `consumer` and drives each to completion,
    /// returning the number processed (acked, nacked, or dead-lettered).
    pub async fn run_once(&self, consumer: &str, max: usize, now_ms: u64) -> Result<usize, EngineError> {
        with_lock_order_tracking(self.drain(consumer, max, now_ms)).await
    }

    async fn drain(&self, consumer: &str, max: usize, now_ms: u64) -> Result<usize, EngineError> {
        let claimed = self.queue.claim(consumer, max, now_ms).await?;
        let mut processed = 0;
        for queued in claimed {
            self.process_one(queued, now_ms).await?;
            processed += 1;
        }
        Ok(processed)
    }

    async fn process_one(&self, queued: QueuedOp, now_ms: u64) -> Result<(), EngineError> {
        let siblings = self.ops.list_for_run(queued.op_id.run_id).await?;
        let blocked_on_earlier = siblings
            .iter()
            .any(|o| o.id.index < queued.op_id.index && !o.status.is_terminal());
        if blocked_on_earlier {
            self.queue.nack(&queued, queued.attempt, now_ms).await?;
            return Ok(());
        }

        let resource = format!("run:{}", queued.op_id.run_id.as_str());
        let lock = match self.locks.acquire(&resource, self.config.worker_id.as_str(), self.config.lease_ms, now_ms).await {
            Ok(lock) => lock,
            Err(_) => {
                self.queue.nack(&queued, queued.attempt, now_ms).await?;
                return Ok(());
            }
        };
        let _guard = LockOrderGuard::acquire(LockClass::Run);

        let result = self.execute_locked(&queued, lock.fencing_token, now_ms).await;
        self.locks.release(&resource, self.config.worker_id.as_str()).await.ok();
        result
    }

    /// Marks the run `running` on its first claimed op. Best-effort: a run
    /// row absent from `runs` (as in unit tests that drive `Operation`s
    /// directly, with no admission step) is not a reason to fail the claim.
    async fn mark_run_running(&self, run_id: RunId, now_ms: u64) {
        let Ok(mut run) = self.runs.get(run_id).await else { return };
        if run.status == RunStatus::Queued {
            if let Err(e) = run.start(now_ms) {
                tracing::warn!(run_id = %run_id, error = e, "could not mark run running");
                return;
            }
            if let Err(e) = self.runs.update(&run).await {
                tracing::warn!(run_id = %run_id, error = %e, "failed to persist run running transition");
            }
        }
    }

    /// Once every sibling op of a run has reached a terminal status, the run
    /// itself becomes terminal: `succeeded` if every op succeeded, `failed`
    /// if any op was dead-lettered. Same best-effort posture as
    /// `mark_run_running` for runs absent from the store.
    async fn maybe_complete_run(&self, run_id: RunId, now_ms: u64) -> Result<(), EngineError> {
        let siblings = self.ops.list_for_run(run_id).await?;
        if siblings.is_empty() || !siblings.iter().all(|o| o.status.is_terminal()) {
            return Ok(());
        }

        let Ok(mut run) = self.runs.get(run_id).await else { return Ok(()) };
        if run.is_terminal() {
            return Ok(());
        }

        let target = if siblings.iter().any(|o| o.status == OpStatus::Dead) { RunStatus::Failed } else { RunStatus::Succeeded };
        if run.transition_terminal(target, now_ms).is_err() {
            return Ok(());
        }
        self.runs.update(&run).await?;
        self.audit
            .append(AuditRecord {
                run_id: Some(run_id),
                event: format!("run.{target}"),
                detail: serde_json::json!({}),
                recorded_at_ms: now_ms,
            })
            .await?;
        Ok(())
    }

    async fn execute_locked(&self, queued: &QueuedOp, fencing_token: orc_core::FencingToken, now_ms: u64) -> Result<(), EngineError> {
        let mut op = self.ops.get(queued.op_id).await?;
        if op.status.is_terminal() {
            self.queue.ack(queued).await?;
            return Ok(());
        }

        self.mark_run_running(op.id.run_id, now_ms).await;

        op.claim(self.config.worker_id, now_ms).map_err(|e| EngineError::Invariant(e.to_string()))?;
        self.ops.save(&op, fencing_token).await?;

        let registration = self.skills.get(&op.skill)?;
        let invocation = SkillInvocation {
            run_id: op.id.run_id,
            op_index: op.id.index,
            skill_name: op.skill.clone(),
            params: op.params.clone(),
            owner: Owner { worker_id: self.config.worker_id, attempt_id: op.attempt as u64 },
            idempotency_key: op.fingerprint().to_hex(),
            budget_max: self.config.budget_max,
            deadline_ms: self.config.deadline_ms,
            attempt: op.attempt,
        };

        let outcome = self.runtime.execute(registration.adapter.clone(), invocation, now_ms).await;

        match outcome {
            SkillOutcome::Ok { result, result_hash, .. } => {
                let canonical_result = canonical_json(&result);
                self.replay.record(ReplayLogEntry::new(op.id, canonical_result.clone(), result_hash, now_ms)).await?;

                if registration.adapter.produces_outbox() {
                    let downstream_key = op.fingerprint().to_hex();
                    let entry = OutboxEntry::new(op.id, op.skill.clone(), canonical_result, downstream_key, now_ms);
                    self.outbox.insert(&entry).await?;
                }

                op.succeed(format!("op:{}", op.id));
                self.ops.save(&op, fencing_token).await?;
                self.queue.ack(queued).await?;
                self.audit
                    .append(AuditRecord {
                        run_id: Some(op.id.run_id),
                        event: "op.succeeded".to_string(),
                        detail: serde_json::json!({"op_index": op.id.index, "skill": op.skill}),
                        recorded_at_ms: now_ms,
                    })
                    .await?;
                self.maybe_complete_run(op.id.run_id, now_ms).await?;
                Ok(())
            }
            SkillOutcome::Failed { kind, message, retryable, attempt, .. } => {
                // Every failure passes through `failed` before either going
                // back to `pending` for another attempt or on to `dead`
                // (spec §3: claimed→(succeeded|failed)→dead).
                op.fail();
                self.ops.save(&op, fencing_token).await?;

                if retryable && attempt < self.config.max_attempts {
                    op.release();
                    self.ops.save(&op, fencing_token).await?;
                    self.queue.nack(queued, attempt, now_ms).await?;
                } else {
                    let canonical_params = canonical_json(&op.params);
                    let entry = DeadLetterEntry::new(op.id, op.skill.clone(), canonical_params, kind, message.clone(), attempt, now_ms, retryable);
                    // Archive before the op row leaves `failed`-bound territory:
                    // a reader must never observe `dead` without a matching entry.
                    self.dead_letters.archive(&entry).await?;
                    op.dead_letter();
                    self.ops.save(&op, fencing_token).await?;
                    self.queue.ack(queued).await?;
                    self.audit
                        .append(AuditRecord {
                            run_id: Some(op.id.run_id),
                            event: "op.dead_lettered".to_string(),
                            detail: serde_json::json!({"op_index": op.id.index, "kind": kind.as_str(), "error": message}),
                            recorded_at_ms: now_ms,
                        })
                        .await?;
                    self.maybe_complete_run(op.id.run_id, now_ms).await?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
