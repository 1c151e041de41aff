// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery pipeline (C5): matches archived failures against the catalog,
//! generates heuristic and learned candidates, gates them on tenant policy,
//! and reinjects approved candidates as new parent-linked runs.

use super::candidates::heuristic_candidates;
use super::catalog::FailureCatalog;
use super::learned::LearnedModel;
use crate::queue::Queue;
use orc_core::{DeadLetterEntry, Operation, RecoveryAction, RecoveryCandidate, Run, StepDescriptor, TenantPolicy};
use orc_storage::{CandidateStore, DeadLetterStore, OpStore, RunStore, StorageError};
use std::sync::Arc;

pub struct RecoveryPipeline<C: CandidateStore, D: DeadLetterStore, R: RunStore, O: OpStore, Q: Queue> {
    candidates: Arc<C>,
    dead_letters: Arc<D>,
    runs: Arc<R>,
    ops: Arc<O>,
    queue: Arc<Q>,
    catalog: FailureCatalog,
    learned: LearnedModel,
}

impl<C: CandidateStore, D: DeadLetterStore, R: RunStore, O: OpStore, Q: Queue> RecoveryPipeline<C, D, R, O, Q> {
    pub fn new(
        candidates: Arc<C>,
        dead_letters: Arc<D>,
        runs: Arc<R>,
        ops: Arc<O>,
        queue: Arc<Q>,
        catalog: FailureCatalog,
        learned: LearnedModel,
    ) -> Self {
        Self { candidates, dead_letters, runs, ops, queue, catalog, learned }
    }

    /// Tags the entry with its best catalog match, if any, and persists
    /// every generated candidate (heuristic + learned) for later approval.
    pub async fn propose(&self, entry: &DeadLetterEntry, historical_success_rate: f32) -> Result<Vec<RecoveryCandidate>, StorageError> {
        if let Some(rule) = self.catalog.best_match(entry) {
            self.dead_letters.set_catalog_match(entry.id, &rule.name).await?;
        }

        let mut generated = heuristic_candidates(&self.catalog, entry);
        generated.extend(self.learned.candidates(entry, historical_success_rate));

        for candidate in &generated {
            self.candidates.insert(candidate).await?;
        }
        Ok(generated)
    }

    /// Applies tenant policy to a freshly proposed candidate: auto-executes
    /// it immediately if the policy and confidence allow, otherwise leaves
    /// it queued for human approval.
    pub async fn gate(&self, candidate: &mut RecoveryCandidate, policy: &TenantPolicy, parent: &Run, now_ms: u64) -> Result<Option<Run>, StorageError> {
        if !policy.auto_executes(candidate.confidence) {
            return Ok(None);
        }
        candidate.approve("auto-policy", now_ms).map_err(|e| StorageError::Conflict(e.to_string()))?;
        self.candidates.save(candidate).await?;
        let reinjected = self.execute(candidate, parent, now_ms).await?;
        Ok(Some(reinjected))
    }

    /// Approves a pending candidate under human review and reinjects it.
    pub async fn approve(&self, candidate: &mut RecoveryCandidate, approver: &str, parent: &Run, now_ms: u64) -> Result<Run, StorageError> {
        candidate.approve(approver, now_ms).map_err(|e| StorageError::Conflict(e.to_string()))?;
        self.candidates.save(candidate).await?;
        self.execute(candidate, parent, now_ms).await
    }

    pub async fn reject(&self, candidate: &mut RecoveryCandidate, approver: &str, now_ms: u64) -> Result<(), StorageError> {
        candidate.reject(approver, now_ms).map_err(|e| StorageError::Conflict(e.to_string()))?;
        self.candidates.save(candidate).await
    }

    /// Creates the reinjected run and marks the candidate executed and the
    /// source dead letter recovered. The original run is never touched.
    async fn execute(&self, candidate: &mut RecoveryCandidate, parent: &Run, now_ms: u64) -> Result<Run, StorageError> {
        let plan = plan_for_action(&candidate.action, parent);
        let reinjected = Run::reinject(parent, plan, now_ms);
        self.runs.insert(&reinjected).await?;

        let ops: Vec<Operation> = reinjected
            .plan
            .iter()
            .enumerate()
            .map(|(index, step)| Operation::new(reinjected.id, index as u32, step.skill.clone(), step.params.clone()))
            .collect();
        self.ops.insert_many(&ops).await?;
        for op in &ops {
            let payload = serde_json::json!({ "run_id": op.id.run_id.as_str(), "op_index": op.id.index });
            self.queue
                .enqueue(op.id, payload, now_ms)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }

        candidate.mark_executed().map_err(|e| StorageError::Conflict(e.to_string()))?;
        self.candidates.save(candidate).await?;
        self.dead_letters.mark_recovered(candidate.dead_letter_id).await?;
        Ok(reinjected)
    }
}

/// Translates a recovery action into the plan the reinjected run will
/// execute. `Abort` never reaches here: callers skip execution for it.
fn plan_for_action(action: &RecoveryAction, parent: &Run) -> Vec<StepDescriptor> {
    match action {
        RecoveryAction::RetryAsIs => parent.plan.clone(),
        RecoveryAction::RetryWithTransform { transform } => parent
            .plan
            .iter()
            .map(|step| {
                let mut params = step.params.clone();
                if let Some(obj) = params.as_object_mut() {
                    obj.insert("__recovery_transform".to_string(), serde_json::Value::String(transform.clone()));
                }
                StepDescriptor { skill: step.skill.clone(), params }
            })
            .collect(),
        RecoveryAction::RouteToAltSkill { skill } => parent
            .plan
            .iter()
            .map(|step| StepDescriptor { skill: skill.clone(), params: step.params.clone() })
            .collect(),
        RecoveryAction::Abort => Vec::new(),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
