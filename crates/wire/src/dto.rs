// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response shapes for `OrchestratorService`. Kept separate from
//! `orc-core`'s domain types so the wire can evolve (renaming a field here)
//! without forcing a migration of the persisted domain model.

use orc_core::{CandidateId, DeadLetterId, RunId, RunStatus, StepDescriptor, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRunRequest {
    pub tenant_id: TenantId,
    pub agent_id: String,
    pub plan: Vec<StepDescriptor>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub status: RunStatus,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    pub parent_run_id: Option<RunId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAck {
    pub run_id: RunId,
    pub accepted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadLetterFilter {
    pub tenant_id: Option<TenantId>,
    pub skill: Option<String>,
    pub unmatched_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterSummary {
    pub id: DeadLetterId,
    pub run_id: RunId,
    pub skill: String,
    pub failure_kind: String,
    pub catalog_match: Option<String>,
    pub recovered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: CandidateId,
    pub dead_letter_id: DeadLetterId,
    pub confidence: f32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReportDto {
    pub run_id: RunId,
    pub per_op: Vec<ReplayOpResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOpResult {
    pub op_index: u32,
    pub verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInvocationRequest {
    pub skill: String,
    pub params: Value,
    pub deadline_ms: u64,
    pub idempotency_key: String,
}
