// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dto::{
    CancelAck, CandidateSummary, DeadLetterFilter, DeadLetterSummary, ReplayReportDto, RunSnapshot, SubmitRunRequest,
};
use crate::error::SubmissionError;
use async_trait::async_trait;
use orc_core::{CandidateId, DeadLetterId, RunId};

/// The inbound surface agents and the operator CLI call. An HTTP/gRPC
/// transport over this trait is explicitly out of scope; `orc-engine`
/// implements it directly.
#[async_trait]
pub trait OrchestratorService: Send + Sync + 'static {
    async fn submit_run(&self, request: SubmitRunRequest) -> Result<RunId, SubmissionError>;
    async fn get_run(&self, run_id: RunId) -> Result<RunSnapshot, SubmissionError>;
    async fn cancel_run(&self, run_id: RunId) -> Result<CancelAck, SubmissionError>;
    async fn list_dead_letters(&self, filter: DeadLetterFilter) -> Result<Vec<DeadLetterSummary>, SubmissionError>;
    async fn propose_recovery(&self, dead_letter_id: DeadLetterId) -> Result<Vec<CandidateSummary>, SubmissionError>;
    async fn approve_candidate(&self, candidate_id: CandidateId) -> Result<(), SubmissionError>;
    async fn reject_candidate(&self, candidate_id: CandidateId) -> Result<(), SubmissionError>;
    async fn replay(&self, run_id: RunId) -> Result<ReplayReportDto, SubmissionError>;
}
