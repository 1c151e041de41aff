// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-wire: the inbound `OrchestratorService` surface and its DTOs.

pub mod dto;
pub mod error;
pub mod service;

pub use dto::{
    CancelAck, CandidateSummary, DeadLetterFilter, DeadLetterSummary, ReplayOpResult, ReplayReportDto, RunSnapshot,
    SkillInvocationRequest, SubmitRunRequest,
};
pub use error::SubmissionError;
pub use service::OrchestratorService;
