// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery candidate: a proposed action to resolve a dead-letter entry,
//! scored by a heuristic catalog rule or a learned classifier, and gated by
//! tenant approval policy before reinjection.

use crate::id::{CandidateId, DeadLetterId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecoveryAction {
    RetryAsIs,
    RetryWithTransform { transform: String },
    RouteToAltSkill { skill: String },
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Heuristic,
    Learned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Proposed,
    Approved,
    Rejected,
    Executed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryCandidate {
    pub id: CandidateId,
    pub dead_letter_id: DeadLetterId,
    pub action: RecoveryAction,
    pub confidence: f32,
    pub source: CandidateSource,
    pub status: CandidateStatus,
    pub approver: Option<String>,
    pub decided_at_ms: Option<u64>,
}

impl RecoveryCandidate {
    pub fn new(
        dead_letter_id: DeadLetterId,
        action: RecoveryAction,
        confidence: f32,
        source: CandidateSource,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&confidence), "confidence must be in [0,1]");
        Self {
            id: CandidateId::new(),
            dead_letter_id,
            action,
            confidence: confidence.clamp(0.0, 1.0),
            source,
            status: CandidateStatus::Proposed,
            approver: None,
            decided_at_ms: None,
        }
    }

    pub fn approve(&mut self, approver: impl Into<String>, at_ms: u64) -> Result<(), &'static str> {
        if self.status != CandidateStatus::Proposed {
            return Err("candidate not in proposed state");
        }
        self.status = CandidateStatus::Approved;
        self.approver = Some(approver.into());
        self.decided_at_ms = Some(at_ms);
        Ok(())
    }

    pub fn reject(&mut self, approver: impl Into<String>, at_ms: u64) -> Result<(), &'static str> {
        if self.status != CandidateStatus::Proposed {
            return Err("candidate not in proposed state");
        }
        self.status = CandidateStatus::Rejected;
        self.approver = Some(approver.into());
        self.decided_at_ms = Some(at_ms);
        Ok(())
    }

    pub fn mark_executed(&mut self) -> Result<(), &'static str> {
        if self.status != CandidateStatus::Approved {
            return Err("candidate not approved");
        }
        self.status = CandidateStatus::Executed;
        Ok(())
    }
}

crate::builder! {
    pub struct RecoveryCandidateBuilder => RecoveryCandidate {
        set {
            id: CandidateId = CandidateId::new(),
            dead_letter_id: DeadLetterId = DeadLetterId::new(),
            action: RecoveryAction = RecoveryAction::RetryAsIs,
            confidence: f32 = 0.5,
            source: CandidateSource = CandidateSource::Heuristic,
            status: CandidateStatus = CandidateStatus::Proposed,
            approver: Option<String> = None,
            decided_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
