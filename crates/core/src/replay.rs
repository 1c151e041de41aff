// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay log entry: append-only record of a committed op result, used to
//! detect replay mismatches. Never overwritten once written.

use crate::canon::Fingerprint;
use crate::op::OpId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLogEntry {
    pub op_id: OpId,
    pub canonical_result: Vec<u8>,
    pub result_hash: Fingerprint,
    pub committed_at_ms: u64,
}

impl ReplayLogEntry {
    pub fn new(op_id: OpId, canonical_result: Vec<u8>, result_hash: Fingerprint, committed_at_ms: u64) -> Self {
        Self {
            op_id,
            canonical_result,
            result_hash,
            committed_at_ms,
        }
    }
}

/// A single op's outcome when `replay(run-id)` re-executes it against the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayVerdict {
    Match,
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub op_id: OpId,
    pub verdict: ReplayVerdict,
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
