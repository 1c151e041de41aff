// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-letter archive entry: an op that reached a terminal non-success
//! status, archived with full context. Append-only once written.

use crate::id::DeadLetterId;
use crate::op::OpId;
use crate::taxonomy::FailureKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub id: DeadLetterId,
    pub op_id: OpId,
    pub skill: String,
    pub canonical_params: Vec<u8>,
    pub failure_kind: FailureKind,
    /// Name of the catalog rule that matched, if any (§4.5: longest/most-specific wins).
    pub catalog_match: Option<String>,
    pub last_error: String,
    pub attempts: u32,
    pub archived_at_ms: u64,
    pub replayable: bool,
    /// Set once a recovery candidate produced from this entry executes
    /// successfully; used by the monotonic dead-letter-count regression guard.
    pub recovered: bool,
}

impl DeadLetterEntry {
    pub fn new(
        op_id: OpId,
        skill: impl Into<String>,
        canonical_params: Vec<u8>,
        failure_kind: FailureKind,
        last_error: impl Into<String>,
        attempts: u32,
        archived_at_ms: u64,
        replayable: bool,
    ) -> Self {
        Self {
            id: DeadLetterId::new(),
            op_id,
            skill: skill.into(),
            canonical_params,
            failure_kind,
            catalog_match: None,
            last_error: last_error.into(),
            attempts,
            archived_at_ms,
            replayable,
            recovered: false,
        }
    }
}

crate::builder! {
    pub struct DeadLetterEntryBuilder => DeadLetterEntry {
        into {
            skill: String = "email.send",
            last_error: String = "schema mismatch",
        }
        set {
            id: DeadLetterId = DeadLetterId::new(),
            op_id: OpId = OpId::new(crate::id::RunId::new(), 0),
            canonical_params: Vec<u8> = Vec::new(),
            failure_kind: FailureKind = FailureKind::SchemaMismatch,
            catalog_match: Option<String> = None,
            attempts: u32 = 1,
            archived_at_ms: u64 = 0,
            replayable: bool = true,
            recovered: bool = false,
        }
    }
}

#[cfg(test)]
#[path = "deadletter_tests.rs"]
mod tests;
