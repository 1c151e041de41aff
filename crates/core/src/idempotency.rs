// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain types for the idempotency and replay store. The atomic CAS
//! operations themselves live behind `storage::IdempotencyStore`; this module
//! only describes the record shape and the outcomes a claim can produce.

use crate::canon::Fingerprint;
use crate::id::WorkerId;
use serde::{Deserialize, Serialize};

/// Owner of an in-flight idempotency record: the worker plus a per-claim
/// attempt id, so a crashed-and-restarted worker process with the same
/// `WorkerId` cannot accidentally believe it still owns a stale claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub worker_id: WorkerId,
    pub attempt_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdempotencyStatus {
    InFlight { owner: Owner },
    Committed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub key: String,
    pub status: IdempotencyStatus,
    pub params_fingerprint: Fingerprint,
    pub result: Option<Vec<u8>>,
    pub created_at_ms: u64,
    pub committed_at_ms: Option<u64>,
    pub ttl_ms: u64,
}

impl IdempotencyRecord {
    pub fn expires_at_ms(&self) -> u64 {
        self.created_at_ms.saturating_add(self.ttl_ms)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}

/// Outcome of `claim_or_return`. Mirrors §4.2 exactly: `Claimed` when this
/// owner now holds the in-flight slot (fresh or reclaimed from expiry),
/// `AlreadyOwned` when a retrying owner re-enters its own in-flight claim,
/// `Contended` when a different live owner holds it, `Cached` when the
/// operation already committed, and `ParamMismatch` when the same key was
/// reused with semantically different parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyOwned,
    Contended { other_owner: Owner },
    Cached { result: Vec<u8> },
    ParamMismatch,
}

/// Outcome of `verify_replay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    Match,
    Mismatch,
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
