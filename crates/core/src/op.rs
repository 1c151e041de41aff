// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation identifier and state machine.
//!
//! An operation is one step of a run's plan after admission to the queue.
//! Identity is the compound key (run id, op index) rather than a standalone
//! generated id, since ops are owned by their run and never move between runs.

use crate::canon::{canonical_json, fingerprint, Fingerprint};
use crate::id::{RunId, WorkerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId {
    pub run_id: RunId,
    pub index: u32,
}

impl OpId {
    pub fn new(run_id: RunId, index: u32) -> Self {
        Self { run_id, index }
    }
}

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.run_id, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    Pending,
    Claimed,
    Succeeded,
    Failed,
    Dead,
}

impl OpStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OpStatus::Succeeded | OpStatus::Dead)
    }
}

crate::simple_display! {
    OpStatus {
        Pending => "pending",
        Claimed => "claimed",
        Succeeded => "succeeded",
        Failed => "failed",
        Dead => "dead",
    }
}

/// One queued unit of work: a single skill invocation belonging to a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: OpId,
    pub skill: String,
    pub params: serde_json::Value,
    pub status: OpStatus,
    pub attempt: u32,
    pub claimed_by: Option<WorkerId>,
    pub claimed_at_ms: Option<u64>,
    pub heartbeat_at_ms: Option<u64>,
    /// Set once the op reaches `succeeded`; references the committed
    /// idempotency result rather than embedding it.
    pub result_ref: Option<String>,
}

impl Operation {
    pub fn new(run_id: RunId, index: u32, skill: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            id: OpId::new(run_id, index),
            skill: skill.into(),
            params,
            status: OpStatus::Pending,
            attempt: 0,
            claimed_by: None,
            claimed_at_ms: None,
            heartbeat_at_ms: None,
            result_ref: None,
        }
    }

    /// Fingerprint is stable across retries: it depends only on skill,
    /// canonical params, and op index, never on attempt count.
    pub fn fingerprint(&self) -> Fingerprint {
        let canon = canonical_json(&self.params);
        fingerprint(&self.skill, &canon, self.id.index)
    }

    pub fn claim(&mut self, worker: WorkerId, at_ms: u64) -> Result<(), &'static str> {
        if self.status != OpStatus::Pending {
            return Err("op not pending");
        }
        self.status = OpStatus::Claimed;
        self.attempt += 1;
        self.claimed_by = Some(worker);
        self.claimed_at_ms = Some(at_ms);
        self.heartbeat_at_ms = Some(at_ms);
        Ok(())
    }

    pub fn succeed(&mut self, result_ref: impl Into<String>) {
        self.status = OpStatus::Succeeded;
        self.result_ref = Some(result_ref.into());
    }

    /// Marks a claimed op `failed` — the required intermediate state between
    /// a claimed attempt and whatever comes next, a retry (`release`) or
    /// permanent archival (`dead_letter`).
    pub fn fail(&mut self) {
        self.status = OpStatus::Failed;
    }

    /// Release a failed op back to pending, clearing ownership. Used by
    /// nack and by startup reconciliation of ops whose claiming worker no
    /// longer holds a live lock lease.
    pub fn release(&mut self) {
        self.status = OpStatus::Pending;
        self.claimed_by = None;
        self.claimed_at_ms = None;
        self.heartbeat_at_ms = None;
    }

    pub fn dead_letter(&mut self) {
        self.status = OpStatus::Dead;
    }
}

crate::builder! {
    pub struct OperationBuilder => Operation {
        into {
            skill: String = "kv.set",
        }
        set {
            id: OpId = OpId::new(RunId::new(), 0),
            params: serde_json::Value = serde_json::Value::Null,
            status: OpStatus = OpStatus::Pending,
            attempt: u32 = 0,
            claimed_by: Option<WorkerId> = None,
            claimed_at_ms: Option<u64> = None,
            heartbeat_at_ms: Option<u64> = None,
            result_ref: Option<String> = None,
        }
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
