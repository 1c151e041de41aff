// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox entry: a durable record of an external side-effect written in the
//! same transaction as the op's succeeded result row.

use crate::id::{OutboxEntryId, RunId};
use crate::op::OpId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    InFlight,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    pub op_id: OpId,
    /// Logical destination, e.g. "slack", "email", "http.POST".
    pub target: String,
    pub payload: Vec<u8>,
    /// Mandatory: forwarded to the downstream provider so duplicate delivery
    /// attempts collapse to one externally-visible effect.
    pub downstream_idempotency_key: String,
    pub status: OutboxStatus,
    pub attempt: u32,
    pub next_visible_at_ms: u64,
    pub last_error: Option<String>,
}

impl OutboxEntry {
    pub fn new(
        op_id: OpId,
        target: impl Into<String>,
        payload: Vec<u8>,
        downstream_idempotency_key: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: OutboxEntryId::new(),
            op_id,
            target: target.into(),
            payload,
            downstream_idempotency_key: downstream_idempotency_key.into(),
            status: OutboxStatus::Pending,
            attempt: 0,
            next_visible_at_ms: now_ms,
            last_error: None,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.op_id.run_id
    }

    pub fn mark_delivered(&mut self) {
        self.status = OutboxStatus::Delivered;
    }

    pub fn mark_retry(&mut self, next_visible_at_ms: u64, error: impl Into<String>) {
        self.attempt += 1;
        self.status = OutboxStatus::Pending;
        self.next_visible_at_ms = next_visible_at_ms;
        self.last_error = Some(error.into());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = OutboxStatus::Failed;
        self.last_error = Some(error.into());
    }
}

crate::builder! {
    pub struct OutboxEntryBuilder => OutboxEntry {
        into {
            target: String = "slack",
            downstream_idempotency_key: String = "dk-1",
        }
        set {
            id: OutboxEntryId = OutboxEntryId::new(),
            op_id: OpId = OpId::new(RunId::new(), 0),
            payload: Vec<u8> = Vec::new(),
            status: OutboxStatus = OutboxStatus::Pending,
            attempt: u32 = 0,
            next_visible_at_ms: u64 = 0,
            last_error: Option<String> = None,
        }
    }
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
