// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the audit ledger port (§6) to both halves it requires: a
//! structured `tracing` event on the `audit` target, and the durable
//! `AuditStore` row. The event is emitted before the row is written so a
//! log-only trail exists even if the database append fails.

use async_trait::async_trait;
use orc_storage::{AuditRecord, AuditStore, StorageError};
use std::sync::Arc;

pub struct TracingAuditStore<A: AuditStore> {
    inner: Arc<A>,
}

impl<A: AuditStore> TracingAuditStore<A> {
    pub fn new(inner: Arc<A>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: AuditStore> AuditStore for TracingAuditStore<A> {
    async fn append(&self, record: AuditRecord) -> Result<(), StorageError> {
        tracing::info!(
            target: "audit",
            run_id = record.run_id.map(|id| id.to_string()),
            event = %record.event,
            detail = %record.detail,
            recorded_at_ms = record.recorded_at_ms,
            "audit event",
        );
        self.inner.append(record).await
    }

    async fn list_for_run(&self, run_id: orc_core::RunId) -> Result<Vec<AuditRecord>, StorageError> {
        self.inner.list_for_run(run_id).await
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
