// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable audit trail. Append-only; written in the same transaction as the
//! state change it records wherever the caller has a transaction handle.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::RunId;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub run_id: Option<RunId>,
    pub event: String,
    pub detail: Value,
    pub recorded_at_ms: u64,
}

#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    async fn append(&self, record: AuditRecord) -> Result<(), StorageError>;
    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<AuditRecord>, StorageError>;
}

pub struct PgAuditStore {
    pool: sqlx::PgPool,
}

impl PgAuditStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO audit_log (run_id, event, detail, recorded_at_ms) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.run_id.map(|id| id.as_str().to_string()))
        .bind(&record.event)
        .bind(&record.detail)
        .bind(record.recorded_at_ms as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<AuditRecord>, StorageError> {
        let rows: Vec<(Option<String>, String, Value, i64)> = sqlx::query_as(
            "SELECT run_id, event, detail, recorded_at_ms FROM audit_log WHERE run_id = $1 ORDER BY id",
        )
        .bind(run_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(run_id, event, detail, recorded_at_ms)| AuditRecord {
                run_id: run_id.map(RunId::from_string),
                event,
                detail,
                recorded_at_ms: recorded_at_ms as u64,
            })
            .collect())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeAuditStore {
        records: Arc<Mutex<Vec<AuditRecord>>>,
    }

    impl FakeAuditStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl AuditStore for FakeAuditStore {
        async fn append(&self, record: AuditRecord) -> Result<(), StorageError> {
            self.records.lock().push(record);
            Ok(())
        }

        async fn list_for_run(&self, run_id: RunId) -> Result<Vec<AuditRecord>, StorageError> {
            Ok(self
                .records
                .lock()
                .iter()
                .filter(|r| r.run_id == Some(run_id))
                .cloned()
                .collect())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAuditStore;

#[cfg(test)]
#[path = "audit_store_tests.rs"]
mod tests;
