// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox persistence port (C4). `insert_with_op_result` is written in the
//! same transaction as the op's succeeded row by the skill runtime — the two
//! writes commit or roll back together (§3 invariant).

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{OpId, OutboxEntry, OutboxEntryId, OutboxStatus, RunId};

#[async_trait]
pub trait OutboxStore: Send + Sync + 'static {
    async fn insert(&self, entry: &OutboxEntry) -> Result<(), StorageError>;
    /// Claim up to `max` pending entries whose `next_visible_at_ms <= now`,
    /// atomically marking them in-flight.
    async fn claim_batch(&self, max: usize, now_ms: u64) -> Result<Vec<OutboxEntry>, StorageError>;
    async fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), StorageError>;
    async fn mark_retry(&self, id: OutboxEntryId, next_visible_at_ms: u64, error: &str) -> Result<(), StorageError>;
    async fn mark_failed(&self, id: OutboxEntryId, error: &str) -> Result<(), StorageError>;
    async fn pending_count(&self) -> Result<u64, StorageError>;
}

type OutboxRow = (String, String, i32, String, serde_json::Value, String, String, i32, i64, Option<String>);

fn parse_outbox_status(s: &str) -> Result<OutboxStatus, StorageError> {
    match s {
        "pending" => Ok(OutboxStatus::Pending),
        "in_flight" => Ok(OutboxStatus::InFlight),
        "delivered" => Ok(OutboxStatus::Delivered),
        "failed" => Ok(OutboxStatus::Failed),
        other => Err(StorageError::Backend(format!("unknown outbox status {other}"))),
    }
}

fn row_to_outbox_entry(row: OutboxRow) -> Result<OutboxEntry, StorageError> {
    let (id, run_id, op_index, target, payload, downstream_idempotency_key, status, attempt, next_visible_at_ms, last_error) = row;
    Ok(OutboxEntry {
        id: OutboxEntryId::from_string(id),
        op_id: OpId::new(RunId::from_string(run_id), op_index as u32),
        target,
        payload: serde_json::to_vec(&payload)?,
        downstream_idempotency_key,
        status: parse_outbox_status(&status)?,
        attempt: attempt as u32,
        next_visible_at_ms: next_visible_at_ms as u64,
        last_error,
    })
}

pub struct PgOutboxStore {
    pool: sqlx::PgPool,
}

impl PgOutboxStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    async fn insert(&self, entry: &OutboxEntry) -> Result<(), StorageError> {
        let payload: serde_json::Value = serde_json::from_slice(&entry.payload)?;
        sqlx::query(
            "INSERT INTO outbox_entries (id, run_id, op_index, target, payload, \
             downstream_idempotency_key, status, attempt, next_visible_at_ms) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.id.as_str())
        .bind(entry.op_id.run_id.as_str())
        .bind(entry.op_id.index as i32)
        .bind(&entry.target)
        .bind(&payload)
        .bind(&entry.downstream_idempotency_key)
        .bind(entry.status.to_string())
        .bind(entry.attempt as i32)
        .bind(entry.next_visible_at_ms as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn claim_batch(&self, max: usize, now_ms: u64) -> Result<Vec<OutboxEntry>, StorageError> {
        let rows: Vec<OutboxRow> = sqlx::query_as(
            "UPDATE outbox_entries SET status = 'in_flight' WHERE id IN ( \
               SELECT id FROM outbox_entries WHERE status = 'pending' AND next_visible_at_ms <= $1 \
               ORDER BY next_visible_at_ms LIMIT $2 FOR UPDATE SKIP LOCKED \
             ) RETURNING id, run_id, op_index, target, payload, downstream_idempotency_key, status, attempt, next_visible_at_ms, last_error",
        )
        .bind(now_ms as i64)
        .bind(max as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_outbox_entry).collect()
    }

    async fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), StorageError> {
        sqlx::query("UPDATE outbox_entries SET status = 'delivered' WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_retry(&self, id: OutboxEntryId, next_visible_at_ms: u64, error: &str) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE outbox_entries SET status = 'pending', attempt = attempt + 1, \
             next_visible_at_ms = $2, last_error = $3 WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(next_visible_at_ms as i64)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: OutboxEntryId, error: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE outbox_entries SET status = 'failed', last_error = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM outbox_entries WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use orc_core::OutboxStatus;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeOutboxStore {
        entries: Arc<Mutex<HashMap<OutboxEntryId, OutboxEntry>>>,
    }

    impl FakeOutboxStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl OutboxStore for FakeOutboxStore {
        async fn insert(&self, entry: &OutboxEntry) -> Result<(), StorageError> {
            self.entries.lock().insert(entry.id, entry.clone());
            Ok(())
        }

        async fn claim_batch(&self, max: usize, now_ms: u64) -> Result<Vec<OutboxEntry>, StorageError> {
            let mut entries = self.entries.lock();
            let mut claimed = Vec::new();
            for entry in entries.values_mut() {
                if claimed.len() >= max {
                    break;
                }
                if entry.status == OutboxStatus::Pending && entry.next_visible_at_ms <= now_ms {
                    entry.status = OutboxStatus::InFlight;
                    claimed.push(entry.clone());
                }
            }
            Ok(claimed)
        }

        async fn mark_delivered(&self, id: OutboxEntryId) -> Result<(), StorageError> {
            if let Some(e) = self.entries.lock().get_mut(&id) {
                e.mark_delivered();
            }
            Ok(())
        }

        async fn mark_retry(&self, id: OutboxEntryId, next_visible_at_ms: u64, error: &str) -> Result<(), StorageError> {
            if let Some(e) = self.entries.lock().get_mut(&id) {
                e.mark_retry(next_visible_at_ms, error);
            }
            Ok(())
        }

        async fn mark_failed(&self, id: OutboxEntryId, error: &str) -> Result<(), StorageError> {
            if let Some(e) = self.entries.lock().get_mut(&id) {
                e.mark_failed(error);
            }
            Ok(())
        }

        async fn pending_count(&self) -> Result<u64, StorageError> {
            Ok(self
                .entries
                .lock()
                .values()
                .filter(|e| e.status == OutboxStatus::Pending)
                .count() as u64)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeOutboxStore;

#[cfg(test)]
#[path = "outbox_store_tests.rs"]
mod tests;
