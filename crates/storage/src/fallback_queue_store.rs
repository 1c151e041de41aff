// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres fallback lane for the durable work queue (C1). Used when the
//! Redis Streams primary lane is unavailable; workers poll this lane with
//! `SELECT ... FOR UPDATE SKIP LOCKED` so multiple pollers never contend on
//! the same row.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::OpId;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct FallbackQueueItem {
    pub op_id: OpId,
    pub payload: Value,
    pub enqueued_at_ms: u64,
    pub visible_at_ms: u64,
    pub attempt: u32,
}

#[async_trait]
pub trait FallbackQueueStore: Send + Sync + 'static {
    async fn enqueue(&self, op_id: OpId, payload: Value, now_ms: u64) -> Result<(), StorageError>;

    /// Claims up to `max` visible items, locking their rows for the
    /// duration of the caller's transaction.
    async fn claim(&self, max: usize, now_ms: u64) -> Result<Vec<FallbackQueueItem>, StorageError>;

    async fn ack(&self, op_id: OpId) -> Result<(), StorageError>;

    /// Returns the item to visibility after `delay_ms`, bumping its attempt.
    async fn nack(&self, op_id: OpId, delay_ms: u64, now_ms: u64) -> Result<(), StorageError>;

    async fn depth(&self) -> Result<u64, StorageError>;
}

pub struct PgFallbackQueueStore {
    pool: sqlx::PgPool,
}

impl PgFallbackQueueStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FallbackQueueStore for PgFallbackQueueStore {
    async fn enqueue(&self, op_id: OpId, payload: Value, now_ms: u64) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO fallback_queue (run_id, op_index, payload, enqueued_at_ms, visible_at_ms, attempt) \
             VALUES ($1, $2, $3, $4, $4, 0) \
             ON CONFLICT (run_id, op_index) DO NOTHING",
        )
        .bind(op_id.run_id.as_str())
        .bind(op_id.index as i32)
        .bind(payload)
        .bind(now_ms as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn claim(&self, max: usize, now_ms: u64) -> Result<Vec<FallbackQueueItem>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let rows: Vec<(String, i32, Value, i64, i64, i32)> = sqlx::query_as(
            "SELECT run_id, op_index, payload, enqueued_at_ms, visible_at_ms, attempt \
             FROM fallback_queue WHERE visible_at_ms <= $1 \
             ORDER BY enqueued_at_ms ASC LIMIT $2 FOR UPDATE SKIP LOCKED",
        )
        .bind(now_ms as i64)
        .bind(max as i64)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|(run_id, op_index, payload, enqueued_at_ms, visible_at_ms, attempt)| FallbackQueueItem {
                op_id: OpId {
                    run_id: orc_core::RunId::from_string(&run_id),
                    index: op_index as u32,
                },
                payload,
                enqueued_at_ms: enqueued_at_ms as u64,
                visible_at_ms: visible_at_ms as u64,
                attempt: attempt as u32,
            })
            .collect())
    }

    async fn ack(&self, op_id: OpId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM fallback_queue WHERE run_id = $1 AND op_index = $2")
            .bind(op_id.run_id.as_str())
            .bind(op_id.index as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn nack(&self, op_id: OpId, delay_ms: u64, now_ms: u64) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE fallback_queue SET visible_at_ms = $3 + $4, attempt = attempt + 1 \
             WHERE run_id = $1 AND op_index = $2",
        )
        .bind(op_id.run_id.as_str())
        .bind(op_id.index as i32)
        .bind(now_ms as i64)
        .bind(delay_ms as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn depth(&self) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM fallback_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeFallbackQueueStore {
        items: Arc<Mutex<HashMap<OpId, FallbackQueueItem>>>,
    }

    impl FakeFallbackQueueStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl FallbackQueueStore for FakeFallbackQueueStore {
        async fn enqueue(&self, op_id: OpId, payload: Value, now_ms: u64) -> Result<(), StorageError> {
            let mut items = self.items.lock();
            items.entry(op_id).or_insert(FallbackQueueItem {
                op_id,
                payload,
                enqueued_at_ms: now_ms,
                visible_at_ms: now_ms,
                attempt: 0,
            });
            Ok(())
        }

        async fn claim(&self, max: usize, now_ms: u64) -> Result<Vec<FallbackQueueItem>, StorageError> {
            let items = self.items.lock();
            let mut visible: Vec<FallbackQueueItem> = items
                .values()
                .filter(|i| i.visible_at_ms <= now_ms)
                .cloned()
                .collect();
            visible.sort_by_key(|i| i.enqueued_at_ms);
            visible.truncate(max);
            Ok(visible)
        }

        async fn ack(&self, op_id: OpId) -> Result<(), StorageError> {
            self.items.lock().remove(&op_id);
            Ok(())
        }

        async fn nack(&self, op_id: OpId, delay_ms: u64, now_ms: u64) -> Result<(), StorageError> {
            if let Some(item) = self.items.lock().get_mut(&op_id) {
                item.visible_at_ms = now_ms + delay_ms;
                item.attempt += 1;
            }
            Ok(())
        }

        async fn depth(&self) -> Result<u64, StorageError> {
            Ok(self.items.lock().len() as u64)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFallbackQueueStore;

#[cfg(test)]
#[path = "fallback_queue_store_tests.rs"]
mod tests;
