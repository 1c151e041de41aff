// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay log: append-only, separate from the idempotency in-flight/committed
//! table. `record` never overwrites; a later divergent hash is recorded as a
//! mismatch alongside (not instead of) the original.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{Fingerprint, OpId, ReplayLogEntry};

#[async_trait]
pub trait ReplayStore: Send + Sync + 'static {
    /// Append a committed result. No-op if an entry for this op already
    /// exists (append-only; the original record is never overwritten).
    async fn record(&self, entry: ReplayLogEntry) -> Result<(), StorageError>;
    async fn get(&self, op_id: OpId) -> Result<Option<ReplayLogEntry>, StorageError>;
    /// Compare a recomputed hash against the stored record.
    async fn verify(&self, op_id: OpId, recomputed: Fingerprint) -> Result<orc_core::ReplayOutcome, StorageError>;
}

pub struct PgReplayStore {
    pool: sqlx::PgPool,
}

impl PgReplayStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReplayStore for PgReplayStore {
    async fn record(&self, entry: ReplayLogEntry) -> Result<(), StorageError> {
        let canonical_result: serde_json::Value = serde_json::from_slice(&entry.canonical_result)?;
        sqlx::query(
            "INSERT INTO replay_log (run_id, op_index, canonical_result, result_hash, committed_at_ms) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (run_id, op_index) DO NOTHING",
        )
        .bind(entry.op_id.run_id.as_str())
        .bind(entry.op_id.index as i32)
        .bind(&canonical_result)
        .bind(entry.result_hash.to_hex())
        .bind(entry.committed_at_ms as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, op_id: OpId) -> Result<Option<ReplayLogEntry>, StorageError> {
        let row: Option<(serde_json::Value, String, i64)> = sqlx::query_as(
            "SELECT canonical_result, result_hash, committed_at_ms FROM replay_log WHERE run_id = $1 AND op_index = $2",
        )
        .bind(op_id.run_id.as_str())
        .bind(op_id.index as i32)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((canonical_result, result_hash, committed_at_ms)) => {
                let result_hash = Fingerprint::from_hex(&result_hash)
                    .ok_or_else(|| StorageError::Backend(format!("malformed result_hash for {op_id}")))?;
                let canonical_result = serde_json::to_vec(&canonical_result)?;
                Ok(Some(ReplayLogEntry::new(op_id, canonical_result, result_hash, committed_at_ms as u64)))
            }
            None => Ok(None),
        }
    }

    async fn verify(&self, op_id: OpId, recomputed: Fingerprint) -> Result<orc_core::ReplayOutcome, StorageError> {
        match self.get(op_id).await? {
            Some(entry) if entry.result_hash == recomputed => Ok(orc_core::ReplayOutcome::Match),
            Some(_) => Ok(orc_core::ReplayOutcome::Mismatch),
            None => Err(StorageError::NotFound(op_id.to_string())),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeReplayStore {
        entries: Arc<DashMap<OpId, ReplayLogEntry>>,
    }

    impl FakeReplayStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ReplayStore for FakeReplayStore {
        async fn record(&self, entry: ReplayLogEntry) -> Result<(), StorageError> {
            self.entries.entry(entry.op_id).or_insert(entry);
            Ok(())
        }

        async fn get(&self, op_id: OpId) -> Result<Option<ReplayLogEntry>, StorageError> {
            Ok(self.entries.get(&op_id).map(|e| e.clone()))
        }

        async fn verify(&self, op_id: OpId, recomputed: Fingerprint) -> Result<orc_core::ReplayOutcome, StorageError> {
            match self.get(op_id).await? {
                Some(entry) if entry.result_hash == recomputed => Ok(orc_core::ReplayOutcome::Match),
                Some(_) => Ok(orc_core::ReplayOutcome::Mismatch),
                None => Err(StorageError::NotFound(op_id.to_string())),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReplayStore;

#[cfg(test)]
#[path = "replay_store_tests.rs"]
mod tests;
