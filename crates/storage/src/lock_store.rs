// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed lock persistence. Fencing tokens are monotonic per resource;
//! a stale holder presenting an old token must be rejected by whatever it's
//! guarding, not just by this store.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{FencingToken, LockRecord, WorkerId};

#[async_trait]
pub trait LockStore: Send + Sync + 'static {
    /// Acquires `resource` for `holder` if unheld or expired, bumping the
    /// fencing token. Returns the new record, or `Conflict` if held by
    /// someone else and not yet expired.
    async fn acquire(
        &self,
        resource: &str,
        holder: &str,
        lease_ms: u64,
        now_ms: u64,
    ) -> Result<LockRecord, StorageError>;

    /// Extends the lease for the current holder. Fails if `holder` no
    /// longer owns the lock (lost it to expiry + another acquire).
    async fn renew(&self, resource: &str, holder: &str, lease_ms: u64, now_ms: u64) -> Result<LockRecord, StorageError>;

    async fn release(&self, resource: &str, holder: &str) -> Result<(), StorageError>;

    async fn inspect(&self, resource: &str) -> Result<Option<LockRecord>, StorageError>;

    /// Removes lease rows expired before `now_ms` with no live holder,
    /// used by the maintenance loop. Acquire already steals expired leases
    /// lazily; this only reclaims space for resources nobody has contended.
    async fn gc_expired(&self, now_ms: u64) -> Result<u64, StorageError>;
}

pub struct PgLockStore {
    pool: sqlx::PgPool,
}

impl PgLockStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for PgLockStore {
    async fn acquire(
        &self,
        resource: &str,
        holder: &str,
        lease_ms: u64,
        now_ms: u64,
    ) -> Result<LockRecord, StorageError> {
        let row: Option<(String, i64, i64, i64)> = sqlx::query_as(
            "INSERT INTO locks (resource, holder, acquired_at_ms, lease_expires_at_ms, fencing_token) \
             VALUES ($1, $2, $3, $3 + $4, 1) \
             ON CONFLICT (resource) DO UPDATE SET \
               holder = EXCLUDED.holder, \
               acquired_at_ms = EXCLUDED.acquired_at_ms, \
               lease_expires_at_ms = EXCLUDED.lease_expires_at_ms, \
               fencing_token = locks.fencing_token + 1 \
             WHERE locks.lease_expires_at_ms < $3 OR locks.holder = $2 \
             RETURNING holder, acquired_at_ms, lease_expires_at_ms, fencing_token",
        )
        .bind(resource)
        .bind(holder)
        .bind(now_ms as i64)
        .bind(lease_ms as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((holder, acquired_at_ms, lease_expires_at_ms, fencing_token)) => Ok(LockRecord {
                resource: resource.to_string(),
                holder: WorkerId::from_string(&holder),
                acquired_at_ms: acquired_at_ms as u64,
                lease_expires_at_ms: lease_expires_at_ms as u64,
                fencing_token: fencing_token as FencingToken,
            }),
            None => Err(StorageError::Conflict(format!("lock {resource} held by another holder"))),
        }
    }

    async fn renew(&self, resource: &str, holder: &str, lease_ms: u64, now_ms: u64) -> Result<LockRecord, StorageError> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "UPDATE locks SET lease_expires_at_ms = $3 + $4 WHERE resource = $1 AND holder = $2 \
             RETURNING fencing_token, acquired_at_ms",
        )
        .bind(resource)
        .bind(holder)
        .bind(now_ms as i64)
        .bind(lease_ms as i64)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((fencing_token, acquired_at_ms)) => Ok(LockRecord {
                resource: resource.to_string(),
                holder: WorkerId::from_string(holder),
                acquired_at_ms: acquired_at_ms as u64,
                lease_expires_at_ms: now_ms + lease_ms,
                fencing_token: fencing_token as FencingToken,
            }),
            None => Err(StorageError::Conflict(format!("{holder} no longer holds {resource}"))),
        }
    }

    async fn release(&self, resource: &str, holder: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM locks WHERE resource = $1 AND holder = $2")
            .bind(resource)
            .bind(holder)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn inspect(&self, resource: &str) -> Result<Option<LockRecord>, StorageError> {
        let row: Option<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT holder, acquired_at_ms, lease_expires_at_ms, fencing_token FROM locks WHERE resource = $1",
        )
        .bind(resource)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(holder, acquired_at_ms, lease_expires_at_ms, fencing_token)| LockRecord {
            resource: resource.to_string(),
            holder: WorkerId::from_string(holder),
            acquired_at_ms: acquired_at_ms as u64,
            lease_expires_at_ms: lease_expires_at_ms as u64,
            fencing_token: fencing_token as FencingToken,
        }))
    }

    async fn gc_expired(&self, now_ms: u64) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM locks WHERE lease_expires_at_ms < $1")
            .bind(now_ms as i64)
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

    #[derive(Clone, Default)]
    pub struct FakeLockStore {
        locks: Arc<Mutex<HashMap<String, LockRecord>>>,
    }

    impl FakeLockStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl LockStore for FakeLockStore {
        async fn acquire(
            &self,
            resource: &str,
            holder: &str,
            lease_ms: u64,
            now_ms: u64,
        ) -> Result<LockRecord, StorageError> {
            let mut locks = self.locks.lock();
            let next_token = match locks.get(resource) {
                Some(existing) if existing.holder != holder && !existing.is_expired(now_ms) => {
                    return Err(StorageError::Conflict(format!("lock {resource} held by {}", existing.holder)));
                }
                Some(existing) => existing.fencing_token + 1,
                None => 1,
            };
            let record = LockRecord {
                resource: resource.to_string(),
                holder: WorkerId::from_string(holder),
                acquired_at_ms: now_ms,
                lease_expires_at_ms: now_ms + lease_ms,
                fencing_token: next_token,
            };
            locks.insert(resource.to_string(), record.clone());
            Ok(record)
        }

        async fn renew(&self, resource: &str, holder: &str, lease_ms: u64, now_ms: u64) -> Result<LockRecord, StorageError> {
            let mut locks = self.locks.lock();
            match locks.get_mut(resource) {
                Some(existing) if existing.holder == holder => {
                    existing.lease_expires_at_ms = now_ms + lease_ms;
                    Ok(existing.clone())
                }
                _ => Err(StorageError::Conflict(format!("{holder} no longer holds {resource}"))),
            }
        }

        async fn release(&self, resource: &str, holder: &str) -> Result<(), StorageError> {
            let mut locks = self.locks.lock();
            if let Some(existing) = locks.get(resource) {
                if existing.holder == holder {
                    locks.remove(resource);
                }
            }
            Ok(())
        }

        async fn inspect(&self, resource: &str) -> Result<Option<LockRecord>, StorageError> {
            Ok(self.locks.lock().get(resource).cloned())
        }

        async fn gc_expired(&self, now_ms: u64) -> Result<u64, StorageError> {
            let mut locks = self.locks.lock();
            let to_remove: Vec<String> = locks
                .iter()
                .filter(|(_, r)| r.is_expired(now_ms))
                .map(|(k, _)| k.clone())
                .collect();
            let count = to_remove.len() as u64;
            for k in to_remove {
                locks.remove(&k);
            }
            Ok(count)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLockStore;

#[cfg(test)]
#[path = "lock_store_tests.rs"]
mod tests;
