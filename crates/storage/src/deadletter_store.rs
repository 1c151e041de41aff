// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-letter archive persistence port (C5). Append-only: there is no
//! `update` beyond flipping `catalog_match` (reconciliation) and `recovered`.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{DeadLetterEntry, DeadLetterId, FailureKind, OpId, RunId, TenantId};

#[async_trait]
pub trait DeadLetterStore: Send + Sync + 'static {
    async fn archive(&self, entry: &DeadLetterEntry) -> Result<(), StorageError>;
    async fn get(&self, id: DeadLetterId) -> Result<DeadLetterEntry, StorageError>;
    async fn list_unmatched(&self) -> Result<Vec<DeadLetterEntry>, StorageError>;
    async fn set_catalog_match(&self, id: DeadLetterId, rule_name: &str) -> Result<(), StorageError>;
    async fn mark_recovered(&self, id: DeadLetterId) -> Result<(), StorageError>;
    /// Count of entries for a tenant not yet `recovered`, used by the
    /// monotonic dead-letter-count regression guard (§8 invariant 8).
    async fn unreconciled_count(&self, tenant: TenantId) -> Result<u64, StorageError>;
    async fn purge_before(&self, retained_after_ms: u64) -> Result<u64, StorageError>;
}

type DeadLetterRow = (String, String, i32, String, serde_json::Value, String, Option<String>, String, i32, i64, bool, bool);

fn parse_failure_kind(s: &str) -> Result<FailureKind, StorageError> {
    match s {
        "transient" => Ok(FailureKind::Transient),
        "rate_limited" => Ok(FailureKind::RateLimited),
        "deadline" => Ok(FailureKind::Deadline),
        "circuit_open" => Ok(FailureKind::CircuitOpen),
        "budget_exceeded" => Ok(FailureKind::BudgetExceeded),
        "schema_mismatch" => Ok(FailureKind::SchemaMismatch),
        "param_mismatch" => Ok(FailureKind::ParamMismatch),
        "not_found" => Ok(FailureKind::NotFound),
        "forbidden" => Ok(FailureKind::Forbidden),
        "upstream_bug" => Ok(FailureKind::UpstreamBug),
        "internal_invariant" => Ok(FailureKind::InternalInvariant),
        other => Err(StorageError::Backend(format!("unknown failure kind {other}"))),
    }
}

fn row_to_dead_letter_entry(row: DeadLetterRow) -> Result<DeadLetterEntry, StorageError> {
    let (id, run_id, op_index, skill, canonical_params, failure_kind, catalog_match, last_error, attempts, archived_at_ms, replayable, recovered) =
        row;
    Ok(DeadLetterEntry {
        id: DeadLetterId::from_string(id),
        op_id: OpId::new(RunId::from_string(run_id), op_index as u32),
        skill,
        canonical_params: serde_json::to_vec(&canonical_params)?,
        failure_kind: parse_failure_kind(&failure_kind)?,
        catalog_match,
        last_error,
        attempts: attempts as u32,
        archived_at_ms: archived_at_ms as u64,
        replayable,
        recovered,
    })
}

pub struct PgDeadLetterStore {
    pool: sqlx::PgPool,
}

impl PgDeadLetterStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeadLetterStore for PgDeadLetterStore {
    async fn archive(&self, entry: &DeadLetterEntry) -> Result<(), StorageError> {
        let canonical_params: serde_json::Value = serde_json::from_slice(&entry.canonical_params)?;
        sqlx::query(
            "INSERT INTO dead_letters (id, run_id, op_index, skill, canonical_params, failure_kind, \
             catalog_match, last_error, attempts, archived_at_ms, replayable, recovered) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, false)",
        )
        .bind(entry.id.as_str())
        .bind(entry.op_id.run_id.as_str())
        .bind(entry.op_id.index as i32)
        .bind(&entry.skill)
        .bind(&canonical_params)
        .bind(entry.failure_kind.as_str())
        .bind(&entry.catalog_match)
        .bind(&entry.last_error)
        .bind(entry.attempts as i32)
        .bind(entry.archived_at_ms as i64)
        .bind(entry.replayable)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: DeadLetterId) -> Result<DeadLetterEntry, StorageError> {
        let row: Option<DeadLetterRow> = sqlx::query_as(
            "SELECT id, run_id, op_index, skill, canonical_params, failure_kind, catalog_match, \
             last_error, attempts, archived_at_ms, replayable, recovered FROM dead_letters WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_dead_letter_entry(row),
            None => Err(StorageError::NotFound(id.as_str().to_string())),
        }
    }

    async fn list_unmatched(&self) -> Result<Vec<DeadLetterEntry>, StorageError> {
        let rows: Vec<DeadLetterRow> = sqlx::query_as(
            "SELECT id, run_id, op_index, skill, canonical_params, failure_kind, catalog_match, \
             last_error, attempts, archived_at_ms, replayable, recovered \
             FROM dead_letters WHERE catalog_match IS NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_dead_letter_entry).collect()
    }

    async fn set_catalog_match(&self, id: DeadLetterId, rule_name: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE dead_letters SET catalog_match = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(rule_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_recovered(&self, id: DeadLetterId) -> Result<(), StorageError> {
        sqlx::query("UPDATE dead_letters SET recovered = true WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unreconciled_count(&self, tenant: TenantId) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM dead_letters d JOIN runs r ON r.id = d.run_id \
             WHERE r.tenant_id = $1 AND d.recovered = false",
        )
        .bind(tenant.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn purge_before(&self, retained_after_ms: u64) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM dead_letters WHERE archived_at_ms < $1")
            .bind(retained_after_ms as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeDeadLetterStore {
        entries: Arc<DashMap<DeadLetterId, DeadLetterEntry>>,
    }

    impl FakeDeadLetterStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl DeadLetterStore for FakeDeadLetterStore {
        async fn archive(&self, entry: &DeadLetterEntry) -> Result<(), StorageError> {
            self.entries.insert(entry.id, entry.clone());
            Ok(())
        }

        async fn get(&self, id: DeadLetterId) -> Result<DeadLetterEntry, StorageError> {
            self.entries
                .get(&id)
                .map(|e| e.clone())
                .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))
        }

        async fn list_unmatched(&self) -> Result<Vec<DeadLetterEntry>, StorageError> {
            Ok(self
                .entries
                .iter()
                .filter(|e| e.catalog_match.is_none())
                .map(|e| e.clone())
                .collect())
        }

        async fn set_catalog_match(&self, id: DeadLetterId, rule_name: &str) -> Result<(), StorageError> {
            if let Some(mut e) = self.entries.get_mut(&id) {
                e.catalog_match = Some(rule_name.to_string());
            }
            Ok(())
        }

        async fn mark_recovered(&self, id: DeadLetterId) -> Result<(), StorageError> {
            if let Some(mut e) = self.entries.get_mut(&id) {
                e.recovered = true;
            }
            Ok(())
        }

        async fn unreconciled_count(&self, _tenant: TenantId) -> Result<u64, StorageError> {
            Ok(self.entries.iter().filter(|e| !e.recovered).count() as u64)
        }

        async fn purge_before(&self, retained_after_ms: u64) -> Result<u64, StorageError> {
            let to_remove: Vec<DeadLetterId> = self
                .entries
                .iter()
                .filter(|e| e.archived_at_ms < retained_after_ms)
                .map(|e| e.id)
                .collect();
            let count = to_remove.len() as u64;
            for id in to_remove {
                self.entries.remove(&id);
            }
            Ok(count)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDeadLetterStore;

#[cfg(test)]
#[path = "deadletter_store_tests.rs"]
mod tests;
