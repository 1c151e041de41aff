// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation persistence port. Claims are scoped by fencing token: every
//! mutation of an op must present the token the caller believes is current,
//! and stale tokens are rejected (§5).

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{FencingToken, OpId, OpStatus, Operation, RunId, WorkerId};

#[async_trait]
pub trait OpStore: Send + Sync + 'static {
    async fn insert_many(&self, ops: &[Operation]) -> Result<(), StorageError>;
    async fn get(&self, id: OpId) -> Result<Operation, StorageError>;
    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<Operation>, StorageError>;
    /// Persist a mutated op, checked against the current fencing token of the
    /// run lock the caller holds. Rejects with `Conflict` if the token is stale.
    async fn save(&self, op: &Operation, fencing_token: FencingToken) -> Result<(), StorageError>;
    /// Release every op claimed by a worker whose lock lease is no longer
    /// live, returning them to `pending`. Used by `reconcile_on_startup`.
    async fn release_orphaned(&self, before_ms: u64) -> Result<u64, StorageError>;
}

pub struct PgOpStore {
    pool: sqlx::PgPool,
}

impl PgOpStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

type OpRow = (String, i32, String, serde_json::Value, String, i32, Option<String>, Option<i64>, Option<i64>, Option<String>);

fn parse_op_status(s: &str) -> Result<OpStatus, StorageError> {
    match s {
        "pending" => Ok(OpStatus::Pending),
        "claimed" => Ok(OpStatus::Claimed),
        "succeeded" => Ok(OpStatus::Succeeded),
        "failed" => Ok(OpStatus::Failed),
        "dead" => Ok(OpStatus::Dead),
        other => Err(StorageError::Backend(format!("unknown op status {other}"))),
    }
}

fn row_to_operation(row: OpRow) -> Result<Operation, StorageError> {
    let (run_id, op_index, skill, params, status, attempt, claimed_by, claimed_at_ms, heartbeat_at_ms, result_ref) = row;
    Ok(Operation {
        id: OpId::new(RunId::from_string(run_id), op_index as u32),
        skill,
        params,
        status: parse_op_status(&status)?,
        attempt: attempt as u32,
        claimed_by: claimed_by.map(WorkerId::from_string),
        claimed_at_ms: claimed_at_ms.map(|v| v as u64),
        heartbeat_at_ms: heartbeat_at_ms.map(|v| v as u64),
        result_ref,
    })
}

#[async_trait]
impl OpStore for PgOpStore {
    async fn insert_many(&self, ops: &[Operation]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        for op in ops {
            let params = serde_json::to_value(&op.params)?;
            sqlx::query(
                "INSERT INTO operations (run_id, op_index, skill, params, status, attempt, fencing_token) \
                 VALUES ($1, $2, $3, $4, $5, $6, 0) ON CONFLICT (run_id, op_index) DO NOTHING",
            )
            .bind(op.id.run_id.as_str())
            .bind(op.id.index as i32)
            .bind(&op.skill)
            .bind(params)
            .bind(op.status.to_string())
            .bind(op.attempt as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OpId) -> Result<Operation, StorageError> {
        let row: Option<OpRow> = sqlx::query_as(
            "SELECT run_id, op_index, skill, params, status, attempt, claimed_by, claimed_at_ms, heartbeat_at_ms, result_ref \
             FROM operations WHERE run_id = $1 AND op_index = $2",
        )
        .bind(id.run_id.as_str())
        .bind(id.index as i32)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_operation(row),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn list_for_run(&self, run_id: RunId) -> Result<Vec<Operation>, StorageError> {
        let rows: Vec<OpRow> = sqlx::query_as(
            "SELECT run_id, op_index, skill, params, status, attempt, claimed_by, claimed_at_ms, heartbeat_at_ms, result_ref \
             FROM operations WHERE run_id = $1 ORDER BY op_index",
        )
        .bind(run_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_operation).collect()
    }

    async fn save(&self, op: &Operation, fencing_token: FencingToken) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE operations SET status = $3, attempt = $4, claimed_by = $5, claimed_at_ms = $6, \
             heartbeat_at_ms = $7, result_ref = $8, fencing_token = $9 \
             WHERE run_id = $1 AND op_index = $2 AND fencing_token <= $9",
        )
        .bind(op.id.run_id.as_str())
        .bind(op.id.index as i32)
        .bind(op.status.to_string())
        .bind(op.attempt as i32)
        .bind(op.claimed_by.map(|w| w.as_str().to_string()))
        .bind(op.claimed_at_ms.map(|v| v as i64))
        .bind(op.heartbeat_at_ms.map(|v| v as i64))
        .bind(&op.result_ref)
        .bind(fencing_token as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!("stale fencing token for {}", op.id)));
        }
        Ok(())
    }

    async fn release_orphaned(&self, before_ms: u64) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "UPDATE operations SET status = 'pending', claimed_by = NULL, claimed_at_ms = NULL \
             WHERE status = 'claimed' AND heartbeat_at_ms < $1",
        )
        .bind(before_ms as i64)
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
    pub struct FakeOpStore {
        ops: Arc<DashMap<OpId, Operation>>,
        fencing_tokens: Arc<DashMap<OpId, FencingToken>>,
    }

    impl FakeOpStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl OpStore for FakeOpStore {
        async fn insert_many(&self, ops: &[Operation]) -> Result<(), StorageError> {
            for op in ops {
                self.ops.entry(op.id).or_insert_with(|| op.clone());
            }
            Ok(())
        }

        async fn get(&self, id: OpId) -> Result<Operation, StorageError> {
            self.ops
                .get(&id)
                .map(|o| o.clone())
                .ok_or_else(|| StorageError::NotFound(id.to_string()))
        }

        async fn list_for_run(&self, run_id: RunId) -> Result<Vec<Operation>, StorageError> {
            let mut ops: Vec<Operation> = self
                .ops
                .iter()
                .filter(|e| e.id.run_id == run_id)
                .map(|e| e.clone())
                .collect();
            ops.sort_by_key(|o| o.id.index);
            Ok(ops)
        }

        async fn save(&self, op: &Operation, fencing_token: FencingToken) -> Result<(), StorageError> {
            if !self.ops.contains_key(&op.id) {
                return Err(StorageError::NotFound(op.id.to_string()));
            }
            if let Some(current) = self.fencing_tokens.get(&op.id) {
                if fencing_token < *current {
                    return Err(StorageError::Conflict(format!("stale fencing token for {}", op.id)));
                }
            }
            self.fencing_tokens.insert(op.id, fencing_token);
            self.ops.insert(op.id, op.clone());
            Ok(())
        }

        async fn release_orphaned(&self, before_ms: u64) -> Result<u64, StorageError> {
            let mut released = 0u64;
            for mut entry in self.ops.iter_mut() {
                let op = entry.value_mut();
                if op.status == orc_core::OpStatus::Claimed
                    && op.heartbeat_at_ms.map(|h| h < before_ms).unwrap_or(false)
                {
                    op.release();
                    released += 1;
                }
            }
            Ok(released)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeOpStore;

#[cfg(test)]
#[path = "op_store_tests.rs"]
mod tests;
