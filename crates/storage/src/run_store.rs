// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run persistence port.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{Run, RunId, RunStatus, StepDescriptor, TenantId};

#[async_trait]
pub trait RunStore: Send + Sync + 'static {
    async fn insert(&self, run: &Run) -> Result<(), StorageError>;
    async fn get(&self, id: RunId) -> Result<Run, StorageError>;
    async fn update(&self, run: &Run) -> Result<(), StorageError>;
    async fn list_by_tenant(&self, tenant: TenantId, status: Option<RunStatus>) -> Result<Vec<Run>, StorageError>;
}

/// Production implementation against PostgreSQL.
pub struct PgRunStore {
    pool: sqlx::PgPool,
}

impl PgRunStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

type RunRow = (String, String, String, serde_json::Value, String, i64, Option<i64>, Option<i64>, Option<String>, Option<String>);

fn parse_run_status(s: &str) -> Result<RunStatus, StorageError> {
    match s {
        "queued" => Ok(RunStatus::Queued),
        "running" => Ok(RunStatus::Running),
        "succeeded" => Ok(RunStatus::Succeeded),
        "failed" => Ok(RunStatus::Failed),
        "cancelled" => Ok(RunStatus::Cancelled),
        "crashed" => Ok(RunStatus::Crashed),
        other => Err(StorageError::Backend(format!("unknown run status {other}"))),
    }
}

fn row_to_run(row: RunRow) -> Result<Run, StorageError> {
    let (id, tenant_id, agent_id, plan, status, created_at_ms, started_at_ms, completed_at_ms, parent_run_id, submission_idempotency_key) = row;
    let plan: Vec<StepDescriptor> = serde_json::from_value(plan)?;
    Ok(Run {
        id: RunId::from_string(id),
        tenant_id: TenantId::from_string(tenant_id),
        agent_id,
        plan,
        status: parse_run_status(&status)?,
        created_at_ms: created_at_ms as u64,
        started_at_ms: started_at_ms.map(|v| v as u64),
        completed_at_ms: completed_at_ms.map(|v| v as u64),
        parent_run_id: parent_run_id.map(RunId::from_string),
        submission_idempotency_key,
    })
}

#[async_trait]
impl RunStore for PgRunStore {
    async fn insert(&self, run: &Run) -> Result<(), StorageError> {
        let plan = serde_json::to_value(&run.plan)?;
        sqlx::query(
            "INSERT INTO runs (id, tenant_id, agent_id, plan, status, created_at_ms, started_at_ms, \
             completed_at_ms, parent_run_id, submission_idempotency_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(run.id.as_str())
        .bind(run.tenant_id.as_str())
        .bind(&run.agent_id)
        .bind(plan)
        .bind(run.status.to_string())
        .bind(run.created_at_ms as i64)
        .bind(run.started_at_ms.map(|v| v as i64))
        .bind(run.completed_at_ms.map(|v| v as i64))
        .bind(run.parent_run_id.map(|id| id.as_str().to_string()))
        .bind(&run.submission_idempotency_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: RunId) -> Result<Run, StorageError> {
        let row: Option<RunRow> = sqlx::query_as(
            "SELECT id, tenant_id, agent_id, plan, status, created_at_ms, started_at_ms, \
             completed_at_ms, parent_run_id, submission_idempotency_key FROM runs WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_run(row),
            None => Err(StorageError::NotFound(id.as_str().to_string())),
        }
    }

    async fn update(&self, run: &Run) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE runs SET status = $2, started_at_ms = $3, completed_at_ms = $4 WHERE id = $1",
        )
        .bind(run.id.as_str())
        .bind(run.status.to_string())
        .bind(run.started_at_ms.map(|v| v as i64))
        .bind(run.completed_at_ms.map(|v| v as i64))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_tenant(&self, tenant: TenantId, status: Option<RunStatus>) -> Result<Vec<Run>, StorageError> {
        let rows: Vec<RunRow> = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT id, tenant_id, agent_id, plan, status, created_at_ms, started_at_ms, \
                     completed_at_ms, parent_run_id, submission_idempotency_key \
                     FROM runs WHERE tenant_id = $1 AND status = $2",
                )
                .bind(tenant.as_str())
                .bind(status.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, tenant_id, agent_id, plan, status, created_at_ms, started_at_ms, \
                     completed_at_ms, parent_run_id, submission_idempotency_key \
                     FROM runs WHERE tenant_id = $1",
                )
                .bind(tenant.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(row_to_run).collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeRunStore {
        runs: Arc<DashMap<RunId, Run>>,
    }

    impl FakeRunStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl RunStore for FakeRunStore {
        async fn insert(&self, run: &Run) -> Result<(), StorageError> {
            self.runs.insert(run.id, run.clone());
            Ok(())
        }

        async fn get(&self, id: RunId) -> Result<Run, StorageError> {
            self.runs
                .get(&id)
                .map(|r| r.clone())
                .ok_or_else(|| StorageError::NotFound(id.as_str().to_string()))
        }

        async fn update(&self, run: &Run) -> Result<(), StorageError> {
            if !self.runs.contains_key(&run.id) {
                return Err(StorageError::NotFound(run.id.as_str().to_string()));
            }
            self.runs.insert(run.id, run.clone());
            Ok(())
        }

        async fn list_by_tenant(&self, tenant: TenantId, status: Option<RunStatus>) -> Result<Vec<Run>, StorageError> {
            Ok(self
                .runs
                .iter()
                .filter(|e| e.tenant_id == tenant)
                .filter(|e| status.map(|s| e.status == s).unwrap_or(true))
                .map(|e| e.clone())
                .collect())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRunStore;

#[cfg(test)]
#[path = "run_store_tests.rs"]
mod tests;
