// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant policy persistence port: recovery approval mode and auto-execute
//! threshold per tenant, consulted by the recovery pipeline's gating step.

use crate::error::StorageError;
use async_trait::async_trait;
use orc_core::{ApprovalMode, TenantId, TenantPolicy};

#[async_trait]
pub trait TenantPolicyStore: Send + Sync + 'static {
    /// Falls back to `TenantPolicy::manual` for a tenant with no row yet,
    /// rather than erroring, since every tenant implicitly starts manual.
    async fn get(&self, tenant_id: TenantId) -> Result<TenantPolicy, StorageError>;
    async fn upsert(&self, policy: &TenantPolicy) -> Result<(), StorageError>;
}

fn parse_approval_mode(s: &str) -> Result<ApprovalMode, StorageError> {
    match s {
        "auto" => Ok(ApprovalMode::Auto),
        "manual" => Ok(ApprovalMode::Manual),
        other => Err(StorageError::Backend(format!("unknown approval mode {other}"))),
    }
}

pub struct PgTenantPolicyStore {
    pool: sqlx::PgPool,
}

impl PgTenantPolicyStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantPolicyStore for PgTenantPolicyStore {
    async fn get(&self, tenant_id: TenantId) -> Result<TenantPolicy, StorageError> {
        let row: Option<(String, f32)> =
            sqlx::query_as("SELECT approval_mode, auto_threshold FROM tenant_policies WHERE tenant_id = $1")
                .bind(tenant_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((approval_mode, auto_threshold)) => Ok(TenantPolicy {
                tenant_id,
                approval_mode: parse_approval_mode(&approval_mode)?,
                auto_threshold,
            }),
            None => Ok(TenantPolicy::manual(tenant_id)),
        }
    }

    async fn upsert(&self, policy: &TenantPolicy) -> Result<(), StorageError> {
        let approval_mode = match policy.approval_mode {
            ApprovalMode::Auto => "auto",
            ApprovalMode::Manual => "manual",
        };
        sqlx::query(
            "INSERT INTO tenant_policies (tenant_id, approval_mode, auto_threshold) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (tenant_id) DO UPDATE SET approval_mode = $2, auto_threshold = $3",
        )
        .bind(policy.tenant_id.as_str())
        .bind(approval_mode)
        .bind(policy.auto_threshold)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use dashmap::DashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeTenantPolicyStore {
        policies: Arc<DashMap<TenantId, TenantPolicy>>,
    }

    impl FakeTenantPolicyStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl TenantPolicyStore for FakeTenantPolicyStore {
        async fn get(&self, tenant_id: TenantId) -> Result<TenantPolicy, StorageError> {
            Ok(self
                .policies
                .get(&tenant_id)
                .map(|p| p.clone())
                .unwrap_or_else(|| TenantPolicy::manual(tenant_id)))
        }

        async fn upsert(&self, policy: &TenantPolicy) -> Result<(), StorageError> {
            self.policies.insert(policy.tenant_id, policy.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTenantPolicyStore;

#[cfg(test)]
#[path = "tenant_store_tests.rs"]
mod tests;
