// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tenant policy: recovery approval mode and budget defaults.

use crate::id::TenantId;
use serde::{Deserialize, Serialize};

/// How recovery candidates are dispositioned for a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Candidates scoring at or above `auto_threshold` execute without a human.
    Auto,
    /// All candidates queue for human approval regardless of confidence.
    Manual,
}

/// Open Question 2 resolution: approval defaults to manual with threshold 0.8
/// until a tenant explicitly opts into auto-approval.
impl Default for ApprovalMode {
    fn default() -> Self {
        ApprovalMode::Manual
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantPolicy {
    pub tenant_id: TenantId,
    pub approval_mode: ApprovalMode,
    /// Candidates with confidence >= this threshold auto-execute when
    /// `approval_mode == Auto`. Ignored under `Manual`.
    pub auto_threshold: f32,
}

impl TenantPolicy {
    pub fn manual(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            approval_mode: ApprovalMode::Manual,
            auto_threshold: 0.8,
        }
    }

    /// Whether a candidate with the given confidence should auto-execute
    /// under this policy.
    pub fn auto_executes(&self, confidence: f32) -> bool {
        matches!(self.approval_mode, ApprovalMode::Auto) && confidence >= self.auto_threshold
    }
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
