// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier and state machine.
//!
//! A run is an agent's submitted plan. Runs are mutated only by the worker
//! holding their distributed lock (see `engine::locks`), and only
//! pending/running runs may be mutated at all: reaching a terminal status is
//! a one-way door (retries create a new, parent-linked run rather than
//! resurrecting this one — see the core design note on retry-creates-new-execution).

use crate::id::{RunId, TenantId};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Crashed,
}

impl RunStatus {
    /// Terminal statuses are never mutated back to `Running`; recovery always
    /// creates a new run instead.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Crashed
        )
    }
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Cancelled => "cancelled",
        Crashed => "crashed",
    }
}

/// One step of a run's plan, as submitted by the agent (before it becomes an
/// `Operation` in the queue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub skill: String,
    pub params: serde_json::Value,
}

/// A run: the unit an agent submits and polls for completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub tenant_id: TenantId,
    pub agent_id: String,
    pub plan: Vec<StepDescriptor>,
    pub status: RunStatus,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    /// Set when this run was created by the recovery pipeline reinjecting an
    /// approved candidate; `None` for agent-submitted runs.
    pub parent_run_id: Option<RunId>,
    /// Caller-supplied idempotency key from `submit-run`, if any.
    pub submission_idempotency_key: Option<String>,
}

impl Run {
    pub fn new(
        tenant_id: TenantId,
        agent_id: impl Into<String>,
        plan: Vec<StepDescriptor>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: RunId::new(),
            tenant_id,
            agent_id: agent_id.into(),
            plan,
            status: RunStatus::Queued,
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            parent_run_id: None,
            submission_idempotency_key: None,
        }
    }

    /// Create a parent-linked retry run for the given recovery action plan.
    pub fn reinject(
        parent: &Run,
        plan: Vec<StepDescriptor>,
        created_at_ms: u64,
    ) -> Self {
        let mut run = Self::new(parent.tenant_id, parent.agent_id.clone(), plan, created_at_ms);
        run.parent_run_id = Some(parent.id);
        run
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition to a terminal status. No-op target checks are the caller's
    /// responsibility (e.g. idempotent cancel of an already-terminal run);
    /// this only enforces that terminal runs never move again.
    pub fn transition_terminal(&mut self, status: RunStatus, at_ms: u64) -> Result<(), &'static str> {
        if self.is_terminal() {
            return Err("run already terminal");
        }
        if !status.is_terminal() {
            return Err("target status is not terminal");
        }
        self.status = status;
        self.completed_at_ms = Some(at_ms);
        Ok(())
    }

    pub fn start(&mut self, at_ms: u64) -> Result<(), &'static str> {
        if self.status != RunStatus::Queued {
            return Err("run not in queued state");
        }
        self.status = RunStatus::Running;
        self.started_at_ms = Some(at_ms);
        Ok(())
    }
}

crate::builder! {
    pub struct RunBuilder => Run {
        into {
            agent_id: String = "test-agent",
        }
        set {
            id: RunId = RunId::new(),
            tenant_id: TenantId = TenantId::new(),
            plan: Vec<StepDescriptor> = Vec::new(),
            status: RunStatus = RunStatus::Queued,
            created_at_ms: u64 = 1_000_000,
            started_at_ms: Option<u64> = None,
            completed_at_ms: Option<u64> = None,
            parent_run_id: Option<RunId> = None,
            submission_idempotency_key: Option<String> = None,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
