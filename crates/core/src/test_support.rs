// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::id::{RunId, TenantId};
use crate::run::{Run, StepDescriptor};

/// Proptest strategies for core state machine types.
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::op::OpStatus;
    use crate::run::RunStatus;
    use crate::taxonomy::FailureKind;
    use proptest::prelude::*;

    pub fn arb_run_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![
            Just(RunStatus::Queued),
            Just(RunStatus::Running),
            Just(RunStatus::Succeeded),
            Just(RunStatus::Failed),
            Just(RunStatus::Cancelled),
            Just(RunStatus::Crashed),
        ]
    }

    pub fn arb_op_status() -> impl Strategy<Value = OpStatus> {
        prop_oneof![
            Just(OpStatus::Pending),
            Just(OpStatus::Claimed),
            Just(OpStatus::Succeeded),
            Just(OpStatus::Failed),
            Just(OpStatus::Dead),
        ]
    }

    pub fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
        prop_oneof![
            Just(FailureKind::Transient),
            Just(FailureKind::RateLimited),
            Just(FailureKind::Deadline),
            Just(FailureKind::CircuitOpen),
            Just(FailureKind::BudgetExceeded),
            Just(FailureKind::SchemaMismatch),
            Just(FailureKind::ParamMismatch),
            Just(FailureKind::NotFound),
            Just(FailureKind::Forbidden),
            Just(FailureKind::UpstreamBug),
            Just(FailureKind::InternalInvariant),
        ]
    }
}

/// A one-step `kv.set` plan, used throughout engine/daemon tests where the
/// exact skill doesn't matter.
pub fn simple_plan(skill: &str) -> Vec<StepDescriptor> {
    vec![StepDescriptor {
        skill: skill.to_string(),
        params: serde_json::json!({}),
    }]
}

pub fn test_run(tenant: TenantId, agent_id: &str) -> Run {
    Run::new(tenant, agent_id, simple_plan("kv.set"), 1_000_000)
}

pub fn test_run_id() -> RunId {
    RunId::new()
}
