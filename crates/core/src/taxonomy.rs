// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed failure taxonomy every component reports against.

use serde::{Deserialize, Serialize};

/// The closed set of failure kinds a skill, the queue, or the outbox can
/// report. New kinds are not added lightly: the dead-letter catalog, the
/// circuit breaker, and the CLI's exit-code mapping all switch over this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    Transient,
    RateLimited,
    Deadline,
    CircuitOpen,
    BudgetExceeded,
    SchemaMismatch,
    ParamMismatch,
    NotFound,
    Forbidden,
    UpstreamBug,
    InternalInvariant,
}

impl FailureKind {
    /// Default retryability, overridable per the failure catalog.
    pub fn default_retryable(&self) -> bool {
        match self {
            FailureKind::Transient => true,
            FailureKind::RateLimited => true,
            FailureKind::Deadline => true,
            FailureKind::CircuitOpen => true,
            FailureKind::BudgetExceeded => false,
            FailureKind::SchemaMismatch => false,
            FailureKind::ParamMismatch => false,
            FailureKind::NotFound => false,
            FailureKind::Forbidden => false,
            FailureKind::UpstreamBug => true,
            FailureKind::InternalInvariant => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transient => "transient",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Deadline => "deadline",
            FailureKind::CircuitOpen => "circuit_open",
            FailureKind::BudgetExceeded => "budget_exceeded",
            FailureKind::SchemaMismatch => "schema_mismatch",
            FailureKind::ParamMismatch => "param_mismatch",
            FailureKind::NotFound => "not_found",
            FailureKind::Forbidden => "forbidden",
            FailureKind::UpstreamBug => "upstream_bug",
            FailureKind::InternalInvariant => "internal_invariant",
        }
    }
}

crate::simple_display! {
    FailureKind {
        Transient => "transient",
        RateLimited => "rate_limited",
        Deadline => "deadline",
        CircuitOpen => "circuit_open",
        BudgetExceeded => "budget_exceeded",
        SchemaMismatch => "schema_mismatch",
        ParamMismatch => "param_mismatch",
        NotFound => "not_found",
        Forbidden => "forbidden",
        UpstreamBug => "upstream_bug",
        InternalInvariant => "internal_invariant",
    }
}

#[cfg(test)]
#[path = "taxonomy_tests.rs"]
mod tests;
