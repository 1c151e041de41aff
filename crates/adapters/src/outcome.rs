// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The structured outcome every skill invocation returns. No panic or raw
//! error is ever allowed to escape `SkillAdapter::invoke` — the runtime
//! catches unwinds and maps them to `InternalInvariant` before this type is
//! constructed.

use orc_core::{FailureKind, Fingerprint};
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum SkillOutcome {
    Ok {
        result: Value,
        result_hash: Fingerprint,
        cost: f64,
        duration_ms: u64,
        cache_hit: bool,
    },
    Failed {
        kind: FailureKind,
        message: String,
        retryable: bool,
        attempt: u32,
        catalog_match: Option<String>,
    },
}

impl SkillOutcome {
    pub fn ok(result: Value, cost: f64, duration_ms: u64) -> Self {
        let result_hash = orc_core::result_hash(&orc_core::canonical_json(&result));
        Self::Ok { result, result_hash, cost, duration_ms, cache_hit: false }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>, attempt: u32) -> Self {
        let retryable = kind.default_retryable();
        Self::Failed { kind, message: message.into(), retryable, attempt, catalog_match: None }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
