// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The open set of skills keyed by name. A registered skill is the unit of
//! work the runtime executes under budget/deadline/circuit-breaker guards
//! (`engine::skill_runtime`); this module only holds the adapter trait, the
//! registry, and the handful of skills this core ships itself.

use crate::error::SkillError;
use crate::outcome::SkillOutcome;
use async_trait::async_trait;
use orc_core::FailureKind;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait SkillAdapter: Send + Sync + 'static {
    /// Invokes the skill body. Must never panic or return a raw error —
    /// anything that goes wrong is reported through `SkillOutcome::Failed`.
    /// The runtime still wraps this call in `catch_unwind` as a backstop.
    async fn invoke(&self, params: &Value, deadline: Duration) -> SkillOutcome;

    /// Whether this skill writes outbox entries as part of a successful run
    /// (used by the runtime to decide whether a result needs an outbox
    /// insert in the same commit).
    fn produces_outbox(&self) -> bool {
        false
    }
}

pub struct SkillRegistration {
    pub adapter: Arc<dyn SkillAdapter>,
    pub default_retryable: HashMap<&'static str, bool>,
}

#[derive(Default)]
pub struct SkillRegistry {
    skills: HashMap<String, SkillRegistration>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, adapter: Arc<dyn SkillAdapter>) {
        self.skills.insert(name.into(), SkillRegistration { adapter, default_retryable: HashMap::new() });
    }

    pub fn get(&self, name: &str) -> Result<&SkillRegistration, SkillError> {
        self.skills.get(name).ok_or_else(|| SkillError::UnknownSkill(name.to_string()))
    }
}

/// Round-trips params as the result. Produces no outbox entries; used to
/// exercise idempotency/replay without any external dependency.
pub struct EchoSkill;

#[async_trait]
impl SkillAdapter for EchoSkill {
    async fn invoke(&self, params: &Value, _deadline: Duration) -> SkillOutcome {
        SkillOutcome::ok(params.clone(), 0.0, 0)
    }
}

/// Does nothing and always succeeds with a null result. Used where a test
/// needs a skill but doesn't care about its output.
pub struct NoopSkill;

#[async_trait]
impl SkillAdapter for NoopSkill {
    async fn invoke(&self, _params: &Value, _deadline: Duration) -> SkillOutcome {
        SkillOutcome::ok(Value::Null, 0.0, 0)
    }
}

/// Produces exactly one outbox entry per invocation; exercises the C3/C4
/// seam end-to-end without a real HTTP dependency in tests.
pub struct WebhookSkill;

#[async_trait]
impl SkillAdapter for WebhookSkill {
    async fn invoke(&self, params: &Value, _deadline: Duration) -> SkillOutcome {
        match params.get("url") {
            Some(url) if url.is_string() => SkillOutcome::ok(serde_json::json!({"queued_for": url}), 0.0, 0),
            _ => SkillOutcome::failed(FailureKind::ParamMismatch, "missing url param", 1),
        }
    }

    fn produces_outbox(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "skill_tests.rs"]
mod tests;
