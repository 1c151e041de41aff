// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable skill adapter for engine-level tests: queue up outcomes ahead
//! of time and play them back in order, recording every invocation.

use crate::outcome::SkillOutcome;
use crate::skill::SkillAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct FakeSkillAdapter {
    inner: Arc<Mutex<FakeState>>,
}

struct FakeState {
    queued: Vec<SkillOutcome>,
    calls: Vec<Value>,
    produces_outbox: bool,
}

impl Default for FakeSkillAdapter {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(FakeState { queued: Vec::new(), calls: Vec::new(), produces_outbox: false })) }
    }
}

impl FakeSkillAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outbox(self) -> Self {
        self.inner.lock().produces_outbox = true;
        self
    }

    /// Outcomes are returned in the order pushed; once exhausted, invoke
    /// panics so a test never silently runs more calls than it scripted.
    pub fn push(&self, outcome: SkillOutcome) {
        self.inner.lock().queued.push(outcome);
    }

    pub fn calls(&self) -> Vec<Value> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl SkillAdapter for FakeSkillAdapter {
    async fn invoke(&self, params: &Value, _deadline: Duration) -> SkillOutcome {
        let mut state = self.inner.lock();
        state.calls.push(params.clone());
        if state.queued.is_empty() {
            panic!("FakeSkillAdapter invoked with no queued outcome");
        }
        state.queued.remove(0)
    }

    fn produces_outbox(&self) -> bool {
        self.inner.lock().produces_outbox
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
