// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per (skill, downstream target) circuit breaker. Same ring-buffer shape
//! as `orc_broker::HealthTracker`, kept separate because it tracks skill
//! outcomes rather than broker connectivity and carries its own
//! open/half-open state machine.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Breaker {
    window: VecDeque<bool>,
    capacity: usize,
    threshold: f64,
    state: CircuitState,
    opened_at_ms: u64,
    cooldown_ms: u64,
}

impl Breaker {
    fn new(capacity: usize, threshold: f64, cooldown_ms: u64) -> Self {
        Self { window: VecDeque::with_capacity(capacity), capacity, threshold, state: CircuitState::Closed, opened_at_ms: 0, cooldown_ms }
    }

    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|ok| !*ok).count();
        failures as f64 / self.window.len() as f64
    }

    fn record(&mut self, ok: bool, now_ms: u64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(ok);

        match self.state {
            CircuitState::HalfOpen if ok => {
                self.state = CircuitState::Closed;
                self.window.clear();
            }
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at_ms = now_ms;
            }
            _ if self.window.len() >= self.capacity / 2 && self.failure_rate() >= self.threshold => {
                self.state = CircuitState::Open;
                self.opened_at_ms = now_ms;
            }
            _ => {}
        }
    }

    fn allow(&mut self, now_ms: u64) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                if now_ms.saturating_sub(self.opened_at_ms) >= self.cooldown_ms {
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Registry of circuit breakers keyed by `(skill, target)`. Shared process-
/// wide within a worker so every skill invocation for the same downstream
/// observes the same state.
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<(String, String), Breaker>>,
    capacity: usize,
    threshold: f64,
    cooldown_ms: u64,
}

impl CircuitBreakerRegistry {
    pub fn new(capacity: usize, threshold: f64, cooldown_ms: u64) -> Self {
        Self { breakers: Mutex::new(HashMap::new()), capacity, threshold, cooldown_ms }
    }

    pub fn shared(capacity: usize, threshold: f64, cooldown_ms: u64) -> Arc<Self> {
        Arc::new(Self::new(capacity, threshold, cooldown_ms))
    }

    pub fn allow(&self, skill: &str, target: &str, now_ms: u64) -> bool {
        let mut breakers = self.breakers.lock();
        let breaker = breakers
            .entry((skill.to_string(), target.to_string()))
            .or_insert_with(|| Breaker::new(self.capacity, self.threshold, self.cooldown_ms));
        breaker.allow(now_ms)
    }

    pub fn record(&self, skill: &str, target: &str, ok: bool, now_ms: u64) {
        let mut breakers = self.breakers.lock();
        let breaker = breakers
            .entry((skill.to_string(), target.to_string()))
            .or_insert_with(|| Breaker::new(self.capacity, self.threshold, self.cooldown_ms));
        breaker.record(ok, now_ms);
    }

    pub fn state(&self, skill: &str, target: &str) -> CircuitState {
        self.breakers
            .lock()
            .get(&(skill.to_string(), target.to_string()))
            .map(|b| b.state)
            .unwrap_or(CircuitState::Closed)
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(20, 0.5, 30_000)
    }
}

#[cfg(test)]
#[path = "circuit_breaker_tests.rs"]
mod tests;
