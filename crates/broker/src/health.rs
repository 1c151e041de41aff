// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rolling failure-rate tracker. Same ring-buffer shape is reused by the
//! skill runtime's circuit breaker; kept here as the broker's own copy since
//! the two track unrelated populations of calls.

use parking_lot::Mutex;
use std::collections::VecDeque;

pub struct HealthTracker {
    window: Mutex<VecDeque<bool>>,
    capacity: usize,
    threshold: f64,
}

impl HealthTracker {
    pub fn new(capacity: usize, threshold: f64) -> Self {
        Self { window: Mutex::new(VecDeque::with_capacity(capacity)), capacity, threshold }
    }

    pub fn record(&self, ok: bool) {
        let mut window = self.window.lock();
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(ok);
    }

    /// True once enough samples exist and the failure rate crosses threshold.
    pub fn is_unhealthy(&self) -> bool {
        let window = self.window.lock();
        if window.len() < self.capacity / 2 {
            return false;
        }
        let failures = window.iter().filter(|ok| !*ok).count();
        (failures as f64 / window.len() as f64) >= self.threshold
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(20, 0.5)
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
