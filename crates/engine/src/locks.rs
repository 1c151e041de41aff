// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug-only enforcement of the fixed lock acquisition order
//! `OutboxLeader < Run < IdempotencyRecord`. A guard records its class in
//! task-local state on construction and panics on drop-order violations
//! only in debug builds, never paying for the check on the hot path in
//! release.

use orc_core::LockClass;
use std::cell::RefCell;

tokio::task_local! {
    static HELD_CLASSES: RefCell<Vec<LockClass>>;
}

/// RAII guard recording that `class` is held for the lifetime of the guard.
/// Must be constructed inside a `HELD_CLASSES.scope(...)` block (set up once
/// per worker task); outside of one it's a no-op.
pub struct LockOrderGuard {
    #[cfg(debug_assertions)]
    class: LockClass,
}

#[cfg(debug_assertions)]
impl LockOrderGuard {
    pub fn acquire(class: LockClass) -> Self {
        let _ = HELD_CLASSES.try_with(|held| {
            let mut held = held.borrow_mut();
            if let Some(&highest) = held.iter().min() {
                assert!(
                    class >= highest,
                    "lock order violation: attempted to acquire {class:?} while holding {highest:?}"
                );
            }
            held.push(class);
        });
        Self { class }
    }
}

#[cfg(not(debug_assertions))]
impl LockOrderGuard {
    pub fn acquire(_class: LockClass) -> Self {
        Self {}
    }
}

#[cfg(debug_assertions)]
impl Drop for LockOrderGuard {
    fn drop(&mut self) {
        let _ = HELD_CLASSES.try_with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().position(|c| *c == self.class) {
                held.remove(pos);
            }
        });
    }
}

/// Runs `f` inside a scope where `LockOrderGuard` tracking is active.
pub async fn with_lock_order_tracking<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    HELD_CLASSES.scope(RefCell::new(Vec::new()), f).await
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
