// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbox Processor (C4): drains the durable outbox on the leader replica
//! only, preserving FIFO per (run, target) via a keyed in-memory mutex.

use crate::backoff::compute_backoff_ms;
use crate::circuit_breaker::CircuitBreakerRegistry;
use async_trait::async_trait;
use dashmap::DashMap;
use orc_core::{DeadLetterEntry, FailureKind, OutboxEntry};
use orc_storage::{DeadLetterStore, OutboxStore};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Retryable,
    Permanent,
}

/// One delivery target (slack, webhook, email, ...). Registered targets
/// live outside this crate; this port only describes what the processor
/// needs from one.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync + 'static {
    async fn deliver(&self, target: &str, payload: &[u8], idempotency_key: &str) -> DeliveryResult;
}

pub struct OutboxProcessor<O: OutboxStore, D: DeadLetterStore, A: DeliveryAdapter> {
    outbox: Arc<O>,
    dead_letters: Arc<D>,
    delivery: Arc<A>,
    breakers: Arc<CircuitBreakerRegistry>,
    per_target_locks: DashMap<(orc_core::RunId, String), Arc<AsyncMutex<()>>>,
    max_attempts: u32,
}

impl<O: OutboxStore, D: DeadLetterStore, A: DeliveryAdapter> OutboxProcessor<O, D, A> {
    pub fn new(outbox: Arc<O>, dead_letters: Arc<D>, delivery: Arc<A>, breakers: Arc<CircuitBreakerRegistry>, max_attempts: u32) -> Self {
        Self { outbox, dead_letters, delivery, breakers, per_target_locks: DashMap::new(), max_attempts }
    }

    fn lock_for(&self, entry: &OutboxEntry) -> Arc<AsyncMutex<()>> {
        self.per_target_locks
            .entry((entry.run_id(), entry.target.clone()))
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Runs one drain pass: claim a batch, deliver each respecting
    /// per-(run, target) ordering, and archive terminal failures.
    pub async fn drain_once(&self, max: usize, now_ms: u64) -> Result<usize, orc_storage::StorageError> {
        let batch = self.outbox.claim_batch(max, now_ms).await?;
        let mut delivered = 0;

        for entry in batch {
            let lock = self.lock_for(&entry);
            let _guard = lock.lock().await;

            if !self.breakers.allow(&entry.target, &entry.target, now_ms) {
                self.outbox.mark_retry(entry.id, now_ms + 1_000, "circuit open").await?;
                continue;
            }

            let result = self.delivery.deliver(&entry.target, &entry.payload, &entry.downstream_idempotency_key).await;
            self.breakers.record(&entry.target, &entry.target, result != DeliveryResult::Permanent, now_ms);

            match result {
                DeliveryResult::Delivered => {
                    self.outbox.mark_delivered(entry.id).await?;
                    delivered += 1;
                }
                DeliveryResult::Retryable if entry.attempt + 1 < self.max_attempts => {
                    let delay = compute_backoff_ms(entry.run_id(), entry.attempt + 1);
                    self.outbox.mark_retry(entry.id, now_ms + delay, "retryable delivery error").await?;
                }
                DeliveryResult::Retryable | DeliveryResult::Permanent => {
                    self.outbox.mark_failed(entry.id, "delivery exhausted or permanent error").await?;
                    let dl = DeadLetterEntry::new(
                        entry.op_id,
                        entry.target.clone(),
                        entry.payload.clone(),
                        FailureKind::UpstreamBug,
                        "outbox delivery failed",
                        entry.attempt + 1,
                        now_ms,
                        true,
                    );
                    self.dead_letters.archive(&dl).await?;
                }
            }
        }

        Ok(delivered)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeDeliveryAdapter {
        scripted: Mutex<Vec<DeliveryResult>>,
    }

    impl FakeDeliveryAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, result: DeliveryResult) {
            self.scripted.lock().push(result);
        }
    }

    #[async_trait]
    impl DeliveryAdapter for FakeDeliveryAdapter {
        async fn deliver(&self, _target: &str, _payload: &[u8], _idempotency_key: &str) -> DeliveryResult {
            let mut scripted = self.scripted.lock();
            if scripted.is_empty() {
                DeliveryResult::Delivered
            } else {
                scripted.remove(0)
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDeliveryAdapter;

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
