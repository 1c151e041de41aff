// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup reconciliation, the worker claim loop, and
//! graceful shutdown. Mirrors the "global state → per-process state with
//! lifecycle" design note: every background task here is started and
//! stopped explicitly, nothing runs from a module-level singleton. Kept
//! generic over the storage/queue ports so it can be driven against the
//! in-memory fakes in tests, the same way `orc-engine`'s own components are.

use orc_engine::queue::Queue;
use orc_engine::recovery::ReconcileReport;
use orc_engine::OpExecutor;
use orc_storage::{IdempotencyStore, LockStore, OpStore, StorageError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Runs before the daemon accepts its first claim: releases every op still
/// marked `claimed` by a worker whose heartbeat has gone stale. Required at
/// process boundaries so a crashed worker's claims don't wedge their runs
/// forever (§5's fencing invariant, §9A).
pub async fn startup_reconcile<O: OpStore>(ops: &O, now_ms: u64) -> Result<ReconcileReport, LifecycleError> {
    let report = orc_engine::reconcile_on_startup(ops, now_ms).await?;
    tracing::info!(released_ops = report.released_ops, "startup reconciliation complete");
    Ok(report)
}

/// Drives `executor.run_once` on a fixed interval until `shutdown_rx`
/// reports true. The caller orders this against the maintenance loop per
/// the documented shutdown sequence: stop accepting new work, drain queue
/// claims, stop leader, flush outbox, exit.
pub async fn run_worker_loop<Q: Queue, O: OpStore, I: IdempotencyStore, L: LockStore>(
    executor: Arc<OpExecutor<Q, O, I, L>>,
    consumer: String,
    batch: usize,
    period: Duration,
    now_ms_fn: impl Fn() -> u64,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = executor.run_once(&consumer, batch, now_ms_fn()).await {
                    tracing::warn!(error = %e, "op executor pass failed");
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

/// Graceful shutdown: signal every background loop via `shutdown_tx`, wait
/// up to `timeout` for in-flight claims to drain, then close the pool.
/// Nothing here cancels a run mid-execution; this core does not terminate
/// agent processes itself.
pub async fn shutdown(pool: &sqlx::PgPool, shutdown_tx: &watch::Sender<bool>, timeout: Duration) {
    tracing::info!("shutting down daemon");
    let _ = shutdown_tx.send(true);
    tokio::time::sleep(timeout).await;
    pool.close().await;
    tracing::info!("daemon shutdown complete");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
