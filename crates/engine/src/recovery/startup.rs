// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup reconciliation (§5's fencing invariant at process boundaries).
//! Run before a daemon accepts its first claim after a restart.

use orc_storage::{OpStore, StorageError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub released_ops: u64,
}

/// Releases every op still marked `claimed` by a worker whose lock lease
/// expired before `before_ms`, putting them back to `pending` so the
/// normal queue claim path picks them up again. Mirrors "resume workers
/// after restart" for lock leases instead of live processes.
pub async fn reconcile_on_startup<O: OpStore>(ops: &O, before_ms: u64) -> Result<ReconcileReport, StorageError> {
    let released_ops = ops.release_orphaned(before_ms).await?;
    Ok(ReconcileReport { released_ops })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
