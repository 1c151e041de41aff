// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-storage: durable persistence ports for the execution core. Every
//! port is a trait with a Postgres-backed implementation and an in-memory
//! fake (behind `test-support`) so `orc-engine` can be tested without a
//! database.

pub mod error;

pub mod audit_store;
pub mod candidate_store;
pub mod deadletter_store;
pub mod fallback_queue_store;
pub mod idempotency_store;
pub mod lock_store;
pub mod op_store;
pub mod outbox_store;
pub mod replay_store;
pub mod run_store;
pub mod tenant_store;

pub use error::StorageError;

pub use audit_store::{AuditRecord, AuditStore, PgAuditStore};
pub use candidate_store::{CandidateStore, PgCandidateStore};
pub use deadletter_store::{DeadLetterStore, PgDeadLetterStore};
pub use fallback_queue_store::{FallbackQueueItem, FallbackQueueStore, PgFallbackQueueStore};
pub use idempotency_store::{IdempotencyStore, PgIdempotencyStore};
pub use lock_store::{LockStore, PgLockStore};
pub use op_store::{OpStore, PgOpStore};
pub use outbox_store::{OutboxStore, PgOutboxStore};
pub use replay_store::{PgReplayStore, ReplayStore};
pub use run_store::{PgRunStore, RunStore};
pub use tenant_store::{PgTenantPolicyStore, TenantPolicyStore};

#[cfg(any(test, feature = "test-support"))]
pub use audit_store::FakeAuditStore;
#[cfg(any(test, feature = "test-support"))]
pub use candidate_store::FakeCandidateStore;
#[cfg(any(test, feature = "test-support"))]
pub use deadletter_store::FakeDeadLetterStore;
#[cfg(any(test, feature = "test-support"))]
pub use fallback_queue_store::FakeFallbackQueueStore;
#[cfg(any(test, feature = "test-support"))]
pub use idempotency_store::FakeIdempotencyStore;
#[cfg(any(test, feature = "test-support"))]
pub use lock_store::FakeLockStore;
#[cfg(any(test, feature = "test-support"))]
pub use op_store::FakeOpStore;
#[cfg(any(test, feature = "test-support"))]
pub use outbox_store::FakeOutboxStore;
#[cfg(any(test, feature = "test-support"))]
pub use replay_store::FakeReplayStore;
#[cfg(any(test, feature = "test-support"))]
pub use run_store::FakeRunStore;
#[cfg(any(test, feature = "test-support"))]
pub use tenant_store::FakeTenantPolicyStore;
