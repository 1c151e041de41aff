// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-core: domain types for the durable execution core. No I/O lives here —
//! entities, state machines, canonicalization, and the failure taxonomy only.

pub mod macros;

pub mod canon;
pub mod clock;
pub mod deadletter;
pub mod id;
pub mod idempotency;
pub mod lock;
pub mod op;
pub mod outbox;
pub mod recovery;
pub mod replay;
pub mod run;
pub mod taxonomy;
pub mod tenant;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use canon::{canonical_json, fingerprint, result_hash, strip_insignificant, Fingerprint};
pub use clock::{Clock, FakeClock, SystemClock};
pub use deadletter::DeadLetterEntry;
#[cfg(any(test, feature = "test-support"))]
pub use deadletter::DeadLetterEntryBuilder;
pub use id::{CandidateId, DeadLetterId, OutboxEntryId, RunId, TenantId, WorkerId};
pub use idempotency::{ClaimOutcome, IdempotencyRecord, IdempotencyStatus, Owner, ReplayOutcome};
pub use lock::{FencingToken, LockClass, LockRecord};
pub use op::{OpId, OpStatus, Operation};
#[cfg(any(test, feature = "test-support"))]
pub use op::OperationBuilder;
pub use outbox::{OutboxEntry, OutboxStatus};
#[cfg(any(test, feature = "test-support"))]
pub use outbox::OutboxEntryBuilder;
pub use recovery::{CandidateSource, CandidateStatus, RecoveryAction, RecoveryCandidate};
#[cfg(any(test, feature = "test-support"))]
pub use recovery::RecoveryCandidateBuilder;
pub use replay::{ReplayLogEntry, ReplayReport, ReplayVerdict};
pub use run::{Run, RunStatus, StepDescriptor};
#[cfg(any(test, feature = "test-support"))]
pub use run::RunBuilder;
pub use taxonomy::FailureKind;
pub use tenant::{ApprovalMode, TenantPolicy};
