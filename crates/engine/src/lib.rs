// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-engine: the durable execution core. Wires the domain types
//! (`orc-core`) and persistence ports (`orc-storage`) into the running
//! system — admission, the queue, the op execution loop, skill runtime,
//! recovery pipeline, maintenance, and the `OrchestratorService` impl.

pub mod admission;
pub mod backoff;
pub mod budget;
pub mod circuit_breaker;
pub mod error;
pub mod locks;
pub mod maintenance;
pub mod outbox;
pub mod queue;
pub mod recovery;
pub mod service;
pub mod skill_runtime;
pub mod worker;

pub use admission::RunAdmission;
pub use budget::BudgetTracker;
pub use circuit_breaker::CircuitBreakerRegistry;
pub use error::EngineError;
pub use locks::{with_lock_order_tracking, LockOrderGuard};
pub use maintenance::{MaintenanceOrchestrator, MaintenanceReport};
pub use outbox::{DeliveryAdapter, DeliveryResult, OutboxProcessor};
pub use queue::{LaneToken, Queue, QueuedOp, TwoLaneQueue};
pub use recovery::{reconcile_on_startup, FailureCatalog, LearnedModel, ReconcileReport, RecoveryPipeline};
pub use service::OrchestratorEngine;
pub use skill_runtime::{SkillInvocation, SkillRuntime};
pub use worker::{OpExecutor, OpExecutorConfig};
