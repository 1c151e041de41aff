// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture wiring admission, execution, and the
//! `OrchestratorService` surface onto one set of in-memory stores, so a
//! run submitted through `support.engine` is the same run
//! `support.executor` claims and drives.

use std::sync::Arc;

use orc_adapters::{FakeSkillAdapter, SkillRegistry};
use orc_broker::{FakeBroker, HealthTracker};
use orc_core::{FakeClock, StepDescriptor, WorkerId};
use orc_engine::{
    BudgetTracker, CircuitBreakerRegistry, FailureCatalog, LearnedModel, OpExecutor, OpExecutorConfig, OrchestratorEngine, RecoveryPipeline,
    RunAdmission, SkillRuntime, TwoLaneQueue,
};
use orc_storage::{
    FakeAuditStore, FakeCandidateStore, FakeDeadLetterStore, FakeFallbackQueueStore, FakeIdempotencyStore, FakeLockStore, FakeOpStore,
    FakeOutboxStore, FakeReplayStore, FakeRunStore, FakeTenantPolicyStore, AuditStore, FallbackQueueStore, LockStore, ReplayStore,
};

pub type TestQueue = TwoLaneQueue<FakeBroker, FakeFallbackQueueStore, FakeOpStore>;
pub type TestEngine =
    OrchestratorEngine<FakeRunStore, FakeOpStore, TestQueue, FakeIdempotencyStore, FakeDeadLetterStore, FakeCandidateStore, FakeClock>;
pub type TestExecutor = OpExecutor<TestQueue, FakeOpStore, FakeIdempotencyStore, FakeLockStore>;

/// Skill name every scenario's probe adapter is registered under.
pub const PROBE_SKILL: &str = "probe.invoke";
/// Second registered skill, used as the target of a route-to-alt-skill
/// recovery action.
pub const ALT_SKILL: &str = "probe.invoke.v2";

pub struct Support {
    pub engine: TestEngine,
    pub executor: TestExecutor,
    pub queue: Arc<TestQueue>,
    pub runs: Arc<FakeRunStore>,
    pub ops: Arc<FakeOpStore>,
    pub dead_letters: Arc<FakeDeadLetterStore>,
    pub candidates: Arc<FakeCandidateStore>,
    pub outbox: Arc<FakeOutboxStore>,
    pub idempotency: Arc<FakeIdempotencyStore>,
    pub tenant_policies: Arc<FakeTenantPolicyStore>,
    pub health: Arc<HealthTracker>,
    pub fallback: Arc<FakeFallbackQueueStore>,
    pub replay: Arc<dyn ReplayStore>,
    pub adapter: FakeSkillAdapter,
    pub alt_adapter: FakeSkillAdapter,
    pub clock: FakeClock,
}

pub fn plan_with(skill: &str, params: serde_json::Value) -> Vec<StepDescriptor> {
    vec![StepDescriptor { skill: skill.to_string(), params }]
}

pub fn build() -> Support {
    build_with_catalog(FailureCatalog::empty())
}

pub fn build_with_catalog(catalog: FailureCatalog) -> Support {
    let runs = Arc::new(FakeRunStore::new());
    let ops = Arc::new(FakeOpStore::new());
    let dead_letters = Arc::new(FakeDeadLetterStore::new());
    let candidates = Arc::new(FakeCandidateStore::new());
    let idempotency = Arc::new(FakeIdempotencyStore::new());
    let outbox = Arc::new(FakeOutboxStore::new());
    let tenant_policies = Arc::new(FakeTenantPolicyStore::new());
    let locks = Arc::new(FakeLockStore::new());
    let audit: Arc<dyn AuditStore> = Arc::new(FakeAuditStore::new());
    let replay: Arc<dyn ReplayStore> = Arc::new(FakeReplayStore::new());

    let health = Arc::new(HealthTracker::new(20, 0.5));
    let fallback = Arc::new(FakeFallbackQueueStore::new());
    let queue = Arc::new(TwoLaneQueue::new(Arc::new(FakeBroker::new()), fallback.clone(), ops.clone(), health.clone(), "workers"));

    let adapter = FakeSkillAdapter::new();
    let alt_adapter = FakeSkillAdapter::new();
    let mut registry = SkillRegistry::new();
    registry.register(PROBE_SKILL, Arc::new(adapter.clone()));
    registry.register(ALT_SKILL, Arc::new(alt_adapter.clone()));
    let skills = Arc::new(registry);

    let recovery =
        RecoveryPipeline::new(candidates.clone(), dead_letters.clone(), runs.clone(), ops.clone(), queue.clone(), catalog, LearnedModel::default());
    let admission = RunAdmission::new(runs.clone(), ops.clone(), queue.clone(), idempotency.clone(), None);
    let clock = FakeClock::new();
    let locks_dyn: Arc<dyn LockStore> = locks.clone();

    let engine = OrchestratorEngine::new(
        admission,
        runs.clone(),
        ops.clone(),
        dead_letters.clone(),
        candidates.clone(),
        recovery,
        skills.clone(),
        clock.clone(),
        locks_dyn,
        audit.clone(),
        replay.clone(),
        tenant_policies.clone(),
    );

    let runtime = Arc::new(SkillRuntime::new(idempotency.clone(), Arc::new(CircuitBreakerRegistry::default()), Arc::new(BudgetTracker::new())));
    let config =
        OpExecutorConfig { worker_id: WorkerId::from_string("w-probe"), lease_ms: 30_000, deadline_ms: 5_000, budget_max: 100.0, max_attempts: 5 };

    let executor = OpExecutor::new(
        queue.clone(),
        ops.clone(),
        runs.clone(),
        locks,
        skills,
        runtime,
        dead_letters.clone(),
        outbox.clone(),
        replay.clone(),
        audit,
        config,
    );

    Support {
        engine,
        executor,
        queue,
        runs,
        ops,
        dead_letters,
        candidates,
        outbox,
        idempotency,
        tenant_policies,
        health,
        fallback,
        replay,
        adapter,
        alt_adapter,
        clock,
    }
}
