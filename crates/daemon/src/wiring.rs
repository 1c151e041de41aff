// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root: turns a `Config` into the concrete set of running
//! components. No global statics; everything here is constructed once at
//! startup and handed around by `Arc`.

use crate::audit::TracingAuditStore;
use crate::config::Config;
use crate::http_delivery::HttpDeliveryAdapter;
use orc_adapters::{SkillRegistry, WebhookSkill};
use orc_broker::{HealthTracker, RedisBroker};
use orc_core::SystemClock;
use orc_engine::recovery::FailureCatalog;
use orc_engine::{
    BudgetTracker, CircuitBreakerRegistry, LearnedModel, MaintenanceOrchestrator, OpExecutor, OpExecutorConfig, OrchestratorEngine,
    OutboxProcessor, Queue, RecoveryPipeline, RunAdmission, SkillRuntime, TwoLaneQueue,
};
use orc_storage::{
    AuditStore, PgCandidateStore, PgDeadLetterStore, PgFallbackQueueStore, PgIdempotencyStore, PgLockStore, PgOpStore, PgOutboxStore,
    PgRunStore, PgTenantPolicyStore,
};
use orc_wire::OrchestratorService;
use std::sync::Arc;
use thiserror::Error;

pub type ProdQueue = TwoLaneQueue<RedisBroker, PgFallbackQueueStore, PgOpStore>;
pub type ProdEngine = OrchestratorEngine<PgRunStore, PgOpStore, ProdQueue, PgIdempotencyStore, PgDeadLetterStore, PgCandidateStore, SystemClock>;
pub type ProdExecutor = OpExecutor<ProdQueue, PgOpStore, PgIdempotencyStore, PgLockStore>;
pub type ProdMaintenance = MaintenanceOrchestrator<PgOutboxStore, PgDeadLetterStore, PgIdempotencyStore, PgLockStore, HttpDeliveryAdapter>;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("broker connection failed: {0}")]
    Broker(#[from] orc_broker::BrokerError),
    #[error("failed to load failure catalog {path}: {source}")]
    Catalog { path: String, source: orc_engine::recovery::CatalogError },
    #[error("failed to read catalog file {path}: {source}")]
    CatalogRead { path: String, source: std::io::Error },
}

/// Every long-lived component the daemon binary (and the CLI, for the
/// operations it drives directly) needs. Clock is fixed to `SystemClock`;
/// tests swap in their own fakes against the engine crate directly rather
/// than through this struct.
pub struct Services {
    pub pool: sqlx::PgPool,
    pub queue: Arc<ProdQueue>,
    pub ops: Arc<PgOpStore>,
    pub runs: Arc<PgRunStore>,
    pub dead_letters: Arc<PgDeadLetterStore>,
    pub candidates: Arc<PgCandidateStore>,
    pub locks: Arc<PgLockStore>,
    pub idempotency: Arc<PgIdempotencyStore>,
    pub outbox: Arc<PgOutboxStore>,
    pub audit: Arc<dyn AuditStore>,
    pub tenant_policies: Arc<PgTenantPolicyStore>,
    pub skills: Arc<SkillRegistry>,
    pub engine: Arc<ProdEngine>,
    pub executor: Arc<ProdExecutor>,
    pub maintenance: Arc<ProdMaintenance>,
    pub clock: SystemClock,
}

impl Services {
    pub async fn connect(config: &Config) -> Result<Self, WiringError> {
        let pool = sqlx::postgres::PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;

        let runs = Arc::new(PgRunStore::new(pool.clone()));
        let ops = Arc::new(PgOpStore::new(pool.clone()));
        let dead_letters = Arc::new(PgDeadLetterStore::new(pool.clone()));
        let candidates = Arc::new(PgCandidateStore::new(pool.clone()));
        let locks = Arc::new(PgLockStore::new(pool.clone()));
        let idempotency = Arc::new(PgIdempotencyStore::new(pool.clone()));
        let outbox = Arc::new(PgOutboxStore::new(pool.clone()));
        let fallback = Arc::new(PgFallbackQueueStore::new(pool.clone()));
        let tenant_policies = Arc::new(PgTenantPolicyStore::new(pool.clone()));
        let audit: Arc<dyn AuditStore> = Arc::new(TracingAuditStore::new(Arc::new(orc_storage::PgAuditStore::new(pool.clone()))));
        let replay: Arc<dyn orc_storage::ReplayStore> = Arc::new(orc_storage::PgReplayStore::new(pool.clone()));

        let broker = Arc::new(RedisBroker::new(&config.broker_url)?);
        let health = Arc::new(HealthTracker::new(20, 0.5));
        let queue = Arc::new(TwoLaneQueue::new(broker, fallback, ops.clone(), health, "workers"));

        let catalog = load_catalog(config)?;

        let mut registry = SkillRegistry::new();
        registry.register("webhook", Arc::new(WebhookSkill));
        let skills = Arc::new(registry);

        let runtime = Arc::new(SkillRuntime::new(idempotency.clone(), Arc::new(CircuitBreakerRegistry::default()), Arc::new(BudgetTracker::new())));
        let executor_config = OpExecutorConfig {
            worker_id: orc_core::WorkerId::from_string(&config.worker_id),
            lease_ms: config.lock_lease_ms,
            deadline_ms: config.op_deadline_ms,
            budget_max: config.budget_max,
            max_attempts: config.max_attempts,
        };
        let executor = Arc::new(OpExecutor::new(
            queue.clone(),
            ops.clone(),
            runs.clone() as Arc<dyn orc_storage::RunStore>,
            locks.clone(),
            skills.clone(),
            runtime,
            dead_letters.clone() as Arc<dyn orc_storage::DeadLetterStore>,
            outbox.clone() as Arc<dyn orc_storage::OutboxStore>,
            replay.clone(),
            audit.clone(),
            executor_config,
        ));

        let admission = RunAdmission::new(runs.clone(), ops.clone(), queue.clone(), idempotency.clone(), None);
        let recovery = RecoveryPipeline::new(
            candidates.clone(),
            dead_letters.clone(),
            runs.clone(),
            ops.clone(),
            queue.clone(),
            catalog.clone(),
            LearnedModel::default(),
        );
        let engine = Arc::new(OrchestratorEngine::new(
            admission,
            runs.clone(),
            ops.clone(),
            dead_letters.clone(),
            candidates.clone(),
            recovery,
            skills.clone(),
            SystemClock,
            locks.clone() as Arc<dyn orc_storage::LockStore>,
            audit.clone(),
            replay,
            tenant_policies.clone() as Arc<dyn orc_storage::TenantPolicyStore>,
        ));

        let delivery = Arc::new(HttpDeliveryAdapter::new());
        let outbox_processor = Arc::new(OutboxProcessor::new(
            outbox.clone(),
            dead_letters.clone(),
            delivery,
            Arc::new(CircuitBreakerRegistry::default()),
            config.max_attempts,
        ));
        let maintenance = Arc::new(
            MaintenanceOrchestrator::new(
                outbox_processor,
                dead_letters.clone(),
                idempotency.clone(),
                locks.clone(),
                catalog,
                config.worker_id.clone(),
                config.lock_lease_ms,
                config.retention_ms,
                config.outbox_batch,
            )
                .with_queue_reconciliation(queue.clone() as Arc<dyn Queue>, config.claim_batch),
        );

        Ok(Self {
            pool,
            queue,
            ops,
            runs,
            dead_letters,
            candidates,
            locks,
            idempotency,
            outbox,
            audit,
            tenant_policies,
            skills,
            engine,
            executor,
            maintenance,
            clock: SystemClock,
        })
    }

    pub fn as_service(&self) -> Arc<dyn OrchestratorService> {
        self.engine.clone()
    }
}

fn load_catalog(config: &Config) -> Result<FailureCatalog, WiringError> {
    match &config.catalog_path {
        None => Ok(FailureCatalog::empty()),
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| WiringError::CatalogRead { path: path.clone(), source })?;
            FailureCatalog::from_toml_str(&raw).map_err(|source| WiringError::Catalog { path: path.clone(), source })
        }
    }
}
