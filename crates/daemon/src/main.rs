// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orcd`: the orchestrator daemon binary. Loads config, connects every
//! storage/broker port, runs startup reconciliation, then drives the op
//! executor and maintenance loops until a shutdown signal arrives.

use orc_core::Clock;
use orc_daemon::{lifecycle, Config, Services};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(orc_daemon::env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    tracing::info!(worker_id = %config.worker_id, "starting orcd");

    let services = Services::connect(&config).await?;

    let now_ms = services.clock.epoch_ms();
    lifecycle::startup_reconcile(&*services.ops, now_ms).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let clock = services.clock.clone();
    let worker_handle = tokio::spawn(lifecycle::run_worker_loop(
        services.executor.clone(),
        config.worker_id.clone(),
        config.claim_batch,
        std::time::Duration::from_millis(250),
        move || clock.epoch_ms(),
        shutdown_rx.clone(),
    ));

    let maintenance = services.maintenance.clone();
    let maintenance_clock = services.clock.clone();
    let maintenance_handle = tokio::spawn(maintenance.run_forever(
        std::time::Duration::from_millis(config.maintenance_period_ms),
        move || maintenance_clock.epoch_ms(),
        shutdown_rx.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    lifecycle::shutdown(&services.pool, &shutdown_tx, orc_daemon::env::drain_timeout()).await;

    let _ = worker_handle.await;
    let _ = maintenance_handle.await;
    Ok(())
}
