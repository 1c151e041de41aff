// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc maintenance run`: force one pass of the leader-gated maintenance
//! loop (outbox drain, dead-letter reconciliation, retention cleanup, lock
//! GC, fallback-queue reconciliation) outside its normal timer.

use crate::exit_error::EXIT_REGRESSION;
use crate::output::{print_json, OutputFormat};
use anyhow::Context;
use clap::Args;
use orc_core::Clock;
use orc_daemon::Services;

#[derive(Args)]
pub struct MaintenanceArgs {
    /// Treat a pass that reconciled any dead letters as an operational
    /// regression signal (exit 3) instead of a normal success.
    #[arg(long)]
    pub fail_on_reconcile: bool,
}

pub async fn handle(args: MaintenanceArgs, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    let now_ms = services.clock.epoch_ms();
    let report = services.maintenance.run_once(now_ms).await.context("running maintenance pass")?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("ran={}", report.ran);
            println!("delivered={}", report.delivered);
            println!("reconciled={}", report.reconciled);
            println!("idempotency_purged={}", report.idempotency_purged);
            println!("dead_letters_purged={}", report.dead_letters_purged);
            println!("locks_gc={}", report.locks_gc);
            println!("queue_reconciled={}", report.queue_reconciled);
        }
    }

    if args.fail_on_reconcile && report.reconciled > 0 {
        Ok(EXIT_REGRESSION)
    } else {
        Ok(0)
    }
}
