// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc outbox drain`: force one maintenance pass focused on outbox
//! delivery. The outbox processor only runs as part of the leader-gated
//! maintenance pass, so this triggers the same pass `orc maintenance run`
//! does and reports the outbox-relevant fields.

use crate::output::{print_json, OutputFormat};
use anyhow::Context;
use clap::Args;
use orc_core::Clock;
use orc_daemon::Services;
use orc_storage::OutboxStore;

#[derive(Args)]
pub struct OutboxArgs {
    /// Show pending count without forcing a drain
    #[arg(long)]
    pub peek: bool,
}

pub async fn handle(args: OutboxArgs, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    if args.peek {
        let pending = services.outbox.pending_count().await.context("counting pending outbox entries")?;
        match format {
            OutputFormat::Json => print_json(&serde_json::json!({ "pending": pending }))?,
            OutputFormat::Text => println!("{pending} entries pending"),
        }
        return Ok(0);
    }

    let now_ms = services.clock.epoch_ms();
    let report = services.maintenance.run_once(now_ms).await.context("running maintenance pass")?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "ran": report.ran,
            "delivered": report.delivered,
        }))?,
        OutputFormat::Text => {
            if !report.ran {
                println!("not the maintenance leader, nothing drained");
            } else {
                println!("delivered {} outbox entries", report.delivered);
            }
        }
    }
    Ok(0)
}
