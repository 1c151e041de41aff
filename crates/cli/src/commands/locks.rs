// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc locks show`: dump the state of one distributed lock. There is no
//! list-all on the lock port (leases aren't enumerated, only looked up by
//! resource name), so operators name the resource they care about; the
//! maintenance leader lock is the most common one to check.

use crate::output::{print_json, OutputFormat};
use anyhow::Context;
use clap::Args;
use orc_engine::maintenance::LEADER_RESOURCE;
use orc_daemon::Services;
use orc_storage::LockStore;

#[derive(Args)]
pub struct LocksArgs {
    /// Resource name to inspect. Defaults to the maintenance leader lock.
    #[arg(default_value = LEADER_RESOURCE)]
    pub resource: String,
}

pub async fn handle(args: LocksArgs, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    let record = services.locks.inspect(&args.resource).await.context("inspecting lock")?;
    match format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Text => match record {
            Some(r) => println!(
                "{}  holder={} token={} acquired_at_ms={} lease_expires_at_ms={}",
                args.resource, r.holder, r.fencing_token, r.acquired_at_ms, r.lease_expires_at_ms
            ),
            None => println!("{} unheld", args.resource),
        },
    }
    Ok(0)
}
