// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc dead-letters`: inspect the archive and kick off recovery proposals.

use crate::output::{print_json, OutputFormat};
use anyhow::Context;
use clap::{Args, Subcommand};
use orc_core::{DeadLetterId, TenantId};
use orc_daemon::Services;
use orc_wire::dto::DeadLetterFilter;
use orc_wire::OrchestratorService;

#[derive(Args)]
pub struct DeadLettersArgs {
    #[command(subcommand)]
    pub command: DeadLettersCommand,
}

#[derive(Subcommand)]
pub enum DeadLettersCommand {
    /// List archived dead letters
    List {
        /// Restrict to a single tenant
        #[arg(long)]
        tenant: Option<String>,
        /// Restrict to a single skill
        #[arg(long)]
        skill: Option<String>,
        /// Only entries with no catalog match yet
        #[arg(long)]
        unmatched_only: bool,
    },
    /// Propose recovery candidates for one dead letter
    Propose {
        dead_letter_id: String,
    },
}

pub async fn handle(command: DeadLettersCommand, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    match command {
        DeadLettersCommand::List { tenant, skill, unmatched_only } => {
            let filter = DeadLetterFilter { tenant_id: tenant.map(|t| TenantId::from_string(&t)), skill, unmatched_only };
            let summaries = services.as_service().list_dead_letters(filter).await.context("listing dead letters")?;
            match format {
                OutputFormat::Json => print_json(&summaries)?,
                OutputFormat::Text => {
                    if summaries.is_empty() {
                        println!("no dead letters");
                    }
                    for s in &summaries {
                        println!(
                            "{}  run={} skill={} kind={} match={} recovered={}",
                            s.id,
                            s.run_id,
                            s.skill,
                            s.failure_kind,
                            s.catalog_match.as_deref().unwrap_or("-"),
                            s.recovered
                        );
                    }
                }
            }
            Ok(0)
        }
        DeadLettersCommand::Propose { dead_letter_id } => {
            let id = DeadLetterId::from_string(&dead_letter_id);
            let candidates = services.as_service().propose_recovery(id).await.context("proposing recovery")?;
            match format {
                OutputFormat::Json => print_json(&candidates)?,
                OutputFormat::Text => {
                    for c in &candidates {
                        println!("{}  confidence={:.2} status={}", c.id, c.confidence, c.status);
                    }
                }
            }
            Ok(0)
        }
    }
}
