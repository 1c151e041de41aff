// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc candidates`: review recovery candidates and force a replay of the
//! run they were raised against, bypassing the approve/reject workflow.

use crate::exit_error::EXIT_REGRESSION;
use crate::output::{print_json, OutputFormat};
use anyhow::Context;
use clap::{Args, Subcommand};
use orc_core::CandidateId;
use orc_daemon::Services;
use orc_storage::{CandidateStore, DeadLetterStore};
use orc_wire::OrchestratorService;

#[derive(Args)]
pub struct CandidatesArgs {
    #[command(subcommand)]
    pub command: CandidatesCommand,
}

#[derive(Subcommand)]
pub enum CandidatesCommand {
    /// Approve a proposed candidate through the normal workflow
    Approve { candidate_id: String },
    /// Reject a proposed candidate through the normal workflow
    Reject { candidate_id: String },
    /// Re-execute the run behind a candidate's dead letter and compare
    /// results against the replay log, without waiting on approval
    Replay { candidate_id: String },
}

pub async fn handle(command: CandidatesCommand, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    match command {
        CandidatesCommand::Approve { candidate_id } => {
            services.as_service().approve_candidate(CandidateId::from_string(&candidate_id)).await.context("approving candidate")?;
            println!("approved {candidate_id}");
            Ok(0)
        }
        CandidatesCommand::Reject { candidate_id } => {
            services.as_service().reject_candidate(CandidateId::from_string(&candidate_id)).await.context("rejecting candidate")?;
            println!("rejected {candidate_id}");
            Ok(0)
        }
        CandidatesCommand::Replay { candidate_id } => {
            let id = CandidateId::from_string(&candidate_id);
            let candidate = services.candidates.get(id).await.context("candidate not found")?;
            let dead_letter = services.dead_letters.get(candidate.dead_letter_id).await.context("dead letter not found")?;
            let report = services.as_service().replay(dead_letter.op_id.run_id).await.context("replaying run")?;

            let mismatched = report.per_op.iter().filter(|r| r.verdict != "match").count();
            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => {
                    println!("replay of {}", report.run_id);
                    for op in &report.per_op {
                        println!("  op[{}] {}", op.op_index, op.verdict);
                    }
                }
            }
            Ok(if mismatched > 0 { EXIT_REGRESSION } else { 0 })
        }
    }
}
