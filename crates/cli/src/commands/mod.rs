// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod candidates;
pub mod dead_letters;
pub mod locks;
pub mod maintenance;
pub mod outbox;

use crate::output::OutputFormat;
use candidates::{CandidatesArgs, CandidatesCommand};
use clap::Subcommand;
use dead_letters::{DeadLettersArgs, DeadLettersCommand};
use locks::LocksArgs;
use maintenance::MaintenanceArgs;
use orc_daemon::Services;
use outbox::OutboxArgs;

#[derive(Subcommand)]
pub enum Command {
    /// Inspect the dead-letter archive and propose recovery candidates
    DeadLetters(DeadLettersArgs),
    /// Review and replay recovery candidates
    Candidates(CandidatesArgs),
    /// Drive the outbox processor outside its normal timer
    Outbox(OutboxArgs),
    /// Force one pass of the leader-gated maintenance loop
    Maintenance(MaintenanceArgs),
    /// Dump distributed lock state
    Locks(LocksArgs),
}

pub async fn dispatch(command: Command, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    match command {
        Command::DeadLetters(args) => dead_letters_dispatch(args.command, services, format).await,
        Command::Candidates(args) => candidates_dispatch(args.command, services, format).await,
        Command::Outbox(args) => outbox::handle(args, services, format).await,
        Command::Maintenance(args) => maintenance::handle(args, services, format).await,
        Command::Locks(args) => locks::handle(args, services, format).await,
    }
}

async fn dead_letters_dispatch(command: DeadLettersCommand, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    dead_letters::handle(command, services, format).await
}

async fn candidates_dispatch(command: CandidatesCommand, services: &Services, format: OutputFormat) -> anyhow::Result<i32> {
    candidates::handle(command, services, format).await
}
