// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orc`: the operator CLI for the durable execution core. Connects to the
//! same storage and broker the daemon uses and drives the core's recovery
//! primitives directly; there is no socket or HTTP hop in between.

mod commands;
mod exit_error;
mod output;

use clap::Parser;
use commands::Command;
use exit_error::ExitError;
use orc_daemon::{Config, Services};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "orc", about = "Operator CLI for the durable execution core")]
struct Cli {
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(orc_daemon::env::log_filter()).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")))
        .init();

    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("orc: invalid configuration: {e}");
            return exit_error::EXIT_MISUSE;
        }
    };

    let services = match Services::connect(&config).await {
        Ok(services) => services,
        Err(e) => {
            eprintln!("orc: failed to connect: {e}");
            return 1;
        }
    };

    match commands::dispatch(cli.command, &services, cli.format).await {
        Ok(code) => code,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<ExitError>() {
                eprintln!("orc: {exit_err}");
                exit_err.code
            } else {
                eprintln!("orc: {e:#}");
                1
            }
        }
    }
}
