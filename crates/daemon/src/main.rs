// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wardend - runs the configured services until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use warden_daemon::{logging, Supervisor};

#[derive(Parser)]
#[command(name = "wardend", version, about = "Runs scheduled, file, and process-triggered jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the configuration document and run until interrupted.
    Run {
        /// Path to the YAML configuration document.
        #[arg(long = "config", value_name = "PATH")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::parse();
    let Command::Run { config } = cli.command;

    let supervisor = Supervisor::new();
    match supervisor.run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "supervisor exited with an error");
            ExitCode::FAILURE
        }
    }
}
