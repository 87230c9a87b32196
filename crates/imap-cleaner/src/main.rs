//! imap-cleaner: mark, restore and expunge IMAP messages by date.

mod cli;
mod prompt;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.command.global().verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!();
            println!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so `list` output stays clean on stdout.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,imap_cleaner=info,imap_cleaner_core=info,imap_cleaner_imap=info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let password = match cli.command.global().pass.clone() {
        Some(pass) => pass,
        None => tokio::task::spawn_blocking(prompt::read_password)
            .await
            .context("password prompt was interrupted")??,
    };

    let config = cli.command.into_config(password);
    tracing::debug!(?config, "starting run");
    let report = imap_cleaner_core::run(&config).await?;

    for name in &report.listed {
        println!("{name}");
    }
    Ok(())
}
