mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

// Lets `crate::error` resolve inside the cli module
use confsync::error;
use confsync::error::ConfsyncError;
use confsync::sample::RunStatus;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // stdout carries the report, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confsync=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli::run(&cli).await {
        Ok(report) if report.samples.status() == RunStatus::Failed => {
            tracing::error!(project = %report.project, "No sample file could be parsed");
            Ok(ExitCode::FAILURE)
        }
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e @ ConfsyncError::NoSamples { .. }) => {
            tracing::error!(project = %cli.project, "{}. Exit", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Run failed for {}", cli.project))),
    }
}
