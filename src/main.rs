//! `warplink` agent binary.
//!
//! Loads settings, installs logging, starts the client pipeline and keeps the
//! process alive until interrupted. Any startup failure exits with status 1.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use warplink::{Client, LoggingHandler, Settings, SystemEnvironmentBuilder, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let settings = match Settings::from_file(&cli.config).and_then(|settings| {
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(err) => {
            // No logger exists yet.
            eprintln!("warplink: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init(settings.log_destination) {
        eprintln!("warplink: {err}");
        return ExitCode::FAILURE;
    }

    let builder = match Client::from_settings(&settings) {
        Ok(builder) => builder
            .handler(LoggingHandler)
            .environment_builder(SystemEnvironmentBuilder),
        Err(err) => {
            error!(error = %err, "cannot initialise client");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        info!(config = %cli.config.display(), "configuration ok");
        return ExitCode::SUCCESS;
    }

    let client = match builder.start() {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "cannot start client");
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        () = client.run_forever() => {}
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("interrupt received, exiting"),
            Err(err) => error!(error = %err, "cannot listen for interrupts, exiting"),
        },
    }
    ExitCode::SUCCESS
}
