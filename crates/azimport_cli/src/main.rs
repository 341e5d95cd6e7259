//! azimport CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Discovery partially failed
//! - 4: Cancelled

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod plan;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PARTIAL_FAILURE: u8 = 3;
    pub const CANCELLED: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "azimport=debug"
    } else if cli.quiet {
        "warn"
    } else {
        "azimport=info"
    };

    // Logs go to stderr so a plan written to stdout stays parseable
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Discover(args) => commands::discover::execute(args).await,
        Commands::Families(args) => commands::families::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    use azimport_arm::ArmError;
    use azimport_core::DiscoveryError;
    use commands::discover::RunFailure;

    if let Some(failure) = e.downcast_ref::<RunFailure>() {
        return if failure.cancelled {
            ExitCodes::CANCELLED
        } else {
            ExitCodes::PARTIAL_FAILURE
        };
    }
    if let Some(err) = e.downcast_ref::<DiscoveryError>() {
        return match err {
            DiscoveryError::InvalidConfig(_) => ExitCodes::INVALID_ARGS,
            err if err.is_cancelled() => ExitCodes::CANCELLED,
            _ => ExitCodes::GENERAL_ERROR,
        };
    }
    if let Some(ArmError::MissingToken(_) | ArmError::InvalidEndpoint(_)) = e.downcast_ref::<ArmError>() {
        return ExitCodes::INVALID_ARGS;
    }
    ExitCodes::GENERAL_ERROR
}
