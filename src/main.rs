//! dpconf: data-plane daemon configuration validator
//!
//! Entry point for the dpconf application.

use dpconf::config::{Cli, Command, ValidatedConfig, write_default_config};
use dpconf::policy::PolicyMap;
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match &cli.command {
        Some(Command::Init { output }) => return handle_init(output),
        Some(Command::CheckRateLimit { value }) => return handle_check_rate_limit(value),
        None => {}
    }

    // Host probing logs, so tracing comes before loading
    setup_tracing(cli.verbose);

    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    tracing::info!("{config}");

    match run::execute(&config) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            e.exit_code()
        }
    }
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Handles the `check-rate-limit` subcommand.
fn handle_check_rate_limit(value: &str) -> ExitCode {
    let map = match PolicyMap::parse(value) {
        Ok(map) => map,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code::CONFIG_ERROR;
        }
    };

    match serde_json::to_string_pretty(&map) {
        Ok(json) => {
            println!("{json}");
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::runtime_error()
        }
    }
}
