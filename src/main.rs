//! rigcheck CLI - Guitar Rig Diagnostics
//!
//! Command-line interface for the rig diagnostic harness and effects runtime.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::info;

use rigcheck::cli::{commands, Cli, Commands};
use rigcheck::Result;

/// Default log filter, raised by --verbose
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or(log_filter(cli.verbose)))
        .init();

    info!("rigcheck v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error [{}]: {}", err.error_code(), err);
            for hint in err.recovery_suggestions() {
                eprintln!("  hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Doctor {
            no_playback,
            config,
        }) => {
            let all_passed = commands::doctor(config.as_deref(), no_playback)?;
            Ok(if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Commands::Devices) => {
            commands::devices()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Tone {
            freq,
            duration,
            output,
            config,
        }) => {
            commands::tone(config.as_deref(), freq, duration, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Status { config }) => {
            commands::status(config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Run { config, effect }) => {
            commands::run(config.as_deref(), &effect)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("rigcheck v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands, or 'rigcheck doctor' to test the rig");
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_log_filter() {
        assert_eq!(log_filter(false), "info");
        assert_eq!(log_filter(true), "debug");
    }

    #[test]
    fn test_verbose_flag_parses() {
        let cli = Cli::parse_from(["rigcheck", "--verbose", "devices"]);
        assert!(cli.verbose);
        let cli = Cli::parse_from(["rigcheck", "devices"]);
        assert!(!cli.verbose);
    }
}
