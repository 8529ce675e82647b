//! gatecheck CLI - Main Entry Point
//!
//! Queries the AirportGap API and runs declarative verification scenarios
//! against it.
//!
//! Exit codes: 0 when everything passed, 1 on a verification failure, 2 on
//! any other error.

use clap::{Parser, Subcommand};
use gatecheck_common::{LogFormat, Settings, DEFAULT_CONFIG_FILE};
use gatecheck_suite::SuiteError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod client;
mod commands;
mod output;

use commands::{airports, distance, run, Outcome};

const EXIT_VERIFICATION_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// gatecheck - AirportGap API verification suite
#[derive(Parser)]
#[command(name = "gatecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// AirportGap base URL (overrides settings and environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Serve responses from a replay file instead of the network
    #[arg(long, global = true, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query airports
    #[command(subcommand)]
    Airports(airports::AirportsCommands),

    /// Calculate the distance between two airports
    Distance(distance::DistanceArgs),

    /// Run verification scenarios
    Run(run::RunArgs),
}

fn load_settings(cli: &Cli) -> gatecheck_common::Result<Settings> {
    let mut settings = Settings::load(&cli.config)?.apply_env()?;
    if let Some(url) = &cli.base_url {
        settings.airportgap.base_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.test.log_level = level.to_lowercase();
    }
    if cli.log_json {
        settings.test.log_format = LogFormat::Json;
    }
    settings.validate()?;
    Ok(settings)
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.test.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match settings.test.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn execute(cli: Cli, settings: &Settings) -> anyhow::Result<Outcome> {
    let transport = client::transport(cli.replay.as_deref())?;

    match cli.command {
        Commands::Airports(cmd) => {
            let airports = client::airports_client(transport, &settings.airportgap, "airports");
            airports::execute(cmd, &airports, cli.format)
        }
        Commands::Distance(args) => {
            let airports = client::airports_client(transport, &settings.airportgap, "distance");
            distance::execute(args, &airports, cli.format)
        }
        Commands::Run(args) => run::execute(args, settings, transport, cli.format),
    }
}

/// Map an error to an exit code: verification failures are 1, the rest 2
fn exit_code(err: &anyhow::Error) -> i32 {
    let check_error = err.downcast_ref::<gatecheck_common::Error>().or_else(|| {
        match err.downcast_ref::<SuiteError>() {
            Some(SuiteError::Check(inner)) => Some(inner),
            _ => None,
        }
    });

    match check_error {
        Some(e) if e.is_verification_failure() => EXIT_VERIFICATION_FAILED,
        _ => EXIT_ERROR,
    }
}

fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            output::notice(output::Notice::Failed, &format!("Failed to load settings: {}", e));
            std::process::exit(EXIT_ERROR);
        }
    };
    init_logging(&settings);

    let code = match execute(cli, &settings) {
        Ok(Outcome::Passed) => 0,
        Ok(Outcome::Failed) => EXIT_VERIFICATION_FAILED,
        Err(e) => {
            output::notice(output::Notice::Failed, &format!("{:#}", e));
            exit_code(&e)
        }
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatecheck_common::{AssertionFailure, Error};
    use test_case::test_case;

    #[test_case(Error::Transport("timed out".into()), EXIT_ERROR ; "transport")]
    #[test_case(Error::InvalidConfig("bad".into()), EXIT_ERROR ; "config")]
    #[test_case(Error::Shape("not a list".into()), EXIT_VERIFICATION_FAILED ; "shape")]
    #[test_case(
        Error::Assertion(AssertionFailure::new("assert_equals", "mismatch", "1", "2")),
        EXIT_VERIFICATION_FAILED ;
        "assertion"
    )]
    fn test_exit_code_for_check_errors(err: Error, expected: i32) {
        assert_eq!(exit_code(&anyhow::Error::new(err)), expected);
    }

    #[test]
    fn test_exit_code_unwraps_suite_errors() {
        let err = SuiteError::Check(Error::MissingEntities {
            missing: vec!["Zzyzx".to_string()],
            available: vec![],
        });
        assert_eq!(exit_code(&anyhow::Error::new(err)), EXIT_VERIFICATION_FAILED);

        let err = SuiteError::ScenarioNotFound("nope".to_string());
        assert_eq!(exit_code(&anyhow::Error::new(err)), EXIT_ERROR);
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gatecheck",
            "distance",
            "KIX",
            "NRT",
            "--min-km",
            "400",
            "--format",
            "json",
            "--base-url",
            "http://localhost:3000",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:3000"));
        match cli.command {
            Commands::Distance(args) => {
                assert_eq!(args.from, "KIX");
                assert_eq!(args.min_km, Some(400.0));
            }
            _ => panic!("expected distance command"),
        }
    }

    #[test]
    fn test_run_tag_conflicts_with_name() {
        let result = Cli::try_parse_from(["gatecheck", "run", "--tag", "smoke", "--name", "a"]);
        assert!(result.is_err());
    }
}
