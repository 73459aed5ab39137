//! # cm CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cm_cli::check_digit::{run_check_digit, CheckDigitArgs};
use cm_cli::format::{run_format, FormatArgs};
use cm_cli::validate::{run_validate, ValidateArgs};

/// Chilean RUT toolkit.
///
/// Normalizes free-form input, checks the modulus-11 verifier and prints
/// canonical or dotted forms.
#[derive(Parser, Debug)]
#[command(name = "cm", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate one or more RUTs.
    Validate(ValidateArgs),

    /// Compute the check digit for a numeric body.
    CheckDigit(CheckDigitArgs),

    /// Print a RUT in dotted display form.
    Format(FormatArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut out = io::stdout().lock();
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &mut out),
        Commands::CheckDigit(args) => run_check_digit(&args, &mut out),
        Commands::Format(args) => run_format(&args, &mut out),
    };

    ExitCode::from(cm_cli::exit_code(result))
}
