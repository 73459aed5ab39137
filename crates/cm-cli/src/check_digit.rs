//! # Check-Digit Subcommand
//!
//! Computes the modulus-11 verifier for a bare numeric body and prints the
//! canonical ID it completes.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use cm_core::compute_check_digit;

use crate::{EXIT_FORMAT_ERROR, EXIT_OK};

/// Arguments for the check-digit subcommand.
#[derive(Args, Debug)]
pub struct CheckDigitArgs {
    /// Numeric body, 1 to 8 digits, without separators.
    #[arg(value_name = "DIGITS")]
    pub digits: String,
}

/// Run the check-digit subcommand, writing `"<digit> <body>-<digit>"` to `out`.
pub fn run_check_digit(args: &CheckDigitArgs, out: &mut impl Write) -> Result<u8> {
    match compute_check_digit(&args.digits) {
        Ok(digit) => {
            writeln!(out, "{digit} {}-{digit}", args.digits)?;
            Ok(EXIT_OK)
        }
        Err(err) => {
            writeln!(out, "ERR  {err}")?;
            Ok(EXIT_FORMAT_ERROR)
        }
    }
}
