//! # Format Subcommand
//!
//! Prints a RUT in dotted display form (`12.345.678-5`), or canonical form
//! with `--plain`. The check digit is not verified.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use cm_core::normalize;

use crate::{EXIT_FORMAT_ERROR, EXIT_OK};

/// Arguments for the format subcommand.
#[derive(Args, Debug)]
pub struct FormatArgs {
    /// RUT in any common notation.
    #[arg(value_name = "RUT")]
    pub id: String,

    /// Print the canonical `digits-check` form without thousands separators.
    #[arg(long)]
    pub plain: bool,
}

/// Run the format subcommand.
pub fn run_format(args: &FormatArgs, out: &mut impl Write) -> Result<u8> {
    let id = match normalize(&args.id) {
        Ok(id) => id,
        Err(err) => {
            writeln!(out, "ERR  {err}")?;
            return Ok(EXIT_FORMAT_ERROR);
        }
    };

    if args.plain {
        writeln!(out, "{id}")?;
    } else {
        writeln!(out, "{}", id.formatted())?;
    }
    Ok(EXIT_OK)
}
