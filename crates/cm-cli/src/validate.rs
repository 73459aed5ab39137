//! # Validate Subcommand
//!
//! Normalizes and validates each argument independently. Text output is one
//! line per ID; `--json` prints an array with one entry per ID in argument
//! order.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use cm_core::{validate_raw, ValidationResult};

use crate::{EXIT_FORMAT_ERROR, EXIT_INVALID, EXIT_OK};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// RUTs to validate, in any common notation (`12.345.678-5`, `123456785`).
    #[arg(required = true, value_name = "RUT")]
    pub ids: Vec<String>,

    /// Emit a JSON array instead of text lines.
    #[arg(long)]
    pub json: bool,
}

/// Outcome for a single argument.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome {
    Checked {
        input: String,
        #[serde(flatten)]
        result: ValidationResult,
    },
    Rejected {
        input: String,
        error: String,
    },
}

impl Outcome {
    fn of(input: &str) -> Self {
        match validate_raw(input) {
            Ok(result) => Self::Checked {
                input: input.to_string(),
                result,
            },
            Err(err) => Self::Rejected {
                input: input.to_string(),
                error: err.to_string(),
            },
        }
    }

    fn exit_code(&self) -> u8 {
        match self {
            Self::Checked { result, .. } if result.is_valid => EXIT_OK,
            Self::Checked { .. } => EXIT_INVALID,
            Self::Rejected { .. } => EXIT_FORMAT_ERROR,
        }
    }
}

/// Run the validate subcommand, writing results to `out`.
///
/// The exit code is the worst outcome across all IDs.
pub fn run_validate(args: &ValidateArgs, out: &mut impl Write) -> Result<u8> {
    let outcomes: Vec<Outcome> = args.ids.iter().map(|id| Outcome::of(id)).collect();

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &outcomes)?;
        writeln!(out)?;
    } else {
        for outcome in &outcomes {
            match outcome {
                Outcome::Checked { input, result } => {
                    let mark = if result.is_valid { "OK  " } else { "FAIL" };
                    writeln!(out, "{mark} {input} -> {}: {}", result.normalized_id, result.message)?;
                }
                Outcome::Rejected { error, .. } => writeln!(out, "ERR  {error}")?,
            }
        }
    }

    let code = outcomes.iter().map(Outcome::exit_code).max().unwrap_or(EXIT_OK);
    tracing::info!(count = outcomes.len(), exit = code, "validated");
    Ok(code)
}
