//! # cm-cli: Command-Line RUT Tools
//!
//! Provides the `cm` binary for checking Chilean taxpayer IDs outside the
//! web dashboard.
//!
//! ## Subcommands
//!
//! - `cm validate <RUT>...`: normalize and validate, one line per ID.
//! - `cm check-digit <DIGITS>`: compute the verifier for a numeric body.
//! - `cm format <RUT>`: print the dotted display form.
//!
//! ## Exit Codes
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | `0`  | every ID was well-formed and valid        |
//! | `1`  | some ID was well-formed but invalid       |
//! | `2`  | some input could not be parsed as a RUT   |
//! | `3`  | the command itself failed (e.g. I/O)      |
//!
//! Handlers take the output sink as a parameter and return the exit code,
//! so they run unchanged under test.

pub mod check_digit;
pub mod format;
pub mod validate;

/// Every ID was well-formed and valid.
pub const EXIT_OK: u8 = 0;
/// At least one ID had a wrong check digit.
pub const EXIT_INVALID: u8 = 1;
/// At least one input was not a RUT at all.
pub const EXIT_FORMAT_ERROR: u8 = 2;
/// The command failed before every ID could be reported.
pub const EXIT_RUNTIME_ERROR: u8 = 3;

/// Map a handler outcome to the process exit code, logging any failure.
pub fn exit_code(result: anyhow::Result<u8>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            EXIT_RUNTIME_ERROR
        }
    }
}
