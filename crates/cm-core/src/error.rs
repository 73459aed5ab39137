//! # Error Types
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations. Format errors carry the offending input so callers can
//! echo it back to the user.
//!
//! A well-formed RUT whose check digit does not match is NOT an error. It is
//! a negative [`ValidationResult`](crate::ValidationResult).

use thiserror::Error;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input could not be parsed into a candidate RUT.
    #[error("format error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input cannot be parsed into a candidate taxpayer ID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No numeric body remained after cleaning.
    #[error("invalid RUT \"{0}\": missing numeric body")]
    EmptyBody(String),

    /// The body contains something other than ASCII digits.
    #[error("invalid RUT \"{0}\": body must contain only digits")]
    NonNumericBody(String),

    /// The body is longer than a RUT can be.
    #[error("invalid RUT \"{input}\": body has {len} digits (maximum {max})")]
    BodyTooLong {
        /// The rejected input.
        input: String,
        /// Number of digits found.
        len: usize,
        /// Largest permitted body length.
        max: usize,
    },

    /// Check digit is not a single `0-9` or `K`.
    #[error("invalid RUT \"{0}\": check digit must be 0-9 or K")]
    InvalidCheckDigit(String),
}

impl ValidationError {
    /// The raw input that was rejected.
    pub fn input(&self) -> &str {
        match self {
            Self::EmptyBody(s) | Self::NonNumericBody(s) | Self::InvalidCheckDigit(s) => s,
            Self::BodyTooLong { input, .. } => input,
        }
    }
}
