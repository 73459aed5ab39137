//! # cm-core: RUT Taxpayer-ID Primitives
//!
//! Pure domain logic for Chilean RUT (Rol Único Tributario) identifiers:
//!
//! ```text
//! raw string → normalize() → TaxId → validate() → ValidationResult
//! ```
//!
//! - [`normalize`] cleans free-form input into a [`TaxId`] or fails with a
//!   [`ValidationError`].
//! - [`compute_check_digit`] is the modulus-11 verifier computation.
//! - [`validate`] compares supplied and computed verifiers.
//!
//! ## Crate Policy
//!
//! - No I/O, no shared state. Every function is deterministic and safe to
//!   call from any thread.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod rut;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use rut::{compute_check_digit, normalize, CheckDigit, TaxId, MAX_BODY_LEN};
pub use validation::{validate, validate_raw, ValidationResult, VALID_MESSAGE};
