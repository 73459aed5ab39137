//! # Check-Digit Validation
//!
//! Compares a RUT's supplied verifier against the modulus-11 verifier its
//! body calls for and reports the outcome as a [`ValidationResult`].
//!
//! The message is a default English description. Callers that present it to
//! end users are expected to localize from `is_valid` instead.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::rut::{normalize, TaxId};

/// Default message for a RUT whose verifier matches.
pub const VALID_MESSAGE: &str = "valid RUT";

/// Outcome of validating one RUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the supplied verifier matches the computed one.
    pub is_valid: bool,
    /// Human-readable description of the outcome.
    pub message: String,
    /// Canonical `<digits>-<check>` form of the input.
    pub normalized_id: String,
}

/// Validate a well-formed RUT.
pub fn validate(tax_id: &TaxId) -> ValidationResult {
    let expected = tax_id.expected_check_digit();
    let supplied = tax_id.check_digit();
    let is_valid = expected == supplied;
    let message = if is_valid {
        VALID_MESSAGE.to_string()
    } else {
        format!("invalid RUT: check digit is {supplied}, expected {expected}")
    };
    ValidationResult {
        is_valid,
        message,
        normalized_id: tax_id.to_string(),
    }
}

/// Normalize free-form input, then validate it.
///
/// # Errors
///
/// Returns the [`ValidationError`] from [`normalize`] when the input cannot be
/// parsed. A parsed RUT with the wrong verifier is `Ok` with `is_valid: false`.
pub fn validate_raw(raw: &str) -> Result<ValidationResult, ValidationError> {
    normalize(raw).map(|id| validate(&id))
}
