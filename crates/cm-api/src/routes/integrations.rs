//! # Integration Procedures
//!
//! RUT tax-ID validation for the tax validation screen. Format errors come
//! back as `BAD_REQUEST`; a wrong check digit is a successful call with
//! `isValid: false`.

use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::RpcError;
use crate::extractors::{parse_validated_input, to_output, Validate};
use crate::state::AppState;

/// `integrations.validateTaxId` input.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTaxIdInput {
    /// Free-form RUT, e.g. `12.345.678-5`.
    pub tax_id: String,
}

impl Validate for ValidateTaxIdInput {
    fn validate(&self) -> Result<(), String> {
        if self.tax_id.trim().is_empty() {
            return Err("taxId must not be empty".to_string());
        }
        Ok(())
    }
}

/// `integrations.validateTaxId` mutation.
#[utoipa::path(
    post,
    path = "/api/trpc/integrations.validateTaxId",
    request_body = ValidateTaxIdInput,
    responses(
        (status = 200, description = "Validation outcome, inside a tRPC result envelope", body = cm_core::ValidationResult),
        (status = 400, description = "Input is not a RUT", body = crate::error::ErrorEnvelope),
    ),
    tag = "integrations"
)]
pub fn validate_tax_id(_state: &AppState, input: Option<Value>) -> Result<Value, RpcError> {
    let req: ValidateTaxIdInput = parse_validated_input(input)?;
    let result = cm_core::validate_raw(&req.tax_id).map_err(|err| {
        tracing::debug!(error = %err, "rejected tax id");
        err
    })?;
    tracing::debug!(
        normalized_id = %result.normalized_id,
        is_valid = result.is_valid,
        "validated tax id"
    );
    to_output(&result)
}
