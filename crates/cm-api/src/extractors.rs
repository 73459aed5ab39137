//! # Procedure Input & Output
//!
//! Provides the [`Validate`] trait for procedure inputs and helpers that turn
//! raw JSON input into typed requests and typed outputs back into JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::RpcError;

/// Trait for input types that check business rules beyond what serde
/// deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Deserialize procedure input, mapping shape errors to [`RpcError::BadRequest`].
///
/// Missing input is treated as JSON `null`.
pub fn parse_input<T: DeserializeOwned>(input: Option<Value>) -> Result<T, RpcError> {
    serde_json::from_value(input.unwrap_or(Value::Null))
        .map_err(|err| RpcError::BadRequest(format!("invalid input: {err}")))
}

/// Deserialize procedure input and validate it using the [`Validate`] trait.
pub fn parse_validated_input<T>(input: Option<Value>) -> Result<T, RpcError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = parse_input(input)?;
    value.validate().map_err(RpcError::BadRequest)?;
    Ok(value)
}

/// Serialize procedure output.
pub fn to_output<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), String> {
            if self.name.trim().is_empty() {
                return Err("name must not be empty".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn parses_matching_input() {
        let named: Named = parse_input(Some(serde_json::json!({"name": "a"}))).unwrap();
        assert_eq!(named.name, "a");
    }

    #[test]
    fn missing_input_is_bad_request() {
        let err = parse_input::<Named>(None).unwrap_err();
        assert!(matches!(err, RpcError::BadRequest(ref m) if m.starts_with("invalid input")));
    }

    #[test]
    fn wrong_shape_is_bad_request() {
        let err = parse_input::<Named>(Some(serde_json::json!({"name": 5}))).unwrap_err();
        assert!(matches!(err, RpcError::BadRequest(_)));
    }

    #[test]
    fn validation_rule_applies() {
        let err =
            parse_validated_input::<Named>(Some(serde_json::json!({"name": "  "}))).unwrap_err();
        assert!(matches!(err, RpcError::BadRequest(ref m) if m == "name must not be empty"));
    }
}
