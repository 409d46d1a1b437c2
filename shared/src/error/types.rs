//! Application error type

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// The boundary type handed to whatever sits on top of the engine (UI shell,
/// HTTP adapter): a stable [`ErrorCode`], a human-readable message, and
/// optional structured details such as the detected serial value.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a detail entry
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::ProofRequired);
        assert_eq!(err.code, ErrorCode::ProofRequired);
        assert_eq!(err.message, ErrorCode::ProofRequired.message());
        assert!(err.details.is_none());
    }

    #[test]
    fn test_with_detail() {
        let err = AppError::with_message(ErrorCode::SerialMismatch, "mismatch at position 3")
            .with_detail("detected", "0812A45");
        assert_eq!(err.detail("detected"), Some(&Value::from("0812A45")));
        assert_eq!(err.to_string(), "mismatch at position 3");
    }
}
