//! Structured error body returned by the Service on permanent failures.

use serde::Deserialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// `{ code, message, errors? }` body accompanying a non-2xx, non-429
/// response.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiError {
    /// Service-defined numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional field-level validation errors, shape is endpoint-specific.
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::ApiError;

    #[test]
    fn deserializes_without_errors_field() {
        let error: ApiError = serde_json::from_str(r#"{"code":50001,"message":"Missing Access"}"#).unwrap();
        assert_eq!(error.code, 50_001);
        assert_eq!(error.message, "Missing Access");
        assert_eq!(error.errors, None);
    }
}
