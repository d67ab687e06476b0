use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    Misconfigured,
    UpstreamError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::Misconfigured => "misconfigured",
            ErrorCode::UpstreamError => "upstream_error",
        }
    }
}

/// Error body returned by the interpretation endpoint: `{ "error": ..., "code": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{}: {message}", code.as_str())]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_uses_error_and_code_keys() {
        let body = ApiError::new(ErrorCode::UpstreamError, "failed to generate interpretation");
        let value = serde_json::to_value(&body).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "code": "upstream_error",
                "error": "failed to generate interpretation"
            })
        );
        assert_eq!(
            body.to_string(),
            "upstream_error: failed to generate interpretation"
        );
    }

    #[test]
    fn error_body_decodes_every_code() {
        for code in ["bad_request", "misconfigured", "upstream_error"] {
            let raw = serde_json::json!({ "code": code, "error": "x" });
            let body: ApiError = serde_json::from_value(raw).expect("decode");
            assert_eq!(body.code.as_str(), code);
        }
    }

    #[test]
    fn unknown_code_is_not_decoded() {
        let raw = serde_json::json!({ "code": "internal", "error": "x" });
        assert!(serde_json::from_value::<ApiError>(raw).is_err());
    }
}
