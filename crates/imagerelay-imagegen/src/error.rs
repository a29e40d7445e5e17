use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Failures the relay answers with a JSON error body
///
/// Every variant is recovered at the relay boundary; none is fatal to the
/// process.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Request used a verb other than `POST`
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Prompt missing, null, empty, or not a string
    #[error("Prompt is required and must be a string.")]
    InvalidPrompt,

    /// No credential available; carries the environment variable to set
    #[error("API Key is missing. Set the {0} environment variable.")]
    MissingCredential(String),

    /// The provider call failed
    #[error("Error generating image")]
    Provider(#[from] ProviderError),
}

impl RelayError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidPrompt => StatusCode::BAD_REQUEST,
            Self::MissingCredential(_) | Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InvalidPrompt => "invalid_prompt",
            Self::MissingCredential(_) => "missing_credential",
            Self::Provider(_) => "provider_error",
        }
    }

    /// JSON body sent to the caller
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
            error: match self {
                Self::Provider(source) => Some(source.to_string()),
                _ => None,
            },
        }
    }
}

/// Failures surfaced by an image generation provider
///
/// The `Display` text is relayed to callers in the `error` field.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never reached the provider or the connection dropped
    #[error("connection to provider failed: {0}")]
    Connection(String),

    /// Provider answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Provider answered with a body that could not be decoded
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider finished the job but reported it as failed
    #[error("{0}")]
    Failed(String),

    /// The configured deadline expired before the job completed
    #[error("image generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Error response body: `{ "message": ..., "error"?: ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_carry_only_a_message() {
        let body = RelayError::InvalidPrompt.body();
        assert_eq!(body.message, "Prompt is required and must be a string.");
        assert!(body.error.is_none());

        let json = serde_json::to_value(RelayError::MethodNotAllowed.body()).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Method Not Allowed" }));
    }

    #[test]
    fn missing_credential_names_the_variable() {
        let err = RelayError::MissingCredential("FAL_KEY".to_owned());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.body().message,
            "API Key is missing. Set the FAL_KEY environment variable."
        );
    }

    #[test]
    fn provider_errors_relay_the_source_text() {
        let err = RelayError::from(ProviderError::Api {
            status: 401,
            message: "Unauthorized".to_owned(),
        });

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.body(),
            ErrorBody {
                message: "Error generating image".to_owned(),
                error: Some("Unauthorized".to_owned()),
            }
        );
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(RelayError::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(RelayError::InvalidPrompt.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::from(ProviderError::Timeout(Duration::from_secs(5))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
