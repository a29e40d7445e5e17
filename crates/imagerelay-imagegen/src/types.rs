use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, Result};

/// Message returned alongside every successful generation
pub const SUCCESS_MESSAGE: &str = "Image generation in progress";

/// A validated generation request
///
/// Serializes to the provider input `{ "prompt": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    /// Text description of the desired image
    pub prompt: String,
}

impl GenerationRequest {
    /// Validate a decoded request body
    ///
    /// Payloads that are not JSON objects count as a missing prompt.
    pub fn from_value(payload: &Value) -> Result<Self> {
        match payload.get("prompt") {
            Some(Value::String(prompt)) if !prompt.is_empty() => Ok(Self {
                prompt: prompt.clone(),
            }),
            _ => Err(RelayError::InvalidPrompt),
        }
    }
}

/// Outcome of a completed provider call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Provider-defined payload, passed through untouched
    pub data: Value,
    /// Provider-assigned request identifier
    pub request_id: String,
}

/// Success body: `{ "message", "data", "requestId" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub message: String,
    pub data: Value,
    pub request_id: String,
}

impl From<GenerationResult> for GenerationResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            data: result.data,
            request_id: result.request_id,
        }
    }
}
