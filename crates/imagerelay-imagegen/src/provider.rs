pub(crate) mod fal;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    types::{GenerationRequest, GenerationResult},
};

/// Trait for image generation provider implementations
///
/// One call to [`ImageGenProvider::subscribe`] submits exactly one job and
/// waits for it to finish.
#[async_trait]
pub trait ImageGenProvider: Send + Sync {
    /// Submit a job and wait for its result, reporting queue updates
    async fn subscribe(
        &self,
        request: &GenerationRequest,
        credential: &SecretString,
        observer: &dyn QueueObserver,
    ) -> Result<GenerationResult, ProviderError>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Receives queue updates while a job is pending
pub trait QueueObserver: Send + Sync {
    fn on_update(&self, update: &QueueUpdate);
}

/// Position of a job in the provider's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    InQueue,
    InProgress,
    Completed,
}

/// A single log line emitted by the provider while running a job
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogLine {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One status report for a pending job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueUpdate {
    pub request_id: String,
    pub status: QueueStatus,
    pub logs: Vec<LogLine>,
    pub queue_position: Option<u32>,
}
