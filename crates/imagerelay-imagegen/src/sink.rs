use serde_json::Value;

use crate::{
    error::ProviderError,
    provider::{QueueObserver, QueueStatus, QueueUpdate},
};

/// Diagnostic events emitted while handling one request
#[derive(Debug)]
pub enum RelayEvent<'a> {
    /// A request arrived; `prompt` is the raw field, whatever its type
    RequestReceived { prompt: Option<&'a Value> },
    InvalidPrompt,
    CredentialMissing { env_var: &'a str },
    CredentialFound { provider: &'a str },
    /// One provider log line from an in-progress job
    Progress { request_id: &'a str, message: &'a str },
    Completed { request_id: &'a str, data: &'a Value },
    Failed { error: &'a ProviderError },
}

/// Observer for relay diagnostics
///
/// Purely observational: the relay ignores anything a sink does.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &RelayEvent<'_>);
}

/// Sink that writes every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &RelayEvent<'_>) {
        match event {
            RelayEvent::RequestReceived { prompt } => {
                tracing::debug!(prompt = ?prompt, "generation request received");
            }
            RelayEvent::InvalidPrompt => tracing::debug!("invalid prompt received"),
            RelayEvent::CredentialMissing { env_var } => {
                tracing::warn!(env_var, "provider API key is missing");
            }
            RelayEvent::CredentialFound { provider } => {
                tracing::debug!(provider, "API key found, calling provider");
            }
            RelayEvent::Progress { request_id, message } => {
                tracing::info!(request_id, "{message}");
            }
            RelayEvent::Completed { request_id, data } => {
                tracing::debug!(request_id, data = %data, "image generation result");
            }
            RelayEvent::Failed { error } => {
                tracing::error!(error = %error, "error generating image");
            }
        }
    }
}

/// Forwards log lines of in-progress updates to a sink
pub(crate) struct ProgressForwarder<'a> {
    pub sink: &'a dyn DiagnosticSink,
}

impl QueueObserver for ProgressForwarder<'_> {
    fn on_update(&self, update: &QueueUpdate) {
        if update.status != QueueStatus::InProgress {
            return;
        }

        for line in &update.logs {
            self.sink.record(&RelayEvent::Progress {
                request_id: &update.request_id,
                message: &line.message,
            });
        }
    }
}
