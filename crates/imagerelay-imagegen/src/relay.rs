use std::{sync::Arc, time::Duration};

use imagerelay_config::ProviderConfig;
use imagerelay_telemetry::RelayMetrics;
use serde_json::Value;

use crate::{
    credential::CredentialSource,
    error::{ProviderError, RelayError, Result},
    provider::{ImageGenProvider, fal::FalQueueProvider},
    sink::{DiagnosticSink, ProgressForwarder, RelayEvent, TracingSink},
    types::{GenerationRequest, GenerationResponse},
};

/// Validates prompts, forwards them to the provider, and maps the outcome
///
/// Holds only immutable state, so one instance serves any number of
/// concurrent requests.
pub struct Relay {
    provider: Arc<dyn ImageGenProvider>,
    credentials: CredentialSource,
    sink: Arc<dyn DiagnosticSink>,
    timeout: Option<Duration>,
    metrics: RelayMetrics,
}

impl Relay {
    /// Handle one generation request body
    ///
    /// Validation and credential failures return before the provider is
    /// contacted. Otherwise exactly one provider call is made.
    pub async fn handle(&self, body: &[u8]) -> Result<GenerationResponse> {
        let payload = serde_json::from_slice(body).unwrap_or(Value::Null);

        self.sink.record(&RelayEvent::RequestReceived {
            prompt: payload.get("prompt"),
        });

        let request = GenerationRequest::from_value(&payload).inspect_err(|_| {
            self.sink.record(&RelayEvent::InvalidPrompt);
        })?;

        let Some(credential) = self.credentials.resolve() else {
            self.sink.record(&RelayEvent::CredentialMissing {
                env_var: self.credentials.env_var(),
            });
            return Err(RelayError::MissingCredential(self.credentials.env_var().to_string()));
        };

        self.sink.record(&RelayEvent::CredentialFound {
            provider: self.provider.name(),
        });

        let observer = ProgressForwarder { sink: self.sink.as_ref() };
        let call = self.provider.subscribe(&request, &credential, &observer);

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(limit))),
            None => call.await,
        };

        match outcome {
            Ok(result) => {
                self.sink.record(&RelayEvent::Completed {
                    request_id: &result.request_id,
                    data: &result.data,
                });
                Ok(GenerationResponse::from(result))
            }
            Err(error) => {
                self.sink.record(&RelayEvent::Failed { error: &error });
                Err(RelayError::Provider(error))
            }
        }
    }

    /// Instruments shared by the endpoint adapters
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }
}

/// Builder for constructing the relay from configuration
pub struct RelayBuilder<'a> {
    config: &'a ProviderConfig,
    provider: Option<Arc<dyn ImageGenProvider>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl<'a> RelayBuilder<'a> {
    pub fn new(config: &'a ProviderConfig) -> Self {
        Self {
            config,
            provider: None,
            sink: None,
        }
    }

    /// Use a custom provider instead of the fal queue client
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn ImageGenProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Send diagnostics to `sink` instead of `tracing`
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// # Errors
    ///
    /// Returns an error if the poll interval or timeout cannot be parsed
    pub fn build(self) -> anyhow::Result<Relay> {
        let timeout = self.config.timeout()?;

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(FalQueueProvider::new(
                "fal".to_string(),
                &self.config.queue_url,
                self.config.model.clone(),
                self.config.poll_interval()?,
            )),
        };

        tracing::debug!(
            provider = provider.name(),
            model = %self.config.model,
            timeout = ?timeout,
            "image relay initialized"
        );

        Ok(Relay {
            provider,
            credentials: CredentialSource::new(self.config.api_key.clone(), self.config.api_key_env.clone()),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            timeout,
            metrics: RelayMetrics::new(),
        })
    }
}
