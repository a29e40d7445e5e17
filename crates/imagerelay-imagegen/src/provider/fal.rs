use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{ImageGenProvider, LogLine, QueueObserver, QueueStatus, QueueUpdate};
use crate::{
    error::ProviderError,
    types::{GenerationRequest, GenerationResult},
};

/// fal.ai queue provider
///
/// Submits a job to `{queue_url}/{model}`, polls its status until it
/// completes, then fetches the result.
pub(crate) struct FalQueueProvider {
    name: String,
    client: Client,
    queue_url: String,
    model: String,
    poll_interval: Duration,
}

impl FalQueueProvider {
    pub fn new(name: String, queue_url: &Url, model: String, poll_interval: Duration) -> Self {
        Self {
            name,
            client: Client::new(),
            queue_url: queue_url.as_str().trim_end_matches('/').to_string(),
            model: model.trim_matches('/').to_string(),
            poll_interval,
        }
    }

    /// App portion of the model id (`owner/app`), used for request URLs
    fn app_id(&self) -> &str {
        let mut slashes = self.model.match_indices('/').map(|(i, _)| i);
        match (slashes.next(), slashes.next()) {
            (Some(_), Some(second)) => &self.model[..second],
            _ => &self.model,
        }
    }

    fn request_url(&self, request_id: &str) -> String {
        format!("{}/{}/requests/{request_id}", self.queue_url, self.app_id())
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        credential: &SecretString,
    ) -> Result<SubmitResponse, ProviderError> {
        let url = format!("{}/{}", self.queue_url, self.model);

        tracing::debug!(provider = %self.name, model = %self.model, "submitting generation job");

        let response = authorized(self.client.post(&url), credential)
            .json(request)
            .send()
            .await
            .map_err(|e| self.connection_error("submit", &e))?;

        decode(check_status(&self.name, response).await?).await
    }

    async fn poll_status(
        &self,
        status_url: &str,
        credential: &SecretString,
    ) -> Result<StatusResponse, ProviderError> {
        let response = authorized(self.client.get(status_url), credential)
            .query(&[("logs", "1")])
            .send()
            .await
            .map_err(|e| self.connection_error("status", &e))?;

        decode(check_status(&self.name, response).await?).await
    }

    async fn fetch_result(&self, response_url: &str, credential: &SecretString) -> Result<Value, ProviderError> {
        let response = authorized(self.client.get(response_url), credential)
            .send()
            .await
            .map_err(|e| self.connection_error("result", &e))?;

        decode(check_status(&self.name, response).await?).await
    }

    fn connection_error(&self, stage: &str, error: &reqwest::Error) -> ProviderError {
        tracing::error!(provider = %self.name, stage, error = %error, "provider request failed");
        ProviderError::Connection(error.to_string())
    }
}

/// Wire format of the queue submission response
#[derive(Deserialize)]
struct SubmitResponse {
    request_id: String,
    #[serde(default)]
    status_url: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

/// Wire format of a queue status poll
#[derive(Deserialize)]
struct StatusResponse {
    status: QueueStatus,
    #[serde(default)]
    logs: Option<Vec<LogLine>>,
    #[serde(default)]
    queue_position: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl ImageGenProvider for FalQueueProvider {
    async fn subscribe(
        &self,
        request: &GenerationRequest,
        credential: &SecretString,
        observer: &dyn QueueObserver,
    ) -> Result<GenerationResult, ProviderError> {
        let submitted = self.submit(request, credential).await?;
        let request_id = submitted.request_id;

        let status_url = submitted
            .status_url
            .unwrap_or_else(|| format!("{}/status", self.request_url(&request_id)));
        let response_url = submitted
            .response_url
            .unwrap_or_else(|| self.request_url(&request_id));

        tracing::debug!(provider = %self.name, %request_id, "job queued");

        loop {
            let status = self.poll_status(&status_url, credential).await?;

            let update = QueueUpdate {
                request_id: request_id.clone(),
                status: status.status,
                logs: status.logs.unwrap_or_default(),
                queue_position: status.queue_position,
            };
            observer.on_update(&update);

            if update.status == QueueStatus::Completed {
                if let Some(error) = status.error {
                    tracing::error!(provider = %self.name, %request_id, %error, "job failed");
                    return Err(ProviderError::Failed(error));
                }
                break;
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        let data = self.fetch_result(&response_url, credential).await?;

        tracing::debug!(provider = %self.name, %request_id, "generation job complete");

        Ok(GenerationResult { data, request_id })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn authorized(builder: RequestBuilder, credential: &SecretString) -> RequestBuilder {
    builder.header("Authorization", format!("Key {}", credential.expose_secret()))
}

/// Turn a non-success response into a [`ProviderError::Api`]
///
/// Uses the body's `detail` field as the message when present, otherwise
/// the status reason phrase.
async fn check_status(provider: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| json.get("detail").cloned())
        .map(|detail| match detail {
            Value::String(text) => text,
            other => other.to_string(),
        });

    let message = detail.unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    tracing::error!(provider, status = %status, %message, "provider API error");

    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response
        .json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}
