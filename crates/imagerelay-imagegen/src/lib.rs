#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod credential;
mod error;
mod provider;
mod relay;
mod sink;
mod types;

use std::{sync::Arc, time::Instant};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, header::CONTENT_TYPE},
    routing::{any, post},
};
use imagerelay_config::{EndpointConfig, EndpointVariant};

pub use credential::CredentialSource;
pub use error::{ErrorBody, ProviderError, RelayError, Result};
pub use provider::{ImageGenProvider, LogLine, QueueObserver, QueueStatus, QueueUpdate};
pub use relay::{Relay, RelayBuilder};
pub use sink::{DiagnosticSink, RelayEvent, TracingSink};
pub use types::{GenerationRequest, GenerationResponse, GenerationResult, SUCCESS_MESSAGE};

/// Build the relay from configuration
///
/// # Errors
///
/// Returns an error if the provider settings are invalid
pub fn build_relay(config: &imagerelay_config::Config) -> anyhow::Result<Arc<Relay>> {
    let relay = RelayBuilder::new(&config.provider)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to initialize image relay: {e}"))?;
    Ok(Arc::new(relay))
}

/// Create the router serving every configured relay endpoint
pub fn endpoint_router(endpoints: &[EndpointConfig]) -> Router<Arc<Relay>> {
    endpoints.iter().fold(Router::new(), |router, endpoint| {
        tracing::debug!(path = %endpoint.path, variant = ?endpoint.variant, "mounting relay endpoint");

        match endpoint.variant {
            EndpointVariant::Standalone => router.route(&endpoint.path, post(standalone)),
            EndpointVariant::Function => router.route(&endpoint.path, any(function)),
        }
    })
}

/// Standalone server adapter: the router only lets `POST` through
async fn standalone(
    State(relay): State<Arc<Relay>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResponse>> {
    let start = Instant::now();
    let result = relay.handle(json_body(&headers, &body)).await;
    finish(&relay, "standalone", start, result)
}

/// Serverless function adapter: receives every verb and checks it itself
async fn function(
    State(relay): State<Arc<Relay>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResponse>> {
    let start = Instant::now();

    let result = if method == Method::POST {
        relay.handle(json_body(&headers, &body)).await
    } else {
        tracing::debug!(%method, "method not allowed");
        Err(RelayError::MethodNotAllowed)
    };

    finish(&relay, "function", start, result)
}

fn finish(
    relay: &Relay,
    variant: &'static str,
    start: Instant,
    result: Result<GenerationResponse>,
) -> Result<Json<GenerationResponse>> {
    let outcome = result.as_ref().map_or_else(RelayError::outcome, |_| "success");
    relay.metrics().record(variant, outcome, start);
    result.map(Json)
}

/// Body bytes when the request declares a JSON content type, else nothing
fn json_body<'a>(headers: &HeaderMap, body: &'a [u8]) -> &'a [u8] {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .is_some_and(|mime| mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json"));

    if is_json { body } else { &[] }
}
