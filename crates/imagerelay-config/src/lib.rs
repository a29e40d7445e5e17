#![allow(clippy::must_use_candidate)]

pub mod cors;
pub mod health;
mod loader;
pub mod provider;
pub mod relay;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cors::*;
pub use health::*;
pub use provider::*;
pub use relay::*;
pub use server::*;
pub use telemetry::{ExportProtocol, LogFormat, TelemetryConfig};

/// Top-level relay configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Endpoint configuration
    #[serde(default)]
    pub relay: RelayConfig,
    /// Image generation provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
