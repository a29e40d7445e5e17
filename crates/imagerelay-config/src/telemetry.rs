use std::{collections::HashMap, time::Duration};

use serde::Deserialize;
use url::Url;

/// Logging output and optional OTLP export
///
/// ```toml
/// [telemetry]
/// log_format = "json"
/// otlp_endpoint = "http://localhost:4317"
/// export_interval = "15s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Extra attributes attached to every exported span and metric
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Collector receiving traces and metrics; export is off when unset
    #[serde(default)]
    pub otlp_endpoint: Option<Url>,
    #[serde(default)]
    pub protocol: ExportProtocol,
    /// How often metrics are pushed, e.g. "30s"
    #[serde(default = "default_export_interval")]
    pub export_interval: String,
    /// Fraction of root traces kept, between 0.0 and 1.0
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            resource_attributes: HashMap::new(),
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            protocol: ExportProtocol::default(),
            export_interval: default_export_interval(),
            sampling_rate: default_sampling_rate(),
        }
    }
}

impl TelemetryConfig {
    /// Parsed metrics export interval
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is not a valid duration string
    pub fn export_interval(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.export_interval)
            .map_err(|e| anyhow::anyhow!("invalid telemetry export_interval '{}': {e}", self.export_interval))
    }

    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            anyhow::bail!("telemetry sampling_rate must be between 0.0 and 1.0, got {}", self.sampling_rate);
        }
        if self.export_interval()?.is_zero() {
            anyhow::bail!("telemetry export_interval must be greater than zero");
        }
        Ok(())
    }
}

/// Log line format written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// OTLP transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportProtocol {
    #[default]
    Grpc,
    HttpProto,
}

fn default_service_name() -> String {
    "imagerelay".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_sampling_rate() -> f64 {
    1.0
}

fn default_export_interval() -> String {
    "30s".to_string()
}
