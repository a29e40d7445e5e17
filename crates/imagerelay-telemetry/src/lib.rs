//! Telemetry for the image relay
//!
//! Structured logging through `tracing`, with optional OTLP export of
//! traces and metrics

mod metadata;
pub mod metrics;

use imagerelay_config::{ExportProtocol, LogFormat, TelemetryConfig};
use opentelemetry::{global, trace::TracerProvider};
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    trace::{Sampler, SdkTracerProvider},
};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

pub use metrics::RelayMetrics;

/// Flushes and shuts down exporters on drop
///
/// Hold it for the lifetime of the process.
#[derive(Default)]
pub struct TelemetryGuard {
    meter_provider: Option<SdkMeterProvider>,
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.meter_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown meter provider: {e}");
        }
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. Without a config the
/// relay logs in the pretty format and exports nothing.
///
/// # Errors
///
/// Returns an error if the export interval is invalid or an OTLP exporter
/// cannot be built
pub fn init(config: Option<&TelemetryConfig>, default_filter: &str) -> anyhow::Result<TelemetryGuard> {
    let defaults = TelemetryConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guard = TelemetryGuard::default();

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => {
            let resource = metadata::build_resource(config);

            let meter_provider = meter_provider(config, endpoint, resource.clone())?;
            global::set_meter_provider(meter_provider.clone());
            guard.meter_provider = Some(meter_provider);

            let tracer_provider = tracer_provider(config, endpoint, resource)?;
            let tracer = tracer_provider.tracer("imagerelay");
            global::set_tracer_provider(tracer_provider.clone());
            guard.tracer_provider = Some(tracer_provider);

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let fmt_layer = match config.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(true).boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::info!(%endpoint, protocol = ?config.protocol, "OTLP export enabled");
    }

    Ok(guard)
}

fn meter_provider(config: &TelemetryConfig, endpoint: &Url, resource: Resource) -> anyhow::Result<SdkMeterProvider> {
    let builder = MetricExporter::builder();
    let exporter = match config.protocol {
        ExportProtocol::Grpc => builder.with_tonic().with_endpoint(endpoint.as_str()).build(),
        ExportProtocol::HttpProto => builder.with_http().with_endpoint(endpoint.as_str()).build(),
    }
    .map_err(|e| anyhow::anyhow!("failed to build {:?} metrics exporter: {e}", config.protocol))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.export_interval()?)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

fn tracer_provider(config: &TelemetryConfig, endpoint: &Url, resource: Resource) -> anyhow::Result<SdkTracerProvider> {
    let builder = SpanExporter::builder();
    let exporter = match config.protocol {
        ExportProtocol::Grpc => builder.with_tonic().with_endpoint(endpoint.as_str()).build(),
        ExportProtocol::HttpProto => builder.with_http().with_endpoint(endpoint.as_str()).build(),
    }
    .map_err(|e| anyhow::anyhow!("failed to build {:?} span exporter: {e}", config.protocol))?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::ParentBased(Box::new(sampler_for(config.sampling_rate))))
        .with_batch_exporter(exporter)
        .build())
}

fn sampler_for(rate: f64) -> Sampler {
    if rate >= 1.0 {
        Sampler::AlwaysOn
    } else if rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(rate)
    }
}
