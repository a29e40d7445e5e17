//! Relay metric names and recording helpers

use std::time::Instant;

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

pub const RELAY_REQUEST_COUNT: &str = "imagerelay.request.count";
pub const RELAY_REQUEST_DURATION: &str = "imagerelay.request.duration";

/// Instruments recorded once per relayed request
///
/// Backed by the global meter provider, so recording is a no-op until
/// [`crate::init`] installs an exporter.
#[derive(Clone)]
pub struct RelayMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
}

impl RelayMetrics {
    pub fn new() -> Self {
        let meter = global::meter("imagerelay");

        Self {
            requests: meter
                .u64_counter(RELAY_REQUEST_COUNT)
                .with_description("Generation requests handled, by endpoint variant and outcome")
                .build(),
            duration: meter
                .f64_histogram(RELAY_REQUEST_DURATION)
                .with_description("Time spent handling a generation request")
                .with_unit("s")
                .build(),
        }
    }

    /// Record one finished request
    pub fn record(&self, variant: &'static str, outcome: &'static str, start: Instant) {
        let attributes = [
            KeyValue::new("variant", variant),
            KeyValue::new("outcome", outcome),
        ];

        self.requests.add(1, &attributes);
        self.duration.record(start.elapsed().as_secs_f64(), &attributes);
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RelayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayMetrics").finish_non_exhaustive()
    }
}
