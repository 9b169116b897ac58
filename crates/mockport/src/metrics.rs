//! Prometheus metrics for mockport.
//!
//! Tracks resolved requests, selected responses, simulated delay and
//! dropped invocation records.
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};
use tracing::warn;

lazy_static! {
    /// Total number of mock requests handled
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mockport_requests_total",
        "Total number of mock requests handled",
        &["protocol", "outcome"]  // outcome: success|<failure kind>
    )
    .unwrap();

    /// Mock responses chosen by the response selector
    pub static ref RESPONSES_SELECTED_TOTAL: CounterVec = register_counter_vec!(
        "mockport_responses_selected_total",
        "Total number of mock responses selected, by strategy",
        &["strategy"]
    )
    .unwrap();

    /// Simulated network delay in milliseconds
    pub static ref DELAY_INJECTED_MS: HistogramVec = register_histogram_vec!(
        "mockport_delay_injected_ms",
        "Histogram of simulated network delay in milliseconds",
        &["protocol"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();

    /// Invocation records the recorder could not store
    pub static ref RECORDER_DROPPED_TOTAL: Counter = register_counter!(
        "mockport_recorder_dropped_total",
        "Total number of invocation records dropped by the recorder"
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_request(protocol: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[protocol, outcome]).inc();
}

pub fn record_selection(strategy: &str) {
    RESPONSES_SELECTED_TOTAL.with_label_values(&[strategy]).inc();
}

pub fn record_delay(protocol: &str, delay_ms: u64) {
    DELAY_INJECTED_MS
        .with_label_values(&[protocol])
        .observe(delay_ms as f64);
}

pub fn record_dropped_invocation() {
    RECORDER_DROPPED_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_metrics_includes_recorded_series() {
        record_request("soap", "success");
        record_selection("SEQUENCE");
        record_delay("rest", 25);
        record_dropped_invocation();

        let text = collect_metrics();
        assert!(text.contains("mockport_requests_total"));
        assert!(text.contains("mockport_responses_selected_total"));
        assert!(text.contains("mockport_delay_injected_ms"));
        assert!(text.contains("mockport_recorder_dropped_total"));
    }
}
