//! Metrics and observability utilities
//!
//! Provides Prometheus metrics for the query pipeline with
//! standardized naming conventions, plus the tracing setup shared by
//! every binary.

use crate::config::ObservabilityConfig;
use crate::errors::{AppError, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Metrics prefix for all ContextForge metrics
pub const METRICS_PREFIX: &str = "contextforge";

/// Histogram buckets for end-to-end query latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Buckets for compressed context size in tokens
pub const TOKEN_BUCKETS: &[f64] = &[
    25.0, 50.0, 100.0, 200.0, 300.0, 500.0, 750.0, 1000.0, 2000.0, 4000.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Query pipeline metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total queries processed, labelled by detected intent"
    );

    describe_histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end query pipeline latency in seconds"
    );

    describe_histogram!(
        format!("{}_compression_tokens_used", METRICS_PREFIX),
        Unit::Count,
        "Estimated tokens in the compressed context"
    );

    describe_histogram!(
        format!("{}_compression_sentences", METRICS_PREFIX),
        Unit::Count,
        "Evidence sentences kept under the token budget"
    );

    // Upstream metrics
    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total answer generation requests"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Answer generation latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides `observability.log_level`. Output goes to stderr so
/// command output on stdout stays machine-readable.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    // A second initialisation (tests, embedded use) keeps the first subscriber
    let _ = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Serve Prometheus metrics on `port`; 0 disables the exporter
pub fn install_prometheus_exporter(port: u16) -> Result<()> {
    if port == 0 {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|b| {
            b.set_buckets_for_metric(
                Matcher::Full(format!("{}_compression_tokens_used", METRICS_PREFIX)),
                TOKEN_BUCKETS,
            )
        })
        .and_then(|b| b.install())
        .map_err(|e| AppError::configuration(format!("Failed to install metrics exporter: {}", e)))?;

    register_metrics();
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record one pass through the compression pipeline
pub fn record_compression(duration_secs: f64, intent: &str, tokens_used: usize, sentences: usize) {
    counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        "intent" => intent.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        "intent" => intent.to_string()
    )
    .record(duration_secs);

    histogram!(format!("{}_compression_tokens_used", METRICS_PREFIX)).record(tokens_used as f64);
    histogram!(format!("{}_compression_sentences", METRICS_PREFIX)).record(sentences as f64);
}

/// Helper to record embedding metrics
pub fn record_embedding(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_embedding_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

/// Helper to record answer generation metrics
pub fn record_generation(duration_secs: f64, provider: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        "provider" => provider.to_string()
    )
    .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, TOKEN_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
        // Default token budget should land on a bucket boundary
        assert!(TOKEN_BUCKETS.contains(&500.0));
    }

    #[test]
    fn test_disabled_exporter_is_noop() {
        assert!(install_prometheus_exporter(0).is_ok());
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("POST", "/v1/query");
        metrics.finish(200);
        record_compression(0.01, "RESULT", 120, 4);
        record_embedding(0.02, "hashing-384", true);
        record_generation(0.5, "gemini", false);
    }
}
