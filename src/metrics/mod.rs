/// Prometheus metrics for the search platform.
///
/// Metrics are process-wide statics registered once with [`init_metrics`].
/// Updating an unregistered metric is harmless, so library code records
/// unconditionally and only the binary decides whether to register and expose.
///
/// # Example
/// ```no_run
/// use alumni_search::metrics::SEARCH_REQUESTS_TOTAL;
///
/// SEARCH_REQUESTS_TOTAL.with_label_values(&["text"]).inc();
/// ```
use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
};

const NAMESPACE: &str = "alumni_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Search Metrics
    // ============================================================================

    /// Search requests served
    ///
    /// Labels: mode (text, browse)
    pub static ref SEARCH_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("search_requests_total", "Total number of search requests")
            .namespace(NAMESPACE),
        &["mode"]
    ).expect("Failed to create SEARCH_REQUESTS_TOTAL metric");

    /// Search latency in seconds
    pub static ref SEARCH_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("search_duration_seconds", "Search duration in seconds")
            .namespace(NAMESPACE)
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
    ).expect("Failed to create SEARCH_DURATION_SECONDS metric");

    /// Failed searches
    ///
    /// Labels: kind (error code)
    pub static ref SEARCH_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("search_errors_total", "Total number of failed searches")
            .namespace(NAMESPACE),
        &["kind"]
    ).expect("Failed to create SEARCH_ERRORS_TOTAL metric");

    // ============================================================================
    // Indexing Metrics
    // ============================================================================

    /// Active documents in the index
    ///
    /// Labels: content_type
    pub static ref INDEX_DOCUMENTS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("index_documents", "Active documents in the search index")
            .namespace(NAMESPACE),
        &["content_type"]
    ).expect("Failed to create INDEX_DOCUMENTS metric");

    /// Content sources that failed after all retries
    ///
    /// Labels: content_type
    pub static ref INDEXING_SOURCE_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("indexing_source_failures_total", "Content sources that failed to load")
            .namespace(NAMESPACE),
        &["content_type"]
    ).expect("Failed to create INDEXING_SOURCE_FAILURES_TOTAL metric");

    // ============================================================================
    // Analytics Metrics
    // ============================================================================

    /// Analytics events recorded
    ///
    /// Labels: kind
    pub static ref ANALYTICS_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("analytics_events_total", "Analytics events recorded")
            .namespace(NAMESPACE),
        &["kind"]
    ).expect("Failed to create ANALYTICS_EVENTS_TOTAL metric");

    /// Analytics, history or preferences writes that failed and were dropped
    pub static ref ANALYTICS_FAILURES_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("analytics_failures_total", "Dropped analytics writes")
            .namespace(NAMESPACE),
    ).expect("Failed to create ANALYTICS_FAILURES_TOTAL metric");
}

/// Register every metric with the global registry.
///
/// Fails with `AlreadyReg` when called twice.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_ERRORS_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(INDEX_DOCUMENTS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INDEXING_SOURCE_FAILURES_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(ANALYTICS_EVENTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ANALYTICS_FAILURES_TOTAL.clone()))?;

    tracing::debug!("Prometheus metrics registered");
    Ok(())
}

/// Render all registered metrics in the Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_after_init() {
        // The registry is global; another test may have registered first
        let _ = init_metrics();
        SEARCH_REQUESTS_TOTAL.with_label_values(&["browse"]).inc();

        let rendered = gather_metrics();
        assert!(rendered.contains("alumni_search_search_requests_total"));
    }
}
