use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and register all feed metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// If a global recorder is already installed (tests build several apps in one
/// process) the new recorder is not installed and its handle renders empty.
pub fn init_metrics() -> PrometheusHandle {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::debug!("Metrics recorder already installed");
        return handle;
    }

    // Pre-register counters so they appear even before the first increment.
    counter!("feed_polls_total").absolute(0);
    counter!("feed_poll_failures_total").absolute(0);
    counter!("feed_trades_merged_total").absolute(0);
    counter!("feed_resets_total").absolute(0);
    counter!("feed_stale_results_total").absolute(0);

    gauge!("feed_buffer_len").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("feed_poll_latency_seconds").record(0.0);

    handle
}
