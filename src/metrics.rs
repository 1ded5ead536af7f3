use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("records_ingested_total", "Records pulled from the source.");
        describe_counter!(
            "records_empty_total",
            "Records that produced no tokens after normalization and filtering."
        );
        describe_counter!(
            "tokens_emitted_total",
            "Tokens routed to a sentiment partition."
        );
        describe_counter!(
            "tokens_late_total",
            "Tokens dropped because their window had already closed."
        );
        describe_counter!("windows_closed_total", "Windows closed by tick, roll or drain.");
        describe_counter!(
            "windows_published_total",
            "Windows successfully handed to the sink."
        );
        describe_counter!("sink_publish_errors_total", "Failed sink publish calls.");
        describe_gauge!("open_windows", "Currently open windows across partitions.");
        describe_histogram!(
            "window_distinct_words",
            "Distinct words counted in a closed window."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
