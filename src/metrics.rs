use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the stats-rollup
    /// series. Call once, from `main`.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "stats_recounts_total",
            "Successful metric recounts into the newest stats bucket, by source collection"
        );
        describe_counter!(
            "stats_recounts_skipped_total",
            "Recounts skipped because no stats bucket was open yet"
        );
        describe_counter!(
            "stats_recount_failures_total",
            "Recounts dropped because the store was unavailable"
        );
        describe_counter!(
            "stats_buckets_opened_total",
            "Reporting-period buckets opened by the scheduler"
        );

        Self { handle }
    }

    /// Router exposing `/metrics` in Prometheus exposition format.
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
