// prometheus exporter setup

use std::time::{Duration, Instant};

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

pub const RUNS_TOTAL: &str = "bounce_tracker_runs_total";
pub const RUN_DURATION_SECONDS: &str = "bounce_tracker_run_duration_seconds";
pub const RECORDS_KEPT_TOTAL: &str = "bounce_tracker_records_kept_total";
pub const CAMPAIGNS_SKIPPED_TOTAL: &str = "bounce_tracker_campaigns_skipped_total";
pub const UPSTREAM_REQUESTS_TOTAL: &str = "bounce_tracker_upstream_requests_total";

pub fn report_run_outcome(outcome: &'static str) {
    counter!(RUNS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn report_run_duration(elapsed: Duration) {
    histogram!(RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());
}

pub fn report_records_kept(quantity: u64) {
    counter!(RECORDS_KEPT_TOTAL).increment(quantity);
}

pub fn report_campaign_skipped() {
    counter!(CAMPAIGNS_SKIPPED_TOTAL).increment(1);
}

pub fn report_upstream_request(outcome: &'static str) {
    counter!(UPSTREAM_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const RUN_SECONDS: &[f64] = &[
        0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0,
    ];
    const REQUEST_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(RUN_DURATION_SECONDS.to_string()), RUN_SECONDS)
        .unwrap()
        .set_buckets_for_metric(
            Matcher::Full("http_requests_duration_seconds".to_string()),
            REQUEST_SECONDS,
        )
        .unwrap()
        .install_recorder()
        .unwrap()
}

/// Middleware to record some common HTTP metrics
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
