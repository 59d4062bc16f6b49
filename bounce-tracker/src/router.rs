use std::{future::ready, sync::Arc};

use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::pipeline::Pipeline;
use crate::prometheus::{setup_metrics_recorder, track_metrics};
use crate::schedule::Scheduler;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store + Send + Sync>,
    pub pipeline: Arc<Pipeline>,
    pub scheduler: Arc<Scheduler>,
}

pub fn router(
    store: Arc<dyn Store + Send + Sync>,
    pipeline: Arc<Pipeline>,
    scheduler: Arc<Scheduler>,
    enable_metrics: bool,
) -> Router {
    let state = AppState {
        store,
        pipeline,
        scheduler,
    };

    let status_router = Router::new()
        .route("/_readiness", get(|| ready(StatusCode::OK)))
        .route("/_liveness", get(|| ready(StatusCode::OK)));

    let api_router = Router::new()
        .route("/", get(api::root))
        .route("/bounced-emails", get(api::bounced_emails))
        .route("/refresh", get(api::refresh).post(api::refresh))
        .route("/logs", get(api::logs))
        .route("/schedule-info", get(api::schedule_info));

    let router = Router::new()
        .merge(status_router)
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    if enable_metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
