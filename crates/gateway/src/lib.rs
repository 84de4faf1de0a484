//! Arogya HTTP Gateway
//!
//! Front end for the question-answering pipeline.
//! Handles:
//! - The landing page and the chat endpoint
//! - Translating every failure into a JSON error body
//! - Observability (logging, metrics, request ids)

pub mod handlers;
pub mod middleware;
pub mod telemetry;

use arogya_common::{config::AppConfig, RagPipeline};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Application state shared across handlers.
///
/// Built once at startup; the pipeline owns the embedding, vector index and
/// generator handles and is only ever read by requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: RagPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    Router::new()
        .route(
            "/",
            get(handlers::pages::index).fallback(handlers::fallback::method_not_allowed),
        )
        .route(
            "/get",
            post(handlers::chat::chat).fallback(handlers::fallback::method_not_allowed),
        )
        .route(
            "/health",
            get(handlers::health::health).fallback(handlers::fallback::method_not_allowed),
        )
        .fallback(handlers::fallback::not_found)
        .layer(axum::middleware::from_fn(middleware::track_requests))
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}
