use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview control
        .route("/interviews/start", post(handlers::start_interview))
        .route(
            "/interviews/:interview_id/pause",
            post(handlers::pause_interview),
        )
        .route(
            "/interviews/:interview_id/resume",
            post(handlers::resume_interview),
        )
        .route(
            "/interviews/:interview_id/stop",
            post(handlers::stop_interview),
        )
        // Interview queries
        .route(
            "/interviews/:interview_id/status",
            get(handlers::get_interview_status),
        )
        .route(
            "/interviews/:interview_id/transcript",
            get(handlers::get_interview_transcript),
        )
        .route(
            "/interviews/:interview_id/preview",
            get(handlers::get_interview_preview),
        )
        .layer(
            ServiceBuilder::new()
                // Request logging
                .layer(TraceLayer::new_for_http())
                // The browser front end is served from a different origin
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
