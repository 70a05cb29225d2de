use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/interview/start", post(handlers::start_interview))
        .route("/interview/answer", post(handlers::submit_answer))
        .route("/interview/listen", post(handlers::listen))
        .route("/interview/end", post(handlers::end_interview))
        .route("/interview/restart", post(handlers::restart))
        // Edge feeds (recognized speech, camera frames)
        .route("/interview/utterance", post(handlers::push_utterance))
        .route("/interview/frame", post(handlers::push_frame))
        // Session queries
        .route("/interview/status", get(handlers::interview_status))
        .route("/interview/transcript", get(handlers::interview_transcript))
        // Browser edge needs CORS; add tracing middleware for request logging
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
