//! HTTP API server for the device/browser edge
//!
//! This module provides the REST control surface for one practice session:
//! - POST /interview/start - Start a practice interview
//! - POST /interview/answer - Submit a typed answer
//! - POST /interview/listen - Run one voice capture round
//! - POST /interview/utterance - Edge-recognized speech
//! - POST /interview/frame - Edge camera frame for motion sampling
//! - POST /interview/end - End and generate feedback
//! - POST /interview/restart - Discard and return to setup
//! - GET /interview/status - Phase, timing, motion score
//! - GET /interview/transcript - Ordered messages
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
