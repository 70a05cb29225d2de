use super::state::AppState;
use crate::error::Error;
use crate::motion::VideoFrame;
use crate::session::{Message, Phase, Session};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewRequest {
    pub role: String,
    pub tech_stack: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UtteranceRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    /// Base64-encoded RGB bytes, 3 per pixel
    pub pixels: String,
}

#[derive(Debug, Serialize)]
pub struct InterviewResponse {
    pub interview_id: String,
    pub phase: &'static str,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ListenResponse {
    pub recognized: String,
    pub phase: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub feedback: String,
    pub phase: &'static str,
}

/// Snapshot of the session for the status endpoint
#[derive(Debug, Serialize)]
pub struct InterviewStatus {
    pub phase: &'static str,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub message_count: usize,
    pub motion_percentage: f64,
    pub feedback_ready: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(e: Error) -> Response {
    let status = match &e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Capture(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Auth => StatusCode::UNAUTHORIZED,
        Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        Error::Device(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

fn interview_response(session: Session) -> InterviewResponse {
    InterviewResponse {
        interview_id: session.id,
        phase: session.phase.label(),
        messages: session.messages,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interview/start
/// Start a new practice interview for a role and tech stack
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Response {
    info!("Starting interview: {} / {}", req.role, req.tech_stack);

    match state
        .coordinator
        .start_session(&req.role, &req.tech_stack)
        .await
    {
        Ok(session) => (StatusCode::OK, Json(interview_response(session))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/answer
/// Submit a typed answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Response {
    if let Err(e) = state.coordinator.submit_answer(&req.text).await {
        return error_response(e);
    }

    match state.coordinator.snapshot().await {
        Some(session) => (StatusCode::OK, Json(interview_response(session))).into_response(),
        None => error_response(Error::Validation("No interview in progress.".into())),
    }
}

/// POST /interview/listen
/// Run one voice capture round and submit the recognized answer
pub async fn listen(State(state): State<AppState>) -> Response {
    match state.coordinator.begin_listening().await {
        Ok(recognized) => {
            let phase = state
                .coordinator
                .snapshot()
                .await
                .map(|s| s.phase.label())
                .unwrap_or(Phase::Setup.label());
            (StatusCode::OK, Json(ListenResponse { recognized, phase })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /interview/utterance
/// Edge-recognized speech feeding the outstanding capture
pub async fn push_utterance(
    State(state): State<AppState>,
    Json(req): Json<UtteranceRequest>,
) -> Response {
    match state.utterances.push(req.text).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusMessage {
                status: "accepted".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/frame
/// Edge camera frame for motion sampling
pub async fn push_frame(State(state): State<AppState>, Json(req): Json<FrameRequest>) -> Response {
    let pixels = match base64::engine::general_purpose::STANDARD.decode(&req.pixels) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Rejecting frame with invalid pixel encoding: {}", e);
            return error_response(Error::Validation("Pixel data is not valid base64.".into()));
        }
    };

    let frame = VideoFrame::new(req.width, req.height, pixels);
    if !frame.is_well_formed() {
        return error_response(Error::Validation(
            "Pixel data does not match the declared dimensions.".into(),
        ));
    }

    state.frames.push(frame);
    (
        StatusCode::OK,
        Json(StatusMessage {
            status: "accepted".to_string(),
        }),
    )
        .into_response()
}

/// POST /interview/end
/// End the interview and generate feedback
pub async fn end_interview(State(state): State<AppState>) -> Response {
    match state.coordinator.end_session().await {
        Ok(feedback) => (
            StatusCode::OK,
            Json(EndResponse {
                feedback,
                phase: Phase::Feedback.label(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /interview/restart
/// Discard the session and return to setup
pub async fn restart(State(state): State<AppState>) -> Response {
    state.coordinator.restart().await;
    (
        StatusCode::OK,
        Json(StatusMessage {
            status: Phase::Setup.label().to_string(),
        }),
    )
        .into_response()
}

/// GET /interview/status
/// Phase, timing, transcript size, and latest motion score
pub async fn interview_status(State(state): State<AppState>) -> Response {
    let motion_percentage = state.coordinator.motion().await;

    let status = match state.coordinator.snapshot().await {
        Some(session) => InterviewStatus {
            phase: session.phase.label(),
            started_at: Some(session.started_at),
            duration_secs: session.duration_secs(),
            message_count: session.messages.len(),
            motion_percentage,
            feedback_ready: session.phase == Phase::Feedback,
        },
        None => InterviewStatus {
            phase: Phase::Setup.label(),
            started_at: None,
            duration_secs: 0.0,
            message_count: 0,
            motion_percentage,
            feedback_ready: false,
        },
    };

    (StatusCode::OK, Json(status)).into_response()
}

/// GET /interview/transcript
/// Ordered conversation messages
pub async fn interview_transcript(State(state): State<AppState>) -> Response {
    match state.coordinator.snapshot().await {
        Some(session) => (StatusCode::OK, Json(session.messages)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No interview in progress.".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
