use super::state::AppState;
use crate::error::SpeechError;
use crate::interview::{InterviewStats, InterviewTranslationSession, TranslationMessage};
use crate::speech::{SessionController, SessionSnapshot, SessionState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartInterviewRequest {
    /// Optional interview ID (if not provided, generate UUID)
    pub interview_id: Option<String>,

    /// Staff (primary) language; falls back to the configured default
    pub staff_language: Option<String>,

    pub client_language: Option<String>,

    pub candidate_languages: Option<Vec<String>>,

    pub fast_mode: Option<bool>,

    pub max_duration_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: String,
    pub session_id: uuid::Uuid,
    pub state: SessionState,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub interview_id: String,
    pub state: SessionState,
}

#[derive(Debug, Serialize)]
pub struct StopInterviewResponse {
    pub interview_id: String,
    pub state: SessionState,
    pub message: String,
    pub stats: InterviewStats,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub interview_id: String,
    pub session: SessionSnapshot,
    pub stats: InterviewStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn not_found(interview_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview {} not found", interview_id),
    )
}

/// Map a session failure to a status code; the body carries the user-facing message
fn speech_error_response(err: &SpeechError) -> Response {
    let status = match err {
        SpeechError::Permission { .. } => StatusCode::FORBIDDEN,
        SpeechError::Quota { .. } => StatusCode::TOO_MANY_REQUESTS,
        SpeechError::NotStarted => StatusCode::CONFLICT,
        SpeechError::NoMatch => StatusCode::UNPROCESSABLE_ENTITY,
        SpeechError::ControllerClosed => StatusCode::INTERNAL_SERVER_ERROR,
        SpeechError::Network { .. }
        | SpeechError::RetriesExhausted { .. }
        | SpeechError::UnexpectedTermination
        | SpeechError::Provider { .. } => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews/start
/// Start a new interview translation session
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> impl IntoResponse {
    let interview_id = req
        .interview_id
        .clone()
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    info!("Starting interview: {}", interview_id);

    // A stopped interview may be replaced; a live one may not
    if let Some(existing) = state.get(&interview_id).await {
        if existing.controller().state() != SessionState::Stopped {
            return error_response(
                StatusCode::CONFLICT,
                format!("Interview {} is already running", interview_id),
            );
        }
    }

    let services = &state.services;
    let mut config = services.defaults.clone();
    if let Some(language) = req.staff_language {
        config.staff_language = language;
    }
    if let Some(language) = req.client_language {
        config.client_language = language;
    }
    if let Some(candidates) = req.candidate_languages {
        config.candidate_languages = candidates;
    }
    if let Some(fast_mode) = req.fast_mode {
        config.fast_mode = fast_mode;
    }
    if req.max_duration_seconds.is_some() {
        config.max_duration_seconds = req.max_duration_seconds;
    }

    let controller =
        SessionController::spawn(Arc::clone(&services.connector), services.settings.clone());
    let session = Arc::new(InterviewTranslationSession::new(
        controller,
        Arc::clone(&services.translator),
        Arc::clone(&services.synthesizer),
        config,
    ));

    let session_id = match session.start().await {
        Ok(id) => id,
        Err(e) => {
            error!(
                "Failed to start interview {}: {} ({})",
                interview_id,
                e,
                e.detail().unwrap_or_default()
            );
            return speech_error_response(&e);
        }
    };

    // Store session
    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(interview_id.clone(), Arc::clone(&session));
    }

    info!("Interview {} started (session {})", interview_id, session_id);

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            interview_id: interview_id.clone(),
            session_id,
            state: session.controller().state(),
            message: format!("Interview {} started", interview_id),
        }),
    )
        .into_response()
}

/// POST /interviews/:interview_id/pause
pub async fn pause_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = state.get(&interview_id).await else {
        return not_found(&interview_id);
    };

    match session.pause().await {
        Ok(()) => control_response(interview_id, &session),
        Err(e) => {
            warn!("Failed to pause interview {}: {}", interview_id, e);
            speech_error_response(&e)
        }
    }
}

/// POST /interviews/:interview_id/resume
pub async fn resume_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let Some(session) = state.get(&interview_id).await else {
        return not_found(&interview_id);
    };

    match session.resume().await {
        Ok(()) => control_response(interview_id, &session),
        Err(e) => {
            warn!("Failed to resume interview {}: {}", interview_id, e);
            speech_error_response(&e)
        }
    }
}

fn control_response(interview_id: String, session: &InterviewTranslationSession) -> Response {
    (
        StatusCode::OK,
        Json(ControlResponse {
            interview_id,
            state: session.controller().state(),
        }),
    )
        .into_response()
}

/// POST /interviews/:interview_id/stop
/// Stop an interview; its transcript stays available
pub async fn stop_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping interview: {}", interview_id);

    let Some(session) = state.get(&interview_id).await else {
        error!("Interview {} not found", interview_id);
        return not_found(&interview_id);
    };

    match session.stop().await {
        Ok(stats) => {
            info!(
                "Interview {} stopped ({} messages)",
                interview_id, stats.message_count
            );
            (
                StatusCode::OK,
                Json(StopInterviewResponse {
                    interview_id,
                    state: stats.state,
                    message: "Interview stopped".to_string(),
                    stats,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to stop interview {}: {}", interview_id, e);
            speech_error_response(&e)
        }
    }
}

/// GET /interviews/:interview_id/status
pub async fn get_interview_status(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    match state.get(&interview_id).await {
        Some(session) => {
            let stats = session.stats().await;
            (
                StatusCode::OK,
                Json(StatusResponse {
                    interview_id,
                    session: session.controller().snapshot(),
                    stats,
                }),
            )
                .into_response()
        }
        None => not_found(&interview_id),
    }
}

/// GET /interviews/:interview_id/transcript
/// Bilingual transcript accumulated so far
pub async fn get_interview_transcript(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    match state.get(&interview_id).await {
        Some(session) => {
            let transcript: Vec<TranslationMessage> = session.messages().await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// GET /interviews/:interview_id/preview
/// Live translation of the utterance in progress; 204 when there is none
pub async fn get_interview_preview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    match state.get(&interview_id).await {
        Some(session) => match session.preview().await {
            Some(preview) => (StatusCode::OK, Json(preview)).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
        None => not_found(&interview_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
