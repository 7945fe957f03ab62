use super::state::AppState;
use crate::error::RecorderError;
use crate::session::{RawInterruption, RecordingOptions, RecordingStatus};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: RecordingStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptionEndedRequest {
    #[serde(default)]
    pub should_resume: bool,
}

impl IntoResponse for RecorderError {
    fn into_response(self) -> Response {
        let status = match &self {
            RecorderError::PermissionDenied => StatusCode::FORBIDDEN,
            RecorderError::AlreadyRecording => StatusCode::CONFLICT,
            RecorderError::NotRecording => StatusCode::NOT_FOUND,
            RecorderError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                code: self.code().to_string(),
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recording/start
pub async fn start_recording(
    State(state): State<AppState>,
    Json(options): Json<RecordingOptions>,
) -> Result<Json<ValueResponse>, RecorderError> {
    info!("Start requested: {:?}", options);
    state.controller.start(options).await.map_err(|e| {
        error!("Failed to start recording: {}", e);
        e
    })?;
    Ok(Json(ValueResponse { value: true }))
}

/// POST /recording/pause
pub async fn pause_recording(State(state): State<AppState>) -> Json<ValueResponse> {
    Json(ValueResponse {
        value: state.controller.pause().await,
    })
}

/// POST /recording/resume
pub async fn resume_recording(State(state): State<AppState>) -> Json<ValueResponse> {
    Json(ValueResponse {
        value: state.controller.resume().await,
    })
}

/// POST /recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.controller.stop().await {
        Ok(data) => {
            info!("Recording stopped ({}ms, {})", data.duration_ms, data.mime_type);
            (StatusCode::OK, Json(data)).into_response()
        }
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            e.into_response()
        }
    }
}

/// GET /recording/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.controller.get_current_status().await,
    })
}

/// POST /interruptions/began
pub async fn interruption_began(State(state): State<AppState>) -> StatusCode {
    state.interruptions.post(RawInterruption::Began);
    StatusCode::ACCEPTED
}

/// POST /interruptions/ended
pub async fn interruption_ended(
    State(state): State<AppState>,
    body: Option<Json<InterruptionEndedRequest>>,
) -> StatusCode {
    let should_resume = body.map(|Json(req)| req.should_resume).unwrap_or_default();
    state
        .interruptions
        .post(RawInterruption::Ended { should_resume });
    StatusCode::ACCEPTED
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
