//! Stem download and explicit session cleanup endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use unmix_engine::{SessionId, Stem};

use crate::error::ServerError;
use crate::state::AppState;

/// Response for an explicit cleanup.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanupResponse {
    /// Always `true` on a 200.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
}

/// GET /api/download/{session_id}/{track_name} - Download one stem.
#[utoipa::path(
    get,
    path = "/api/download/{session_id}/{track_name}",
    params(
        ("session_id" = String, Path, description = "Session handle returned by /api/separate"),
        ("track_name" = String, Path, description = "One of vocals, drums, bass, other"),
    ),
    responses(
        (status = 200, description = "Raw stem audio", body = Vec<u8>, content_type = "audio/wav"),
        (status = 404, description = "Unknown session or track", body = crate::error::ErrorResponse),
    ),
    tag = "separation"
)]
pub async fn download_handler(
    State(state): State<AppState>,
    Path((session_id, track_name)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let id = parse_session_id(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;
    let stem = Stem::from_name(&track_name)
        .ok_or_else(|| ServerError::NotFound(format!("Track '{track_name}' not found")))?;

    // One read-lock access: the session is either fully visible or fully
    // absent relative to an in-flight remove.
    let found = state
        .sessions
        .with_session(id, |s| s.stem(stem).map(|data| (s.download_name(stem), data)))
        .await;

    match found {
        None => Err(session_not_found(&session_id)),
        Some(None) => Err(ServerError::NotFound(format!(
            "Track '{track_name}' not found"
        ))),
        Some(Some((download_name, data))) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&format!("attachment; filename=\"{download_name}\""))
                    .map_err(|e| ServerError::Internal(format!("Bad download name: {e}")))?,
            );
            Ok((headers, data).into_response())
        }
    }
}

/// POST /api/cleanup/{session_id} - Remove a session and its workspace.
#[utoipa::path(
    post,
    path = "/api/cleanup/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session handle returned by /api/separate"),
    ),
    responses(
        (status = 200, description = "Session removed", body = CleanupResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorResponse),
    ),
    tag = "separation"
)]
pub async fn cleanup_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CleanupResponse>, ServerError> {
    let id = parse_session_id(&session_id)
        .ok_or_else(|| session_not_found(&session_id))?;

    if state.sessions.remove(id).await {
        Ok(Json(CleanupResponse {
            success: true,
            message: "Session cleaned up".to_string(),
        }))
    } else {
        Err(session_not_found(&session_id))
    }
}

/// A malformed id can never name a live session, so it reads as absent
/// rather than as a bad request.
fn parse_session_id(s: &str) -> Option<SessionId> {
    uuid::Uuid::parse_str(s).ok().map(SessionId::from_uuid)
}

fn session_not_found(session_id: &str) -> ServerError {
    ServerError::NotFound(format!("Session '{session_id}' not found or expired"))
}
