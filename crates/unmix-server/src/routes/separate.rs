//! Audio submission endpoint.
//!
//! The full request lifecycle lives here: sweep expired sessions, validate
//! the upload, stage it into a fresh workspace, invoke the external tool,
//! and publish the resulting session. Every failure path after workspace
//! acquisition releases the workspace before the error response goes out.

use std::collections::HashMap;
use std::path::Path;

use axum::{
    Json,
    extract::{Multipart, State},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use unmix_engine::{EngineError, Stem, StemMap};

use crate::config::ALLOWED_EXTENSIONS;
use crate::error::ServerError;
use crate::state::AppState;

/// Multipart form field carrying the upload.
const AUDIO_FIELD: &str = "audio";

/// Response for a successful separation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeparateResponse {
    /// Always `true` on a 200.
    pub success: bool,
    /// Retrieval URL per discovered stem.
    pub tracks: HashMap<String, String>,
    /// Handle for download and cleanup calls.
    pub session_id: String,
}

/// POST /api/separate - Split an uploaded audio file into stems.
#[utoipa::path(
    post,
    path = "/api/separate",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Form with an `audio` file field"),
    responses(
        (status = 200, description = "Separation complete", body = SeparateResponse),
        (status = 400, description = "Missing or invalid file", body = crate::error::ErrorResponse),
        (status = 500, description = "Separation or workspace failure", body = crate::error::ErrorResponse),
    ),
    tag = "separation"
)]
pub async fn separate_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SeparateResponse>, ServerError> {
    // Lazy expiry: every submission starts by reaping old sessions.
    state.sessions.sweep_expired().await;

    let (filename, data) = read_upload(multipart).await?;
    if filename.is_empty() {
        return Err(ServerError::BadRequest("No file selected".to_string()));
    }
    if !has_allowed_extension(&filename) {
        return Err(ServerError::BadRequest("Invalid file format".to_string()));
    }
    let filename = sanitize_filename(&filename);

    let mut workspace = state.workspaces.acquire()?;
    let stems = match run_separation(&state, workspace.path(), &filename, &data).await {
        Ok(stems) => stems,
        Err(e) => {
            // The error path must never leak the workspace. The original
            // failure wins over a secondary release failure.
            if let Err(release_err) = workspace.release().await {
                warn!(error = %release_err, "Failed to release workspace after error");
            }
            return Err(e);
        }
    };

    let stem_names: Vec<Stem> = Stem::ALL
        .into_iter()
        .filter(|s| stems.contains_key(s))
        .collect();
    let session_id = state.sessions.publish(filename, stems, workspace).await;

    let tracks = stem_names
        .into_iter()
        .map(|stem| {
            (
                stem.to_string(),
                format!("/api/download/{session_id}/{stem}"),
            )
        })
        .collect();

    Ok(Json(SeparateResponse {
        success: true,
        tracks,
        session_id: session_id.to_string(),
    }))
}

/// Pull the `audio` field out of the multipart form.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes), ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read upload: {e}")))?;
        return Ok((filename, data));
    }

    Err(ServerError::BadRequest("No audio file provided".to_string()))
}

/// Stage the upload and run the external tool inside the workspace.
async fn run_separation(
    state: &AppState,
    workspace: &Path,
    filename: &str,
    data: &Bytes,
) -> Result<StemMap, ServerError> {
    let input_path = workspace.join(filename);
    tokio::fs::write(&input_path, data)
        .await
        .map_err(EngineError::Io)?;

    let output_dir = workspace.join("separated");
    let stems = state.separator.separate(&input_path, &output_dir).await?;
    Ok(stems)
}

/// Whether the filename carries an extension from the allowed set.
fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Strip path components and replace anything outside `[A-Za-z0-9._-]`
/// with underscores. The result is used both on disk and in download names.
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");

    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
