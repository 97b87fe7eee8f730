//! OpenAPI documentation configuration.

use axum::Json;
use utoipa::OpenApi;

use super::{health, separate, tracks};

/// OpenAPI documentation for the unmix API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "unmix API",
        description = "HTTP API for audio stem separation",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        health::health_handler,
        separate::separate_handler,
        tracks::download_handler,
        tracks::cleanup_handler,
    ),
    components(
        schemas(
            health::HealthResponse,
            separate::SeparateResponse,
            tracks::CleanupResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "separation", description = "Stem separation sessions"),
    )
)]
pub struct ApiDoc;

/// GET /api/openapi.json - The generated OpenAPI document.
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
