//! HTTP API server for unmix.
//!
//! This crate provides the network transport layer for the stem-separation
//! engine: a REST API for submitting audio, downloading stems, and cleaning
//! up sessions, plus a static fallback that serves the bundled single-page
//! frontend.
//!
//! # Example
//!
//! ```ignore
//! use unmix_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new()
//!     .with_bind_address("0.0.0.0:7860".parse()?);
//!
//! let server = Server::new(config);
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ALLOWED_EXTENSIONS, DEFAULT_PORT, ServerConfig};
pub use error::{ErrorResponse, Result, ServerError};
pub use routes::{CleanupResponse, HealthResponse, SeparateResponse};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

/// The unmix HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let static_dir = &self.state.config.static_dir;
        // Unmatched paths fall through to the SPA bundle; unknown routes
        // serve the entry document so client-side routing keeps working.
        let spa = ServeDir::new(static_dir)
            .not_found_service(ServeFile::new(static_dir.join("index.html")));

        Router::new()
            .nest("/api", self.api_routes())
            .fallback_service(spa)
            .layer(DefaultBodyLimit::max(self.state.config.max_upload_size))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// API routes.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route("/separate", post(routes::separate_handler))
            .route(
                "/download/{session_id}/{track_name}",
                get(routes::download_handler),
            )
            .route("/cleanup/{session_id}", post(routes::cleanup_handler))
            .route("/health", get(routes::health_handler))
            .route("/openapi.json", get(routes::openapi_handler))
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {e}")))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {e}")))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
