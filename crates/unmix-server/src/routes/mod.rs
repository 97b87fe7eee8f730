//! API routes.

pub mod health;
pub mod openapi;
pub mod separate;
pub mod tracks;

pub use health::{HealthResponse, health_handler};
pub use openapi::{ApiDoc, openapi_handler};
pub use separate::{SeparateResponse, separate_handler};
pub use tracks::{CleanupResponse, cleanup_handler, download_handler};
