//! Core engine for the unmix stem-separation service.
//!
//! This crate owns everything between the HTTP surface and the external
//! separation tool:
//!
//! - [`WorkspaceManager`]: per-request temporary directories with guaranteed
//!   cleanup on every exit path
//! - [`Separator`]: invocation of the external tool and discovery of its
//!   output tree
//! - [`SessionStore`]: the shared in-memory map of completed separations,
//!   with TTL-based eviction
//!
//! The separation model itself is a black box; the engine only knows its
//! command-line contract and output layout.

pub mod error;
pub mod separator;
pub mod store;
pub mod types;
pub mod workspace;

pub use error::{EngineError, Result};
pub use separator::{Separator, SeparatorConfig};
pub use store::{DEFAULT_SESSION_TTL, SessionStore};
pub use types::{Session, SessionId, Stem, StemMap};
pub use workspace::{Workspace, WorkspaceManager};
