//! Application state shared across handlers.

use std::sync::Arc;

use unmix_engine::{Separator, SessionStore, WorkspaceManager};

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// In-memory session store.
    pub sessions: SessionStore,

    /// Per-request workspace allocator.
    pub workspaces: WorkspaceManager,

    /// External separation tool invoker.
    pub separator: Arc<Separator>,
}

impl AppState {
    /// Create application state from a configuration.
    pub fn new(config: ServerConfig) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        let workspaces = match &config.workspace_root {
            Some(root) => WorkspaceManager::with_root(root),
            None => WorkspaceManager::new(),
        };
        let separator = Arc::new(Separator::new(config.separator.clone()));

        Self {
            config: Arc::new(config),
            sessions,
            workspaces,
            separator,
        }
    }
}
