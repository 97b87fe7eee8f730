//! In-memory session store with TTL-based eviction.
//!
//! The store is the single piece of shared mutable state in the service:
//! a process-wide map from session id to its separated stems. It is an
//! explicit, injectable component rather than a global, so it can be unit
//! tested in isolation and swapped for a persistent backend later.
//!
//! Locking discipline: mutations (`publish`, `remove`, the sweep) serialize
//! on the write lock and release workspaces while holding it, so a reader
//! never observes a half-deleted session. Reads share the read lock. The
//! long-running separation itself happens entirely outside the store; only
//! the final publish step touches it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::types::{Session, SessionId, Stem, StemMap};
use crate::workspace::Workspace;

/// Default session time-to-live (1 hour).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Shared in-memory mapping from session id to completed separations.
///
/// Cloning the store clones a handle to the same underlying map.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store with the given session TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// The configured session TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Whether a session id is live.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    /// Publish a completed separation as a new session and return its
    /// freshly generated id.
    ///
    /// Called only after the tool succeeded; a failed run never becomes a
    /// visible session. Takes ownership of the workspace; from here on the
    /// store is responsible for releasing it exactly once.
    pub async fn publish(
        &self,
        original_filename: impl Into<String>,
        stems: StemMap,
        workspace: Workspace,
    ) -> SessionId {
        let session = Session::new(original_filename.into(), stems, workspace);
        let id = session.id;
        let stem_count = session.stem_names().len();

        let mut sessions = self.inner.write().await;
        sessions.insert(id, session);
        info!(session_id = %id, stems = stem_count, "Session published");
        id
    }

    /// Run `f` against a session if it exists.
    pub async fn with_session<F, R>(&self, id: SessionId, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        self.inner.read().await.get(&id).map(f)
    }

    /// Look up one stem's payload together with its download filename.
    ///
    /// `None` when either the session or the stem is absent.
    pub async fn fetch_stem(&self, id: SessionId, stem: Stem) -> Option<(String, Bytes)> {
        let sessions = self.inner.read().await;
        let session = sessions.get(&id)?;
        let data = session.stem(stem)?;
        Some((session.download_name(stem), data))
    }

    /// Remove a session and release its workspace.
    ///
    /// Returns `false` when the id is unknown. Removal is immediately
    /// visible to subsequent reads.
    pub async fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.inner.write().await;
        let Some(mut session) = sessions.remove(&id) else {
            return false;
        };
        if let Err(e) = session.workspace.release().await {
            warn!(session_id = %id, error = %e, "Failed to release workspace");
        }
        info!(session_id = %id, "Session removed");
        true
    }

    /// Evict sessions older than the TTL, using the current wall clock.
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    /// Evict every session whose age at `now` has reached the TTL, and
    /// release its workspace. Returns the number of evicted sessions.
    ///
    /// Invoked at the start of each separation request (lazy expiry; no
    /// background timer). Taking `now` as an argument lets tests drive
    /// expiry with a synthetic clock.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);

        let mut sessions = self.inner.write().await;
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, s)| now - s.created_at >= ttl)
            .map(|(id, _)| *id)
            .collect();

        let mut evicted = 0;
        for id in expired {
            if let Some(mut session) = sessions.remove(&id) {
                if let Err(e) = session.workspace.release().await {
                    warn!(session_id = %id, error = %e, "Failed to release expired workspace");
                }
                evicted += 1;
            }
        }

        if evicted > 0 {
            info!(evicted, "Expired sessions swept");
        }
        evicted
    }
}
