//! Core types for the engine.
//!
//! This module defines the fundamental types used throughout the engine:
//! - [`SessionId`]: opaque handle issued to clients
//! - [`Stem`]: the fixed set of audio components the tool can produce
//! - [`Session`]: one completed separation held in memory

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workspace::Workspace;

// ─────────────────────────────────────────────────────────────────────────────
// ID Types
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stems
// ─────────────────────────────────────────────────────────────────────────────

/// One isolated audio component extracted from a mixed track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stem {
    Vocals,
    Drums,
    Bass,
    Other,
}

impl Stem {
    /// Every stem a model variant may produce. Not all variants produce
    /// all four.
    pub const ALL: [Stem; 4] = [Stem::Vocals, Stem::Drums, Stem::Bass, Stem::Other];

    /// The track name used in URLs and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stem::Vocals => "vocals",
            Stem::Drums => "drums",
            Stem::Bass => "bass",
            Stem::Other => "other",
        }
    }

    /// The file name the external tool writes for this stem.
    pub fn file_name(&self) -> &'static str {
        match self {
            Stem::Vocals => "vocals.wav",
            Stem::Drums => "drums.wav",
            Stem::Bass => "bass.wav",
            Stem::Other => "other.wav",
        }
    }

    /// Parse a track name back into a stem.
    pub fn from_name(name: &str) -> Option<Stem> {
        match name {
            "vocals" => Some(Stem::Vocals),
            "drums" => Some(Stem::Drums),
            "bass" => Some(Stem::Bass),
            "other" => Some(Stem::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from stem to its raw audio payload, held fully in memory.
pub type StemMap = HashMap<Stem, Bytes>;

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// The server-side record of one completed separation.
///
/// A session is created only after the tool succeeded; its stems are
/// write-once. The session exclusively owns its workspace directory until
/// removal, at which point the directory is deleted.
#[derive(Debug)]
pub struct Session {
    /// Opaque unique handle issued to the client.
    pub id: SessionId,
    /// Creation time, used for TTL eviction.
    pub created_at: DateTime<Utc>,
    /// Sanitized name of the uploaded file, used to derive download names.
    pub original_filename: String,
    /// Stem payloads.
    stems: StemMap,
    /// Temp directory owned exclusively by this session.
    pub(crate) workspace: Workspace,
}

impl Session {
    pub(crate) fn new(original_filename: String, stems: StemMap, workspace: Workspace) -> Self {
        Self {
            id: SessionId::new(),
            created_at: Utc::now(),
            original_filename,
            stems,
            workspace,
        }
    }

    /// Clone one stem's payload. `Bytes` clones are reference-counted.
    pub fn stem(&self, stem: Stem) -> Option<Bytes> {
        self.stems.get(&stem).cloned()
    }

    /// The stems this session holds, in canonical order.
    pub fn stem_names(&self) -> Vec<Stem> {
        Stem::ALL
            .into_iter()
            .filter(|s| self.stems.contains_key(s))
            .collect()
    }

    /// Download filename for a stem: `<original_base>_<stem>.wav`.
    pub fn download_name(&self, stem: Stem) -> String {
        let base = Path::new(&self.original_filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("track");
        format!("{base}_{stem}.wav")
    }
}
