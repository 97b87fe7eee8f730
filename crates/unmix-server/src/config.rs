//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use unmix_engine::{DEFAULT_SESSION_TTL, SeparatorConfig};

/// Default listening port. Overridable via the `PORT` environment variable
/// in the CLI (Hugging Face Spaces convention).
pub const DEFAULT_PORT: u16 = 7860;

/// Upload extensions accepted by the submission endpoint, matched
/// case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "ogg", "m4a", "aac"];

/// Default max upload size (512 MiB). axum's stock multipart limit of 2 MiB
/// is far too small for audio files.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 512 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Directory holding the prebuilt frontend bundle.
    pub static_dir: PathBuf,

    /// Time-to-live after which an unreferenced session is evicted.
    pub session_ttl: Duration,

    /// Maximum upload body size in bytes.
    pub max_upload_size: usize,

    /// External separation command configuration.
    pub separator: SeparatorConfig,

    /// Parent directory for per-request workspaces. `None` uses the system
    /// temp dir.
    pub workspace_root: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            static_dir: PathBuf::from("dist"),
            session_ttl: DEFAULT_SESSION_TTL,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            separator: SeparatorConfig::default(),
            workspace_root: None,
        }
    }
}

impl ServerConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the frontend bundle directory.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Set the session time-to-live.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the maximum upload size.
    pub fn with_max_upload_size(mut self, size: usize) -> Self {
        self.max_upload_size = size;
        self
    }

    /// Set the separation command configuration.
    pub fn with_separator(mut self, separator: SeparatorConfig) -> Self {
        self.separator = separator;
        self
    }

    /// Set the parent directory for per-request workspaces.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }
}
