//! Error types for the engine.

use thiserror::Error;

/// Errors produced by workspace management and separation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A workspace directory could not be created or removed.
    #[error("Workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    /// I/O failure while staging the input or reading stem files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The separation tool could not be spawned at all.
    #[error("Failed to launch separation tool '{command}': {source}")]
    ToolLaunch {
        /// Executable that failed to spawn.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The separation tool exited with a non-zero status.
    ///
    /// `diagnostics` carries both captured streams, labeled by origin;
    /// the tool's useful error text lands unpredictably in either one.
    #[error("Separation failed with exit code {exit_code}: {diagnostics}")]
    ToolFailed {
        /// Exit code of the tool (`-1` if killed by a signal).
        exit_code: i32,
        /// Combined stdout/stderr capture.
        diagnostics: String,
    },

    /// The tool exited 0 but produced no matching output directory.
    #[error("Output files not found")]
    OutputMissing,

    /// The output directory contained none of the expected stem files.
    #[error("No separated tracks found")]
    NoStems,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
