//! External separation tool invocation.
//!
//! The separation model is a black box: a demucs-compatible executable that
//! takes a device flag, an output directory, and an input file, and writes
//! `<output_dir>/<model>/<input_base_name>/<stem>.wav`. Exit code 0 signals
//! success but does not guarantee output presence, so discovery of the
//! output tree is a separate step with its own failure mode.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::types::{Stem, StemMap};

/// Configuration for the external separation command.
#[derive(Debug, Clone)]
pub struct SeparatorConfig {
    /// Executable name or path.
    pub command: String,
    /// Device selector passed via `--device`.
    pub device: String,
    /// Optional directory holding bundled helper binaries (e.g. a vendored
    /// ffmpeg `bin/`). Prepended to the child's `PATH` when it exists; the
    /// rest of the search path is kept, not replaced.
    pub tool_dir: Option<PathBuf>,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            command: "demucs".to_string(),
            device: "cpu".to_string(),
            tool_dir: Some(PathBuf::from("ffmpeg/bin")),
        }
    }
}

impl SeparatorConfig {
    /// Config with a different executable.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set or clear the bundled tool directory.
    pub fn with_tool_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tool_dir = dir;
        self
    }
}

/// Runs the external separation tool and collects its output stems.
#[derive(Debug, Clone, Default)]
pub struct Separator {
    config: SeparatorConfig,
}

impl Separator {
    /// Create a separator with the given command configuration.
    pub fn new(config: SeparatorConfig) -> Self {
        Self { config }
    }

    /// Run the tool against `input`, writing under `output_dir`, and read
    /// the produced stems into memory.
    ///
    /// This is a blocking, potentially minutes-long operation; callers must
    /// not hold any shared lock across it. The child is not cancelled if
    /// the caller goes away, and no timeout is enforced.
    pub async fn separate(&self, input: &Path, output_dir: &Path) -> Result<StemMap> {
        let mut cmd = Command::new(&self.config.command);
        cmd.arg("--device")
            .arg(&self.config.device)
            .arg("--out")
            .arg(output_dir)
            .arg(input);

        if let Some(path) = self.prepended_path() {
            cmd.env("PATH", path);
        }

        info!(
            command = %self.config.command,
            input = %input.display(),
            "Running separation"
        );

        let output = cmd.output().await.map_err(|e| EngineError::ToolLaunch {
            command: self.config.command.clone(),
            source: e,
        })?;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let diagnostics = combine_diagnostics(&output.stdout, &output.stderr);
            warn!(exit_code, "Separation tool failed");
            return Err(EngineError::ToolFailed {
                exit_code,
                diagnostics,
            });
        }

        let base_name = input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or(EngineError::OutputMissing)?;
        let track_dir = find_track_dir(output_dir, base_name).await?;
        debug!(track_dir = %track_dir.display(), "Separation output discovered");

        read_stems(&track_dir).await
    }

    /// Child `PATH` with the bundled tool directory prepended, or `None`
    /// when no bundled directory is configured or present.
    fn prepended_path(&self) -> Option<OsString> {
        let dir = self.config.tool_dir.as_ref()?;
        if !dir.is_dir() {
            return None;
        }
        let current = std::env::var_os("PATH").unwrap_or_default();
        let mut parts = vec![dir.clone()];
        parts.extend(std::env::split_paths(&current));
        std::env::join_paths(parts).ok()
    }
}

/// Combine captured stdio streams, labeled by origin.
fn combine_diagnostics(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let mut combined = String::new();
    if !stdout.trim().is_empty() {
        combined.push_str("STDOUT: ");
        combined.push_str(stdout.trim_end());
        combined.push('\n');
    }
    if !stderr.trim().is_empty() {
        combined.push_str("STDERR: ");
        combined.push_str(stderr.trim_end());
    }
    combined
}

/// Locate `<output_dir>/<model>/<base_name>`.
///
/// The model directory name is tool configuration this system does not
/// control, so one level of subdirectories is scanned for a child named
/// after the input. An unreadable or absent output directory means the
/// tool produced nothing despite exiting 0.
async fn find_track_dir(output_dir: &Path, base_name: &str) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(output_dir)
        .await
        .map_err(|_| EngineError::OutputMissing)?;

    while let Some(entry) = entries.next_entry().await? {
        let model_dir = entry.path();
        if !model_dir.is_dir() {
            continue;
        }
        let candidate = model_dir.join(base_name);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    Err(EngineError::OutputMissing)
}

/// Read whichever of the expected stem files the model produced.
///
/// Absence of an individual stem is tolerated; an empty result set is not.
async fn read_stems(track_dir: &Path) -> Result<StemMap> {
    let mut stems = StemMap::new();
    for stem in Stem::ALL {
        let path = track_dir.join(stem.file_name());
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(stem = %stem, bytes = data.len(), "Read stem");
                stems.insert(stem, Bytes::from(data));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(stem = %stem, "Stem not produced by this model variant");
            }
            Err(e) => return Err(EngineError::Io(e)),
        }
    }

    if stems.is_empty() {
        return Err(EngineError::NoStems);
    }
    Ok(stems)
}
