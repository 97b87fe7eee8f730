//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use unmix_engine::SeparatorConfig;
use unmix_server::{Server, ServerConfig};

/// A stand-in separation tool that copies the input into all four stems,
/// mimicking the real tool's nested output layout.
pub const COPYING_TOOL: &str = r#"
out="$4"
input="$5"
base=$(basename "$input")
base="${base%.*}"
mkdir -p "$out/htdemucs/$base"
for stem in vocals drums bass other; do
    cp "$input" "$out/htdemucs/$base/$stem.wav"
done
"#;

/// A stand-in tool that exits 0 without producing any output.
pub const SILENT_TOOL: &str = "exit 0\n";

/// A stand-in tool that fails loudly on both streams.
pub const FAILING_TOOL: &str = "echo 'loading model'\necho 'separation blew up' >&2\nexit 2\n";

/// A test server that runs in the background against a stand-in tool.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client for this server.
    pub client: Client,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
    /// Temporary directory holding the tool, bundle, and workspaces.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a test server whose tool succeeds, with a 1 hour TTL.
    pub async fn start() -> Result<Self> {
        Self::start_with(COPYING_TOOL, Duration::from_secs(3600)).await
    }

    /// Start a test server with a specific tool body and session TTL.
    pub async fn start_with(tool_body: &str, session_ttl: Duration) -> Result<Self> {
        let temp_dir = TempDir::new()?;

        let static_dir = temp_dir.path().join("dist");
        std::fs::create_dir_all(&static_dir)?;
        std::fs::write(static_dir.join("index.html"), "<html>unmix</html>")?;

        let tool = write_tool(temp_dir.path(), tool_body)?;

        let config = ServerConfig::new()
            .with_static_dir(&static_dir)
            .with_session_ttl(session_ttl)
            .with_workspace_root(temp_dir.path().join("work"))
            .with_separator(
                SeparatorConfig::default()
                    .with_command(tool.to_str().unwrap())
                    .with_tool_dir(None),
            );

        let router = Server::new(config).router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            addr,
            client: Client::new(),
            _handle: handle,
            temp_dir,
        })
    }

    /// Base URL of the running server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Whether the stand-in tool was ever invoked.
    pub fn tool_invoked(&self) -> bool {
        self.temp_dir.path().join("fake-demucs.invoked").exists()
    }

    /// Live workspace directories, if any.
    pub fn workspace_dirs(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.temp_dir.path().join("work")) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Upload a named file through `/api/separate`.
    pub async fn separate(&self, filename: &str, data: &[u8]) -> Result<reqwest::Response> {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("audio", part);
        Ok(self
            .client
            .post(format!("{}/api/separate", self.base_url()))
            .multipart(form)
            .send()
            .await?)
    }

    /// Fetch one stem through `/api/download`.
    pub async fn download(&self, session_id: &str, track: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!(
                "{}/api/download/{session_id}/{track}",
                self.base_url()
            ))
            .send()
            .await?)
    }

    /// Remove a session through `/api/cleanup`.
    pub async fn cleanup(&self, session_id: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}/api/cleanup/{session_id}", self.base_url()))
            .send()
            .await?)
    }

    /// Fetch the health document.
    pub async fn health(&self) -> Result<serde_json::Value> {
        Ok(self
            .client
            .get(format!("{}/api/health", self.base_url()))
            .send()
            .await?
            .json()
            .await?)
    }
}

/// Write an executable shell script standing in for the separation tool.
/// Every run leaves an `.invoked` marker next to the script.
fn write_tool(dir: &Path, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-demucs");
    std::fs::write(&path, format!("#!/bin/sh\ntouch \"$0.invoked\"\n{body}"))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
