//! unmix - Audio Stem-Separation Server
//!
//! Main entry point for the unmix CLI.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use unmix_engine::SeparatorConfig;
use unmix_server::{DEFAULT_PORT, Server, ServerConfig};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// unmix - split uploaded audio into stems over HTTP
#[derive(Parser)]
#[command(name = "unmix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Directory holding the prebuilt frontend bundle
    #[arg(long, default_value = "dist")]
    pub static_dir: PathBuf,

    /// Separation executable to invoke
    #[arg(long, default_value = "demucs")]
    pub command: String,

    /// Directory of bundled helper binaries prepended to the tool's PATH
    #[arg(long, default_value = "ffmpeg/bin")]
    pub tool_dir: PathBuf,

    /// Parent directory for per-request workspaces (default: system temp dir)
    #[arg(long)]
    pub workspace_root: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "unmix=debug,unmix_engine=debug,unmix_server=debug,info"
    } else {
        "unmix=info,unmix_engine=info,unmix_server=info,warn"
    };

    let file_appender = tracing_appender::rolling::daily("logs", "unmix.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "unmix=trace,unmix_engine=trace,unmix_server=trace,info",
                )),
        )
        .init();

    let separator = SeparatorConfig::default()
        .with_command(cli.command)
        .with_tool_dir(Some(cli.tool_dir));

    let mut config = ServerConfig::new()
        .with_bind_address(SocketAddr::new(cli.host, cli.port))
        .with_static_dir(cli.static_dir)
        .with_separator(separator);
    if let Some(root) = cli.workspace_root {
        config = config.with_workspace_root(root);
    }

    info!(port = cli.port, "Starting unmix server");

    Server::new(config).run().await?;

    Ok(())
}
