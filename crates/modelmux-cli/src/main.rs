//! CLI entry point - the composition root.
//!
//! Parses flags, loads the environment and hands off to the Axum adapter.

use std::path::PathBuf;

use clap::Parser;

use modelmux_axum::{start_server, ServerConfig};

/// OpenAI-compatible virtual model emulator.
#[derive(Debug, Parser)]
#[command(name = "modelmux", version, about)]
struct Cli {
    /// Port to listen on (overrides the PORT variable and the stored
    /// configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the emulator's JSON configuration documents
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Path to the config UI assets; auto-detected from ./public when
    /// omitted
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Serve API endpoints only, without the config UI
    #[arg(long)]
    api_only: bool,
}

fn resolve_static_dir(cli: &Cli) -> Option<PathBuf> {
    if cli.api_only {
        return None;
    }
    if let Some(ref dir) = cli.static_dir {
        return Some(dir.clone());
    }
    let candidate = PathBuf::from("public");
    if candidate.join("config.html").exists() {
        return Some(candidate);
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables (provider API keys live here)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ServerConfig::new(&cli.config_dir).with_port(cli.port);
    if let Some(dir) = resolve_static_dir(&cli) {
        config = config.with_static_dir(dir);
    }

    start_server(config).await
}
