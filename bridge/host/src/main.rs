//! Bridge Host - Hosting Process for the desktop-audio Control Surface
//!
//! Launches the Audio Engine, connects the bridge, and forwards commands
//! between the engine and the presentation layer on the `audio` channel.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (spawns ./dist/audio)
//! bridge-host
//!
//! # Engine already running elsewhere
//! bridge-host --no-spawn --socket-path /tmp/desktop-audio.sock
//!
//! # With config file
//! bridge-host --config host.toml
//!
//! # Verbose logging
//! RUST_LOG=debug bridge-host
//! ```
//!
//! # Exit status
//!
//! The process exits with status 1 on any fatal bridge event (failed
//! connect, engine disconnect, stream error). The UI has no degraded mode
//! without the engine; an outer supervisor owns relaunching.

mod stdio;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};

use bridge_core::{BridgeConfig, EngineClient, EngineTransport, HostShim};

/// Bridge host - connects the desktop-audio UI to the audio engine
#[derive(Parser, Debug)]
#[command(name = "bridge-host")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine socket path
    #[arg(short = 's', long, env = "AUDIO_SOCKET", value_name = "PATH")]
    socket_path: Option<PathBuf>,

    /// Engine binary to spawn
    #[arg(short = 'e', long, env = "AUDIO_ENGINE", value_name = "PATH")]
    engine: Option<PathBuf>,

    /// Do not spawn the engine (it is managed externally)
    #[arg(long)]
    no_spawn: bool,

    /// Configuration file path
    #[arg(short = 'c', long, env = "AUDIO_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "AUDIO_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Optional TOML overrides, lowest precedence after built-in defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    socket_path: Option<PathBuf>,
    engine_binary: Option<PathBuf>,
    probe_interval_ms: Option<u64>,
    probe_attempts: Option<u32>,
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("bridge_host={level},bridge_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Resolve the bridge configuration: defaults, then config file, then
/// CLI flags (which also carry the environment variables).
fn resolve_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = BridgeConfig::default();

    if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;
        let file: ConfigFile = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {path:?}"))?;

        if let Some(socket_path) = file.socket_path {
            config.socket_path = socket_path;
        }
        if let Some(engine_binary) = file.engine_binary {
            config.engine_binary = Some(engine_binary);
        }
        let mut probe = config.probe;
        if let Some(ms) = file.probe_interval_ms {
            probe = probe.with_interval(Duration::from_millis(ms));
        }
        if let Some(n) = file.probe_attempts {
            probe = probe.with_max_attempts(n);
        }
        config.probe = probe;
    }

    if let Some(socket_path) = &args.socket_path {
        config.socket_path = socket_path.clone();
    }
    if let Some(engine) = &args.engine {
        config.engine_binary = Some(engine.clone());
    }
    if args.no_spawn {
        config.engine_binary = None;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = resolve_config(&args)?;
    info!(
        socket_path = ?config.socket_path,
        engine = ?config.engine_binary,
        "bridge host starting"
    );

    let mut client = EngineClient::new(config);
    client
        .connect()
        .await
        .context("could not connect to the audio engine")?;

    // Presentation channel: stdin in, stdout out
    let (to_ui_tx, to_ui_rx) = mpsc::channel(100);
    let (from_ui_tx, from_ui_rx) = mpsc::channel(100);
    tokio::spawn(stdio::run_stdout_writer(to_ui_rx));
    tokio::spawn(stdio::run_stdin_reader(from_ui_tx));

    let shim = HostShim::new(client, to_ui_tx, from_ui_rx);

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::select! {
        exit = shim.run() => {
            if exit.is_fatal() {
                error!(reason = ?exit, "fatal bridge event");
                std::process::exit(1);
            }
            info!("presentation channel closed, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_resolve_config_flag_overrides() {
        let args = Args::parse_from([
            "bridge-host",
            "--socket-path",
            "/tmp/other.sock",
            "--no-spawn",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/other.sock"));
        assert!(config.engine_binary.is_none());
    }

    #[test]
    fn test_resolve_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(
            &path,
            "socket_path = \"/tmp/from-file.sock\"\nprobe_attempts = 7\n",
        )
        .unwrap();

        let args = Args::parse_from([
            "bridge-host",
            "--config",
            path.to_str().unwrap(),
            "--socket-path",
            "/tmp/from-flag.sock",
        ]);
        let config = resolve_config(&args).unwrap();
        // Flags win over the file; untouched file fields still apply
        assert_eq!(config.socket_path, PathBuf::from("/tmp/from-flag.sock"));
        assert_eq!(config.probe.max_attempts, 7);
    }
}
