//! Presentation Channel over Stdio
//!
//! The host's IPC boundary to the presentation layer: newline-delimited
//! text on stdin/stdout, each line carrying the fixed channel name followed
//! by one codec-encoded command:
//!
//! ```text
//! audio set osc 0 freq 440
//! ```
//!
//! Lines for any other channel are ignored with a warning; the engine
//! protocol itself never touches stdio (the engine child inherits the
//! host's stderr for its own diagnostics only).

use bridge_core::{codec, Command, DecodeError, AUDIO_CHANNEL};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Serialize one outbound presentation line (without the newline).
pub fn format_line(command: &Command) -> String {
    format!("{AUDIO_CHANNEL} {}", codec::encode(command))
}

/// Parse one inbound presentation line.
///
/// Returns `Ok(None)` for lines addressed to a different channel.
pub fn parse_line(line: &str) -> Result<Option<Command>, DecodeError> {
    let Some(rest) = line.strip_prefix(AUDIO_CHANNEL) else {
        return Ok(None);
    };
    let Some(payload) = rest.strip_prefix(' ') else {
        return Ok(None);
    };
    codec::decode_line(payload).map(Some)
}

/// Forward stdin lines to the shim until EOF. Dropping the sender is the
/// graceful-shutdown signal.
pub async fn run_stdin_reader(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_line(&line) {
                Ok(Some(command)) if !command.is_empty() => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => tracing::warn!(line, "ignoring line for unknown channel"),
                Err(e) => tracing::warn!(error = %e, line, "dropping malformed ui line"),
            },
            Ok(None) => {
                tracing::info!("presentation channel reached EOF");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stdin read error");
                break;
            }
        }
    }
}

/// Write shim-forwarded commands to stdout, one line per command.
pub async fn run_stdout_writer(mut rx: mpsc::Receiver<Command>) {
    let mut stdout = tokio::io::stdout();
    while let Some(command) = rx.recv().await {
        let mut line = format_line(&command);
        line.push('\n');
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            tracing::warn!(error = %e, "stdout write error");
            break;
        }
        if let Err(e) = stdout.flush().await {
            tracing::warn!(error = %e, "stdout flush error");
            break;
        }
    }
}
