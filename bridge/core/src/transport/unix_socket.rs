//! Unix Socket Engine Client
//!
//! The real transport to the Audio Engine: spawns the engine process,
//! waits for its rendezvous socket to appear, opens the stream, and runs
//! one reader and one writer task for the duplex line protocol.
//!
//! # Lifecycle
//!
//! ```text
//! Unstarted ──connect()──► Connecting ──► Connected ──► Disconnected
//!                              │                            (peer EOF or
//!                              │                             disconnect())
//!                              └──────────► Failed ◄──── stream error
//!                               (probe exhausted)        (child killed,
//!                                                         stale socket
//!                                                         removed)
//! ```
//!
//! The engine child process is owned by this client and killed only during
//! stream-error cleanup; on a graceful peer disconnect the child may have
//! exited on its own and is left alone. The client never reconnects by
//! itself; after a terminal event the caller decides whether to call
//! `connect()` again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::process::Child;
use tokio::sync::mpsc;

use crate::codec::{self, LineDecoder};
use crate::command::Command;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::EngineEvent;
use crate::retry::retry_with_policy;
use crate::transport::traits::{BridgeState, EngineTransport};

/// State shared between the client handle and its reader/writer tasks.
struct Shared {
    state: RwLock<BridgeState>,
    child: Mutex<Option<Child>>,
    socket_path: PathBuf,
}

impl Shared {
    fn state(&self) -> BridgeState {
        *self.state.read()
    }

    fn set_state(&self, state: BridgeState) {
        *self.state.write() = state;
    }

    /// Transition `Connected -> to`, returning whether this call won the
    /// transition. Only the winner emits the terminal event, so reader and
    /// writer failures can race without duplicating it.
    fn begin_teardown(&self, to: BridgeState) -> bool {
        let mut state = self.state.write();
        if *state == BridgeState::Connected {
            *state = to;
            true
        } else {
            false
        }
    }

    /// Error cleanup: kill the engine child and remove the stale socket
    /// file so a subsequent `connect()` starts from a clean slate.
    async fn cleanup(&self) {
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            tracing::info!(pid = ?child.id(), "killing engine process");
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill engine process");
            }
        }
        match tokio::fs::remove_file(&self.socket_path).await {
            Ok(()) => tracing::debug!(path = ?self.socket_path, "removed stale socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, "failed to remove stale socket file"),
        }
    }
}

/// Unix socket client for the Audio Engine.
pub struct EngineClient {
    config: BridgeConfig,
    shared: Arc<Shared>,
    /// Single event queue; survives reconnects.
    event_rx: mpsc::Receiver<EngineEvent>,
    event_tx: mpsc::Sender<EngineEvent>,
    /// Writer-task inbox for the current connection.
    cmd_tx: Option<mpsc::Sender<Command>>,
}

impl EngineClient {
    /// Create a client from the given configuration. No I/O happens until
    /// [`EngineTransport::connect`].
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(BridgeConfig::channel_capacity());
        let shared = Arc::new(Shared {
            state: RwLock::new(BridgeState::Unstarted),
            child: Mutex::new(None),
            socket_path: config.socket_path.clone(),
        });
        Self {
            config,
            shared,
            event_rx,
            event_tx,
            cmd_tx: None,
        }
    }

    /// The endpoint path this client probes and connects to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Launch the engine binary, fire-and-forget, stdio inherited for its
    /// own diagnostics. The data protocol never touches stdio.
    fn spawn_engine(&self, binary: &Path) -> Result<(), BridgeError> {
        let child = tokio::process::Command::new(binary)
            .spawn()
            .map_err(BridgeError::SpawnFailed)?;
        tracing::info!(binary = ?binary, pid = ?child.id(), "engine process spawned");
        *self.shared.child.lock() = Some(child);
        Ok(())
    }

    /// Wait for the engine's socket file to appear, bounded by the probe
    /// policy. This is the first of two sequential waits; the stream
    /// handshake in `connect()` is the second.
    async fn probe_endpoint(&self) -> Result<(), BridgeError> {
        let path = self.config.socket_path.clone();
        let result = retry_with_policy(self.config.probe, |_| {
            let path = path.clone();
            async move {
                tokio::fs::try_exists(&path)
                    .await
                    .unwrap_or(false)
                    .then_some(())
            }
        })
        .await;
        result.map_err(|exhausted| BridgeError::EndpointNotFound {
            path,
            attempts: exhausted.attempts,
        })
    }
}

#[async_trait]
impl EngineTransport for EngineClient {
    async fn connect(&mut self) -> Result<(), BridgeError> {
        match self.shared.state() {
            BridgeState::Connecting | BridgeState::Connected => {
                return Err(BridgeError::AlreadyConnected);
            }
            _ => {}
        }
        self.shared.set_state(BridgeState::Connecting);

        if let Some(binary) = self.config.engine_binary.clone() {
            if let Err(e) = self.spawn_engine(&binary) {
                self.shared.set_state(BridgeState::Failed);
                return Err(e);
            }
        }

        if let Err(e) = self.probe_endpoint().await {
            self.shared.set_state(BridgeState::Failed);
            return Err(e);
        }

        let stream = match UnixStream::connect(&self.config.socket_path).await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.set_state(BridgeState::Failed);
                return Err(BridgeError::Stream(e));
            }
        };
        let (mut read_half, write_half) = stream.into_split();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(BridgeConfig::channel_capacity());
        self.cmd_tx = Some(cmd_tx);
        self.shared.set_state(BridgeState::Connected);
        self.event_tx.send(EngineEvent::Connected).await.ok();
        tracing::info!(path = ?self.config.socket_path, "connected to engine");

        // Reader task: stream -> decoded commands -> event queue
        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut decoder = LineDecoder::new();
            let mut buf = [0u8; 4096];

            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => {
                        tracing::debug!("connection closed by engine");
                        if shared.begin_teardown(BridgeState::Disconnected) {
                            event_tx.send(EngineEvent::Disconnected).await.ok();
                        }
                        break;
                    }
                    Ok(n) => {
                        decoder.push(&buf[..n]);
                        if !drain_lines(&mut decoder, &event_tx).await {
                            tracing::debug!("event receiver dropped");
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "read error");
                        fail(&shared, &event_tx, BridgeError::Stream(e)).await;
                        break;
                    }
                }
            }
        });

        // Writer task: command inbox -> wire lines -> stream
        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();
        tokio::spawn(run_writer(shared, event_tx, write_half, cmd_rx));

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BridgeError> {
        // Dropping the writer inbox ends the writer task, which closes our
        // write half; the engine child is left alone.
        self.cmd_tx = None;
        self.shared.set_state(BridgeState::Disconnected);
        tracing::info!("disconnected from engine");
        Ok(())
    }

    async fn send(&self, command: Command) -> Result<(), BridgeError> {
        if !self.shared.state().is_connected() {
            return Err(BridgeError::NotConnected);
        }
        let tx = self.cmd_tx.as_ref().ok_or(BridgeError::NotConnected)?;
        tx.send(command)
            .await
            .map_err(|_| BridgeError::NotConnected)
    }

    async fn next_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    fn try_next_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    fn state(&self) -> BridgeState {
        self.shared.state()
    }
}

/// Feed every complete buffered line through the codec and into the event
/// queue. Malformed lines are logged and dropped; they never end the
/// connection. Returns `false` once the event receiver is gone.
async fn drain_lines(decoder: &mut LineDecoder, event_tx: &mpsc::Sender<EngineEvent>) -> bool {
    loop {
        match decoder.next_line() {
            Ok(Some(line)) => match codec::decode_line(&line) {
                Ok(command) if command.is_empty() => {}
                Ok(command) => {
                    if event_tx.send(EngineEvent::Message(command)).await.is_err() {
                        return false;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, line, "dropping malformed wire line");
                }
            },
            Ok(None) => return true,
            Err(e) => {
                tracing::warn!(error = %e, "dropping non-UTF-8 wire line");
            }
        }
    }
}

async fn run_writer(
    shared: Arc<Shared>,
    event_tx: mpsc::Sender<EngineEvent>,
    mut write_half: OwnedWriteHalf,
    mut cmd_rx: mpsc::Receiver<Command>,
) {
    while let Some(command) = cmd_rx.recv().await {
        let mut line = codec::encode(&command);
        line.push('\n');
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            tracing::warn!(error = %e, "write error");
            fail(&shared, &event_tx, BridgeError::Stream(e)).await;
            break;
        }
    }
}

/// Stream-error path: whoever wins the `Connected -> Failed` transition
/// performs cleanup and then emits the single `Error` event.
async fn fail(shared: &Shared, event_tx: &mpsc::Sender<EngineEvent>, err: BridgeError) {
    if shared.begin_teardown(BridgeState::Failed) {
        shared.cleanup().await;
        event_tx.send(EngineEvent::Error(err)).await.ok();
    }
}
