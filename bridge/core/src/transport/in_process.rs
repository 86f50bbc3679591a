//! In-Process Transport
//!
//! Channel-pair transport for embedded and test use: the "engine" side is
//! whatever holds the returned channel ends. No process, no socket, no
//! codec. Commands and events cross as plain values.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::command::Command;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::events::EngineEvent;
use crate::transport::traits::{BridgeState, EngineTransport};

/// In-process transport using tokio channels.
pub struct InProcessTransport {
    cmd_tx: mpsc::Sender<Command>,
    event_rx: mpsc::Receiver<EngineEvent>,
    state: Arc<RwLock<BridgeState>>,
}

impl InProcessTransport {
    /// Create a transport pair.
    ///
    /// Returns:
    /// - `InProcessTransport`: use this where an [`EngineTransport`] is
    ///   expected
    /// - `mpsc::Receiver<Command>`: the fake engine receives sent commands
    ///   here
    /// - `mpsc::Sender<EngineEvent>`: the fake engine delivers events here
    ///
    /// The transport starts `Connected`; a terminal event delivered through
    /// the event sender moves it to the matching terminal state, after which
    /// `send()` is rejected.
    #[must_use]
    pub fn new_pair() -> (
        Self,
        mpsc::Receiver<Command>,
        mpsc::Sender<EngineEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(BridgeConfig::channel_capacity());
        let (event_tx, event_rx) = mpsc::channel(BridgeConfig::channel_capacity());

        let transport = Self {
            cmd_tx,
            event_rx,
            state: Arc::new(RwLock::new(BridgeState::Connected)),
        };

        (transport, cmd_rx, event_tx)
    }

    /// Apply the state effect of a delivered event.
    fn observe(&self, event: &EngineEvent) {
        match event {
            EngineEvent::Connected => *self.state.write() = BridgeState::Connected,
            EngineEvent::Disconnected => *self.state.write() = BridgeState::Disconnected,
            EngineEvent::Error(_) => *self.state.write() = BridgeState::Failed,
            EngineEvent::Message(_) => {}
        }
    }
}

#[async_trait]
impl EngineTransport for InProcessTransport {
    async fn connect(&mut self) -> Result<(), BridgeError> {
        *self.state.write() = BridgeState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), BridgeError> {
        *self.state.write() = BridgeState::Disconnected;
        Ok(())
    }

    async fn send(&self, command: Command) -> Result<(), BridgeError> {
        if !self.state.read().is_connected() {
            return Err(BridgeError::NotConnected);
        }
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| BridgeError::NotConnected)
    }

    async fn next_event(&mut self) -> Option<EngineEvent> {
        let event = self.event_rx.recv().await?;
        self.observe(&event);
        Some(event)
    }

    fn try_next_event(&mut self) -> Option<EngineEvent> {
        let event = self.event_rx.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    fn state(&self) -> BridgeState {
        *self.state.read()
    }
}
