//! Transport Traits
//!
//! The seam between the host-side glue and the concrete engine connection.
//! Two implementations exist: [`crate::transport::EngineClient`] (Unix
//! socket to the real engine) and [`crate::transport::InProcessTransport`]
//! (channel pair for embedded and test use).

use async_trait::async_trait;

use crate::command::Command;
use crate::error::BridgeError;
use crate::events::EngineEvent;

/// Lifecycle of the single engine connection.
///
/// There is exactly one connection per process lifetime; no pooling, no
/// multiplexing. `Disconnected` and `Failed` are both terminal for the
/// current connection; recovery is an explicit caller-initiated
/// `connect()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    /// `connect()` has not been called yet.
    Unstarted,
    /// Probing for the endpoint / opening the stream.
    Connecting,
    /// Stream established; `send()` is permitted.
    Connected,
    /// The peer closed its side, or the caller disconnected locally.
    Disconnected,
    /// A fatal error ended the connection (probe exhaustion or stream error).
    Failed,
}

impl BridgeState {
    /// Whether `send()` is currently permitted.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Client-side transport to the Audio Engine.
///
/// A thin framing layer: no acknowledgements, no sequencing beyond stream
/// order, no request/response correlation. Commands go out in `send()` call
/// order; inbound commands arrive as [`EngineEvent::Message`] in stream
/// order on the single event queue.
#[async_trait]
pub trait EngineTransport: Send {
    /// Establish the connection to the engine.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::AlreadyConnected`] if a connection is in flight
    /// - [`BridgeError::EndpointNotFound`] when the probe budget is exhausted
    /// - [`BridgeError::SpawnFailed`] / [`BridgeError::Stream`] on launch or
    ///   handshake failure
    async fn connect(&mut self) -> Result<(), BridgeError>;

    /// Tear the connection down locally. No event is emitted.
    async fn disconnect(&mut self) -> Result<(), BridgeError>;

    /// Encode and enqueue one command for writing, in call order.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotConnected`] if the bridge is not `Connected`;
    /// nothing is written or queued in that case.
    async fn send(&self, command: Command) -> Result<(), BridgeError>;

    /// Wait for the next event. `None` means the connection is gone and its
    /// terminal event was already consumed.
    async fn next_event(&mut self) -> Option<EngineEvent>;

    /// Poll for an event without waiting.
    fn try_next_event(&mut self) -> Option<EngineEvent>;

    /// Current connection state.
    fn state(&self) -> BridgeState;

    /// Whether `send()` would currently be accepted.
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}
