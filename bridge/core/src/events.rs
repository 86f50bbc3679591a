//! Bridge Events
//!
//! Lifecycle and message events delivered by a transport on its single event
//! channel. The original design exposed overwritable callback fields
//! (`onConnected`, `onMessage`, ...); a queue of typed events avoids silent
//! handler replacement and keeps delivery order explicit.

use crate::command::Command;
use crate::error::BridgeError;

/// Events delivered by an [`crate::transport::EngineTransport`].
///
/// Per established connection there is at most one terminal event:
/// either `Disconnected` (the engine closed its side, no cleanup implied)
/// or `Error` (stream-level failure, cleanup already performed).
#[derive(Debug)]
pub enum EngineEvent {
    /// The stream handshake completed; the bridge is `Connected`.
    Connected,

    /// One fully received wire line, already decoded.
    Message(Command),

    /// The engine closed its side of the stream gracefully.
    Disconnected,

    /// A stream-level error occurred. The engine child process has been
    /// killed and the stale endpoint removed, so a subsequent `connect()`
    /// can succeed cleanly.
    Error(BridgeError),
}

impl EngineEvent {
    /// Whether this event ends the connection (no further events follow).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error(_))
    }
}
