//! Transport Layer
//!
//! The duplex connection to the Audio Engine process.
//!
//! ```text
//! ┌──────────────────┐                       ┌──────────────────┐
//! │   Host process   │                       │   Audio Engine   │
//! │                  │                       │                  │
//! │   EngineClient  ─┼──────────────────────►│  (external, Go)  │
//! │                  │  /tmp/desktop-audio   │                  │
//! │   Command ──────►│        .sock          │◄────── Command   │
//! │   ◄── EngineEvent│                       │                  │
//! └──────────────────┘                       └──────────────────┘
//! ```
//!
//! [`EngineClient`] owns the whole lifecycle: spawning the engine, probing
//! for the rendezvous socket, framing, and the terminal-event contract.
//! [`InProcessTransport`] swaps the socket for channel ends so the glue
//! above the [`EngineTransport`] seam can be exercised without an engine.

pub mod in_process;
pub mod traits;
#[cfg(unix)]
pub mod unix_socket;

// Re-exports for convenience
pub use in_process::InProcessTransport;
pub use traits::{BridgeState, EngineTransport};

#[cfg(unix)]
pub use unix_socket::EngineClient;
